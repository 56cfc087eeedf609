//! Harvest pipeline: source lineup → [`Guide`] → XMLTV file.
//!
//! Channels are fetched one at a time in lineup order so the guide keeps
//! a stable layout between runs. A channel that keeps failing after its
//! retries is left out and recorded in the [`HarvestReport`]; it never
//! aborts the harvest.

use std::path::Path;

use anyhow::{Context, Result};
use backon::Retryable;
use chrono::NaiveDate;

use tvguide_core::{xmltv, Channel, Guide};

use crate::config::{Config, SourceKind};
use crate::error::FetchError;
use crate::source::resilience::retry_policy;
use crate::source::{build_source, GuideSource};

/// Knobs for a single harvest.
#[derive(Debug, Clone, Default)]
pub struct HarvestOptions {
    /// `info-name` / `info-url` stamped on the guide; defaults when `None`.
    pub info: Option<(String, String)>,
    /// Retries per channel after a transient failure.
    pub max_retries: usize,
    /// Restrict the harvest to these channels; empty means the whole lineup.
    pub channels: Vec<String>,
}

impl HarvestOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            info: Some((config.info_name.clone(), config.info_url.clone())),
            max_retries: config.max_retries,
            channels: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_channels(mut self, channels: Vec<String>) -> Self {
        self.channels = channels;
        self
    }
}

/// A channel left out of the guide, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedChannel {
    pub channel: String,
    pub reason: String,
}

/// Outcome counters for a harvest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub source: String,
    pub date: Option<NaiveDate>,
    /// Channels that made it into the guide.
    pub channels_ok: usize,
    pub programmes: usize,
    pub skipped: Vec<SkippedChannel>,
}

impl HarvestReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// A harvested guide together with its report.
#[derive(Debug, Clone)]
pub struct Harvest {
    pub guide: Guide,
    pub report: HarvestReport,
}

/// Fetch every channel of `source` for `date` and assemble a guide.
pub async fn harvest(source: &dyn GuideSource, date: NaiveDate, options: &HarvestOptions) -> Harvest {
    let mut guide = Guide::new(source.data_from());
    if let Some((name, url)) = &options.info {
        guide = guide.with_info(name.clone(), url.clone());
    }

    let mut report = HarvestReport {
        source: source.name().to_string(),
        date: Some(date),
        ..HarvestReport::default()
    };

    let lineup = source.lineup();
    let wanted: Vec<&str> = if options.channels.is_empty() {
        lineup.clone()
    } else {
        for requested in &options.channels {
            if !lineup.contains(&requested.as_str()) {
                log::warn!("{} is not in the {} lineup", requested, source.name());
                report.skipped.push(SkippedChannel {
                    channel: requested.clone(),
                    reason: format!("not in the {} lineup", source.name()),
                });
            }
        }
        lineup
            .iter()
            .copied()
            .filter(|name| options.channels.iter().any(|c| c == name))
            .collect()
    };

    log::info!(
        "Harvesting {} channels from {} for {}",
        wanted.len(),
        source.name(),
        date
    );

    for channel in wanted {
        let fetched = (move || source.fetch_listing(channel, date))
            .retry(retry_policy(options.max_retries))
            .when(FetchError::is_transient)
            .notify(|err: &FetchError, after| {
                log::warn!("Retrying {} in {:?}: {}", channel, after, err);
            })
            .await;

        match fetched {
            Ok(programmes) => {
                log::debug!("{}: {} programmes", channel, programmes.len());
                report.channels_ok += 1;
                report.programmes += programmes.len();
                guide.push_listing(Channel::named(channel), programmes);
            }
            Err(e) => {
                if e.is_not_found() {
                    log::info!("Skipping {}: {}", channel, e);
                } else {
                    log::warn!("Skipping {}: {}", channel, e);
                }
                report.skipped.push(SkippedChannel {
                    channel: channel.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    log::info!(
        "Harvested {} channels / {} programmes ({} skipped)",
        report.channels_ok,
        report.programmes,
        report.skipped.len()
    );

    Harvest { guide, report }
}

/// Harvest `source` and write the guide to `output`.
pub async fn harvest_to_file(
    source: &dyn GuideSource,
    date: NaiveDate,
    options: &HarvestOptions,
    output: &Path,
) -> Result<Harvest> {
    let result = harvest(source, date, options).await;
    xmltv::write_file(&result.guide, output)
        .with_context(|| format!("Failed to write guide to {}", output.display()))?;
    log::info!("Wrote {}", output.display());
    Ok(result)
}

/// Build the configured source, harvest it, and write the configured output.
pub async fn run(
    config: &Config,
    kind: SourceKind,
    date: NaiveDate,
    channels: Vec<String>,
) -> Result<Harvest> {
    let source = build_source(config, kind)
        .with_context(|| format!("Failed to create {kind} source"))?;
    let options = HarvestOptions::from_config(config).with_channels(channels);
    harvest_to_file(source.as_ref(), date, &options, &config.output_path).await
}
