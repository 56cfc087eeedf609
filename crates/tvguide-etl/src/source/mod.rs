//! Upstream listing sources.
//!
//! Every source exposes an ordered channel lineup and can fetch one
//! channel's programmes for a given date. The harvester treats sources
//! uniformly through [`GuideSource`].

pub mod erw;
pub mod resilience;
pub mod tvmao;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use tvguide_core::Programme;

use crate::config::{Config, SourceKind};
use crate::error::FetchResult;

pub use erw::ErwSource;
pub use tvmao::TvmaoSource;

/// A provider of per-channel programme listings.
#[async_trait]
pub trait GuideSource: Send + Sync + fmt::Debug {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Value recorded in the guide's `data-from` attribute.
    fn data_from(&self) -> &str;

    /// Channel names in the order they appear in the guide.
    fn lineup(&self) -> Vec<&str>;

    /// Fetch the programmes `channel` airs on `date`.
    ///
    /// Returns [`FetchError::NotFound`](crate::FetchError::NotFound) when
    /// the source has no usable listing for the channel. An `Ok` with an
    /// empty `Vec` means the source answered but scheduled nothing, and the
    /// channel is still listed.
    async fn fetch_listing(&self, channel: &str, date: NaiveDate) -> FetchResult<Vec<Programme>>;
}

/// Build the HTTP client shared by a source's requests.
pub(crate) fn http_client(timeout: Duration, user_agent: &str) -> FetchResult<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()?)
}

/// Construct the source selected by `kind` from configuration.
pub fn build_source(config: &Config, kind: SourceKind) -> FetchResult<Box<dyn GuideSource>> {
    let source: Box<dyn GuideSource> = match kind {
        SourceKind::Erw => Box::new(ErwSource::from_config(config)?),
        SourceKind::Tvmao => Box::new(TvmaoSource::from_config(config)?),
    };
    log::debug!("Using listing source {}", source.name());
    Ok(source)
}
