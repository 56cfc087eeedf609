//! Integration tests for the harvest → XMLTV pipeline.
//!
//! These tests drive the pipeline with an in-memory source so they run
//! without reaching erw.cc or TVMao.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use tempfile::TempDir;
use tvguide_core::time::xmltv_timestamp;
use tvguide_core::{ClockTime, Programme};
use tvguide_etl::{harvest, harvest_to_file, FetchError, FetchResult, GuideSource, HarvestOptions};

/// What the fake source does for a channel.
#[derive(Debug, Clone)]
enum Script {
    Listing(Vec<(&'static str, &'static str, &'static str)>),
    Missing,
    Broken,
    /// Fail transiently this many times, then succeed with one slot.
    Flaky(usize),
}

#[derive(Debug)]
struct FakeSource {
    lineup: Vec<&'static str>,
    scripts: HashMap<&'static str, Script>,
    calls: AtomicUsize,
}

impl FakeSource {
    fn new(entries: Vec<(&'static str, Script)>) -> Self {
        Self {
            lineup: entries.iter().map(|(name, _)| *name).collect(),
            scripts: entries.into_iter().collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl GuideSource for FakeSource {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn data_from(&self) -> &str {
        "https://listings.invalid/"
    }

    fn lineup(&self) -> Vec<&str> {
        self.lineup.clone()
    }

    async fn fetch_listing(&self, channel: &str, date: NaiveDate) -> FetchResult<Vec<Programme>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.scripts.get(channel) {
            Some(Script::Listing(slots)) => Ok(slots
                .iter()
                .map(|(start, stop, title)| {
                    Programme::on_date(
                        channel,
                        date,
                        start.parse::<ClockTime>().unwrap(),
                        stop.parse::<ClockTime>().unwrap(),
                        *title,
                    )
                })
                .collect()),
            Some(Script::Missing) => Err(FetchError::NotFound {
                channel: channel.to_string(),
                source_name: "fake".to_string(),
            }),
            Some(Script::Broken) => Err(FetchError::Parse {
                source_name: "fake".to_string(),
                message: "unexpected token".to_string(),
            }),
            Some(Script::Flaky(failures)) if call < *failures => Err(FetchError::Http {
                source_name: "fake".to_string(),
                message: "503 Service Unavailable".to_string(),
            }),
            Some(Script::Flaky(_)) => Ok(vec![Programme::on_date(
                channel,
                date,
                ClockTime::new(8, 0).unwrap(),
                ClockTime::new(9, 0).unwrap(),
                "recovered",
            )]),
            None => Err(FetchError::UnknownChannel {
                channel: channel.to_string(),
                source_name: "fake".to_string(),
            }),
        }
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 13).unwrap()
}

#[tokio::test]
async fn test_harvest_keeps_lineup_order_and_skips_failures() {
    let source = FakeSource::new(vec![
        ("CCTV1", Script::Listing(vec![("19:00", "19:30", "新闻联播")])),
        ("CCTV2", Script::Missing),
        ("CCTV3", Script::Broken),
        ("CCTV4", Script::Listing(vec![])),
        (
            "湖南卫视",
            Script::Listing(vec![("08:00", "09:00", "早间"), ("09:00", "10:00", "剧场")]),
        ),
    ]);

    let result = harvest(&source, date(), &HarvestOptions::default()).await;

    let ids: Vec<&str> = result.guide.channels.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["CCTV1", "CCTV4", "湖南卫视"]);
    assert_eq!(result.guide.programme_count(), 3);
    assert_eq!(result.guide.data_from, "https://listings.invalid/");
    assert_eq!(result.guide.info_name, "by oaixnah");

    assert_eq!(result.report.source, "fake");
    assert_eq!(result.report.channels_ok, 3);
    assert_eq!(result.report.programmes, 3);
    let skipped: Vec<&str> = result.report.skipped.iter().map(|s| s.channel.as_str()).collect();
    assert_eq!(skipped, vec!["CCTV2", "CCTV3"]);
    assert!(!result.report.is_complete());
}

#[tokio::test]
async fn test_harvest_retries_transient_failures() {
    let source = FakeSource::new(vec![("CCTV1", Script::Flaky(1))]);
    let options = HarvestOptions {
        max_retries: 2,
        ..HarvestOptions::default()
    };

    let result = harvest(&source, date(), &options).await;

    assert!(result.report.is_complete());
    assert_eq!(result.guide.programmes[0].title, "recovered");
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_harvest_gives_up_after_retries() {
    let source = FakeSource::new(vec![("CCTV1", Script::Flaky(10))]);
    let options = HarvestOptions {
        max_retries: 1,
        ..HarvestOptions::default()
    };

    let result = harvest(&source, date(), &options).await;

    assert!(result.guide.channels.is_empty());
    assert_eq!(result.report.skipped.len(), 1);
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_harvest_does_not_retry_permanent_failures() {
    let source = FakeSource::new(vec![("CCTV3", Script::Broken)]);
    let options = HarvestOptions {
        max_retries: 3,
        ..HarvestOptions::default()
    };

    harvest(&source, date(), &options).await;

    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_harvest_channel_filter() {
    let source = FakeSource::new(vec![
        ("CCTV1", Script::Listing(vec![("19:00", "19:30", "新闻联播")])),
        ("CCTV2", Script::Listing(vec![("20:00", "21:00", "经济")])),
    ]);
    let options = HarvestOptions::default().with_channels(vec!["CCTV2".to_string(), "BBC".to_string()]);

    let result = harvest(&source, date(), &options).await;

    assert_eq!(result.guide.channels.len(), 1);
    assert_eq!(result.guide.channels[0].id, "CCTV2");
    assert_eq!(result.report.skipped.len(), 1);
    assert_eq!(result.report.skipped[0].channel, "BBC");
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_harvest_to_file_writes_xmltv() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("site").join("e.xml");
    let source = FakeSource::new(vec![(
        "CCTV1",
        Script::Listing(vec![("19:00", "19:30", "新闻联播")]),
    )]);
    let options = HarvestOptions {
        info: Some(("mirror".to_string(), "https://mirror.invalid/e.xml".to_string())),
        ..HarvestOptions::default()
    };

    harvest_to_file(&source, date(), &options, &output).await.unwrap();

    let xml = std::fs::read_to_string(&output).unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
    assert!(xml.contains(
        "<tv info-name=\"mirror\" info-url=\"https://mirror.invalid/e.xml\" data-from=\"https://listings.invalid/\">"
    ));
    assert!(xml.contains("<display-name lang=\"zh\">CCTV1</display-name>"));
    let start = xmltv_timestamp(date(), ClockTime::new(19, 0).unwrap());
    assert!(xml.contains(&format!("start=\"{start}\"")));
    assert!(xml.contains("<title lang=\"zh\">新闻联播</title>"));
}

#[tokio::test]
async fn test_harvested_guide_as_json_lists_programmes() {
    let source = FakeSource::new(vec![
        ("CCTV1", Script::Listing(vec![("19:00", "19:30", "新闻联播")])),
        ("CCTV2", Script::Missing),
        ("CCTV6", Script::Listing(vec![("23:30", "00:30", "午夜剧场")])),
    ]);

    let result = harvest(&source, date(), &HarvestOptions::default()).await;
    let json = result.guide.to_json_pretty().unwrap();

    assert!(json.contains("\"title\": \"新闻联播\""));
    assert!(json.contains("\"title\": \"午夜剧场\""));
    assert!(json.contains("\"stop\": \"20260214003000 +0800\""));
    assert!(!json.contains("\"channel\": \"CCTV2\""));
}
