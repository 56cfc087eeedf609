//! erw.cc listing source.
//!
//! The erw.cc API returns one channel's schedule for one day as JSON:
//!
//! ```json
//! { "epg_data": [ { "start": "19:00", "end": "19:30", "title": "新闻联播" } ] }
//! ```
//!
//! Channels are addressed by their display name. Every channel that
//! answers is listed in the guide, even with an empty schedule.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use tvguide_core::time::compact_date;
use tvguide_core::{ClockTime, Programme};

use crate::config::Config;
use crate::error::{FetchError, FetchResult};
use crate::source::resilience::RateLimiter;
use crate::source::{http_client, GuideSource};

const SOURCE_NAME: &str = "erw";

/// Default API root, also recorded as the guide's `data-from`.
pub const DEFAULT_BASE_URL: &str = "https://api.erw.cc/";

/// The API rejects non-browser clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

/// Channels requested from the API, in guide order.
pub const CHANNELS: &[&str] = &[
    "CCTV1",
    "CCTV2",
    "CCTV3",
    "CCTV4",
    "CCTV5",
    "CCTV5+",
    "CCTV6",
    "CCTV7",
    "CCTV8",
    "CCTV9",
    "CCTV10",
    "CCTV11",
    "CCTV12",
    "CCTV13",
    "CCTV14",
    "CCTV15",
    "CCTV16",
    "CCTV17",
    "风云音乐",
    "第一剧场",
    "风云剧场",
    "风云足球",
    "世界地理",
    "电视指南",
    "怀旧剧场",
    "兵器科技",
    "CCTV4K超高清",
    "CHC动作电影",
    "CHC家庭影院",
    "CHC影迷电影",
    "辽宁公共",
    "辽宁北方",
    "辽宁生活",
    "辽宁经济",
    "辽宁都市",
    "辽宁影视剧",
    "辽宁体育休闲",
    "深圳卫视",
    "重庆卫视",
    "广东卫视",
    "北京卫视",
    "湖南卫视",
    "东方卫视",
    "四川卫视",
    "天津卫视",
    "安徽卫视",
    "山东卫视",
    "广西卫视",
    "江苏卫视",
    "江西卫视",
    "河北卫视",
    "河南卫视",
    "浙江卫视",
    "海南卫视",
    "湖北卫视",
    "东南卫视",
    "贵州卫视",
    "云南卫视",
    "辽宁卫视",
    "黑龙江卫视",
    "吉林卫视",
    "宁夏卫视",
    "新疆卫视",
    "兵团卫视",
    "甘肃卫视",
    "内蒙古卫视",
    "青海卫视",
    "三沙卫视",
    "厦门卫视",
    "陕西卫视",
];

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Top-level listing response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErwListing {
    /// Scheduled slots; absent when the API has nothing for the day.
    #[serde(default)]
    pub epg_data: Vec<ErwSlot>,
}

/// A single scheduled slot.
#[derive(Debug, Clone, Deserialize)]
pub struct ErwSlot {
    /// Start time, `HH:MM`.
    pub start: String,
    /// End time, `HH:MM`.
    pub end: String,
    pub title: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// erw.cc API client.
///
/// Wraps a [`reqwest::Client`] configured with a browser user agent and a
/// short timeout. Requests are spaced by a [`RateLimiter`].
#[derive(Debug, Clone)]
pub struct ErwClient {
    http: Client,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl ErwClient {
    /// Create a new erw.cc client.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be created.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
        requests_per_second: u32,
    ) -> FetchResult<Self> {
        Ok(Self {
            http: http_client(timeout, user_agent)?,
            base_url: base_url.into(),
            rate_limiter: RateLimiter::new(requests_per_second),
        })
    }

    /// Fetch the listing for `channel` on `date`.
    pub async fn get_listing(&self, channel: &str, date: NaiveDate) -> FetchResult<ErwListing> {
        self.rate_limiter.acquire().await;

        let response = self
            .http
            .get(&self.base_url)
            .query(&[("ch", channel), ("date", compact_date(date).as_str())])
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited {
                source_name: SOURCE_NAME.to_string(),
            });
        }

        let response = response.error_for_status().map_err(|e| FetchError::Http {
            source_name: SOURCE_NAME.to_string(),
            message: e.to_string(),
        })?;

        let body = response.text().await?;
        parse_listing(&body)
    }
}

/// Decode an API response body.
pub fn parse_listing(body: &str) -> FetchResult<ErwListing> {
    serde_json::from_str(body).map_err(|e| FetchError::Parse {
        source_name: SOURCE_NAME.to_string(),
        message: e.to_string(),
    })
}

/// Convert API slots into programmes on `date`.
///
/// Slots whose start or end time cannot be read are dropped; they would
/// otherwise produce timestamps no XMLTV consumer accepts.
pub fn to_programmes(channel: &str, date: NaiveDate, slots: &[ErwSlot]) -> Vec<Programme> {
    slots
        .iter()
        .filter_map(|slot| {
            let times = slot
                .start
                .parse::<ClockTime>()
                .and_then(|start| Ok((start, slot.end.parse::<ClockTime>()?)));
            match times {
                Ok((start, stop)) => Some(Programme::on_date(
                    channel,
                    date,
                    start,
                    stop,
                    slot.title.trim(),
                )),
                Err(e) => {
                    log::debug!("Dropping {} slot {:?} on {}: {}", channel, slot.title, date, e);
                    None
                }
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// The erw.cc [`GuideSource`].
#[derive(Debug, Clone)]
pub struct ErwSource {
    client: ErwClient,
    data_from: String,
}

impl ErwSource {
    pub fn new(client: ErwClient, data_from: impl Into<String>) -> Self {
        Self {
            client,
            data_from: data_from.into(),
        }
    }

    pub fn from_config(config: &Config) -> FetchResult<Self> {
        let user_agent = config.user_agent.as_deref().unwrap_or(BROWSER_USER_AGENT);
        let client = ErwClient::new(
            config.erw_base_url.clone(),
            Duration::from_secs(config.erw_timeout_secs),
            user_agent,
            config.requests_per_second,
        )?;
        Ok(Self::new(client, config.erw_base_url.clone()))
    }
}

#[async_trait]
impl GuideSource for ErwSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn data_from(&self) -> &str {
        &self.data_from
    }

    fn lineup(&self) -> Vec<&str> {
        CHANNELS.to_vec()
    }

    async fn fetch_listing(&self, channel: &str, date: NaiveDate) -> FetchResult<Vec<Programme>> {
        let listing = self.client.get_listing(channel, date).await?;
        Ok(to_programmes(channel, date, &listing.epg_data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 13).unwrap()
    }

    #[test]
    fn test_lineup_size_and_uniqueness() {
        assert_eq!(CHANNELS.len(), 70);
        let unique: std::collections::HashSet<_> = CHANNELS.iter().collect();
        assert_eq!(unique.len(), CHANNELS.len());
        assert_eq!(CHANNELS[0], "CCTV1");
        assert_eq!(CHANNELS[CHANNELS.len() - 1], "陕西卫视");
    }

    #[test]
    fn test_parse_listing() {
        let json = r#"{
            "channel_name": "CCTV1",
            "date": "2026-02-13",
            "epg_data": [
                {"start": "04:53", "end": "05:27", "title": "新闻联播"},
                {"start": "19:00", "end": "19:30", "title": " 焦点访谈 ", "desc": ""}
            ]
        }"#;
        let listing = parse_listing(json).unwrap();
        assert_eq!(listing.epg_data.len(), 2);
        assert_eq!(listing.epg_data[0].start, "04:53");
        assert_eq!(listing.epg_data[1].title, " 焦点访谈 ");
    }

    #[test]
    fn test_parse_listing_without_slots() {
        let listing = parse_listing("{}").unwrap();
        assert!(listing.epg_data.is_empty());
    }

    #[test]
    fn test_parse_listing_rejects_non_json() {
        let err = parse_listing("<html>busy</html>").unwrap_err();
        assert!(matches!(err, FetchError::Parse { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_to_programmes() {
        let listing = parse_listing(
            r#"{"epg_data": [
                {"start": "04:53", "end": "05:27", "title": "新闻联播"},
                {"start": "23:30", "end": "24:00", "title": " 晚间新闻 "}
            ]}"#,
        )
        .unwrap();
        let progs = to_programmes("CCTV1", date(), &listing.epg_data);

        assert_eq!(progs.len(), 2);
        assert_eq!(progs[0].channel, "CCTV1");
        assert_eq!(progs[0].start, "20260213045300 +0800");
        assert_eq!(progs[0].stop, "20260213052700 +0800");
        assert_eq!(progs[0].title, "新闻联播");
        assert_eq!(progs[1].stop, "20260214000000 +0800");
        assert_eq!(progs[1].title, "晚间新闻");
    }

    #[test]
    fn test_to_programmes_slot_crossing_midnight() {
        let listing = parse_listing(
            r#"{"epg_data": [{"start": "23:30", "end": "00:30", "title": "午夜剧场"}]}"#,
        )
        .unwrap();
        let progs = to_programmes("CCTV6", date(), &listing.epg_data);

        assert_eq!(progs.len(), 1);
        assert_eq!(progs[0].start, "20260213233000 +0800");
        assert_eq!(progs[0].stop, "20260214003000 +0800");
    }

    #[test]
    fn test_to_programmes_drops_unreadable_times() {
        let listing = parse_listing(
            r#"{"epg_data": [
                {"start": "--", "end": "05:27", "title": "broken"},
                {"start": "06:00", "end": "07:00", "title": "ok"}
            ]}"#,
        )
        .unwrap();
        let progs = to_programmes("CCTV1", date(), &listing.epg_data);
        assert_eq!(progs.len(), 1);
        assert_eq!(progs[0].title, "ok");
    }

    #[test]
    fn test_source_from_config() {
        let source = ErwSource::from_config(&Config::default()).unwrap();
        assert_eq!(source.name(), "erw");
        assert_eq!(source.data_from(), "https://api.erw.cc/");
        assert_eq!(source.lineup().len(), 70);
        let debug = format!("{source:?}");
        assert!(debug.contains("RateLimiter"));
    }
}
