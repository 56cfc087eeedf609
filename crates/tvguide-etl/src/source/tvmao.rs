//! TVMao listing source.
//!
//! TVMao publishes one HTML page per channel per weekday:
//! `{base}/{kind}/{remote_id}-w{weekday}.html`, where `weekday` runs from
//! 1 (Monday) to 7 (Sunday) and `kind` separates regular channels from
//! provincial satellite channels. Each scheduled slot is an `<li>` whose
//! text starts with a `HH:MM` time followed by the programme title.
//!
//! Pages only give start times, so every slot stops when the next one
//! starts and the final slot runs to the end of the day. Only the static
//! page is read; slots the site loads on demand are not fetched.

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use reqwest::{Client, StatusCode};

use tvguide_core::{ClockTime, Programme};

use crate::config::Config;
use crate::error::{FetchError, FetchResult};
use crate::source::resilience::RateLimiter;
use crate::source::{http_client, GuideSource};

const SOURCE_NAME: &str = "tvmao";

pub const DEFAULT_BASE_URL: &str = "https://www.tvmao.com";

/// The site serves a reduced page to unknown clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// Marker the site appends to the slot currently on air.
const ON_AIR_MARKER: &str = "正在播出";

/// Which page family a channel's schedule lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    /// National, pay, and regional channels.
    Program,
    /// Provincial satellite channels.
    Satellite,
}

impl PageKind {
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Program => "program",
            Self::Satellite => "program_satellite",
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A channel in the TVMao lineup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TvmaoChannel {
    /// Name used in the guide.
    pub name: &'static str,
    /// TVMao's identifier for the channel.
    pub remote_id: &'static str,
    pub kind: PageKind,
}

const fn program(name: &'static str, remote_id: &'static str) -> TvmaoChannel {
    TvmaoChannel {
        name,
        remote_id,
        kind: PageKind::Program,
    }
}

const fn satellite(name: &'static str, remote_id: &'static str) -> TvmaoChannel {
    TvmaoChannel {
        name,
        remote_id,
        kind: PageKind::Satellite,
    }
}

/// Channels scraped from TVMao, in guide order.
pub const CHANNELS: &[TvmaoChannel] = &[
    // CCTV
    program("CCTV1", "CCTV-CCTV1"),
    program("CCTV2", "CCTV-CCTV2"),
    program("CCTV3", "CCTV-CCTV3"),
    program("CCTV4", "CCTV-CCTV4"),
    program("CCTV5", "CCTV-CCTV5"),
    program("CCTV5+", "CCTV-CCTV5-PLUS"),
    program("CCTV6", "CCTV-CCTV6"),
    program("CCTV7", "CCTV-CCTV7"),
    program("CCTV8", "CCTV-CCTV8"),
    program("CCTV9", "CCTV-CCTV9"),
    program("CCTV10", "CCTV-CCTV10"),
    program("CCTV11", "CCTV-CCTV11"),
    program("CCTV12", "CCTV-CCTV12"),
    program("CCTV13", "CCTV-CCTV13"),
    program("CCTV14", "CCTV-CCTV15"),
    program("CCTV15", "CCTV-CCTV16"),
    program("CCTV16", "CCTV-CCTVOLY"),
    program("CCTV17", "CCTV-CCTV17NY"),
    // CCTV pay channels
    program("风云音乐", "CCTVPAYFEE-CCTVPAYFEE2"),
    program("第一剧场", "CCTVPAYFEE-CCTVPAYFEE3"),
    program("风云剧场", "CCTVPAYFEE-CCTVPAYFEE4"),
    program("风云足球", "CCTVPAYFEE-CCTVPAYFEE1"),
    program("世界地理", "CCTVPAYFEE-CCTVPAYFEE5"),
    program("电视指南", "CCTVPAYFEE-CCTVPAYFEE6"),
    program("怀旧剧场", "CCTVPAYFEE-CCTVPAYFEE7"),
    program("兵器科技", "CCTVPAYFEE-CCTVPAYFEE8"),
    program("CCTV4K超高清", "CCTVPAYFEE-CCTV4K"),
    // CHC
    program("CHC动作电影", "CHC-CHC1"),
    program("CHC家庭影院", "CHC-CHC2"),
    program("CHC影迷电影", "CHC-CHC3"),
    // Liaoning
    program("辽宁公共", "LNTV-LNTV7"),
    program("辽宁北方", "LNTV-LNTV8"),
    program("辽宁生活", "LNTV-LNTV6"),
    program("辽宁经济", "LNTV-LNTV-FINANCE"),
    program("辽宁都市", "LNTV-LNTV2"),
    program("辽宁影视剧", "LNTV-LNTV3"),
    program("辽宁体育休闲", "LNTV-LNTV-SPORT"),
    // Provincial satellite
    satellite("深圳卫视", "SZTV1"),
    satellite("重庆卫视", "CCQTV1"),
    satellite("广东卫视", "GDTV1"),
    satellite("北京卫视", "BTV1"),
    satellite("湖南卫视", "HUNANTV1"),
    satellite("东方卫视", "DONGFANG1"),
    satellite("四川卫视", "SCTV1"),
    satellite("天津卫视", "TJTV1"),
    satellite("安徽卫视", "AHTV1"),
    satellite("山东卫视", "SDTV1"),
    satellite("广西卫视", "GUANXI1"),
    satellite("江苏卫视", "JSTV1"),
    satellite("江西卫视", "JXTV1"),
    satellite("河北卫视", "HEBEI1"),
    satellite("河南卫视", "HNTV1"),
    satellite("浙江卫视", "ZJTV1"),
    satellite("海南卫视", "TCTC1"),
    satellite("湖北卫视", "HUBEI1"),
    satellite("东南卫视", "FJTV2"),
    satellite("贵州卫视", "GUIZOUTV1"),
    satellite("云南卫视", "YNTV1"),
    satellite("辽宁卫视", "LNTV1"),
    satellite("黑龙江卫视", "HLJTV1"),
    satellite("吉林卫视", "JILIN1"),
    satellite("宁夏卫视", "NXTV2"),
    satellite("新疆卫视", "XJTV1"),
    satellite("兵团卫视", "BINGTUAN"),
    satellite("甘肃卫视", "GSTV1"),
    satellite("内蒙古卫视", "NMGTV1"),
    satellite("青海卫视", "QHTV1"),
    satellite("三沙卫视", "SANSHATV"),
    satellite("厦门卫视", "XMTV5"),
    satellite("陕西卫视", "SHXITV1"),
];

/// Look up a channel in the lineup by its guide name.
#[must_use]
pub fn find_channel(name: &str) -> Option<&'static TvmaoChannel> {
    CHANNELS.iter().find(|c| c.name == name)
}

/// URL of the schedule page for `channel` on the weekday of `date`.
#[must_use]
pub fn page_url(base_url: &str, channel: &TvmaoChannel, date: NaiveDate) -> String {
    format!(
        "{}/{}/{}-w{}.html",
        base_url.trim_end_matches('/'),
        channel.kind,
        channel.remote_id,
        date.weekday().number_from_monday()
    )
}

// ---------------------------------------------------------------------------
// Page parsing
// ---------------------------------------------------------------------------

#[allow(clippy::expect_used)]
static LI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<li\b[^>]*>(.*?)</li>").expect("valid regex"));
#[allow(clippy::expect_used)]
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
#[allow(clippy::expect_used)]
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("valid regex")
});
#[allow(clippy::expect_used)]
static SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
#[allow(clippy::expect_used)]
static SLOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{1,2}:[0-9]{2})\s*(.*)$").expect("valid regex"));

/// A slot read from a schedule page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSlot {
    pub start: ClockTime,
    pub title: String,
}

fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(str::parse::<u32>))
                    .and_then(Result::ok)
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

/// Visible text of an HTML fragment, whitespace collapsed.
fn inner_text(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, " ");
    let decoded = decode_entities(&stripped);
    SPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

/// Extract scheduled slots from a schedule page, in page order.
///
/// List items that do not start with a time, or that carry no title once
/// the on-air marker is removed, are skipped.
#[must_use]
pub fn parse_schedule(html: &str) -> Vec<ScheduleSlot> {
    LI_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let text = inner_text(&caps[1]);
            let slot = SLOT_RE.captures(&text)?;
            let start = slot[1].parse::<ClockTime>().ok()?;
            let title = slot[2].replace(ON_AIR_MARKER, "");
            let title = SPACE_RE.replace_all(title.trim(), " ").into_owned();
            if title.is_empty() {
                return None;
            }
            Some(ScheduleSlot { start, title })
        })
        .collect()
}

/// Convert page slots into programmes on `date`.
///
/// Each slot stops where the next one starts; the last runs until 23:59:59.
/// A start earlier than the one before it has crossed midnight, and it and
/// every later slot move to the following date.
#[must_use]
pub fn to_programmes(channel: &str, date: NaiveDate, slots: &[ScheduleSlot]) -> Vec<Programme> {
    let mut day = date;
    let mut previous: Option<ClockTime> = None;
    slots
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            if previous.is_some_and(|prev| slot.start < prev) {
                day = day.checked_add_days(Days::new(1)).unwrap_or(day);
            }
            previous = Some(slot.start);
            match slots.get(i + 1) {
                Some(next) => Programme::on_date(channel, day, slot.start, next.start, &slot.title),
                None => Programme::until_end_of_day(channel, day, slot.start, &slot.title),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// TVMao page client.
#[derive(Debug, Clone)]
pub struct TvmaoClient {
    http: Client,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl TvmaoClient {
    /// Create a new TVMao client.
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

    /// Fetch the schedule page HTML for `channel` on `date`.
    pub async fn get_page(&self, channel: &TvmaoChannel, date: NaiveDate) -> FetchResult<String> {
        let url = page_url(&self.base_url, channel, date);
        log::info!("Fetching {} schedule: {}", channel.name, url);

        self.rate_limiter.acquire().await;
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT_LANGUAGE, "zh-CN,zh;q=0.9")
            .send()
            .await?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(FetchError::RateLimited {
                    source_name: SOURCE_NAME.to_string(),
                })
            }
            StatusCode::NOT_FOUND => {
                return Err(FetchError::NotFound {
                    channel: channel.name.to_string(),
                    source_name: SOURCE_NAME.to_string(),
                })
            }
            _ => {}
        }

        let response = response.error_for_status().map_err(|e| FetchError::Http {
            source_name: SOURCE_NAME.to_string(),
            message: e.to_string(),
        })?;

        Ok(response.text().await?)
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// The TVMao [`GuideSource`].
#[derive(Debug, Clone)]
pub struct TvmaoSource {
    client: TvmaoClient,
    data_from: String,
}

impl TvmaoSource {
    pub fn new(client: TvmaoClient, data_from: impl Into<String>) -> Self {
        Self {
            client,
            data_from: data_from.into(),
        }
    }

    pub fn from_config(config: &Config) -> FetchResult<Self> {
        let user_agent = config.user_agent.as_deref().unwrap_or(BROWSER_USER_AGENT);
        let client = TvmaoClient::new(
            config.tvmao_base_url.clone(),
            Duration::from_secs(config.tvmao_timeout_secs),
            user_agent,
            config.requests_per_second,
        )?;
        Ok(Self::new(client, config.tvmao_base_url.clone()))
    }
}

#[async_trait]
impl GuideSource for TvmaoSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn data_from(&self) -> &str {
        &self.data_from
    }

    fn lineup(&self) -> Vec<&str> {
        CHANNELS.iter().map(|c| c.name).collect()
    }

    async fn fetch_listing(&self, channel: &str, date: NaiveDate) -> FetchResult<Vec<Programme>> {
        let entry = find_channel(channel).ok_or_else(|| FetchError::UnknownChannel {
            channel: channel.to_string(),
            source_name: SOURCE_NAME.to_string(),
        })?;

        let html = self.client.get_page(entry, date).await?;
        let slots = parse_schedule(&html);
        if slots.is_empty() {
            return Err(FetchError::NotFound {
                channel: channel.to_string(),
                source_name: SOURCE_NAME.to_string(),
            });
        }

        log::info!("{} has {} programmes", channel, slots.len());
        Ok(to_programmes(channel, date, &slots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2026-02-12 is a Thursday.
    fn thursday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 12).unwrap()
    }

    const PAGE: &str = r#"
<html><body>
  <ul class="nav"><li><a href="/">首页</a></li><li><a href="/tv">电视</a></li></ul>
  <ul id="pgrow">
    <li class="paybg"><span class="am">06:00</span><span class="p_show"><a href="/drama/1">朝闻天下</a></span></li>
    <li><span>9:00</span> <span class="p_show">生活圈 &amp; 你</span></li>
    <li class="cur"><span>12:00</span><span class="p_show">新闻30分</span><em>正在播出</em></li>
    <li><span>13:00</span></li>
    <li><span>19:00</span>
        <span class="p_show">新闻&nbsp;联播</span></li>
    <li><a>查看更多</a></li>
  </ul>
</body></html>
"#;

    #[test]
    fn test_lineup() {
        assert_eq!(CHANNELS.len(), 70);
        let satellites = CHANNELS
            .iter()
            .filter(|c| c.kind == PageKind::Satellite)
            .count();
        assert_eq!(satellites, 33);
        let unique: std::collections::HashSet<_> = CHANNELS.iter().map(|c| c.name).collect();
        assert_eq!(unique.len(), CHANNELS.len());
    }

    #[test]
    fn test_find_channel() {
        let channel = find_channel("CCTV5+").unwrap();
        assert_eq!(channel.remote_id, "CCTV-CCTV5-PLUS");
        assert_eq!(channel.kind, PageKind::Program);
        assert!(find_channel("农林卫视").is_none());
    }

    #[test]
    fn test_page_url() {
        let cctv1 = find_channel("CCTV1").unwrap();
        assert_eq!(
            page_url("https://www.tvmao.com/", cctv1, thursday()),
            "https://www.tvmao.com/program/CCTV-CCTV1-w4.html"
        );

        let hunan = find_channel("湖南卫视").unwrap();
        let sunday = NaiveDate::from_ymd_opt(2026, 2, 15).unwrap();
        assert_eq!(
            page_url("https://www.tvmao.com", hunan, sunday),
            "https://www.tvmao.com/program_satellite/HUNANTV1-w7.html"
        );
    }

    #[test]
    fn test_parse_schedule() {
        let slots = parse_schedule(PAGE);
        let rendered: Vec<(String, &str)> = slots
            .iter()
            .map(|s| (s.start.to_string(), s.title.as_str()))
            .collect();

        assert_eq!(
            rendered,
            vec![
                ("06:00".to_string(), "朝闻天下"),
                ("09:00".to_string(), "生活圈 & 你"),
                ("12:00".to_string(), "新闻30分"),
                ("19:00".to_string(), "新闻 联播"),
            ]
        );
    }

    #[test]
    fn test_parse_schedule_empty_page() {
        assert!(parse_schedule("<html><body><p>维护中</p></body></html>").is_empty());
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a&amp;b &#20013;&#x6587; &bogus;"), "a&b 中文 &bogus;");
    }

    #[test]
    fn test_to_programmes_chains_stop_times() {
        let slots = vec![
            ScheduleSlot {
                start: "06:00".parse().unwrap(),
                title: "朝闻天下".to_string(),
            },
            ScheduleSlot {
                start: "9:00".parse().unwrap(),
                title: "生活圈".to_string(),
            },
            ScheduleSlot {
                start: "23:10".parse().unwrap(),
                title: "晚间新闻".to_string(),
            },
        ];
        let progs = to_programmes("CCTV1", thursday(), &slots);

        assert_eq!(progs.len(), 3);
        assert_eq!(progs[0].start, "20260212060000 +0800");
        assert_eq!(progs[0].stop, "20260212090000 +0800");
        assert_eq!(progs[1].stop, "20260212231000 +0800");
        assert_eq!(progs[2].start, "20260212231000 +0800");
        assert_eq!(progs[2].stop, "20260212235959 +0800");
    }

    #[test]
    fn test_to_programmes_slot_crossing_midnight() {
        let slots = vec![
            ScheduleSlot {
                start: "23:30".parse().unwrap(),
                title: "午夜剧场".to_string(),
            },
            ScheduleSlot {
                start: "0:30".parse().unwrap(),
                title: "重播".to_string(),
            },
        ];
        let progs = to_programmes("CCTV6", thursday(), &slots);

        assert_eq!(progs[0].start, "20260212233000 +0800");
        assert_eq!(progs[0].stop, "20260213003000 +0800");
        assert_eq!(progs[1].start, "20260213003000 +0800");
        assert_eq!(progs[1].stop, "20260213235959 +0800");
    }

    #[tokio::test]
    async fn test_unknown_channel_is_rejected_before_any_request() {
        let source = TvmaoSource::from_config(&Config::default()).unwrap();
        let err = source
            .fetch_listing("农林卫视", thursday())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::UnknownChannel { .. }));
    }
}
