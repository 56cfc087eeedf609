use serde::{Deserialize, Serialize};

use crate::model::{Channel, Programme};

/// Default value of the `info-name` attribute on `<tv>`.
pub const DEFAULT_INFO_NAME: &str = "by oaixnah";

/// Default value of the `info-url` attribute on `<tv>`.
pub const DEFAULT_INFO_URL: &str = "https://tv.oaix.tech/e.xml";

/// A complete electronic programme guide for one harvest.
///
/// Channels and programmes keep insertion order; the XMLTV writer emits
/// them in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guide {
    pub info_name: String,
    pub info_url: String,
    /// Where the listings were obtained from (e.g. an API base URL).
    pub data_from: String,
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub programmes: Vec<Programme>,
}

impl Guide {
    #[must_use]
    pub fn new(data_from: impl Into<String>) -> Self {
        Self {
            info_name: DEFAULT_INFO_NAME.to_string(),
            info_url: DEFAULT_INFO_URL.to_string(),
            data_from: data_from.into(),
            channels: Vec::new(),
            programmes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_info(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.info_name = name.into();
        self.info_url = url.into();
        self
    }

    pub fn push_channel(&mut self, channel: Channel) {
        self.channels.push(channel);
    }

    pub fn push_programme(&mut self, programme: Programme) {
        self.programmes.push(programme);
    }

    /// Add a channel together with its listing.
    pub fn push_listing(&mut self, channel: Channel, programmes: Vec<Programme>) {
        self.channels.push(channel);
        self.programmes.extend(programmes);
    }

    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    #[must_use]
    pub fn programme_count(&self) -> usize {
        self.programmes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty() && self.programmes.is_empty()
    }

    /// Programmes airing on the channel with the given id.
    pub fn programmes_for<'a>(&'a self, channel_id: &'a str) -> impl Iterator<Item = &'a Programme> {
        self.programmes
            .iter()
            .filter(move |p| p.channel == channel_id)
    }

    /// Serialize the guide as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
