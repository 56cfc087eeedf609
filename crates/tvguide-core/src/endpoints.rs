//! Public URL layout of a published guide.
//!
//! The generated guide and the channel logos are served as static files:
//!
//! - `{base}/e.xml` for the XMLTV document
//! - `{base}/logo/{name}.png` for a channel's logo

use url::Url;

use crate::error::{Error, Result};

/// Base URL of the official deployment.
pub const DEFAULT_BASE_URL: &str = "https://tv.oaix.tech";

/// File name of the published guide document.
pub const GUIDE_FILE_NAME: &str = "e.xml";

/// Builds public URLs relative to a deployment's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    /// Create endpoints rooted at `base_url`.
    ///
    /// A base with a path prefix (e.g. `https://example.org/tv/`) is
    /// supported; the trailing slash is optional.
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(Error::InvalidData(format!(
                "base URL cannot carry a path: {base_url}"
            )));
        }
        Ok(Self { base })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// URL of the published XMLTV document.
    pub fn guide_url(&self) -> Result<Url> {
        self.join(&[GUIDE_FILE_NAME])
    }

    /// URL of the logo for the channel called `name`.
    ///
    /// The name is percent-encoded as a single path segment, so names
    /// containing `/`, spaces, or non-ASCII characters stay intact.
    pub fn logo_url(&self, name: &str) -> Result<Url> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("channel name is empty".to_string()));
        }
        self.join(&["logo", &format!("{name}.png")])
    }

    fn join(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidData(format!("base URL cannot carry a path: {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
