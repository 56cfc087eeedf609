use serde::{Deserialize, Serialize};

/// A broadcast channel listed in the guide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Channel {
    /// XMLTV channel id (e.g. "CCTV1"), referenced by programmes.
    pub id: String,
    pub display_name: String,
}

impl Channel {
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    /// A channel whose id and display name are the same string, which is
    /// how every upstream lineup names its channels.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            display_name: name,
        }
    }
}
