pub mod channels;
pub mod config;
pub mod fetch;
pub mod url;

pub use channels::list_channels;
pub use fetch::run_fetch;
pub use url::show_url;
