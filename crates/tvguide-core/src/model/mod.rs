pub mod channel;
pub mod guide;
pub mod programme;

pub use channel::Channel;
pub use guide::{Guide, DEFAULT_INFO_NAME, DEFAULT_INFO_URL};
pub use programme::Programme;
