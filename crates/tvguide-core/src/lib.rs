//! Core domain model for tvguide.
//!
//! This crate defines the guide model (channels and programmes), the
//! XMLTV timestamp conventions, the XMLTV document writer, and the public
//! URL layout under which the guide and channel logos are published.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod endpoints;
pub mod error;
pub mod model;
pub mod time;
pub mod xmltv;

pub use endpoints::Endpoints;
pub use error::{Error, Result};
pub use model::{Channel, Guide, Programme};
pub use time::ClockTime;
