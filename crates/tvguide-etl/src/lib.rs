//! Listing sources and the harvest pipeline for tvguide.
//!
//! Fetches per-channel schedules from an upstream source (the erw.cc API
//! or TVMao schedule pages), assembles them into a guide, and writes the
//! XMLTV document.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod harvest;
pub mod source;

pub use config::{Config, SourceKind};
pub use error::{FetchError, FetchResult};
pub use harvest::{harvest, harvest_to_file, Harvest, HarvestOptions, HarvestReport, SkippedChannel};
pub use source::{build_source, ErwSource, GuideSource, TvmaoSource};
