//! Data models

pub mod threat_log;

pub use threat_log::*;
