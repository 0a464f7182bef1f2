//! Data models shared across the crate.
//!
//! Upload payloads and results, resolved file entries, persisted settings and
//! history records.

pub mod file;
pub mod history;
pub mod settings;
pub mod upload;
