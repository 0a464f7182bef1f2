//! Command handlers behind the CLI.
//!
//! Handlers parse their arguments and forward to the `services` and
//! `storage` layers. They should not contain business logic directly.

pub mod files;
pub mod history;
pub mod network;
pub mod services;
pub mod settings;
pub mod upload;
