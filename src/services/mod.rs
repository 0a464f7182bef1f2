//! Business logic layer.
//!
//! Service registry, upload orchestration with fallback, folder archiving,
//! pre-flight validation and progress gating. Called by the `commands` layer;
//! delegates HTTP interactions to the `api` layer.

pub mod archiver;
pub mod fallback;
pub mod orchestrator;
pub mod progress;
pub mod registry;
pub mod validation;
