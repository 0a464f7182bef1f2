//! Upload service registry: name → handler.
//!
//! Built once at startup and shared read-only (behind an `Arc`) for the rest
//! of the session.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::UploadHandler;
use crate::error::AppError;

/// Service returned by `get_default` whenever it is registered.
pub const PREFERRED_SERVICE: &str = crate::api::storage_proxy::SERVICE_NAME;

/// Next choices for `get_default` when the preferred service is missing.
pub const DEFAULT_PRIORITY: &[&str] = &[
    crate::api::zero_x_zero::SERVICE_NAME,
    crate::api::file_io::SERVICE_NAME,
];

#[derive(Default, Clone)]
pub struct ServiceRegistry {
    services: BTreeMap<String, Arc<dyn UploadHandler>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the handler keyed by its name.
    pub fn register(&mut self, handler: Arc<dyn UploadHandler>) -> crate::error::Result<()> {
        let name = handler.name().to_string();
        if name.trim().is_empty() {
            return Err(AppError::Config(
                "Upload service name must not be empty".into(),
            ));
        }
        if self.services.insert(name.clone(), handler).is_some() {
            log::debug!("Replaced upload service: name={}", name);
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn UploadHandler>> {
        self.services.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// All registered handlers, sorted by name.
    pub fn list_all(&self) -> Vec<Arc<dyn UploadHandler>> {
        self.services.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Preferred service, else the first of the fixed priority list, else the
    /// first registered service by name.
    pub fn get_default(&self) -> crate::error::Result<Arc<dyn UploadHandler>> {
        std::iter::once(PREFERRED_SERVICE)
            .chain(DEFAULT_PRIORITY.iter().copied())
            .find_map(|name| self.get(name))
            .or_else(|| self.services.values().next().cloned())
            .ok_or_else(|| AppError::Config("No upload services available".into()))
    }

    /// `get(name)`, falling back to `get_default()` when `name` is unknown.
    pub fn resolve(&self, name: &str) -> crate::error::Result<Arc<dyn UploadHandler>> {
        match self.get(name) {
            Some(handler) => Ok(handler),
            None => {
                if !name.is_empty() {
                    log::warn!("Upload service '{}' is not registered, using default", name);
                }
                self.get_default()
            }
        }
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.services.keys().collect::<Vec<_>>())
            .finish()
    }
}
