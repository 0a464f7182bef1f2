use serde::Serialize;

use crate::services::registry::ServiceRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub name: String,
    pub max_file_size: u64,
    pub is_default: bool,
}

/// Registered services sorted by name, with the default flagged.
pub fn list_services(registry: &ServiceRegistry) -> Vec<ServiceInfo> {
    let default = registry.get_default().ok().map(|h| h.name().to_string());
    registry
        .list_all()
        .iter()
        .map(|h| ServiceInfo {
            name: h.name().to_string(),
            max_file_size: h.max_file_size(),
            is_default: default.as_deref() == Some(h.name()),
        })
        .collect()
}
