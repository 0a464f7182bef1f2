use crate::api::storage_proxy::{HealthStatus, StorageProxyHandler};
use crate::models::settings::AppSettings;

/// Ask the storage proxy whether it and its bucket are reachable.
pub async fn check_health(settings: &AppSettings) -> crate::error::Result<HealthStatus> {
    let proxy = StorageProxyHandler::new(&settings.api_base_url)?;
    let status = proxy.health().await?;
    if status.healthy {
        log::info!("Storage proxy healthy: url={}", proxy.base_url());
    } else {
        log::warn!(
            "Storage proxy unhealthy: url={}, error={}",
            proxy.base_url(),
            status.error.as_deref().unwrap_or("unknown")
        );
    }
    Ok(status)
}
