//! Fallback policy: which services to try after the primary fails.
//!
//! Retrying never reuses the service that just failed: each failure moves on
//! to the next name in the configured order. Pre-flight failures (size, empty
//! file, configuration) stop the chain because no other service would see a
//! different file.

use std::time::Duration;

use crate::models::upload::FailureKind;

/// Default fallback order after the primary service.
pub const DEFAULT_FALLBACK_ORDER: &[&str] = &[
    crate::api::zero_x_zero::SERVICE_NAME,
    crate::api::file_io::SERVICE_NAME,
];

/// Default bound on a single handler attempt.
pub const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 300;

/// Orchestrator configuration, built once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub fallback_order: Vec<String>,
    pub attempt_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fallback_order: DEFAULT_FALLBACK_ORDER.iter().map(|s| s.to_string()).collect(),
            attempt_timeout: Duration::from_secs(DEFAULT_ATTEMPT_TIMEOUT_SECS),
        }
    }
}

impl OrchestratorConfig {
    pub fn with_fallback_order<I, S>(mut self, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_order = order.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Fallback candidates in order, skipping every service already tried.
    pub fn candidates<'a>(&'a self, tried: &'a [String]) -> impl Iterator<Item = &'a str> + 'a {
        self.fallback_order
            .iter()
            .map(String::as_str)
            .filter(move |name| !tried.iter().any(|t| t == name))
    }
}

/// Whether a failure of this kind should move on to the next service.
pub fn should_fall_back(kind: FailureKind) -> bool {
    !kind.is_preflight()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order_is_0x0_then_fileio() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.fallback_order, vec!["0x0.st", "file.io"]);
        assert_eq!(config.attempt_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_candidates_skip_tried_services() {
        let config = OrchestratorConfig::default().with_fallback_order(["a", "b", "c"]);
        let tried = vec!["b".to_string()];
        let names: Vec<&str> = config.candidates(&tried).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_candidates_empty_when_all_tried() {
        let config = OrchestratorConfig::default().with_fallback_order(["a"]);
        let tried = vec!["a".to_string()];
        assert_eq!(config.candidates(&tried).count(), 0);
    }

    #[test]
    fn test_transport_failures_fall_back() {
        assert!(should_fall_back(FailureKind::Network));
        assert!(should_fall_back(FailureKind::RemoteRejected));
        assert!(should_fall_back(FailureKind::Timeout));
    }

    #[test]
    fn test_preflight_failures_do_not_fall_back() {
        assert!(!should_fall_back(FailureKind::SizeExceeded));
        assert!(!should_fall_back(FailureKind::EmptyFile));
        assert!(!should_fall_back(FailureKind::Configuration));
        assert!(!should_fall_back(FailureKind::Busy));
        assert!(!should_fall_back(FailureKind::Validation));
    }

    #[test]
    fn test_internal_failures_fall_back() {
        assert!(should_fall_back(FailureKind::Internal));
    }
}
