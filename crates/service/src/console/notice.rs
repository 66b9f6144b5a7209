use std::fmt::Display;

use tracing::warn;

/// A dismissible banner describing a backend call that failed without
/// blocking the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub operation: &'static str,
    pub message: String,
}

/// What to do with a swallowed failure. It is always logged and counted;
/// `surface` decides whether the view also gets a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailurePolicy {
    pub surface: bool,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self { surface: true }
    }
}

impl FailurePolicy {
    pub fn silent() -> Self {
        Self { surface: false }
    }

    pub fn report(&self, operation: &'static str, err: &dyn Display) -> Option<Notice> {
        warn!(operation, err = %err, "backend call failed");
        common::metrics::record_remote_failure(operation);
        self.surface.then(|| Notice { operation, message: format!("Could not {operation}: {err}") })
    }
}
