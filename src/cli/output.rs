//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, FailureKind};

/// Map domain errors to the single line printed on failure.
pub fn map_error(e: &ApiError) -> String {
    match e.failure_kind() {
        Some(FailureKind::Transport) => format!(
            "{} (check network connectivity and the provider endpoint)",
            e
        ),
        Some(FailureKind::Malformed) => format!(
            "{} (the model returned an unusable reply; retrying usually helps)",
            e
        ),
        _ => e.to_string(),
    }
}
