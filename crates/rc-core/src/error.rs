//! Error types shared by the host traits and the controller.

/// Failure reported by a browser service.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("{api} failed: {message}")]
    Api { api: &'static str, message: String },
    #[error("{api} returned an unexpected value: {detail}")]
    Malformed { api: &'static str, detail: String },
    #[error("{0} is not available in this context")]
    Unavailable(&'static str),
    #[error("JSON conversion failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error surfaced by controller operations.
///
/// Permission denial and unsupported pages are not errors; they come back as
/// an unsuccessful [`crate::ActionOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum ActivationError {
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("failed to persist '{key}': {source}")]
    Storage {
        key: &'static str,
        #[source]
        source: HostError,
    },
}
