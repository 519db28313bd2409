use thiserror::Error;

use crate::providers::ProviderError;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// The listing or detail capability failed (network, rate limit, bad
    /// key, unexpected status).
    #[error("Upstream fetch failed: {0}")]
    Upstream(#[from] ProviderError),

    #[error("Invalid request: {0}")]
    Validation(String),

    /// Upstream confirmed the requested id does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl CatalogError {
    /// Translate a provider failure for a specific resource, keeping
    /// upstream 404s distinguishable from transient failures.
    pub fn from_provider(err: ProviderError, resource: impl Into<String>) -> Self {
        match err {
            ProviderError::NotFound => Self::NotFound(resource.into()),
            other => Self::Upstream(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
