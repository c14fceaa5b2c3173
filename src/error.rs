//! Error types for model construction.
//!
//! Every variant is a deterministic consequence of a bad configuration and is
//! reported when the network is built, never deferred to the first forward call.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    /// Activation kind string not in the supported set.
    #[error("activation kind [{0}] is not supported (expected relu, lrelu or prelu)")]
    UnsupportedActivation(String),

    /// Padding kind string not in the supported set.
    #[error("padding kind [{0}] is not supported (expected zero, reflect or replicate)")]
    UnsupportedPadding(String),

    /// Normalization kind string not in the supported set.
    #[error("normalization kind [{0}] is not supported (expected none, batch or instance)")]
    UnsupportedNorm(String),

    /// Upscale factor outside the supported staging table.
    #[error("upscale factor {0} is not supported (expected a power of two >= 2, or 3)")]
    UnsupportedUpscale(usize),

    /// Hyperparameter combination that cannot produce a valid network.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
