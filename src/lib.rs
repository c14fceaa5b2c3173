pub mod error;
pub mod model;

// Re-exports for convenience
pub use error::ModelError;
pub use model::blocks::{ActKind, NormKind, PadKind};
pub use model::{ContentNet, ContentNetConfig};
