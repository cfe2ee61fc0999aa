use crate::atlas::AtlasError;
use crate::backend::BackendError;
use thiserror::Error;

/// Failure of a draw call. Unmapped glyphs and finished caches are not errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Atlas(#[from] AtlasError),
}
