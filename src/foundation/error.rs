/// Convenience result type used across the crate.
pub type TilingResult<T> = Result<T, TilingError>;

/// Errors surfaced by tiled-surface construction and rendering.
///
/// Textures that are not ready yet never produce an error; renderers report those as
/// [`crate::DrawOutcome::Skipped`] and the caller simply renders again next frame.
#[derive(thiserror::Error, Debug)]
pub enum TilingError {
    /// Invalid user input (sizes, pixel buffers, configuration).
    #[error("validation error: {0}")]
    Validation(String),

    /// A frame id was requested from a [`crate::TextureCache`] that does not hold it.
    #[error("unknown frame: the frame id \"{0}\" does not exist in the texture cache")]
    UnknownFrame(String),

    /// The drawing device or raster surface failed.
    #[error("backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TilingError {
    /// Build a [`TilingError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TilingError::UnknownFrame`].
    pub fn unknown_frame(id: impl Into<String>) -> Self {
        Self::UnknownFrame(id.into())
    }

    /// Build a [`TilingError::Backend`].
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
