use std::path::PathBuf;

use crate::tiling::grid::TileDescriptor;

/// Convenience result type used across tilescale.
pub type UpscaleResult<T> = Result<T, UpscaleError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum UpscaleError {
    /// Scale factor outside the supported set (2, 3, 4).
    #[error("invalid scale {0}: supported scales are 2, 3, 4")]
    InvalidScale(u32),

    /// Invalid user-provided configuration or raster data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A dispatched transform invocation failed. Fatal for the whole run.
    #[error("tile transform failed for tile {index} {tile}: {source}")]
    TileTransformFailure {
        /// Row-major position of the failing tile.
        index: usize,
        /// Source-space bounds of the failing tile.
        tile: TileDescriptor,
        /// Error raised by the transform.
        source: anyhow::Error,
    },

    /// A tile result did not fit its canvas window. Recoverable: the compositor reports it
    /// and leaves the window blank.
    #[error(transparent)]
    CompositeShapeMismatch(#[from] ShapeMismatch),

    /// The source raster could not be read or decoded.
    #[error("failed to load source image '{}': {source}", path.display())]
    SourceLoadFailure {
        /// Path that was read.
        path: PathBuf,
        /// Underlying decode or IO error.
        source: anyhow::Error,
    },

    /// The output canvas could not be encoded or written.
    #[error("failed to save output image '{}': {source}", path.display())]
    OutputSaveFailure {
        /// Path that was written.
        path: PathBuf,
        /// Underlying encode or IO error.
        source: anyhow::Error,
    },

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl UpscaleError {
    /// Build a [`UpscaleError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`UpscaleError::SourceLoadFailure`] value.
    pub fn source_load(path: impl Into<PathBuf>, source: impl Into<anyhow::Error>) -> Self {
        Self::SourceLoadFailure {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Build a [`UpscaleError::OutputSaveFailure`] value.
    pub fn output_save(path: impl Into<PathBuf>, source: impl Into<anyhow::Error>) -> Self {
        Self::OutputSaveFailure {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// A tile whose origin-cropped result does not fit the canvas window assigned to it.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error(
    "composite shape mismatch for tile {index} {tile}: portion {portion_width}x{portion_height}, \
     target {target_width}x{target_height} at ({target_x}, {target_y})"
)]
pub struct ShapeMismatch {
    /// Row-major position of the tile.
    pub index: usize,
    /// Source-space bounds of the tile.
    pub tile: TileDescriptor,
    /// Width of the usable portion of the tile result.
    pub portion_width: u32,
    /// Height of the usable portion of the tile result.
    pub portion_height: u32,
    /// Canvas x of the write window.
    pub target_x: u32,
    /// Canvas y of the write window.
    pub target_y: u32,
    /// Width of the write window.
    pub target_width: u32,
    /// Height of the write window.
    pub target_height: u32,
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
