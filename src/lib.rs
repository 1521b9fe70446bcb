//! tilescale is a tiled, parallel image-upscaling pipeline.
//!
//! A large raster is split into overlapping tiles, an external [`Transform`] enlarges each tile
//! independently on a bounded worker pool, and the results are composited into one canvas that
//! is exactly `scale` times the source in both dimensions.
//!
//! # Pipeline overview
//!
//! 1. **Partition**: `(width, height, tile_size, overlap) -> Vec<TileDescriptor>` (row-major)
//! 2. **Dispatch**: `Transform` over every tile concurrently, results kept in tile order
//! 3. **Composite**: each result written to its scaled window on a zeroed canvas, one writer
//!
//! Inputs at or below [`PipelineConfig::min_tiling_area`] pixels skip all three stages and are
//! transformed in one call.
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **No global state**: everything a run needs is in [`PipelineConfig`].
//! - **RGB8** end-to-end: [`Raster`] is tightly packed 8-bit RGB.
#![forbid(unsafe_code)]

mod assets;
mod foundation;
mod pipeline;
mod progress;
mod tiling;
mod transform;

pub use assets::decode::{decode_raster, load_raster, save_raster};
pub use foundation::config::{PipelineConfig, Scale};
pub use foundation::error::{ShapeMismatch, UpscaleError, UpscaleResult};
pub use foundation::raster::Raster;
pub use pipeline::{
    PipelineMode, PipelineOutput, SPINNER_MIN_AREA, Stage, UpscaleStats, run_pipeline,
    upscale_image,
};
pub use progress::spinner::Spinner;
pub use progress::tracker::{
    BAR_TEMPLATE, ProgressSink, ProgressState, ProgressTracker, REFRESH_HZ, bar_style, format_eta,
    format_hms, percent,
};
pub use tiling::composite::{CompositeReport, WriteWindow, composite, write_plan};
pub use tiling::dispatch::{Tile, dispatch, extract_tiles, worker_count};
pub use tiling::grid::{TileDescriptor, TileGrid, partition, should_tile};
pub use transform::backend::{ResampleTransform, Transform, TransformKind, create_transform};
