use std::{
    path::Path,
    time::{Duration, Instant},
};

use crate::{
    assets::decode::{load_raster, save_raster},
    foundation::{
        config::PipelineConfig,
        error::{ShapeMismatch, UpscaleError, UpscaleResult},
        raster::Raster,
    },
    progress::{
        spinner::Spinner,
        tracker::{ProgressSink, ProgressTracker},
    },
    tiling::{
        composite::composite,
        dispatch::{dispatch, extract_tiles},
        grid::{TileDescriptor, TileGrid, should_tile},
    },
    transform::backend::{Transform, check_scale},
};

/// Single-shot sources above this area get an activity spinner while the transform runs.
pub const SPINNER_MIN_AREA: u64 = 500_000;

/// Orchestrator states. A run is either
/// `Idle -> Partitioning -> Dispatching -> Compositing -> Done` or `Idle -> SingleShot -> Done`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Partitioning,
    Dispatching,
    Compositing,
    SingleShot,
    Done,
}

impl Stage {
    pub fn can_advance_to(self, next: Stage) -> bool {
        use Stage::*;
        matches!(
            (self, next),
            (Idle, Partitioning)
                | (Partitioning, Dispatching)
                | (Dispatching, Compositing)
                | (Compositing, Done)
                | (Idle, SingleShot)
                | (SingleShot, Done)
        )
    }
}

#[derive(Debug)]
struct StageCursor(Stage);

impl StageCursor {
    fn advance(&mut self, next: Stage) -> UpscaleResult<()> {
        if !self.0.can_advance_to(next) {
            return Err(UpscaleError::validation(format!(
                "illegal pipeline stage transition {:?} -> {next:?}",
                self.0
            )));
        }
        tracing::debug!(from = ?self.0, to = ?next, "pipeline stage");
        self.0 = next;
        Ok(())
    }
}

/// How a run was executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineMode {
    SingleShot,
    Tiled { tiles_x: u32, tiles_y: u32 },
}

/// Run metrics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpscaleStats {
    pub mode: PipelineMode,
    pub input_width: u32,
    pub input_height: u32,
    pub output_width: u32,
    pub output_height: u32,
    /// Transform invocations: 1 for single-shot, tile count otherwise.
    pub tiles_total: usize,
    /// Tiles whose output region was left blank after a shape mismatch.
    pub tiles_degraded: usize,
    pub elapsed: Duration,
}

impl UpscaleStats {
    pub fn input_megapixels_per_sec(&self) -> f64 {
        megapixels_per_sec(self.input_width, self.input_height, self.elapsed)
    }

    pub fn output_megapixels_per_sec(&self) -> f64 {
        megapixels_per_sec(self.output_width, self.output_height, self.elapsed)
    }
}

fn megapixels_per_sec(w: u32, h: u32, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    (f64::from(w) * f64::from(h) / 1_000_000.0) / secs
}

/// Result of [`run_pipeline`].
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    pub canvas: Raster,
    pub stats: UpscaleStats,
    /// Tiles the compositor skipped; empty unless the output is degraded.
    pub mismatches: Vec<ShapeMismatch>,
}

/// Upscale `source` by `config.scale` with `transform`, tiling large inputs.
///
/// Small inputs (see [`should_tile`]) are handed to the transform whole. Large inputs are
/// partitioned into overlapping tiles, transformed concurrently, and composited into a
/// zeroed canvas of `scale * width` by `scale * height`. Any failing tile fails the run.
#[tracing::instrument(
    skip_all,
    fields(width = source.width, height = source.height, scale = %config.scale)
)]
pub fn run_pipeline(
    source: &Raster,
    transform: &dyn Transform,
    config: &PipelineConfig,
) -> UpscaleResult<PipelineOutput> {
    config.validate()?;
    check_scale(transform, config.scale)?;
    source.check_layout()?;
    if source.is_empty() {
        return Err(UpscaleError::validation(format!(
            "source raster {}x{} has no pixels",
            source.width, source.height
        )));
    }

    let factor = config.scale.factor();
    let (out_w, out_h) = match (
        source.width.checked_mul(factor),
        source.height.checked_mul(factor),
    ) {
        (Some(w), Some(h)) => (w, h),
        _ => {
            return Err(UpscaleError::validation(format!(
                "output of {}x{} at {} overflows",
                source.width, source.height, config.scale
            )));
        }
    };

    let started = Instant::now();
    let mut stage = StageCursor(Stage::Idle);

    if !should_tile(
        source.width,
        source.height,
        config.tile_size,
        config.min_tiling_area,
    ) {
        stage.advance(Stage::SingleShot)?;
        tracing::info!("transforming whole image in one call");
        let canvas = single_shot(source, transform, config, out_w, out_h)?;
        stage.advance(Stage::Done)?;
        return Ok(PipelineOutput {
            canvas,
            stats: UpscaleStats {
                mode: PipelineMode::SingleShot,
                input_width: source.width,
                input_height: source.height,
                output_width: out_w,
                output_height: out_h,
                tiles_total: 1,
                tiles_degraded: 0,
                elapsed: started.elapsed(),
            },
            mismatches: Vec::new(),
        });
    }

    stage.advance(Stage::Partitioning)?;
    let grid = TileGrid::new(
        source.width,
        source.height,
        config.tile_size,
        config.overlap,
    )?;
    let descriptors = grid.descriptors();
    tracing::info!(
        tiles_x = grid.tiles_x,
        tiles_y = grid.tiles_y,
        tiles = descriptors.len(),
        "large image, using tiled processing"
    );
    let tiles = extract_tiles(source, &descriptors)?;

    stage.advance(Stage::Dispatching)?;
    let total = descriptors.len() as u64;
    let tile_tracker = ProgressTracker::new(
        total,
        "Processing tiles",
        ProgressSink::for_display(config.show_progress),
    );
    let results = dispatch(transform, &tiles, config.threads, &tile_tracker)?;
    tile_tracker.complete();
    drop(tiles);

    stage.advance(Stage::Compositing)?;
    tracing::info!("combining tiles into final image");
    let mut canvas = Raster::new(out_w, out_h);
    let combine_tracker = ProgressTracker::new(
        total,
        "Combining tiles",
        ProgressSink::for_display(config.show_progress),
    );
    let report = composite(
        &descriptors,
        &results,
        config.scale,
        &mut canvas,
        &combine_tracker,
    )?;
    combine_tracker.complete();
    if report.is_degraded() {
        tracing::warn!(
            skipped = report.mismatches.len(),
            "some tiles did not fit and were left blank"
        );
    }

    stage.advance(Stage::Done)?;
    Ok(PipelineOutput {
        canvas,
        stats: UpscaleStats {
            mode: PipelineMode::Tiled {
                tiles_x: grid.tiles_x,
                tiles_y: grid.tiles_y,
            },
            input_width: source.width,
            input_height: source.height,
            output_width: out_w,
            output_height: out_h,
            tiles_total: descriptors.len(),
            tiles_degraded: report.mismatches.len(),
            elapsed: started.elapsed(),
        },
        mismatches: report.mismatches,
    })
}

fn single_shot(
    source: &Raster,
    transform: &dyn Transform,
    config: &PipelineConfig,
    out_w: u32,
    out_h: u32,
) -> UpscaleResult<Raster> {
    let whole = TileDescriptor {
        x_start: 0,
        y_start: 0,
        x_end: source.width,
        y_end: source.height,
    };
    let fail = |err: anyhow::Error| UpscaleError::TileTransformFailure {
        index: 0,
        tile: whole,
        source: err,
    };

    let spinner = (config.show_progress && source.area() > SPINNER_MIN_AREA)
        .then(|| Spinner::start("Upscaling", ProgressSink::Stderr));
    let out = transform.apply(source);
    if let Some(spinner) = spinner {
        spinner.stop();
    }

    let out = out.map_err(fail)?;
    out.check_layout().map_err(|e| fail(e.into()))?;
    if out.width != out_w || out.height != out_h {
        return Err(fail(anyhow::anyhow!(
            "transform returned {}x{}, expected {out_w}x{out_h}",
            out.width,
            out.height
        )));
    }
    Ok(out)
}

/// Load `input`, upscale it, and write the canvas to `output`.
pub fn upscale_image(
    input: &Path,
    output: &Path,
    transform: &dyn Transform,
    config: &PipelineConfig,
) -> UpscaleResult<UpscaleStats> {
    config.validate()?;
    check_scale(transform, config.scale)?;

    let source = load_raster(input)?;
    tracing::info!(
        width = source.width,
        height = source.height,
        path = %input.display(),
        "input image loaded"
    );

    let out = run_pipeline(&source, transform, config)?;
    drop(source);

    save_raster(output, &out.canvas)?;
    tracing::info!(path = %output.display(), "upscaled image saved");
    Ok(out.stats)
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
