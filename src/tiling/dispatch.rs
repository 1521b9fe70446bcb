use rayon::prelude::*;

use crate::{
    foundation::{
        error::{UpscaleError, UpscaleResult},
        raster::Raster,
    },
    progress::tracker::ProgressTracker,
    tiling::grid::TileDescriptor,
    transform::backend::Transform,
};

/// A source region copied out for independent transformation.
#[derive(Clone, Debug)]
pub struct Tile {
    pub descriptor: TileDescriptor,
    pub raster: Raster,
}

/// Copy each descriptor's region out of `source`, keeping descriptor order.
pub fn extract_tiles(source: &Raster, descriptors: &[TileDescriptor]) -> UpscaleResult<Vec<Tile>> {
    source.check_layout()?;
    descriptors
        .iter()
        .map(|&d| {
            Ok(Tile {
                descriptor: d,
                raster: source.crop(d.x_start, d.y_start, d.width(), d.height())?,
            })
        })
        .collect()
}

/// Run `transform` over every tile on a bounded worker pool.
///
/// Results come back in tile order regardless of completion order. Each finished tile reports
/// one unit to `tracker`. The first failing tile in order aborts the dispatch.
#[tracing::instrument(skip_all, fields(tiles = tiles.len(), transform = transform.name()))]
pub fn dispatch(
    transform: &dyn Transform,
    tiles: &[Tile],
    threads: Option<usize>,
    tracker: &ProgressTracker,
) -> UpscaleResult<Vec<Raster>> {
    if tiles.is_empty() {
        return Ok(Vec::new());
    }

    let workers = worker_count(threads, tiles.len())?;
    tracing::info!(workers, "dispatching tile transforms");
    let pool = build_thread_pool(workers)?;

    let outcomes = pool.install(|| {
        tiles
            .par_iter()
            .enumerate()
            .map(|(index, tile)| {
                let out = transform.apply(&tile.raster).and_then(|r| {
                    r.check_layout()?;
                    Ok(r)
                });
                tracker.update(1);
                match &out {
                    Ok(r) => tracing::debug!(
                        index,
                        tile = %tile.descriptor,
                        width = r.width,
                        height = r.height,
                        "tile transformed"
                    ),
                    Err(e) => {
                        tracing::debug!(index, tile = %tile.descriptor, error = %e, "tile transform failed")
                    }
                }
                out
            })
            .collect::<Vec<_>>()
    });

    let mut results = Vec::with_capacity(outcomes.len());
    for (index, (outcome, tile)) in outcomes.into_iter().zip(tiles).enumerate() {
        match outcome {
            Ok(r) => results.push(r),
            Err(source) => {
                return Err(UpscaleError::TileTransformFailure {
                    index,
                    tile: tile.descriptor,
                    source,
                });
            }
        }
    }
    Ok(results)
}

/// `min(threads or host parallelism, tile_count)`, never below one.
pub fn worker_count(threads: Option<usize>, tile_count: usize) -> UpscaleResult<usize> {
    let cap = match threads {
        Some(0) => {
            return Err(UpscaleError::validation(
                "dispatch 'threads' must be >= 1 when set",
            ));
        }
        Some(n) => n,
        None => std::thread::available_parallelism().map_or(1, |n| n.get()),
    };
    Ok(cap.min(tile_count).max(1))
}

fn build_thread_pool(threads: usize) -> UpscaleResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("tilescale-worker-{i}"))
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build rayon thread pool: {e}").into())
}

#[cfg(test)]
#[path = "../../tests/unit/tiling/dispatch.rs"]
mod tests;
