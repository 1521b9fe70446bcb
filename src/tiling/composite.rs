use crate::{
    foundation::{
        config::Scale,
        error::{ShapeMismatch, UpscaleError, UpscaleResult},
        raster::Raster,
    },
    progress::tracker::ProgressTracker,
    tiling::grid::TileDescriptor,
};

/// Canvas rectangle one tile result is written to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteWindow {
    pub index: usize,
    pub tile: TileDescriptor,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl WriteWindow {
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Outcome of compositing one run's tiles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompositeReport {
    /// Tiles that wrote at least part of their window.
    pub tiles_written: usize,
    /// Tiles whose whole window belongs to a later tile sharing their start.
    pub tiles_superseded: usize,
    /// Tiles that did not fill their window; the uncovered part stays zero.
    pub mismatches: Vec<ShapeMismatch>,
}

impl CompositeReport {
    pub fn is_degraded(&self) -> bool {
        !self.mismatches.is_empty()
    }
}

fn same_row(a: &TileDescriptor, b: &TileDescriptor) -> bool {
    a.y_start == b.y_start && a.y_end == b.y_end
}

/// Canvas windows for `descriptors` (row-major) on a `canvas_width`x`canvas_height` canvas.
///
/// A tile's window starts at its padded source origin times `scale`, so the result is cropped
/// from its own origin. The window ends at the scaled padded end, clamped to the canvas, and is
/// cut short where the next tile's window begins: the next tile in the row bounds x, the first
/// tile of the next row bounds y. Later tiles own overlapping pixels, so a tile sharing its start
/// with a later one gets an empty window. For descriptors from [`TileGrid`](crate::TileGrid)
/// the windows are disjoint and cover the canvas.
pub fn write_plan(
    descriptors: &[TileDescriptor],
    scale: Scale,
    canvas_width: u32,
    canvas_height: u32,
) -> Vec<WriteWindow> {
    let s = u64::from(scale.factor());
    let (cw, ch) = (u64::from(canvas_width), u64::from(canvas_height));

    descriptors
        .iter()
        .enumerate()
        .map(|(index, d)| {
            let out_x_start = u64::from(d.x_start) * s;
            let out_y_start = u64::from(d.y_start) * s;
            let mut out_x_end = cw.min(u64::from(d.x_end) * s);
            let mut out_y_end = ch.min(u64::from(d.y_end) * s);

            let later = &descriptors[index + 1..];
            if let Some(next) = later.first()
                && same_row(next, d)
                && next.x_start >= d.x_start
            {
                out_x_end = out_x_end.min(u64::from(next.x_start) * s);
            }

            let mut prev = d;
            let below = later.iter().find(|n| {
                let starts_row = !same_row(n, d) || n.x_start < prev.x_start;
                prev = *n;
                starts_row
            });
            if let Some(below) = below {
                out_y_end = out_y_end.min(u64::from(below.y_start) * s);
            }

            WriteWindow {
                index,
                tile: *d,
                x: out_x_start.min(cw) as u32,
                y: out_y_start.min(ch) as u32,
                width: out_x_end.saturating_sub(out_x_start) as u32,
                height: out_y_end.saturating_sub(out_y_start) as u32,
            }
        })
        .collect()
}

/// Write each tile result into `canvas`, pairing results with descriptors by position.
///
/// Single-threaded by contract: this is the only writer of the canvas. The part of each
/// origin-cropped result that fits its window is written at the window origin. A result that
/// does not fill its window, or a tile lying outside the canvas, is logged and reported; the
/// uncovered part of the window keeps its previous contents.
pub fn composite(
    descriptors: &[TileDescriptor],
    results: &[Raster],
    scale: Scale,
    canvas: &mut Raster,
    tracker: &ProgressTracker,
) -> UpscaleResult<CompositeReport> {
    if descriptors.len() != results.len() {
        return Err(UpscaleError::validation(format!(
            "composite expects one result per tile: {} tiles, {} results",
            descriptors.len(),
            results.len()
        )));
    }
    canvas.check_layout()?;
    for result in results {
        result.check_layout()?;
    }

    let plan = write_plan(descriptors, scale, canvas.width, canvas.height);
    let s = u64::from(scale.factor());
    let mut report = CompositeReport::default();

    for (window, result) in plan.iter().zip(results) {
        let outside = u64::from(window.tile.x_start) * s >= u64::from(canvas.width)
            || u64::from(window.tile.y_start) * s >= u64::from(canvas.height);
        if window.area() == 0 && !outside {
            tracing::debug!(tile = %window.tile, "tile fully covered by a later tile");
            report.tiles_superseded += 1;
            tracker.update(1);
            continue;
        }

        let portion_width = result.width.min(window.width);
        let portion_height = result.height.min(window.height);
        if !outside && portion_width > 0 && portion_height > 0 {
            canvas.blit_from(result, portion_width, portion_height, window.x, window.y);
            report.tiles_written += 1;
        }
        if outside || portion_width != window.width || portion_height != window.height {
            let mismatch = ShapeMismatch {
                index: window.index,
                tile: window.tile,
                portion_width,
                portion_height,
                target_x: window.x,
                target_y: window.y,
                target_width: window.width,
                target_height: window.height,
            };
            tracing::warn!(
                tile = %window.tile,
                result_width = result.width,
                result_height = result.height,
                "{mismatch}; uncovered part left blank"
            );
            report.mismatches.push(mismatch);
        }
        tracker.update(1);
    }

    Ok(report)
}

#[cfg(test)]
#[path = "../../tests/unit/tiling/composite.rs"]
mod tests;
