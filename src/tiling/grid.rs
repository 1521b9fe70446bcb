use std::fmt;

use crate::foundation::error::{UpscaleError, UpscaleResult};

/// Source-space bounds of one tile, overlap padding included, clamped to the raster.
///
/// Start is inclusive, end is exclusive: `0 <= x_start < x_end <= width`, same for y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileDescriptor {
    pub x_start: u32,
    pub y_start: u32,
    pub x_end: u32,
    pub y_end: u32,
}

impl TileDescriptor {
    pub fn width(self) -> u32 {
        self.x_end - self.x_start
    }

    pub fn height(self) -> u32 {
        self.y_end - self.y_start
    }

    pub fn contains(self, x: u32, y: u32) -> bool {
        self.x_start <= x && x < self.x_end && self.y_start <= y && y < self.y_end
    }
}

impl fmt::Display for TileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[x {}..{}, y {}..{}]",
            self.x_start, self.x_end, self.y_start, self.y_end
        )
    }
}

/// Tile layout over a `width`x`height` source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileGrid {
    pub width: u32,
    pub height: u32,
    pub tile_size: u32,
    pub overlap: u32,
    pub tiles_x: u32,
    pub tiles_y: u32,
}

impl TileGrid {
    pub fn new(width: u32, height: u32, tile_size: u32, overlap: u32) -> UpscaleResult<Self> {
        if tile_size == 0 {
            return Err(UpscaleError::validation("tile size must be > 0 to partition"));
        }
        if width == 0 || height == 0 {
            return Err(UpscaleError::validation(format!(
                "cannot partition an empty {width}x{height} raster"
            )));
        }
        Ok(Self {
            width,
            height,
            tile_size,
            overlap,
            tiles_x: width.div_ceil(tile_size).max(1),
            tiles_y: height.div_ceil(tile_size).max(1),
        })
    }

    pub fn len(&self) -> usize {
        self.tiles_x as usize * self.tiles_y as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bounds of tile (`tx`, `ty`). Overlap is added on both sides, then clamped.
    pub fn descriptor(&self, tx: u32, ty: u32) -> TileDescriptor {
        let ts = u64::from(self.tile_size);
        let ov = u64::from(self.overlap);
        let lo = |i: u32| (u64::from(i) * ts).saturating_sub(ov) as u32;
        let hi = |i: u32, limit: u32| ((u64::from(i) + 1) * ts + ov).min(u64::from(limit)) as u32;
        TileDescriptor {
            x_start: lo(tx),
            y_start: lo(ty),
            x_end: hi(tx, self.width),
            y_end: hi(ty, self.height),
        }
    }

    /// All tiles in row-major order (`ty` outer, `tx` inner). The compositor pairs results
    /// with descriptors by this position.
    pub fn descriptors(&self) -> Vec<TileDescriptor> {
        let mut out = Vec::with_capacity(self.len());
        for ty in 0..self.tiles_y {
            for tx in 0..self.tiles_x {
                out.push(self.descriptor(tx, ty));
            }
        }
        out
    }
}

/// Partition a `width`x`height` source into overlapping tiles, row-major.
pub fn partition(
    width: u32,
    height: u32,
    tile_size: u32,
    overlap: u32,
) -> UpscaleResult<Vec<TileDescriptor>> {
    Ok(TileGrid::new(width, height, tile_size, overlap)?.descriptors())
}

/// Whether a source of this size goes through the tiled path.
///
/// Tiling needs a positive tile size, a source larger than one tile in some dimension, and an
/// area above `min_area`; smaller sources are cheaper to transform in one call.
pub fn should_tile(width: u32, height: u32, tile_size: u32, min_area: u64) -> bool {
    tile_size > 0
        && (width > tile_size || height > tile_size)
        && u64::from(width) * u64::from(height) > min_area
}

#[cfg(test)]
#[path = "../../tests/unit/tiling/grid.rs"]
mod tests;
