use std::fmt;

use crate::foundation::error::{UpscaleError, UpscaleResult};

/// Integer scale factor applied uniformly to width and height. Always 2, 3 or 4.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Scale(u32);

impl Scale {
    pub const SUPPORTED: [u32; 3] = [2, 3, 4];

    pub fn new(factor: u32) -> UpscaleResult<Self> {
        if Self::SUPPORTED.contains(&factor) {
            Ok(Self(factor))
        } else {
            Err(UpscaleError::InvalidScale(factor))
        }
    }

    pub fn factor(self) -> u32 {
        self.0
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self(2)
    }
}

impl TryFrom<u32> for Scale {
    type Error = UpscaleError;

    fn try_from(factor: u32) -> UpscaleResult<Self> {
        Self::new(factor)
    }
}

impl From<Scale> for u32 {
    fn from(scale: Scale) -> Self {
        scale.0
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0)
    }
}

/// Per-run pipeline configuration. Nothing here outlives a single run.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Output is `scale` times the source in both dimensions.
    pub scale: Scale,
    /// Tile edge length in source pixels. `0` disables tiling entirely.
    pub tile_size: u32,
    /// Extra source pixels read around each tile to hide transform edge artifacts.
    pub overlap: u32,
    /// Sources with `width * height` at or below this are transformed in one shot.
    pub min_tiling_area: u64,
    /// Worker count for tile dispatch; `None` uses host parallelism.
    pub threads: Option<usize>,
    /// Render progress bars and the single-shot spinner on stderr.
    pub show_progress: bool,
}

impl PipelineConfig {
    pub const DEFAULT_TILE_SIZE: u32 = 1024;
    pub const DEFAULT_OVERLAP: u32 = 16;
    pub const DEFAULT_MIN_TILING_AREA: u64 = 1_000_000;

    pub fn with_scale(scale: Scale) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> UpscaleResult<()> {
        Scale::new(self.scale.factor())?;
        if let Some(n) = self.threads
            && n == 0
        {
            return Err(UpscaleError::validation(
                "pipeline 'threads' must be >= 1 when set",
            ));
        }
        Ok(())
    }

    pub fn from_json_str(s: &str) -> UpscaleResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| UpscaleError::validation(format!("parse pipeline config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scale: Scale::default(),
            tile_size: Self::DEFAULT_TILE_SIZE,
            overlap: Self::DEFAULT_OVERLAP,
            min_tiling_area: Self::DEFAULT_MIN_TILING_AREA,
            threads: None,
            show_progress: true,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
