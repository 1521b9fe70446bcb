use anyhow::Context as _;
use image::imageops::FilterType;

use crate::foundation::{
    config::Scale,
    error::{UpscaleError, UpscaleResult},
    raster::Raster,
};

/// A pixel-region transform that enlarges its input by a fixed integer scale.
///
/// `apply` must return a raster of exactly `scale * width` by `scale * height`. Implementations
/// are shared across dispatcher workers and called concurrently on disjoint tiles.
pub trait Transform: Send + Sync {
    fn scale(&self) -> Scale;

    fn name(&self) -> &str;

    fn apply(&self, tile: &Raster) -> anyhow::Result<Raster>;
}

/// Built-in CPU transform backends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformKind {
    /// Exact pixel replication.
    Nearest,
    Triangle,
    CatmullRom,
    #[default]
    Lanczos3,
}

impl TransformKind {
    fn filter(self) -> Option<FilterType> {
        match self {
            Self::Nearest => None,
            Self::Triangle => Some(FilterType::Triangle),
            Self::CatmullRom => Some(FilterType::CatmullRom),
            Self::Lanczos3 => Some(FilterType::Lanczos3),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Triangle => "triangle",
            Self::CatmullRom => "catmull-rom",
            Self::Lanczos3 => "lanczos3",
        }
    }
}

/// Resampling upscaler running on the CPU.
#[derive(Clone, Debug)]
pub struct ResampleTransform {
    kind: TransformKind,
    scale: Scale,
}

impl ResampleTransform {
    pub fn new(kind: TransformKind, scale: Scale) -> Self {
        Self { kind, scale }
    }

    pub fn kind(&self) -> TransformKind {
        self.kind
    }
}

impl Transform for ResampleTransform {
    fn scale(&self) -> Scale {
        self.scale
    }

    fn name(&self) -> &str {
        self.kind.as_str()
    }

    fn apply(&self, tile: &Raster) -> anyhow::Result<Raster> {
        if tile.is_empty() {
            anyhow::bail!("cannot transform an empty {}x{} raster", tile.width, tile.height);
        }
        let factor = self.scale.factor();
        let Some(filter) = self.kind.filter() else {
            return Ok(tile.replicate(factor));
        };

        let src = tile.to_rgb_image().context("wrap tile as rgb image")?;
        let out = image::imageops::resize(&src, tile.width * factor, tile.height * factor, filter);
        Ok(Raster::from(out))
    }
}

/// Construct the transform capability once, before any pipeline run.
///
/// Only CPU resampling is built in; other capabilities plug in through [`Transform`].
pub fn create_transform(kind: TransformKind, scale: Scale) -> UpscaleResult<Box<dyn Transform>> {
    Scale::new(scale.factor())?;
    let transform = ResampleTransform::new(kind, scale);
    tracing::info!(backend = "cpu", filter = kind.as_str(), %scale, "transform ready");
    Ok(Box::new(transform))
}

/// Reject a transform whose fixed scale disagrees with the configured one.
pub(crate) fn check_scale(transform: &dyn Transform, expected: Scale) -> UpscaleResult<()> {
    if transform.scale() != expected {
        return Err(UpscaleError::InvalidScale(transform.scale().factor()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/transform/backend.rs"]
mod tests;
