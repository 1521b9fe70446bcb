use std::path::Path;

use anyhow::Context as _;

use crate::foundation::{
    error::{UpscaleError, UpscaleResult},
    raster::Raster,
};

/// Path reported by load failures of in-memory images.
const MEMORY_SOURCE: &str = "<memory>";

/// Decode an image file of any supported format into an RGB8 raster.
pub fn load_raster(path: &Path) -> UpscaleResult<Raster> {
    let img = image::open(path)
        .with_context(|| format!("decode '{}'", path.display()))
        .map_err(|e| UpscaleError::source_load(path, e))?;
    non_empty(Raster::from(img.to_rgb8()), path)
}

/// Decode an in-memory encoded image into an RGB8 raster.
pub fn decode_raster(bytes: &[u8]) -> UpscaleResult<Raster> {
    let img = image::load_from_memory(bytes)
        .context("decode image from memory")
        .map_err(|e| UpscaleError::source_load(MEMORY_SOURCE, e))?;
    non_empty(Raster::from(img.to_rgb8()), Path::new(MEMORY_SOURCE))
}

fn non_empty(raster: Raster, path: &Path) -> UpscaleResult<Raster> {
    if raster.is_empty() {
        return Err(UpscaleError::source_load(
            path,
            anyhow::anyhow!("image has no pixels"),
        ));
    }
    Ok(raster)
}

/// Encode `raster` to `path`, format chosen by extension. Creates the parent directory.
pub fn save_raster(path: &Path, raster: &Raster) -> UpscaleResult<()> {
    let write = || -> anyhow::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        image::save_buffer(
            path,
            &raster.data,
            raster.width,
            raster.height,
            image::ExtendedColorType::Rgb8,
        )
        .with_context(|| format!("encode '{}'", path.display()))?;
        Ok(())
    };
    write().map_err(|e| UpscaleError::output_save(path, e))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
