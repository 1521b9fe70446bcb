use crate::foundation::error::{UpscaleError, UpscaleResult};

/// Interleaved 8-bit RGB pixel data, row-major, tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Raster {
    /// Channels per pixel.
    pub const CHANNELS: usize = 3;

    /// Zero-initialized raster.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * Self::CHANNELS],
        }
    }

    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> UpscaleResult<Self> {
        let raster = Self {
            width,
            height,
            data,
        };
        raster.check_layout()?;
        Ok(raster)
    }

    /// Check that `data` holds exactly `width * height` RGB pixels.
    pub fn check_layout(&self) -> UpscaleResult<()> {
        let expected = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(Self::CHANNELS));
        if expected != Some(self.data.len()) {
            return Err(UpscaleError::validation(format!(
                "raster buffer is {} bytes, expected {} for {}x{} rgb8",
                self.data.len(),
                expected.map_or_else(|| "an overflowing size".to_string(), |n| n.to_string()),
                self.width,
                self.height
            )));
        }
        Ok(())
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * Self::CHANNELS
    }

    fn row_bytes(&self) -> usize {
        self.width as usize * Self::CHANNELS
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = self.offset(x, y);
        self.data[i..i + 3].copy_from_slice(&rgb);
    }

    /// Copy the `w`x`h` region at (`x`, `y`) into an independently owned raster.
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> UpscaleResult<Self> {
        if w == 0 || h == 0 {
            return Err(UpscaleError::validation("crop region must be non-empty"));
        }
        let fits_x = x.checked_add(w).is_some_and(|end| end <= self.width);
        let fits_y = y.checked_add(h).is_some_and(|end| end <= self.height);
        if !fits_x || !fits_y {
            return Err(UpscaleError::validation(format!(
                "crop region {w}x{h} at ({x}, {y}) exceeds raster {}x{}",
                self.width, self.height
            )));
        }

        let row_len = w as usize * Self::CHANNELS;
        let mut data = Vec::with_capacity(row_len * h as usize);
        for row in y..y + h {
            let start = self.offset(x, row);
            data.extend_from_slice(&self.data[start..start + row_len]);
        }
        Ok(Self {
            width: w,
            height: h,
            data,
        })
    }

    /// Copy the top-left `w`x`h` portion of `src` to (`dst_x`, `dst_y`).
    ///
    /// The portion must lie within both rasters; callers check the fit beforehand.
    pub(crate) fn blit_from(&mut self, src: &Raster, w: u32, h: u32, dst_x: u32, dst_y: u32) {
        debug_assert!(w <= src.width && h <= src.height);
        debug_assert!(dst_x + w <= self.width && dst_y + h <= self.height);

        let row_len = w as usize * Self::CHANNELS;
        for row in 0..h {
            let s = src.offset(0, row);
            let d = self.offset(dst_x, dst_y + row);
            self.data[d..d + row_len].copy_from_slice(&src.data[s..s + row_len]);
        }
    }

    /// Integer nearest-neighbour enlargement: every pixel becomes a `factor`x`factor` block.
    pub fn replicate(&self, factor: u32) -> Self {
        let out_w = self.width * factor;
        let out_h = self.height * factor;
        let mut out = Self::new(out_w, out_h);
        let out_row_bytes = out.row_bytes();
        for y in 0..self.height {
            let dst_row = (y * factor) as usize * out_row_bytes;
            for x in 0..self.width {
                let s = self.offset(x, y);
                let px = [self.data[s], self.data[s + 1], self.data[s + 2]];
                for dx in 0..factor {
                    let d = dst_row + ((x * factor + dx) as usize) * Self::CHANNELS;
                    out.data[d..d + 3].copy_from_slice(&px);
                }
            }
            for dy in 1..factor as usize {
                let (head, tail) = out.data.split_at_mut(dst_row + dy * out_row_bytes);
                tail[..out_row_bytes].copy_from_slice(&head[dst_row..dst_row + out_row_bytes]);
            }
        }
        out
    }

    pub fn to_rgb_image(&self) -> UpscaleResult<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| UpscaleError::validation("raster buffer does not match its dimensions"))
    }
}

impl From<image::RgbImage> for Raster {
    fn from(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/raster.rs"]
mod tests;
