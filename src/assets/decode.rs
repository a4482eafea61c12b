use std::fmt;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{AdError, AdResult};

/// A decoded raster image, ready to be drawn by the compositor.
///
/// Pixels are kept as premultiplied RGBA8 next to a raster paint built from the same bytes, so
/// drawing never re-decodes. Cloning is cheap (shared buffers).
#[derive(Clone)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    rgba8_premul: Arc<Vec<u8>>,
    paint: vello_cpu::Image,
}

impl DecodedImage {
    /// Build from premultiplied RGBA8 bytes (row-major, tightly packed).
    pub fn from_premul_rgba8(width: u32, height: u32, rgba8_premul: Vec<u8>) -> AdResult<Self> {
        let pixmap = pixmap_from_premul_bytes(&rgba8_premul, width, height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
            paint,
        })
    }

    /// Natural width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Natural height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied RGBA8 bytes.
    pub fn rgba8_premul(&self) -> &[u8] {
        &self.rgba8_premul
    }

    pub(crate) fn paint(&self) -> vello_cpu::Image {
        self.paint.clone()
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Decode encoded image bytes (any format the `image` crate supports) into a [`DecodedImage`].
pub fn decode_image(bytes: &[u8]) -> AdResult<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(AdError::asset("decoded image has zero size"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);
    DecodedImage::from_premul_rgba8(width, height, rgba8_premul)
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

fn pixmap_from_premul_bytes(bytes: &[u8], width: u32, height: u32) -> AdResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| AdError::asset("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| AdError::asset("image height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(AdError::asset("image byte len mismatch"));
    }
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    let may_have_opacities = bytes.chunks_exact(4).any(|px| px[3] != 255);
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
