use std::io::Cursor;

use anyhow::Context;

use crate::foundation::core::{Canvas, unpremultiply_px};
use crate::foundation::error::{AdError, AdResult};

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha**. The `premultiplied` flag is included to make this explicit
/// at API boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Pixel at `(x, y)` as stored, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.data
            .get(i..i + 4)
            .map(|p| [p[0], p[1], p[2], p[3]])
    }

    /// Copy of the pixels with straight (non-premultiplied) alpha.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        if !self.premultiplied {
            return self.data.clone();
        }
        let mut out = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(4) {
            out.extend_from_slice(&unpremultiply_px([px[0], px[1], px[2], px[3]]));
        }
        out
    }

    /// Encode the frame as a PNG file.
    pub fn encode_png(&self) -> AdResult<Vec<u8>> {
        let img = image::RgbaImage::from_raw(self.width, self.height, self.to_straight_rgba())
            .ok_or_else(|| AdError::render("frame byte len does not match its dimensions"))?;
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .context("encode frame as png")?;
        Ok(buf)
    }
}

/// Fixed-size drawing target: a `vello_cpu` render context plus the pixmap it resolves into.
///
/// Every draw pass starts from a transparent pixmap; there is no incremental update.
pub struct Surface {
    canvas: Canvas,
    ctx: Option<vello_cpu::RenderContext>,
    pixmap: vello_cpu::Pixmap,
}

impl Surface {
    /// Allocate a transparent surface.
    pub fn new(canvas: Canvas) -> AdResult<Self> {
        let canvas = Canvas::new(canvas.width, canvas.height)?;
        let (w, h) = canvas.size_u16()?;
        Ok(Self {
            canvas,
            ctx: Some(vello_cpu::RenderContext::new(w, h)),
            pixmap: vello_cpu::Pixmap::new(w, h),
        })
    }

    /// Surface dimensions.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Premultiplied pixel at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.canvas.width || y >= self.canvas.height {
            return None;
        }
        let i = ((y as usize) * (self.canvas.width as usize) + (x as usize)) * 4;
        let d = self.pixmap.data_as_u8_slice();
        d.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }

    /// Copy the current pixels out.
    pub fn frame(&self) -> FrameRGBA {
        FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }

    /// Run one full draw pass: reset the context, record with `f`, then rasterize into the
    /// (cleared) pixmap.
    pub(crate) fn redraw<R>(
        &mut self,
        f: impl FnOnce(&mut vello_cpu::RenderContext) -> AdResult<R>,
    ) -> AdResult<R> {
        let (w, h) = self.canvas.size_u16()?;
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            _ => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();
        let out = f(&mut ctx);
        if out.is_ok() {
            ctx.flush();
            self.pixmap.data_as_u8_slice_mut().fill(0);
            ctx.render_to_pixmap(&mut self.pixmap);
        }
        self.ctx = Some(ctx);
        out
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("canvas", &self.canvas)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
