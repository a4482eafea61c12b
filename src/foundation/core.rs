use crate::foundation::error::{AdError, AdResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Output surface dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// The square ad format every template is laid out for.
    pub const AD_SQUARE: Canvas = Canvas {
        width: 1080,
        height: 1080,
    };

    /// Create a validated canvas. Both sides must be non-zero and fit the raster backend (`u16`).
    pub fn new(width: u32, height: u32) -> AdResult<Self> {
        if width == 0 || height == 0 {
            return Err(AdError::validation("canvas width and height must be > 0"));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(AdError::validation("canvas sides must be <= 65535"));
        }
        Ok(Self { width, height })
    }

    /// Full-surface rectangle anchored at the origin.
    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    pub(crate) fn size_u16(self) -> AdResult<(u16, u16)> {
        let w: u16 = self
            .width
            .try_into()
            .map_err(|_| AdError::render("canvas width exceeds u16"))?;
        let h: u16 = self
            .height
            .try_into()
            .map_err(|_| AdError::render("canvas height exceeds u16"))?;
        Ok((w, h))
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::AD_SQUARE
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: premul_channel(r, a),
            g: premul_channel(g, a),
            b: premul_channel(b, a),
            a,
        }
    }

    /// Channels as a `[r, g, b, a]` array, matching surface byte order.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

pub(crate) fn premul_channel(c: u8, a: u8) -> u8 {
    let c = u16::from(c);
    let a = u16::from(a);
    (((c * a) + 127) / 255) as u8
}

/// Inverse of premultiplication for a single pixel; transparent pixels map to zero.
pub(crate) fn unpremultiply_px(px: [u8; 4]) -> [u8; 4] {
    let [r, g, b, a] = px;
    if a == 0 {
        return [0, 0, 0, 0];
    }
    if a == 255 {
        return px;
    }
    let a16 = u16::from(a);
    let un = |c: u8| -> u8 { ((u16::from(c) * 255 + a16 / 2) / a16).min(255) as u8 };
    [un(r), un(g), un(b), a]
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
