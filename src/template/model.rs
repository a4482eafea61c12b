use serde::{Deserialize, Serialize};

use crate::assets::color::Color;
use crate::foundation::core::{Point, Rect};
use crate::foundation::error::{AdError, AdResult};

/// Font size used for the call-to-action when the template does not declare one.
pub const DEFAULT_CTA_FONT_SIZE: f32 = 30.0;

/// Surface-space position in pixels. Accepts `{ "x": .., "y": .. }` or `[x, y]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Position {
    /// Horizontal offset from the left edge.
    pub x: f64,
    /// Vertical offset from the top edge.
    pub y: f64,
}

impl Position {
    /// Create a position.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// As a `kurbo` point.
    pub fn to_point(self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Arr([f64; 2]),
            Obj { x: f64, y: f64 },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Arr([x, y]) => Ok(Self { x, y }),
            Repr::Obj { x, y } => Ok(Self { x, y }),
        }
    }
}

/// Horizontal text alignment relative to the anchor x coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Text starts at the anchor.
    #[default]
    Left,
    /// Text is centered on the anchor.
    Center,
    /// Text ends at the anchor.
    Right,
}

/// Caption block: wrapped, multi-line text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    /// Caption text; replaced by the user's input.
    pub text: String,
    /// Anchor of the first line (baseline).
    pub position: Position,
    /// Soft line length hint; converted to a pixel width with the reference glyph.
    pub max_characters_per_line: u32,
    /// Font size in pixels. Also the fixed line advance.
    pub font_size: f32,
    /// Horizontal alignment of every line relative to `position.x`.
    #[serde(default)]
    pub alignment: Alignment,
    /// Fill color of the text.
    pub text_color: Color,
}

/// Call-to-action: single-line text on a solid plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cta {
    /// Button text; replaced by the user's input.
    pub text: String,
    /// Center anchor of the text.
    pub position: Position,
    /// Fill color of the text.
    pub text_color: Color,
    /// Fill color of the plate behind the text.
    pub background_color: Color,
    /// Font size in pixels, [`DEFAULT_CTA_FONT_SIZE`] when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
}

impl Cta {
    /// Declared font size or the default.
    pub fn effective_font_size(&self) -> f32 {
        self.font_size.unwrap_or(DEFAULT_CTA_FONT_SIZE)
    }
}

/// Rectangle shared by the mask, mask stroke and user photo layers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageMask {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl ImageMask {
    /// As a `kurbo` rectangle.
    pub fn to_rect(self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// References to the three fixed-role overlay images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetUrls {
    /// Mask image drawn into [`ImageMask`].
    pub mask: String,
    /// Mask stroke drawn over the mask.
    pub stroke: String,
    /// Full-surface design pattern.
    pub design_pattern: String,
}

/// Structured description of a renderable ad.
///
/// Layer structure is fixed; only parameter values vary between templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateModel {
    /// Caption block.
    pub caption: Caption,
    /// Call-to-action block.
    pub cta: Cta,
    /// Photo/mask rectangle.
    pub image_mask: ImageMask,
    /// Overlay references.
    pub urls: AssetUrls,
}

impl TemplateModel {
    /// Parse a JSON template document and validate it.
    pub fn from_json(json: &str) -> AdResult<Self> {
        let t: Self = serde_json::from_str(json)?;
        t.validate()?;
        Ok(t)
    }

    /// Serialize back to pretty JSON.
    pub fn to_json(&self) -> AdResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The landscape template the editor starts from.
    pub fn landscape() -> Self {
        const BASE: &str = "https://d273i1jagfl543.cloudfront.net/templates";
        Self {
            caption: Caption {
                text: "         ".to_owned(),
                position: Position::new(50.0, 50.0),
                max_characters_per_line: 31,
                font_size: 35.0,
                alignment: Alignment::Left,
                text_color: Color::WHITE,
            },
            cta: Cta {
                text: "Shop Now".to_owned(),
                position: Position::new(190.0, 320.0),
                text_color: Color::WHITE,
                background_color: Color::WHITE,
                font_size: None,
            },
            image_mask: ImageMask {
                x: 56.0,
                y: 442.0,
                width: 970.0,
                height: 600.0,
            },
            urls: AssetUrls {
                mask: format!("{BASE}/global_temp_landscape_temp_10_mask.png"),
                stroke: format!("{BASE}/global_temp_landscape_temp_10_Mask_stroke.png"),
                design_pattern: format!("{BASE}/global_temp_landscape_temp_10_Design_Pattern.png"),
            },
        }
    }

    /// Check structural constraints the renderer relies on.
    pub fn validate(&self) -> AdResult<()> {
        let c = &self.caption;
        if c.max_characters_per_line == 0 {
            return Err(AdError::validation(
                "caption.max_characters_per_line must be > 0",
            ));
        }
        check_font_size("caption.font_size", c.font_size)?;
        check_position("caption.position", c.position)?;

        if let Some(size) = self.cta.font_size {
            check_font_size("cta.font_size", size)?;
        }
        check_position("cta.position", self.cta.position)?;

        let m = self.image_mask;
        if !(m.x.is_finite() && m.y.is_finite()) {
            return Err(AdError::validation("image_mask origin must be finite"));
        }
        if !(m.width.is_finite() && m.width > 0.0 && m.height.is_finite() && m.height > 0.0) {
            return Err(AdError::validation(
                "image_mask width/height must be finite and > 0",
            ));
        }

        for (name, r) in [
            ("urls.mask", &self.urls.mask),
            ("urls.stroke", &self.urls.stroke),
            ("urls.design_pattern", &self.urls.design_pattern),
        ] {
            if r.trim().is_empty() {
                return Err(AdError::validation(format!("{name} must be non-empty")));
            }
        }
        Ok(())
    }
}

impl Default for TemplateModel {
    fn default() -> Self {
        Self::landscape()
    }
}

fn check_font_size(name: &str, size: f32) -> AdResult<()> {
    if !size.is_finite() || size <= 0.0 {
        return Err(AdError::validation(format!(
            "{name} must be finite and > 0"
        )));
    }
    Ok(())
}

fn check_position(name: &str, p: Position) -> AdResult<()> {
    if !(p.x.is_finite() && p.y.is_finite()) {
        return Err(AdError::validation(format!("{name} must be finite")));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/template/model.rs"]
mod tests;
