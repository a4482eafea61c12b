use std::borrow::Cow;

use crate::assets::color::Color;
use crate::foundation::core::{Affine, Point, Rect};
use crate::foundation::error::{AdError, AdResult};
use crate::template::model::Alignment;

/// Width measurement of a single line of text under a font at a given pixel size.
pub trait TextMeasure {
    /// Rendered advance width of `text` in pixels.
    fn measure(&mut self, text: &str, size_px: f32) -> f32;
}

/// Vertical meaning of the anchor y coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Baseline {
    /// Anchor y is the alphabetic baseline.
    #[default]
    Alphabetic,
    /// Anchor y is the middle of the em box.
    Middle,
}

/// One line of text to draw.
#[derive(Debug, Clone, Copy)]
pub struct TextRun<'a> {
    /// Text, drawn on a single line.
    pub text: &'a str,
    /// Font size in pixels.
    pub size_px: f32,
    /// Anchor point, interpreted through `align` and `baseline`.
    pub anchor: Point,
    /// Horizontal alignment relative to `anchor.x`.
    pub align: Alignment,
    /// Vertical alignment relative to `anchor.y`.
    pub baseline: Baseline,
    /// Fill color.
    pub color: Color,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl From<Color> for TextBrushRgba8 {
    fn from(c: Color) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Metric-only face: every character advances by `advance_em × size`, visible characters draw as
/// solid boxes. Deterministic and needs no font data.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BlockFace {
    advance_em: f32,
}

impl BlockFace {
    const ASCENT_EM: f32 = 0.8;
    const DESCENT_EM: f32 = 0.2;
    const INK_TOP_EM: f32 = 0.7;
    const INK_INSET: f32 = 0.1;

    fn advance(&self, size_px: f32) -> f32 {
        self.advance_em * size_px
    }
}

/// A registered TrueType/OpenType face shaped with Parley and rasterized with `vello_cpu`.
struct FontFace {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family: String,
    data: vello_cpu::peniko::FontData,
}

impl FontFace {
    fn new(font_bytes: Vec<u8>) -> AdResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| AdError::validation("no font families registered from font bytes"))?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| AdError::validation("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family,
            data: vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0),
        })
    }

    fn layout(&mut self, text: &str, size_px: f32, brush: TextBrushRgba8) -> parley::Layout<TextBrushRgba8> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout.align(
            None,
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );
        layout
    }
}

enum Face {
    Block(BlockFace),
    Font(Box<FontFace>),
}

/// Measures and draws single text lines with the configured face.
pub struct TextEngine {
    face: Face,
}

impl std::fmt::Debug for TextEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.face {
            Face::Block(b) => f
                .debug_struct("TextEngine")
                .field("block_advance_em", &b.advance_em)
                .finish(),
            Face::Font(ff) => f
                .debug_struct("TextEngine")
                .field("family", &ff.family)
                .finish(),
        }
    }
}

impl TextEngine {
    /// Engine backed by the metric-only block face.
    pub fn block(advance_em: f32) -> AdResult<Self> {
        if !advance_em.is_finite() || advance_em <= 0.0 {
            return Err(AdError::validation(
                "block face advance_em must be finite and > 0",
            ));
        }
        Ok(Self {
            face: Face::Block(BlockFace { advance_em }),
        })
    }

    /// Engine backed by TrueType/OpenType font bytes.
    pub fn from_font_bytes(font_bytes: Vec<u8>) -> AdResult<Self> {
        Ok(Self {
            face: Face::Font(Box::new(FontFace::new(font_bytes)?)),
        })
    }

    /// Family name of the loaded font, `None` for the block face.
    pub fn family_name(&self) -> Option<&str> {
        match &self.face {
            Face::Block(_) => None,
            Face::Font(ff) => Some(&ff.family),
        }
    }

    /// Draw one line and return its ink-independent bounds (advance width × ascent+descent).
    pub(crate) fn draw_line(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        run: &TextRun<'_>,
    ) -> AdResult<Rect> {
        if !run.size_px.is_finite() || run.size_px <= 0.0 {
            return Err(AdError::render("text size_px must be finite and > 0"));
        }
        match &mut self.face {
            Face::Block(face) => Ok(draw_block_line(ctx, *face, run)),
            Face::Font(face) => Ok(draw_font_line(ctx, face, run)),
        }
    }
}

impl TextMeasure for TextEngine {
    fn measure(&mut self, text: &str, size_px: f32) -> f32 {
        match &mut self.face {
            Face::Block(face) => text.chars().count() as f32 * face.advance(size_px),
            Face::Font(face) => face
                .layout(text, size_px, TextBrushRgba8::default())
                .full_width(),
        }
    }
}

fn align_offset(align: Alignment, width: f64) -> f64 {
    match align {
        Alignment::Left => 0.0,
        Alignment::Center => width / 2.0,
        Alignment::Right => width,
    }
}

fn baseline_y(baseline: Baseline, anchor_y: f64, ascent: f64, descent: f64) -> f64 {
    match baseline {
        Baseline::Alphabetic => anchor_y,
        Baseline::Middle => anchor_y + (ascent - descent) / 2.0,
    }
}

fn draw_block_line(ctx: &mut vello_cpu::RenderContext, face: BlockFace, run: &TextRun<'_>) -> Rect {
    let size = f64::from(run.size_px);
    let adv = f64::from(face.advance(run.size_px));
    let width = run.text.chars().count() as f64 * adv;
    let ascent = size * f64::from(BlockFace::ASCENT_EM);
    let descent = size * f64::from(BlockFace::DESCENT_EM);
    let x0 = run.anchor.x - align_offset(run.align, width);
    let base = baseline_y(run.baseline, run.anchor.y, ascent, descent);

    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(run.color.to_cpu_color());
    let inset = adv * f64::from(BlockFace::INK_INSET);
    let ink_top = base - size * f64::from(BlockFace::INK_TOP_EM);
    for (i, ch) in run.text.chars().enumerate() {
        if ch.is_whitespace() {
            continue;
        }
        let pen = x0 + i as f64 * adv;
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            pen + inset,
            ink_top,
            pen + adv - inset,
            base,
        ));
    }

    Rect::new(x0, base - ascent, x0 + width, base + descent)
}

fn draw_font_line(ctx: &mut vello_cpu::RenderContext, face: &mut FontFace, run: &TextRun<'_>) -> Rect {
    let layout = face.layout(run.text, run.size_px, run.color.into());
    // Trailing spaces count toward the advance, same as the block face.
    let width = f64::from(layout.full_width());
    let (ascent, descent, layout_baseline) = layout
        .lines()
        .next()
        .map(|line| {
            let m = line.metrics();
            (
                f64::from(m.ascent),
                f64::from(m.descent),
                f64::from(m.baseline),
            )
        })
        .unwrap_or((f64::from(run.size_px) * 0.8, f64::from(run.size_px) * 0.2, 0.0));

    let x0 = run.anchor.x - align_offset(run.align, width);
    let base = baseline_y(run.baseline, run.anchor.y, ascent, descent);
    let tr = Affine::translate((x0, base - layout_baseline));
    ctx.set_transform(vello_cpu::kurbo::Affine::new(tr.as_coeffs()));

    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                continue;
            };
            let brush = glyph_run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));
            let glyphs = glyph_run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(&face.data)
                .font_size(glyph_run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);

    Rect::new(x0, base - ascent, x0 + width, base + descent)
}

#[cfg(test)]
#[path = "../../tests/unit/text/engine.rs"]
mod tests;
