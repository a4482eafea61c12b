use std::sync::Arc;

use crate::assets::color::Color;
use crate::assets::decode::DecodedImage;
use crate::foundation::core::{Point, Rect};
use crate::foundation::error::AdResult;
use crate::render::surface::Surface;
use crate::template::model::{Alignment, Caption, Cta, TemplateModel};
use crate::text::engine::{Baseline, TextEngine, TextMeasure, TextRun};
use crate::text::wrap::wrap_to_char_budget;

/// Horizontal padding between the CTA text and the plate edge.
pub const CTA_PAD_X: f64 = 24.0;
/// Vertical padding between the CTA em box and the plate edge.
pub const CTA_PAD_Y: f64 = 12.0;

/// Template overlays that have finished decoding. `None` layers are skipped.
#[derive(Clone, Debug, Default)]
pub struct LayerImages {
    /// Full-surface pattern.
    pub design_pattern: Option<Arc<DecodedImage>>,
    /// Mask drawn into the image rectangle.
    pub mask: Option<Arc<DecodedImage>>,
    /// Stroke drawn over the mask.
    pub stroke: Option<Arc<DecodedImage>>,
}

/// What a render pass actually drew.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderReport {
    /// Design pattern was ready and drawn.
    pub design_pattern: bool,
    /// Mask was ready and drawn.
    pub mask: bool,
    /// Stroke was ready and drawn.
    pub stroke: bool,
    /// A user photo was drawn.
    pub user_photo: bool,
    /// Wrapped caption lines, top to bottom.
    pub caption_lines: Vec<String>,
    /// Union of the caption line bounds.
    pub caption_bounds: Rect,
    /// CTA plate rectangle.
    pub cta_plate: Rect,
}

/// Draws a template and its overrides onto a [`Surface`] in fixed back-to-front order.
#[derive(Debug)]
pub struct Compositor {
    text: TextEngine,
}

impl Compositor {
    /// Create a compositor drawing text with `text`.
    pub fn new(text: TextEngine) -> Self {
        Self { text }
    }

    /// The text engine used for measuring and drawing.
    pub fn text_engine(&mut self) -> &mut TextEngine {
        &mut self.text
    }

    /// Redraw the whole surface.
    ///
    /// Order: background, design pattern (stretched to the surface), mask, stroke, user photo
    /// (all three into `image_mask`), caption, call-to-action. Missing images are omitted.
    #[tracing::instrument(skip_all, fields(background = %background))]
    pub fn render(
        &mut self,
        surface: &mut Surface,
        template: &TemplateModel,
        background: Color,
        layers: &LayerImages,
        user_photo: Option<&DecodedImage>,
    ) -> AdResult<RenderReport> {
        let full = surface.canvas().rect();
        let photo_rect = template.image_mask.to_rect();
        let text = &mut self.text;

        let report = surface.redraw(|ctx| {
            let mut report = RenderReport::default();

            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(background.to_cpu_color());
            ctx.fill_rect(&to_cpu_rect(full));

            if let Some(img) = &layers.design_pattern {
                draw_image_into(ctx, img, full);
                report.design_pattern = true;
            }
            if let Some(img) = &layers.mask {
                draw_image_into(ctx, img, photo_rect);
                report.mask = true;
            }
            if let Some(img) = &layers.stroke {
                draw_image_into(ctx, img, photo_rect);
                report.stroke = true;
            }
            if let Some(img) = user_photo {
                draw_image_into(ctx, img, photo_rect);
                report.user_photo = true;
            }

            let (lines, bounds) = draw_caption(ctx, text, &template.caption)?;
            report.caption_lines = lines;
            report.caption_bounds = bounds;
            report.cta_plate = draw_cta(ctx, text, &template.cta)?;
            Ok(report)
        })?;

        tracing::debug!(
            design_pattern = report.design_pattern,
            mask = report.mask,
            stroke = report.stroke,
            user_photo = report.user_photo,
            caption_lines = report.caption_lines.len(),
            "rendered template"
        );
        Ok(report)
    }

    /// Caption lines as the next render would wrap them.
    pub fn caption_lines(&mut self, caption: &Caption) -> Vec<String> {
        wrap_to_char_budget(
            &mut self.text,
            &caption.text,
            caption.font_size,
            caption.max_characters_per_line,
        )
    }

    /// CTA plate rectangle as the next render would draw it.
    pub fn cta_plate(&mut self, cta: &Cta) -> Rect {
        cta_plate_rect(&mut self.text, cta)
    }
}

fn to_cpu_rect(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

/// Stretch `img` to exactly cover `dst`, whatever its natural size.
fn draw_image_into(ctx: &mut vello_cpu::RenderContext, img: &DecodedImage, dst: Rect) {
    let sx = dst.width() / f64::from(img.width());
    let sy = dst.height() / f64::from(img.height());
    ctx.set_transform(vello_cpu::kurbo::Affine::new([
        sx, 0.0, 0.0, sy, dst.x0, dst.y0,
    ]));
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(img.paint());
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(img.width()),
        f64::from(img.height()),
    ));
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
}

fn draw_caption(
    ctx: &mut vello_cpu::RenderContext,
    text: &mut TextEngine,
    caption: &Caption,
) -> AdResult<(Vec<String>, Rect)> {
    let lines = wrap_to_char_budget(
        text,
        &caption.text,
        caption.font_size,
        caption.max_characters_per_line,
    );
    let mut bounds: Option<Rect> = None;
    for (i, line) in lines.iter().enumerate() {
        let anchor = Point::new(
            caption.position.x,
            caption.position.y + i as f64 * f64::from(caption.font_size),
        );
        let r = text.draw_line(
            ctx,
            &TextRun {
                text: line,
                size_px: caption.font_size,
                anchor,
                align: caption.alignment,
                baseline: Baseline::Alphabetic,
                color: caption.text_color,
            },
        )?;
        bounds = Some(bounds.map_or(r, |b| b.union(r)));
    }
    Ok((lines, bounds.unwrap_or(Rect::ZERO)))
}

fn cta_plate_rect(text: &mut TextEngine, cta: &Cta) -> Rect {
    let size = cta.effective_font_size();
    let half_w = f64::from(text.measure(&cta.text, size)) / 2.0 + CTA_PAD_X;
    let half_h = f64::from(size) / 2.0 + CTA_PAD_Y;
    let c = cta.position;
    Rect::new(c.x - half_w, c.y - half_h, c.x + half_w, c.y + half_h)
}

fn draw_cta(ctx: &mut vello_cpu::RenderContext, text: &mut TextEngine, cta: &Cta) -> AdResult<Rect> {
    let plate = cta_plate_rect(text, cta);
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(cta.background_color.to_cpu_color());
    ctx.fill_rect(&to_cpu_rect(plate));

    text.draw_line(
        ctx,
        &TextRun {
            text: &cta.text,
            size_px: cta.effective_font_size(),
            anchor: cta.position.to_point(),
            align: Alignment::Center,
            baseline: Baseline::Middle,
            color: cta.text_color,
        },
    )?;
    Ok(plate)
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
