use super::*;
use crate::foundation::core::Canvas;
use crate::template::model::{ImageMask, Position};

const BG: Color = Color::rgb(3, 105, 161);
const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn solid(w: u32, h: u32, px: [u8; 4]) -> Arc<DecodedImage> {
    let data = px.repeat((w * h) as usize);
    Arc::new(DecodedImage::from_premul_rgba8(w, h, data).unwrap())
}

/// Image layers are resampled, so allow for filter rounding.
#[track_caller]
fn assert_near(s: &Surface, x: u32, y: u32, want: [u8; 4]) {
    let got = s.pixel(x, y).unwrap();
    let ok = got
        .iter()
        .zip(want.iter())
        .all(|(a, b)| (i16::from(*a) - i16::from(*b)).abs() <= 2);
    assert!(ok, "pixel ({x},{y}) = {got:?}, want ~{want:?}");
}

fn template() -> TemplateModel {
    let mut t = TemplateModel::landscape();
    t.caption.text = "Hello World".to_owned();
    t.caption.max_characters_per_line = 5;
    t.caption.font_size = 10.0;
    t.caption.position = Position::new(20.0, 40.0);
    t.caption.text_color = Color::rgb(255, 255, 0);
    t.cta.text = "Go".to_owned();
    t.cta.font_size = Some(20.0);
    t.cta.position = Position::new(100.0, 150.0);
    t.cta.text_color = Color::rgb(0, 0, 0);
    t.cta.background_color = Color::WHITE;
    t.image_mask = ImageMask {
        x: 20.0,
        y: 60.0,
        width: 160.0,
        height: 60.0,
    };
    t
}

fn setup() -> (Compositor, Surface) {
    (
        Compositor::new(TextEngine::block(1.0).unwrap()),
        Surface::new(Canvas::new(200, 200).unwrap()).unwrap(),
    )
}

#[test]
fn background_fills_untouched_regions() {
    let (mut c, mut s) = setup();
    let report = c
        .render(&mut s, &template(), BG, &LayerImages::default(), None)
        .unwrap();
    assert!(!report.mask && !report.stroke && !report.design_pattern && !report.user_photo);
    assert_eq!(s.pixel(0, 0), Some([3, 105, 161, 255]));
    assert_eq!(s.pixel(199, 199), Some([3, 105, 161, 255]));
    // Image rectangle shows plain background while nothing is loaded.
    assert_eq!(s.pixel(100, 90), Some([3, 105, 161, 255]));
}

#[test]
fn caption_wraps_by_measured_width_and_steps_by_font_size() {
    let (mut c, mut s) = setup();
    let report = c
        .render(&mut s, &template(), BG, &LayerImages::default(), None)
        .unwrap();
    assert_eq!(report.caption_lines, vec!["Hello", "World"]);
    // Line 0 baseline at y=40, line 1 at y=50; ink spans baseline-7 .. baseline.
    assert_eq!(s.pixel(25, 37), Some([255, 255, 0, 255]));
    assert_eq!(s.pixel(25, 47), Some([255, 255, 0, 255]));
    assert_eq!(report.caption_bounds, Rect::new(20.0, 32.0, 70.0, 52.0));
    assert_eq!(c.caption_lines(&template().caption), report.caption_lines);
}

#[test]
fn cta_plate_is_centered_on_anchor_with_padding() {
    let (mut c, mut s) = setup();
    let t = template();
    let report = c
        .render(&mut s, &t, BG, &LayerImages::default(), None)
        .unwrap();
    // "Go" at 20px with 1em advance is 40px wide.
    assert_eq!(report.cta_plate, Rect::new(56.0, 128.0, 144.0, 172.0));
    assert_eq!(c.cta_plate(&t.cta), report.cta_plate);
    // Plate corner is white, glyph interior is black, outside is background.
    assert_eq!(s.pixel(58, 130), Some([255, 255, 255, 255]));
    assert_eq!(s.pixel(90, 150), Some([0, 0, 0, 255]));
    assert_eq!(s.pixel(50, 150), Some([3, 105, 161, 255]));
}

#[test]
fn overlays_share_the_mask_rectangle() {
    let (mut c, mut s) = setup();
    // Natural sizes differ from the 160x60 rectangle; both get stretched into it.
    let layers = LayerImages {
        design_pattern: None,
        mask: Some(solid(7, 3, GREEN)),
        stroke: None,
    };
    let report = c.render(&mut s, &template(), BG, &layers, None).unwrap();
    assert!(report.mask);
    assert_near(&s, 22, 62, GREEN);
    assert_near(&s, 177, 117, GREEN);
    assert_eq!(s.pixel(17, 90), Some([3, 105, 161, 255]));
    assert_eq!(s.pixel(100, 123), Some([3, 105, 161, 255]));
}

#[test]
fn stroke_draws_over_mask() {
    let (mut c, mut s) = setup();
    let layers = LayerImages {
        design_pattern: None,
        mask: Some(solid(4, 4, GREEN)),
        stroke: Some(solid(4, 4, BLUE)),
    };
    let report = c.render(&mut s, &template(), BG, &layers, None).unwrap();
    assert!(report.mask && report.stroke);
    assert_near(&s, 100, 90, BLUE);
}

#[test]
fn transparent_stroke_lets_mask_show_through() {
    let (mut c, mut s) = setup();
    let layers = LayerImages {
        design_pattern: None,
        mask: Some(solid(4, 4, GREEN)),
        stroke: Some(solid(4, 4, [0, 0, 0, 0])),
    };
    c.render(&mut s, &template(), BG, &layers, None).unwrap();
    assert_near(&s, 100, 90, GREEN);
}

#[test]
fn user_photo_occludes_mask_and_stroke() {
    let (mut c, mut s) = setup();
    let layers = LayerImages {
        design_pattern: None,
        mask: Some(solid(4, 4, GREEN)),
        stroke: Some(solid(4, 4, BLUE)),
    };
    let photo = solid(30, 20, RED);
    let report = c
        .render(&mut s, &template(), BG, &layers, Some(&photo))
        .unwrap();
    assert!(report.user_photo);
    for (x, y) in [(22, 62), (100, 90), (177, 117)] {
        assert_near(&s, x, y, RED);
    }
}

#[test]
fn design_pattern_covers_the_surface_under_everything_else() {
    let (mut c, mut s) = setup();
    let layers = LayerImages {
        design_pattern: Some(solid(3, 5, GREEN)),
        mask: None,
        stroke: None,
    };
    let report = c.render(&mut s, &template(), BG, &layers, None).unwrap();
    assert!(report.design_pattern);
    assert_near(&s, 2, 2, GREEN);
    assert_near(&s, 197, 197, GREEN);
    // Caption and CTA are drawn on top.
    assert_eq!(s.pixel(25, 37), Some([255, 255, 0, 255]));
    assert_eq!(s.pixel(58, 130), Some([255, 255, 255, 255]));
}

#[test]
fn render_is_deterministic() {
    let (mut c, mut s) = setup();
    let layers = LayerImages {
        design_pattern: None,
        mask: Some(solid(5, 5, GREEN)),
        stroke: None,
    };
    c.render(&mut s, &template(), BG, &layers, None).unwrap();
    let first = s.frame();
    c.render(&mut s, &template(), BG, &layers, None).unwrap();
    assert_eq!(first, s.frame());
}

#[test]
fn left_center_right_caption_alignment() {
    let (mut c, mut s) = setup();
    let mut t = template();
    t.caption.text = "Hi".to_owned();
    t.caption.position = Position::new(100.0, 40.0);

    t.caption.alignment = Alignment::Left;
    let r = c.render(&mut s, &t, BG, &LayerImages::default(), None).unwrap();
    assert_eq!((r.caption_bounds.x0, r.caption_bounds.x1), (100.0, 120.0));

    t.caption.alignment = Alignment::Center;
    let r = c.render(&mut s, &t, BG, &LayerImages::default(), None).unwrap();
    assert_eq!((r.caption_bounds.x0, r.caption_bounds.x1), (90.0, 110.0));

    t.caption.alignment = Alignment::Right;
    let r = c.render(&mut s, &t, BG, &LayerImages::default(), None).unwrap();
    assert_eq!((r.caption_bounds.x0, r.caption_bounds.x1), (80.0, 100.0));
}
