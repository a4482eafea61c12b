use super::*;

#[test]
fn new_surface_is_transparent() {
    let s = Surface::new(Canvas::new(8, 4).unwrap()).unwrap();
    let f = s.frame();
    assert_eq!((f.width, f.height), (8, 4));
    assert_eq!(f.data.len(), 8 * 4 * 4);
    assert!(f.data.iter().all(|&b| b == 0));
    assert!(f.premultiplied);
    assert_eq!(s.pixel(8, 0), None);
}

#[test]
fn rejects_degenerate_canvas() {
    assert!(Surface::new(Canvas { width: 0, height: 5 }).is_err());
}

#[test]
fn redraw_replaces_previous_content() {
    let mut s = Surface::new(Canvas::new(10, 10).unwrap()).unwrap();
    s.redraw(|ctx| {
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(0, 0, 255, 255));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, 10.0, 10.0));
        Ok(())
    })
    .unwrap();
    assert_eq!(s.pixel(9, 9), Some([0, 0, 255, 255]));

    s.redraw(|ctx| {
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 0, 0, 255));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, 5.0, 5.0));
        Ok(())
    })
    .unwrap();
    assert_eq!(s.pixel(2, 2), Some([255, 0, 0, 255]));
    assert_eq!(s.pixel(8, 8), Some([0, 0, 0, 0]));
}

#[test]
fn failed_pass_keeps_previous_pixels() {
    let mut s = Surface::new(Canvas::new(4, 4).unwrap()).unwrap();
    s.redraw(|ctx| {
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(0, 255, 0, 255));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, 4.0, 4.0));
        Ok(())
    })
    .unwrap();
    let r: AdResult<()> = s.redraw(|_| Err(AdError::render("nope")));
    assert!(r.is_err());
    assert_eq!(s.pixel(1, 1), Some([0, 255, 0, 255]));
}

#[test]
fn png_export_unpremultiplies() {
    let frame = FrameRGBA {
        width: 2,
        height: 1,
        data: vec![64, 32, 0, 128, 10, 20, 30, 255],
        premultiplied: true,
    };
    assert_eq!(frame.pixel(1, 0), Some([10, 20, 30, 255]));
    let png = frame.encode_png().unwrap();
    let back = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(back.get_pixel(0, 0).0, [128, 64, 0, 128]);
    assert_eq!(back.get_pixel(1, 0).0, [10, 20, 30, 255]);
}

#[test]
fn png_export_rejects_short_buffers() {
    let frame = FrameRGBA {
        width: 2,
        height: 2,
        data: vec![0; 4],
        premultiplied: false,
    };
    assert!(frame.encode_png().is_err());
}
