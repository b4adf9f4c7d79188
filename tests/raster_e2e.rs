// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! End-to-end scenarios and cross-module invariants exercised through
//! the public `Canvas`/`Surface` API only.

use vraster::{
    Canvas, Color, FillRule, FillSource, Gradient, GradientKind, GradientStop, Mask, MaskMode, Op, Outline, Path,
    PremultipliedColorU8, Rect, SpreadMode, Stroke, Surface, Transform,
};

fn solid(r: u8, g: u8, b: u8, a: u8) -> PremultipliedColorU8 {
    PremultipliedColorU8::new(r, g, b, a)
}

#[test]
fn solid_clear_fills_every_pixel() {
    let mut surface = Surface::new(4, 4).unwrap();
    surface.fill(solid(255, 0, 0, 255));
    for y in 0..4 {
        for x in 0..4 {
            assert_eq!(surface.get_pixel(x, y).unwrap(), solid(255, 0, 0, 255));
        }
    }
}

#[test]
fn antialiased_triangle_has_intermediate_hypotenuse_coverage() {
    let mut canvas = Canvas::new(8, 8).unwrap();
    canvas.surface_mut().fill(solid(255, 255, 255, 255));
    canvas.set_fill(FillSource::Solid(Color::black()));

    let mut pb = Path::builder();
    pb.move_to(0.0, 0.0);
    pb.line_to(8.0, 0.0);
    pb.line_to(0.0, 8.0);
    pb.close();
    canvas.fill_path(&pb.finish());

    // Interior, well clear of the hypotenuse x + y = 8.
    let interior = canvas.surface().get_pixel(1, 1).unwrap();
    assert_eq!(interior, solid(0, 0, 0, 255));

    // Outside the triangle entirely.
    let exterior = canvas.surface().get_pixel(6, 6).unwrap();
    assert_eq!(exterior, solid(255, 255, 255, 255));

    // Straddles the diagonal: pixel (3, 4) is centered at (3.5, 4.5),
    // exactly on x + y == 8.
    let edge = canvas.surface().get_pixel(3, 4).unwrap();
    assert!(edge.alpha() >= 0x80u8.saturating_sub(16) && edge.alpha() <= 0x80u8.saturating_add(16));
}

#[test]
fn src_over_half_opacity_red_onto_opaque_blue() {
    let mut canvas = {
        let mut surface = Surface::new(2, 1).unwrap();
        surface.fill(solid(0, 0, 255, 255));
        Canvas::from_surface(surface)
    };
    canvas.set_fill(FillSource::Solid(Color::new(1.0, 0.0, 0.0, 0.5)));
    canvas.fill_rect(Rect::new(0.0, 0.0, 2.0, 1.0));

    for x in 0..2 {
        let px = canvas.surface().get_pixel(x, 0).unwrap();
        assert_eq!(px.alpha(), 0xFF);
        assert!((px.red() as i32 - 0x7F).abs() <= 1);
        assert_eq!(px.green(), 0);
        assert!((px.blue() as i32 - 0x7F).abs() <= 1);
    }
}

#[test]
fn linear_gradient_black_to_white_endpoints_and_midpoint() {
    let mut canvas = Canvas::new(100, 1).unwrap();
    let stops = vec![
        GradientStop { offset: 0.0, color: Color::black() },
        GradientStop { offset: 1.0, color: Color::white() },
    ];
    let gradient = Gradient::new(
        GradientKind::Linear { p0: vraster::Point::new(0.0, 0.0), p1: vraster::Point::new(100.0, 0.0) },
        SpreadMode::Pad,
        Transform::identity(),
        &stops,
        vraster::ColorSpace::Srgb,
        1.0,
    );
    canvas.set_fill(FillSource::Gradient(gradient));
    canvas.fill_rect(Rect::new(0.0, 0.0, 100.0, 1.0));

    let at0 = canvas.surface().get_pixel(0, 0).unwrap();
    assert_eq!(at0, solid(0, 0, 0, 255));

    let at99 = canvas.surface().get_pixel(99, 0).unwrap();
    assert_eq!(at99, solid(255, 255, 255, 255));

    let mid = canvas.surface().get_pixel(50, 0).unwrap();
    assert!((mid.red() as i32 - 0x80).abs() <= 2);
    assert!((mid.green() as i32 - 0x80).abs() <= 2);
    assert!((mid.blue() as i32 - 0x80).abs() <= 2);
}

#[test]
fn clip_rect_leaves_pixels_outside_it_unchanged() {
    let mut canvas = Canvas::new(10, 10).unwrap();
    canvas.set_fill(FillSource::Solid(Color::new(1.0, 0.0, 0.0, 1.0)));
    canvas.set_clip_rect(vraster::IntRect::new(5, 5, 10, 10));
    canvas.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0));

    assert_eq!(canvas.surface().get_pixel(0, 0).unwrap(), PremultipliedColorU8::transparent());
    assert_eq!(canvas.surface().get_pixel(4, 9).unwrap(), PremultipliedColorU8::transparent());
    assert_eq!(canvas.surface().get_pixel(6, 6).unwrap(), solid(255, 0, 0, 255));
    assert_eq!(canvas.surface().get_pixel(9, 9).unwrap(), solid(255, 0, 0, 255));
}

#[test]
fn horizontal_stroke_covers_three_rows_with_cumulative_coverage_three() {
    let mut pb = Path::builder();
    pb.move_to(0.0, 5.0);
    pb.line_to(10.0, 5.0);
    let path = pb.finish();

    let mut style = Stroke::default();
    style.width = 3.0;
    style.line_cap = vraster::LineCap::Butt;
    let outline_path = style.stroke_path(&path);

    let transform = Transform::identity();
    let outline = Outline::build(&outline_path, &transform, FillRule::NonZero);
    let spans = vraster::rasterize(&outline, 10, 10, FillRule::NonZero);

    let mut coverage_by_row = [0u32; 10];
    for span in spans.iter() {
        assert!(span.y >= 0 && span.y < 10);
        coverage_by_row[span.y as usize] += span.coverage as u32 * span.len as u32;
    }

    // Rows 4, 5, 6 hold the stroke; row 5 is fully covered.
    assert!(coverage_by_row[5] > 0);
    for &row in &[0usize, 1, 2, 3, 7, 8, 9] {
        assert_eq!(coverage_by_row[row], 0, "row {row} should carry no stroke coverage");
    }

    // Per-column cumulative coverage across rows 4..=6 should sum to
    // roughly 3.0 (255 * 3) for columns fully inside the line's span.
    let mut per_column = [0u32; 10];
    for span in spans.iter() {
        if (4..=6).contains(&span.y) {
            for x in span.x..span.right() {
                if x >= 0 && (x as usize) < per_column.len() {
                    per_column[x as usize] += span.coverage as u32;
                }
            }
        }
    }
    for &col in &[2usize, 3, 4, 5, 6, 7] {
        let total = per_column[col];
        assert!(total >= 255 * 3 - 10 && total <= 255 * 3 + 10, "column {col} cumulative coverage {total}");
    }
}

#[test]
fn zero_width_stroke_produces_no_spans() {
    let mut pb = Path::builder();
    pb.move_to(0.0, 5.0);
    pb.line_to(10.0, 5.0);
    let path = pb.finish();

    let mut style = Stroke::default();
    style.width = 0.0;
    let outline_path = style.stroke_path(&path);
    assert!(outline_path.is_empty());

    let outline = Outline::build(&outline_path, &Transform::identity(), FillRule::NonZero);
    let spans = vraster::rasterize(&outline, 10, 10, FillRule::NonZero);
    assert!(spans.is_empty());
}

#[test]
fn path_outside_surface_bounds_produces_no_spans() {
    let mut pb = Path::builder();
    pb.move_to(-20.0, -20.0);
    pb.line_to(-10.0, -20.0);
    pb.line_to(-10.0, -10.0);
    pb.close();
    let path = pb.finish();

    let outline = Outline::build(&path, &Transform::identity(), FillRule::NonZero);
    let spans = vraster::rasterize(&outline, 10, 10, FillRule::NonZero);
    assert!(spans.is_empty());
}

#[test]
fn path_clone_round_trips_element_equality() {
    let mut pb = Path::builder();
    pb.move_to(1.0, 2.0);
    pb.line_to(3.0, 4.0);
    pb.cubic_to(5.0, 6.0, 7.0, 8.0, 9.0, 10.0);
    pb.close();
    let path = pb.finish();
    let cloned = path.clone();
    assert_eq!(path, cloned);
}

#[test]
fn transform_double_invert_is_identity_within_tolerance() {
    let m = Transform::from_translate(3.0, -4.0).post_concat(&Transform::from_rotate(37.0)).post_concat(&Transform::from_scale(2.0, 0.5));
    let once = m.invert().unwrap();
    let twice = once.invert().unwrap();

    let p = vraster::Point::new(17.0, -5.0);
    let a = m.map_point(p);
    let b = twice.map_point(p);
    assert!((a.x - b.x).abs() < 1e-3);
    assert!((a.y - b.y).abs() < 1e-3);
}

#[test]
fn gradient_with_zero_stops_is_fully_transparent() {
    let gradient = Gradient::new(
        GradientKind::Linear { p0: vraster::Point::new(0.0, 0.0), p1: vraster::Point::new(10.0, 0.0) },
        SpreadMode::Pad,
        Transform::identity(),
        &[],
        vraster::ColorSpace::Srgb,
        1.0,
    );
    assert_eq!(gradient.sample(0.0), PremultipliedColorU8::transparent());
    assert_eq!(gradient.sample(1.0), PremultipliedColorU8::transparent());
}

#[test]
fn gradient_with_one_stop_is_a_solid_fill() {
    let stops = vec![GradientStop { offset: 0.5, color: Color::new(0.2, 0.4, 0.6, 1.0) }];
    let gradient = Gradient::new(
        GradientKind::Linear { p0: vraster::Point::new(0.0, 0.0), p1: vraster::Point::new(10.0, 0.0) },
        SpreadMode::Pad,
        Transform::identity(),
        &stops,
        vraster::ColorSpace::Srgb,
        1.0,
    );
    let expected = Color::new(0.2, 0.4, 0.6, 1.0).premultiply(1.0);
    assert_eq!(gradient.sample(0.0), expected);
    assert_eq!(gradient.sample(1.0), expected);
}

#[test]
fn coincident_linear_gradient_endpoints_degrade_to_first_stop() {
    let stops = vec![
        GradientStop { offset: 0.0, color: Color::new(1.0, 0.0, 0.0, 1.0) },
        GradientStop { offset: 1.0, color: Color::new(0.0, 1.0, 0.0, 1.0) },
    ];
    let p = vraster::Point::new(5.0, 5.0);
    let gradient = Gradient::new(GradientKind::Linear { p0: p, p1: p }, SpreadMode::Pad, Transform::identity(), &stops, vraster::ColorSpace::Srgb, 1.0);
    let expected = Color::new(1.0, 0.0, 0.0, 1.0).premultiply(1.0);
    assert_eq!(gradient.sample(0.0), expected);
}

#[test]
fn mask_layer_clamps_composited_alpha() {
    let mut target = Surface::new(1, 1).unwrap();
    let mut mask_surface = Surface::new(1, 1).unwrap();
    mask_surface.fill(solid(0, 0, 0, 64));
    let mask = Mask::new(mask_surface, MaskMode::Alpha);

    let spans = vraster::SpanBuffer::from_rect(0, 0, 1, 1);
    let paint = vraster::Paint::Solid(solid(255, 255, 255, 255));
    let params = vraster::DrawParams {
        spans: &spans,
        paint: &paint,
        paint_transform: Transform::identity(),
        op: Op::SrcOver,
        blend_mode: vraster::BlendMode::Normal,
        opacity: 1.0,
        color_interp: vraster::ColorSpace::Srgb,
        dithering: false,
        clip_rect: None,
        clip_spans: None,
        mask: Some(&mask),
    };
    vraster::draw(&mut target, &params);
    assert_eq!(target.get_pixel(0, 0).unwrap().alpha(), 64);
}
