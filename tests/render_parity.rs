use placard::{
    AspectRatio, BackgroundKind, CanvasSettings, GradientKind, InteractiveRenderer, PackedColor,
    Page, PageRenderer, PatternKind, RenderOptions, ShapeElement, ShapeKind, SurfaceSize,
    TextElement, render_to_image,
};

fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn digest_u64(bytes: &[u8]) -> u64 {
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    for chunk in bytes.chunks(8) {
        let mut v = 0u64;
        for (i, &b) in chunk.iter().enumerate() {
            v |= (b as u64) << (i * 8);
        }
        state = mix64(state ^ v);
    }
    state
}

fn busy_page(size: u32) -> Page {
    let mut page = Page::new(CanvasSettings {
        aspect: AspectRatio::Custom {
            width: size,
            height: size,
        },
        padding: (size as f64) * 0.05,
        ..CanvasSettings::default()
    });

    page.background.kind = BackgroundKind::Gradient;
    page.background.gradient.kind = GradientKind::Radial;
    page.background.gradient.colors = vec![
        PackedColor::from_argb(255, 240, 200, 80),
        PackedColor::from_argb(255, 40, 40, 120),
    ];

    let mut star = ShapeElement::new(ShapeKind::Star);
    star.position.x = 0.3;
    star.position.y = 0.35;
    star.position.width = 0.4;
    star.position.height = 0.4;
    star.position.rotation_deg = 20.0;
    star.style.fill = Some(PackedColor::from_argb(255, 220, 60, 60));
    star.style.stroke_width = 2.0;
    page.add_shape(star);

    let mut ring = ShapeElement::new(ShapeKind::Ring);
    ring.position.x = 0.7;
    ring.position.y = 0.65;
    ring.position.width = 0.35;
    ring.position.height = 0.35;
    ring.style.fill = Some(PackedColor::from_argb(255, 30, 160, 90));
    page.add_shape(ring);

    let mut text = TextElement::new("Hello Placard");
    text.position.y = 0.85;
    text.style.font_size = 0.06;
    page.add_text(text);

    page
}

#[test]
fn repeated_renders_are_bit_identical() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mut renderer = PageRenderer::new();
    let page = busy_page(128);
    let surface = SurfaceSize::new(128, 128);

    let a = renderer
        .render_page(&page, surface, 1.0, None, &RenderOptions::default())
        .unwrap();
    let b = renderer
        .render_page(&page, surface, 1.0, None, &RenderOptions::default())
        .unwrap();
    assert_eq!(digest_u64(&a.frame.data), digest_u64(&b.frame.data));
    assert!(a.frame.data.iter().any(|&v| v != 0));
}

#[test]
fn seeded_pattern_background_is_deterministic_across_renderers() {
    let mut page = busy_page(96);
    page.background.kind = BackgroundKind::Pattern;
    page.background.pattern.kind = PatternKind::OrganicBlobs;

    let surface = SurfaceSize::new(96, 96);
    let a = PageRenderer::new()
        .render_page(&page, surface, 1.0, None, &RenderOptions::default())
        .unwrap();
    let b = PageRenderer::new()
        .render_page(&page, surface, 1.0, None, &RenderOptions::default())
        .unwrap();
    assert_eq!(digest_u64(&a.frame.data), digest_u64(&b.frame.data));
}

#[test]
fn interactive_and_export_paths_agree_without_decorations() {
    // Same (surface, scale) pair and no interactive-only decorations: the
    // export raster must equal the plain page render byte for byte.
    let page = busy_page(96);
    let surface = SurfaceSize::new(96, 96);

    let plain = PageRenderer::new()
        .render_page(&page, surface, 1.0, None, &RenderOptions::default())
        .unwrap();
    let exported = render_to_image(&mut PageRenderer::new(), &page, 1.0).unwrap();
    assert_eq!(plain.frame.data, exported.data);
}

#[test]
fn interactive_decorations_do_not_move_geometry() {
    // A page with no selection, no shadow, and no decorated text renders the
    // same with and without the interactive flag.
    let page = busy_page(96);
    let surface = SurfaceSize::new(96, 96);

    let plain = PageRenderer::new()
        .render_page(&page, surface, 1.0, None, &RenderOptions::default())
        .unwrap();
    let interactive = InteractiveRenderer::new()
        .render(&page, surface, 1.0, None)
        .unwrap();
    assert_eq!(plain.frame.data, interactive.frame.data);
}

#[test]
fn export_at_scale_two_doubles_bounding_boxes() {
    let mut page = Page::new(CanvasSettings {
        aspect: AspectRatio::Custom {
            width: 64,
            height: 64,
        },
        ..CanvasSettings::default()
    });
    page.background.solid.color = PackedColor::WHITE;
    let mut rect = ShapeElement::new(ShapeKind::Rectangle);
    rect.position.width = 0.5;
    rect.position.height = 0.25;
    rect.style.fill = Some(PackedColor::BLACK);
    page.add_shape(rect);

    let one = render_to_image(&mut PageRenderer::new(), &page, 1.0).unwrap();
    let two = render_to_image(&mut PageRenderer::new(), &page, 2.0).unwrap();
    assert_eq!((one.width, one.height), (64, 64));
    assert_eq!((two.width, two.height), (128, 128));

    let bbox = |frame: &placard::FrameRgba| {
        let w = frame.width as i64;
        let (mut x0, mut y0, mut x1, mut y1) = (i64::MAX, i64::MAX, i64::MIN, i64::MIN);
        for (i, px) in frame.data.chunks_exact(4).enumerate() {
            if px[0] < 128 && px[3] > 0 {
                let x = (i as i64) % w;
                let y = (i as i64) / w;
                x0 = x0.min(x);
                y0 = y0.min(y);
                x1 = x1.max(x);
                y1 = y1.max(y);
            }
        }
        (x1 - x0 + 1, y1 - y0 + 1)
    };

    let (w1, h1) = bbox(&one);
    let (w2, h2) = bbox(&two);
    assert!((w2 - 2 * w1).abs() <= 1, "w1={w1} w2={w2}");
    assert!((h2 - 2 * h1).abs() <= 1, "h1={h1} h2={h2}");
}

#[test]
fn element_order_changes_paint_order() {
    let mut page = Page::new(CanvasSettings {
        aspect: AspectRatio::Custom {
            width: 48,
            height: 48,
        },
        ..CanvasSettings::default()
    });
    let mut red = ShapeElement::new(ShapeKind::Rectangle);
    red.position.width = 0.6;
    red.position.height = 0.6;
    red.style.fill = Some(PackedColor::from_argb(255, 200, 0, 0));
    let mut blue = ShapeElement::new(ShapeKind::Rectangle);
    blue.position.width = 0.6;
    blue.position.height = 0.6;
    blue.style.fill = Some(PackedColor::from_argb(255, 0, 0, 200));
    let (red_id, blue_id) = (red.id.clone(), blue.id.clone());
    page.add_shape(red);
    page.add_shape(blue);

    let surface = SurfaceSize::new(48, 48);
    let center = |frame: &placard::FrameRgba| {
        let idx = ((24 * 48 + 24) * 4) as usize;
        (frame.data[idx], frame.data[idx + 2])
    };

    let mut renderer = PageRenderer::new();
    let top_blue = renderer
        .render_page(&page, surface, 1.0, None, &RenderOptions::default())
        .unwrap();
    assert!(center(&top_blue.frame).1 > center(&top_blue.frame).0);

    page.element_order = vec![blue_id, red_id];
    let top_red = renderer
        .render_page(&page, surface, 1.0, None, &RenderOptions::default())
        .unwrap();
    assert!(center(&top_red.frame).0 > center(&top_red.frame).1);
}
