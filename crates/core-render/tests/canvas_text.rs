use core_render::{
    CanvasBackend, Color, GlyphAtlas, Rect, RenderBackend, RenderTarget, TextRenderer, TextStyle,
    TypewriterState,
};

const RED: Color = Color::rgb(255, 0, 0);

/// Two 16x16 cells: 'a' fully lit, 'b' lit only in its left half.
fn load_atlas(backend: &mut CanvasBackend) -> GlyphAtlas {
    let mut pixels = Vec::with_capacity(32 * 16);
    for _y in 0..16 {
        for x in 0..32 {
            let lit = x < 24;
            pixels.push(if lit { Color::WHITE } else { Color::TRANSPARENT });
        }
    }
    let tex = backend.load_rgba(32, 16, pixels).unwrap();
    GlyphAtlas::new(tex, "ab", 32, 16, 16, 16).unwrap()
}

fn style() -> TextStyle {
    TextStyle {
        size: 16,
        h_offset: 0,
        v_offset: 100,
        color: RED,
    }
}

#[test]
fn cached_text_reaches_presented_frame() {
    let mut backend = CanvasBackend::new(64, 32);
    let atlas = load_atlas(&mut backend);
    let r = TextRenderer::new(&atlas, style());
    let mut target = RenderTarget::new();

    r.draw_text(&mut backend, "ab", 0, 0, Some(&mut target))
        .unwrap();
    backend.present().unwrap();

    let frame = backend.frame();
    assert_eq!(frame.get(4, 4), Some(RED));
    assert_eq!(frame.get(20, 4), Some(RED));
    assert_eq!(frame.get(28, 4), Some(Color::TRANSPARENT));
    assert_eq!(frame.get(40, 4), Some(Color::TRANSPARENT));
    assert_eq!(backend.frames_presented(), 1);
    target.release(&mut backend);
}

#[test]
fn multiline_places_second_line_one_line_height_down() {
    let mut backend = CanvasBackend::new(64, 32);
    let atlas = load_atlas(&mut backend);
    let r = TextRenderer::new(&atlas, style());
    let mut target = RenderTarget::new();

    r.draw_multiline(&mut backend, "a\nb", Rect::new(0, 0, 64, 32), Some(&mut target))
        .unwrap();
    let screen = backend.screen();
    assert_eq!(screen.get(4, 4), Some(RED));
    assert_eq!(screen.get(4, 20), Some(RED));
    assert_eq!(screen.get(12, 20), Some(Color::TRANSPARENT));
    target.release(&mut backend);
}

#[test]
fn completed_typewriter_matches_static_render() {
    let rect = Rect::new(0, 0, 64, 32);
    let text = "ab ba\nab";

    let mut static_backend = CanvasBackend::new(64, 32);
    let atlas = load_atlas(&mut static_backend);
    let r = TextRenderer::new(&atlas, style());
    let mut target = RenderTarget::new();
    r.draw_multiline(&mut static_backend, text, rect, Some(&mut target))
        .unwrap();
    target.release(&mut static_backend);

    let mut tw_backend = CanvasBackend::new(64, 32);
    let atlas2 = load_atlas(&mut tw_backend);
    let r2 = TextRenderer::new(&atlas2, style());
    let mut target2 = RenderTarget::new();
    let mut state = TypewriterState::new(0.0);
    r2.reveal_all(&mut tw_backend, text, rect, &mut target2, &mut state)
        .unwrap();
    target2.release(&mut tw_backend);

    assert_eq!(static_backend.screen(), tw_backend.screen());
}

#[test]
fn released_resources_leave_only_the_atlas() {
    let mut backend = CanvasBackend::new(16, 16);
    let atlas = load_atlas(&mut backend);
    let r = TextRenderer::new(&atlas, style());
    let mut target = RenderTarget::new();
    r.draw_text(&mut backend, "a", 0, 0, Some(&mut target))
        .unwrap();
    assert_eq!(backend.texture_count(), 2);
    target.release(&mut backend);
    assert_eq!(backend.texture_count(), 1);
    atlas.release(&mut backend);
    assert_eq!(backend.texture_count(), 0);
}

#[test]
fn revealed_glyphs_survive_output_resize() {
    let mut backend = CanvasBackend::new(64, 32);
    let atlas = load_atlas(&mut backend);
    let r = TextRenderer::new(&atlas, style());
    let mut target = RenderTarget::new();
    let mut state = TypewriterState::new(0.0);
    let rect = Rect::new(0, 0, 64, 32);

    r.draw_typewriter(&mut backend, "ab", rect, &mut target, &mut state)
        .unwrap();
    backend.resize(80, 32);
    r.draw_typewriter(&mut backend, "ab", rect, &mut target, &mut state)
        .unwrap();

    assert!(state.is_complete());
    let screen = backend.screen();
    assert_eq!(screen.width(), 80);
    assert_eq!(screen.get(4, 4), Some(RED), "'a' must be redrawn after resize");
    assert_eq!(screen.get(20, 4), Some(RED));
    target.release(&mut backend);
}

#[test]
fn cached_text_follows_output_resize() {
    let mut backend = CanvasBackend::new(64, 32);
    let atlas = load_atlas(&mut backend);
    let r = TextRenderer::new(&atlas, style());
    let mut target = RenderTarget::new();

    r.draw_text(&mut backend, "a", 0, 0, Some(&mut target))
        .unwrap();
    let old = target.surface().unwrap();
    backend.resize(80, 32);
    r.draw_text(&mut backend, "a", 0, 0, Some(&mut target))
        .unwrap();

    let now = target.surface().unwrap();
    assert_ne!(now, old);
    assert_eq!(backend.texture(now).map(|p| (p.width(), p.height())), Some((80, 32)));
    assert_eq!(backend.screen().get(4, 4), Some(RED));
    target.release(&mut backend);
}
