//! Static text drawing through the glyph atlas.
//!
//! Text arrives as bytes (`&str`, `String`, `Vec<u8>`, ...) and goes through
//! the lenient decoder, so malformed input renders as decoded rather than
//! being replaced first.
//!
//! Every entry point takes an optional `RenderTarget`:
//! - `Some(target)`: glyphs composite onto the cached surface, the target is
//!   marked finished once the whole request is drawn, and the surface is
//!   blitted to the screen. A finished target still sized to the output
//!   short-circuits to the blit.
//! - `None`: glyphs are copied straight onto the screen every call.
//!
//! Character policy (shared with the typewriter):
//! - space: advance the pen, no copy;
//! - mapped glyph: copy the atlas cell to `(pen_x, y, size, size)`, advance;
//! - unmapped: skip, no advance.

use crate::atlas::GlyphAtlas;
use crate::backend::{Color, DrawTarget, Rect, RenderBackend};
use crate::cache::RenderTarget;
use crate::error::RenderError;
use crate::metrics::RenderMetrics;
use core_text::{
    CodePoint, LineText, WrapParams, decode, effective_advance, layout_code_points, line_advance,
};
use tracing::trace;

/// Glyph size, overlap percentages and tint used when drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    /// Destination size of one glyph cell in pixels.
    pub size: i32,
    /// Horizontal overlap between neighbouring glyphs, percent of `size`.
    pub h_offset: i32,
    /// Vertical line spacing, percent of `size`.
    pub v_offset: i32,
    pub color: Color,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 32,
            h_offset: 57,
            v_offset: 70,
            color: Color::WHITE,
        }
    }
}

impl TextStyle {
    #[inline]
    pub fn advance(&self) -> i32 {
        effective_advance(self.size, self.h_offset)
    }

    #[inline]
    pub fn line_height(&self) -> i32 {
        line_advance(self.size, self.v_offset)
    }

    pub fn wrap(&self, max_width: i32) -> WrapParams {
        WrapParams::new(self.size, self.h_offset, max_width)
    }
}

/// Draws text from one atlas with one style. Long-lived: keep it for as long
/// as the atlas so the metrics accumulate.
#[derive(Debug)]
pub struct TextRenderer<'a> {
    pub(crate) atlas: &'a GlyphAtlas,
    pub(crate) style: TextStyle,
    pub(crate) metrics: RenderMetrics,
}

impl<'a> TextRenderer<'a> {
    pub fn new(atlas: &'a GlyphAtlas, style: TextStyle) -> Self {
        Self {
            atlas,
            style,
            metrics: RenderMetrics::default(),
        }
    }

    pub fn atlas(&self) -> &GlyphAtlas {
        self.atlas
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    pub fn metrics(&self) -> &RenderMetrics {
        &self.metrics
    }

    /// Draw one line of text with its pen starting at `(x, y)`.
    pub fn draw_text<B, T>(
        &self,
        backend: &mut B,
        text: &T,
        x: i32,
        y: i32,
        target: Option<&mut RenderTarget>,
    ) -> Result<(), RenderError>
    where
        B: RenderBackend + ?Sized,
        T: AsRef<[u8]> + ?Sized,
    {
        if let Some(t) = target.as_deref() {
            if t.is_servable(backend) {
                return self.serve_cached(backend, t, None);
            }
        }
        self.draw_code_points(backend, &decode(text.as_ref()), x, y, target)
    }

    /// Draw already decoded code points on one line.
    pub fn draw_code_points<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        code_points: &[CodePoint],
        x: i32,
        y: i32,
        target: Option<&mut RenderTarget>,
    ) -> Result<(), RenderError> {
        match target {
            Some(t) => {
                if t.is_servable(backend) {
                    return self.serve_cached(backend, t, None);
                }
                self.compose(backend, code_points, x, y, Some(&mut *t))?;
                t.mark_finished();
                self.blit(backend, t, None)
            }
            None => {
                self.compose(backend, code_points, x, y, None)?;
                Ok(())
            }
        }
    }

    /// Draw precomputed lines top-down starting at `rect`'s origin, one line
    /// height apart. With a target, only `rect` of the cache is blitted.
    pub fn draw_lines<B: RenderBackend + ?Sized, S: LineText>(
        &self,
        backend: &mut B,
        lines: &[S],
        rect: Rect,
        mut target: Option<&mut RenderTarget>,
    ) -> Result<(), RenderError> {
        if let Some(t) = target.as_deref() {
            if t.is_servable(backend) {
                return self.serve_cached(backend, t, Some(rect));
            }
        }
        let mut y = rect.y;
        for line in lines {
            self.compose(
                backend,
                &line.to_code_points(),
                rect.x,
                y,
                target.as_deref_mut(),
            )?;
            y += self.style.line_height();
        }
        if let Some(t) = target {
            t.mark_finished();
            self.blit(backend, t, Some(rect))?;
        }
        Ok(())
    }

    /// Lay out `text` inside `rect` (newline split + width wrap) and draw it.
    pub fn draw_multiline<B, T>(
        &self,
        backend: &mut B,
        text: &T,
        rect: Rect,
        target: Option<&mut RenderTarget>,
    ) -> Result<(), RenderError>
    where
        B: RenderBackend + ?Sized,
        T: AsRef<[u8]> + ?Sized,
    {
        if let Some(t) = target.as_deref() {
            if t.is_servable(backend) {
                return self.serve_cached(backend, t, Some(rect));
            }
        }
        let lines = layout_code_points(&decode(text.as_ref()), self.style.wrap(rect.w));
        trace!(target: "render.text", lines = lines.len(), "multiline_layout");
        self.draw_lines(backend, &lines, rect, target)
    }

    /// Copy glyphs for `code_points` onto the target surface (or the screen)
    /// with the pen starting at `x`. Returns the final pen position.
    pub(crate) fn compose<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        code_points: &[CodePoint],
        x: i32,
        y: i32,
        target: Option<&mut RenderTarget>,
    ) -> Result<i32, RenderError> {
        match target {
            Some(t) => t.bind(backend)?,
            None => {
                if backend.draw_target() != DrawTarget::Screen {
                    backend.set_draw_target(DrawTarget::Screen)?;
                }
            }
        }
        let advance = self.style.advance();
        let mut pen = x;
        for &cp in code_points {
            if cp.is_space() {
                pen += advance;
                RenderMetrics::bump(&self.metrics.spaces_advanced);
                continue;
            }
            let Some(index) = self.atlas.glyph_index(cp) else {
                RenderMetrics::bump(&self.metrics.glyphs_unmapped);
                trace!(target: "render.atlas", code_point = %cp, "glyph_unmapped");
                continue;
            };
            let src = self.atlas.glyph_rect(index)?;
            let dst = Rect::new(pen, y, self.style.size, self.style.size);
            backend.copy_textured_region(
                self.atlas.texture(),
                Some(src),
                Some(dst),
                self.style.color,
            )?;
            RenderMetrics::bump(&self.metrics.glyphs_drawn);
            pen += advance;
        }
        Ok(pen)
    }

    pub(crate) fn blit<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        target: &RenderTarget,
        region: Option<Rect>,
    ) -> Result<(), RenderError> {
        target.present_region(backend, region)?;
        RenderMetrics::bump(&self.metrics.cache_blits);
        Ok(())
    }

    fn serve_cached<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        target: &RenderTarget,
        region: Option<Rect>,
    ) -> Result<(), RenderError> {
        RenderMetrics::bump(&self.metrics.cache_hits);
        self.blit(backend, target, region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TextureId;
    use crate::recording::{Command, RecordingBackend};

    fn setup() -> (RecordingBackend, GlyphAtlas) {
        let mut backend = RecordingBackend::new(320, 240);
        let tex = backend.register_image(64, 64);
        let atlas = GlyphAtlas::new(tex, "abcdefghijklmnop", 64, 64, 16, 16).unwrap();
        (backend, atlas)
    }

    fn glyph_dsts(cmds: &[Command], atlas: TextureId) -> Vec<Rect> {
        cmds.iter()
            .filter_map(|c| match c {
                Command::Copy {
                    source,
                    dst: Some(d),
                    ..
                } if *source == atlas => Some(*d),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn style_defaults_match_classic_parameters() {
        let s = TextStyle::default();
        assert_eq!(s.advance(), 32 - 32 * 57 / 100);
        assert_eq!(s.line_height(), 22);
    }

    #[test]
    fn direct_draw_advances_over_spaces_and_skips_unmapped() {
        let (mut backend, atlas) = setup();
        let style = TextStyle {
            size: 10,
            h_offset: 0,
            ..TextStyle::default()
        };
        let r = TextRenderer::new(&atlas, style);
        r.draw_text(&mut backend, "a b?c", 5, 7, None).unwrap();
        let dsts = glyph_dsts(backend.commands(), atlas.texture());
        assert_eq!(
            dsts,
            vec![
                Rect::new(5, 7, 10, 10),
                Rect::new(25, 7, 10, 10),
                // '?' is unmapped: no advance.
                Rect::new(35, 7, 10, 10),
            ]
        );
        let m = r.metrics().snapshot();
        assert_eq!(m.glyphs_drawn, 3);
        assert_eq!(m.spaces_advanced, 1);
        assert_eq!(m.glyphs_unmapped, 1);
        assert_eq!(m.cache_blits, 0);
    }

    #[test]
    fn malformed_bytes_draw_their_lenient_code_points() {
        let mut backend = RecordingBackend::new(320, 240);
        let tex = backend.register_image(64, 64);
        // Cells 0..3: truncated E2 82, 'z', orphan A9.
        let alphabet = vec![CodePoint(0xE28200), CodePoint(b'z' as u32), CodePoint(0xA9)];
        let atlas = GlyphAtlas::from_code_points(tex, alphabet, 64, 64, 16, 16).unwrap();
        let style = TextStyle {
            size: 10,
            h_offset: 0,
            ..TextStyle::default()
        };
        let r = TextRenderer::new(&atlas, style);
        let bytes: Vec<u8> = vec![0xE2, 0x82, b'z', 0xA9];
        r.draw_text(&mut backend, &bytes, 0, 0, None).unwrap();
        let srcs: Vec<Rect> = backend
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::Copy { src: Some(s), .. } => Some(*s),
                _ => None,
            })
            .collect();
        assert_eq!(
            srcs,
            vec![
                Rect::new(0, 0, 16, 16),
                Rect::new(16, 0, 16, 16),
                Rect::new(32, 0, 16, 16),
            ]
        );
        assert_eq!(r.metrics().snapshot().glyphs_unmapped, 0);
    }

    #[test]
    fn glyph_source_rect_comes_from_atlas_grid() {
        let (mut backend, atlas) = setup();
        let r = TextRenderer::new(&atlas, TextStyle::default());
        r.draw_text(&mut backend, "f", 0, 0, None).unwrap();
        let src = backend.commands().iter().find_map(|c| match c {
            Command::Copy { src, .. } => *src,
            _ => None,
        });
        // 'f' is index 5: row 1, col 1 in a 4-wide grid.
        assert_eq!(src, Some(Rect::new(16, 16, 16, 16)));
    }
}
