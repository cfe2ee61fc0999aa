//! Software RGBA backend.
//!
//! Every texture (loaded image or offscreen surface) and the screen itself is
//! a `Pixmap` of straight-alpha RGBA pixels. Copies use nearest-neighbour
//! sampling, multiply by the tint and alpha-blend onto the current target.
//! `present` snapshots the screen into a front buffer so presenters always read
//! a complete frame.

use crate::backend::{BackendError, Color, DrawTarget, Rect, RenderBackend, TextureId};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixmap {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl Pixmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::TRANSPARENT; (width as usize) * (height as usize)],
        }
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Color>) -> Result<Self, BackendError> {
        let expected = (width as usize) * (height as usize);
        if pixels.len() != expected {
            return Err(BackendError::PixelCount {
                expected,
                got: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<Color> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(self.pixels[y as usize * self.width as usize + x as usize])
    }

    fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    #[inline]
    fn blend(&mut self, x: i32, y: i32, src: Color) {
        let idx = y as usize * self.width as usize + x as usize;
        self.pixels[idx] = blend_over(src, self.pixels[idx]);
    }
}

#[inline]
fn modulate(c: Color, tint: Color) -> Color {
    let m = |a: u8, b: u8| ((a as u16 * b as u16 + 127) / 255) as u8;
    Color::rgba(m(c.r, tint.r), m(c.g, tint.g), m(c.b, tint.b), m(c.a, tint.a))
}

/// Source-over blending in straight alpha.
#[inline]
fn blend_over(src: Color, dst: Color) -> Color {
    match src.a {
        0 => dst,
        255 => src,
        sa => {
            let sa = sa as u32;
            let da = dst.a as u32;
            let out_a = sa + da * (255 - sa) / 255;
            if out_a == 0 {
                return Color::TRANSPARENT;
            }
            let ch = |s: u8, d: u8| {
                ((s as u32 * sa + d as u32 * da * (255 - sa) / 255) / out_a) as u8
            };
            Color::rgba(ch(src.r, dst.r), ch(src.g, dst.g), ch(src.b, dst.b), out_a as u8)
        }
    }
}

#[derive(Debug)]
pub struct CanvasBackend {
    screen: Pixmap,
    front: Pixmap,
    textures: HashMap<TextureId, Pixmap>,
    next_id: u32,
    target: DrawTarget,
    frames_presented: u64,
}

impl CanvasBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            screen: Pixmap::new(width, height),
            front: Pixmap::new(width, height),
            textures: HashMap::new(),
            next_id: 1,
            target: DrawTarget::Screen,
            frames_presented: 0,
        }
    }

    /// Upload decoded image pixels (asset pipeline entry point).
    pub fn load_rgba(
        &mut self,
        width: u32,
        height: u32,
        pixels: Vec<Color>,
    ) -> Result<TextureId, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::InvalidSize { width, height });
        }
        let pixmap = Pixmap::from_pixels(width, height, pixels)?;
        let id = self.alloc();
        self.textures.insert(id, pixmap);
        Ok(id)
    }

    pub fn texture(&self, id: TextureId) -> Option<&Pixmap> {
        self.textures.get(&id)
    }

    /// Back buffer (what has been drawn since the last present).
    pub fn screen(&self) -> &Pixmap {
        &self.screen
    }

    /// Last presented frame.
    pub fn frame(&self) -> &Pixmap {
        &self.front
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Resize the output; the screen contents are discarded.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.screen = Pixmap::new(width, height);
        self.front = Pixmap::new(width, height);
    }

    fn alloc(&mut self) -> TextureId {
        let id = TextureId(self.next_id);
        self.next_id += 1;
        id
    }

    fn target_mut(&mut self, target: DrawTarget) -> Result<&mut Pixmap, BackendError> {
        match target {
            DrawTarget::Screen => Ok(&mut self.screen),
            DrawTarget::Surface(id) => self
                .textures
                .get_mut(&id)
                .ok_or(BackendError::UnknownTexture(id)),
        }
    }
}

impl RenderBackend for CanvasBackend {
    fn output_size(&self) -> (u32, u32) {
        (self.screen.width, self.screen.height)
    }

    fn create_offscreen_surface(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<TextureId, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::InvalidSize { width, height });
        }
        let id = self.alloc();
        self.textures.insert(id, Pixmap::new(width, height));
        Ok(id)
    }

    fn set_draw_target(&mut self, target: DrawTarget) -> Result<(), BackendError> {
        if let DrawTarget::Surface(id) = target {
            if !self.textures.contains_key(&id) {
                return Err(BackendError::UnknownTexture(id));
            }
        }
        self.target = target;
        Ok(())
    }

    fn draw_target(&self) -> DrawTarget {
        self.target
    }

    fn clear(&mut self, target: DrawTarget, color: Color) -> Result<(), BackendError> {
        self.target_mut(target)?.fill(color);
        Ok(())
    }

    fn copy_textured_region(
        &mut self,
        source: TextureId,
        src: Option<Rect>,
        dst: Option<Rect>,
        tint: Color,
    ) -> Result<(), BackendError> {
        // Temporarily take the source out so the target can be borrowed
        // mutably even when both are textures.
        let src_pix = self
            .textures
            .remove(&source)
            .ok_or(BackendError::UnknownTexture(source))?;
        let target = self.target;
        let result = match self.target_mut(target) {
            Ok(dst_pix) => {
                blit(&src_pix, src, dst_pix, dst, tint);
                Ok(())
            }
            Err(e) => Err(e),
        };
        self.textures.insert(source, src_pix);
        result
    }

    fn destroy_surface(&mut self, surface: TextureId) {
        if self.textures.remove(&surface).is_some() && self.target == DrawTarget::Surface(surface)
        {
            self.target = DrawTarget::Screen;
        }
    }

    fn present(&mut self) -> Result<(), BackendError> {
        self.front.clone_from(&self.screen);
        self.frames_presented += 1;
        Ok(())
    }
}

fn blit(
    src: &Pixmap,
    src_rect: Option<Rect>,
    dst: &mut Pixmap,
    dst_rect: Option<Rect>,
    tint: Color,
) {
    let s = src_rect.unwrap_or_else(|| src.bounds());
    let d = dst_rect.unwrap_or_else(|| dst.bounds());
    if s.is_empty() || d.is_empty() {
        return;
    }
    let x0 = d.x.max(0);
    let y0 = d.y.max(0);
    let x1 = d.right().min(dst.width as i32);
    let y1 = d.bottom().min(dst.height as i32);
    for y in y0..y1 {
        let sy = s.y + ((y - d.y) as i64 * s.h as i64 / d.h as i64) as i32;
        for x in x0..x1 {
            let sx = s.x + ((x - d.x) as i64 * s.w as i64 / d.w as i64) as i32;
            if let Some(px) = src.get(sx, sy) {
                dst.blend(x, y, modulate(px, tint));
            }
        }
    }
}
