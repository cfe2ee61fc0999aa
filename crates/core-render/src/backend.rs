//! Rendering capability consumed by the text renderer.
//!
//! The core never talks to a window, GPU or image decoder directly. Everything
//! it needs from the graphics side is the handful of primitives below:
//! offscreen surfaces, a current draw target, clears, textured copies with a
//! tint, surface destruction and present.
//!
//! Design invariants:
//! * Images (atlas textures) and offscreen surfaces share one handle space
//!   (`TextureId`); any texture can be the source of a copy.
//! * Copies land on whatever `DrawTarget` was set last.
//! * `None` rectangles mean "the whole texture" / "the whole target".
//! * Implementations own the underlying resources; callers own handles and
//!   must hand them back through `destroy_surface`.

use std::fmt;
use thiserror::Error;

/// Axis-aligned pixel rectangle. Position may be negative (partially
/// offscreen); size is expected to be non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }
}

/// 8-bit RGBA color. Used as clear color and as multiplicative tint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Opaque handle to a backend texture (loaded image or offscreen surface).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tex#{}", self.0)
    }
}

/// Destination of subsequent copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum DrawTarget {
    #[default]
    Screen,
    Surface(TextureId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("unknown texture {0}")]
    UnknownTexture(TextureId),
    #[error("invalid surface size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("pixel buffer holds {got} pixels, expected {expected}")]
    PixelCount { expected: usize, got: usize },
}

/// The graphics primitives the renderer is written against.
pub trait RenderBackend {
    /// Size of the screen / window output in pixels.
    fn output_size(&self) -> (u32, u32);

    fn create_offscreen_surface(&mut self, width: u32, height: u32)
    -> Result<TextureId, BackendError>;

    fn set_draw_target(&mut self, target: DrawTarget) -> Result<(), BackendError>;

    fn draw_target(&self) -> DrawTarget;

    /// Fill the whole target with `color` (typically `Color::TRANSPARENT`
    /// for offscreen surfaces). Does not change the current draw target.
    fn clear(&mut self, target: DrawTarget, color: Color) -> Result<(), BackendError>;

    /// Copy `src` of `source` into `dst` of the current draw target, scaling
    /// as needed and modulating color channels by `tint`.
    fn copy_textured_region(
        &mut self,
        source: TextureId,
        src: Option<Rect>,
        dst: Option<Rect>,
        tint: Color,
    ) -> Result<(), BackendError>;

    /// Release a texture. Unknown handles are ignored.
    fn destroy_surface(&mut self, surface: TextureId);

    fn present(&mut self) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_edges() {
        let r = Rect::new(10, 20, 30, 40);
        assert_eq!(r.right(), 40);
        assert_eq!(r.bottom(), 60);
        assert!(!r.is_empty());
        assert!(Rect::new(0, 0, 0, 5).is_empty());
    }

    #[test]
    fn default_target_is_screen() {
        assert_eq!(DrawTarget::default(), DrawTarget::Screen);
    }
}
