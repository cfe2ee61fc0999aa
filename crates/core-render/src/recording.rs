//! Command-recording backend.
//!
//! Implements `RenderBackend` by appending every primitive to an ordered
//! command log instead of touching pixels. Tests use it to assert exactly which
//! primitives the renderer issued (e.g. that a finished cache only blits).
//!
//! Invariants:
//! * Commands preserve call order.
//! * Texture handles are never reused within one backend instance.
//! * Copies from a destroyed or unknown texture fail with `UnknownTexture`.

use crate::backend::{BackendError, Color, DrawTarget, Rect, RenderBackend, TextureId};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateSurface {
        id: TextureId,
        width: u32,
        height: u32,
    },
    SetDrawTarget(DrawTarget),
    Clear {
        target: DrawTarget,
        color: Color,
    },
    Copy {
        target: DrawTarget,
        source: TextureId,
        src: Option<Rect>,
        dst: Option<Rect>,
        tint: Color,
    },
    DestroySurface(TextureId),
    Present,
}

impl Command {
    /// True for commands that change pixels of an offscreen surface.
    pub fn mutates_surface(&self) -> bool {
        matches!(
            self,
            Command::Clear {
                target: DrawTarget::Surface(_),
                ..
            } | Command::Copy {
                target: DrawTarget::Surface(_),
                ..
            }
        )
    }
}

#[derive(Debug)]
pub struct RecordingBackend {
    width: u32,
    height: u32,
    next_id: u32,
    /// Live textures and their sizes.
    live: BTreeMap<TextureId, (u32, u32)>,
    target: DrawTarget,
    cmds: Vec<Command>,
}

impl RecordingBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            next_id: 1,
            live: BTreeMap::new(),
            target: DrawTarget::Screen,
            cmds: Vec::new(),
        }
    }

    /// Register an externally loaded image (e.g. an atlas) without logging a
    /// command; returns its handle.
    pub fn register_image(&mut self, width: u32, height: u32) -> TextureId {
        let id = self.alloc();
        self.live.insert(id, (width, height));
        id
    }

    /// Change the reported output size (simulates a window resize).
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn commands(&self) -> &[Command] {
        &self.cmds
    }

    /// Drain the log, keeping backend state.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.cmds)
    }

    pub fn is_live(&self, id: TextureId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Copies whose source is `source`, in order.
    pub fn copies_from(&self, source: TextureId) -> impl Iterator<Item = &Command> {
        self.cmds
            .iter()
            .filter(move |c| matches!(c, Command::Copy { source: s, .. } if *s == source))
    }

    fn alloc(&mut self) -> TextureId {
        let id = TextureId(self.next_id);
        self.next_id += 1;
        id
    }

    fn check(&self, id: TextureId) -> Result<(), BackendError> {
        if self.live.contains_key(&id) {
            Ok(())
        } else {
            Err(BackendError::UnknownTexture(id))
        }
    }
}

impl RenderBackend for RecordingBackend {
    fn output_size(&self) -> (u32, u32) {
        (self.width, self.height)
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
        self.live.insert(id, (width, height));
        self.cmds.push(Command::CreateSurface { id, width, height });
        Ok(id)
    }

    fn set_draw_target(&mut self, target: DrawTarget) -> Result<(), BackendError> {
        if let DrawTarget::Surface(id) = target {
            self.check(id)?;
        }
        self.target = target;
        self.cmds.push(Command::SetDrawTarget(target));
        Ok(())
    }

    fn draw_target(&self) -> DrawTarget {
        self.target
    }

    fn clear(&mut self, target: DrawTarget, color: Color) -> Result<(), BackendError> {
        if let DrawTarget::Surface(id) = target {
            self.check(id)?;
        }
        self.cmds.push(Command::Clear { target, color });
        Ok(())
    }

    fn copy_textured_region(
        &mut self,
        source: TextureId,
        src: Option<Rect>,
        dst: Option<Rect>,
        tint: Color,
    ) -> Result<(), BackendError> {
        self.check(source)?;
        self.cmds.push(Command::Copy {
            target: self.target,
            source,
            src,
            dst,
            tint,
        });
        Ok(())
    }

    fn destroy_surface(&mut self, surface: TextureId) {
        if self.live.remove(&surface).is_some() {
            if self.target == DrawTarget::Surface(surface) {
                self.target = DrawTarget::Screen;
            }
            self.cmds.push(Command::DestroySurface(surface));
        }
    }

    fn present(&mut self) -> Result<(), BackendError> {
        self.cmds.push(Command::Present);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_call_order() {
        let mut b = RecordingBackend::new(64, 32);
        let img = b.register_image(16, 16);
        let s = b.create_offscreen_surface(64, 32).unwrap();
        b.set_draw_target(DrawTarget::Surface(s)).unwrap();
        b.copy_textured_region(img, None, Some(Rect::new(0, 0, 8, 8)), Color::WHITE)
            .unwrap();
        b.present().unwrap();
        let cmds = b.commands();
        assert!(matches!(cmds[0], Command::CreateSurface { .. }));
        assert_eq!(cmds[1], Command::SetDrawTarget(DrawTarget::Surface(s)));
        assert!(cmds[2].mutates_surface());
        assert_eq!(cmds[3], Command::Present);
    }

    #[test]
    fn destroyed_texture_rejects_copies() {
        let mut b = RecordingBackend::new(8, 8);
        let s = b.create_offscreen_surface(8, 8).unwrap();
        b.destroy_surface(s);
        assert!(!b.is_live(s));
        assert_eq!(
            b.copy_textured_region(s, None, None, Color::WHITE),
            Err(BackendError::UnknownTexture(s))
        );
        // Second destroy is a no-op and not logged.
        b.destroy_surface(s);
        let destroys = b
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::DestroySurface(_)))
            .count();
        assert_eq!(destroys, 1);
    }

    #[test]
    fn zero_sized_surface_is_rejected() {
        let mut b = RecordingBackend::new(8, 8);
        assert_eq!(
            b.create_offscreen_surface(0, 4),
            Err(BackendError::InvalidSize {
                width: 0,
                height: 4
            })
        );
    }
}
