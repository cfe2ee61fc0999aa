//! Composited text cache (`RenderTarget`).
//!
//! A render target pairs one offscreen surface with a `finished` flag:
//! - `finished == false`: draw calls may composite onto the surface.
//! - `finished == true`: the surface is immutable; draw calls only blit it to
//!   the screen. Only an explicit `reopen` / `invalidate` flips it back.
//!
//! Surface lifecycle:
//! - Created lazily on the first draw, sized to the backend output and cleared
//!   to transparent.
//! - Replaced (old surface destroyed first) when the output size changes.
//!   `ensure_surface` reports the replacement so incremental callers can
//!   recomposite what the old surface held. A finished target whose surface
//!   no longer matches the output is not servable; the next draw rebuilds it.
//! - Released exactly once through `release`. Dropping a target that still
//!   owns a surface leaks it on the backend side and logs a warning.

use crate::backend::{BackendError, Color, DrawTarget, Rect, RenderBackend, TextureId};
use tracing::{debug, warn};

/// What `ensure_surface` had to do to produce a usable surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceStatus {
    /// Existing surface kept with its content.
    Kept(TextureId),
    /// First surface for this target; blank.
    Created(TextureId),
    /// Output size changed: the old surface was destroyed and this blank one
    /// took its place.
    Replaced(TextureId),
}

impl SurfaceStatus {
    #[inline]
    pub fn id(self) -> TextureId {
        match self {
            SurfaceStatus::Kept(id)
            | SurfaceStatus::Created(id)
            | SurfaceStatus::Replaced(id) => id,
        }
    }
}

#[derive(Debug, Default)]
pub struct RenderTarget {
    surface: Option<TextureId>,
    size: (u32, u32),
    finished: bool,
    /// Surface content is obsolete; clear before the next composite.
    stale: bool,
}

impl RenderTarget {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[inline]
    pub fn surface(&self) -> Option<TextureId> {
        self.surface
    }

    /// Finished and still sized to the backend output, so a draw call may
    /// blit the surface without compositing.
    pub fn is_servable<B: RenderBackend + ?Sized>(&self, backend: &B) -> bool {
        self.finished && self.surface.is_some() && self.size == backend.output_size()
    }

    /// Mark the cached surface complete; further draws become blits.
    pub fn mark_finished(&mut self) {
        self.finished = true;
    }

    /// Allow further compositing on top of the existing surface content.
    pub fn reopen(&mut self) {
        self.finished = false;
    }

    /// Force a full redraw: reopen and wipe the surface before the next
    /// composite. Use when the text itself changed.
    pub fn invalidate(&mut self) {
        self.finished = false;
        self.stale = true;
        debug!(target: "render.cache", surface = ?self.surface, "cache_invalidated");
    }

    /// Make sure a surface matching the current output exists and is clean.
    pub fn ensure_surface<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<SurfaceStatus, BackendError> {
        let output = backend.output_size();
        let mut replaced = false;
        if let Some(id) = self.surface {
            if self.size == output {
                if self.stale {
                    backend.clear(DrawTarget::Surface(id), Color::TRANSPARENT)?;
                    self.stale = false;
                }
                return Ok(SurfaceStatus::Kept(id));
            }
            debug!(
                target: "render.cache",
                old_w = self.size.0,
                old_h = self.size.1,
                new_w = output.0,
                new_h = output.1,
                "cache_surface_resized"
            );
            backend.destroy_surface(id);
            self.surface = None;
            self.finished = false;
            replaced = true;
        }
        let id = backend.create_offscreen_surface(output.0, output.1)?;
        backend.clear(DrawTarget::Surface(id), Color::TRANSPARENT)?;
        self.surface = Some(id);
        self.size = output;
        self.stale = false;
        debug!(
            target: "render.cache",
            surface = %id,
            w = output.0,
            h = output.1,
            "cache_surface_created"
        );
        Ok(if replaced {
            SurfaceStatus::Replaced(id)
        } else {
            SurfaceStatus::Created(id)
        })
    }

    /// Route subsequent copies onto the cached surface.
    pub(crate) fn bind<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<(), BackendError> {
        let id = self.ensure_surface(backend)?.id();
        if backend.draw_target() != DrawTarget::Surface(id) {
            backend.set_draw_target(DrawTarget::Surface(id))?;
        }
        Ok(())
    }

    /// Blit the whole cached surface to the screen. No-op without a surface.
    pub fn present<B: RenderBackend + ?Sized>(&self, backend: &mut B) -> Result<(), BackendError> {
        self.present_region(backend, None)
    }

    /// Blit `region` of the cached surface to the same region of the screen.
    pub fn present_region<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        region: Option<Rect>,
    ) -> Result<(), BackendError> {
        let Some(id) = self.surface else {
            return Ok(());
        };
        if backend.draw_target() != DrawTarget::Screen {
            backend.set_draw_target(DrawTarget::Screen)?;
        }
        backend.copy_textured_region(id, region, region, Color::WHITE)
    }

    /// Destroy the owned surface. Safe to call more than once.
    pub fn release<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        if let Some(id) = self.surface.take() {
            backend.destroy_surface(id);
            debug!(target: "render.cache", surface = %id, "cache_surface_released");
        }
        self.finished = false;
        self.stale = false;
    }
}

impl Drop for RenderTarget {
    fn drop(&mut self) {
        if let Some(id) = self.surface {
            warn!(target: "render.cache", surface = %id, "render_target_dropped_without_release");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{Command, RecordingBackend};

    #[test]
    fn surface_created_once_and_cleared() {
        let mut backend = RecordingBackend::new(32, 16);
        let mut target = RenderTarget::new();
        let created = target.ensure_surface(&mut backend).unwrap();
        let a = created.id();
        assert_eq!(created, SurfaceStatus::Created(a));
        assert_eq!(target.ensure_surface(&mut backend).unwrap(), SurfaceStatus::Kept(a));
        let cmds = backend.commands();
        assert_eq!(cmds.len(), 2);
        assert_eq!(
            cmds[0],
            Command::CreateSurface {
                id: a,
                width: 32,
                height: 16
            }
        );
        assert_eq!(
            cmds[1],
            Command::Clear {
                target: DrawTarget::Surface(a),
                color: Color::TRANSPARENT
            }
        );
        target.release(&mut backend);
    }

    #[test]
    fn resize_replaces_surface() {
        let mut backend = RecordingBackend::new(32, 16);
        let mut target = RenderTarget::new();
        let first = target.ensure_surface(&mut backend).unwrap().id();
        target.mark_finished();
        assert!(target.is_servable(&backend));
        backend.resize(64, 16);
        assert!(!target.is_servable(&backend), "stale size must not be served");
        let SurfaceStatus::Replaced(second) = target.ensure_surface(&mut backend).unwrap() else {
            panic!("resize must replace the surface");
        };
        assert_ne!(first, second);
        assert!(!backend.is_live(first));
        assert!(!target.is_finished(), "replaced surface must be redrawn");
        target.release(&mut backend);
        assert_eq!(backend.live_count(), 0);
    }

    #[test]
    fn invalidate_clears_before_next_composite() {
        let mut backend = RecordingBackend::new(8, 8);
        let mut target = RenderTarget::new();
        let id = target.ensure_surface(&mut backend).unwrap().id();
        target.mark_finished();
        target.invalidate();
        assert!(!target.is_finished());
        backend.take_commands();
        target.ensure_surface(&mut backend).unwrap();
        assert_eq!(
            backend.commands(),
            &[Command::Clear {
                target: DrawTarget::Surface(id),
                color: Color::TRANSPARENT
            }]
        );
        target.release(&mut backend);
    }

    #[test]
    fn release_is_idempotent() {
        let mut backend = RecordingBackend::new(8, 8);
        let mut target = RenderTarget::new();
        target.ensure_surface(&mut backend).unwrap();
        target.release(&mut backend);
        target.release(&mut backend);
        assert_eq!(backend.live_count(), 0);
        assert!(target.surface().is_none());
    }

    #[test]
    fn present_without_surface_is_noop() {
        let mut backend = RecordingBackend::new(8, 8);
        let target = RenderTarget::new();
        target.present(&mut backend).unwrap();
        assert!(backend.commands().is_empty());
    }
}
