//! One text scene rendered into the software canvas each frame.

use core_render::{
    CanvasBackend, Color, DrawTarget, Rect, RenderBackend, RenderError, RenderMetricsSnapshot,
    RenderTarget, TextRenderer, TickOutcome, TypewriterState,
};
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;

/// Inner margin between the frame edge and the text rectangle.
const MARGIN: i32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneMode {
    /// Whole text composited once, then blitted every frame.
    Static,
    /// Revealed one character per elapsed interval.
    Typewriter,
}

pub struct Scene<'a> {
    renderer: TextRenderer<'a>,
    /// Raw input bytes; decoded leniently by the renderer.
    text: Vec<u8>,
    rect: Rect,
    mode: SceneMode,
    target: RenderTarget,
    state: TypewriterState,
    revealed: Rc<Cell<bool>>,
    frames: u64,
}

impl<'a> Scene<'a> {
    pub fn new(
        renderer: TextRenderer<'a>,
        text: Vec<u8>,
        frame: (u32, u32),
        mode: SceneMode,
        duration: f32,
    ) -> Self {
        let rect = text_rect(frame);
        let revealed = Rc::new(Cell::new(false));
        let flag = revealed.clone();
        let state = TypewriterState::new(duration).on_complete(move || flag.set(true));
        Self {
            renderer,
            text,
            rect,
            mode,
            target: RenderTarget::new(),
            state,
            revealed,
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// True once the whole text is on screen.
    pub fn is_complete(&self) -> bool {
        match self.mode {
            SceneMode::Static => self.target.is_finished(),
            SceneMode::Typewriter => self.revealed.get(),
        }
    }

    pub fn metrics(&self) -> RenderMetricsSnapshot {
        self.renderer.metrics().snapshot()
    }

    /// Render one frame `dt` seconds after the previous one and present it.
    pub fn frame(&mut self, backend: &mut CanvasBackend, dt: f32) -> Result<(), RenderError> {
        backend.set_draw_target(DrawTarget::Screen)?;
        backend.clear(DrawTarget::Screen, Color::BLACK)?;
        match self.mode {
            SceneMode::Static => {
                self.renderer
                    .draw_multiline(backend, &self.text, self.rect, Some(&mut self.target))?;
            }
            SceneMode::Typewriter => {
                self.state.accumulate(dt);
                let outcome = self.renderer.draw_typewriter(
                    backend,
                    &self.text,
                    self.rect,
                    &mut self.target,
                    &mut self.state,
                )?;
                if let TickOutcome::Revealed { new_line: true, line, .. } = outcome {
                    debug!(target: "runtime.scene", line, "reveal_new_line");
                }
            }
        }
        backend.present()?;
        self.frames += 1;
        Ok(())
    }

    /// Free the cached surface. The scene must not draw afterwards.
    pub fn release(&mut self, backend: &mut CanvasBackend) {
        self.target.release(backend);
    }
}

fn text_rect(frame: (u32, u32)) -> Rect {
    let w = (frame.0 as i32 - 2 * MARGIN).max(1);
    let h = (frame.1 as i32 - 2 * MARGIN).max(1);
    Rect::new(MARGIN, MARGIN, w, h)
}
