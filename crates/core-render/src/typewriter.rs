//! Character-by-character reveal onto a cached surface.
//!
//! Design invariants:
//! - The reveal sequence is the laid-out lines joined by single spaces, so a
//!   character index maps to its line exactly (`line_for_offset`), whether a
//!   break came from wrapping or from a hard newline.
//! - At most one character is revealed per tick, and only once the
//!   accumulated timer has reached the per-character duration. The timer
//!   resets to zero on a reveal, never on a skip.
//! - Unmapped characters are skipped without waiting and without advancing
//!   the cursor. Spaces cost a tick and advance the cursor.
//! - The cursor returns to the rectangle's left edge whenever the revealed
//!   character sits on a different line than its predecessor.
//! - The completion callback runs exactly once, on the tick that moves the
//!   state into `Complete` (reveal, skip, or first tick of empty text).
//! - Every tick ends with the cached surface blitted to the screen, so
//!   callers present one consistent frame regardless of the outcome.
//! - Progress survives an output resize: when the cache surface is replaced,
//!   every character revealed so far is recomposited onto the new surface
//!   before the tick continues.

use crate::backend::{Rect, RenderBackend};
use crate::cache::{RenderTarget, SurfaceStatus};
use crate::error::RenderError;
use crate::metrics::RenderMetrics;
use crate::text::TextRenderer;
use core_text::{CodePoint, decode, layout_code_points, line_for_offset, reveal_sequence};
use std::fmt;
use tracing::{debug, info, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypewriterPhase {
    /// No text decoded yet.
    Idle,
    Revealing,
    /// Every character revealed or skipped.
    Complete,
}

/// What one `draw_typewriter` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer below the per-character duration; cache re-presented.
    Waiting,
    /// Character `index` drawn on `line`. `new_line` is set when the cursor
    /// was reset for it.
    Revealed {
        index: usize,
        line: usize,
        new_line: bool,
    },
    /// Character `index` has no glyph and was passed over.
    Skipped { index: usize },
    /// Nothing left to reveal; cache re-presented.
    Done,
}

/// Progress of one reveal. Owned by the caller and passed to every tick.
pub struct TypewriterState {
    counter: usize,
    cursor_x: i32,
    timer: f32,
    duration: f32,
    sequence: Option<Vec<CodePoint>>,
    lines: Vec<Vec<CodePoint>>,
    completed: bool,
    on_complete: Option<Box<dyn FnMut()>>,
}

impl fmt::Debug for TypewriterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypewriterState")
            .field("counter", &self.counter)
            .field("cursor_x", &self.cursor_x)
            .field("timer", &self.timer)
            .field("duration", &self.duration)
            .field("total", &self.total())
            .field("lines", &self.lines.len())
            .field("completed", &self.completed)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

impl TypewriterState {
    /// `duration` is the minimum time in seconds between two reveals.
    /// Zero (or negative) reveals one character per tick.
    pub fn new(duration: f32) -> Self {
        Self {
            counter: 0,
            cursor_x: 0,
            timer: 0.0,
            duration,
            sequence: None,
            lines: Vec::new(),
            completed: false,
            on_complete: None,
        }
    }

    /// Install a callback run once when the reveal completes.
    pub fn on_complete(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Add elapsed frame time in seconds.
    pub fn accumulate(&mut self, dt: f32) {
        self.timer += dt;
    }

    pub fn phase(&self) -> TypewriterPhase {
        match &self.sequence {
            None => TypewriterPhase::Idle,
            Some(seq) if self.counter >= seq.len() => TypewriterPhase::Complete,
            Some(_) => TypewriterPhase::Revealing,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase() == TypewriterPhase::Complete
    }

    /// Characters revealed or skipped so far.
    pub fn revealed(&self) -> usize {
        self.counter
    }

    /// Length of the reveal sequence, once decoded.
    pub fn total(&self) -> Option<usize> {
        self.sequence.as_ref().map(Vec::len)
    }

    pub fn cursor_x(&self) -> i32 {
        self.cursor_x
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Laid-out lines of the current text (empty while idle).
    pub fn lines(&self) -> &[Vec<CodePoint>] {
        &self.lines
    }

    /// Forget the current text so the next tick starts a fresh reveal. The
    /// duration and callback are kept. Pair with `RenderTarget::invalidate`.
    pub fn reset(&mut self) {
        self.counter = 0;
        self.cursor_x = 0;
        self.timer = 0.0;
        self.sequence = None;
        self.lines.clear();
        self.completed = false;
    }

    /// Run the callback on the first call after the last character. Returns
    /// whether this call was that transition.
    fn finish(&mut self) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        if let Some(cb) = self.on_complete.as_mut() {
            cb();
        }
        true
    }
}

impl TextRenderer<'_> {
    /// Advance a reveal of `text` inside `rect` by at most one character.
    ///
    /// The text is decoded and laid out on the first tick after `state` was
    /// created or reset; later ticks ignore `text`. Call
    /// `state.accumulate(dt)` before each tick.
    pub fn draw_typewriter<B, T>(
        &self,
        backend: &mut B,
        text: &T,
        rect: Rect,
        target: &mut RenderTarget,
        state: &mut TypewriterState,
    ) -> Result<TickOutcome, RenderError>
    where
        B: RenderBackend + ?Sized,
        T: AsRef<[u8]> + ?Sized,
    {
        if state.sequence.is_none() {
            self.start(text.as_ref(), rect, state);
        }
        if let SurfaceStatus::Replaced(_) = target.ensure_surface(backend)? {
            self.redraw_revealed(backend, rect, target, state)?;
        }

        let index = state.counter;
        let next = state
            .sequence
            .as_deref()
            .and_then(|seq| seq.get(index).copied());
        let Some(cp) = next else {
            self.complete(state);
            self.blit(backend, target, None)?;
            return Ok(TickOutcome::Done);
        };
        if state.timer < state.duration {
            RenderMetrics::bump(&self.metrics.reveal_waits);
            self.blit(backend, target, None)?;
            return Ok(TickOutcome::Waiting);
        }

        let (line, new_line) = locate(&state.lines, index);
        if new_line {
            state.cursor_x = rect.x;
        }

        if !cp.is_space() && !self.atlas.contains(cp) {
            state.counter += 1;
            RenderMetrics::bump(&self.metrics.reveal_skips);
            trace!(target: "render.typewriter", index, code_point = %cp, "reveal_skipped");
            if state.is_complete() {
                self.complete(state);
            }
            self.blit(backend, target, None)?;
            return Ok(TickOutcome::Skipped { index });
        }

        let y = rect.y + line as i32 * self.style.line_height();
        target.reopen();
        self.draw_code_points(backend, &[cp], state.cursor_x, y, Some(&mut *target))?;
        state.cursor_x += self.style.advance();
        state.timer = 0.0;
        state.counter += 1;
        RenderMetrics::bump(&self.metrics.reveals);
        trace!(target: "render.typewriter", index, line, new_line, "reveal");
        if state.is_complete() {
            self.complete(state);
        }
        Ok(TickOutcome::Revealed {
            index,
            line,
            new_line,
        })
    }

    /// Drive `state` to completion in one call, ignoring the timer.
    pub fn reveal_all<B, T>(
        &self,
        backend: &mut B,
        text: &T,
        rect: Rect,
        target: &mut RenderTarget,
        state: &mut TypewriterState,
    ) -> Result<(), RenderError>
    where
        B: RenderBackend + ?Sized,
        T: AsRef<[u8]> + ?Sized,
    {
        loop {
            state.timer = state.timer.max(state.duration);
            if self.draw_typewriter(backend, text, rect, target, state)? == TickOutcome::Done {
                return Ok(());
            }
        }
    }

    fn start(&self, text: &[u8], rect: Rect, state: &mut TypewriterState) {
        let lines = layout_code_points(&decode(text), self.style.wrap(rect.w));
        let sequence = reveal_sequence(&lines);
        debug!(
            target: "render.typewriter",
            chars = sequence.len(),
            lines = lines.len(),
            duration = state.duration,
            "typewriter_start"
        );
        state.lines = lines;
        state.sequence = Some(sequence);
        state.cursor_x = rect.x;
    }

    /// Recomposite everything revealed so far onto a freshly replaced
    /// surface, following the same cursor rules as the ticks that drew it.
    fn redraw_revealed<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        rect: Rect,
        target: &mut RenderTarget,
        state: &mut TypewriterState,
    ) -> Result<(), RenderError> {
        let Some(seq) = state.sequence.as_deref() else {
            return Ok(());
        };
        let revealed = &seq[..state.counter.min(seq.len())];
        let mut cursor = rect.x;
        for (index, &cp) in revealed.iter().enumerate() {
            let (line, new_line) = locate(&state.lines, index);
            if new_line {
                cursor = rect.x;
            }
            if !cp.is_space() && !self.atlas.contains(cp) {
                continue;
            }
            let y = rect.y + line as i32 * self.style.line_height();
            cursor = self.compose(backend, &[cp], cursor, y, Some(&mut *target))?;
        }
        state.cursor_x = cursor;
        target.mark_finished();
        debug!(
            target: "render.typewriter",
            chars = state.counter,
            "typewriter_redrawn_after_resize"
        );
        Ok(())
    }

    fn complete(&self, state: &mut TypewriterState) {
        if state.finish() {
            RenderMetrics::bump(&self.metrics.completions);
            info!(
                target: "render.typewriter",
                chars = state.counter,
                lines = state.lines.len(),
                "typewriter_complete"
            );
        }
    }
}

/// Line of character `index` and whether it differs from its predecessor's.
fn locate(lines: &[Vec<CodePoint>], index: usize) -> (usize, bool) {
    let line = line_for_offset(lines, index).unwrap_or_else(|| lines.len().saturating_sub(1));
    let new_line = index > 0 && line_for_offset(lines, index - 1) != Some(line);
    (line, new_line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::GlyphAtlas;
    use crate::recording::RecordingBackend;
    use crate::text::TextStyle;
    use std::cell::Cell;
    use std::rc::Rc;

    fn setup() -> (RecordingBackend, GlyphAtlas) {
        let mut backend = RecordingBackend::new(200, 100);
        let tex = backend.register_image(64, 64);
        let atlas = GlyphAtlas::new(tex, "abcdefghijklmnop", 64, 64, 16, 16).unwrap();
        (backend, atlas)
    }

    #[test]
    fn fresh_state_is_idle() {
        let s = TypewriterState::new(0.1);
        assert_eq!(s.phase(), TypewriterPhase::Idle);
        assert_eq!(s.total(), None);
        assert_eq!(s.revealed(), 0);
    }

    #[test]
    fn empty_text_completes_on_first_tick() {
        let (mut backend, atlas) = setup();
        let r = TextRenderer::new(&atlas, TextStyle::default());
        let fired = Rc::new(Cell::new(0));
        let seen = fired.clone();
        let mut state = TypewriterState::new(0.1).on_complete(move || seen.set(seen.get() + 1));
        let mut target = RenderTarget::new();
        let rect = Rect::new(0, 0, 200, 100);
        let out = r.draw_typewriter(&mut backend, "", rect, &mut target, &mut state).unwrap();
        assert_eq!(out, TickOutcome::Done);
        assert_eq!(state.phase(), TypewriterPhase::Complete);
        assert_eq!(fired.get(), 1);
        r.draw_typewriter(&mut backend, "", rect, &mut target, &mut state).unwrap();
        assert_eq!(fired.get(), 1);
        target.release(&mut backend);
    }

    #[test]
    fn reset_keeps_duration_and_restarts() {
        let (mut backend, atlas) = setup();
        let r = TextRenderer::new(&atlas, TextStyle::default());
        let mut state = TypewriterState::new(0.0);
        let mut target = RenderTarget::new();
        let rect = Rect::new(0, 0, 200, 100);
        r.reveal_all(&mut backend, "ab", rect, &mut target, &mut state).unwrap();
        assert!(state.is_complete());
        state.reset();
        target.invalidate();
        assert_eq!(state.phase(), TypewriterPhase::Idle);
        assert_eq!(state.duration(), 0.0);
        r.draw_typewriter(&mut backend, "abc", rect, &mut target, &mut state).unwrap();
        assert_eq!(state.total(), Some(3));
        assert_eq!(state.revealed(), 1);
        target.release(&mut backend);
    }

    #[test]
    fn skip_does_not_reset_timer() {
        let (mut backend, atlas) = setup();
        let r = TextRenderer::new(&atlas, TextStyle::default());
        let mut state = TypewriterState::new(0.1);
        let mut target = RenderTarget::new();
        let rect = Rect::new(0, 0, 200, 100);
        state.accumulate(0.25);
        let out = r.draw_typewriter(&mut backend, "?a", rect, &mut target, &mut state).unwrap();
        assert_eq!(out, TickOutcome::Skipped { index: 0 });
        assert_eq!(state.timer(), 0.25);
        let out = r.draw_typewriter(&mut backend, "?a", rect, &mut target, &mut state).unwrap();
        assert!(matches!(out, TickOutcome::Revealed { index: 1, .. }));
        assert_eq!(state.timer(), 0.0);
        target.release(&mut backend);
    }
}
