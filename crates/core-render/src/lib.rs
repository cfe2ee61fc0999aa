//! Bitmap-font text rendering over an abstract 2D backend.
//!
//! Glyphs are copied out of a fixed-grid atlas image, either straight onto the
//! screen or onto a cached offscreen surface (`RenderTarget`) that is blitted
//! every frame once complete. The typewriter reveals the same layout one
//! character per elapsed interval.
//!
//! Invariants:
//! - A finished `RenderTarget` is never composited onto; draw calls against it
//!   issue only blits until `reopen` / `invalidate`.
//! - Spaces advance the pen without a copy; code points absent from the atlas
//!   are skipped without advancing.
//! - Layout (wrapping, newline handling, line mapping) lives in `core-text`;
//!   this crate only positions and copies glyphs.
//!
//! Exposed Components:
//! - `backend`: `RenderBackend` trait plus geometry/color/handle types.
//! - `recording`: command-recording backend used by tests and headless runs.
//! - `canvas`: software RGBA backend producing real pixels.
//! - `atlas`: glyph lookup and source rectangles.
//! - `cache`: `RenderTarget` surface lifecycle.
//! - `text`: `TextRenderer` static paths (single line, lines, multiline).
//! - `typewriter`: `TypewriterState` and the per-tick reveal.
//! - `metrics`: counters for what the renderer issued.

pub mod atlas;
pub mod backend;
pub mod cache;
pub mod canvas;
pub mod error;
pub mod metrics;
pub mod recording;
pub mod text;
pub mod typewriter;

pub use atlas::{AtlasError, GlyphAtlas, lookup, rect_for_index};
pub use backend::{BackendError, Color, DrawTarget, Rect, RenderBackend, TextureId};
pub use cache::{RenderTarget, SurfaceStatus};
pub use canvas::{CanvasBackend, Pixmap};
pub use error::RenderError;
pub use metrics::{RenderMetrics, RenderMetricsSnapshot};
pub use recording::{Command, RecordingBackend};
pub use text::{TextRenderer, TextStyle};
pub use typewriter::{TickOutcome, TypewriterPhase, TypewriterState};
