//! Text render counters.
//!
//! Records what the renderer actually issued, so callers (and tests) can tell
//! a frame that recomposited glyphs from one that only blitted the cache.
//! Counters are monotonic for the lifetime of the owning `TextRenderer`.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RenderMetrics {
    /// Glyph copies from the atlas (onto a cache surface or the screen).
    pub glyphs_drawn: AtomicU64,
    /// Word-space cursor advances (no glyph copy).
    pub spaces_advanced: AtomicU64,
    /// Code points with no atlas glyph, skipped without advancing.
    pub glyphs_unmapped: AtomicU64,
    /// Cached surface blits to the screen.
    pub cache_blits: AtomicU64,
    /// Draw calls answered purely from a finished cache.
    pub cache_hits: AtomicU64,
    /// Typewriter ticks that revealed a character.
    pub reveals: AtomicU64,
    /// Typewriter ticks that skipped an unmapped character.
    pub reveal_skips: AtomicU64,
    /// Typewriter ticks that waited for the timer.
    pub reveal_waits: AtomicU64,
    /// Reveals that reached the final character.
    pub completions: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderMetricsSnapshot {
    pub glyphs_drawn: u64,
    pub spaces_advanced: u64,
    pub glyphs_unmapped: u64,
    pub cache_blits: u64,
    pub cache_hits: u64,
    pub reveals: u64,
    pub reveal_skips: u64,
    pub reveal_waits: u64,
    pub completions: u64,
}

impl RenderMetrics {
    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RenderMetricsSnapshot {
        RenderMetricsSnapshot {
            glyphs_drawn: self.glyphs_drawn.load(Ordering::Relaxed),
            spaces_advanced: self.spaces_advanced.load(Ordering::Relaxed),
            glyphs_unmapped: self.glyphs_unmapped.load(Ordering::Relaxed),
            cache_blits: self.cache_blits.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            reveals: self.reveals.load(Ordering::Relaxed),
            reveal_skips: self.reveal_skips.load(Ordering::Relaxed),
            reveal_waits: self.reveal_waits.load(Ordering::Relaxed),
            completions: self.completions.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_bumps() {
        let m = RenderMetrics::default();
        RenderMetrics::bump(&m.glyphs_drawn);
        RenderMetrics::bump(&m.glyphs_drawn);
        RenderMetrics::bump(&m.cache_hits);
        let s = m.snapshot();
        assert_eq!(s.glyphs_drawn, 2);
        assert_eq!(s.cache_hits, 1);
        assert_eq!(s.reveals, 0);
    }
}
