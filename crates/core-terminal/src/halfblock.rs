//! Half-block presentation of a canvas frame.
//!
//! Each terminal cell shows two vertically stacked pixels: the upper one as
//! the foreground of `▀`, the lower one as the background. The pixmap is
//! sampled nearest-neighbour into `cols x rows` cells; transparent pixels
//! composite over black.
//!
//! The presenter keeps the previous cell grid and only rewrites cells whose
//! colors changed. A change of grid size (terminal resize) repaints all.
//! Runs of adjacent changed cells on one row share a single `MoveTo`.

use anyhow::Result;
use core_render::{Color, Pixmap};
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{self, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
};
use std::io::Write;

const UPPER_HALF: char = '▀';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfBlockCell {
    pub top: Color,
    pub bottom: Color,
}

/// Sample `pixmap` into `rows` rows of `cols` cells, opaque colors only.
pub fn sample_cells(pixmap: &Pixmap, cols: u16, rows: u16) -> Vec<HalfBlockCell> {
    let (cols, rows) = (cols as i64, rows as i64);
    let (w, h) = (pixmap.width() as i64, pixmap.height() as i64);
    let mut out = Vec::with_capacity((cols * rows).max(0) as usize);
    let sub_rows = rows * 2;
    for r in 0..rows {
        let top_y = (2 * r) * h / sub_rows.max(1);
        let bottom_y = (2 * r + 1) * h / sub_rows.max(1);
        for c in 0..cols {
            let x = c * w / cols.max(1);
            out.push(HalfBlockCell {
                top: flatten(pixmap.get(x as i32, top_y as i32)),
                bottom: flatten(pixmap.get(x as i32, bottom_y as i32)),
            });
        }
    }
    out
}

/// Straight-alpha color over black.
fn flatten(px: Option<Color>) -> Color {
    let Some(px) = px else {
        return Color::BLACK;
    };
    let a = px.a as u16;
    let m = |c: u8| ((c as u16 * a + 127) / 255) as u8;
    Color::rgb(m(px.r), m(px.g), m(px.b))
}

/// Nearest entry of the xterm 6x6x6 color cube.
pub fn ansi256(c: Color) -> u8 {
    let q = |v: u8| ((v as u16 * 5 + 127) / 255) as u8;
    16 + 36 * q(c.r) + 6 * q(c.g) + q(c.b)
}

#[derive(Debug, Default)]
pub struct HalfBlockPresenter {
    truecolor: bool,
    grid: (u16, u16),
    last: Vec<HalfBlockCell>,
    /// Cells rewritten over the presenter lifetime.
    pub cells_written: u64,
    /// Frames that rewrote nothing.
    pub frames_unchanged: u64,
}

impl HalfBlockPresenter {
    pub fn new(caps: crate::TerminalCapabilities) -> Self {
        Self {
            truecolor: caps.truecolor,
            ..Self::default()
        }
    }

    fn term_color(&self, c: Color) -> style::Color {
        if self.truecolor {
            style::Color::Rgb {
                r: c.r,
                g: c.g,
                b: c.b,
            }
        } else {
            style::Color::AnsiValue(ansi256(c))
        }
    }

    /// Draw `pixmap` into a `cols x rows` cell area at the terminal origin.
    /// Returns the number of cells rewritten.
    pub fn present<W: Write>(
        &mut self,
        out: &mut W,
        pixmap: &Pixmap,
        cols: u16,
        rows: u16,
    ) -> Result<usize> {
        let cells = sample_cells(pixmap, cols, rows);
        let full = self.grid != (cols, rows) || self.last.len() != cells.len();
        let mut written = 0usize;
        let mut cursor: Option<(u16, u16)> = None;
        for (i, cell) in cells.iter().enumerate() {
            if !full && self.last[i] == *cell {
                continue;
            }
            let x = (i % cols as usize) as u16;
            let y = (i / cols as usize) as u16;
            if cursor != Some((x, y)) {
                queue!(out, MoveTo(x, y))?;
            }
            queue!(
                out,
                SetForegroundColor(self.term_color(cell.top)),
                SetBackgroundColor(self.term_color(cell.bottom)),
                Print(UPPER_HALF)
            )?;
            cursor = Some((x + 1, y));
            written += 1;
        }
        if written > 0 {
            queue!(out, ResetColor)?;
        } else {
            self.frames_unchanged += 1;
        }
        out.flush()?;
        self.cells_written += written as u64;
        self.grid = (cols, rows);
        self.last = cells;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TerminalCapabilities;
    use pretty_assertions::assert_eq;

    fn pixmap(w: u32, h: u32, f: impl Fn(u32, u32) -> Color) -> Pixmap {
        let mut px = Vec::new();
        for y in 0..h {
            for x in 0..w {
                px.push(f(x, y));
            }
        }
        Pixmap::from_pixels(w, h, px).unwrap()
    }

    fn blocks(bytes: &[u8]) -> usize {
        String::from_utf8_lossy(bytes).matches(UPPER_HALF).count()
    }

    #[test]
    fn sampling_stacks_two_pixel_rows_per_cell() {
        let red = Color::rgb(255, 0, 0);
        let p = pixmap(2, 2, |_, y| if y == 0 { red } else { Color::WHITE });
        let cells = sample_cells(&p, 2, 1);
        assert_eq!(
            cells,
            vec![
                HalfBlockCell {
                    top: red,
                    bottom: Color::WHITE
                };
                2
            ]
        );
    }

    #[test]
    fn transparent_flattens_to_black() {
        let p = pixmap(1, 2, |_, _| Color::TRANSPARENT);
        let cells = sample_cells(&p, 1, 1);
        assert_eq!(cells[0].top, Color::BLACK);
        assert_eq!(cells[0].bottom, Color::BLACK);
    }

    #[test]
    fn ansi_cube_corners() {
        assert_eq!(ansi256(Color::BLACK), 16);
        assert_eq!(ansi256(Color::WHITE), 231);
        assert_eq!(ansi256(Color::rgb(255, 0, 0)), 196);
    }

    #[test]
    fn unchanged_frame_writes_nothing() {
        let p = pixmap(4, 4, |x, _| if x < 2 { Color::WHITE } else { Color::BLACK });
        let mut presenter = HalfBlockPresenter::new(TerminalCapabilities::truecolor());
        let mut out = Vec::new();
        assert_eq!(presenter.present(&mut out, &p, 4, 2).unwrap(), 8);
        assert_eq!(blocks(&out), 8);

        let mut again = Vec::new();
        assert_eq!(presenter.present(&mut again, &p, 4, 2).unwrap(), 0);
        assert!(again.is_empty());
        assert_eq!(presenter.frames_unchanged, 1);
    }

    #[test]
    fn only_changed_cells_are_rewritten() {
        let before = pixmap(2, 2, |_, _| Color::BLACK);
        let after = pixmap(2, 2, |x, _| if x == 1 { Color::WHITE } else { Color::BLACK });
        let mut presenter = HalfBlockPresenter::new(TerminalCapabilities::ansi256());
        presenter.present(&mut Vec::new(), &before, 2, 1).unwrap();
        let mut out = Vec::new();
        assert_eq!(presenter.present(&mut out, &after, 2, 1).unwrap(), 1);
        assert_eq!(blocks(&out), 1);
        assert_eq!(presenter.cells_written, 3);
    }

    #[test]
    fn grid_change_repaints_everything() {
        let p = pixmap(2, 2, |_, _| Color::BLACK);
        let mut presenter = HalfBlockPresenter::new(TerminalCapabilities::truecolor());
        presenter.present(&mut Vec::new(), &p, 2, 1).unwrap();
        let mut out = Vec::new();
        assert_eq!(presenter.present(&mut out, &p, 1, 1).unwrap(), 1);
    }
}
