//! Line layout for fixed-advance glyph grids.
//!
//! Two passes compose into the display line sequence:
//! 1. `split_code_points`: hard breaks. Newlines are separators and never
//!    survive into line text.
//! 2. `wrap_code_points`: greedy word wrap of one newline-free segment. Width
//!    is measured as `code points * effective_advance`, which assumes every
//!    glyph has the same advance.
//!
//! `layout_code_points` runs both over decoded text, so malformed input keeps
//! exactly the code points the lenient decoder produced. The `&str` helpers
//! (`split_by_newline`, `wrap_by_width`, `all_lines`) run the same passes and
//! re-encode each line.
//!
//! `line_for_offset` maps an absolute character index back to a line,
//! counting one separator slot per line break; the sequence produced by
//! `reveal_sequence` has exactly that shape.
//!
//! Pixel math is `i32`, matching how destination rectangles are expressed by
//! the renderer. Products are widened to `i64` and saturate back.

use crate::decode::{CodePoint, decode_str};

#[inline]
fn saturate(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Horizontal distance between successive glyph origins after applying the
/// overlap percentage (`h_offset`, 0..=100).
#[inline]
pub fn effective_advance(size: i32, h_offset: i32) -> i32 {
    let size = size as i64;
    saturate(size - size * h_offset as i64 / 100)
}

/// Vertical distance between successive line origins (`v_offset`, 0..=100).
#[inline]
pub fn line_advance(size: i32, v_offset: i32) -> i32 {
    saturate(size as i64 * v_offset as i64 / 100)
}

/// Inputs for width-constrained wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapParams {
    /// Nominal glyph draw size in pixels.
    pub size: i32,
    /// Overlap between adjacent glyph cells in percent.
    pub h_offset: i32,
    /// Maximum line width in pixels.
    pub max_width: i32,
}

impl WrapParams {
    pub fn new(size: i32, h_offset: i32, max_width: i32) -> Self {
        Self {
            size,
            h_offset,
            max_width,
        }
    }

    #[inline]
    pub fn advance(&self) -> i32 {
        effective_advance(self.size, self.h_offset)
    }
}

/// A laid-out line as the offset mapping and the reveal sequence see it.
pub trait LineText {
    /// Length in decoded code points.
    fn code_point_len(&self) -> usize;

    fn push_code_points(&self, out: &mut Vec<CodePoint>);

    fn to_code_points(&self) -> Vec<CodePoint> {
        let mut out = Vec::with_capacity(self.code_point_len());
        self.push_code_points(&mut out);
        out
    }
}

impl LineText for str {
    fn code_point_len(&self) -> usize {
        char_len(self)
    }

    fn push_code_points(&self, out: &mut Vec<CodePoint>) {
        out.extend(decode_str(self));
    }
}

impl LineText for String {
    fn code_point_len(&self) -> usize {
        self.as_str().code_point_len()
    }

    fn push_code_points(&self, out: &mut Vec<CodePoint>) {
        self.as_str().push_code_points(out);
    }
}

impl LineText for [CodePoint] {
    fn code_point_len(&self) -> usize {
        self.len()
    }

    fn push_code_points(&self, out: &mut Vec<CodePoint>) {
        out.extend_from_slice(self);
    }
}

impl LineText for Vec<CodePoint> {
    fn code_point_len(&self) -> usize {
        self.len()
    }

    fn push_code_points(&self, out: &mut Vec<CodePoint>) {
        out.extend_from_slice(self);
    }
}

impl<T: LineText + ?Sized> LineText for &T {
    fn code_point_len(&self) -> usize {
        (**self).code_point_len()
    }

    fn push_code_points(&self, out: &mut Vec<CodePoint>) {
        (**self).push_code_points(out);
    }
}

/// Character count used for layout: decoded code points, not bytes.
#[inline]
pub fn char_len(s: &str) -> usize {
    decode_str(s).len()
}

fn encode(line: &[CodePoint]) -> String {
    line.iter()
        .map(|cp| cp.to_char().unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Remove every newline character.
pub fn strip_newlines(text: &str) -> String {
    text.chars().filter(|c| *c != '\n').collect()
}

/// Split on `\n`. A trailing newline does not produce a final empty line and
/// empty input yields no lines; interior blank lines are kept.
pub fn split_by_newline(text: &str) -> Vec<String> {
    text.split_terminator('\n').map(str::to_owned).collect()
}

/// [`split_by_newline`] over decoded text.
pub fn split_code_points(text: &[CodePoint]) -> Vec<&[CodePoint]> {
    let mut out: Vec<&[CodePoint]> = text.split(|cp| *cp == CodePoint::NEWLINE).collect();
    if out.last().is_some_and(|line| line.is_empty()) {
        out.pop();
    }
    out
}

/// Greedy word wrap of a single newline-free segment.
///
/// A token joins the current line (separated by one space) only when
/// `(line_len + token_len + 1) * advance <= max_width`; otherwise it opens a
/// new line. The first token of a line is always placed, so a token wider
/// than `max_width` occupies a line of its own rather than being split.
/// Whitespace-only input yields no lines.
pub fn wrap_code_points(segment: &[CodePoint], params: WrapParams) -> Vec<Vec<CodePoint>> {
    let advance = params.advance() as i64;
    let max = params.max_width as i64;
    let mut out: Vec<Vec<CodePoint>> = Vec::new();

    for token in segment.split(|cp| cp.is_whitespace()).filter(|t| !t.is_empty()) {
        match out.last_mut() {
            Some(line) if (line.len() + token.len() + 1) as i64 * advance <= max => {
                line.push(CodePoint::SPACE);
                line.extend_from_slice(token);
            }
            _ => out.push(token.to_vec()),
        }
    }
    out
}

/// [`wrap_code_points`] for a string segment.
pub fn wrap_by_width(segment: &str, params: WrapParams) -> Vec<String> {
    wrap_code_points(&decode_str(segment), params)
        .iter()
        .map(|line| encode(line))
        .collect()
}

/// Full display line sequence of decoded text: newline split, then each
/// segment wrapped independently, concatenated in order.
pub fn layout_code_points(text: &[CodePoint], params: WrapParams) -> Vec<Vec<CodePoint>> {
    split_code_points(text)
        .into_iter()
        .flat_map(|segment| wrap_code_points(segment, params))
        .collect()
}

/// [`layout_code_points`] for a string.
pub fn all_lines(text: &str, params: WrapParams) -> Vec<String> {
    layout_code_points(&decode_str(text), params)
        .iter()
        .map(|line| encode(line))
        .collect()
}

/// Line containing the absolute character `index`, counting `len + 1` per
/// line (the `+1` is the separator consumed at each break). `None` once the
/// index runs past the last line.
pub fn line_for_offset<S: LineText>(lines: &[S], index: usize) -> Option<usize> {
    let mut total = 0usize;
    for (i, line) in lines.iter().enumerate() {
        total += line.code_point_len() + 1;
        if total > index {
            return Some(i);
        }
    }
    None
}

/// The code points a reveal walks through: lines joined by one space each,
/// so every break occupies exactly the separator slot `line_for_offset`
/// accounts for.
pub fn reveal_sequence<S: LineText>(lines: &[S]) -> Vec<CodePoint> {
    let mut joined = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            joined.push(CodePoint::SPACE);
        }
        line.push_code_points(&mut joined);
    }
    joined
}
