//! Text primitives for atlas rendering: UTF-8 decoding into packed code
//! points and fixed-advance line layout.
//!
//! Both modules are pure functions over borrowed input; nothing here touches a
//! rendering backend.

pub mod decode;
pub mod layout;

pub use decode::{CodePoint, DecodeError, decode, decode_str, try_decode};
pub use layout::{
    LineText, WrapParams, all_lines, effective_advance, layout_code_points, line_advance,
    line_for_offset, reveal_sequence, split_by_newline, split_code_points, strip_newlines,
    wrap_by_width, wrap_code_points,
};
