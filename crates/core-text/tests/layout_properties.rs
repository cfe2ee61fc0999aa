//! Property-based tests for wrap and offset mapping.

use core_text::{WrapParams, all_lines, line_for_offset, reveal_sequence, wrap_by_width};
use proptest::prelude::*;

/// Words of 1..=6 lowercase letters joined by runs of spaces / tabs.
fn segment() -> impl Strategy<Value = String> {
    prop::collection::vec(("[a-z]{1,6}", "[ \t]{1,3}"), 0..24).prop_map(|parts| {
        parts
            .into_iter()
            .map(|(w, sep)| format!("{w}{sep}"))
            .collect::<String>()
    })
}

proptest! {
    // Every token fits on its own (6 cells max), so no line may overflow.
    #[test]
    fn wrapped_lines_never_exceed_max_width(
        text in segment(),
        size in 4i32..40,
        h_offset in 0i32..80,
        extra in 0i32..200,
    ) {
        let advance = size - size * h_offset / 100;
        let max_width = 6 * advance + extra;
        let params = WrapParams::new(size, h_offset, max_width);
        for line in wrap_by_width(&text, params) {
            let len = line.chars().count() as i32;
            prop_assert!(len * advance <= max_width, "line {:?} overflows", line);
        }
    }

    // Wrapping only breaks between tokens: re-splitting yields the same words.
    #[test]
    fn wrap_splits_only_on_whitespace(text in segment(), max_width in 0i32..300) {
        let params = WrapParams::new(10, 0, max_width);
        let lines = wrap_by_width(&text, params);
        let rejoined: Vec<&str> = lines.iter().flat_map(|l| l.split(' ')).collect();
        let original: Vec<&str> = text.split_whitespace().collect();
        prop_assert_eq!(rejoined, original);
    }

    #[test]
    fn offset_mapping_is_monotonic(text in segment(), max_width in 20i32..300) {
        let lines = all_lines(&text, WrapParams::new(10, 0, max_width));
        let total = reveal_sequence(&lines).len();
        let mut prev = 0usize;
        for i in 0..total {
            let line = line_for_offset(&lines, i);
            prop_assert!(line.is_some());
            let line = line.unwrap();
            prop_assert!(line >= prev);
            prev = line;
        }
        let past_end = total + if lines.is_empty() { 0 } else { 1 };
        prop_assert_eq!(line_for_offset(&lines, past_end), None);
    }
}
