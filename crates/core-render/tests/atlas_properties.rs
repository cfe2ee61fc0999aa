//! Atlas index properties: the hash index answers exactly like the linear
//! scan, and every mapped glyph lands inside the atlas image.

use core_render::{GlyphAtlas, TextureId, lookup, rect_for_index};
use core_text::CodePoint;
use proptest::prelude::*;

/// Alphabets drawn from a small pool so duplicates show up often.
fn alphabet() -> impl Strategy<Value = Vec<CodePoint>> {
    prop::collection::vec(prop::sample::select(vec!['a', 'b', 'c', 'é', '€', ' ', '?']), 0..16)
        .prop_map(|chars| chars.into_iter().map(CodePoint::from_char).collect())
}

fn atlas(alphabet: Vec<CodePoint>) -> GlyphAtlas {
    // 4 x 4 cells of 8 px: room for the largest generated alphabet.
    GlyphAtlas::from_code_points(TextureId(1), alphabet, 32, 32, 8, 8).unwrap()
}

proptest! {
    #[test]
    fn hash_index_matches_linear_scan(
        cps in alphabet(),
        query in prop::sample::select(vec!['a', 'c', 'é', 'z', '€', ' ']),
    ) {
        let query = CodePoint::from_char(query);
        let expected = lookup(query, &cps);
        let atlas = atlas(cps);
        prop_assert_eq!(atlas.glyph_index(query), expected);
        prop_assert_eq!(atlas.contains(query), expected.is_some());
    }

    #[test]
    fn mapped_glyphs_stay_inside_image(cps in alphabet()) {
        let atlas = atlas(cps.clone());
        for cp in &cps {
            let rect = atlas.source_rect(*cp).unwrap();
            prop_assert!(rect.x >= 0 && rect.y >= 0);
            prop_assert!(rect.right() <= 32 && rect.bottom() <= 32);
            let index = atlas.glyph_index(*cp).unwrap();
            prop_assert_eq!(atlas.glyph_rect(index).unwrap(), rect_for_index(index, 32, 32, 8, 8));
        }
    }
}
