//! Fixed-grid glyph atlas.
//!
//! The atlas image is split into equal cells, numbered row-major. The
//! alphabet string lists the characters in cell order: the Nth decoded code
//! point lives in cell N.
//!
//! `lookup` is the reference linear scan over an alphabet. `GlyphAtlas` also
//! keeps a hash index built once at construction; it stores the first position
//! of each code point, so both paths answer identically even when the
//! alphabet repeats a character.

use crate::backend::{Rect, RenderBackend, TextureId};
use ahash::AHashMap;
use core_text::{CodePoint, decode_str};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AtlasError {
    #[error("atlas {width}x{height} is not divisible into {cell_width}x{cell_height} cells")]
    UnalignedCells {
        width: u32,
        height: u32,
        cell_width: u32,
        cell_height: u32,
    },
    #[error("alphabet has {len} glyphs but the atlas only has {capacity} cells")]
    AlphabetOverflow { len: usize, capacity: usize },
    #[error("glyph index {index} out of range (atlas holds {capacity} cells)")]
    IndexOutOfRange { index: usize, capacity: usize },
}

/// First position of `code_point` in `alphabet`, by linear scan.
pub fn lookup(code_point: CodePoint, alphabet: &[CodePoint]) -> Option<usize> {
    alphabet.iter().position(|c| *c == code_point)
}

/// Source rectangle of cell `index` in a row-major grid.
///
/// Precondition: `index` is below the total cell count. Nothing is checked
/// against `atlas_height`; an index past the last row yields a rectangle
/// outside the image. Use [`GlyphAtlas::glyph_rect`] for the checked form.
pub fn rect_for_index(
    index: usize,
    atlas_width: u32,
    atlas_height: u32,
    cell_width: u32,
    cell_height: u32,
) -> Rect {
    debug_assert!(cell_width > 0 && cell_height > 0, "zero-sized atlas cell");
    debug_assert!(
        atlas_height == 0 || cell_height <= atlas_height,
        "cell taller than atlas"
    );
    let cells_per_row = (atlas_width / cell_width).max(1) as usize;
    let row = index / cells_per_row;
    let col = index % cells_per_row;
    Rect::new(
        (col * cell_width as usize) as i32,
        (row * cell_height as usize) as i32,
        cell_width as i32,
        cell_height as i32,
    )
}

#[derive(Debug)]
pub struct GlyphAtlas {
    texture: TextureId,
    alphabet: Vec<CodePoint>,
    index: AHashMap<CodePoint, usize>,
    width: u32,
    height: u32,
    cell_width: u32,
    cell_height: u32,
}

impl GlyphAtlas {
    /// Build an atlas over an already loaded `texture` of `width` x `height`
    /// pixels. `alphabet` is decoded with the same decoder as rendered text.
    pub fn new(
        texture: TextureId,
        alphabet: &str,
        width: u32,
        height: u32,
        cell_width: u32,
        cell_height: u32,
    ) -> Result<Self, AtlasError> {
        Self::from_code_points(
            texture,
            decode_str(alphabet),
            width,
            height,
            cell_width,
            cell_height,
        )
    }

    pub fn from_code_points(
        texture: TextureId,
        alphabet: Vec<CodePoint>,
        width: u32,
        height: u32,
        cell_width: u32,
        cell_height: u32,
    ) -> Result<Self, AtlasError> {
        if cell_width == 0
            || cell_height == 0
            || width % cell_width != 0
            || height % cell_height != 0
        {
            return Err(AtlasError::UnalignedCells {
                width,
                height,
                cell_width,
                cell_height,
            });
        }
        let capacity = ((width / cell_width) * (height / cell_height)) as usize;
        if alphabet.len() > capacity {
            return Err(AtlasError::AlphabetOverflow {
                len: alphabet.len(),
                capacity,
            });
        }
        let mut index = AHashMap::with_capacity(alphabet.len());
        for (i, cp) in alphabet.iter().enumerate() {
            index.entry(*cp).or_insert(i);
        }
        debug!(
            target: "render.atlas",
            %texture,
            glyphs = alphabet.len(),
            capacity,
            cell_width,
            cell_height,
            "atlas_ready"
        );
        Ok(Self {
            texture,
            alphabet,
            index,
            width,
            height,
            cell_width,
            cell_height,
        })
    }

    #[inline]
    pub fn texture(&self) -> TextureId {
        self.texture
    }

    pub fn alphabet(&self) -> &[CodePoint] {
        &self.alphabet
    }

    /// Number of glyphs in the alphabet.
    pub fn len(&self) -> usize {
        self.alphabet.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alphabet.is_empty()
    }

    /// Number of cells in the image grid.
    pub fn capacity(&self) -> usize {
        ((self.width / self.cell_width) * (self.height / self.cell_height)) as usize
    }

    pub fn cell_size(&self) -> (u32, u32) {
        (self.cell_width, self.cell_height)
    }

    pub fn image_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Cell index of `code_point`, or `None` when the atlas has no glyph.
    #[inline]
    pub fn glyph_index(&self, code_point: CodePoint) -> Option<usize> {
        self.index.get(&code_point).copied()
    }

    #[inline]
    pub fn contains(&self, code_point: CodePoint) -> bool {
        self.index.contains_key(&code_point)
    }

    /// Checked source rectangle for a cell index.
    pub fn glyph_rect(&self, index: usize) -> Result<Rect, AtlasError> {
        let capacity = self.capacity();
        if index >= capacity {
            return Err(AtlasError::IndexOutOfRange { index, capacity });
        }
        Ok(rect_for_index(
            index,
            self.width,
            self.height,
            self.cell_width,
            self.cell_height,
        ))
    }

    /// Source rectangle for a code point, if the atlas has it.
    pub fn source_rect(&self, code_point: CodePoint) -> Option<Rect> {
        self.glyph_index(code_point)
            .and_then(|i| self.glyph_rect(i).ok())
    }

    /// Hand the backing image back to the backend. Consumes the atlas.
    pub fn release<B: RenderBackend + ?Sized>(self, backend: &mut B) {
        debug!(target: "render.atlas", texture = %self.texture, "atlas_released");
        backend.destroy_surface(self.texture);
    }
}
