//! Atlas loading: a PNG from disk when configured, otherwise a generated
//! atlas drawn from a built-in 3x5 pixel font.

use anyhow::{Context, Result, bail};
use core_config::AtlasConfig;
use core_render::{CanvasBackend, Color, GlyphAtlas};
use core_text::decode_str;
use std::path::Path;
use tracing::{info, warn};

/// Cells per row in a generated atlas.
const GENERATED_COLUMNS: u32 = 16;

/// 3x5 glyph bitmaps, one row per entry, most significant of 3 bits on the left.
const FONT_3X5: &[(char, [u8; 5])] = &[
    ('A', [0b010, 0b101, 0b111, 0b101, 0b101]),
    ('B', [0b110, 0b101, 0b110, 0b101, 0b110]),
    ('C', [0b011, 0b100, 0b100, 0b100, 0b011]),
    ('D', [0b110, 0b101, 0b101, 0b101, 0b110]),
    ('E', [0b111, 0b100, 0b110, 0b100, 0b111]),
    ('F', [0b111, 0b100, 0b110, 0b100, 0b100]),
    ('G', [0b011, 0b100, 0b101, 0b101, 0b011]),
    ('H', [0b101, 0b101, 0b111, 0b101, 0b101]),
    ('I', [0b111, 0b010, 0b010, 0b010, 0b111]),
    ('J', [0b001, 0b001, 0b001, 0b101, 0b010]),
    ('K', [0b101, 0b101, 0b110, 0b101, 0b101]),
    ('L', [0b100, 0b100, 0b100, 0b100, 0b111]),
    ('M', [0b101, 0b111, 0b111, 0b101, 0b101]),
    ('N', [0b110, 0b101, 0b101, 0b101, 0b101]),
    ('O', [0b010, 0b101, 0b101, 0b101, 0b010]),
    ('P', [0b110, 0b101, 0b110, 0b100, 0b100]),
    ('Q', [0b010, 0b101, 0b101, 0b110, 0b011]),
    ('R', [0b110, 0b101, 0b110, 0b101, 0b101]),
    ('S', [0b011, 0b100, 0b010, 0b001, 0b110]),
    ('T', [0b111, 0b010, 0b010, 0b010, 0b010]),
    ('U', [0b101, 0b101, 0b101, 0b101, 0b111]),
    ('V', [0b101, 0b101, 0b101, 0b101, 0b010]),
    ('W', [0b101, 0b101, 0b111, 0b111, 0b101]),
    ('X', [0b101, 0b101, 0b010, 0b101, 0b101]),
    ('Y', [0b101, 0b101, 0b010, 0b010, 0b010]),
    ('Z', [0b111, 0b001, 0b010, 0b100, 0b111]),
    ('0', [0b111, 0b101, 0b101, 0b101, 0b111]),
    ('1', [0b010, 0b110, 0b010, 0b010, 0b111]),
    ('2', [0b110, 0b001, 0b010, 0b100, 0b111]),
    ('3', [0b110, 0b001, 0b010, 0b001, 0b110]),
    ('4', [0b101, 0b101, 0b111, 0b001, 0b001]),
    ('5', [0b111, 0b100, 0b110, 0b001, 0b110]),
    ('6', [0b011, 0b100, 0b111, 0b101, 0b111]),
    ('7', [0b111, 0b001, 0b010, 0b010, 0b010]),
    ('8', [0b111, 0b101, 0b111, 0b101, 0b111]),
    ('9', [0b111, 0b101, 0b111, 0b001, 0b110]),
    ('.', [0b000, 0b000, 0b000, 0b000, 0b010]),
    (',', [0b000, 0b000, 0b000, 0b010, 0b100]),
    ('!', [0b010, 0b010, 0b010, 0b000, 0b010]),
    ('?', [0b110, 0b001, 0b010, 0b000, 0b010]),
    ('\'', [0b010, 0b010, 0b000, 0b000, 0b000]),
    ('-', [0b000, 0b000, 0b111, 0b000, 0b000]),
    (':', [0b000, 0b010, 0b000, 0b010, 0b000]),
];

/// Hollow box for characters the built-in font does not cover.
const MISSING: [u8; 5] = [0b111, 0b101, 0b101, 0b101, 0b111];

fn bitmap(c: char) -> Option<[u8; 5]> {
    if c == ' ' {
        return None;
    }
    let upper = c.to_ascii_uppercase();
    Some(
        FONT_3X5
            .iter()
            .find(|(g, _)| *g == upper)
            .map_or(MISSING, |(_, rows)| *rows),
    )
}

/// Load the configured atlas into `backend`.
pub fn load_atlas(backend: &mut CanvasBackend, cfg: &AtlasConfig) -> Result<GlyphAtlas> {
    match cfg.path.as_deref() {
        Some(path) => load_png(backend, path, cfg),
        None => generate(backend, cfg),
    }
}

fn load_png(backend: &mut CanvasBackend, path: &Path, cfg: &AtlasConfig) -> Result<GlyphAtlas> {
    let img = image::open(path)
        .with_context(|| format!("failed to open atlas image {}", path.display()))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    let pixels = img
        .pixels()
        .map(|p| Color::rgba(p[0], p[1], p[2], p[3]))
        .collect();
    let texture = backend.load_rgba(width, height, pixels)?;
    info!(target: "runtime.assets", path = %path.display(), width, height, "atlas_image_loaded");
    let atlas = GlyphAtlas::new(
        texture,
        &cfg.alphabet,
        width,
        height,
        cfg.cell_width,
        cfg.cell_height,
    )
    .with_context(|| format!("atlas image {} does not fit the configured grid", path.display()))?;
    Ok(atlas)
}

/// Build an atlas image for `cfg.alphabet` from the built-in font.
pub fn generate(backend: &mut CanvasBackend, cfg: &AtlasConfig) -> Result<GlyphAtlas> {
    let (cw, ch) = (cfg.cell_width, cfg.cell_height);
    let alphabet = decode_str(&cfg.alphabet);
    let cells = (alphabet.len() as u32).max(1);
    let rows = cells.div_ceil(GENERATED_COLUMNS);
    let dims = GENERATED_COLUMNS.checked_mul(cw).zip(rows.checked_mul(ch));
    let Some(((width, height), len)) =
        dims.and_then(|(w, h)| Some(((w, h), (w as usize).checked_mul(h as usize)?)))
    else {
        bail!("generated atlas of {cells} cells at {cw}x{ch} px is too large");
    };

    let mut pixels = vec![Color::TRANSPARENT; len];
    // One font pixel per `scale` atlas pixels, centred in the cell.
    let scale = (cw / 4).min(ch / 6).max(1);
    let off_x = cw.saturating_sub(3 * scale) / 2;
    let off_y = ch.saturating_sub(5 * scale) / 2;
    for (i, cp) in alphabet.iter().enumerate() {
        let Some(rows_bits) = cp.to_char().and_then(bitmap) else {
            continue;
        };
        let cell_x = (i as u32 % GENERATED_COLUMNS) * cw;
        let cell_y = (i as u32 / GENERATED_COLUMNS) * ch;
        for (ry, bits) in rows_bits.iter().enumerate() {
            for rx in 0..3u32 {
                if bits & (0b100 >> rx) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let x = cell_x + off_x + rx * scale + dx;
                        let y = cell_y + off_y + ry as u32 * scale + dy;
                        if x < cell_x + cw && y < cell_y + ch {
                            pixels[y as usize * width as usize + x as usize] = Color::WHITE;
                        }
                    }
                }
            }
        }
    }
    let texture = backend.load_rgba(width, height, pixels)?;
    if alphabet.is_empty() {
        warn!(target: "runtime.assets", "atlas_alphabet_empty");
    }
    info!(target: "runtime.assets", glyphs = alphabet.len(), width, height, "atlas_generated");
    Ok(GlyphAtlas::from_code_points(
        texture, alphabet, width, height, cw, ch,
    )?)
}
