//! Configuration loading for `glyphwriter.toml`.
//!
//! Every key is optional; an absent key, section or file yields the built-in
//! default, and so does a file that fails to parse (logged, never fatal).
//! Values parsed from disk are kept as written in `Config::file`;
//! `Config::apply_limits` then clamps them in place to the ranges the renderer
//! accepts and logs each adjustment on the `config` target. Unknown keys are
//! ignored so older binaries tolerate newer files.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const FILE_NAME: &str = "glyphwriter.toml";

/// Largest accepted glyph draw size in pixels.
pub const MAX_GLYPH_SIZE: i32 = 1024;
/// Largest accepted atlas cell edge in pixels.
pub const MAX_CELL: u32 = 512;
/// Largest accepted output edge in pixels.
pub const MAX_FRAME: u32 = 8192;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TextConfig {
    /// Glyph draw size in pixels.
    pub size: i32,
    /// Horizontal glyph overlap, percent of `size`.
    pub h_offset: i32,
    /// Line spacing, percent of `size`.
    pub v_offset: i32,
    /// Seconds between typewriter reveals.
    pub duration: f32,
    pub color: [u8; 3],
    /// Reject malformed UTF-8 input instead of decoding it leniently.
    pub strict_utf8: bool,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            size: 32,
            h_offset: 57,
            v_offset: 70,
            duration: 0.05,
            color: [255, 255, 255],
            strict_utf8: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AtlasConfig {
    /// PNG atlas image. `None` selects the built-in generated atlas.
    pub path: Option<PathBuf>,
    pub cell_width: u32,
    pub cell_height: u32,
    /// Characters in cell order.
    pub alphabet: String,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            path: None,
            cell_width: 32,
            cell_height: 32,
            alphabet: AtlasConfig::printable_ascii(),
        }
    }
}

impl AtlasConfig {
    fn printable_ascii() -> String {
        (0x20u8..=0x7e).map(char::from).collect()
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct FrameConfig {
    /// Output width in pixels.
    pub width: u32,
    pub height: u32,
    /// Target frame interval in milliseconds.
    pub tick_ms: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            width: 480,
            height: 272,
            tick_ms: 16,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub text: TextConfig,
    #[serde(default)]
    pub atlas: AtlasConfig,
    #[serde(default)]
    pub frame: FrameConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub path: Option<PathBuf>,
    pub file: ConfigFile,
}

/// Config path following platform conventions (XDG / AppData Roaming). A
/// `glyphwriter.toml` in the working directory wins.
pub fn discover() -> PathBuf {
    let local = PathBuf::from(FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("glyphwriter").join(FILE_NAME);
    }
    local
}

/// Load `path` (or the discovered path). Never fails on missing or malformed
/// files; the result is not yet clamped.
pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => Ok(Config {
            path: Some(path),
            file,
        }),
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(Config::default())
        }
    }
}

impl Config {
    /// Clamp values into the ranges the renderer accepts. Returns the number
    /// of values changed.
    pub fn apply_limits(&mut self) -> usize {
        let mut changed = 0;
        let text = &mut self.file.text;
        changed += clamp_logged("text.h_offset", &mut text.h_offset, 0, 100);
        changed += clamp_logged("text.v_offset", &mut text.v_offset, 0, 100);
        changed += clamp_logged("text.size", &mut text.size, 1, MAX_GLYPH_SIZE);
        if text.duration.is_nan() || text.duration < 0.0 {
            info!(
                target: "config",
                key = "text.duration",
                raw = text.duration,
                clamped = 0.0,
                "config_value_clamped"
            );
            text.duration = 0.0;
            changed += 1;
        }
        let atlas = &mut self.file.atlas;
        changed += clamp_logged("atlas.cell_width", &mut atlas.cell_width, 1, MAX_CELL);
        changed += clamp_logged("atlas.cell_height", &mut atlas.cell_height, 1, MAX_CELL);
        let frame = &mut self.file.frame;
        changed += clamp_logged("frame.width", &mut frame.width, 1, MAX_FRAME);
        changed += clamp_logged("frame.height", &mut frame.height, 1, MAX_FRAME);
        changed += clamp_logged("frame.tick_ms", &mut frame.tick_ms, 1, u64::MAX);
        changed
    }
}

fn clamp_logged<T>(key: &'static str, value: &mut T, min: T, max: T) -> usize
where
    T: Ord + Copy + std::fmt::Display,
{
    let clamped = (*value).clamp(min, max);
    if clamped == *value {
        return 0;
    }
    info!(target: "config", key, raw = %value, clamped = %clamped, "config_value_clamped");
    *value = clamped;
    1
}
