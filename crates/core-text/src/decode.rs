//! UTF-8 byte stream to packed code point decoding.
//!
//! A `CodePoint` is not a Unicode scalar value: it holds the raw UTF-8 bytes
//! of one character packed big-endian into a `u32` (`é` = `0xC3A9`,
//! `€` = `0xE282AC`). ASCII bytes widen to their own value. Atlas alphabets
//! are decoded through the same path, so lookups compare like with like.
//!
//! Two entry points:
//! - `decode`: lenient. Malformed input never fails; stray bytes are widened
//!   as-is so existing text keeps rendering the way it always has.
//! - `try_decode`: hardened. Rejects orphan continuations, truncated
//!   sequences and bytes that cannot appear in UTF-8.

use std::fmt;
use thiserror::Error;

/// One decoded character: raw UTF-8 bytes packed into 32 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CodePoint(pub u32);

impl CodePoint {
    /// Blank / word-space marker. Never looked up in the atlas.
    pub const SPACE: CodePoint = CodePoint(b' ' as u32);
    /// Hard line break. Structural only; never drawn.
    pub const NEWLINE: CodePoint = CodePoint(b'\n' as u32);

    /// Pack a `char` the same way the decoder would.
    pub fn from_char(c: char) -> Self {
        let mut buf = [0u8; 4];
        let bytes = c.encode_utf8(&mut buf).as_bytes();
        CodePoint(bytes.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32))
    }

    /// Unpack to a `char` when the packed bytes form valid UTF-8.
    pub fn to_char(self) -> Option<char> {
        let raw = self.0.to_be_bytes();
        let start = raw.iter().position(|b| *b != 0).unwrap_or(3);
        std::str::from_utf8(&raw[start..])
            .ok()
            .and_then(|s| {
                let mut chars = s.chars();
                let c = chars.next()?;
                chars.next().is_none().then_some(c)
            })
    }

    #[inline]
    pub fn is_space(self) -> bool {
        self == Self::SPACE
    }

    /// Word separator for wrapping. Malformed values are never whitespace.
    #[inline]
    pub fn is_whitespace(self) -> bool {
        self.to_char().is_some_and(char::is_whitespace)
    }
}

impl From<char> for CodePoint {
    fn from(c: char) -> Self {
        CodePoint::from_char(c)
    }
}

impl fmt::Display for CodePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Classification of a single input byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteClass {
    Ascii,
    /// Lead byte of a sequence carrying this many continuation bytes (1..=3).
    Lead(u8),
    Continuation,
    /// 0xF8..=0xFF: never valid in UTF-8.
    Invalid,
}

#[inline]
fn classify(b: u8) -> ByteClass {
    if b & 0x80 == 0 {
        ByteClass::Ascii
    } else if b & 0xC0 == 0x80 {
        ByteClass::Continuation
    } else if b & 0xE0 == 0xC0 {
        ByteClass::Lead(1)
    } else if b & 0xF0 == 0xE0 {
        ByteClass::Lead(2)
    } else if b & 0xF8 == 0xF0 {
        ByteClass::Lead(3)
    } else {
        ByteClass::Invalid
    }
}

/// Mask left set above the packed bytes while a sequence accumulates; XOR on
/// completion clears it. Indexed by continuation count.
const LANE_MASK: [u32; 4] = [0, 0xFFFF_0000, 0xFF00_0000, 0x0000_0000];

/// In-flight multi-byte sequence.
#[derive(Debug, Clone, Copy)]
struct Pending {
    acc: u32,
    /// Continuation bytes still expected.
    remaining: u8,
    /// Continuation bytes already folded in.
    folded: u8,
    mask: u32,
}

impl Pending {
    fn start(lead: u8, continuations: u8) -> Self {
        let mask = LANE_MASK[continuations as usize];
        Self {
            acc: mask | ((lead as u32) << (8 * continuations as u32)),
            remaining: continuations,
            folded: 0,
            mask,
        }
    }

    fn fold(&mut self, cont: u8) {
        self.remaining -= 1;
        self.acc |= (cont as u32) << (8 * self.remaining as u32);
        self.folded += 1;
    }

    /// Normalized value. For a truncated sequence the bytes stay in the lanes
    /// they were placed in.
    fn finish(self) -> CodePoint {
        CodePoint(self.acc ^ self.mask)
    }
}

/// Lenient decode: one `CodePoint` per logical character, order preserved.
///
/// Malformed input policy:
/// - orphan continuation byte (no pending lead, or sequence already full):
///   emitted as its widened raw value;
/// - 0xF8..=0xFF: emitted as its widened raw value;
/// - sequence interrupted after at least one continuation byte: emitted as the
///   partially packed value;
/// - lead byte followed directly by a non-continuation byte: dropped.
pub fn decode(bytes: &[u8]) -> Vec<CodePoint> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut pending: Option<Pending> = None;

    for (i, &b) in bytes.iter().enumerate() {
        let next_is_cont = bytes
            .get(i + 1)
            .is_some_and(|n| classify(*n) == ByteClass::Continuation);
        match classify(b) {
            ByteClass::Lead(n) => {
                pending = Some(Pending::start(b, n));
            }
            ByteClass::Continuation => {
                if let Some(mut p) = pending.filter(|p| p.remaining > 0) {
                    p.fold(b);
                    if p.remaining == 0 || !next_is_cont {
                        out.push(p.finish());
                        pending = None;
                    } else {
                        pending = Some(p);
                    }
                } else {
                    pending = None;
                    out.push(CodePoint(b as u32));
                }
            }
            ByteClass::Ascii | ByteClass::Invalid => {
                pending = None;
                out.push(CodePoint(b as u32));
            }
        }
    }
    out
}

/// Convenience wrapper over [`decode`] for string slices.
pub fn decode_str(text: &str) -> Vec<CodePoint> {
    decode(text.as_bytes())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("continuation byte {byte:#04x} at offset {offset} has no lead byte")]
    OrphanContinuation { offset: usize, byte: u8 },
    #[error("sequence at offset {offset} ended after {got} of {expected} continuation bytes")]
    Truncated {
        offset: usize,
        expected: u8,
        got: u8,
    },
    #[error("byte {byte:#04x} at offset {offset} is not valid UTF-8")]
    InvalidByte { offset: usize, byte: u8 },
}

/// Hardened decode: produces the same values as [`decode`] for well-formed
/// input and rejects everything the lenient path would paper over.
pub fn try_decode(bytes: &[u8]) -> Result<Vec<CodePoint>, DecodeError> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut pending: Option<(usize, Pending)> = None;

    for (offset, &b) in bytes.iter().enumerate() {
        match classify(b) {
            ByteClass::Continuation => {
                let Some((start, mut p)) = pending else {
                    return Err(DecodeError::OrphanContinuation { offset, byte: b });
                };
                p.fold(b);
                if p.remaining == 0 {
                    out.push(p.finish());
                    pending = None;
                } else {
                    pending = Some((start, p));
                }
            }
            class => {
                if let Some((start, p)) = pending.take() {
                    return Err(DecodeError::Truncated {
                        offset: start,
                        expected: p.folded + p.remaining,
                        got: p.folded,
                    });
                }
                match class {
                    ByteClass::Ascii => out.push(CodePoint(b as u32)),
                    ByteClass::Lead(n) => pending = Some((offset, Pending::start(b, n))),
                    _ => return Err(DecodeError::InvalidByte { offset, byte: b }),
                }
            }
        }
    }
    if let Some((start, p)) = pending {
        return Err(DecodeError::Truncated {
            offset: start,
            expected: p.folded + p.remaining,
            got: p.folded,
        });
    }
    Ok(out)
}
