//! Terminal color capability detection.
//!
//! Detection runs once at startup and only inspects the environment; no
//! escape-sequence round trips. `COLORTERM=truecolor` (or `24bit`) selects
//! 24-bit output, anything else falls back to the xterm 256-color cube.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct TerminalCapabilities {
    pub truecolor: bool,
}

impl TerminalCapabilities {
    pub fn detect() -> Self {
        Self::from_colorterm(std::env::var("COLORTERM").ok().as_deref())
    }

    pub fn from_colorterm(value: Option<&str>) -> Self {
        let truecolor = value
            .map(|v| {
                let v = v.to_ascii_lowercase();
                v.contains("truecolor") || v.contains("24bit")
            })
            .unwrap_or(false);
        Self { truecolor }
    }

    pub fn ansi256() -> Self {
        Self { truecolor: false }
    }

    pub fn truecolor() -> Self {
        Self { truecolor: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colorterm_selects_truecolor() {
        assert!(TerminalCapabilities::from_colorterm(Some("truecolor")).truecolor);
        assert!(TerminalCapabilities::from_colorterm(Some("24BIT")).truecolor);
        assert!(!TerminalCapabilities::from_colorterm(Some("yes")).truecolor);
        assert!(!TerminalCapabilities::from_colorterm(None).truecolor);
    }
}
