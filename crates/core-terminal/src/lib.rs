//! Terminal backend abstraction and crossterm implementation.
//!
//! The terminal is only a presentation surface here: frames are rendered into
//! a software canvas and `halfblock` turns the presented pixmap into colored
//! `▀` cells (two pixels per cell, foreground on top).

use anyhow::Result;
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{
        self, EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode,
        enable_raw_mode,
    },
};
use std::io::stdout;
use tracing::debug;

pub mod capabilities;
pub mod halfblock;
pub use capabilities::TerminalCapabilities;
pub use halfblock::{HalfBlockCell, HalfBlockPresenter, sample_cells};

pub trait TerminalBackend {
    fn enter(&mut self) -> Result<()>;
    fn leave(&mut self) -> Result<()>;
    fn set_title(&mut self, title: &str) -> Result<()>;
    /// Size in character cells (columns, rows).
    fn size(&self) -> Result<(u16, u16)>;
}

pub struct CrosstermBackend {
    entered: bool,
}

/// Restores the terminal on drop, including on early return or panic unwind.
pub struct TerminalGuard<'a> {
    backend: &'a mut CrosstermBackend,
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosstermBackend {
    pub fn new() -> Self {
        Self { entered: false }
    }

    /// Enter raw mode + alternate screen; leaving happens when the guard drops.
    pub fn enter_guard(&mut self) -> Result<TerminalGuard<'_>> {
        self.enter()?;
        Ok(TerminalGuard { backend: self })
    }
}

impl TerminalGuard<'_> {
    pub fn backend(&mut self) -> &mut CrosstermBackend {
        self.backend
    }
}

impl TerminalBackend for CrosstermBackend {
    fn enter(&mut self) -> Result<()> {
        if !self.entered {
            enable_raw_mode()?;
            execute!(stdout(), EnterAlternateScreen, Hide)?;
            self.entered = true;
            debug!(target: "runtime.terminal", "terminal_entered");
        }
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        if self.entered {
            execute!(stdout(), LeaveAlternateScreen, Show)?;
            disable_raw_mode()?;
            self.entered = false;
            debug!(target: "runtime.terminal", "terminal_left");
        }
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        execute!(stdout(), SetTitle(title))?;
        Ok(())
    }

    fn size(&self) -> Result<(u16, u16)> {
        Ok(terminal::size()?)
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

impl Drop for TerminalGuard<'_> {
    fn drop(&mut self) {
        let _ = self.backend.leave();
    }
}
