//! Optional display capability.
//!
//! Rendering is best-effort diagnostics: the frame loop works identically
//! with no display attached, and render failures never affect control
//! correctness.

use std::time::{Duration, Instant};

use anyhow::{bail, Result};

use crate::frame::RgbaFrame;

/// Diagnostic display sink.
pub trait DisplaySink: Send {
    /// Replace the overlay text shown with the next rendered frame.
    fn set_overlay_text(&mut self, text: &str) -> Result<()>;

    /// Render one frame, best-effort.
    fn render(&mut self, frame: &RgbaFrame) -> Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayMode {
    /// Console display when stderr is a terminal, otherwise disabled.
    Auto,
    /// Console display unconditionally.
    Plain,
    /// Rendering disabled.
    None,
}

impl DisplayMode {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "auto" => Ok(DisplayMode::Auto),
            "plain" => Ok(DisplayMode::Plain),
            "none" => Ok(DisplayMode::None),
            other => bail!("unknown display mode '{}' (auto|plain|none)", other),
        }
    }
}

/// Build the display for the configured mode.
///
/// `None` is a valid result: absence of a display is a supported
/// configuration, not an error.
pub fn create(mode: DisplayMode, is_tty: bool) -> Option<Box<dyn DisplaySink>> {
    match mode {
        DisplayMode::None => None,
        DisplayMode::Plain => Some(Box::new(ConsoleDisplay::new())),
        DisplayMode::Auto => {
            if is_tty {
                Some(Box::new(ConsoleDisplay::new()))
            } else {
                None
            }
        }
    }
}

/// Console display: one overlay line on stderr, throttled so it stays
/// readable at full frame rate.
pub struct ConsoleDisplay {
    overlay: String,
    last_draw: Option<Instant>,
    min_interval: Duration,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self {
            overlay: String::new(),
            last_draw: None,
            min_interval: Duration::from_millis(500),
        }
    }
}

impl Default for ConsoleDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink for ConsoleDisplay {
    fn set_overlay_text(&mut self, text: &str) -> Result<()> {
        self.overlay = text.to_string();
        Ok(())
    }

    fn render(&mut self, frame: &RgbaFrame) -> Result<()> {
        if let Some(last) = self.last_draw {
            if last.elapsed() < self.min_interval {
                return Ok(());
            }
        }
        self.last_draw = Some(Instant::now());
        eprintln!("[{}x{}] {}", frame.width, frame.height, self.overlay);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_modes() {
        assert_eq!(DisplayMode::parse("auto").unwrap(), DisplayMode::Auto);
        assert_eq!(DisplayMode::parse("plain").unwrap(), DisplayMode::Plain);
        assert_eq!(DisplayMode::parse("none").unwrap(), DisplayMode::None);
        assert!(DisplayMode::parse("fancy").is_err());
    }

    #[test]
    fn none_mode_yields_no_sink() {
        assert!(create(DisplayMode::None, true).is_none());
        assert!(create(DisplayMode::Auto, false).is_none());
        assert!(create(DisplayMode::Auto, true).is_some());
        assert!(create(DisplayMode::Plain, false).is_some());
    }

    #[test]
    fn console_display_accepts_overlay_and_frames() {
        let mut display = ConsoleDisplay::new();
        display.set_overlay_text("stub | 10.0 fps").unwrap();
        let frame = RgbaFrame::new(vec![0u8; 2 * 2 * 4], 2, 2);
        display.render(&frame).unwrap();
        // Throttled second draw is still a success.
        display.render(&frame).unwrap();
    }
}
