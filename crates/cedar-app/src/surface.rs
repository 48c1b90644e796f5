//! ANSI stdout surface.

use std::io::{self, Write};

use cedar_terminal::screen::Surface;

/// Home the cursor and clear the display.
const CLEAR: &str = "\x1b[H\x1b[2J";

/// One full-screen redraw of `lines`.
pub fn render_frame(lines: &[String]) -> String {
    let mut out = String::from(CLEAR);
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(line.trim_end());
    }
    out
}

/// Redraws the whole grid on every flush. Identical consecutive frames are
/// skipped.
pub struct AnsiSurface<W: Write> {
    out: W,
    last: Vec<String>,
}

impl AnsiSurface<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> AnsiSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last: Vec::new(),
        }
    }

    fn draw(&mut self, lines: &[String]) -> io::Result<()> {
        self.out.write_all(render_frame(lines).as_bytes())?;
        self.out.flush()
    }
}

impl<W: Write> Surface for AnsiSurface<W> {
    fn present(&mut self, lines: &[String]) {
        if self.last == lines {
            return;
        }
        if let Err(e) = self.draw(lines) {
            log::warn!("Failed to draw frame: {e}");
        }
        self.last = lines.to_vec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_cleared_and_trimmed() {
        let lines = vec!["ab  ".to_string(), "    ".to_string(), "c".to_string()];
        assert_eq!(render_frame(&lines), format!("{CLEAR}ab\n\nc"));
    }

    #[test]
    fn identical_frames_are_skipped() {
        let mut s = AnsiSurface::new(Vec::new());
        let frame = vec!["x".to_string()];
        s.present(&frame);
        s.present(&frame);
        assert_eq!(s.out, format!("{CLEAR}x").into_bytes());
        s.present(&["y".to_string()]);
        assert_eq!(s.out.len(), 2 * (CLEAR.len() + 1));
    }
}
