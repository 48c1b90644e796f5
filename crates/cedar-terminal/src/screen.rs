//! Fixed-size character grid and the surface it flushes to.
//!
//! Every row always holds exactly `cols` characters; text is padded or
//! truncated on the way in. Widths are counted in `char`s.

use std::cell::RefCell;
use std::rc::Rc;

use cedar_types::config::{MIN_COLS, MIN_ROWS};

/// Where a rendered grid ends up.
pub trait Surface {
    /// Show the full grid, one string per row.
    fn present(&mut self, lines: &[String]);
}

/// Discards every frame.
#[derive(Debug, Default)]
pub struct NullSurface;

impl Surface for NullSurface {
    fn present(&mut self, _lines: &[String]) {}
}

/// Keeps the most recent frame and a count of flushes.
///
/// Clones share state, so a test can keep one handle while the screen owns
/// another.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    inner: Rc<RefCell<Recorded>>,
}

#[derive(Debug, Default)]
struct Recorded {
    last: Vec<String>,
    frames: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last presented grid.
    pub fn last_frame(&self) -> Vec<String> {
        self.inner.borrow().last.clone()
    }

    /// Number of `present` calls so far.
    pub fn frames(&self) -> usize {
        self.inner.borrow().frames
    }

    /// Non-blank rows of the last frame, right-trimmed.
    pub fn text_lines(&self) -> Vec<String> {
        self.inner
            .borrow()
            .last
            .iter()
            .map(|l| l.trim_end().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn present(&mut self, lines: &[String]) {
        let mut inner = self.inner.borrow_mut();
        inner.last = lines.to_vec();
        inner.frames += 1;
    }
}

fn blank(cols: usize) -> String {
    " ".repeat(cols)
}

fn fit(text: &str, cols: usize) -> String {
    let mut out: String = text.chars().take(cols).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat_n(' ', cols - len));
    out
}

/// A `rows x cols` grid of text.
pub struct Screen {
    rows: usize,
    cols: usize,
    buffer: Vec<String>,
    surface: Box<dyn Surface>,
}

impl Screen {
    /// A blank grid. Sizes below the minimum are raised to it.
    pub fn new(rows: usize, cols: usize, surface: Box<dyn Surface>) -> Self {
        let rows = rows.max(MIN_ROWS);
        let cols = cols.max(MIN_COLS);
        Self {
            rows,
            cols,
            buffer: vec![blank(cols); rows],
            surface,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Replace a row. Out-of-range rows are ignored.
    pub fn set_line(&mut self, row: usize, text: &str) {
        if row < self.rows {
            self.buffer[row] = fit(text, self.cols);
        }
    }

    /// A row's text, or a blank row when out of range.
    pub fn get_line(&self, row: usize) -> String {
        self.buffer
            .get(row)
            .cloned()
            .unwrap_or_else(|| blank(self.cols))
    }

    /// Drop `n` rows from the top and append blank rows at the bottom.
    pub fn scroll_up(&mut self, n: usize) {
        let n = n.min(self.rows);
        self.buffer.drain(..n);
        let cols = self.cols;
        self.buffer.extend(std::iter::repeat_with(|| blank(cols)).take(n));
    }

    pub fn clear(&mut self) {
        let cols = self.cols;
        self.buffer.iter_mut().for_each(|l| *l = blank(cols));
    }

    /// Change the grid size, keeping as many leading rows as fit.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        let rows = rows.max(MIN_ROWS);
        let cols = cols.max(MIN_COLS);
        let mut next = vec![blank(cols); rows];
        for (dst, src) in next.iter_mut().zip(self.buffer.iter()) {
            *dst = fit(src, cols);
        }
        log::debug!("Screen resized to {rows}x{cols}");
        self.rows = rows;
        self.cols = cols;
        self.buffer = next;
    }

    /// Flush the grid to the surface.
    pub fn render(&mut self) {
        self.surface.present(&self.buffer);
    }

    pub fn lines(&self) -> &[String] {
        &self.buffer
    }
}
