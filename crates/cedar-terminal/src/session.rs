//! Terminal session: line editor state, prompt and output cursor.
//!
//! The session owns the screen. All output goes through [`Session::print_line`],
//! which also feeds every open capture frame so the dispatcher can collect a
//! command's stdout while it is still rendered live.

use cedar_types::config::CedarConfig;

use crate::history::History;
use crate::screen::{Screen, Surface};

pub struct Session {
    cwd: String,
    previous_cwd: Option<String>,
    user: String,
    host: String,
    prompt_tail: String,
    input: String,
    /// Cursor offset into `input`, in chars.
    cursor: usize,
    history: History,
    out_row: usize,
    caret_visible: bool,
    running: bool,
    boot_mode: bool,
    busy: bool,
    /// Keep `input` through the next prompt draw.
    keep_input: bool,
    screen: Screen,
    captures: Vec<Vec<String>>,
}

impl Session {
    pub fn new(config: &CedarConfig, surface: Box<dyn Surface>) -> Self {
        Self {
            cwd: config.start_cwd.clone(),
            previous_cwd: None,
            user: config.user.clone(),
            host: config.host.clone(),
            prompt_tail: config.prompt_tail.clone(),
            input: String::new(),
            cursor: 0,
            history: History::new(),
            out_row: 0,
            caret_visible: true,
            running: false,
            boot_mode: false,
            busy: false,
            keep_input: false,
            screen: Screen::new(config.rows, config.cols, surface),
            captures: Vec::new(),
        }
    }

    // -- Accessors --

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn out_row(&self) -> usize {
        self.out_row
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn caret_visible(&self) -> bool {
        self.caret_visible
    }

    // -- Working directory --

    /// Move to `path`, remembering the current directory for `back`.
    pub fn change_dir(&mut self, path: String) {
        self.previous_cwd = Some(std::mem::replace(&mut self.cwd, path));
    }

    /// Swap the current and previous directories. With no previous
    /// directory the session goes to `/`.
    pub fn back(&mut self) -> &str {
        let prev = self.previous_cwd.take().unwrap_or_else(|| "/".to_string());
        self.previous_cwd = Some(std::mem::replace(&mut self.cwd, prev));
        &self.cwd
    }

    // -- Modes --

    pub fn start(&mut self) {
        self.running = true;
        log::info!("Session started");
        self.draw_prompt();
    }

    pub fn stop(&mut self) {
        self.running = false;
        log::info!("Session stopped");
    }

    pub fn set_boot_mode(&mut self, on: bool) {
        self.boot_mode = on;
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_boot_mode(&self) -> bool {
        self.boot_mode
    }

    /// Keystrokes are handled only while running, out of boot mode, and with
    /// no command in flight.
    pub fn accepts_input(&self) -> bool {
        self.running && !self.boot_mode && !self.busy
    }

    /// Stop and wipe the editor and grid. History entries survive.
    pub fn reset_hard(&mut self) {
        self.running = false;
        self.input.clear();
        self.cursor = 0;
        self.keep_input = false;
        self.history.reset_index();
        self.out_row = 0;
        self.screen.clear();
        self.screen.render();
    }

    // -- Editing --

    fn byte_offset(&self, chars: usize) -> usize {
        self.input
            .char_indices()
            .nth(chars)
            .map_or(self.input.len(), |(b, _)| b)
    }

    fn input_len(&self) -> usize {
        self.input.chars().count()
    }

    /// Insert one character at the cursor. Line breaks are ignored.
    pub fn insert(&mut self, ch: char) {
        if ch == '\r' || ch == '\n' {
            return;
        }
        let at = self.byte_offset(self.cursor);
        self.input.insert(at, ch);
        self.cursor += 1;
        self.render_input_line();
    }

    /// Insert text at the cursor and keep it for the next prompt.
    pub fn insert_str(&mut self, text: &str) {
        let at = self.byte_offset(self.cursor);
        self.input.insert_str(at, text);
        self.cursor += text.chars().count();
        self.keep_input = true;
        self.render_input_line();
    }

    /// Show `text` as the current input, cursor at the end. Display only:
    /// the next prompt starts empty.
    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
        self.cursor = self.input_len();
        self.keep_input = false;
        self.render_input_line();
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let at = self.byte_offset(self.cursor - 1);
        self.input.remove(at);
        self.cursor -= 1;
        self.render_input_line();
    }

    pub fn delete(&mut self) {
        if self.cursor >= self.input_len() {
            return;
        }
        let at = self.byte_offset(self.cursor);
        self.input.remove(at);
        self.render_input_line();
    }

    pub fn move_cursor(&mut self, delta: isize) {
        self.cursor = self
            .cursor
            .saturating_add_signed(delta)
            .min(self.input_len());
        self.render_input_line();
    }

    pub fn home(&mut self) {
        self.cursor = 0;
        self.render_input_line();
    }

    pub fn end(&mut self) {
        self.cursor = self.input_len();
        self.render_input_line();
    }

    pub fn history_up(&mut self) {
        if let Some(line) = self.history.up() {
            self.input = line.to_string();
            self.cursor = self.input_len();
            self.render_input_line();
        }
    }

    pub fn history_down(&mut self) {
        if let Some(line) = self.history.down() {
            self.input = line.to_string();
            self.cursor = self.input_len();
            self.render_input_line();
        }
    }

    // -- Output --

    /// `user@host:cwd` plus the prompt tail, with `~` for the exact home dir.
    pub fn prompt_string(&self) -> String {
        let home = format!("/home/{}", self.user);
        let shown = if self.cwd == home { "~" } else { &self.cwd };
        format!("{}@{}:{shown}{}", self.user, self.host, self.prompt_tail)
    }

    fn ensure_row(&mut self) {
        if self.out_row >= self.screen.rows() {
            self.screen.scroll_up(1);
            self.out_row = self.screen.rows() - 1;
        }
    }

    /// Print one line, wrapping at the grid width and scrolling as needed.
    pub fn print_line(&mut self, text: &str) {
        for frame in &mut self.captures {
            frame.push(text.to_string());
        }

        let cols = self.screen.cols();
        let chars: Vec<char> = text.chars().collect();
        let mut chunks: Vec<String> = chars.chunks(cols).map(|c| c.iter().collect()).collect();
        if chunks.is_empty() {
            chunks.push(String::new());
        }
        for chunk in &chunks {
            self.ensure_row();
            self.screen.set_line(self.out_row, chunk);
            self.out_row += 1;
        }
        self.screen.render();
    }

    /// Start collecting printed lines. Frames nest; every open frame sees
    /// every line.
    pub fn begin_capture(&mut self) {
        self.captures.push(Vec::new());
    }

    /// Close the innermost capture frame and return what it collected.
    pub fn end_capture(&mut self) -> Vec<String> {
        self.captures.pop().unwrap_or_default()
    }

    /// Draw a fresh prompt on the output row.
    pub fn draw_prompt(&mut self) {
        if self.keep_input {
            self.keep_input = false;
        } else {
            self.input.clear();
            self.cursor = 0;
        }
        self.ensure_row();
        let prompt = self.prompt_string();
        self.screen.set_line(self.out_row, &prompt);
        self.screen.render();
        self.render_input_line();
    }

    /// Redraw the prompt row with the input and caret.
    pub fn render_input_line(&mut self) {
        let rows = self.screen.rows();
        let cols = self.screen.cols();
        let row = self.out_row.min(rows - 1);
        let prompt = self.prompt_string();
        let prompt_len = prompt.chars().count();

        let shown: Vec<char> = self
            .input
            .chars()
            .take(cols.saturating_sub(prompt_len))
            .collect();
        let cur = self.cursor.min(shown.len());

        let mut cells: Vec<char> = prompt
            .chars()
            .chain(shown.iter().copied())
            .chain(std::iter::repeat(' '))
            .take(cols)
            .collect();
        let caret_pos = (prompt_len + cur).min(cols - 1);
        cells[caret_pos] = if self.caret_visible { '|' } else { ' ' };

        let line: String = cells.into_iter().collect();
        self.screen.set_line(row, &line);
        self.screen.render();
    }

    /// Commit the prompt and input as a permanent line and hand back the
    /// submitted text. The input buffer is left empty.
    pub fn commit_input(&mut self) -> String {
        self.caret_visible = true;
        let line = std::mem::take(&mut self.input);
        self.cursor = 0;
        self.keep_input = false;

        let row = self.out_row.min(self.screen.rows() - 1);
        let committed = format!("{}{line}", self.prompt_string());
        self.screen.set_line(row, &committed);
        self.screen.render();

        self.out_row += 1;
        self.ensure_row();

        self.history.push(&line);
        line
    }

    pub fn clear_screen(&mut self) {
        self.screen.clear();
        self.out_row = 0;
        self.screen.render();
    }

    /// Toggle the caret. Ignored unless running and out of boot mode.
    pub fn tick_blink(&mut self) {
        if !self.running || self.boot_mode {
            return;
        }
        self.caret_visible = !self.caret_visible;
        self.render_input_line();
    }

    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.screen.resize(rows, cols);
        self.screen.render();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::{NullSurface, RecordingSurface};

    fn session() -> Session {
        Session::new(&CedarConfig::default(), Box::new(NullSurface))
    }

    fn recorded() -> (Session, RecordingSurface) {
        let rec = RecordingSurface::new();
        let config = CedarConfig {
            rows: 12,
            cols: 40,
            ..CedarConfig::default()
        };
        (Session::new(&config, Box::new(rec.clone())), rec)
    }

    fn typed(s: &mut Session, text: &str) {
        for ch in text.chars() {
            s.insert(ch);
        }
    }

    #[test]
    fn insert_and_cursor() {
        let mut s = session();
        typed(&mut s, "ac");
        s.move_cursor(-1);
        s.insert('b');
        assert_eq!(s.input(), "abc");
        assert_eq!(s.cursor(), 2);
    }

    #[test]
    fn newlines_are_not_inserted() {
        let mut s = session();
        s.insert('\n');
        s.insert('\r');
        assert_eq!(s.input(), "");
        assert_eq!(s.cursor(), 0);
    }

    #[test]
    fn backspace_and_delete() {
        let mut s = session();
        typed(&mut s, "abcd");
        s.backspace();
        assert_eq!(s.input(), "abc");
        s.home();
        s.delete();
        assert_eq!(s.input(), "bc");
        assert_eq!(s.cursor(), 0);
        s.backspace();
        assert_eq!(s.input(), "bc");
        s.end();
        s.delete();
        assert_eq!(s.input(), "bc");
    }

    #[test]
    fn multibyte_editing() {
        let mut s = session();
        typed(&mut s, "héé");
        s.move_cursor(-1);
        s.backspace();
        assert_eq!(s.input(), "hé");
        assert_eq!(s.cursor(), 1);
    }

    #[test]
    fn cursor_is_clamped() {
        let mut s = session();
        typed(&mut s, "ab");
        s.move_cursor(10);
        assert_eq!(s.cursor(), 2);
        s.move_cursor(-10);
        assert_eq!(s.cursor(), 0);
    }

    #[test]
    fn prompt_uses_tilde_only_for_exact_home() {
        let mut s = session();
        assert_eq!(s.prompt_string(), "guest@cedar:/$ ");
        s.change_dir("/home/guest".into());
        assert_eq!(s.prompt_string(), "guest@cedar:~$ ");
        s.change_dir("/home/guest/docs".into());
        assert_eq!(s.prompt_string(), "guest@cedar:/home/guest/docs$ ");
    }

    #[test]
    fn back_swaps_directories() {
        let mut s = session();
        assert_eq!(s.back(), "/");
        s.change_dir("/a".into());
        s.change_dir("/b".into());
        assert_eq!(s.back(), "/a");
        assert_eq!(s.back(), "/b");
    }

    #[test]
    fn print_line_wraps_at_width() {
        let (mut s, rec) = recorded();
        s.print_line(&"x".repeat(90));
        assert_eq!(s.out_row(), 3);
        let lines = rec.text_lines();
        assert_eq!(lines, vec!["x".repeat(40), "x".repeat(40), "x".repeat(10)]);
    }

    #[test]
    fn empty_print_takes_a_row() {
        let (mut s, _) = recorded();
        s.print_line("");
        assert_eq!(s.out_row(), 1);
    }

    #[test]
    fn print_line_scrolls_at_bottom() {
        let (mut s, rec) = recorded();
        for i in 0..15 {
            s.print_line(&format!("line {i}"));
        }
        assert_eq!(s.out_row(), 12);
        let lines = rec.text_lines();
        assert_eq!(lines.first().map(String::as_str), Some("line 3"));
        assert_eq!(lines.last().map(String::as_str), Some("line 14"));
    }

    #[test]
    fn nested_captures_see_all_lines() {
        let mut s = session();
        s.begin_capture();
        s.print_line("outer");
        s.begin_capture();
        s.print_line("inner");
        assert_eq!(s.end_capture(), vec!["inner"]);
        s.print_line("after");
        assert_eq!(s.end_capture(), vec!["outer", "inner", "after"]);
        assert!(s.end_capture().is_empty());
    }

    #[test]
    fn input_line_shows_caret() {
        let (mut s, rec) = recorded();
        s.start();
        typed(&mut s, "ls");
        let row = rec.last_frame()[0].clone();
        assert!(row.starts_with("guest@cedar:/$ ls|"));
        s.home();
        assert!(rec.last_frame()[0].starts_with("guest@cedar:/$ |s"));
    }

    #[test]
    fn long_input_shows_leading_part() {
        let (mut s, rec) = recorded();
        s.start();
        typed(&mut s, &"a".repeat(60));
        let row = rec.last_frame()[0].clone();
        assert_eq!(row.chars().count(), 40);
        // The caret sits in the last cell once the cursor is past the edge.
        assert!(row.ends_with('|'));
    }

    #[test]
    fn blink_toggles_only_when_interactive() {
        let mut s = session();
        s.tick_blink();
        assert!(s.caret_visible());
        s.start();
        s.tick_blink();
        assert!(!s.caret_visible());
        s.set_boot_mode(true);
        s.tick_blink();
        assert!(!s.caret_visible());
    }

    #[test]
    fn commit_records_history_and_advances() {
        let (mut s, rec) = recorded();
        s.start();
        typed(&mut s, "echo hi");
        let line = s.commit_input();
        assert_eq!(line, "echo hi");
        assert_eq!(s.input(), "");
        assert_eq!(s.out_row(), 1);
        assert_eq!(s.history().entries(), ["echo hi"]);
        assert_eq!(rec.text_lines(), vec!["guest@cedar:/$ echo hi"]);
    }

    #[test]
    fn blank_commit_skips_history() {
        let mut s = session();
        s.start();
        typed(&mut s, "   ");
        s.commit_input();
        assert!(s.history().entries().is_empty());
    }

    #[test]
    fn inserted_text_survives_prompt() {
        let mut s = session();
        s.start();
        s.insert_str("clip");
        s.draw_prompt();
        assert_eq!(s.input(), "clip");
        s.draw_prompt();
        assert_eq!(s.input(), "");
    }

    #[test]
    fn displayed_input_is_cleared_by_prompt() {
        let mut s = session();
        s.start();
        s.set_input("echo from script");
        s.draw_prompt();
        assert_eq!(s.input(), "");
    }

    #[test]
    fn reset_hard_stops_and_clears() {
        let (mut s, rec) = recorded();
        s.start();
        s.print_line("junk");
        typed(&mut s, "abc");
        s.reset_hard();
        assert!(!s.is_running());
        assert_eq!(s.input(), "");
        assert_eq!(s.out_row(), 0);
        assert!(rec.text_lines().is_empty());
    }

    #[test]
    fn input_gating() {
        let mut s = session();
        assert!(!s.accepts_input());
        s.start();
        assert!(s.accepts_input());
        s.set_busy(true);
        assert!(!s.accepts_input());
        s.set_busy(false);
        s.set_boot_mode(true);
        assert!(!s.accepts_input());
    }
}
