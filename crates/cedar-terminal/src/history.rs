//! Submitted-line history with Up/Down browsing.

/// Lines submitted in this session, oldest first.
#[derive(Debug, Default, Clone)]
pub struct History {
    entries: Vec<String>,
    /// `None` while not browsing.
    index: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a submitted line (blank lines are skipped) and stop browsing.
    pub fn push(&mut self, line: &str) {
        if !line.trim().is_empty() {
            self.entries.push(line.to_string());
        }
        self.index = None;
    }

    /// Step towards older entries. Starts at the newest entry when not
    /// browsing and stays on the oldest once there.
    pub fn up(&mut self) -> Option<&str> {
        let last = self.entries.len().checked_sub(1)?;
        let i = match self.index {
            None => last,
            Some(i) => i.saturating_sub(1),
        };
        self.index = Some(i);
        Some(&self.entries[i])
    }

    /// Step towards newer entries. `Some("")` when stepping past the newest
    /// entry, which also ends browsing; `None` when not browsing.
    pub fn down(&mut self) -> Option<&str> {
        let i = self.index?;
        if i + 1 >= self.entries.len() {
            self.index = None;
            return Some("");
        }
        self.index = Some(i + 1);
        Some(&self.entries[i + 1])
    }

    /// Stop browsing without touching the entries.
    pub fn reset_index(&mut self) {
        self.index = None;
    }

    pub fn is_browsing(&self) -> bool {
        self.index.is_some()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> History {
        let mut h = History::new();
        for l in ["a", "b", "c"] {
            h.push(l);
        }
        h
    }

    #[test]
    fn up_three_times_reaches_oldest() {
        let mut h = abc();
        assert_eq!(h.up(), Some("c"));
        assert_eq!(h.up(), Some("b"));
        assert_eq!(h.up(), Some("a"));
        assert_eq!(h.up(), Some("a"));
        assert_eq!(h.down(), Some("b"));
    }

    #[test]
    fn down_past_newest_clears() {
        let mut h = abc();
        h.up();
        assert_eq!(h.down(), Some(""));
        assert!(!h.is_browsing());
        assert_eq!(h.down(), None);
    }

    #[test]
    fn empty_history_ignores_keys() {
        let mut h = History::new();
        assert_eq!(h.up(), None);
        assert_eq!(h.down(), None);
    }

    #[test]
    fn blank_lines_are_not_recorded() {
        let mut h = History::new();
        h.push("   ");
        h.push("");
        assert!(h.entries().is_empty());
    }

    #[test]
    fn push_ends_browsing() {
        let mut h = abc();
        h.up();
        h.push("d");
        assert!(!h.is_browsing());
        assert_eq!(h.up(), Some("d"));
    }
}
