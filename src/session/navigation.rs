//! Navigation adapter: the browser history as a capability.
//!
//! The selection controller only sees the current path, the identifier stored with the
//! current entry, and push/replace. Pop events (back/forward) are delivered by whoever
//! drives the history, who then asks the session to re-derive from the path.

/// Browser-history capability used by the selection controller
pub trait NavigationAdapter {
    fn current_path(&self) -> String;
    /// Identifier stored with the current history entry, if any
    fn history_state(&self) -> Option<String>;
    fn push_path(&mut self, path: &str, state: Option<String>);
    fn replace_path(&mut self, path: &str, state: Option<String>);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub path: String,
    pub state: Option<String>,
}

/// In-memory history stack with back/forward, the terminal stand-in for a browser
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<HistoryEntry>,
    cursor: usize,
    pushes: usize,
    replaces: usize,
}

impl MemoryHistory {
    pub fn new(initial_path: &str) -> Self {
        Self {
            entries: vec![HistoryEntry { path: initial_path.to_string(), state: None }],
            cursor: 0,
            pushes: 0,
            replaces: 0,
        }
    }

    /// Move one entry back; returns the new path, or `None` at the start
    pub fn back(&mut self) -> Option<String> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.entries[self.cursor].path.clone())
    }

    /// Move one entry forward; returns the new path, or `None` at the end
    pub fn forward(&mut self) -> Option<String> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.entries[self.cursor].path.clone())
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total push and replace calls so far
    pub fn write_count(&self) -> usize {
        self.pushes + self.replaces
    }

    pub fn push_count(&self) -> usize {
        self.pushes
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl NavigationAdapter for MemoryHistory {
    fn current_path(&self) -> String {
        self.entries[self.cursor].path.clone()
    }

    fn history_state(&self) -> Option<String> {
        self.entries[self.cursor].state.clone()
    }

    fn push_path(&mut self, path: &str, state: Option<String>) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(HistoryEntry { path: path.to_string(), state });
        self.cursor += 1;
        self.pushes += 1;
    }

    fn replace_path(&mut self, path: &str, state: Option<String>) {
        self.entries[self.cursor] = HistoryEntry { path: path.to_string(), state };
        self.replaces += 1;
    }
}
