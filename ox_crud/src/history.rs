/// Address-bar abstraction. Only the query string is tracked.
pub trait History: Send {
    /// Current query string, without the leading `?`.
    fn query(&self) -> String;
    fn push(&mut self, query: String);
    fn replace(&mut self, query: String);
}

/// In-memory history with back/forward navigation.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<String>,
    index: usize,
}

impl MemoryHistory {
    pub fn new(initial: &str) -> Self {
        Self {
            entries: vec![initial.trim_start_matches('?').to_string()],
            index: 0,
        }
    }

    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("")
    }
}

impl History for MemoryHistory {
    fn query(&self) -> String {
        self.entries.get(self.index).cloned().unwrap_or_default()
    }

    /// Drops any forward entries, like a browser does.
    fn push(&mut self, query: String) {
        self.entries.truncate(self.index + 1);
        self.entries.push(query);
        self.index = self.entries.len() - 1;
    }

    fn replace(&mut self, query: String) {
        match self.entries.get_mut(self.index) {
            Some(entry) => *entry = query,
            None => self.entries.push(query),
        }
    }
}
