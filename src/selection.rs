use crate::core::FileEntry;
use crate::keys::Key;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    List,
    /// Editing filters; the buffer is dropped on cancel.
    FilterInput { buffer: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Done,
}

/// The part of the state that decides whether a redraw is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawSnapshot {
    pub cursor: usize,
    pub selected: BTreeSet<usize>,
    pub filters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickOutcome {
    pub selected: Vec<FileEntry>,
    pub filters: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SelectionState {
    file_count: usize,
    cursor: usize,
    selected: BTreeSet<usize>,
    filters: Vec<String>,
    mode: Mode,
}

impl SelectionState {
    pub fn new(file_count: usize, filters: Vec<String>) -> Self {
        Self {
            file_count,
            cursor: 0,
            selected: BTreeSet::new(),
            filters: filters
                .into_iter()
                .map(|filter| filter.trim().to_string())
                .filter(|filter| !filter.is_empty())
                .collect(),
            mode: Mode::List,
        }
    }

    /// Preselects `indices`, ignoring any outside the file list.
    pub fn with_selected(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        let count = self.file_count;
        self.selected = indices.into_iter().filter(|&index| index < count).collect();
        self
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> &BTreeSet<usize> {
        &self.selected
    }

    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, Mode::FilterInput { .. })
    }

    pub fn edit_buffer(&self) -> Option<&str> {
        match &self.mode {
            Mode::FilterInput { buffer } => Some(buffer),
            Mode::List => None,
        }
    }

    pub fn snapshot(&self) -> DrawSnapshot {
        DrawSnapshot {
            cursor: self.cursor,
            selected: self.selected.clone(),
            filters: self.filters.clone(),
        }
    }

    pub fn handle(&mut self, key: Key) -> Flow {
        if self.is_editing() {
            self.handle_edit(key);
            return Flow::Continue;
        }
        self.handle_list(key)
    }

    fn handle_edit(&mut self, key: Key) {
        let Mode::FilterInput { buffer } = &mut self.mode else {
            return;
        };
        match key {
            Key::Char(ch) => buffer.push(ch),
            Key::Backspace => {
                buffer.pop();
            }
            Key::Enter => {
                self.filters = parse_filters(buffer);
                self.mode = Mode::List;
            }
            Key::Escape | Key::Quit => self.mode = Mode::List,
            _ => {}
        }
    }

    fn handle_list(&mut self, key: Key) -> Flow {
        match key {
            Key::StartFilter => {
                self.mode = Mode::FilterInput {
                    buffer: self.filters.join(", "),
                };
            }
            Key::Up => self.move_up(),
            Key::Down => self.move_down(),
            Key::Toggle => self.toggle_current(),
            Key::ToggleAll => self.toggle_all(),
            Key::Enter => return Flow::Done,
            Key::Quit => {
                self.selected.clear();
                return Flow::Done;
            }
            _ => {}
        }
        Flow::Continue
    }

    fn move_up(&mut self) {
        if self.file_count > 0 {
            self.cursor = (self.cursor + self.file_count - 1) % self.file_count;
        }
    }

    fn move_down(&mut self) {
        if self.file_count > 0 {
            self.cursor = (self.cursor + 1) % self.file_count;
        }
    }

    fn toggle_current(&mut self) {
        if self.file_count == 0 {
            return;
        }
        if !self.selected.remove(&self.cursor) {
            self.selected.insert(self.cursor);
        }
    }

    fn toggle_all(&mut self) {
        if self.selected.len() == self.file_count {
            self.selected.clear();
        } else {
            self.selected = (0..self.file_count).collect();
        }
    }

    /// Selected files in list order, plus the committed filters.
    pub fn into_outcome(self, files: &[FileEntry]) -> PickOutcome {
        PickOutcome {
            selected: self
                .selected
                .iter()
                .filter_map(|&index| files.get(index).cloned())
                .collect(),
            filters: self.filters,
        }
    }
}

/// Comma-separated list, trimmed, empties dropped, order and duplicates kept.
pub fn parse_filters(buffer: &str) -> Vec<String> {
    buffer
        .split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}
