//! Undo history — a linear, truncatable timeline of snapshots.
//!
//! Recording a new entry discards everything after the current position, so
//! a redo branch is lost as soon as a new action begins. Only user-initiated
//! changes are recorded; previews and remote syncs never touch the timeline.
//! The timeline is never empty and the position always indexes an entry.

#[derive(Debug, Clone, PartialEq)]
pub struct History<T> {
    entries: Vec<T>,
    position: usize,
}

impl<T: Default> Default for History<T> {
    fn default() -> Self {
        Self { entries: vec![T::default()], position: 0 }
    }
}

impl<T: Default> History<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to a single empty entry at position 0.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.entries.push(T::default());
        self.position = 0;
    }
}

impl<T> History<T> {
    /// Truncate after the current position and append `entry`.
    pub fn record(&mut self, entry: T) {
        self.entries.truncate(self.position + 1);
        self.entries.push(entry);
        self.position = self.entries.len() - 1;
    }

    /// Step back. `None` at the start.
    pub fn undo(&mut self) -> Option<&T> {
        let target = self.position.checked_sub(1)?;
        self.jump_to(target)
    }

    /// Step forward. `None` at the end.
    pub fn redo(&mut self) -> Option<&T> {
        self.jump_to(self.position + 1)
    }

    /// Absolute move. `None` if `index` is out of range.
    pub fn jump_to(&mut self, index: usize) -> Option<&T> {
        let entry = self.entries.get(index)?;
        self.position = index;
        Some(entry)
    }

    #[must_use]
    pub fn current(&self) -> &T {
        &self.entries[self.position]
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true: the timeline always holds at least one entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[T] {
        &self.entries
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
