//! Back-navigation stack over inspected records.
//!
//! DESIGN
//! ======
//! The top of the stack is the current target. Whether the last entry may be
//! popped is a per-consumer policy: the inspector pops to empty and treats an
//! empty stack as "closed".

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;

/// Whether `pop` may remove the final entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PopPolicy {
    /// Any entry may be popped; the stack can become empty.
    #[default]
    AllowEmpty,
    /// The bottom entry stays until `clear`.
    KeepLast,
}

/// Navigation stack. `current` is the most recently pushed entry not yet
/// popped or cleared.
#[derive(Clone, Debug)]
pub struct NavigationHistory<T> {
    entries: Vec<T>,
    policy: PopPolicy,
}

impl<T> Default for NavigationHistory<T> {
    fn default() -> Self {
        Self::new(PopPolicy::default())
    }
}

impl<T> NavigationHistory<T> {
    #[must_use]
    pub fn new(policy: PopPolicy) -> Self {
        Self { entries: Vec::new(), policy }
    }

    #[must_use]
    pub fn policy(&self) -> PopPolicy {
        self.policy
    }

    #[must_use]
    pub fn current(&self) -> Option<&T> {
        self.entries.last()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn can_pop(&self) -> bool {
        match self.policy {
            PopPolicy::AllowEmpty => !self.entries.is_empty(),
            PopPolicy::KeepLast => self.entries.len() > 1,
        }
    }

    /// Make `entry` the new current target.
    pub fn push(&mut self, entry: T) {
        self.entries.push(entry);
    }

    /// Remove the current entry. Returns `None` when popping is not allowed.
    pub fn pop(&mut self) -> Option<T> {
        if !self.can_pop() {
            return None;
        }
        self.entries.pop()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}
