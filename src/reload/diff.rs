//! Navigation diff.

/// Bundle keys on screen before and after a client navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectionEvent {
    pub previous: Vec<String>,
    pub current: Vec<String>,
}

impl RedirectionEvent {
    pub fn new(previous: Vec<String>, current: Vec<String>) -> Self {
        Self { previous, current }
    }

    /// Keys in `current` but not in `previous`, in `current` order, deduplicated.
    ///
    /// Keys that went off screen never appear.
    pub fn newly_shown(&self) -> Vec<String> {
        let mut shown: Vec<String> = Vec::new();
        for key in &self.current {
            if !self.previous.contains(key) && !shown.contains(key) {
                shown.push(key.clone());
            }
        }
        shown
    }
}
