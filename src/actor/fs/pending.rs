use rustc_hash::FxHashSet;

use super::filter::WatchFilter;

/// Paths changed since the last tick, in first-seen order.
#[derive(Default)]
pub(super) struct PendingChanges {
    order: Vec<String>,
    seen: FxHashSet<String>,
}

impl PendingChanges {
    /// Queue the created or modified paths of a notify event.
    ///
    /// Removals and metadata-only changes are dropped.
    pub(super) fn add_event(&mut self, event: &notify::Event, filter: &WatchFilter) {
        use notify::EventKind;
        use notify::event::ModifyKind;

        match event.kind {
            EventKind::Create(_) => {}
            // mtime/chmod noise would rebuild in a loop
            EventKind::Modify(ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => {}
            _ => return,
        }

        for path in &event.paths {
            if let Some(relative) = filter.accept(path)
                && self.seen.insert(relative.clone())
            {
                self.order.push(relative);
            }
        }
    }

    pub(super) fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub(super) fn take(&mut self) -> Vec<String> {
        self.seen.clear();
        std::mem::take(&mut self.order)
    }
}
