use std::collections::HashSet;

use crate::core::task::Task;

/// Accumulates fetched pages into one ordered, deduplicated task list.
///
/// The merger is the only owner of the list. Callers feed it every page
/// observation once and read the result through [`TaskListMerger::tasks`].
#[derive(Debug, Default)]
pub struct TaskListMerger {
    current: Vec<Task>,
    /// Last fetched page, kept so identical refetches are skipped.
    previous: Vec<Task>,
    revision: u64,
}

impl TaskListMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.current
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Bumped on every change to the list. Unchanged revision means the
    /// list was not touched at all.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Merge one page observation. `fetched` is `None` until a fetch for
    /// the page has succeeded.
    ///
    /// Page 1 replaces the list, later pages append ids not seen yet. A page
    /// structurally equal to the previous observation is ignored. Returns
    /// true if the list changed.
    pub fn apply(&mut self, fetched: Option<&[Task]>, page: u32) -> bool {
        let Some(fetched) = fetched else {
            if page == 1 && !self.current.is_empty() {
                self.current.clear();
                self.revision += 1;
                return true;
            }
            return false;
        };

        if self.previous.as_slice() == fetched {
            log::debug!("Page {} unchanged, skipping merge", page);
            return false;
        }

        if page == 1 {
            self.current = fetched.to_vec();
        } else {
            let seen: HashSet<&str> = self.current.iter().map(|t| t.id.as_str()).collect();
            let mut batch_seen: HashSet<&str> = HashSet::new();
            let fresh: Vec<Task> = fetched
                .iter()
                .filter(|t| !seen.contains(t.id.as_str()) && batch_seen.insert(t.id.as_str()))
                .cloned()
                .collect();
            log::debug!(
                "Page {}: {} fetched, {} new, {} already listed",
                page,
                fetched.len(),
                fresh.len(),
                fetched.len() - fresh.len()
            );
            self.current.extend(fresh);
        }

        self.previous = fetched.to_vec();
        self.revision += 1;
        true
    }

    /// Start a new session: drop everything accumulated so far.
    pub fn reset(&mut self) {
        self.current.clear();
        self.previous.clear();
        self.revision += 1;
    }

    /// Swap in a task returned by an update, keeping its position. Returns
    /// false if the id is not listed.
    pub fn replace(&mut self, task: Task) -> bool {
        match self.current.iter_mut().find(|t| t.id == task.id) {
            Some(slot) if *slot == task => false,
            Some(slot) => {
                *slot = task;
                self.revision += 1;
                true
            }
            None => false,
        }
    }
}
