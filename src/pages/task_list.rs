use std::time::Duration;

use crate::components::task_row::{TaskRow, task_rows};
use crate::components::toast::{Toast, ToastSlot};
use crate::core::list_merge::TaskListMerger;
use crate::core::pagination::{IntersectionEntry, PagerState, SentinelId, SentinelObserver};
use crate::core::task::Task;
use crate::query::PageQuery;

/// Sentinel placed after the last row.
pub const LIST_END: SentinelId = SentinelId(0);

/// State behind the infinite-scroll task table.
pub struct TaskListPage {
    pager: PagerState,
    merger: TaskListMerger,
    sentinel: SentinelObserver,
    has_next_page: bool,
    load_error: Option<String>,
    toast: ToastSlot,
}

impl TaskListPage {
    pub fn new(threshold: f64, toast_timeout: Duration) -> Self {
        let mut sentinel = SentinelObserver::new(threshold);
        sentinel.observe(LIST_END);
        sentinel.set_enabled(false);
        Self {
            pager: PagerState::default(),
            merger: TaskListMerger::new(),
            sentinel,
            has_next_page: false,
            load_error: None,
            toast: ToastSlot::new(toast_timeout),
        }
    }

    pub fn page(&self) -> u32 {
        self.pager.page()
    }

    pub fn is_loading(&self) -> bool {
        self.pager.is_fetching()
    }

    pub fn has_next_page(&self) -> bool {
        self.has_next_page
    }

    pub fn tasks(&self) -> &[Task] {
        self.merger.tasks()
    }

    /// Bumped whenever the listed tasks change.
    pub fn revision(&self) -> u64 {
        self.merger.revision()
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks().iter().find(|t| t.id == id)
    }

    pub fn rows(&self) -> Vec<TaskRow> {
        task_rows(self.tasks())
    }

    /// Persistent read error, shown in place of the table.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn toast(&self) -> Option<Toast> {
        self.toast.current()
    }

    pub fn toast_slot(&mut self) -> &mut ToastSlot {
        &mut self.toast
    }

    fn sync_sentinel(&mut self) {
        let enabled = !self.is_loading() && self.has_next_page && self.load_error.is_none();
        self.sentinel.set_enabled(enabled);
    }

    /// Mark the current page as loading and return it.
    pub fn begin_load(&mut self) -> u32 {
        let page = self.pager.begin();
        self.sync_sentinel();
        page
    }

    /// Feed a sentinel visibility report. Returns the next page to fetch
    /// when the sentinel just came into view and more data may exist.
    pub fn on_sentinel(&mut self, entry: IntersectionEntry) -> Option<u32> {
        if !self.sentinel.report(entry) {
            return None;
        }
        let next = self.pager.advance(self.has_next_page)?;
        log::debug!("Sentinel visible, advancing to page {}", next);
        self.sync_sentinel();
        Some(next)
    }

    /// Apply a read result. Results for any page other than the one being
    /// loaded are dropped.
    pub fn on_page_loaded(&mut self, page: u32, result: &PageQuery) -> bool {
        if !self.pager.finish(page) {
            log::debug!(
                "Ignoring response for page {} (current page {})",
                page,
                self.page()
            );
            return false;
        }

        match &result.error {
            Some(error) => {
                self.load_error = Some(format!("Error loading tasks: {}", error));
                self.has_next_page = false;
            }
            None => {
                self.load_error = None;
                let tasks = result.tasks();
                self.merger.apply(tasks, page);
                self.has_next_page = tasks.is_some_and(|t| !t.is_empty());
            }
        }
        self.sync_sentinel();
        true
    }

    /// New session at page 1, e.g. after a delete.
    pub fn reset_to_first_page(&mut self) {
        self.pager.reset();
        self.merger.reset();
        self.has_next_page = false;
        self.load_error = None;
        self.sync_sentinel();
    }

    /// A successful update returned a fresh copy of a listed task.
    pub fn on_task_updated(&mut self, task: Task) {
        self.merger.replace(task);
    }
}
