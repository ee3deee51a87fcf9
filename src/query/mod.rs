mod cache;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;

use crate::core::task::{CreateTask, Task, UpdateTask};
use crate::remote::{TaskApiClient, TaskApiError};
use cache::{PageCache, Settled};

/// What a view should render for one page right now.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageQuery {
    pub data: Option<Vec<Task>>,
    pub is_loading: bool,
    pub error: Option<String>,
    /// `data` belongs to an earlier page and is only shown until this one loads.
    pub is_placeholder: bool,
}

impl PageQuery {
    fn ready(tasks: Vec<Task>) -> Self {
        Self {
            data: Some(tasks),
            ..Default::default()
        }
    }

    fn failed(error: &TaskApiError) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    /// Whether another page is worth requesting. Only looks at this page:
    /// any non-empty page implies there may be more.
    pub fn has_next_page(&self) -> bool {
        self.data.as_ref().is_some_and(|tasks| !tasks.is_empty())
    }

    /// Fetched tasks for this page, ignoring placeholder data.
    pub fn tasks(&self) -> Option<&[Task]> {
        if self.is_placeholder {
            return None;
        }
        self.data.as_deref()
    }
}

/// Returned by a successful delete: the caller must go back to page 1.
#[must_use = "a delete invalidates every page; reset pagination to page 1"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageReset;

impl PageReset {
    pub const PAGE: u32 = 1;
}

/// Front door to the task resource for views: deduplicated page reads and
/// writes that invalidate what they touch.
#[derive(Clone)]
pub struct TaskQueries {
    client: TaskApiClient,
    cache: Arc<Mutex<PageCache>>,
}

impl TaskQueries {
    pub fn new(client: TaskApiClient) -> Self {
        Self {
            client,
            cache: Arc::new(Mutex::new(PageCache::default())),
        }
    }

    pub fn client(&self) -> &TaskApiClient {
        &self.client
    }

    fn lock(&self) -> MutexGuard<'_, PageCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read `page`, from cache if possible. A read already in flight for the
    /// same page is joined rather than sent again.
    pub async fn query(&self, page: u32) -> PageQuery {
        let (seq, future) = {
            let mut cache = self.lock();
            if let Some(tasks) = cache.cached(page) {
                log::debug!("Page {} served from cache", page);
                return PageQuery::ready(tasks.clone());
            }
            match cache.in_flight(page) {
                Some(flight) => {
                    log::debug!("Page {} already in flight, joining", page);
                    (flight.seq, flight.future.clone())
                }
                None => {
                    let client = self.client.clone();
                    let future = async move { client.fetch_page(page).await }
                        .boxed()
                        .shared();
                    let seq = cache.start(page, future.clone());
                    log::debug!("Requesting page {}", page);
                    (seq, future)
                }
            }
        };

        let result = future.await;
        match self.lock().finish(page, seq, &result) {
            Settled::Stored | Settled::AlreadyRecorded => {}
            Settled::Superseded => {
                log::debug!("Page {} response arrived after invalidation, not cached", page);
            }
        }

        match result {
            Ok(tasks) => PageQuery::ready(tasks),
            Err(e) => PageQuery::failed(&e),
        }
    }

    /// Non-blocking view of `page`: cached data, loading state with the last
    /// good page as placeholder, or the last error.
    pub fn snapshot(&self, page: u32) -> PageQuery {
        let cache = self.lock();
        if let Some(tasks) = cache.cached(page) {
            return PageQuery::ready(tasks.clone());
        }
        if cache.in_flight(page).is_some() {
            let data = cache.last_data().cloned();
            return PageQuery {
                is_placeholder: data.is_some(),
                data,
                is_loading: true,
                error: None,
            };
        }
        match cache.error(page) {
            Some(e) => PageQuery::failed(e),
            None => PageQuery::default(),
        }
    }

    pub fn invalidate(&self, page: u32) {
        log::debug!("Invalidating page {}", page);
        self.lock().invalidate(page);
    }

    pub fn invalidate_all(&self) {
        log::debug!("Invalidating all pages");
        self.lock().invalidate_all();
    }

    /// Create a task. On success the current page's read is invalidated.
    pub async fn create(&self, payload: &CreateTask, page: u32) -> Result<Task, TaskApiError> {
        let created = self.client.create(payload).await?;
        self.invalidate(page);
        Ok(created)
    }

    /// Update `id` with the given fields. On success the current page's read
    /// is invalidated.
    pub async fn update(
        &self,
        id: &str,
        fields: &UpdateTask,
        page: u32,
    ) -> Result<Task, TaskApiError> {
        let updated = self.client.update(id, fields).await?;
        self.invalidate(page);
        Ok(updated)
    }

    /// Delete `id`. Items shift between pages after a delete, so every
    /// cached page is dropped and the caller is told to restart at page 1.
    pub async fn remove(&self, id: &str, page: u32) -> Result<PageReset, TaskApiError> {
        self.client.remove(id).await?;
        log::debug!("Task {} removed while on page {}", id, page);
        self.invalidate_all();
        Ok(PageReset)
    }
}
