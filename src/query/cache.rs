use std::collections::HashMap;

use futures::future::{BoxFuture, Shared};

use crate::core::task::Task;
use crate::remote::TaskApiError;

pub(crate) type PageFuture = Shared<BoxFuture<'static, Result<Vec<Task>, TaskApiError>>>;

/// A read that has been sent but not answered yet.
#[derive(Clone)]
pub(crate) struct InFlight {
    pub seq: u64,
    pub future: PageFuture,
}

/// What happened to a completed read when it was handed back to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Settled {
    /// First waiter for this request: outcome stored.
    Stored,
    /// Another waiter on the same request got here first.
    AlreadyRecorded,
    /// The page was invalidated or re-requested while this read was in flight.
    Superseded,
}

/// Page-keyed read cache with in-flight tracking.
#[derive(Default)]
pub(crate) struct PageCache {
    pages: HashMap<u32, Vec<Task>>,
    in_flight: HashMap<u32, InFlight>,
    /// Sequence number of the last request whose outcome was stored, per page.
    settled: HashMap<u32, u64>,
    errors: HashMap<u32, TaskApiError>,
    /// Most recent successful page, shown while another page loads.
    last_data: Option<Vec<Task>>,
    next_seq: u64,
}

impl PageCache {
    pub fn cached(&self, page: u32) -> Option<&Vec<Task>> {
        self.pages.get(&page)
    }

    pub fn in_flight(&self, page: u32) -> Option<&InFlight> {
        self.in_flight.get(&page)
    }

    pub fn error(&self, page: u32) -> Option<&TaskApiError> {
        self.errors.get(&page)
    }

    pub fn last_data(&self) -> Option<&Vec<Task>> {
        self.last_data.as_ref()
    }

    /// Register a new request for `page` and return its sequence number.
    pub fn start(&mut self, page: u32, future: PageFuture) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.in_flight.insert(page, InFlight { seq, future });
        seq
    }

    /// Record the outcome of request `seq`. Only the first waiter of the
    /// current request for `page` stores anything.
    pub fn finish(
        &mut self,
        page: u32,
        seq: u64,
        result: &Result<Vec<Task>, TaskApiError>,
    ) -> Settled {
        match self.in_flight.get(&page) {
            Some(flight) if flight.seq == seq => {}
            _ if self.settled.get(&page) == Some(&seq) => return Settled::AlreadyRecorded,
            _ => return Settled::Superseded,
        }
        self.in_flight.remove(&page);
        self.settled.insert(page, seq);
        match result {
            Ok(tasks) => {
                self.errors.remove(&page);
                self.pages.insert(page, tasks.clone());
                self.last_data = Some(tasks.clone());
            }
            Err(e) => {
                self.errors.insert(page, e.clone());
            }
        }
        Settled::Stored
    }

    pub fn invalidate(&mut self, page: u32) {
        self.pages.remove(&page);
        self.in_flight.remove(&page);
        self.errors.remove(&page);
    }

    pub fn invalidate_all(&mut self) {
        self.pages.clear();
        self.in_flight.clear();
        self.errors.clear();
    }
}
