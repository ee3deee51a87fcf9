/// Identifies the sentinel region being watched. Hosts hand out a new id
/// whenever the underlying element is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SentinelId(pub u64);

/// One visibility report from the host's viewport observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub target: SentinelId,
    /// Visible fraction of the sentinel, 0.0 to 1.0.
    pub ratio: f64,
}

impl IntersectionEntry {
    pub fn new(target: SentinelId, ratio: f64) -> Self {
        Self { target, ratio }
    }
}

pub const DEFAULT_THRESHOLD: f64 = 1.0;

/// Turns raw visibility reports into "sentinel became visible" edges.
#[derive(Debug, Clone)]
pub struct SentinelObserver {
    threshold: f64,
    enabled: bool,
    target: Option<SentinelId>,
    intersecting: bool,
}

impl Default for SentinelObserver {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl SentinelObserver {
    /// `threshold` is clamped to (0, 1]; anything else falls back to fully visible.
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold.is_finite() && threshold > 0.0 {
            threshold.min(1.0)
        } else {
            DEFAULT_THRESHOLD
        };
        Self {
            threshold,
            enabled: true,
            target: None,
            intersecting: false,
        }
    }

    /// Start watching `target`. Switching targets drops the old registration.
    pub fn observe(&mut self, target: SentinelId) {
        if self.target != Some(target) {
            self.target = Some(target);
            self.intersecting = false;
        }
    }

    pub fn unobserve(&mut self) {
        self.target = None;
        self.intersecting = false;
    }

    /// Disabling deregisters, so visibility is re-learned once re-enabled.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.intersecting = false;
        }
    }

    /// Feed a visibility report. Returns true exactly when the sentinel
    /// goes from not intersecting to intersecting while enabled.
    pub fn report(&mut self, entry: IntersectionEntry) -> bool {
        if !self.enabled || self.target != Some(entry.target) {
            return false;
        }
        let now = entry.ratio >= self.threshold;
        let fired = now && !self.intersecting;
        self.intersecting = now;
        fired
    }
}

/// Where the list is in its load cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerState {
    Idle { page: u32 },
    Fetching { page: u32 },
}

impl Default for PagerState {
    fn default() -> Self {
        Self::Idle { page: 1 }
    }
}

impl PagerState {
    pub fn page(&self) -> u32 {
        match self {
            Self::Idle { page } | Self::Fetching { page } => *page,
        }
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self, Self::Fetching { .. })
    }

    /// Idle(p) -> Fetching(p + 1), only when nothing is loading and the last
    /// page was non-empty.
    pub fn advance(&mut self, has_next_page: bool) -> Option<u32> {
        match *self {
            Self::Idle { page } if has_next_page => {
                let next = page + 1;
                *self = Self::Fetching { page: next };
                Some(next)
            }
            _ => None,
        }
    }

    /// Start (or restart) loading the current page.
    pub fn begin(&mut self) -> u32 {
        let page = self.page();
        *self = Self::Fetching { page };
        page
    }

    /// A response for `page` arrived. Stale pages are ignored.
    pub fn finish(&mut self, page: u32) -> bool {
        match *self {
            Self::Fetching { page: current } if current == page => {
                *self = Self::Idle { page };
                true
            }
            _ => false,
        }
    }

    /// Back to the first page from any state.
    pub fn reset(&mut self) {
        *self = Self::Idle { page: 1 };
    }
}
