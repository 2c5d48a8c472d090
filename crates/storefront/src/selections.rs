//! Per-visitor filter selections.
//!
//! A selection is read, updated through the filter reducer and written back
//! while its lock is held, so overlapping interactions from one visitor apply
//! one after the other instead of overwriting each other.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use tokio::sync::Mutex;
use uuid::Uuid;

use jocestech_core::filter::FilterState;

/// Selections are dropped after this long without a request.
const SELECTION_IDLE_TIMEOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Upper bound on concurrently tracked visitors.
const MAX_SELECTIONS: u64 = 100_000;

/// Shared handle to one visitor's selection. `None` until the first change.
pub type SharedSelection = Arc<Mutex<Option<FilterState>>>;

/// Registry of filter selections keyed by visitor.
#[derive(Clone)]
pub struct FilterSelections {
    selections: Cache<Uuid, SharedSelection>,
}

impl Default for FilterSelections {
    fn default() -> Self {
        Self::new(SELECTION_IDLE_TIMEOUT)
    }
}

impl FilterSelections {
    #[must_use]
    pub fn new(idle_timeout: Duration) -> Self {
        let selections = Cache::builder()
            .max_capacity(MAX_SELECTIONS)
            .time_to_idle(idle_timeout)
            .build();
        Self { selections }
    }

    /// The visitor's selection, created empty on first use.
    #[must_use]
    pub fn for_visitor(&self, visitor: Uuid) -> SharedSelection {
        self.selections
            .get_with(visitor, || Arc::new(Mutex::new(None)))
    }
}
