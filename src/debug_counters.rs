#![cfg(feature = "unstable-debug-counters")]

use crossbeam_utils::atomic::AtomicCell;
use once_cell::sync::Lazy;

/// Process-wide counters of queue object construction and destruction.
///
/// Once all queues and removed elements are dropped, each creation
/// count must equal the matching drop count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalDebugCounters {
    pub sentinel_creation_count: u64,
    pub sentinel_drop_count: u64,
    pub element_creation_count: u64,
    pub element_drop_count: u64,
}

impl GlobalDebugCounters {
    pub fn current() -> Self {
        InternalGlobalDebugCounters::current()
    }

    /// Returns `true` if every created object has been dropped.
    pub fn is_balanced(&self) -> bool {
        self.sentinel_creation_count == self.sentinel_drop_count
            && self.element_creation_count == self.element_drop_count
    }
}

static COUNTERS: Lazy<InternalGlobalDebugCounters> =
    Lazy::new(InternalGlobalDebugCounters::default);

#[derive(Default)]
pub(crate) struct InternalGlobalDebugCounters {
    sentinel_creation_count: AtomicCell<u64>,
    sentinel_drop_count: AtomicCell<u64>,
    element_creation_count: AtomicCell<u64>,
    element_drop_count: AtomicCell<u64>,
}

impl InternalGlobalDebugCounters {
    fn current() -> GlobalDebugCounters {
        let c = &COUNTERS;
        GlobalDebugCounters {
            sentinel_creation_count: c.sentinel_creation_count.load(),
            sentinel_drop_count: c.sentinel_drop_count.load(),
            element_creation_count: c.element_creation_count.load(),
            element_drop_count: c.element_drop_count.load(),
        }
    }

    pub(crate) fn sentinel_created() {
        COUNTERS.sentinel_creation_count.fetch_add(1);
    }

    pub(crate) fn sentinel_dropped() {
        COUNTERS.sentinel_drop_count.fetch_add(1);
    }

    pub(crate) fn element_created() {
        COUNTERS.element_creation_count.fetch_add(1);
    }

    pub(crate) fn element_dropped() {
        COUNTERS.element_drop_count.fetch_add(1);
    }
}
