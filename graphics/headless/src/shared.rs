use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracereplay_core::align_up_64;

use crate::HeadlessEvent;

const VA_BASE: u64 = 0x1_0000_0000;
const VA_ALIGNMENT: u64 = 256;

/// State every object created by a device refers back to.
pub struct HeadlessShared {
    events: Mutex<Vec<HeadlessEvent>>,
    next_va: AtomicU64,
    allocated: AtomicU64,
    memory_budget: Option<u64>,
    record_events: bool,
}

impl HeadlessShared {
    pub(crate) fn new(memory_budget: Option<u64>, record_events: bool) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            next_va: AtomicU64::new(VA_BASE),
            allocated: AtomicU64::new(0),
            memory_budget,
            record_events,
        }
    }

    pub(crate) fn record(&self, event: HeadlessEvent) {
        log::trace!("Headless event: {:?}", event);
        if self.record_events {
            self.events.lock().push(event);
        }
    }

    pub(crate) fn events(&self) -> Vec<HeadlessEvent> {
        self.events.lock().clone()
    }

    pub(crate) fn allocated(&self) -> u64 {
        self.allocated.load(Ordering::Acquire)
    }

    /// Returns the virtual address of the allocation or `None` if it exceeds the budget.
    pub(crate) fn allocate(&self, size: u64) -> Option<u64> {
        let size = align_up_64(size.max(1), VA_ALIGNMENT);
        let previous = self.allocated.fetch_add(size, Ordering::AcqRel);
        if let Some(budget) = self.memory_budget {
            if previous + size > budget {
                self.allocated.fetch_sub(size, Ordering::AcqRel);
                return None;
            }
        }
        Some(self.next_va.fetch_add(size, Ordering::AcqRel))
    }

    pub(crate) fn free(&self, size: u64) {
        let size = align_up_64(size.max(1), VA_ALIGNMENT);
        self.allocated.fetch_sub(size, Ordering::AcqRel);
    }
}
