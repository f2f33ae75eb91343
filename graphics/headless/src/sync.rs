use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracereplay_core::gpu::Fence;

pub(crate) struct FenceInner {
    value: Mutex<u64>,
    condvar: Condvar,
}

impl FenceInner {
    pub(crate) fn signal(&self, value: u64) {
        let mut guard = self.value.lock();
        if value > *guard {
            *guard = value;
        }
        self.condvar.notify_all();
    }

    pub(crate) fn await_signal(&self, value: u64) {
        let mut guard = self.value.lock();
        while *guard < value {
            self.condvar.wait(&mut guard);
        }
    }
}

/// Timeline fence. Signalled by the queue thread, awaited by anyone.
pub struct HeadlessFence {
    inner: Arc<FenceInner>,
}

impl HeadlessFence {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(FenceInner {
                value: Mutex::new(0),
                condvar: Condvar::new(),
            }),
        }
    }

    pub(crate) fn inner(&self) -> &Arc<FenceInner> {
        &self.inner
    }
}

impl Fence for HeadlessFence {
    fn value(&self) -> u64 {
        *self.inner.value.lock()
    }

    fn await_value(&self, value: u64) {
        self.inner.await_signal(value);
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn await_blocks_until_signalled() {
        let fence = HeadlessFence::new();
        let inner = fence.inner().clone();
        let signaller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            inner.signal(3);
        });
        fence.await_value(3);
        assert_eq!(fence.value(), 3);
        signaller.join().unwrap();
    }

    #[test]
    fn value_never_decreases() {
        let fence = HeadlessFence::new();
        fence.inner().signal(5);
        fence.inner().signal(2);
        assert_eq!(fence.value(), 5);
        fence.await_value(4);
    }
}
