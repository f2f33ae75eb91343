use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tracereplay_core::gpu::Swapchain;

pub(crate) struct SwapchainInner {
    width: u32,
    height: u32,
    backbuffer_count: u32,
    backbuffer_index: AtomicU32,
}

impl SwapchainInner {
    /// Flips to the next backbuffer, returns the one that was presented.
    pub(crate) fn present(&self) -> u32 {
        let presented = self.backbuffer_index.load(Ordering::Acquire);
        self.backbuffer_index.store((presented + 1) % self.backbuffer_count, Ordering::Release);
        presented
    }
}

pub struct HeadlessSwapchain {
    inner: Arc<SwapchainInner>,
}

impl HeadlessSwapchain {
    pub(crate) fn new(width: u32, height: u32, backbuffer_count: u32) -> Self {
        Self {
            inner: Arc::new(SwapchainInner {
                width,
                height,
                backbuffer_count: backbuffer_count.max(1),
                backbuffer_index: AtomicU32::new(0),
            }),
        }
    }

    pub(crate) fn inner(&self) -> &Arc<SwapchainInner> {
        &self.inner
    }
}

impl Swapchain for HeadlessSwapchain {
    fn backbuffer_index(&self) -> u32 {
        self.inner.backbuffer_index.load(Ordering::Acquire)
    }

    fn backbuffer_count(&self) -> u32 {
        self.inner.backbuffer_count
    }

    fn width(&self) -> u32 {
        self.inner.width
    }

    fn height(&self) -> u32 {
        self.inner.height
    }
}
