use tracereplay_core::gpu::{Device, Fence as _, FenceValuePairRef, GPUBackend};

/// A fence together with the next value to signal on it.
pub struct TimelineFence<B: GPUBackend> {
    fence: B::Fence,
    next_value: u64,
}

impl<B: GPUBackend> TimelineFence<B> {
    pub fn new(device: &B::Device) -> Self {
        let fence = unsafe { device.create_fence() };
        Self {
            fence,
            // Fences start at 0, so waiting for 0 would be pointless.
            next_value: 1u64,
        }
    }

    /// Reserves the next value. Values are strictly increasing.
    pub fn next_signal_value(&mut self) -> u64 {
        let value = self.next_value;
        self.next_value += 1;
        value
    }

    pub fn signal_pair(&self, value: u64) -> FenceValuePairRef<'_, B> {
        FenceValuePairRef {
            fence: &self.fence,
            value,
        }
    }

    #[inline(always)]
    pub fn value(&self) -> u64 {
        self.fence.value()
    }

    #[inline(always)]
    pub fn await_value(&self, value: u64) {
        self.fence.await_value(value);
    }

    #[inline(always)]
    pub fn handle(&self) -> &B::Fence {
        &self.fence
    }
}
