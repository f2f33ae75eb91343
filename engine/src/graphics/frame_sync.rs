use tracereplay_core::gpu::{GPUBackend, Queue, Submission, Swapchain};

use super::TimelineFence;

/// Keeps at most one frame in flight.
///
/// After a frame is submitted and presented, `wait_for_frame` signals the next counter
/// value on the queue, blocks until the GPU got there and then picks up the backbuffer
/// the swapchain moved on to.
pub struct FrameSync<B: GPUBackend> {
    fence: TimelineFence<B>,
    backbuffer_index: u32,
    completed_frame: u64,
}

impl<B: GPUBackend> FrameSync<B> {
    pub fn new(device: &B::Device, swapchain: &B::Swapchain) -> Self {
        Self {
            fence: TimelineFence::new(device),
            backbuffer_index: swapchain.backbuffer_index(),
            completed_frame: 0,
        }
    }

    #[inline(always)]
    pub fn backbuffer_index(&self) -> u32 {
        self.backbuffer_index
    }

    /// Fence value of the last frame the GPU finished.
    #[inline(always)]
    pub fn completed_frame(&self) -> u64 {
        self.completed_frame
    }

    pub fn wait_for_frame(&mut self, queue: &B::Queue, swapchain: &B::Swapchain) -> u64 {
        let value = self.fence.next_signal_value();
        let signal = [self.fence.signal_pair(value)];
        unsafe {
            queue.submit(&mut [Submission {
                command_buffers: &mut [],
                wait_fences: &[],
                signal_fences: &signal,
            }]);
        }
        self.fence.await_value(value);
        self.completed_frame = value;
        self.backbuffer_index = swapchain.backbuffer_index();
        value
    }
}
