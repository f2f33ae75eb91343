use super::*;

pub struct Submission<'a, B: GPUBackend> {
  pub command_buffers: &'a mut [&'a mut B::CommandBuffer],
  pub wait_fences: &'a [FenceValuePairRef<'a, B>],
  pub signal_fences: &'a [FenceValuePairRef<'a, B>],
}

pub trait Queue<B: GPUBackend> {
  unsafe fn create_command_pool(&self) -> B::CommandPool;

  /// Submissions execute in FIFO order with everything else submitted to this queue,
  /// from any thread.
  unsafe fn submit(&self, submissions: &mut [Submission<B>]);
  unsafe fn present(&self, swapchain: &B::Swapchain);
}
