use std::sync::Arc;

use log::warn;
use tracereplay_core::gpu::{Device, GPUBackend};

use super::*;

/// Device level state the render loop owns for its whole lifetime.
/// The scene is installed exactly once, when the background build publishes it.
pub struct RenderContext<B: GPUBackend> {
  device: Arc<B::Device>,
  swapchain: Arc<B::Swapchain>,
  binding_table: Arc<B::BindingTable>,
  frame_sync: FrameSync<B>,
  scene: Option<SceneResources<B>>,
}

impl<B: GPUBackend> RenderContext<B> {
  pub fn new(device: &Arc<B::Device>, swapchain: &Arc<B::Swapchain>, binding_table: &Arc<B::BindingTable>) -> Self {
    let frame_sync = FrameSync::new(device.as_ref(), swapchain.as_ref());
    Self {
      device: device.clone(),
      swapchain: swapchain.clone(),
      binding_table: binding_table.clone(),
      frame_sync,
      scene: None,
    }
  }

  #[inline(always)]
  pub fn device(&self) -> &Arc<B::Device> {
    &self.device
  }

  #[inline(always)]
  pub fn queue(&self) -> &B::Queue {
    self.device.graphics_queue()
  }

  #[inline(always)]
  pub fn swapchain(&self) -> &Arc<B::Swapchain> {
    &self.swapchain
  }

  #[inline(always)]
  pub fn binding_table(&self) -> &Arc<B::BindingTable> {
    &self.binding_table
  }

  #[inline(always)]
  pub fn frame_sync(&self) -> &FrameSync<B> {
    &self.frame_sync
  }

  pub fn scene(&self) -> Option<&SceneResources<B>> {
    self.scene.as_ref()
  }

  pub fn install_scene(&mut self, scene: SceneResources<B>) {
    if self.scene.is_some() {
      // TODO: retire the previous generation once the GPU is done with it to support reloading.
      warn!("Replacing an installed scene, the previous acceleration structures are leaked until exit");
    }
    self.scene = Some(scene);
  }

  /// Signals and waits for the frame that was just submitted and presented.
  pub fn end_frame(&mut self) -> u64 {
    let queue = self.device.graphics_queue();
    self.frame_sync.wait_for_frame(queue, &self.swapchain)
  }

  pub fn wait_for_idle(&self) {
    unsafe { self.device.wait_for_idle(); }
  }
}
