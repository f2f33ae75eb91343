pub trait Swapchain {
  /// Index of the backbuffer the next frame renders into.
  fn backbuffer_index(&self) -> u32;
  fn backbuffer_count(&self) -> u32;
  fn width(&self) -> u32;
  fn height(&self) -> u32;
}
