use crate::Matrix4;

use super::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewConstants {
  pub inverse_view: Matrix4,
  pub inverse_projection: Matrix4,
  pub invert_y: bool,
  pub ao_samples: u32
}

impl Default for ViewConstants {
  fn default() -> Self {
    Self {
      inverse_view: Matrix4::IDENTITY,
      inverse_projection: Matrix4::IDENTITY,
      invert_y: false,
      ao_samples: 1
    }
  }
}

/// Shader visible view table. The slot layout belongs to the ray tracing shaders.
pub trait BindingTable<B: GPUBackend> {
  unsafe fn bind_acceleration_structure(&self, slot: u32, acceleration_structure: &B::AccelerationStructure);
  unsafe fn bind_structured_buffer(&self, slot: u32, buffer: &B::Buffer, offset: u64, element_count: u32, stride: u32);
  unsafe fn set_view_constants(&self, constants: &ViewConstants);
}
