use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccelerationStructureSizes {
  pub size: u64,
  pub build_scratch_size: u64,
  pub update_scratch_size: u64
}

bitflags! {
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
  pub struct AccelerationStructureBuildFlags: u32 {
    const PREFER_FAST_TRACE = 0b1;
    const PREFER_FAST_BUILD = 0b10;
    const ALLOW_UPDATE      = 0b100;
  }
}

/// Non-indexed triangle list in a single geometry.
pub struct BottomLevelAccelerationStructureInfo<'a, B: GPUBackend> {
  pub vertex_format: Format,
  pub vertex_stride: u32,
  pub vertex_buffer: &'a B::Buffer,
  pub vertex_buffer_offset: u64,
  pub vertex_count: u32,
  pub opaque: bool,
  pub build_flags: AccelerationStructureBuildFlags,
}

pub struct TopLevelAccelerationStructureInfo<'a, B: GPUBackend> {
  pub instances_buffer: &'a B::Buffer,
  pub instances_buffer_offset: u64,
  pub instances_count: u32,
  pub build_flags: AccelerationStructureBuildFlags,
}

bitflags! {
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
  pub struct AccelerationStructureInstanceFlags: u32 {
    const TRIANGLE_CULL_DISABLE           = 0b1;
    const TRIANGLE_FRONT_COUNTERCLOCKWISE = 0b10;
    const FORCE_OPAQUE                    = 0b100;
    const FORCE_NON_OPAQUE                = 0b1000;
  }
}

pub struct AccelerationStructureInstance<'a, B: GPUBackend> {
  pub acceleration_structure: &'a B::AccelerationStructure,
  /// Row-major 3x4 affine transform.
  pub transform: [[f32; 4]; 3],
  pub id: u32,
  pub mask: u8,
  pub hit_group_offset: u32,
  pub flags: AccelerationStructureInstanceFlags
}

pub trait AccelerationStructure {
  /// Only meaningful to the GPU once the build that created the structure has completed.
  fn va(&self) -> u64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RayGenerationShader {
  Primary,
  AmbientOcclusionHitPositions,
  AmbientOcclusion
}
