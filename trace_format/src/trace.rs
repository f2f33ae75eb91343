use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{NodeId, TraceError, Vec3};

/// Row-major 3x4 affine transform.
pub type InstanceTransform = [[f32; 4]; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BottomLevelInfo {
  pub geometry_count: u32,
  pub procedural_node_count: u32,
  pub triangle_node_count: u32,
  pub unique_triangle_count: u32,
  pub base_address: u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchDimensions {
  pub width: u32,
  pub height: u32,
  pub depth: u32
}

/// Read-only view of a loaded trace.
///
/// Every query addresses a single node of a single hierarchy.
/// Nothing is batched, callers walk the trees themselves.
pub trait Trace: Send + Sync {
  fn create_time(&self) -> Option<&str>;

  fn top_level_count(&self) -> u32;
  fn bottom_level_count(&self) -> u32;

  fn root_node(&self) -> NodeId {
    NodeId::ROOT
  }

  fn bottom_level_info(&self, blas: u32) -> Result<BottomLevelInfo, TraceError>;
  fn bottom_level_child_count(&self, blas: u32, node: NodeId) -> Result<u32, TraceError>;
  fn bottom_level_children(&self, blas: u32, node: NodeId) -> Result<SmallVec<[NodeId; 8]>, TraceError>;
  fn bottom_level_surface_area(&self, blas: u32, node: NodeId) -> Result<f32, TraceError>;
  fn bottom_level_triangle_count(&self, blas: u32, node: NodeId) -> Result<u32, TraceError>;
  fn bottom_level_vertices(&self, blas: u32, node: NodeId) -> Result<SmallVec<[Vec3; 4]>, TraceError>;

  fn top_level_child_count(&self, tlas: u32, node: NodeId) -> Result<u32, TraceError>;
  fn top_level_children(&self, tlas: u32, node: NodeId) -> Result<SmallVec<[NodeId; 8]>, TraceError>;
  fn top_level_surface_area(&self, tlas: u32, node: NodeId) -> Result<f32, TraceError>;
  fn instance_transform(&self, tlas: u32, node: NodeId) -> Result<InstanceTransform, TraceError>;
  fn instance_blas_index(&self, tlas: u32, node: NodeId) -> Result<u32, TraceError>;
  fn instance_index(&self, tlas: u32, node: NodeId) -> Result<u32, TraceError>;

  fn dispatch_count(&self) -> u32;
  fn dispatch_dimensions(&self, dispatch: u32) -> Result<DispatchDimensions, TraceError>;
}
