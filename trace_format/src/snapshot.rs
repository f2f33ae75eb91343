use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{BottomLevelInfo, DispatchDimensions, InstanceTransform, NodeId, Trace, TraceError, Vec3};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeSnapshot {
  Box {
    surface_area: f32,
    children: Vec<NodeId>
  },
  Triangles {
    surface_area: f32,
    vertices: Vec<[f32; 3]>
  },
  Instance {
    surface_area: f32,
    transform: [f32; 12],
    blas_index: u32,
    instance_index: u32
  },
  Procedural {
    surface_area: f32
  }
}

impl NodeSnapshot {
  pub fn surface_area(&self) -> f32 {
    match self {
      NodeSnapshot::Box { surface_area, .. } => *surface_area,
      NodeSnapshot::Triangles { surface_area, .. } => *surface_area,
      NodeSnapshot::Instance { surface_area, .. } => *surface_area,
      NodeSnapshot::Procedural { surface_area } => *surface_area,
    }
  }

  fn matches(&self, id: NodeId) -> bool {
    match self {
      NodeSnapshot::Box { .. } => id.is_box(),
      NodeSnapshot::Triangles { .. } => id.is_triangle(),
      NodeSnapshot::Instance { .. } => id.is_instance(),
      NodeSnapshot::Procedural { .. } => id.is_procedural(),
    }
  }
}

fn default_geometry_count() -> u32 {
  1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottomLevelSnapshot {
  #[serde(default)]
  pub base_address: u64,
  #[serde(default = "default_geometry_count")]
  pub geometry_count: u32,
  pub nodes: Vec<NodeSnapshot>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopLevelSnapshot {
  pub nodes: Vec<NodeSnapshot>
}

/// On-disk representation of a captured trace.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TraceSnapshot {
  #[serde(default)]
  pub create_time: Option<String>,
  pub bottom_levels: Vec<BottomLevelSnapshot>,
  pub top_levels: Vec<TopLevelSnapshot>,
  #[serde(default)]
  pub dispatches: Vec<DispatchDimensions>
}

impl TraceSnapshot {
  pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), TraceError> {
    let data = serde_json::to_vec_pretty(self)?;
    fs::write(path, data)?;
    Ok(())
  }
}

pub struct SnapshotTrace {
  snapshot: TraceSnapshot,
  bottom_level_infos: Vec<BottomLevelInfo>
}

impl SnapshotTrace {
  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TraceError> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|e| {
      if e.kind() == ErrorKind::NotFound {
        TraceError::NotFound(path.to_path_buf())
      } else {
        TraceError::IOError(e)
      }
    })?;
    let snapshot: TraceSnapshot = serde_json::from_slice(&data)?;
    debug!("Parsed trace {} ({} bytes)", path.display(), data.len());
    Self::from_snapshot(snapshot)
  }

  pub fn from_snapshot(snapshot: TraceSnapshot) -> Result<Self, TraceError> {
    for (index, bottom_level) in snapshot.bottom_levels.iter().enumerate() {
      validate_root(&bottom_level.nodes, "bottom", index)?;
    }
    for (index, top_level) in snapshot.top_levels.iter().enumerate() {
      validate_root(&top_level.nodes, "top", index)?;
    }

    let bottom_level_infos = snapshot.bottom_levels
      .iter()
      .map(summarize_bottom_level)
      .collect();

    Ok(Self {
      snapshot,
      bottom_level_infos
    })
  }

  pub fn snapshot(&self) -> &TraceSnapshot {
    &self.snapshot
  }

  fn bottom_level_node(&self, blas: u32, node: NodeId) -> Result<&NodeSnapshot, TraceError> {
    let hierarchy = self.snapshot.bottom_levels.get(blas as usize)
      .ok_or(TraceError::InvalidHierarchy(blas))?;
    lookup(&hierarchy.nodes, blas, node)
  }

  fn top_level_node(&self, tlas: u32, node: NodeId) -> Result<&NodeSnapshot, TraceError> {
    let hierarchy = self.snapshot.top_levels.get(tlas as usize)
      .ok_or(TraceError::InvalidHierarchy(tlas))?;
    lookup(&hierarchy.nodes, tlas, node)
  }

  fn instance_node(&self, tlas: u32, node: NodeId) -> Result<(&[f32; 12], u32, u32), TraceError> {
    match self.top_level_node(tlas, node)? {
      NodeSnapshot::Instance { transform, blas_index, instance_index, .. } => Ok((transform, *blas_index, *instance_index)),
      _ => Err(TraceError::InvalidNode { hierarchy: tlas, node })
    }
  }
}

fn validate_root(nodes: &[NodeSnapshot], level: &str, index: usize) -> Result<(), TraceError> {
  match nodes.first() {
    Some(NodeSnapshot::Box { .. }) => Ok(()),
    _ => Err(TraceError::InvalidBvh(format!("{} level hierarchy {} has no root box node", level, index)))
  }
}

fn lookup(nodes: &[NodeSnapshot], hierarchy: u32, node: NodeId) -> Result<&NodeSnapshot, TraceError> {
  nodes.get(node.index() as usize)
    .filter(|snapshot| snapshot.matches(node))
    .ok_or(TraceError::InvalidNode { hierarchy, node })
}

fn triangle_count(vertex_count: usize) -> u32 {
  // 3 vertices encode one triangle, 4 encode two sharing an edge.
  (vertex_count as u32).saturating_sub(2)
}

fn summarize_bottom_level(bottom_level: &BottomLevelSnapshot) -> BottomLevelInfo {
  let mut info = BottomLevelInfo {
    geometry_count: bottom_level.geometry_count,
    base_address: bottom_level.base_address,
    ..Default::default()
  };
  for node in &bottom_level.nodes {
    match node {
      NodeSnapshot::Triangles { vertices, .. } => {
        info.triangle_node_count += 1;
        info.unique_triangle_count += triangle_count(vertices.len());
      }
      NodeSnapshot::Procedural { .. } => info.procedural_node_count += 1,
      _ => {}
    }
  }
  info
}

fn children_of(node: &NodeSnapshot) -> SmallVec<[NodeId; 8]> {
  match node {
    NodeSnapshot::Box { children, .. } => children.iter().copied().collect(),
    _ => SmallVec::new()
  }
}

impl Trace for SnapshotTrace {
  fn create_time(&self) -> Option<&str> {
    self.snapshot.create_time.as_deref()
  }

  fn top_level_count(&self) -> u32 {
    self.snapshot.top_levels.len() as u32
  }

  fn bottom_level_count(&self) -> u32 {
    self.snapshot.bottom_levels.len() as u32
  }

  fn bottom_level_info(&self, blas: u32) -> Result<BottomLevelInfo, TraceError> {
    self.bottom_level_infos.get(blas as usize)
      .copied()
      .ok_or(TraceError::InvalidHierarchy(blas))
  }

  fn bottom_level_child_count(&self, blas: u32, node: NodeId) -> Result<u32, TraceError> {
    Ok(children_of(self.bottom_level_node(blas, node)?).len() as u32)
  }

  fn bottom_level_children(&self, blas: u32, node: NodeId) -> Result<SmallVec<[NodeId; 8]>, TraceError> {
    Ok(children_of(self.bottom_level_node(blas, node)?))
  }

  fn bottom_level_surface_area(&self, blas: u32, node: NodeId) -> Result<f32, TraceError> {
    Ok(self.bottom_level_node(blas, node)?.surface_area())
  }

  fn bottom_level_triangle_count(&self, blas: u32, node: NodeId) -> Result<u32, TraceError> {
    match self.bottom_level_node(blas, node)? {
      NodeSnapshot::Triangles { vertices, .. } => Ok(triangle_count(vertices.len())),
      _ => Err(TraceError::InvalidNode { hierarchy: blas, node })
    }
  }

  fn bottom_level_vertices(&self, blas: u32, node: NodeId) -> Result<SmallVec<[Vec3; 4]>, TraceError> {
    match self.bottom_level_node(blas, node)? {
      NodeSnapshot::Triangles { vertices, .. } => Ok(vertices.iter().map(|v| Vec3::from_array(*v)).collect()),
      _ => Err(TraceError::InvalidNode { hierarchy: blas, node })
    }
  }

  fn top_level_child_count(&self, tlas: u32, node: NodeId) -> Result<u32, TraceError> {
    Ok(children_of(self.top_level_node(tlas, node)?).len() as u32)
  }

  fn top_level_children(&self, tlas: u32, node: NodeId) -> Result<SmallVec<[NodeId; 8]>, TraceError> {
    Ok(children_of(self.top_level_node(tlas, node)?))
  }

  fn top_level_surface_area(&self, tlas: u32, node: NodeId) -> Result<f32, TraceError> {
    Ok(self.top_level_node(tlas, node)?.surface_area())
  }

  fn instance_transform(&self, tlas: u32, node: NodeId) -> Result<InstanceTransform, TraceError> {
    let (transform, _, _) = self.instance_node(tlas, node)?;
    let mut rows = [[0f32; 4]; 3];
    for (row_index, row) in rows.iter_mut().enumerate() {
      row.copy_from_slice(&transform[row_index * 4..row_index * 4 + 4]);
    }
    Ok(rows)
  }

  fn instance_blas_index(&self, tlas: u32, node: NodeId) -> Result<u32, TraceError> {
    self.instance_node(tlas, node).map(|(_, blas_index, _)| blas_index)
  }

  fn instance_index(&self, tlas: u32, node: NodeId) -> Result<u32, TraceError> {
    self.instance_node(tlas, node).map(|(_, _, instance_index)| instance_index)
  }

  fn dispatch_count(&self) -> u32 {
    self.snapshot.dispatches.len() as u32
  }

  fn dispatch_dimensions(&self, dispatch: u32) -> Result<DispatchDimensions, TraceError> {
    self.snapshot.dispatches.get(dispatch as usize)
      .copied()
      .ok_or(TraceError::InvalidHierarchy(dispatch))
  }
}
