use crate::{
  BottomLevelSnapshot,
  DispatchDimensions,
  InstanceTransform,
  NodeId,
  NodeSnapshot,
  NodeType,
  SnapshotTrace,
  TopLevelSnapshot,
  TraceError,
  TraceSnapshot,
  Vec3,
};

/// Appends `node` to `nodes` and links it under `parent`.
fn push_child(nodes: &mut Vec<NodeSnapshot>, parent: NodeId, node: NodeSnapshot, node_type: NodeType) -> NodeId {
  let id = NodeId::new(nodes.len() as u32, node_type);
  nodes.push(node);
  if let Some(NodeSnapshot::Box { children, .. }) = nodes.get_mut(parent.index() as usize) {
    children.push(id);
  } else {
    panic!("Parent {:#x} is not a box node", parent.raw());
  }
  id
}

fn root_box(surface_area: f32) -> NodeSnapshot {
  NodeSnapshot::Box { surface_area, children: Vec::new() }
}

fn triangle_area(a: Vec3, b: Vec3, c: Vec3) -> f32 {
  (b - a).cross(c - a).length() * 0.5
}

pub struct BottomLevelBuilder {
  nodes: Vec<NodeSnapshot>,
  base_address: u64
}

impl BottomLevelBuilder {
  pub fn new(root_surface_area: f32) -> Self {
    Self {
      nodes: vec![root_box(root_surface_area)],
      base_address: 0
    }
  }

  /// One leaf per triangle directly below the root, each with its real surface area.
  pub fn from_triangles(triangles: &[[Vec3; 3]]) -> Self {
    let mut builder = Self::new(1.0);
    for triangle in triangles {
      let area = triangle_area(triangle[0], triangle[1], triangle[2]);
      builder.add_triangles(NodeId::ROOT, area, triangle);
    }
    builder
  }

  pub fn base_address(mut self, base_address: u64) -> Self {
    self.base_address = base_address;
    self
  }

  pub fn add_box(&mut self, parent: NodeId, surface_area: f32) -> NodeId {
    push_child(&mut self.nodes, parent, NodeSnapshot::Box { surface_area, children: Vec::new() }, NodeType::Box32)
  }

  pub fn add_triangles(&mut self, parent: NodeId, surface_area: f32, vertices: &[Vec3]) -> NodeId {
    let vertices = vertices.iter().map(|v| v.to_array()).collect();
    push_child(&mut self.nodes, parent, NodeSnapshot::Triangles { surface_area, vertices }, NodeType::Triangle)
  }

  pub fn add_procedural(&mut self, parent: NodeId, surface_area: f32) -> NodeId {
    push_child(&mut self.nodes, parent, NodeSnapshot::Procedural { surface_area }, NodeType::Procedural)
  }

  fn build(self) -> BottomLevelSnapshot {
    BottomLevelSnapshot {
      base_address: self.base_address,
      geometry_count: 1,
      nodes: self.nodes
    }
  }
}

pub struct TopLevelBuilder {
  nodes: Vec<NodeSnapshot>
}

impl Default for TopLevelBuilder {
  fn default() -> Self {
    Self::new()
  }
}

impl TopLevelBuilder {
  pub fn new() -> Self {
    Self {
      nodes: vec![root_box(1.0)]
    }
  }

  pub fn add_box(&mut self, parent: NodeId, surface_area: f32) -> NodeId {
    push_child(&mut self.nodes, parent, NodeSnapshot::Box { surface_area, children: Vec::new() }, NodeType::Box32)
  }

  pub fn add_instance(&mut self, parent: NodeId, transform: InstanceTransform, blas_index: u32, instance_index: u32) -> NodeId {
    let mut flat = [0f32; 12];
    for (row_index, row) in transform.iter().enumerate() {
      flat[row_index * 4..row_index * 4 + 4].copy_from_slice(row);
    }
    push_child(&mut self.nodes, parent, NodeSnapshot::Instance {
      surface_area: 1.0,
      transform: flat,
      blas_index,
      instance_index
    }, NodeType::Instance)
  }

  fn build(self) -> TopLevelSnapshot {
    TopLevelSnapshot {
      nodes: self.nodes
    }
  }
}

/// Assembles traces in memory, mostly for tests and built-in scenes.
#[derive(Default)]
pub struct TraceBuilder {
  snapshot: TraceSnapshot
}

impl TraceBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn create_time(mut self, create_time: &str) -> Self {
    self.snapshot.create_time = Some(create_time.to_string());
    self
  }

  pub fn add_bottom_level(&mut self, bottom_level: BottomLevelBuilder) -> u32 {
    self.snapshot.bottom_levels.push(bottom_level.build());
    self.snapshot.bottom_levels.len() as u32 - 1
  }

  pub fn add_top_level(&mut self, top_level: TopLevelBuilder) -> u32 {
    self.snapshot.top_levels.push(top_level.build());
    self.snapshot.top_levels.len() as u32 - 1
  }

  pub fn add_dispatch(&mut self, width: u32, height: u32, depth: u32) {
    self.snapshot.dispatches.push(DispatchDimensions { width, height, depth });
  }

  pub fn snapshot(self) -> TraceSnapshot {
    self.snapshot
  }

  pub fn build(self) -> Result<SnapshotTrace, TraceError> {
    SnapshotTrace::from_snapshot(self.snapshot)
  }
}
