use serde::{Deserialize, Serialize};

const NODE_TYPE_BITS: u32 = 3;
const NODE_TYPE_MASK: u32 = (1 << NODE_TYPE_BITS) - 1;

const TYPE_TRIANGLE_0: u32 = 0;
const TYPE_TRIANGLE_3: u32 = 3;
const TYPE_BOX16: u32 = 4;
const TYPE_BOX32: u32 = 5;
const TYPE_INSTANCE: u32 = 6;
const TYPE_PROCEDURAL: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
  Triangle,
  Box16,
  Box32,
  Instance,
  Procedural
}

/// Node pointer as stored by the capture tool.
/// The low 3 bits hold the node type, the remaining bits the node index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
  /// Every hierarchy starts at the same root node.
  pub const ROOT: NodeId = NodeId(TYPE_BOX32);

  pub fn new(index: u32, node_type: NodeType) -> Self {
    let type_bits = match node_type {
      NodeType::Triangle => TYPE_TRIANGLE_0,
      NodeType::Box16 => TYPE_BOX16,
      NodeType::Box32 => TYPE_BOX32,
      NodeType::Instance => TYPE_INSTANCE,
      NodeType::Procedural => TYPE_PROCEDURAL,
    };
    NodeId((index << NODE_TYPE_BITS) | type_bits)
  }

  pub fn from_raw(raw: u32) -> Self {
    NodeId(raw)
  }

  pub fn raw(&self) -> u32 {
    self.0
  }

  pub fn index(&self) -> u32 {
    self.0 >> NODE_TYPE_BITS
  }

  pub fn node_type(&self) -> NodeType {
    match self.0 & NODE_TYPE_MASK {
      TYPE_TRIANGLE_0..=TYPE_TRIANGLE_3 => NodeType::Triangle,
      TYPE_BOX16 => NodeType::Box16,
      TYPE_BOX32 => NodeType::Box32,
      TYPE_INSTANCE => NodeType::Instance,
      _ => NodeType::Procedural,
    }
  }

  pub fn is_box(&self) -> bool {
    matches!(self.node_type(), NodeType::Box16 | NodeType::Box32)
  }

  pub fn is_triangle(&self) -> bool {
    self.node_type() == NodeType::Triangle
  }

  pub fn is_instance(&self) -> bool {
    self.node_type() == NodeType::Instance
  }

  pub fn is_procedural(&self) -> bool {
    self.node_type() == NodeType::Procedural
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn root_is_first_box32_node() {
    assert_eq!(NodeId::ROOT.index(), 0);
    assert_eq!(NodeId::ROOT.node_type(), NodeType::Box32);
    assert!(NodeId::ROOT.is_box());
  }

  #[test]
  fn all_triangle_type_codes_classify_as_triangle() {
    for code in 0..4 {
      let node = NodeId::from_raw((12 << 3) | code);
      assert!(node.is_triangle());
      assert_eq!(node.index(), 12);
    }
  }

  #[test]
  fn type_bits_survive_construction() {
    let instance = NodeId::new(7, NodeType::Instance);
    assert_eq!(instance.raw(), (7 << 3) | 6);
    assert!(instance.is_instance());
    assert!(!instance.is_box());

    let procedural = NodeId::new(3, NodeType::Procedural);
    assert!(procedural.is_procedural());
    assert_eq!(NodeId::new(1, NodeType::Box16).node_type(), NodeType::Box16);
  }
}
