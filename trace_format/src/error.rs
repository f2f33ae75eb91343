use std::fmt::{Display, Formatter};
use std::io::Error as IOError;
use std::path::PathBuf;

use crate::NodeId;

#[derive(Debug)]
pub enum TraceError {
  NotFound(PathBuf),
  IOError(IOError),
  Format(serde_json::Error),
  InvalidBvh(String),
  InvalidHierarchy(u32),
  InvalidNode {
    hierarchy: u32,
    node: NodeId
  }
}

impl TraceError {
  /// Non-zero loader status reported alongside the diagnostic.
  pub fn code(&self) -> i32 {
    match self {
      TraceError::NotFound(_) => 1,
      TraceError::IOError(_) => 2,
      TraceError::Format(_) => 3,
      TraceError::InvalidBvh(_) => 4,
      TraceError::InvalidHierarchy(_) => 5,
      TraceError::InvalidNode { .. } => 6,
    }
  }
}

impl Display for TraceError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      TraceError::NotFound(path) => write!(f, "Trace file not found: {}", path.display()),
      TraceError::IOError(e) => write!(f, "Failed to read trace: {}", e),
      TraceError::Format(e) => write!(f, "Malformed trace: {}", e),
      TraceError::InvalidBvh(reason) => write!(f, "Invalid BVH: {}", reason),
      TraceError::InvalidHierarchy(index) => write!(f, "Hierarchy {} does not exist", index),
      TraceError::InvalidNode { hierarchy, node } => write!(f, "Node {:#x} does not exist in hierarchy {}", node.raw(), hierarchy),
    }
  }
}

impl std::error::Error for TraceError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      TraceError::IOError(e) => Some(e),
      TraceError::Format(e) => Some(e),
      _ => None
    }
  }
}

impl From<IOError> for TraceError {
  fn from(e: IOError) -> Self {
    TraceError::IOError(e)
  }
}

impl From<serde_json::Error> for TraceError {
  fn from(e: serde_json::Error) -> Self {
    TraceError::Format(e)
  }
}
