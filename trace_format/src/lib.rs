pub use self::node::{NodeId, NodeType};
pub use self::error::TraceError;
pub use self::trace::{Trace, BottomLevelInfo, DispatchDimensions, InstanceTransform};
pub use self::snapshot::{SnapshotTrace, TraceSnapshot, BottomLevelSnapshot, TopLevelSnapshot, NodeSnapshot};
pub use self::builder::{TraceBuilder, BottomLevelBuilder, TopLevelBuilder};

pub use bevy_math::Vec3;

mod node;
mod error;
mod trace;
mod snapshot;
mod builder;
