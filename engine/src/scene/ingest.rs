use std::collections::VecDeque;
use std::fmt::{Display, Formatter};

use log::{debug, info, trace, warn};
use tracereplay_trace::{NodeId, Trace, TraceError, Vec3};

use super::{place_instance, Geometry, Instance, TraceScene, Vertex};

#[derive(Debug)]
pub enum IngestError {
    Trace(TraceError),
    InvalidRootSurfaceArea {
        surface_area: f32,
    },
    MissingTopLevel,
    BottomLevelOutOfRange {
        slot: u32,
        blas_index: u32,
        bottom_level_count: u32,
    },
    InstanceSlotOutOfRange {
        slot: u32,
    },
}

/// Instance ids are 24 bits wide in the top level instance descriptor.
pub const MAX_INSTANCE_SLOTS: u32 = 1 << 24;

impl IngestError {
    /// Non-zero status reported with the diagnostic.
    pub fn code(&self) -> i32 {
        match self {
            IngestError::Trace(e) => e.code(),
            IngestError::InvalidRootSurfaceArea { .. } => 10,
            IngestError::MissingTopLevel => 11,
            IngestError::BottomLevelOutOfRange { .. } => 12,
            IngestError::InstanceSlotOutOfRange { .. } => 13,
        }
    }
}

impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::Trace(e) => write!(f, "{}", e),
            IngestError::InvalidRootSurfaceArea { surface_area } => {
                write!(f, "Root node of bottom level hierarchy 0 has invalid surface area {}", surface_area)
            }
            IngestError::MissingTopLevel => write!(f, "Trace has no top level hierarchy"),
            IngestError::BottomLevelOutOfRange { slot, blas_index, bottom_level_count } => write!(
                f,
                "Instance slot {} references bottom level hierarchy {} but the trace only has {}",
                slot, blas_index, bottom_level_count
            ),
            IngestError::InstanceSlotOutOfRange { slot } => {
                write!(f, "Instance slot {} does not fit into the {} slots of a top level hierarchy", slot, MAX_INSTANCE_SLOTS)
            }
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IngestError::Trace(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TraceError> for IngestError {
    fn from(e: TraceError) -> Self {
        IngestError::Trace(e)
    }
}

enum SkippedLeaf {
    NonPositiveSurfaceArea(f32),
    TriangleCount(u32),
    Unreadable(TraceError),
}

impl Display for SkippedLeaf {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SkippedLeaf::NonPositiveSurfaceArea(area) => write!(f, "surface area {} is not positive", area),
            SkippedLeaf::TriangleCount(count) => write!(f, "holds {} triangles", count),
            SkippedLeaf::Unreadable(e) => write!(f, "{}", e),
        }
    }
}

impl From<TraceError> for SkippedLeaf {
    fn from(e: TraceError) -> Self {
        SkippedLeaf::Unreadable(e)
    }
}

/// Appends the triangles of a leaf. A two triangle leaf `[a, b, c, d]` yields `(a, b, c)`
/// followed by `(b, d, c)` to keep both triangles facing the same way.
pub(crate) fn push_leaf_triangles(vertices: &mut Vec<Vertex>, leaf: &[Vec3]) {
    match leaf {
        [a, b, c] => {
            vertices.extend_from_slice(&[(*a).into(), (*b).into(), (*c).into()]);
        }
        [a, b, c, d] => {
            vertices.extend_from_slice(&[(*a).into(), (*b).into(), (*c).into()]);
            vertices.extend_from_slice(&[(*b).into(), (*d).into(), (*c).into()]);
        }
        _ => unreachable!("Leaf with {} vertices", leaf.len()),
    }
}

fn read_triangle_leaf(trace: &dyn Trace, blas: u32, node: NodeId, vertices: &mut Vec<Vertex>) -> Result<u32, SkippedLeaf> {
    let surface_area = trace.bottom_level_surface_area(blas, node)?;
    if !(surface_area > 0.0) {
        return Err(SkippedLeaf::NonPositiveSurfaceArea(surface_area));
    }
    let triangle_count = trace.bottom_level_triangle_count(blas, node)?;
    if triangle_count == 0 || triangle_count > 2 {
        return Err(SkippedLeaf::TriangleCount(triangle_count));
    }
    let vertex_count = if triangle_count == 1 { 3 } else { 4 };
    let leaf = trace.bottom_level_vertices(blas, node)?;
    if leaf.len() < vertex_count {
        return Err(SkippedLeaf::Unreadable(TraceError::InvalidNode { hierarchy: blas, node }));
    }
    push_leaf_triangles(vertices, &leaf[..vertex_count]);
    Ok(triangle_count)
}

pub(crate) fn ingest_bottom_level(trace: &dyn Trace, blas: u32) -> Result<Geometry, IngestError> {
    let root = trace.root_node();
    if blas == 0 {
        let surface_area = trace.bottom_level_surface_area(blas, root)?;
        if !(surface_area > 0.0) {
            return Err(IngestError::InvalidRootSurfaceArea { surface_area });
        }
    }

    let mut vertices = Vec::<Vertex>::new();
    let mut skipped_leaves = 0u32;
    let mut queue = VecDeque::<NodeId>::new();
    queue.push_back(root);
    while let Some(node) = queue.pop_front() {
        let children = match trace.bottom_level_children(blas, node) {
            Ok(children) => children,
            Err(e) => {
                warn!("Skipping node {:#x} of bottom level hierarchy {}: {}", node.raw(), blas, e);
                continue;
            }
        };
        for child in children {
            if child.is_box() {
                queue.push_back(child);
            } else if child.is_triangle() {
                if let Err(reason) = read_triangle_leaf(trace, blas, child, &mut vertices) {
                    warn!("Skipping triangle node {:#x} of bottom level hierarchy {}: {}", child.raw(), blas, reason);
                    skipped_leaves += 1;
                }
            } else if child.is_procedural() {
                trace!("Ignoring procedural node {:#x} of bottom level hierarchy {}", child.raw(), blas);
            } else {
                warn!("Unexpected instance node {:#x} in bottom level hierarchy {}", child.raw(), blas);
            }
        }
    }

    if vertices.is_empty() {
        warn!("Bottom level hierarchy {} has no valid triangles, using a placeholder triangle", blas);
    }
    debug!(
        "Bottom level hierarchy {}: {} triangles, {} leaves skipped",
        blas,
        vertices.len() / 3,
        skipped_leaves
    );
    Ok(Geometry::from_vertices(vertices))
}

fn read_instance(trace: &dyn Trace, tlas: u32, node: NodeId) -> Result<(u32, Instance), TraceError> {
    let transform = trace.instance_transform(tlas, node)?;
    let blas_index = trace.instance_blas_index(tlas, node)?;
    let slot = trace.instance_index(tlas, node)?;
    Ok((slot, Instance { transform, blas_index }))
}

pub(crate) fn ingest_top_level(trace: &dyn Trace, tlas: u32) -> Result<Vec<Instance>, IngestError> {
    let mut instances = Vec::<Instance>::new();
    let mut queue = VecDeque::<NodeId>::new();
    queue.push_back(trace.root_node());
    while let Some(node) = queue.pop_front() {
        let children = match trace.top_level_children(tlas, node) {
            Ok(children) => children,
            Err(e) => {
                warn!("Skipping node {:#x} of top level hierarchy {}: {}", node.raw(), tlas, e);
                continue;
            }
        };
        for child in children {
            if child.is_box() {
                queue.push_back(child);
            } else if child.is_instance() {
                match read_instance(trace, tlas, child) {
                    Ok((slot, _)) if slot >= MAX_INSTANCE_SLOTS => {
                        return Err(IngestError::InstanceSlotOutOfRange { slot });
                    }
                    Ok((slot, instance)) => place_instance(&mut instances, slot, instance),
                    Err(e) => warn!("Skipping instance node {:#x}: {}", child.raw(), e),
                }
            } else {
                warn!("Unexpected node {:#x} in top level hierarchy {}", child.raw(), tlas);
            }
        }
    }
    Ok(instances)
}

/// Extracts the geometry of every bottom level hierarchy and the instances of the first
/// top level hierarchy.
pub fn ingest_trace(trace: &dyn Trace) -> Result<TraceScene, IngestError> {
    let bottom_level_count = trace.bottom_level_count();
    let mut geometries = Vec::with_capacity(bottom_level_count as usize);
    for blas in 0..bottom_level_count {
        geometries.push(ingest_bottom_level(trace, blas)?);
    }

    let top_level_count = trace.top_level_count();
    if top_level_count == 0 {
        return Err(IngestError::MissingTopLevel);
    }
    if top_level_count > 1 {
        warn!("Trace contains {} top level hierarchies, only the first one is used", top_level_count);
    }
    let instances = ingest_top_level(trace, 0)?;

    let triangle_count: u32 = geometries.iter().map(|g| g.vertex_count() / 3).sum();
    info!(
        "Ingested {} bottom level hierarchies with {} triangles and {} instance slots",
        geometries.len(),
        triangle_count,
        instances.len()
    );
    TraceScene::new(geometries, instances)
}

#[cfg(test)]
mod tests {
    use tracereplay_trace::{BottomLevelBuilder, NodeId, TopLevelBuilder, TraceBuilder};

    use super::*;
    use crate::scene::PLACEHOLDER_TRIANGLE;

    fn single_instance_top_level(blas_index: u32) -> TopLevelBuilder {
        let mut top_level = TopLevelBuilder::new();
        top_level.add_instance(NodeId::ROOT, Instance::IDENTITY_TRANSFORM, blas_index, 0);
        top_level
    }

    #[test]
    fn two_triangle_leaf_flips_second_winding() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 1.0, 0.0);
        let d = Vec3::new(1.0, 1.0, 0.0);
        let mut vertices = Vec::new();
        push_leaf_triangles(&mut vertices, &[a, b, c, d]);
        let expected: Vec<Vertex> = [a, b, c, b, d, c].iter().map(|v| Vertex::from(*v)).collect();
        assert_eq!(vertices, expected);
    }

    #[test]
    fn traversal_reaches_nested_leaves_breadth_first() {
        let mut bottom_level = BottomLevelBuilder::new(4.0);
        let inner = bottom_level.add_box(NodeId::ROOT, 2.0);
        bottom_level.add_triangles(inner, 1.0, &[Vec3::X, Vec3::Y, Vec3::Z]);
        bottom_level.add_triangles(NodeId::ROOT, 1.0, &[Vec3::ZERO, Vec3::X, Vec3::Y]);
        let mut builder = TraceBuilder::new();
        builder.add_bottom_level(bottom_level);
        let trace = builder.build().unwrap();

        let geometry = ingest_bottom_level(&trace, 0).unwrap();
        // The root's own leaf comes before the leaf one level down.
        assert_eq!(geometry.vertices()[0], Vertex::from(Vec3::ZERO));
        assert_eq!(geometry.vertices()[3], Vertex::from(Vec3::X));
        assert_eq!(geometry.vertex_count(), 6);
    }

    #[test]
    fn degenerate_leaves_are_skipped() {
        let mut bottom_level = BottomLevelBuilder::new(1.0);
        bottom_level.add_triangles(NodeId::ROOT, 0.0, &[Vec3::ZERO, Vec3::X, Vec3::Y]);
        bottom_level.add_triangles(NodeId::ROOT, -1.0, &[Vec3::ZERO, Vec3::X, Vec3::Y]);
        bottom_level.add_triangles(NodeId::ROOT, 0.5, &[Vec3::ZERO, Vec3::X, Vec3::Y]);
        bottom_level.add_triangles(NodeId::ROOT, 0.5, &[Vec3::ZERO, Vec3::X]);
        bottom_level.add_procedural(NodeId::ROOT, 1.0);
        let mut builder = TraceBuilder::new();
        builder.add_bottom_level(bottom_level);
        let trace = builder.build().unwrap();

        let geometry = ingest_bottom_level(&trace, 0).unwrap();
        assert_eq!(geometry.vertex_count(), 3);
        assert!(!geometry.is_placeholder());
    }

    #[test]
    fn hierarchy_without_valid_leaves_gets_placeholder() {
        let mut builder = TraceBuilder::new();
        builder.add_bottom_level(BottomLevelBuilder::from_triangles(&[[Vec3::ZERO, Vec3::X, Vec3::Y]]));
        let mut invalid = BottomLevelBuilder::new(0.0);
        invalid.add_triangles(NodeId::ROOT, 0.0, &[Vec3::ZERO, Vec3::X, Vec3::X]);
        builder.add_bottom_level(invalid);
        builder.add_top_level(single_instance_top_level(1));
        let trace = builder.build().unwrap();

        let scene = ingest_trace(&trace).unwrap();
        assert_eq!(scene.geometries()[1].vertices(), &PLACEHOLDER_TRIANGLE);
        assert_eq!(scene.geometries()[0].vertex_count() % 3, 0);
        assert_ne!(scene.geometries()[0].vertex_count(), 0);
    }

    #[test]
    fn root_area_only_fatal_for_first_hierarchy() {
        let mut builder = TraceBuilder::new();
        builder.add_bottom_level(BottomLevelBuilder::new(0.0));
        builder.add_top_level(single_instance_top_level(0));
        let error = ingest_trace(&builder.build().unwrap()).unwrap_err();
        assert!(matches!(error, IngestError::InvalidRootSurfaceArea { .. }));
        assert_ne!(error.code(), 0);

        let mut builder = TraceBuilder::new();
        builder.add_bottom_level(BottomLevelBuilder::from_triangles(&[[Vec3::ZERO, Vec3::X, Vec3::Y]]));
        builder.add_bottom_level(BottomLevelBuilder::new(0.0));
        builder.add_top_level(single_instance_top_level(1));
        let scene = ingest_trace(&builder.build().unwrap()).unwrap();
        assert!(scene.geometries()[1].is_placeholder());
    }

    #[test]
    fn instances_land_in_their_slots() {
        let mut builder = TraceBuilder::new();
        builder.add_bottom_level(BottomLevelBuilder::from_triangles(&[[Vec3::ZERO, Vec3::X, Vec3::Y]]));
        builder.add_bottom_level(BottomLevelBuilder::from_triangles(&[[Vec3::ZERO, Vec3::Y, Vec3::Z]]));
        let mut top_level = TopLevelBuilder::new();
        let inner = top_level.add_box(NodeId::ROOT, 1.0);
        top_level.add_instance(inner, Instance::IDENTITY_TRANSFORM, 0, 5);
        top_level.add_instance(NodeId::ROOT, Instance::IDENTITY_TRANSFORM, 1, 2);
        builder.add_top_level(top_level);
        builder.add_top_level(single_instance_top_level(0));
        let trace = builder.build().unwrap();

        let scene = ingest_trace(&trace).unwrap();
        let instances = scene.instances();
        assert_eq!(instances.len(), 6);
        assert_eq!(instances[5].blas_index, 0);
        assert_eq!(instances[2].blas_index, 1);
        assert_eq!(instances[0], Instance::default());
    }

    #[test]
    fn instance_slots_beyond_the_id_range_are_rejected() {
        let mut builder = TraceBuilder::new();
        builder.add_bottom_level(BottomLevelBuilder::from_triangles(&[[Vec3::ZERO, Vec3::X, Vec3::Y]]));
        let mut top_level = TopLevelBuilder::new();
        top_level.add_instance(NodeId::ROOT, Instance::IDENTITY_TRANSFORM, 0, u32::MAX);
        builder.add_top_level(top_level);
        let error = ingest_trace(&builder.build().unwrap()).unwrap_err();
        assert!(matches!(error, IngestError::InstanceSlotOutOfRange { slot: u32::MAX }));
        assert_eq!(error.code(), 13);

        let mut builder = TraceBuilder::new();
        builder.add_bottom_level(BottomLevelBuilder::from_triangles(&[[Vec3::ZERO, Vec3::X, Vec3::Y]]));
        let mut top_level = TopLevelBuilder::new();
        top_level.add_instance(NodeId::ROOT, Instance::IDENTITY_TRANSFORM, 0, MAX_INSTANCE_SLOTS);
        builder.add_top_level(top_level);
        assert!(matches!(
            ingest_trace(&builder.build().unwrap()),
            Err(IngestError::InstanceSlotOutOfRange { .. })
        ));
    }

    #[test]
    fn missing_top_level_aborts() {
        let mut builder = TraceBuilder::new();
        builder.add_bottom_level(BottomLevelBuilder::from_triangles(&[[Vec3::ZERO, Vec3::X, Vec3::Y]]));
        let error = ingest_trace(&builder.build().unwrap()).unwrap_err();
        assert!(matches!(error, IngestError::MissingTopLevel));
    }
}
