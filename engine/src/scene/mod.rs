use bytemuck::{Pod, Zeroable};
use log::warn;
use tracereplay_trace::{InstanceTransform, Vec3};

pub use self::cube::cube_scene;
pub use self::diagnostics::log_trace_summary;
pub use self::flatten::{flatten, SceneBuffers};
pub use self::ingest::{ingest_trace, IngestError};

mod cube;
mod diagnostics;
mod flatten;
mod ingest;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { position: [x, y, z] }
    }
}

impl From<Vec3> for Vertex {
    fn from(v: Vec3) -> Self {
        Self { position: v.to_array() }
    }
}

/// Substituted for hierarchies without a single valid triangle so every build gets input.
pub const PLACEHOLDER_TRIANGLE: [Vertex; 3] = [
    Vertex::new(0.0, 0.0, 0.0),
    Vertex::new(0.0, 1.0, 0.0),
    Vertex::new(1.0, 0.0, 0.0),
];

/// Triangle list of one bottom level hierarchy. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    vertices: Vec<Vertex>,
}

impl Geometry {
    pub fn from_vertices(vertices: Vec<Vertex>) -> Self {
        debug_assert_eq!(vertices.len() % 3, 0);
        if vertices.is_empty() {
            return Self::placeholder();
        }
        Self { vertices }
    }

    pub fn placeholder() -> Self {
        Self {
            vertices: PLACEHOLDER_TRIANGLE.to_vec(),
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn is_placeholder(&self) -> bool {
        self.vertices == PLACEHOLDER_TRIANGLE
    }
}

/// Zeroed instances fill slots the trace never populated.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Instance {
    pub transform: InstanceTransform,
    pub blas_index: u32,
}

impl Instance {
    pub const IDENTITY_TRANSFORM: InstanceTransform = [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
    ];
}

/// Writes `instance` at `slot`, growing the array with zeroed instances as needed.
pub fn place_instance(instances: &mut Vec<Instance>, slot: u32, instance: Instance) {
    let slot = slot as usize;
    if slot >= instances.len() {
        instances.resize(slot + 1, Instance::default());
    } else if instances[slot] != Instance::default() {
        warn!("Instance slot {} is populated twice, keeping the last one", slot);
    }
    instances[slot] = instance;
}

/// Everything ingestion extracted from a trace, ready to be flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceScene {
    geometries: Vec<Geometry>,
    instances: Vec<Instance>,
}

impl TraceScene {
    pub fn new(geometries: Vec<Geometry>, instances: Vec<Instance>) -> Result<Self, IngestError> {
        let bottom_level_count = geometries.len() as u32;
        if let Some((slot, instance)) = instances
            .iter()
            .enumerate()
            .find(|(_, instance)| instance.blas_index >= bottom_level_count)
        {
            return Err(IngestError::BottomLevelOutOfRange {
                slot: slot as u32,
                blas_index: instance.blas_index,
                bottom_level_count,
            });
        }
        Ok(Self {
            geometries,
            instances,
        })
    }

    pub fn geometries(&self) -> &[Geometry] {
        &self.geometries
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }
}
