use super::{Geometry, Instance, TraceScene, Vertex};

/// Corners of each face, counter-clockwise when seen from outside.
const FACES: [[[f32; 3]; 4]; 6] = [
    // Front
    [[-1.0, -1.0, 1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0]],
    // Back
    [[-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [1.0, 1.0, -1.0], [1.0, -1.0, -1.0]],
    // Top
    [[-1.0, 1.0, -1.0], [-1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, -1.0]],
    // Bottom
    [[-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [-1.0, -1.0, 1.0]],
    // Right
    [[1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0], [1.0, -1.0, 1.0]],
    // Left
    [[-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0], [-1.0, 1.0, -1.0]],
];

/// Built-in scene shown when no trace is configured: one unit cube, one instance.
pub fn cube_scene() -> TraceScene {
    let mut vertices = Vec::with_capacity(FACES.len() * 6);
    for [p0, p1, p2, p3] in FACES {
        for position in [p0, p1, p2, p0, p2, p3] {
            vertices.push(Vertex { position });
        }
    }
    let instance = Instance {
        transform: Instance::IDENTITY_TRANSFORM,
        blas_index: 0,
    };
    TraceScene {
        geometries: vec![Geometry::from_vertices(vertices)],
        instances: vec![instance],
    }
}
