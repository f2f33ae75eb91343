use super::{TraceScene, Vertex};

/// One contiguous vertex buffer plus the tables shaders use to find their triangles in it.
/// Offsets are element indices, not bytes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneBuffers {
    pub vertices: Vec<Vertex>,
    /// First vertex of every bottom level hierarchy.
    pub blas_offsets: Vec<u32>,
    /// First vertex of the hierarchy referenced by every instance slot.
    pub instance_offsets: Vec<u32>,
}

impl SceneBuffers {
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }
}

pub fn flatten(scene: &TraceScene) -> SceneBuffers {
    let total_vertices: usize = scene.geometries().iter().map(|g| g.vertices().len()).sum();
    let mut buffers = SceneBuffers {
        vertices: Vec::with_capacity(total_vertices),
        blas_offsets: Vec::with_capacity(scene.geometries().len()),
        instance_offsets: Vec::with_capacity(scene.instances().len()),
    };

    for geometry in scene.geometries() {
        buffers.blas_offsets.push(buffers.vertices.len() as u32);
        buffers.vertices.extend_from_slice(geometry.vertices());
    }
    for instance in scene.instances() {
        buffers
            .instance_offsets
            .push(buffers.blas_offsets[instance.blas_index as usize]);
    }
    buffers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Geometry, Instance};

    fn triangles(count: usize, marker: f32) -> Geometry {
        Geometry::from_vertices(vec![Vertex::new(marker, 0.0, 0.0); count * 3])
    }

    #[test]
    fn offsets_are_prefix_sums() {
        let scene = TraceScene::new(
            vec![triangles(3, 0.0), triangles(1, 1.0), triangles(6, 2.0)],
            vec![
                Instance { blas_index: 2, ..Default::default() },
                Instance { blas_index: 0, ..Default::default() },
                Instance { blas_index: 1, ..Default::default() },
            ],
        )
        .unwrap();

        let buffers = flatten(&scene);
        assert_eq!(buffers.blas_offsets, vec![0, 9, 12]);
        assert_eq!(buffers.instance_offsets, vec![12, 0, 9]);
        assert_eq!(buffers.vertex_count(), 30);
        assert_eq!(buffers.vertices[9], Vertex::new(1.0, 0.0, 0.0));
        for (slot, instance) in scene.instances().iter().enumerate() {
            assert_eq!(buffers.instance_offsets[slot], buffers.blas_offsets[instance.blas_index as usize]);
        }
    }

    #[test]
    fn zero_filled_slots_point_at_first_hierarchy() {
        let mut instances = Vec::new();
        crate::scene::place_instance(&mut instances, 2, Instance { blas_index: 1, ..Default::default() });
        let scene = TraceScene::new(vec![triangles(1, 0.0), triangles(2, 1.0)], instances).unwrap();

        let buffers = flatten(&scene);
        assert_eq!(buffers.instance_offsets, vec![0, 0, 3]);
    }
}
