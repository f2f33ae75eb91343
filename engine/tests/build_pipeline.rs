use std::sync::Arc;

use tracereplay_core::gpu::{AccelerationStructure as _, Buffer as _, MemoryUsage};
use tracereplay_engine::graphics::{slots, BuildError, BuildProgress};
use tracereplay_engine::scene::{flatten, ingest_trace, IngestError};
use tracereplay_engine::{load_scene, Camera, LoadError, LoadState, LoadedScene, NoCameraPresets, SceneSource};
use tracereplay_headless::{HeadlessBackend, HeadlessBindingTable, HeadlessDevice, HeadlessDeviceInfo, HeadlessEvent};
use tracereplay_trace::{BottomLevelBuilder, SnapshotTrace, TopLevelBuilder, TraceBuilder, Vec3};

const IDENTITY: [[f32; 4]; 3] = [[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0]];

fn triangles(count: usize) -> Vec<[Vec3; 3]> {
    (0..count)
        .map(|i| {
            let x = i as f32 * 2.0;
            [Vec3::new(x, 0.0, 0.0), Vec3::new(x, 1.0, 0.0), Vec3::new(x + 1.0, 0.0, 0.0)]
        })
        .collect()
}

/// Two hierarchies with 3 and 6 triangles, slot 0 uses hierarchy 1 and slot 1 hierarchy 0.
fn two_hierarchy_trace() -> SnapshotTrace {
    let mut builder = TraceBuilder::new().create_time("2024-01-01 12:00:00");
    builder.add_bottom_level(BottomLevelBuilder::from_triangles(&triangles(3)));
    builder.add_bottom_level(BottomLevelBuilder::from_triangles(&triangles(6)));
    let mut top_level = TopLevelBuilder::new();
    top_level.add_instance(tracereplay_trace::NodeId::ROOT, IDENTITY, 1, 0);
    top_level.add_instance(tracereplay_trace::NodeId::ROOT, IDENTITY, 0, 1);
    builder.add_top_level(top_level);
    builder.build().unwrap()
}

fn device(info: HeadlessDeviceInfo) -> (Arc<HeadlessDevice>, HeadlessBindingTable) {
    let device = Arc::new(HeadlessDevice::new(info).unwrap());
    let binding_table = device.create_binding_table();
    (device, binding_table)
}

fn load(
    device: &Arc<HeadlessDevice>,
    binding_table: &HeadlessBindingTable,
    source: SceneSource,
) -> Result<LoadedScene<HeadlessBackend>, LoadError> {
    let progress = BuildProgress::default();
    load_scene::<HeadlessBackend>(device, binding_table, source, &NoCameraPresets, &progress, |_| {})
}

#[test]
fn flattened_offsets_of_two_hierarchies() {
    let scene = ingest_trace(&two_hierarchy_trace()).unwrap();
    let buffers = flatten(&scene);
    assert_eq!(buffers.blas_offsets, vec![0, 9]);
    assert_eq!(buffers.instance_offsets, vec![9, 0]);
    assert_eq!(buffers.vertex_count(), 27);
}

#[test]
fn builds_and_binds_two_hierarchies() {
    let (device, binding_table) = device(HeadlessDeviceInfo::default());
    let progress = BuildProgress::default();
    let mut states = Vec::new();
    let loaded = load_scene::<HeadlessBackend>(
        &device,
        &binding_table,
        SceneSource::Trace(Box::new(two_hierarchy_trace())),
        &NoCameraPresets,
        &progress,
        |state| states.push(state),
    )
    .unwrap();
    let resources = &loaded.resources;
    assert_eq!(states, vec![LoadState::Building]);
    assert_eq!(loaded.camera, Camera::trace_default());

    assert_eq!(progress.bottom_levels_total(), 2);
    assert_eq!(progress.bottom_levels_built(), 2);
    assert!(progress.top_level_built());

    assert_eq!(resources.bottom_levels().len(), 2);
    assert_eq!(resources.vertex_count(), 27);
    assert_eq!(resources.instance_count(), 2);

    let offsets: Vec<u32> = bytemuck::pod_collect_to_vec(&resources.instance_offset_buffer().contents());
    assert_eq!(offsets, vec![9, 0]);
    assert_eq!(resources.vertex_buffer().info().size, 27 * 12);

    assert_eq!(binding_table.acceleration_structure(slots::ACCELERATION_STRUCTURE), Some(resources.top_level().va()));
    let vertices = binding_table.structured_buffer(slots::VERTICES).unwrap();
    assert_eq!((vertices.va, vertices.element_count, vertices.stride), (resources.vertex_buffer().va(), 27, 12));
    let instance_offsets = binding_table.structured_buffer(slots::INSTANCE_OFFSETS).unwrap();
    assert_eq!((instance_offsets.element_count, instance_offsets.stride), (2, 4));

    let events = device.events();
    let descriptors = events
        .iter()
        .find_map(|e| match e {
            HeadlessEvent::TopLevelBuilt { va, instances } => {
                assert_eq!(*va, resources.top_level().va());
                Some(instances.clone())
            }
            _ => None,
        })
        .unwrap();
    assert_eq!(descriptors.len(), 2);
    assert_eq!(descriptors[0].id(), 0);
    assert_eq!(descriptors[0].mask(), 0xFF);
    assert_eq!(descriptors[0].acceleration_structure, resources.bottom_levels()[1].va());
    assert_eq!(descriptors[1].id(), 1);
    assert_eq!(descriptors[1].acceleration_structure, resources.bottom_levels()[0].va());
    assert_eq!(descriptors[0].transform[0], 1.0);
    assert_eq!(descriptors[0].transform[5], 1.0);
}

#[test]
fn top_level_waits_for_every_bottom_level() {
    let (device, binding_table) = device(HeadlessDeviceInfo::default());
    load(&device, &binding_table, SceneSource::Trace(Box::new(two_hierarchy_trace()))).unwrap();

    let events = device.events();
    let submitted = events
        .iter()
        .position(|e| matches!(e, HeadlessEvent::TopLevelSubmitted { .. }))
        .unwrap();
    assert_eq!(
        events[submitted],
        HeadlessEvent::TopLevelSubmitted {
            instance_count: 2,
            all_bottom_levels_complete: true,
        }
    );

    let bottom_levels: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, HeadlessEvent::BottomLevelBuilt { .. }))
        .map(|(index, _)| index)
        .collect();
    assert_eq!(bottom_levels.len(), 2);
    assert!(bottom_levels.iter().all(|index| *index < submitted));

    let vertex_counts: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            HeadlessEvent::BottomLevelBuilt { vertex_count, .. } => Some(*vertex_count),
            _ => None,
        })
        .collect();
    assert_eq!(vertex_counts, vec![9, 18]);
}

#[test]
fn scratch_memory_is_released() {
    let (device, binding_table) = device(HeadlessDeviceInfo::default());
    let loaded = load(&device, &binding_table, SceneSource::Trace(Box::new(two_hierarchy_trace()))).unwrap();

    let events = device.events();
    let destroyed = |name: &str| {
        events
            .iter()
            .filter(|e| matches!(e, HeadlessEvent::BufferDestroyed { name: Some(n), .. } if n == name))
            .count()
    };
    assert_eq!(destroyed("TopLevelScratch"), 1);
    assert_eq!(destroyed("BottomLevelScratch"), 2);
    assert_eq!(destroyed("TopLevelAccelerationStructure"), 0);
    assert_eq!(destroyed("BottomLevelAccelerationStructure"), 0);
    assert_eq!(loaded.resources.top_level().buffer().name(), Some("TopLevelAccelerationStructure"));
    for bottom_level in loaded.resources.bottom_levels() {
        assert_eq!(bottom_level.buffer().name(), Some("BottomLevelAccelerationStructure"));
    }

    let scratch_created = events.iter().any(|e| {
        matches!(
            e,
            HeadlessEvent::BufferCreated { name: Some(n), memory_usage: MemoryUsage::GPUMemory, .. } if n == "TopLevelScratch"
        )
    });
    assert!(scratch_created);

    let in_use = device.allocated_memory();
    drop(loaded);
    assert!(device.allocated_memory() < in_use);
}

#[test]
fn invalid_root_area_aborts_before_any_gpu_work() {
    let mut builder = TraceBuilder::new();
    builder.add_bottom_level(BottomLevelBuilder::new(0.0));
    builder.add_bottom_level(BottomLevelBuilder::from_triangles(&triangles(1)));
    let mut top_level = TopLevelBuilder::new();
    top_level.add_instance(tracereplay_trace::NodeId::ROOT, IDENTITY, 1, 0);
    builder.add_top_level(top_level);
    let trace = builder.build().unwrap();

    let (device, binding_table) = device(HeadlessDeviceInfo::default());
    let error = match load(&device, &binding_table, SceneSource::Trace(Box::new(trace))) {
        Err(error) => error,
        Ok(_) => panic!("Loading a trace with an empty first hierarchy succeeded"),
    };
    assert!(matches!(error, LoadError::Ingest(IngestError::InvalidRootSurfaceArea { .. })));
    assert!(!error.is_fatal());

    assert!(device.events().iter().all(|e| !matches!(
        e,
        HeadlessEvent::BufferCreated { .. } | HeadlessEvent::BottomLevelBuilt { .. } | HeadlessEvent::TopLevelSubmitted { .. }
    )));
    assert!(binding_table.acceleration_structure(slots::ACCELERATION_STRUCTURE).is_none());
}

#[test]
fn missing_trace_file_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let (device, binding_table) = device(HeadlessDeviceInfo::default());
    let error = match load(&device, &binding_table, SceneSource::TraceFile(dir.path().join("missing.json"))) {
        Err(error) => error,
        Ok(_) => panic!("Loading a missing trace succeeded"),
    };
    assert!(!error.is_fatal());
    assert_ne!(error.code(), 0);
    assert!(device.events().is_empty());
}

#[test]
fn out_of_memory_is_a_fatal_build_error() {
    let (device, binding_table) = device(HeadlessDeviceInfo {
        supports_ray_tracing: true,
        memory_budget: Some(64),
        record_events: true,
    });
    let error = match load(&device, &binding_table, SceneSource::Trace(Box::new(two_hierarchy_trace()))) {
        Err(error) => error,
        Ok(_) => panic!("The build fit into 64 bytes"),
    };
    assert!(matches!(error, LoadError::Build(BuildError::OutOfMemory(_))));
    assert!(error.is_fatal());
}

#[test]
fn devices_without_ray_tracing_fail_the_build() {
    let (device, binding_table) = device(HeadlessDeviceInfo {
        supports_ray_tracing: false,
        memory_budget: None,
        record_events: true,
    });
    let error = match load(&device, &binding_table, SceneSource::BuiltinCube) {
        Err(error) => error,
        Ok(_) => panic!("Built acceleration structures without ray tracing support"),
    };
    assert!(matches!(error, LoadError::Build(BuildError::RayTracingUnsupported)));
}

#[test]
fn builtin_cube_loads_with_its_camera() {
    let (device, binding_table) = device(HeadlessDeviceInfo::default());
    let loaded = load(&device, &binding_table, SceneSource::BuiltinCube).unwrap();
    assert_eq!(loaded.resources.vertex_count(), 36);
    assert_eq!(loaded.resources.instance_count(), 1);
    assert_eq!(loaded.camera, Camera::cube_default());
}

#[test]
fn trace_files_load_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.json");
    two_hierarchy_trace().snapshot().save(&path).unwrap();

    let (device, binding_table) = device(HeadlessDeviceInfo::default());
    let loaded = load(&device, &binding_table, SceneSource::TraceFile(path)).unwrap();
    assert_eq!(loaded.resources.vertex_count(), 27);
    assert_eq!(loaded.resources.instance_count(), 2);
}
