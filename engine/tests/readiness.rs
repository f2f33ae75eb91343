use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use smallvec::SmallVec;
use tracereplay_core::gpu::RayGenerationShader;
use tracereplay_engine::graphics::RenderContext;
use tracereplay_engine::renderer::PLACEHOLDER_CLEAR_COLOR;
use tracereplay_engine::{LoadState, NoCameraPresets, RenderSettings, Renderer, SceneLoader, SceneSource};
use tracereplay_headless::{HeadlessBackend, HeadlessDevice, HeadlessDeviceInfo, HeadlessEvent};
use tracereplay_trace::{
    BottomLevelBuilder,
    BottomLevelInfo,
    DispatchDimensions,
    InstanceTransform,
    NodeId,
    SnapshotTrace,
    TopLevelBuilder,
    Trace,
    TraceBuilder,
    TraceError,
    Vec3,
};

const IDENTITY: [[f32; 4]; 3] = [[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0]];

/// Forwards to a snapshot. A gated trace blocks the first query until the test drops the
/// matching sender, a broken one panics while walking a bottom level hierarchy.
struct WrappedTrace {
    inner: SnapshotTrace,
    gate: Option<Receiver<()>>,
    broken: bool,
}

impl WrappedTrace {
    fn gated(inner: SnapshotTrace) -> (Self, Sender<()>) {
        let (release, gate) = bounded(0);
        (
            Self {
                inner,
                gate: Some(gate),
                broken: false,
            },
            release,
        )
    }

    fn broken(inner: SnapshotTrace) -> Self {
        Self {
            inner,
            gate: None,
            broken: true,
        }
    }
}

impl Trace for WrappedTrace {
    fn create_time(&self) -> Option<&str> {
        if let Some(gate) = &self.gate {
            let _ = gate.recv();
        }
        self.inner.create_time()
    }

    fn top_level_count(&self) -> u32 {
        self.inner.top_level_count()
    }

    fn bottom_level_count(&self) -> u32 {
        self.inner.bottom_level_count()
    }

    fn bottom_level_info(&self, blas: u32) -> Result<BottomLevelInfo, TraceError> {
        self.inner.bottom_level_info(blas)
    }

    fn bottom_level_child_count(&self, blas: u32, node: NodeId) -> Result<u32, TraceError> {
        self.inner.bottom_level_child_count(blas, node)
    }

    fn bottom_level_children(&self, blas: u32, node: NodeId) -> Result<SmallVec<[NodeId; 8]>, TraceError> {
        if self.broken {
            panic!("Corrupt child list in bottom level hierarchy {}", blas);
        }
        self.inner.bottom_level_children(blas, node)
    }

    fn bottom_level_surface_area(&self, blas: u32, node: NodeId) -> Result<f32, TraceError> {
        self.inner.bottom_level_surface_area(blas, node)
    }

    fn bottom_level_triangle_count(&self, blas: u32, node: NodeId) -> Result<u32, TraceError> {
        self.inner.bottom_level_triangle_count(blas, node)
    }

    fn bottom_level_vertices(&self, blas: u32, node: NodeId) -> Result<SmallVec<[Vec3; 4]>, TraceError> {
        self.inner.bottom_level_vertices(blas, node)
    }

    fn top_level_child_count(&self, tlas: u32, node: NodeId) -> Result<u32, TraceError> {
        self.inner.top_level_child_count(tlas, node)
    }

    fn top_level_children(&self, tlas: u32, node: NodeId) -> Result<SmallVec<[NodeId; 8]>, TraceError> {
        self.inner.top_level_children(tlas, node)
    }

    fn top_level_surface_area(&self, tlas: u32, node: NodeId) -> Result<f32, TraceError> {
        self.inner.top_level_surface_area(tlas, node)
    }

    fn instance_transform(&self, tlas: u32, node: NodeId) -> Result<InstanceTransform, TraceError> {
        self.inner.instance_transform(tlas, node)
    }

    fn instance_blas_index(&self, tlas: u32, node: NodeId) -> Result<u32, TraceError> {
        self.inner.instance_blas_index(tlas, node)
    }

    fn instance_index(&self, tlas: u32, node: NodeId) -> Result<u32, TraceError> {
        self.inner.instance_index(tlas, node)
    }

    fn dispatch_count(&self) -> u32 {
        self.inner.dispatch_count()
    }

    fn dispatch_dimensions(&self, dispatch: u32) -> Result<DispatchDimensions, TraceError> {
        self.inner.dispatch_dimensions(dispatch)
    }
}

fn small_trace() -> SnapshotTrace {
    let mut builder = TraceBuilder::new();
    builder.add_bottom_level(BottomLevelBuilder::from_triangles(&[[
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
    ]]));
    let mut top_level = TopLevelBuilder::new();
    top_level.add_instance(NodeId::ROOT, IDENTITY, 0, 0);
    builder.add_top_level(top_level);
    builder.add_dispatch(64, 48, 1);
    builder.build().unwrap()
}

fn renderer(source: SceneSource, settings: RenderSettings) -> (Arc<HeadlessDevice>, Renderer<HeadlessBackend>) {
    let device = Arc::new(HeadlessDevice::new(HeadlessDeviceInfo::default()).unwrap());
    let swapchain = Arc::new(device.create_swapchain(64, 48, 2));
    let binding_table = Arc::new(device.create_binding_table());
    let loader = SceneLoader::<HeadlessBackend>::spawn(&device, &binding_table, source, Box::new(NoCameraPresets)).unwrap();
    let context = RenderContext::new(&device, &swapchain, &binding_table);
    (device, Renderer::new(context, loader, settings))
}

/// Renders until a frame sees the scene, returns how many frames that took.
fn render_until_ready(renderer: &mut Renderer<HeadlessBackend>) -> u32 {
    for frame in 1..=20_000 {
        if renderer.render().scene_ready {
            return frame;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    panic!("The scene never became ready");
}

fn traced_shaders(events: &[HeadlessEvent]) -> Vec<RayGenerationShader> {
    events
        .iter()
        .filter_map(|e| match e {
            HeadlessEvent::TraceRays { shader, .. } => Some(*shader),
            _ => None,
        })
        .collect()
}

#[test]
fn placeholder_until_ready_then_ready_forever() {
    let (trace, release) = WrappedTrace::gated(small_trace());
    let (device, mut renderer) = renderer(SceneSource::Trace(Box::new(trace)), RenderSettings::default());

    for expected_frame in 1..=5 {
        let info = renderer.render();
        assert_eq!(info.frame, expected_frame);
        assert!(!info.scene_ready);
    }
    assert_eq!(renderer.load_state(), LoadState::Loading);
    assert!(renderer.context().scene().is_none());

    let events = device.events();
    assert!(traced_shaders(&events).is_empty());
    let clears: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            HeadlessEvent::Clear { backbuffer_index, color } => {
                assert_eq!(*color, PLACEHOLDER_CLEAR_COLOR);
                Some(*backbuffer_index)
            }
            _ => None,
        })
        .collect();
    assert_eq!(clears, vec![0, 1, 0, 1, 0]);

    drop(release);
    render_until_ready(&mut renderer);
    assert_eq!(renderer.load_state(), LoadState::Ready);
    assert!(renderer.loader().is_ready());
    assert_eq!(renderer.loader().progress().bottom_levels_built(), 1);

    for _ in 0..5 {
        assert!(renderer.render().scene_ready);
    }

    let events = device.events();
    let first_trace = events
        .iter()
        .position(|e| matches!(e, HeadlessEvent::TraceRays { .. }))
        .unwrap();
    let top_level_built = events
        .iter()
        .position(|e| matches!(e, HeadlessEvent::TopLevelBuilt { .. }))
        .unwrap();
    assert!(top_level_built < first_trace);
    for event in &events {
        if let HeadlessEvent::TraceRays { shader, width, height, depth, bound_acceleration_structures_built } = event {
            assert_eq!(*shader, RayGenerationShader::Primary);
            assert_eq!((*width, *height, *depth), (64, 48, 1));
            assert!(*bound_acceleration_structures_built);
        }
    }
    assert!(events[first_trace..].iter().all(|e| !matches!(e, HeadlessEvent::Clear { .. })));
    assert!(events.iter().any(|e| matches!(e, HeadlessEvent::CopyToBackbuffer { .. })));
}

#[test]
fn ambient_occlusion_dispatches_twice_per_frame() {
    let settings = RenderSettings {
        ambient_occlusion: true,
        ao_samples: 64,
        invert_y: false,
    };
    let (device, mut renderer) = renderer(SceneSource::BuiltinCube, settings);
    assert_eq!(renderer.settings().ao_samples, 32);

    render_until_ready(&mut renderer);
    renderer.render();

    let shaders = traced_shaders(&device.events());
    assert_eq!(
        shaders,
        vec![
            RayGenerationShader::AmbientOcclusionHitPositions,
            RayGenerationShader::AmbientOcclusion,
            RayGenerationShader::AmbientOcclusionHitPositions,
            RayGenerationShader::AmbientOcclusion,
        ]
    );

    let constants = renderer.context().binding_table().view_constants().unwrap();
    assert_eq!(constants.ao_samples, 32);
    assert!(!constants.invert_y);
    let camera = renderer.camera().unwrap();
    assert!((camera.aspect_ratio - 64.0 / 48.0).abs() < 1e-6);
}

#[test]
fn failed_load_keeps_the_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let source = SceneSource::TraceFile(dir.path().join("missing.json"));
    let (device, mut renderer) = renderer(source, RenderSettings::default());

    let mut frames = 0;
    while renderer.load_state() != LoadState::Failed {
        assert!(!renderer.render().scene_ready);
        frames += 1;
        assert!(frames < 20_000, "The load never failed");
        std::thread::sleep(Duration::from_millis(1));
    }
    for _ in 0..3 {
        assert!(!renderer.render().scene_ready);
    }
    assert!(!renderer.loader().is_ready());
    assert!(traced_shaders(&device.events()).is_empty());
}

#[test]
fn panicking_load_fails_instead_of_loading_forever() {
    let source = SceneSource::Trace(Box::new(WrappedTrace::broken(small_trace())));
    let (device, mut renderer) = renderer(source, RenderSettings::default());

    let mut frames = 0;
    while !renderer.load_state().is_finished() {
        assert!(!renderer.render().scene_ready);
        frames += 1;
        assert!(frames < 20_000, "The load never finished");
        std::thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(renderer.load_state(), LoadState::Failed);
    assert!(!renderer.loader().is_ready());
    assert!(!renderer.render().scene_ready);
    assert!(traced_shaders(&device.events()).is_empty());
}

#[test]
fn frame_fence_values_increase_by_one() {
    let (device, mut renderer) = renderer(SceneSource::BuiltinCube, RenderSettings::default());
    for _ in 0..4 {
        renderer.render();
    }
    assert_eq!(renderer.context().frame_sync().completed_frame(), 4);
    let presents = device
        .events()
        .iter()
        .filter(|e| matches!(e, HeadlessEvent::Present { .. }))
        .count();
    assert_eq!(presents, 4);
}
