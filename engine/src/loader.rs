use std::fmt::{Display, Formatter};
use std::io::Result as IOResult;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{error, info, warn};
use tracereplay_core::gpu::GPUBackend;
use tracereplay_trace::{SnapshotTrace, Trace, TraceError};

use crate::camera::{Camera, CameraPresets};
use crate::graphics::{AccelerationStructureBuilder, BuildError, BuildProgress, SceneResources};
use crate::scene::{cube_scene, flatten, ingest_trace, log_trace_summary, IngestError, TraceScene};

pub enum SceneSource {
    TraceFile(PathBuf),
    Trace(Box<dyn Trace>),
    BuiltinCube,
}

/// One-shot flag, false until the loaded scene is complete and then true forever.
/// Only the build thread sets it.
#[derive(Debug, Default)]
pub struct ReadinessFlag(AtomicBool);

impl ReadinessFlag {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn publish(&self) {
        let was_set = self.0.swap(true, Ordering::Release);
        debug_assert!(!was_set, "Readiness was published twice");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LoadState {
    Loading = 0,
    Building = 1,
    Ready = 2,
    Failed = 3,
}

impl LoadState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LoadState::Loading,
            1 => LoadState::Building,
            2 => LoadState::Ready,
            _ => LoadState::Failed,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, LoadState::Ready | LoadState::Failed)
    }
}

#[derive(Debug)]
pub enum LoadError {
    Ingest(IngestError),
    Build(BuildError),
}

impl LoadError {
    /// GPU errors leave the device in an unknown state, the process can't recover from those.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LoadError::Build(_))
    }

    pub fn code(&self) -> i32 {
        match self {
            LoadError::Ingest(e) => e.code(),
            LoadError::Build(_) => 20,
        }
    }
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Ingest(e) => write!(f, "Failed to read the trace: {}", e),
            LoadError::Build(e) => write!(f, "Failed to build acceleration structures: {}", e),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Ingest(e) => Some(e),
            LoadError::Build(e) => Some(e),
        }
    }
}

impl From<IngestError> for LoadError {
    fn from(e: IngestError) -> Self {
        LoadError::Ingest(e)
    }
}

impl From<TraceError> for LoadError {
    fn from(e: TraceError) -> Self {
        LoadError::Ingest(IngestError::Trace(e))
    }
}

impl From<BuildError> for LoadError {
    fn from(e: BuildError) -> Self {
        LoadError::Build(e)
    }
}

pub struct LoadedScene<B: GPUBackend> {
    pub resources: SceneResources<B>,
    pub camera: Camera,
}

struct LoaderShared {
    ready: ReadinessFlag,
    state: AtomicU8,
    progress: BuildProgress,
}

impl LoaderShared {
    fn set_state(&self, state: LoadState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

/// Runs ingest, flatten and the acceleration structure build on a background thread.
///
/// The finished scene is handed over through a channel with a capacity of one which is
/// filled before the readiness flag is published, so whoever observes the flag can take it.
pub struct SceneLoader<B: GPUBackend> {
    shared: Arc<LoaderShared>,
    receiver: Receiver<LoadedScene<B>>,
    thread: Option<JoinHandle<()>>,
}

impl<B: GPUBackend> SceneLoader<B> {
    pub fn spawn(
        device: &Arc<B::Device>,
        binding_table: &Arc<B::BindingTable>,
        source: SceneSource,
        presets: Box<dyn CameraPresets>,
    ) -> IOResult<Self> {
        let shared = Arc::new(LoaderShared {
            ready: ReadinessFlag::default(),
            state: AtomicU8::new(LoadState::Loading as u8),
            progress: BuildProgress::default(),
        });
        let (sender, receiver) = bounded::<LoadedScene<B>>(1);

        let thread_shared = shared.clone();
        let thread_device = device.clone();
        let thread_binding_table = binding_table.clone();
        let thread = thread::Builder::new()
            .name("SceneBuildThread".to_string())
            .spawn(move || {
                run_load::<B>(
                    &thread_device,
                    &thread_binding_table,
                    source,
                    presets.as_ref(),
                    &thread_shared,
                    sender,
                )
            })?;

        Ok(Self {
            shared,
            receiver,
            thread: Some(thread),
        })
    }

    pub fn is_ready(&self) -> bool {
        self.shared.ready.is_set()
    }

    /// Never reports `Ready` before `is_ready` does, and the other way around.
    pub fn state(&self) -> LoadState {
        if self.is_ready() {
            return LoadState::Ready;
        }
        LoadState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    pub fn progress(&self) -> &BuildProgress {
        &self.shared.progress
    }

    /// Hands out the scene exactly once, after readiness was published.
    pub fn take_scene(&self) -> Option<LoadedScene<B>> {
        if !self.is_ready() {
            return None;
        }
        self.receiver.try_recv().ok()
    }

    /// Blocks until the build thread has exited.
    pub fn wait(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("The scene build thread panicked");
            }
        }
    }
}

fn run_load<B: GPUBackend>(
    device: &Arc<B::Device>,
    binding_table: &Arc<B::BindingTable>,
    source: SceneSource,
    presets: &dyn CameraPresets,
    shared: &LoaderShared,
    sender: Sender<LoadedScene<B>>,
) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        load_scene::<B>(device, binding_table.as_ref(), source, presets, &shared.progress, |state| shared.set_state(state))
    }));
    let result = match result {
        Ok(result) => result,
        Err(payload) => {
            error!("Loading the scene panicked: {}", panic_message(payload.as_ref()));
            warn!("Keeping the placeholder, the scene will not be loaded");
            shared.set_state(LoadState::Failed);
            return;
        }
    };

    match result {
        Ok(scene) => {
            if sender.try_send(scene).is_err() {
                error!("The render loop dropped the scene loader before the scene was ready");
                shared.set_state(LoadState::Failed);
                return;
            }
            shared.ready.publish();
            shared.set_state(LoadState::Ready);
            info!("Scene is ready");
        }
        Err(e) if e.is_fatal() => {
            error!("{}", e);
            std::process::abort();
        }
        Err(e) => {
            error!("{} (code {})", e, e.code());
            warn!("Keeping the placeholder, the scene will not be loaded");
            shared.set_state(LoadState::Failed);
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

/// The whole load on the calling thread. `on_state` is told when the GPU part starts.
pub fn load_scene<B: GPUBackend>(
    device: &Arc<B::Device>,
    binding_table: &B::BindingTable,
    source: SceneSource,
    presets: &dyn CameraPresets,
    progress: &BuildProgress,
    mut on_state: impl FnMut(LoadState),
) -> Result<LoadedScene<B>, LoadError> {
    let (scene, camera) = read_scene(source, presets)?;

    on_state(LoadState::Building);
    let buffers = flatten(&scene);
    let mut builder = AccelerationStructureBuilder::<B>::new(device)?;
    let resources = builder.build(&scene, &buffers, binding_table, progress)?;
    Ok(LoadedScene { resources, camera })
}

fn read_scene(source: SceneSource, presets: &dyn CameraPresets) -> Result<(TraceScene, Camera), LoadError> {
    match source {
        SceneSource::TraceFile(path) => {
            info!("Loading trace {}", path.display());
            let trace = SnapshotTrace::load(&path)?;
            log_trace_summary(&trace);
            let scene = ingest_trace(&trace)?;
            let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            let camera = presets.lookup(&file_name).unwrap_or_else(Camera::trace_default);
            Ok((scene, camera))
        }
        SceneSource::Trace(trace) => {
            log_trace_summary(trace.as_ref());
            let scene = ingest_trace(trace.as_ref())?;
            Ok((scene, Camera::trace_default()))
        }
        SceneSource::BuiltinCube => {
            info!("No trace configured, showing the built-in cube");
            Ok((cube_scene(), Camera::cube_default()))
        }
    }
}
