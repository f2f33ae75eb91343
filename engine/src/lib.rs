//! Replays captured ray tracing acceleration structures.
//!
//! A trace is ingested into per-hierarchy triangle lists and an instance table, flattened
//! into the buffers the shaders read and built into acceleration structures on a
//! background thread, while the render loop keeps presenting a placeholder.

pub use self::camera::{Camera, CameraPreset, CameraPresets, NoCameraPresets, TableCameraPresets};
pub use self::config::{ConfigError, ViewerConfig};
pub use self::loader::{load_scene, LoadError, LoadState, LoadedScene, ReadinessFlag, SceneLoader, SceneSource};
pub use self::renderer::{FrameInfo, FrameTimer, RenderSettings, Renderer};

pub mod camera;
pub mod config;
pub mod graphics;
pub mod loader;
pub mod renderer;
pub mod scene;
