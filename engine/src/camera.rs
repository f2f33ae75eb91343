use serde::{Deserialize, Serialize};
use tracereplay_core::{Matrix4, Vec3};

const PARALLEL_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
  pub eye: Vec3,
  pub center: Vec3,
  pub up: Vec3,
  pub fov_y_degrees: f32,
  pub near: f32,
  pub far: f32,
  pub aspect_ratio: f32,
  pub invert_y: bool
}

impl Camera {
  /// Camera used for traces nobody has a preset for.
  pub fn trace_default() -> Self {
    Self {
      eye: Vec3::ZERO,
      center: Vec3::Y,
      up: Vec3::Y,
      fov_y_degrees: 60.0,
      near: 0.1,
      far: 499.0,
      aspect_ratio: 16.0 / 9.0,
      invert_y: false
    }
  }

  pub fn cube_default() -> Self {
    Self {
      eye: Vec3::new(2.0, 2.0, 5.0),
      center: Vec3::ZERO,
      up: Vec3::Y,
      fov_y_degrees: 90.0,
      ..Self::trace_default()
    }
  }

  pub fn with_aspect_ratio(mut self, width: u32, height: u32) -> Self {
    if width != 0 && height != 0 {
      self.aspect_ratio = width as f32 / height as f32;
    }
    self
  }

  pub fn view_matrix(&self) -> Matrix4 {
    let mut forward = self.center - self.eye;
    if forward.length_squared() < PARALLEL_EPSILON {
      forward = Vec3::NEG_Z;
    }
    let forward = forward.normalize();

    // look_at is undefined when looking along the up vector.
    let mut up = self.up;
    if forward.cross(up).length_squared() < PARALLEL_EPSILON {
      up = if forward.cross(Vec3::Z).length_squared() < PARALLEL_EPSILON { Vec3::X } else { Vec3::Z };
    }
    Matrix4::look_to_rh(self.eye, forward, up)
  }

  pub fn projection_matrix(&self) -> Matrix4 {
    Matrix4::perspective_rh(self.fov_y_degrees.to_radians(), self.aspect_ratio, self.near, self.far)
  }

  pub fn inverse_view_matrix(&self) -> Matrix4 {
    self.view_matrix().inverse()
  }

  pub fn inverse_projection_matrix(&self) -> Matrix4 {
    self.projection_matrix().inverse()
  }
}

/// Camera placement for a known capture, matched against the trace file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraPreset {
  pub pattern: String,
  pub eye: Vec3,
  pub center: Vec3,
  #[serde(default = "default_up")]
  pub up: Vec3,
  #[serde(default)]
  pub invert_y: bool
}

fn default_up() -> Vec3 {
  Vec3::Y
}

pub trait CameraPresets: Send {
  fn lookup(&self, file_name: &str) -> Option<Camera>;
}

pub struct NoCameraPresets;

impl CameraPresets for NoCameraPresets {
  fn lookup(&self, _file_name: &str) -> Option<Camera> {
    None
  }
}

/// First preset whose pattern is contained in the file name wins.
pub struct TableCameraPresets {
  presets: Vec<CameraPreset>
}

impl TableCameraPresets {
  pub fn new(presets: Vec<CameraPreset>) -> Self {
    Self { presets }
  }
}

impl CameraPresets for TableCameraPresets {
  fn lookup(&self, file_name: &str) -> Option<Camera> {
    self.presets.iter()
      .find(|preset| !preset.pattern.is_empty() && file_name.contains(&preset.pattern))
      .map(|preset| Camera {
        eye: preset.eye,
        center: preset.center,
        up: preset.up,
        invert_y: preset.invert_y,
        ..Camera::trace_default()
      })
  }
}
