use serde::{Deserialize, Serialize};

pub const MAX_AO_SAMPLES: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
  pub ambient_occlusion: bool,
  pub ao_samples: u32,
  pub invert_y: bool
}

impl Default for RenderSettings {
  fn default() -> Self {
    Self {
      ambient_occlusion: false,
      ao_samples: 1,
      invert_y: false
    }
  }
}

impl RenderSettings {
  pub fn set_ao_samples(&mut self, samples: u32) {
    self.ao_samples = samples.min(MAX_AO_SAMPLES);
  }

  /// Settings as the shaders get them.
  pub fn clamped(mut self) -> Self {
    self.set_ao_samples(self.ao_samples);
    self
  }
}
