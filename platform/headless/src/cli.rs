use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracereplay_engine::ViewerConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "tracereplay_viewer")]
#[command(about = "Replays captured ray tracing acceleration structures", long_about = None)]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// Trace snapshot to load. Without one the built-in cube is shown.
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    #[arg(short = 'w', long = "width")]
    pub width: Option<u32>,

    #[arg(short = 'h', long = "height")]
    pub height: Option<u32>,

    /// Frames to render once the load finished or failed.
    #[arg(long = "frames")]
    pub frames: Option<u32>,

    /// JSON viewer config. Flags override its values.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    #[arg(long = "ao")]
    pub ambient_occlusion: bool,

    #[arg(long = "ao-samples")]
    pub ao_samples: Option<u32>,

    #[arg(long = "help", action = ArgAction::Help)]
    help: Option<bool>,
}

impl Cli {
    pub fn apply(&self, config: &mut ViewerConfig) {
        if let Some(input) = &self.input {
            config.trace = Some(input.clone());
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(frames) = self.frames {
            config.frames = frames;
        }
        if self.ambient_occlusion {
            config.render.ambient_occlusion = true;
        }
        if let Some(samples) = self.ao_samples {
            config.render.set_ao_samples(samples);
        }
    }
}
