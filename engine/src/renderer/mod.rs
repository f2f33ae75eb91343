pub use self::frame_timer::FrameTimer;
pub use self::renderer::{FrameInfo, Renderer, PLACEHOLDER_CLEAR_COLOR};
pub use self::settings::{RenderSettings, MAX_AO_SAMPLES};

mod frame_timer;
mod renderer;
mod settings;
