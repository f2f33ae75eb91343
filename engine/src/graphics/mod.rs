pub use self::accel_builder::*;
pub use self::buffer::*;
pub use self::context::*;
pub use self::frame_sync::*;
pub use self::rt::*;
pub use self::sync::*;

mod accel_builder;
mod buffer;
mod context;
mod frame_sync;
mod rt;
mod sync;

pub use tracereplay_core::gpu;

/// Binding table slots the ray tracing shaders read the scene from.
pub mod slots {
    pub const ACCELERATION_STRUCTURE: u32 = 1;
    pub const VERTICES: u32 = 3;
    pub const INSTANCE_OFFSETS: u32 = 4;
}
