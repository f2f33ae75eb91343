pub use self::device::*;
pub use self::command::*;
pub use self::buffer::*;
pub use self::format::*;
pub use self::sync::*;
pub use self::swapchain::*;
pub use self::rt::*;
pub use self::binding::*;
pub use self::queue::*;
pub use self::backend::*;

mod device;
mod swapchain;
mod command;
mod buffer;
mod format;
mod backend;
mod sync;
mod rt;
mod binding;
mod queue;
