//! A GPU backend without a GPU.
//!
//! Commands are recorded like on any other backend and executed in submission order by a
//! dedicated timeline thread that stands in for the hardware queue. Everything the timeline
//! does is appended to an event log that can be inspected afterwards.

pub use self::backend::HeadlessBackend;
pub use self::binding::{HeadlessBindingTable, StructuredBufferBinding};
pub use self::buffer::HeadlessBuffer;
pub use self::command::{HeadlessCommandBuffer, HeadlessCommandPool};
pub use self::device::{HeadlessDevice, HeadlessDeviceInfo};
pub use self::events::HeadlessEvent;
pub use self::queue::HeadlessQueue;
pub use self::rt::{HeadlessAccelerationStructure, InstanceDescriptor};
pub use self::swapchain::HeadlessSwapchain;
pub use self::sync::HeadlessFence;

pub(crate) use self::shared::HeadlessShared;

mod backend;
mod binding;
mod buffer;
mod command;
mod device;
mod events;
mod queue;
mod rt;
mod shared;
mod swapchain;
mod sync;
