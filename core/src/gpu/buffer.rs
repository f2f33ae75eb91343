use std::ffi::c_void;
use std::fmt::{Display, Formatter};

bitflags! {
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
  pub struct BufferUsage: u32 {
    const STORAGE                            = 0b1;
    const CONSTANT                           = 0b10;
    const COPY_SRC                           = 0b100;
    const COPY_DST                           = 0b1000;
    const ACCELERATION_STRUCTURE             = 0b10000;
    const ACCELERATION_STRUCTURE_BUILD       = 0b100000;
    const ACCELERATION_STRUCTURE_INSTANCES   = 0b1000000;
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryUsage {
  /// Device local, not visible to the CPU.
  GPUMemory,
  /// Upload heap. Mappable, written sequentially by the CPU.
  MainMemoryWriteCombined
}

impl MemoryUsage {
  pub fn is_cpu_accessible(&self) -> bool {
    *self != MemoryUsage::GPUMemory
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BufferInfo {
  pub size: u64,
  pub usage: BufferUsage
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutOfMemoryError {
  pub requested_size: u64
}

impl Display for OutOfMemoryError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "Out of GPU memory while allocating {} bytes", self.requested_size)
  }
}

impl std::error::Error for OutOfMemoryError {}

pub trait Buffer {
  fn info(&self) -> &BufferInfo;

  /// GPU virtual address of the start of the buffer.
  fn va(&self) -> u64;

  unsafe fn map(&self, offset: u64, length: u64, invalidate: bool) -> Option<*mut c_void>;
  unsafe fn unmap(&self, offset: u64, length: u64, flush: bool);
}
