use std::ffi::c_void;
use std::sync::Arc;

use parking_lot::Mutex;
use tracereplay_core::gpu::{Buffer, BufferInfo, MemoryUsage, OutOfMemoryError, WHOLE_BUFFER};

use crate::{HeadlessEvent, HeadlessShared};

pub(crate) struct BufferInner {
    info: BufferInfo,
    name: Option<String>,
    va: u64,
    memory_usage: MemoryUsage,
    memory: Mutex<Box<[u8]>>,
    shared: Arc<HeadlessShared>,
}

impl BufferInner {
    pub(crate) fn va(&self) -> u64 {
        self.va
    }

    pub(crate) fn write(&self, offset: u64, data: &[u8]) {
        let mut memory = self.memory.lock();
        let start = offset as usize;
        memory[start..start + data.len()].copy_from_slice(data);
    }

    pub(crate) fn read(&self, offset: u64, length: u64) -> Vec<u8> {
        let memory = self.memory.lock();
        let start = offset as usize;
        memory[start..start + length as usize].to_vec()
    }
}

impl Drop for BufferInner {
    fn drop(&mut self) {
        self.shared.free(self.info.size);
        self.shared.record(HeadlessEvent::BufferDestroyed {
            name: self.name.clone(),
            size: self.info.size,
        });
    }
}

pub struct HeadlessBuffer {
    inner: Arc<BufferInner>,
}

impl HeadlessBuffer {
    pub(crate) fn new(
        shared: &Arc<HeadlessShared>,
        info: &BufferInfo,
        memory_usage: MemoryUsage,
        name: Option<&str>,
    ) -> Result<Self, OutOfMemoryError> {
        let va = shared.allocate(info.size).ok_or(OutOfMemoryError {
            requested_size: info.size,
        })?;
        shared.record(HeadlessEvent::BufferCreated {
            name: name.map(|n| n.to_string()),
            size: info.size,
            memory_usage,
        });
        Ok(Self {
            inner: Arc::new(BufferInner {
                info: info.clone(),
                name: name.map(|n| n.to_string()),
                va,
                memory_usage,
                memory: Mutex::new(vec![0u8; info.size as usize].into_boxed_slice()),
                shared: shared.clone(),
            }),
        })
    }

    pub(crate) fn inner(&self) -> &Arc<BufferInner> {
        &self.inner
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Copy of the buffer contents as the timeline currently sees them.
    pub fn contents(&self) -> Vec<u8> {
        self.inner.read(0, self.inner.info.size)
    }
}

impl PartialEq for HeadlessBuffer {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Buffer for HeadlessBuffer {
    fn info(&self) -> &BufferInfo {
        &self.inner.info
    }

    fn va(&self) -> u64 {
        self.inner.va
    }

    unsafe fn map(&self, offset: u64, length: u64, _invalidate: bool) -> Option<*mut c_void> {
        if !self.inner.memory_usage.is_cpu_accessible() {
            return None;
        }
        let length = if length == WHOLE_BUFFER { self.inner.info.size - offset } else { length };
        if offset + length > self.inner.info.size {
            return None;
        }
        let mut memory = self.inner.memory.lock();
        Some(memory.as_mut_ptr().add(offset as usize) as *mut c_void)
    }

    unsafe fn unmap(&self, _offset: u64, _length: u64, _flush: bool) {}
}
