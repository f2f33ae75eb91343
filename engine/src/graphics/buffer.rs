use bytemuck::Pod;
use tracereplay_core::gpu::{Buffer, BufferInfo, BufferUsage, Device, GPUBackend, MemoryUsage};

use super::BuildError;

/// Creates a CPU writable buffer holding `data`.
pub fn upload_buffer<B: GPUBackend, T: Pod>(
    device: &B::Device,
    data: &[T],
    usage: BufferUsage,
    name: &str,
) -> Result<B::Buffer, BuildError> {
    let bytes: &[u8] = bytemuck::cast_slice(data);
    // Zero sized buffers are not allowed.
    let size = (bytes.len() as u64).max(std::mem::size_of::<T>() as u64).max(4);
    let buffer = unsafe {
        device.create_buffer(
            &BufferInfo { size, usage },
            MemoryUsage::MainMemoryWriteCombined,
            Some(name),
        )?
    };
    if !bytes.is_empty() {
        unsafe {
            let ptr = buffer
                .map(0, bytes.len() as u64, false)
                .ok_or_else(|| BuildError::MapFailed(name.to_string()))?;
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr as *mut u8, bytes.len());
            buffer.unmap(0, bytes.len() as u64, true);
        }
    }
    Ok(buffer)
}
