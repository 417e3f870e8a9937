
use ash::vk;

use crate::context::VkDevice;
use crate::ci::buffer::BufferCI;
use crate::ci::memory::{MemoryAI, MappedMemoryRangeCI};
use crate::ci::command::CommandBufferAI;
use crate::ci::VkObjectBuildableCI;
use crate::command::{VkCmdRecorder, ITransfer, CmdTransferApi};
use crate::error::{VkResult, VkError, discard_on_error};
use crate::{vkbytes, vkptr};

use std::mem;

/// A `vk::Buffer` with its own dedicated `vk::DeviceMemory`.
pub struct VkBuffer {

    pub handle: vk::Buffer,
    pub memory: vk::DeviceMemory,
    /// the requested size of this buffer in bytes.
    pub size: vkbytes,
    pub usage: vk::BufferUsageFlags,
    pub memory_flags: vk::MemoryPropertyFlags,

    mapped: Option<vkptr>,
}

impl VkBuffer {

    pub fn new(device: &VkDevice, usage: vk::BufferUsageFlags, memory_flags: vk::MemoryPropertyFlags, size: vkbytes) -> VkResult<VkBuffer> {

        if size == 0 {
            return Err(VkError::other("Buffer size must be greater than zero."))
        }

        let (handle, requirement) = BufferCI::new(size)
            .usage(usage)
            .build(device)?;

        let memory = device.get_memory_type(requirement.memory_type_bits, memory_flags)
            .and_then(|memory_type| MemoryAI::new(requirement.size, memory_type).build(device));
        let memory = match memory {
            | Ok(memory) => memory,
            | Err(e) => {
                device.discard(handle);
                return Err(e)
            },
        };

        if let Err(e) = device.bind_memory(handle, memory, 0) {
            device.discard(handle);
            device.discard(memory);
            return Err(e)
        }

        let buffer = VkBuffer { handle, memory, size, usage, memory_flags, mapped: None };
        Ok(buffer)
    }

    /// Create a host visible buffer and copy `data` into it.
    pub fn with_data<D: Copy>(device: &VkDevice, usage: vk::BufferUsageFlags, memory_flags: vk::MemoryPropertyFlags, data: &[D]) -> VkResult<VkBuffer> {

        let size = (mem::size_of::<D>() * data.len()) as vkbytes;
        let mut buffer = VkBuffer::new(device, usage, memory_flags, size)?;

        let result = buffer.map(device)
            .and_then(|_| buffer.copy_from(data))
            .and_then(|_| if memory_flags.contains(vk::MemoryPropertyFlags::HOST_COHERENT) {
                Ok(())
            } else {
                buffer.flush(device)
            });
        buffer.unmap(device);

        discard_on_error(buffer, result, |buffer| buffer.discard(device))
    }

    /// Copy `data` into a new device local buffer through a temporary staging buffer.
    pub fn upload_to_device<D: Copy>(device: &VkDevice, pool: vk::CommandPool, queue: vk::Queue, usage: vk::BufferUsageFlags, data: &[D]) -> VkResult<VkBuffer> {

        let staging = VkBuffer::with_data(device, vk::BufferUsageFlags::TRANSFER_SRC,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT, data)?;

        let target = match VkBuffer::new(device, usage | vk::BufferUsageFlags::TRANSFER_DST, vk::MemoryPropertyFlags::DEVICE_LOCAL, staging.size) {
            | Ok(target) => target,
            | Err(e) => {
                staging.discard(device);
                return Err(e)
            },
        };

        let result = VkBuffer::copy_buffer(device, pool, queue, &staging, &target);
        staging.discard(device);

        discard_on_error(target, result, |target| target.discard(device))
    }

    fn copy_buffer(device: &VkDevice, pool: vk::CommandPool, queue: vk::Queue, src: &VkBuffer, dst: &VkBuffer) -> VkResult<()> {

        let command = CommandBufferAI::new(pool, 1)
            .build(device)?
            .into_iter().next()
            .ok_or(VkError::create("Command Buffer"))?;

        let recorder: VkCmdRecorder<ITransfer> = VkCmdRecorder::new(device, command);
        let copy_region = vk::BufferCopy { src_offset: 0, dst_offset: 0, size: src.size };

        let result = recorder.begin_record()
            .and_then(|recorder| {
                recorder.copy_buf2buf(src.handle, dst.handle, &[copy_region]);
                recorder.end_record()
            })
            .and_then(|_| recorder.flush_copy_command(queue));

        device.free(command, pool);
        result
    }

    /// Map the whole buffer. Mapping an already mapped buffer is a no-op.
    pub fn map(&mut self, device: &VkDevice) -> VkResult<vkptr> {

        if let Some(ptr) = self.mapped {
            return Ok(ptr)
        }

        let ptr = unsafe {
            device.logic.handle.map_memory(self.memory, 0, vk::WHOLE_SIZE, vk::MemoryMapFlags::empty())
                .map_err(|e| VkError::vulkan("Map Memory", e))?
        };

        self.mapped = Some(ptr);
        Ok(ptr)
    }

    pub fn unmap(&mut self, device: &VkDevice) {

        if self.mapped.take().is_some() {
            unsafe {
                device.logic.handle.unmap_memory(self.memory);
            }
        }
    }

    /// Copy `data` to the beginning of the mapped memory.
    pub fn copy_from<D: Copy>(&self, data: &[D]) -> VkResult<()> {

        let ptr = self.mapped
            .ok_or(VkError::device("Copy to a buffer that is not mapped"))?;
        check_range::<D>(self.size, data.len())?;

        unsafe {
            let target = ::std::slice::from_raw_parts_mut(ptr as *mut D, data.len());
            target.copy_from_slice(data);
        }
        Ok(())
    }

    /// Copy the beginning of the mapped memory into `data`.
    pub fn read_into<D: Copy>(&self, data: &mut [D]) -> VkResult<()> {

        let ptr = self.mapped
            .ok_or(VkError::device("Read from a buffer that is not mapped"))?;
        check_range::<D>(self.size, data.len())?;

        unsafe {
            let source = ::std::slice::from_raw_parts(ptr as *const D, data.len());
            data.copy_from_slice(source);
        }
        Ok(())
    }

    /// Make host writes visible to the device. Only needed without `HOST_COHERENT`.
    pub fn flush(&self, device: &VkDevice) -> VkResult<()> {

        let range = MappedMemoryRangeCI::whole(self.memory);
        unsafe {
            device.logic.handle.flush_mapped_memory_ranges(&[range.value()])
                .map_err(|e| VkError::vulkan("Flush Mapped Memory", e))
        }
    }

    /// Make device writes visible to the host. Only needed without `HOST_COHERENT`.
    pub fn invalidate(&self, device: &VkDevice) -> VkResult<()> {

        let range = MappedMemoryRangeCI::whole(self.memory);
        unsafe {
            device.logic.handle.invalidate_mapped_memory_ranges(&[range.value()])
                .map_err(|e| VkError::vulkan("Invalidate Mapped Memory", e))
        }
    }

    pub fn descriptor(&self) -> vk::DescriptorBufferInfo {
        vk::DescriptorBufferInfo {
            buffer: self.handle,
            offset: 0,
            range : self.size,
        }
    }

    pub fn discard(mut self, device: &VkDevice) {

        self.unmap(device);
        device.discard(self.handle);
        device.discard(self.memory);
    }
}

fn check_range<D>(buffer_size: vkbytes, count: usize) -> VkResult<()> {

    let required = (mem::size_of::<D>() * count) as vkbytes;
    if required > buffer_size {
        Err(VkError::other(format!("Access {} bytes out of a buffer with {} bytes.", required, buffer_size)))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_is_bounded_by_buffer_size() {

        assert!(check_range::<u32>(128, 32).is_ok());
        assert!(check_range::<u32>(128, 33).is_err());
        assert!(check_range::<[u8; 4]>(0, 0).is_ok());
    }
}
