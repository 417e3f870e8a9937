
use ash::vk;

use crate::context::{VkDevice, VkObjectDiscardable, VkObjectBindable};
use crate::ci::VkObjectBuildableCI;
use crate::error::{VkResult, VkError};
use crate::vkbytes;

// ----------------------------------------------------------------------------------------------
/// Exclusive buffer of `size` bytes. `build` also returns its memory requirements.
#[derive(Debug, Clone)]
pub struct BufferCI {

    size : vkbytes,
    usage: vk::BufferUsageFlags,
}

impl VkObjectBuildableCI for BufferCI {
    type ObjectType = (vk::Buffer, vk::MemoryRequirements);

    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType> {

        let buffer = unsafe {
            device.logic.handle.create_buffer(&self.value(), None)
                .map_err(|e| VkError::vulkan("Buffer Creation", e))?
        };

        let requirement = unsafe {
            device.logic.handle.get_buffer_memory_requirements(buffer)
        };

        Ok((buffer, requirement))
    }
}

impl BufferCI {

    pub fn new(size: vkbytes) -> BufferCI {
        BufferCI { size, usage: vk::BufferUsageFlags::empty() }
    }

    pub fn value(&self) -> vk::BufferCreateInfo {

        vk::BufferCreateInfo {
            size : self.size,
            usage: self.usage,
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            ..Default::default()
        }
    }

    #[inline(always)]
    pub fn usage(mut self, flags: vk::BufferUsageFlags) -> BufferCI {
        self.usage = flags; self
    }
}

impl VkObjectDiscardable for vk::Buffer {

    fn discard_by(self, device: &VkDevice) {
        unsafe {
            device.logic.handle.destroy_buffer(self, None)
        }
    }
}

impl VkObjectBindable for vk::Buffer {

    fn bind(self, device: &VkDevice, memory: vk::DeviceMemory, offset: vkbytes) -> VkResult<()> {
        unsafe {
            device.logic.handle.bind_buffer_memory(self, memory, offset)
                .map_err(|e| VkError::vulkan("Binding Buffer Memory", e))
        }
    }
}
// ----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_is_exclusive() {

        let value = BufferCI::new(1024)
            .usage(vk::BufferUsageFlags::STORAGE_BUFFER | vk::BufferUsageFlags::TRANSFER_DST)
            .value();

        assert_eq!(value.s_type, vk::StructureType::BUFFER_CREATE_INFO);
        assert_eq!(value.size, 1024);
        assert_eq!(value.usage, vk::BufferUsageFlags::STORAGE_BUFFER | vk::BufferUsageFlags::TRANSFER_DST);
        assert_eq!(value.sharing_mode, vk::SharingMode::EXCLUSIVE);
        assert_eq!(value.queue_family_index_count, 0);
    }
}
