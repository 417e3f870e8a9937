//! Device memory allocation and host mapped ranges.

use ash::vk;

use crate::context::{VkDevice, VkObjectDiscardable};
use crate::ci::VkObjectBuildableCI;
use crate::error::{VkResult, VkError};
use crate::{vkuint, vkbytes};

// ----------------------------------------------------------------------------------------------
/// `size` bytes from the memory type at `memory_type_index`.
#[derive(Debug, Clone)]
pub struct MemoryAI {

    size: vkbytes,
    memory_type_index: vkuint,
}

impl VkObjectBuildableCI for MemoryAI {
    type ObjectType = vk::DeviceMemory;

    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType> {

        unsafe {
            device.logic.handle.allocate_memory(&self.value(), None)
                .map_err(|e| VkError::vulkan("Memory Allocate", e))
        }
    }
}

impl MemoryAI {

    pub fn new(size: vkbytes, memory_type_index: vkuint) -> MemoryAI {
        MemoryAI { size, memory_type_index }
    }

    pub fn value(&self) -> vk::MemoryAllocateInfo {

        vk::MemoryAllocateInfo {
            allocation_size: self.size,
            memory_type_index: self.memory_type_index,
            ..Default::default()
        }
    }
}

impl VkObjectDiscardable for vk::DeviceMemory {

    fn discard_by(self, device: &VkDevice) {
        unsafe {
            device.logic.handle.free_memory(self, None);
        }
    }
}
// ----------------------------------------------------------------------------------------------

// ----------------------------------------------------------------------------------------------
/// The whole mapped range of `memory`, to flush or invalidate non-coherent host memory.
#[derive(Debug, Clone)]
pub struct MappedMemoryRangeCI {
    memory: vk::DeviceMemory,
}

impl MappedMemoryRangeCI {

    pub fn whole(memory: vk::DeviceMemory) -> MappedMemoryRangeCI {
        MappedMemoryRangeCI { memory }
    }

    pub fn value(&self) -> vk::MappedMemoryRange {

        vk::MappedMemoryRange {
            memory: self.memory,
            offset: 0,
            size: vk::WHOLE_SIZE,
            ..Default::default()
        }
    }
}
// ----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    #[test]
    fn mapped_range_covers_whole_memory() {

        let value = MappedMemoryRangeCI::whole(vk::DeviceMemory::from_raw(5)).value();
        assert_eq!(value.s_type, vk::StructureType::MAPPED_MEMORY_RANGE);
        assert_eq!(value.offset, 0);
        assert_eq!(value.size, vk::WHOLE_SIZE);
    }

    #[test]
    fn allocation_keeps_type_index() {

        let value = MemoryAI::new(65536, 3).value();
        assert_eq!(value.allocation_size, 65536);
        assert_eq!(value.memory_type_index, 3);
    }
}
