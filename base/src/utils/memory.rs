
use ash::vk;

use crate::error::{VkResult, VkError};
use crate::{vkuint, vkbytes};

/// Find the index of the first memory type allowed by `type_bits` that contains all of `properties`.
pub fn get_memory_type_index(memories: &vk::PhysicalDeviceMemoryProperties, mut type_bits: vkuint, properties: vk::MemoryPropertyFlags) -> VkResult<vkuint> {

    // Iterate over all memory types available for the device.
    for i in 0..memories.memory_type_count {
        if (type_bits & 1) == 1 {
            if memories.memory_types[i as usize].property_flags.contains(properties) {
                return Ok(i)
            }
        }

        type_bits >>= 1;
    }

    Err(VkError::other(format!("Could not find a suitable memory type for {:?}.", properties)))
}

#[inline]
pub fn bound_to_alignment(bound_value: vkbytes, alignment: vkbytes) -> vkbytes {

    debug_assert!(alignment.is_power_of_two());
    // `!` operator will make 1 to 0 or make 0 to 1 for each bit for any integer type.
    (bound_value + alignment - 1) & !(alignment - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memories_of(flags: &[vk::MemoryPropertyFlags]) -> vk::PhysicalDeviceMemoryProperties {

        let mut memories = vk::PhysicalDeviceMemoryProperties::default();
        memories.memory_type_count = flags.len() as _;
        for (i, &property_flags) in flags.iter().enumerate() {
            memories.memory_types[i] = vk::MemoryType { property_flags, heap_index: 0 };
        }
        memories
    }

    #[test]
    fn picks_first_type_containing_requested_flags() {

        let memories = memories_of(&[
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            vk::MemoryPropertyFlags::HOST_VISIBLE,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        ]);

        let host = vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
        assert_eq!(get_memory_type_index(&memories, 0b111, host).unwrap(), 2);
        assert_eq!(get_memory_type_index(&memories, 0b111, vk::MemoryPropertyFlags::HOST_VISIBLE).unwrap(), 1);
        assert_eq!(get_memory_type_index(&memories, 0b111, vk::MemoryPropertyFlags::DEVICE_LOCAL).unwrap(), 0);
    }

    #[test]
    fn respects_type_bits() {

        let memories = memories_of(&[
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        ]);

        assert_eq!(get_memory_type_index(&memories, 0b10, vk::MemoryPropertyFlags::DEVICE_LOCAL).unwrap(), 1);
        assert!(get_memory_type_index(&memories, 0b00, vk::MemoryPropertyFlags::DEVICE_LOCAL).is_err());
    }

    #[test]
    fn missing_flags_is_an_error() {

        let memories = memories_of(&[vk::MemoryPropertyFlags::DEVICE_LOCAL]);
        assert!(get_memory_type_index(&memories, 0b1, vk::MemoryPropertyFlags::HOST_VISIBLE).is_err());
    }

    #[test]
    fn alignment_rounds_up() {

        assert_eq!(bound_to_alignment(0, 256), 0);
        assert_eq!(bound_to_alignment(1, 256), 256);
        assert_eq!(bound_to_alignment(256, 256), 256);
        assert_eq!(bound_to_alignment(65537, 65536), 131072);
    }
}
