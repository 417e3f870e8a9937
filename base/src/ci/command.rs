
use ash::vk;

use crate::context::{VkDevice, VkObjectDiscardable, VkObjectAllocatable};
use crate::ci::VkObjectBuildableCI;
use crate::error::{VkResult, VkError};
use crate::vkuint;

// ----------------------------------------------------------------------------------------------
/// Allocates `count` primary command buffers from `pool`.
#[derive(Debug, Clone)]
pub struct CommandBufferAI {

    pool: vk::CommandPool,
    count: vkuint,
}

impl VkObjectBuildableCI for CommandBufferAI {
    type ObjectType = Vec<vk::CommandBuffer>;

    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType> {

        let allocate_info = vk::CommandBufferAllocateInfo {
            command_pool: self.pool,
            level: vk::CommandBufferLevel::PRIMARY,
            command_buffer_count: self.count,
            ..Default::default()
        };

        unsafe {
            device.logic.handle.allocate_command_buffers(&allocate_info)
                .map_err(|e| VkError::vulkan("Command Buffer Allocation", e))
        }
    }
}

impl CommandBufferAI {

    pub fn new(pool: vk::CommandPool, count: vkuint) -> CommandBufferAI {
        CommandBufferAI { pool, count }
    }
}

impl VkObjectAllocatable for vk::CommandBuffer {
    type AllocatePool = vk::CommandPool;

    fn free_by(self, device: &VkDevice, pool: Self::AllocatePool) {
        unsafe {
            device.logic.handle.free_command_buffers(pool, &[self]);
        }
    }
}
// ----------------------------------------------------------------------------------------------

// ----------------------------------------------------------------------------------------------
#[derive(Debug, Clone)]
pub struct CommandPoolCI {

    queue_family: vkuint,
    flags: vk::CommandPoolCreateFlags,
}

impl VkObjectBuildableCI for CommandPoolCI {
    type ObjectType = vk::CommandPool;

    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType> {

        let pool_ci = vk::CommandPoolCreateInfo {
            flags: self.flags,
            queue_family_index: self.queue_family,
            ..Default::default()
        };

        unsafe {
            device.logic.handle.create_command_pool(&pool_ci, None)
                .map_err(|e| VkError::vulkan("Command Pool Creation", e))
        }
    }
}

impl CommandPoolCI {

    /// Command buffers from the pool may only be submitted to queues of `queue_family`.
    pub fn new(queue_family: vkuint) -> CommandPoolCI {
        CommandPoolCI { queue_family, flags: vk::CommandPoolCreateFlags::empty() }
    }

    pub fn flags(mut self, flags: vk::CommandPoolCreateFlags) -> CommandPoolCI {
        self.flags = flags; self
    }
}

impl VkObjectDiscardable for vk::CommandPool {

    fn discard_by(self, device: &VkDevice) {
        unsafe {
            device.logic.handle.destroy_command_pool(self, None);
        }
    }
}
// ----------------------------------------------------------------------------------------------
