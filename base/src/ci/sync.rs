
use ash::vk;

use crate::context::{VkDevice, VkObjectDiscardable};
use crate::ci::VkObjectBuildableCI;
use crate::error::{VkResult, VkError};

// ----------------------------------------------------------------------------------------------
/// Binary semaphore, unsignaled at creation.
#[derive(Debug, Clone, Default)]
pub struct SemaphoreCI;

impl VkObjectBuildableCI for SemaphoreCI {
    type ObjectType = vk::Semaphore;

    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType> {

        unsafe {
            device.logic.handle.create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                .map_err(|e| VkError::vulkan("Semaphore Creation", e))
        }
    }
}

impl SemaphoreCI {

    pub fn new() -> SemaphoreCI {
        SemaphoreCI
    }
}

impl VkObjectDiscardable for vk::Semaphore {

    fn discard_by(self, device: &VkDevice) {
        unsafe {
            device.logic.handle.destroy_semaphore(self, None);
        }
    }
}
// ----------------------------------------------------------------------------------------------

// ----------------------------------------------------------------------------------------------
/// Fence, unsignaled at creation. Every fence here guards exactly one submission.
#[derive(Debug, Clone, Default)]
pub struct FenceCI;

impl VkObjectBuildableCI for FenceCI {
    type ObjectType = vk::Fence;

    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType> {

        unsafe {
            device.logic.handle.create_fence(&vk::FenceCreateInfo::default(), None)
                .map_err(|e| VkError::vulkan("Fence Creation", e))
        }
    }
}

impl FenceCI {

    pub fn new() -> FenceCI {
        FenceCI
    }
}

impl VkObjectDiscardable for vk::Fence {

    fn discard_by(self, device: &VkDevice) {
        unsafe {
            device.logic.handle.destroy_fence(self, None);
        }
    }
}
// ----------------------------------------------------------------------------------------------
