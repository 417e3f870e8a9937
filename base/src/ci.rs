
pub mod shader;
pub mod pipeline;
pub mod device;
pub mod image;
pub mod buffer;
pub mod descriptor;
pub mod memory;
pub mod command;
pub mod sync;
pub mod sparse;


use crate::context::VkDevice;
use crate::VkResult;

/// Every create-info wrapper starts from a fully initialized raw Vulkan structure.
pub(crate) trait VulkanCI<CI>: Sized {

    fn default_ci() -> CI;
}

pub trait VkObjectBuildableCI {
    type ObjectType;

    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType>;
}
