
pub use self::logical::{VkLogicalDevice, VkQueue, LogicDevConfig, QueryFamilies};
pub use self::physical::{VkPhysicalDevice, PhysicalDevConfig};

pub(crate) mod physical;
pub(crate) mod logical;
pub(crate) mod queue;

use ash::vk;

use crate::context::marker::DebugMarker;
use crate::ci::VkObjectBuildableCI;
use crate::ci::memory::MemoryAI;
use crate::texture::PageAllocator;
use crate::error::{VkResult, VkError};
use crate::{vkuint, vkbytes};

/// The logical device and the physical device it was created from.
pub struct VkDevice {

    pub logic : VkLogicalDevice,
    pub phy   : VkPhysicalDevice,
    pub marker: DebugMarker,
}

impl VkDevice {

    pub(crate) fn new(logic: VkLogicalDevice, phy: VkPhysicalDevice, marker: DebugMarker) -> VkDevice {
        VkDevice { logic, phy, marker }
    }

    #[inline]
    pub fn build<T>(&self, ci: &T) -> VkResult<T::ObjectType>
        where
            T: VkObjectBuildableCI {
        ci.build(self)
    }

    #[inline]
    pub fn discard(&self, object: impl VkObjectDiscardable) {
        object.discard_by(self);
    }

    #[inline]
    pub fn free<T>(&self, object: T, pool: T::AllocatePool)
        where
            T: VkObjectAllocatable {
        object.free_by(self, pool);
    }

    #[inline]
    pub fn bind_memory(&self, object: impl VkObjectBindable, memory: vk::DeviceMemory, offset: vkbytes) -> VkResult<()> {
        object.bind(self, memory, offset)
    }

    #[inline]
    pub fn submit(&self, ci: impl VkSubmitCI, queue: vk::Queue, wait_fence: vk::Fence) -> VkResult<()> {
        ci.submit(self, queue, wait_fence)
    }

    pub fn wait_idle(&self) -> VkResult<()> {
        unsafe {
            self.logic.handle.device_wait_idle()
                .map_err(|e| VkError::vulkan("Device Waiting Idle", e))
        }
    }

    /// Find the first memory type which satisfies both `type_bits` and `flags`.
    #[inline]
    pub fn get_memory_type(&self, type_bits: vkuint, flags: vk::MemoryPropertyFlags) -> VkResult<vkuint> {
        crate::utils::memory::get_memory_type_index(&self.phy.memories, type_bits, flags)
    }

    pub(crate) fn discard_self(&self) {
        self.logic.discard();
    }
}

impl PageAllocator for VkDevice {

    fn allocate_page(&mut self, size: vkbytes, memory_type_index: vkuint) -> VkResult<vk::DeviceMemory> {
        MemoryAI::new(size, memory_type_index).build(self)
    }

    fn free_page(&mut self, memory: vk::DeviceMemory) {
        self.discard(memory);
    }
}

impl<'a> PageAllocator for &'a VkDevice {

    fn allocate_page(&mut self, size: vkbytes, memory_type_index: vkuint) -> VkResult<vk::DeviceMemory> {
        MemoryAI::new(size, memory_type_index).build(*self)
    }

    fn free_page(&mut self, memory: vk::DeviceMemory) {
        self.discard(memory);
    }
}

// ------------------------------------------------------------------------------------
pub trait VkObjectDiscardable: Copy {

    fn discard_by(self, device: &VkDevice);
}

pub trait VkObjectAllocatable: Copy {
    type AllocatePool: Copy;

    fn free_by(self, device: &VkDevice, pool: Self::AllocatePool);
}

pub trait VkObjectBindable: Copy {

    fn bind(self, device: &VkDevice, memory: vk::DeviceMemory, offset: vkbytes) -> VkResult<()>;
}

pub trait VkSubmitCI {

    fn submit(&self, device: &VkDevice, queue: vk::Queue, wait_fence: vk::Fence) -> VkResult<()>;
}

impl<'a, T: VkSubmitCI> VkSubmitCI for &'a T {

    fn submit(&self, device: &VkDevice, queue: vk::Queue, wait_fence: vk::Fence) -> VkResult<()> {
        (*self).submit(device, queue, wait_fence)
    }
}

impl<'a, T: VkObjectDiscardable> VkObjectDiscardable for &'a [T] {

    fn discard_by(self, device: &VkDevice) {
        for object in self.iter() {
            object.discard_by(device);
        }
    }
}
// ------------------------------------------------------------------------------------
