//! Builders for descriptor pools, set layouts, sets and buffer descriptor writes.

use ash::vk;

use crate::context::{VkDevice, VkObjectDiscardable};
use crate::ci::VkObjectBuildableCI;
use crate::error::{VkResult, VkError};
use crate::vkuint;

// ----------------------------------------------------------------------------------------------
/// Wrapper class for `vk::DescriptorPoolCreateInfo`.
///
/// Sets allocated from the pool are released together with the pool.
#[derive(Debug, Clone)]
pub struct DescriptorPoolCI {

    max_sets: vkuint,
    pool_sizes: Vec<vk::DescriptorPoolSize>,
}

impl VkObjectBuildableCI for DescriptorPoolCI {
    type ObjectType = vk::DescriptorPool;

    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType> {

        debug_assert!(!self.pool_sizes.is_empty(), "The count of pool sizes must be greater than 0!");

        unsafe {
            device.logic.handle.create_descriptor_pool(&self.value(), None)
                .map_err(|e| VkError::vulkan("Descriptor Pool Creation", e))
        }
    }
}

impl DescriptorPoolCI {

    /// `max_sets` is the maximum number of descriptor sets allocated from this pool.
    pub fn new(max_sets: vkuint) -> DescriptorPoolCI {

        debug_assert!(max_sets > 0, "max_sets must be greater than 0!");
        DescriptorPoolCI { max_sets, pool_sizes: Vec::new() }
    }

    pub fn value(&self) -> vk::DescriptorPoolCreateInfo {

        vk::DescriptorPoolCreateInfo {
            max_sets: self.max_sets,
            pool_size_count: self.pool_sizes.len() as _,
            p_pool_sizes   : self.pool_sizes.as_ptr(),
            ..Default::default()
        }
    }

    /// `count` is the maximum number of descriptors of `ty` this pool hands out.
    #[inline]
    pub fn add_descriptor(mut self, ty: vk::DescriptorType, count: vkuint) -> DescriptorPoolCI {

        debug_assert!(count > 0, "The count of descriptor must be greater than 0!");
        self.pool_sizes.push(vk::DescriptorPoolSize { ty, descriptor_count: count }); self
    }
}

impl VkObjectDiscardable for vk::DescriptorPool {

    fn discard_by(self, device: &VkDevice) {
        unsafe {
            device.logic.handle.destroy_descriptor_pool(self, None);
        }
    }
}
// ----------------------------------------------------------------------------------------------

// ----------------------------------------------------------------------------------------------
#[derive(Debug, Clone, Default)]
pub struct DescriptorSetLayoutCI {
    bindings: Vec<vk::DescriptorSetLayoutBinding>,
}

impl VkObjectBuildableCI for DescriptorSetLayoutCI {
    type ObjectType = vk::DescriptorSetLayout;

    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType> {

        unsafe {
            device.logic.handle.create_descriptor_set_layout(&self.value(), None)
                .map_err(|e| VkError::vulkan("Descriptor Set Layout Creation", e))
        }
    }
}

impl DescriptorSetLayoutCI {

    #[inline(always)]
    pub fn new() -> DescriptorSetLayoutCI {
        DescriptorSetLayoutCI::default()
    }

    pub fn value(&self) -> vk::DescriptorSetLayoutCreateInfo {

        vk::DescriptorSetLayoutCreateInfo {
            binding_count: self.bindings.len() as _,
            p_bindings   : self.bindings.as_ptr(),
            ..Default::default()
        }
    }

    /// Add a binding of `count` descriptors visible to `stages`.
    #[inline(always)]
    pub fn add_binding(mut self, binding: vkuint, ty: vk::DescriptorType, count: vkuint, stages: vk::ShaderStageFlags) -> DescriptorSetLayoutCI {

        self.bindings.push(vk::DescriptorSetLayoutBinding {
            binding,
            descriptor_type: ty,
            descriptor_count: count,
            stage_flags: stages,
            ..Default::default()
        }); self
    }
}

impl VkObjectDiscardable for vk::DescriptorSetLayout {

    fn discard_by(self, device: &VkDevice) {
        unsafe {
            device.logic.handle.destroy_descriptor_set_layout(self, None);
        }
    }
}
// ----------------------------------------------------------------------------------------------

// ----------------------------------------------------------------------------------------------
/// Allocates one descriptor set per added layout from `pool`.
#[derive(Debug, Clone)]
pub struct DescriptorSetAI {

    pool: vk::DescriptorPool,
    set_layouts: Vec<vk::DescriptorSetLayout>,
}

impl VkObjectBuildableCI for DescriptorSetAI {
    type ObjectType = Vec<vk::DescriptorSet>;

    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType> {

        debug_assert!(!self.set_layouts.is_empty(), "Descriptor sets count must be greater than 0!");

        unsafe {
            device.logic.handle.allocate_descriptor_sets(&self.value())
                .map_err(|e| VkError::vulkan("Descriptor Set Allocation", e))
        }
    }
}

impl DescriptorSetAI {

    pub fn new(pool: vk::DescriptorPool) -> DescriptorSetAI {
        DescriptorSetAI { pool, set_layouts: Vec::new() }
    }

    pub fn value(&self) -> vk::DescriptorSetAllocateInfo {

        vk::DescriptorSetAllocateInfo {
            descriptor_pool: self.pool,
            descriptor_set_count: self.set_layouts.len() as _,
            p_set_layouts       : self.set_layouts.as_ptr(),
            ..Default::default()
        }
    }

    #[inline(always)]
    pub fn add_set_layout(mut self, set_layout: vk::DescriptorSetLayout) -> DescriptorSetAI {
        self.set_layouts.push(set_layout); self
    }
}
// ----------------------------------------------------------------------------------------------

// ----------------------------------------------------------------------------------------------
/// Writes buffer descriptors into `binding` of a set, starting at array element 0.
#[derive(Debug, Clone)]
pub struct DescriptorSetWI {

    set: vk::DescriptorSet,
    binding: vkuint,
    ty: vk::DescriptorType,
    buffers: Vec<vk::DescriptorBufferInfo>,
}

impl DescriptorSetWI {

    pub fn new(set: vk::DescriptorSet, binding: vkuint, ty: vk::DescriptorType) -> DescriptorSetWI {
        DescriptorSetWI { set, binding, ty, buffers: Vec::new() }
    }

    #[inline(always)]
    pub fn add_buffer(mut self, info: vk::DescriptorBufferInfo) -> DescriptorSetWI {
        self.buffers.push(info); self
    }

    /// The returned value points into `self`.
    pub fn value(&self) -> vk::WriteDescriptorSet {

        vk::WriteDescriptorSet {
            dst_set: self.set,
            dst_binding: self.binding,
            descriptor_type: self.ty,
            descriptor_count: self.buffers.len() as _,
            p_buffer_info   : self.buffers.as_ptr(),
            ..Default::default()
        }
    }
}
// ----------------------------------------------------------------------------------------------

// ----------------------------------------------------------------------------------------------
/// Collects descriptor writes and submits them in one `vkUpdateDescriptorSets` call.
#[derive(Default)]
pub struct DescriptorSetsUpdateCI<'a> {
    writes: Vec<&'a DescriptorSetWI>,
}

impl<'a> DescriptorSetsUpdateCI<'a> {

    #[inline(always)]
    pub fn new() -> DescriptorSetsUpdateCI<'a> {
        DescriptorSetsUpdateCI::default()
    }

    #[inline(always)]
    pub fn add_write(mut self, value: &'a DescriptorSetWI) -> DescriptorSetsUpdateCI<'a> {
        self.writes.push(value); self
    }

    pub fn update(self, device: &VkDevice) {

        let writes: Vec<vk::WriteDescriptorSet> = self.writes.iter()
            .map(|write| write.value()).collect();

        unsafe {
            device.logic.handle.update_descriptor_sets(&writes, &[]);
        }
    }
}
// ----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    #[test]
    fn write_points_to_buffer_infos() {

        let buffer_info = vk::DescriptorBufferInfo {
            buffer: vk::Buffer::from_raw(7),
            offset: 0,
            range : vk::WHOLE_SIZE,
        };

        let write = DescriptorSetWI::new(vk::DescriptorSet::from_raw(1), 0, vk::DescriptorType::STORAGE_BUFFER)
            .add_buffer(buffer_info);

        let value = write.value();
        assert_eq!(value.s_type, vk::StructureType::WRITE_DESCRIPTOR_SET);
        assert_eq!(value.descriptor_count, 1);
        assert!(value.p_image_info.is_null());
        assert_eq!(unsafe { (*value.p_buffer_info).buffer }, vk::Buffer::from_raw(7));
    }

    #[test]
    fn layout_binding_has_no_immutable_samplers() {

        let layout = DescriptorSetLayoutCI::new()
            .add_binding(0, vk::DescriptorType::STORAGE_BUFFER, 1, vk::ShaderStageFlags::COMPUTE);

        let value = layout.value();
        assert_eq!(value.binding_count, 1);
        let binding = unsafe { *value.p_bindings };
        assert_eq!(binding.stage_flags, vk::ShaderStageFlags::COMPUTE);
        assert!(binding.p_immutable_samplers.is_null());
    }

    #[test]
    fn pool_sizes_are_counted() {

        let value = DescriptorPoolCI::new(1)
            .add_descriptor(vk::DescriptorType::STORAGE_BUFFER, 1)
            .add_descriptor(vk::DescriptorType::UNIFORM_BUFFER, 2)
            .value();

        assert_eq!(value.max_sets, 1);
        assert_eq!(value.pool_size_count, 2);
    }
}
