
use ash::vk;

use crate::context::{VkDevice, VkObjectDiscardable, VkObjectBindable};
use crate::ci::VkObjectBuildableCI;
use crate::error::{VkResult, VkError};
use crate::{vkbytes, vkuint, vkfloat};

// ----------------------------------------------------------------------------------------------
/// A 2D image with exclusive sharing and a single sample.
#[derive(Debug, Clone)]
pub struct ImageCI {

    format: vk::Format,
    extent: vk::Extent2D,
    flags: vk::ImageCreateFlags,
    usage: vk::ImageUsageFlags,
    tiling: vk::ImageTiling,
    mip_levels: vkuint,
    array_layers: vkuint,
}

impl VkObjectBuildableCI for ImageCI {
    /// The image and the memory requirement it must be bound with.
    type ObjectType = (vk::Image, vk::MemoryRequirements);

    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType> {

        unsafe {
            let image = device.logic.handle.create_image(&self.value(), None)
                .map_err(|e| VkError::vulkan("Image Creation", e))?;
            // sparse images report the requirement of the whole virtual range here.
            let requirement = device.logic.handle.get_image_memory_requirements(image);
            Ok((image, requirement))
        }
    }
}

impl ImageCI {

    pub fn new_2d(format: vk::Format, extent: vk::Extent2D) -> ImageCI {

        ImageCI {
            format, extent,
            flags: vk::ImageCreateFlags::empty(),
            usage: vk::ImageUsageFlags::empty(),
            tiling: vk::ImageTiling::OPTIMAL,
            mip_levels: 1,
            array_layers: 1,
        }
    }

    pub fn value(&self) -> vk::ImageCreateInfo {

        vk::ImageCreateInfo {
            flags: self.flags,
            image_type: vk::ImageType::TYPE_2D,
            format: self.format,
            extent: vk::Extent3D { width: self.extent.width, height: self.extent.height, depth: 1 },
            mip_levels: self.mip_levels,
            array_layers: self.array_layers,
            samples: vk::SampleCountFlags::TYPE_1,
            tiling: self.tiling,
            usage: self.usage,
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            initial_layout: vk::ImageLayout::UNDEFINED,
            ..Default::default()
        }
    }

    pub fn flags(mut self, flags: vk::ImageCreateFlags) -> ImageCI {
        self.flags = flags; self
    }

    pub fn usages(mut self, usage: vk::ImageUsageFlags) -> ImageCI {
        self.usage = usage; self
    }

    /// `LINEAR` tiling is needed to map the image memory directly.
    pub fn tiling(mut self, tiling: vk::ImageTiling) -> ImageCI {
        self.tiling = tiling; self
    }

    pub fn mip_levels(mut self, levels: vkuint) -> ImageCI {
        self.mip_levels = levels; self
    }

    pub fn array_layers(mut self, layers: vkuint) -> ImageCI {
        self.array_layers = layers; self
    }
}

impl VkObjectDiscardable for vk::Image {

    fn discard_by(self, device: &VkDevice) {
        unsafe {
            device.logic.handle.destroy_image(self, None);
        }
    }
}

impl VkObjectBindable for vk::Image {

    fn bind(self, device: &VkDevice, memory: vk::DeviceMemory, offset: vkbytes) -> VkResult<()> {
        unsafe {
            device.logic.handle.bind_image_memory(self, memory, offset)
                .map_err(|e| VkError::vulkan("Binding Image Memory", e))
        }
    }
}
// ----------------------------------------------------------------------------------------------

// ----------------------------------------------------------------------------------------------
/// A view with identity swizzle. It covers the first level and layer of the color aspect unless told otherwise.
#[derive(Debug, Clone)]
pub struct ImageViewCI {

    image: vk::Image,
    view_type: vk::ImageViewType,
    format: vk::Format,
    range: vk::ImageSubresourceRange,
}

impl VkObjectBuildableCI for ImageViewCI {
    type ObjectType = vk::ImageView;

    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType> {
        unsafe {
            device.logic.handle.create_image_view(&self.value(), None)
                .map_err(|e| VkError::vulkan("Image View Creation", e))
        }
    }
}

impl ImageViewCI {

    pub fn new(image: vk::Image, view_type: vk::ImageViewType, format: vk::Format) -> ImageViewCI {

        let range = vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            level_count: 1,
            layer_count: 1,
            ..Default::default()
        };
        ImageViewCI { image, view_type, format, range }
    }

    pub fn value(&self) -> vk::ImageViewCreateInfo {

        vk::ImageViewCreateInfo {
            image: self.image,
            view_type: self.view_type,
            format: self.format,
            components: vk::ComponentMapping::default(),
            subresource_range: self.range,
            ..Default::default()
        }
    }

    pub fn aspect_mask(mut self, aspect: vk::ImageAspectFlags) -> ImageViewCI {
        self.range.aspect_mask = aspect; self
    }

    pub fn mip_level(mut self, base_level: vkuint, level_count: vkuint) -> ImageViewCI {
        self.range.base_mip_level = base_level;
        self.range.level_count = level_count; self
    }

    pub fn array_layers(mut self, base_layer: vkuint, layer_count: vkuint) -> ImageViewCI {
        self.range.base_array_layer = base_layer;
        self.range.layer_count = layer_count; self
    }
}

impl VkObjectDiscardable for vk::ImageView {

    fn discard_by(self, device: &VkDevice) {
        unsafe {
            device.logic.handle.destroy_image_view(self, None)
        }
    }
}
// ----------------------------------------------------------------------------------------------

// ----------------------------------------------------------------------------------------------
/// A layout transition that keeps the image on its queue family.
#[derive(Debug, Clone)]
pub struct ImageBarrierCI {

    image: vk::Image,
    range: vk::ImageSubresourceRange,
    access: (vk::AccessFlags, vk::AccessFlags),
    layout: (vk::ImageLayout, vk::ImageLayout),
}

impl ImageBarrierCI {

    pub fn new(image: vk::Image, range: vk::ImageSubresourceRange) -> ImageBarrierCI {

        ImageBarrierCI {
            image, range,
            access: (vk::AccessFlags::empty(), vk::AccessFlags::empty()),
            layout: (vk::ImageLayout::UNDEFINED, vk::ImageLayout::UNDEFINED),
        }
    }

    pub fn value(&self) -> vk::ImageMemoryBarrier {

        vk::ImageMemoryBarrier {
            src_access_mask: self.access.0,
            dst_access_mask: self.access.1,
            old_layout: self.layout.0,
            new_layout: self.layout.1,
            src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            image: self.image,
            subresource_range: self.range,
            ..Default::default()
        }
    }

    pub fn access_mask(mut self, from: vk::AccessFlags, to: vk::AccessFlags) -> ImageBarrierCI {
        self.access = (from, to); self
    }

    pub fn layout(mut self, from: vk::ImageLayout, to: vk::ImageLayout) -> ImageBarrierCI {
        self.layout = (from, to); self
    }
}
// ----------------------------------------------------------------------------------------------

// ----------------------------------------------------------------------------------------------
/// Linear filtering with repeat addressing and no anisotropy.
#[derive(Debug, Clone, Default)]
pub struct SamplerCI {

    mip_lod_bias: vkfloat,
    min_lod: vkfloat,
    max_lod: vkfloat,
}

impl VkObjectBuildableCI for SamplerCI {
    type ObjectType = vk::Sampler;

    fn build(&self, device: &VkDevice) -> VkResult<vk::Sampler> {
        unsafe {
            device.logic.handle.create_sampler(&self.value(), None)
                .map_err(|e| VkError::vulkan("Sampler Creation", e))
        }
    }
}

impl SamplerCI {

    pub fn new() -> SamplerCI {
        SamplerCI::default()
    }

    pub fn value(&self) -> vk::SamplerCreateInfo {

        vk::SamplerCreateInfo {
            mag_filter: vk::Filter::LINEAR,
            min_filter: vk::Filter::LINEAR,
            mipmap_mode: vk::SamplerMipmapMode::LINEAR,
            address_mode_u: vk::SamplerAddressMode::REPEAT,
            address_mode_v: vk::SamplerAddressMode::REPEAT,
            address_mode_w: vk::SamplerAddressMode::REPEAT,
            mip_lod_bias: self.mip_lod_bias,
            max_anisotropy: 1.0,
            compare_op: vk::CompareOp::NEVER,
            min_lod: self.min_lod,
            max_lod: self.max_lod,
            border_color: vk::BorderColor::FLOAT_OPAQUE_WHITE,
            ..Default::default()
        }
    }

    /// `min` and `max` clamp the computed LOD, so `max` limits sampling to the levels that exist.
    pub fn lod(mut self, mip_bias: vkfloat, min: vkfloat, max: vkfloat) -> SamplerCI {
        self.mip_lod_bias = mip_bias;
        self.min_lod = min;
        self.max_lod = max; self
    }
}

impl VkObjectDiscardable for vk::Sampler {

    fn discard_by(self, device: &VkDevice) {
        unsafe {
            device.logic.handle.destroy_sampler(self, None);
        }
    }
}
// ----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sparse_image_create_info() {

        let extent = vk::Extent2D { width: 8192, height: 8192 };
        let value = ImageCI::new_2d(vk::Format::R8G8B8A8_UNORM, extent)
            .flags(vk::ImageCreateFlags::SPARSE_BINDING | vk::ImageCreateFlags::SPARSE_RESIDENCY)
            .usages(vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED)
            .mip_levels(14)
            .value();

        assert_eq!(value.s_type, vk::StructureType::IMAGE_CREATE_INFO);
        assert_eq!(value.extent.depth, 1);
        assert_eq!(value.mip_levels, 14);
        assert_eq!(value.samples, vk::SampleCountFlags::TYPE_1);
        assert!(value.flags.contains(vk::ImageCreateFlags::SPARSE_RESIDENCY));
        assert_eq!(value.sharing_mode, vk::SharingMode::EXCLUSIVE);
    }

    #[test]
    fn view_covers_requested_levels_and_layers() {

        let value = ImageViewCI::new(vk::Image::null(), vk::ImageViewType::TYPE_2D, vk::Format::R8G8B8A8_UNORM)
            .mip_level(0, 14)
            .array_layers(0, 2)
            .value();

        assert_eq!(value.subresource_range.aspect_mask, vk::ImageAspectFlags::COLOR);
        assert_eq!(value.subresource_range.level_count, 14);
        assert_eq!(value.subresource_range.layer_count, 2);
        assert_eq!(value.components.a, vk::ComponentSwizzle::IDENTITY);
    }

    #[test]
    fn barrier_keeps_queue_ownership() {

        let value = ImageBarrierCI::new(vk::Image::null(), vk::ImageSubresourceRange::default())
            .layout(vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .value();

        assert_eq!(value.src_queue_family_index, vk::QUEUE_FAMILY_IGNORED);
        assert_eq!(value.dst_queue_family_index, vk::QUEUE_FAMILY_IGNORED);
        assert_eq!(value.new_layout, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
    }

    #[test]
    fn sampler_lod_range() {

        let value = SamplerCI::new()
            .lod(0.0, 0.0, 13.0)
            .value();

        assert_relative_eq!(value.max_lod, 13.0);
        assert_eq!(value.anisotropy_enable, vk::FALSE);
        assert_eq!(value.min_filter, vk::Filter::LINEAR);
    }
}
