
use ash::vk;

use crate::buffer::VkBuffer;
use crate::ci::image::{ImageCI, ImageViewCI, ImageBarrierCI, SamplerCI};
use crate::ci::command::CommandBufferAI;
use crate::ci::device::SubmitCI;
use crate::ci::sync::{FenceCI, SemaphoreCI};
use crate::ci::VkObjectBuildableCI;
use crate::command::{VkCmdRecorder, ITransfer, CmdTransferApi};
use crate::context::{VkDevice, VkQueue};
use crate::texture::virtual_texture::{VirtualTexture, VirtualTexturePage, mip_level_count, mip_extent};
use crate::utils::time::VkTimeDuration;
use crate::utils::memory::bound_to_alignment;
use crate::error::{VkResult, VkError};
use crate::{vkuint, vkbytes};

/// The parameters of a partially resident 2D texture.
#[derive(Debug, Clone)]
pub struct SparseTextureConfig {

    pub width : vkuint,
    pub height: vkuint,
    pub layers: vkuint,
    pub format: vk::Format,
    /// the size of a texel of `format` in bytes.
    pub texel_size: vkbytes,
    /// `None` means the full mip chain.
    pub mip_levels: Option<vkuint>,
}

impl Default for SparseTextureConfig {

    fn default() -> SparseTextureConfig {
        SparseTextureConfig {
            width : 8192,
            height: 8192,
            layers: 1,
            format: vk::Format::R8G8B8A8_UNORM,
            texel_size: 4,
            mip_levels: None,
        }
    }
}

/// A sparse residency image together with its page table, view and sampler.
pub struct SparseTexture {

    pub image  : vk::Image,
    pub view   : vk::ImageView,
    pub sampler: vk::Sampler,
    pub descriptor: vk::DescriptorImageInfo,

    pub width : vkuint,
    pub height: vkuint,
    pub layers: vkuint,
    pub mip_levels: vkuint,
    pub format: vk::Format,
    pub texel_size: vkbytes,

    pub virtual_texture: VirtualTexture,

    layout: vk::ImageLayout,
    bind_semaphore: vk::Semaphore,
    bind_state: BindState,
}

/// The order of sparse binds and the transfers that depend on them.
#[derive(Debug, Default, Clone, Copy)]
struct BindState {
    /// at least one bind has completed, so the mip tail is backed by memory.
    bound: bool,
    /// the bind semaphore has been signaled and no transfer has waited on it yet.
    signal_pending: bool,
}

impl BindState {

    /// Whether the next bind should signal the bind semaphore.
    fn signal_on_bind(&self) -> bool {
        !self.signal_pending
    }

    fn bind_completed(&mut self, signaled: bool) {
        self.bound = true;
        self.signal_pending = self.signal_pending || signaled;
    }

    /// Whether the next transfer should wait on the bind semaphore.
    fn wait_on_transfer(&self) -> VkResult<bool> {

        if self.bound {
            Ok(self.signal_pending)
        } else {
            Err(VkError::device("Transfer to a sparse texture whose memory is not bound yet"))
        }
    }

    fn transfer_completed(&mut self) {
        self.signal_pending = false;
    }
}

/// Pages are written by copies, read back by copies and sampled.
fn sparse_usage() -> vk::ImageUsageFlags {
    vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::TRANSFER_SRC | vk::ImageUsageFlags::SAMPLED
}

impl SparseTexture {

    /// Create the texture and bind its mip tail through `sparse_queue`.
    pub fn new(device: &VkDevice, sparse_queue: &VkQueue, config: &SparseTextureConfig) -> VkResult<SparseTexture> {

        let features = device.phy.enable_features();
        if features.sparse_binding != vk::TRUE {
            return Err(VkError::unsupported("Sparse Binding"))
        }
        if features.sparse_residency_image2_d != vk::TRUE {
            return Err(VkError::unsupported("Sparse Residency Image2D"))
        }

        let format_properties = device.phy.sparse_image_format_properties(
            config.format, vk::ImageType::TYPE_2D, vk::SampleCountFlags::TYPE_1, sparse_usage(), vk::ImageTiling::OPTIMAL);
        if format_properties.is_empty() {
            return Err(VkError::unsupported("Sparse image of the requested format"))
        }
        for properties in format_properties.iter() {
            log::debug!("Sparse format granularity: {}x{}x{}, aspect: {:?}, flags: {:?}.",
                properties.image_granularity.width, properties.image_granularity.height, properties.image_granularity.depth,
                properties.aspect_mask, properties.flags);
        }

        let mip_levels = config.mip_levels
            .unwrap_or(mip_level_count(config.width, config.height));

        let (image, requirement) = ImageCI::new_2d(config.format, vk::Extent2D { width: config.width, height: config.height })
            .flags(vk::ImageCreateFlags::SPARSE_BINDING | vk::ImageCreateFlags::SPARSE_RESIDENCY)
            .usages(sparse_usage())
            .mip_levels(mip_levels)
            .array_layers(config.layers)
            .build(device)?;

        let mut allocator = device;
        let mut virtual_texture = VirtualTexture::new(image, 0);

        let resources = SparseTexture::prepare_pages(device, image, config, mip_levels, &requirement, &mut virtual_texture)
            .and_then(|_| {
                let view = ImageViewCI::new(image, vk::ImageViewType::TYPE_2D, config.format)
                    .mip_level(0, mip_levels)
                    .array_layers(0, config.layers)
                    .build(device)?;
                let sampler = SamplerCI::new()
                    .lod(0.0, 0.0, mip_levels as _)
                    .build(device)
                    .map_err(|e| {
                        device.discard(view);
                        e
                    })?;
                let bind_semaphore = SemaphoreCI::new()
                    .build(device)
                    .map_err(|e| {
                        device.discard(sampler);
                        device.discard(view);
                        e
                    })?;
                Ok((view, sampler, bind_semaphore))
            });

        let (view, sampler, bind_semaphore) = match resources {
            | Ok(resources) => resources,
            | Err(e) => {
                virtual_texture.destroy(&mut allocator);
                device.discard(image);
                return Err(e)
            },
        };

        if let Err(e) = device.marker.set_object_name(image, "Sparse Texture") {
            log::warn!("{}", e);
        }

        log::info!("Sparse texture: {}x{}, {} mip levels, {} virtual pages, mip tail from level {}.",
            config.width, config.height, mip_levels, virtual_texture.page_count(), virtual_texture.mip_tail_start());

        let mut texture = SparseTexture {
            image, view, sampler,
            descriptor: vk::DescriptorImageInfo {
                sampler,
                image_view: view,
                image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            },
            width : config.width,
            height: config.height,
            layers: config.layers,
            format: config.format,
            texel_size: config.texel_size,
            mip_levels, virtual_texture,
            layout: vk::ImageLayout::UNDEFINED,
            bind_semaphore,
            bind_state: BindState::default(),
        };

        // the mip tail must be bound before any content is written to it.
        if let Err(e) = texture.bind(device, sparse_queue) {
            texture.discard(device);
            return Err(e)
        }

        Ok(texture)
    }

    fn prepare_pages(device: &VkDevice, image: vk::Image, config: &SparseTextureConfig, mip_levels: vkuint, requirement: &vk::MemoryRequirements, virtual_texture: &mut VirtualTexture) -> VkResult<()> {

        log::debug!("Sparse image memory requirements: size {}, alignment {}.", requirement.size, requirement.alignment);

        if requirement.size > device.phy.limits.sparse_address_space_size {
            return Err(VkError::other("Sparse image size exceeds the sparse address space of device."))
        }
        if requirement.alignment == 0 || requirement.size % requirement.alignment != 0 {
            return Err(VkError::other("Sparse image size is not a multiple of its alignment."))
        }

        let sparse_requirements = unsafe {
            device.logic.handle.get_image_sparse_memory_requirements(image)
        };
        for requirements in sparse_requirements.iter() {
            log::debug!("Sparse memory requirement: mip tail first lod {}, size {}, offset {}, stride {}.",
                requirements.image_mip_tail_first_lod, requirements.image_mip_tail_size,
                requirements.image_mip_tail_offset, requirements.image_mip_tail_stride);
        }

        let color_requirements = sparse_requirements.iter()
            .find(|requirements| requirements.format_properties.aspect_mask.contains(vk::ImageAspectFlags::COLOR))
            .ok_or(VkError::query("Sparse memory requirements of color aspect"))?;

        let memory_type_index = device.get_memory_type(requirement.memory_type_bits, vk::MemoryPropertyFlags::DEVICE_LOCAL)?;
        *virtual_texture = VirtualTexture::new(image, memory_type_index);

        let extent = vk::Extent3D { width: config.width, height: config.height, depth: 1 };
        virtual_texture.build_pages(extent, config.layers, color_requirements, requirement.alignment)?;

        let mut allocator = device;
        virtual_texture.bind_mip_tail(&mut allocator, config.layers, mip_levels, color_requirements)
    }

    /// Send the current page table to the device and wait until the binding completes.
    ///
    /// `queue` must support sparse binding.
    pub fn bind(&mut self, device: &VkDevice, queue: &VkQueue) -> VkResult<()> {

        if !queue.is_available() {
            return Err(VkError::device("Sparse binding requires a queue with sparse binding support"))
        }

        let mut bind_ci = self.virtual_texture.update_sparse_bind_info();
        let signal = self.bind_state.signal_on_bind();
        if signal {
            bind_ci = bind_ci.add_signal(self.bind_semaphore);
        }

        let fence = device.build(&FenceCI::new())?;
        let result = device.submit(&bind_ci, queue.handle, fence)
            .and_then(|_| wait_fence(device, fence));
        device.discard(fence);
        result?;

        self.bind_state.bind_completed(signal);
        Ok(())
    }

    /// Allocate memory for every non-resident page of `mip_level` and bind it.
    pub fn fill_mip_level(&mut self, device: &VkDevice, sparse_queue: &VkQueue, mip_level: vkuint) -> VkResult<Vec<usize>> {

        let mut allocator = device;
        let filled = self.virtual_texture.fill_mip_level(&mut allocator, mip_level)?;
        self.bind(device, sparse_queue)?;
        Ok(filled)
    }

    /// Allocate memory for the pages in `indices` and bind them. Returns the pages allocated by this call.
    pub fn fill_pages(&mut self, device: &VkDevice, sparse_queue: &VkQueue, indices: &[usize]) -> VkResult<Vec<usize>> {

        let mut allocator = device;
        let mut filled = Vec::with_capacity(indices.len());
        for &index in indices {
            if self.virtual_texture.allocate_page(index, &mut allocator)? {
                filled.push(index);
            }
        }

        self.bind(device, sparse_queue)?;
        Ok(filled)
    }

    /// Release the pages in `indices` and unbind them. Returns the pages released by this call.
    pub fn release_pages(&mut self, device: &VkDevice, sparse_queue: &VkQueue, indices: &[usize]) -> VkResult<Vec<usize>> {

        device.wait_idle()?;

        let mut allocator = device;
        let mut released = Vec::with_capacity(indices.len());
        for &index in indices {
            if self.virtual_texture.release_page(index, &mut allocator)? {
                released.push(index);
            }
        }

        self.bind(device, sparse_queue)?;
        Ok(released)
    }

    /// Release every page and unbind them all. The mip tail stays resident.
    pub fn flush(&mut self, device: &VkDevice, sparse_queue: &VkQueue) -> VkResult<()> {

        device.wait_idle()?;

        let mut allocator = device;
        self.virtual_texture.release_all(&mut allocator);
        self.bind(device, sparse_queue)
    }

    /// Write `content(page)` into each resident page of `indices`.
    ///
    /// `content` must return exactly the bytes of the page extent.
    pub fn upload_pages<F>(&mut self, device: &VkDevice, pool: vk::CommandPool, queue: &VkQueue, indices: &[usize], mut content: F) -> VkResult<()>
        where
            F: FnMut(&VirtualTexturePage) -> Vec<u8> {

        let mut data = Vec::new();
        let mut regions = Vec::with_capacity(indices.len());

        for &index in indices {

            let page = self.virtual_texture.page(index)
                .ok_or(VkError::other(format!("Page {} is out of range.", index)))?;
            if !page.is_resident() {
                return Err(VkError::device("Upload to a page that is not resident"))
            }

            let page_data = content(page);
            check_content_size(page.extent, self.texel_size, page_data.len())?;

            align_staging_data(&mut data);
            regions.push(page_copy_region(page, data.len() as vkbytes));
            data.extend_from_slice(&page_data);
        }

        if regions.is_empty() {
            return Ok(())
        }

        self.copy_from_host(device, pool, queue, &data, &regions)
    }

    /// Write `content(mip_level, extent)` into every mip level of the mip tail of every layer.
    pub fn fill_mip_tail<F>(&mut self, device: &VkDevice, pool: vk::CommandPool, queue: &VkQueue, mut content: F) -> VkResult<()>
        where
            F: FnMut(vkuint, vk::Extent3D) -> Vec<u8> {

        let full_extent = vk::Extent3D { width: self.width, height: self.height, depth: 1 };
        let mut data = Vec::new();
        let mut regions = Vec::new();

        for layer in 0..self.layers {
            for mip_level in self.virtual_texture.mip_tail_start()..self.mip_levels {

                let extent = mip_extent(full_extent, mip_level);
                let level_data = content(mip_level, extent);
                check_content_size(extent, self.texel_size, level_data.len())?;

                align_staging_data(&mut data);
                regions.push(vk::BufferImageCopy {
                    buffer_offset: data.len() as vkbytes,
                    buffer_row_length  : 0,
                    buffer_image_height: 0,
                    image_subresource: color_layers(mip_level, layer),
                    image_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
                    image_extent: extent,
                });
                data.extend_from_slice(&level_data);
            }
        }

        if regions.is_empty() {
            return Ok(())
        }

        self.copy_from_host(device, pool, queue, &data, &regions)
    }

    /// Copy the content of a resident page back to the host.
    pub fn read_page(&mut self, device: &VkDevice, pool: vk::CommandPool, queue: &VkQueue, index: usize) -> VkResult<Vec<u8>> {

        let page = self.virtual_texture.page(index)
            .ok_or(VkError::other(format!("Page {} is out of range.", index)))?;
        if !page.is_resident() {
            return Err(VkError::device("Read from a page that is not resident"))
        }

        let byte_size = page_byte_size(page.extent, self.texel_size);
        let region = page_copy_region(page, 0);

        let mut readback = VkBuffer::new(device, vk::BufferUsageFlags::TRANSFER_DST,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT, byte_size)?;

        let image = self.image;
        let old_layout = self.layout;
        let range = self.full_range();

        let result = self.transfer(device, pool, queue, |recorder| {
            recorder
                .image_pipeline_barrier(vk::PipelineStageFlags::TOP_OF_PIPE, vk::PipelineStageFlags::TRANSFER, vk::DependencyFlags::empty(), &[
                    layout_barrier(image, range, old_layout, vk::ImageLayout::TRANSFER_SRC_OPTIMAL)])
                .copy_img2buf(image, vk::ImageLayout::TRANSFER_SRC_OPTIMAL, readback.handle, &[region])
                .image_pipeline_barrier(vk::PipelineStageFlags::TRANSFER, vk::PipelineStageFlags::FRAGMENT_SHADER, vk::DependencyFlags::empty(), &[
                    layout_barrier(image, range, vk::ImageLayout::TRANSFER_SRC_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)]);
        }).and_then(|_| {
            let mut content = vec![0_u8; byte_size as usize];
            readback.map(device)?;
            readback.read_into(&mut content)?;
            Ok(content)
        });

        if result.is_ok() {
            self.layout = vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL;
        }
        readback.discard(device);
        result
    }

    fn copy_from_host(&mut self, device: &VkDevice, pool: vk::CommandPool, queue: &VkQueue, data: &[u8], regions: &[vk::BufferImageCopy]) -> VkResult<()> {

        let staging = VkBuffer::with_data(device, vk::BufferUsageFlags::TRANSFER_SRC,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT, data)?;

        let image = self.image;
        let old_layout = self.layout;
        let range = self.full_range();

        let result = self.transfer(device, pool, queue, |recorder| {
            recorder
                .begin_label("Upload Sparse Pages", [0.2, 0.6, 1.0, 1.0])
                .image_pipeline_barrier(vk::PipelineStageFlags::TOP_OF_PIPE, vk::PipelineStageFlags::TRANSFER, vk::DependencyFlags::empty(), &[
                    layout_barrier(image, range, old_layout, vk::ImageLayout::TRANSFER_DST_OPTIMAL)])
                .copy_buf2img(staging.handle, image, vk::ImageLayout::TRANSFER_DST_OPTIMAL, regions)
                .image_pipeline_barrier(vk::PipelineStageFlags::TRANSFER, vk::PipelineStageFlags::FRAGMENT_SHADER, vk::DependencyFlags::empty(), &[
                    layout_barrier(image, range, vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)])
                .end_label();
        });

        if result.is_ok() {
            self.layout = vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL;
        }
        staging.discard(device);
        result
    }

    /// Record with `record` and run the command on `queue`, waiting for a pending sparse binding first.
    fn transfer<R>(&mut self, device: &VkDevice, pool: vk::CommandPool, queue: &VkQueue, record: R) -> VkResult<()>
        where
            R: FnOnce(&VkCmdRecorder<ITransfer>) {

        let wait_bind = self.bind_state.wait_on_transfer()?;

        let command = CommandBufferAI::new(pool, 1)
            .build(device)?
            .into_iter().next()
            .ok_or(VkError::create("Command Buffer"))?;

        let recorder: VkCmdRecorder<ITransfer> = VkCmdRecorder::new(device, command);

        let mut submit_ci = SubmitCI::new().add_command(command);
        if wait_bind {
            submit_ci = submit_ci.add_wait(vk::PipelineStageFlags::TRANSFER, self.bind_semaphore);
        }

        let result = recorder.begin_record()
            .and_then(|recorder| {
                record(recorder);
                recorder.end_record()
            })
            .and_then(|_| device.build(&FenceCI::new()))
            .and_then(|fence| {
                let result = device.submit(&submit_ci, queue.handle, fence)
                    .and_then(|_| wait_fence(device, fence));
                device.discard(fence);
                result
            });

        if result.is_ok() {
            self.bind_state.transfer_completed();
        }
        device.free(command, pool);
        result
    }

    fn full_range(&self) -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: self.mip_levels,
            base_array_layer: 0,
            layer_count: self.layers,
        }
    }

    /// Release all memory and destroy every object of this texture. The device must be idle.
    pub fn discard(mut self, device: &VkDevice) {

        let mut allocator = device;
        self.virtual_texture.destroy(&mut allocator);

        device.discard(self.bind_semaphore);
        device.discard(self.sampler);
        device.discard(self.view);
        device.discard(self.image);
    }
}

fn wait_fence(device: &VkDevice, fence: vk::Fence) -> VkResult<()> {
    unsafe {
        device.logic.handle.wait_for_fences(&[fence], true, VkTimeDuration::Infinite.into())
            .map_err(|e| VkError::vulkan("Wait for fences", e))
    }
}

fn layout_barrier(image: vk::Image, range: vk::ImageSubresourceRange, from: vk::ImageLayout, to: vk::ImageLayout) -> vk::ImageMemoryBarrier {

    let access = |layout: vk::ImageLayout| match layout {
        | vk::ImageLayout::TRANSFER_DST_OPTIMAL => vk::AccessFlags::TRANSFER_WRITE,
        | vk::ImageLayout::TRANSFER_SRC_OPTIMAL => vk::AccessFlags::TRANSFER_READ,
        | vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL => vk::AccessFlags::SHADER_READ,
        | _ => vk::AccessFlags::empty(),
    };

    ImageBarrierCI::new(image, range)
        .access_mask(access(from), access(to))
        .layout(from, to)
        .value()
}

fn color_layers(mip_level: vkuint, layer: vkuint) -> vk::ImageSubresourceLayers {
    vk::ImageSubresourceLayers {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        mip_level,
        base_array_layer: layer,
        layer_count: 1,
    }
}

fn page_byte_size(extent: vk::Extent3D, texel_size: vkbytes) -> vkbytes {
    (extent.width as vkbytes) * (extent.height as vkbytes) * (extent.depth as vkbytes) * texel_size
}

fn check_content_size(extent: vk::Extent3D, texel_size: vkbytes, len: usize) -> VkResult<()> {

    let expected = page_byte_size(extent, texel_size);
    if expected != len as vkbytes {
        Err(VkError::other(format!("Expect {} bytes of content for a {}x{} region, but got {}.", expected, extent.width, extent.height, len)))
    } else {
        Ok(())
    }
}

/// Copy offsets into the staging buffer must be aligned to both 4 bytes and the texel size.
const STAGING_ALIGNMENT: vkbytes = 16;

fn align_staging_data(data: &mut Vec<u8>) {
    let aligned = bound_to_alignment(data.len() as vkbytes, STAGING_ALIGNMENT);
    data.resize(aligned as usize, 0);
}

fn page_copy_region(page: &VirtualTexturePage, buffer_offset: vkbytes) -> vk::BufferImageCopy {

    vk::BufferImageCopy {
        buffer_offset,
        buffer_row_length  : 0,
        buffer_image_height: 0,
        image_subresource: color_layers(page.mip_level, page.layer),
        image_offset: page.offset,
        image_extent: page.extent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    fn sample_page() -> VirtualTexturePage {

        let mut texture = VirtualTexture::new(vk::Image::from_raw(1), 0);
        texture.add_page(vk::Offset3D { x: 256, y: 128, z: 0 }, vk::Extent3D { width: 128, height: 64, depth: 1 }, 65536, 2, 1);
        texture.pages()[0].clone()
    }

    #[test]
    fn copy_region_targets_the_page() {

        let page = sample_page();
        let region = page_copy_region(&page, 4096);

        assert_eq!(region.buffer_offset, 4096);
        assert_eq!(region.image_offset.x, 256);
        assert_eq!(region.image_offset.y, 128);
        assert_eq!(region.image_extent.height, 64);
        assert_eq!(region.image_subresource.mip_level, 2);
        assert_eq!(region.image_subresource.base_array_layer, 1);
        assert_eq!(region.image_subresource.layer_count, 1);
    }

    #[test]
    fn content_must_cover_the_page_exactly() {

        let extent = vk::Extent3D { width: 128, height: 64, depth: 1 };
        assert_eq!(page_byte_size(extent, 4), 32768);
        assert!(check_content_size(extent, 4, 32768).is_ok());
        assert!(check_content_size(extent, 4, 32767).is_err());
    }

    #[test]
    fn barrier_access_follows_layouts() {

        let range = vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0, level_count: 4,
            base_array_layer: 0, layer_count: 1,
        };
        let barrier = layout_barrier(vk::Image::from_raw(1), range,
            vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL);

        assert_eq!(barrier.src_access_mask, vk::AccessFlags::empty());
        assert_eq!(barrier.dst_access_mask, vk::AccessFlags::TRANSFER_WRITE);
        assert_eq!(barrier.subresource_range.level_count, 4);
    }

    #[test]
    fn transfer_before_first_bind_is_rejected() {

        let mut state = BindState::default();
        assert!(state.wait_on_transfer().is_err());

        // the bind at creation backs the mip tail.
        state.bind_completed(state.signal_on_bind());
        assert_eq!(state.wait_on_transfer().unwrap(), true);
    }

    #[test]
    fn bind_semaphore_is_signaled_once_per_transfer() {

        let mut state = BindState::default();

        let signal = state.signal_on_bind();
        assert!(signal);
        state.bind_completed(signal);

        // a signal is still pending, so the second bind must not signal again.
        let signal = state.signal_on_bind();
        assert!(!signal);
        state.bind_completed(signal);

        assert_eq!(state.wait_on_transfer().unwrap(), true);
        state.transfer_completed();
        assert_eq!(state.wait_on_transfer().unwrap(), false);

        assert!(state.signal_on_bind());
    }

    #[test]
    fn staging_offsets_are_aligned() {

        let mut data = vec![0_u8; 4];
        align_staging_data(&mut data);
        assert_eq!(data.len(), 16);

        align_staging_data(&mut data);
        assert_eq!(data.len(), 16);
    }

    #[test]
    fn default_config_is_full_chain_rgba() {

        let config = SparseTextureConfig::default();
        assert_eq!(config.format, vk::Format::R8G8B8A8_UNORM);
        assert_eq!(config.texel_size, 4);
        assert!(config.mip_levels.is_none());
        assert_eq!(mip_level_count(config.width, config.height), 14);
    }
}
