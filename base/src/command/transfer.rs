
use ash::vk;

use crate::ci::sync::FenceCI;
use crate::ci::device::SubmitCI;

use crate::command::VkCommandType;
use crate::command::recorder::VkCmdRecorder;

use crate::utils::time::VkTimeDuration;
use crate::{VkResult, VkError, vkbytes, vkuint};

pub struct ITransfer;

impl VkCommandType for ITransfer {
    const BIND_POINT: vk::PipelineBindPoint = vk::PipelineBindPoint::GRAPHICS;
}

impl<'a, T: VkCommandType> VkCmdRecorder<'a, T> {

    /// Submit the recorded command to `queue` and block until it completes.
    pub fn flush_copy_command(&self, queue: vk::Queue) -> VkResult<()> {

        let submit_ci = SubmitCI::new()
            .add_command(self.command);

        let wait_fence = self.device.build(&FenceCI::new())?;

        let result = self.device.submit(&submit_ci, queue, wait_fence)
            .and_then(|_| unsafe {
                self.device.logic.handle.wait_for_fences(&[wait_fence], true, VkTimeDuration::Infinite.into())
                    .map_err(|e| VkError::vulkan("Wait for fences", e))
            });

        self.device.discard(wait_fence);
        result
    }
}

/// Transfer commands are valid in every kind of command buffer.
impl<'a, T: VkCommandType> CmdTransferApi for VkCmdRecorder<'a, T> {

    fn copy_buf2buf(&self, src: vk::Buffer, dst: vk::Buffer, regions: &[vk::BufferCopy]) -> &Self {
        unsafe {
            self.device.logic.handle.cmd_copy_buffer(self.command, src, dst, regions);
        } self
    }

    fn copy_buf2img(&self, src: vk::Buffer, dst: vk::Image, dst_layout: vk::ImageLayout, regions: &[vk::BufferImageCopy]) -> &Self {
        unsafe {
            self.device.logic.handle.cmd_copy_buffer_to_image(self.command, src, dst, dst_layout, regions);
        } self
    }

    fn copy_img2buf(&self, src: vk::Image, src_layout: vk::ImageLayout, dst: vk::Buffer, regions: &[vk::BufferImageCopy]) -> &Self {
        unsafe {
            self.device.logic.handle.cmd_copy_image_to_buffer(self.command, src, src_layout, dst, regions);
        } self
    }

    fn copy_img2img(&self, src: vk::Image, src_layout: vk::ImageLayout, dst: vk::Image, dst_layout: vk::ImageLayout, regions: &[vk::ImageCopy]) -> &Self {
        unsafe {
            self.device.logic.handle.cmd_copy_image(self.command, src, src_layout, dst, dst_layout, regions);
        } self
    }

    fn blit_image(&self, src: vk::Image, src_layout: vk::ImageLayout, dst: vk::Image, dst_layout: vk::ImageLayout, regions: &[vk::ImageBlit], filter: vk::Filter) -> &Self {
        unsafe {
            self.device.logic.handle.cmd_blit_image(self.command, src, src_layout, dst, dst_layout, regions, filter);
        } self
    }

    fn fill_buffer(&self, buffer: vk::Buffer, offset: vkbytes, size: vkbytes, data: vkuint) -> &Self {
        unsafe {
            self.device.logic.handle.cmd_fill_buffer(self.command, buffer, offset, size, data);
        } self
    }

    fn clear_color_image(&self, image: vk::Image, layout: vk::ImageLayout, color: vk::ClearColorValue, ranges: &[vk::ImageSubresourceRange]) -> &Self {
        unsafe {
            self.device.logic.handle.cmd_clear_color_image(self.command, image, layout, &color, ranges);
        } self
    }

    fn image_pipeline_barrier(&self, src_stage: vk::PipelineStageFlags, dst_stage: vk::PipelineStageFlags, dependencies: vk::DependencyFlags, image_barriers: &[vk::ImageMemoryBarrier]) -> &Self {
        unsafe {
            self.device.logic.handle.cmd_pipeline_barrier(self.command, src_stage, dst_stage, dependencies, &[], &[], image_barriers);
        } self
    }

    fn pipeline_barrier(&self, src_stage: vk::PipelineStageFlags, dst_stage: vk::PipelineStageFlags, dependencies: vk::DependencyFlags, memory_barriers: &[vk::MemoryBarrier], buffer_barriers: &[vk::BufferMemoryBarrier], image_barriers: &[vk::ImageMemoryBarrier]) -> &Self {
        unsafe {
            self.device.logic.handle.cmd_pipeline_barrier(self.command, src_stage, dst_stage, dependencies, memory_barriers, buffer_barriers, image_barriers);
        } self
    }
}

pub trait CmdTransferApi {

    fn copy_buf2buf(&self, src: vk::Buffer, dst: vk::Buffer, regions: &[vk::BufferCopy]) -> &Self;

    fn copy_buf2img(&self, src: vk::Buffer, dst: vk::Image, dst_layout: vk::ImageLayout, regions: &[vk::BufferImageCopy]) -> &Self;

    fn copy_img2buf(&self, src: vk::Image, src_layout: vk::ImageLayout, dst: vk::Buffer, regions: &[vk::BufferImageCopy]) -> &Self;

    fn copy_img2img(&self, src: vk::Image, src_layout: vk::ImageLayout, dst: vk::Image, dst_layout: vk::ImageLayout, regions: &[vk::ImageCopy]) -> &Self;

    fn blit_image(&self, src: vk::Image, src_layout: vk::ImageLayout, dst: vk::Image, dst_layout: vk::ImageLayout, regions: &[vk::ImageBlit], filter: vk::Filter) -> &Self;

    fn fill_buffer(&self, buffer: vk::Buffer, offset: vkbytes, size: vkbytes, data: vkuint) -> &Self;

    fn clear_color_image(&self, image: vk::Image, layout: vk::ImageLayout, color: vk::ClearColorValue, ranges: &[vk::ImageSubresourceRange]) -> &Self;

    fn image_pipeline_barrier(&self, src_stage: vk::PipelineStageFlags, dst_stage: vk::PipelineStageFlags, dependencies: vk::DependencyFlags, image_barriers: &[vk::ImageMemoryBarrier]) -> &Self;

    fn pipeline_barrier(&self, src_stage: vk::PipelineStageFlags, dst_stage: vk::PipelineStageFlags, dependencies: vk::DependencyFlags, memory_barriers: &[vk::MemoryBarrier], buffer_barriers: &[vk::BufferMemoryBarrier], image_barriers: &[vk::ImageMemoryBarrier]) -> &Self;
}
