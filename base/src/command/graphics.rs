
use ash::vk;

use crate::command::VkCommandType;
use crate::command::recorder::VkCmdRecorder;
use crate::ci::pipeline::RenderPassBI;
use crate::{vkuint, vksint, vkbytes};

use std::{mem, slice};

pub struct IGraphics;

impl VkCommandType for IGraphics {
    const BIND_POINT: vk::PipelineBindPoint = vk::PipelineBindPoint::GRAPHICS;
}

impl<'a> CmdGraphicsApi for VkCmdRecorder<'a, IGraphics> {

    fn begin_render_pass(&self, bi: &RenderPassBI) -> &Self {
        unsafe {
            self.device.logic.handle.cmd_begin_render_pass(self.command, &bi.value(), vk::SubpassContents::INLINE);
        } self
    }

    fn set_viewport(&self, first_viewport: vkuint, viewports: &[vk::Viewport]) -> &Self {
        unsafe {
            self.device.logic.handle.cmd_set_viewport(self.command, first_viewport, viewports);
        } self
    }

    fn set_scissor(&self, first_scissor: vkuint, scissors: &[vk::Rect2D]) -> &Self {
        unsafe {
            self.device.logic.handle.cmd_set_scissor(self.command, first_scissor, scissors);
        } self
    }

    fn bind_pipeline(&self, pipeline: vk::Pipeline) -> &Self {
        unsafe {
            self.device.logic.handle.cmd_bind_pipeline(self.command, IGraphics::BIND_POINT, pipeline);
        } self
    }

    fn bind_vertex_buffers(&self, first_binding: vkuint, buffers: &[vk::Buffer], offsets: &[vkbytes]) -> &Self {
        unsafe {
            self.device.logic.handle.cmd_bind_vertex_buffers(self.command, first_binding, buffers, offsets);
        } self
    }

    fn bind_index_buffer(&self, buffer: vk::Buffer, index_type: vk::IndexType, offset: vkbytes) -> &Self {
        unsafe {
            self.device.logic.handle.cmd_bind_index_buffer(self.command, buffer, offset, index_type);
        } self
    }

    fn push_vertex_constants<C: Copy>(&self, layout: vk::PipelineLayout, offset: vkuint, constants: &C) -> &Self {

        let data = unsafe {
            slice::from_raw_parts(constants as *const C as *const u8, mem::size_of::<C>())
        };
        unsafe {
            self.device.logic.handle.cmd_push_constants(self.command, layout, vk::ShaderStageFlags::VERTEX, offset, data);
        } self
    }

    fn draw_indexed(&self, index_count: vkuint, instance_count: vkuint, first_index: vkuint, vertex_offset: vksint, first_instance: vkuint) -> &Self {
        unsafe {
            self.device.logic.handle.cmd_draw_indexed(self.command, index_count, instance_count, first_index, vertex_offset, first_instance);
        } self
    }

    fn end_render_pass(&self) -> &Self {
        // the final layouts of the attachments are decided by the render pass.
        unsafe {
            self.device.logic.handle.cmd_end_render_pass(self.command);
        } self
    }
}

/// Commands recorded inside a render pass. Only primary command buffers with inline contents are used.
pub trait CmdGraphicsApi {

    fn begin_render_pass(&self, bi: &RenderPassBI) -> &Self;

    fn set_viewport(&self, first_viewport: vkuint, viewports: &[vk::Viewport]) -> &Self;

    fn set_scissor(&self, first_scissor: vkuint, scissors: &[vk::Rect2D]) -> &Self;

    fn bind_pipeline(&self, pipeline: vk::Pipeline) -> &Self;

    fn bind_vertex_buffers(&self, first_binding: vkuint, buffers: &[vk::Buffer], offsets: &[vkbytes]) -> &Self;

    fn bind_index_buffer(&self, buffer: vk::Buffer, index_type: vk::IndexType, offset: vkbytes) -> &Self;

    /// Push a plain-old-data value as vertex stage push constants.
    fn push_vertex_constants<C: Copy>(&self, layout: vk::PipelineLayout, offset: vkuint, constants: &C) -> &Self;

    fn draw_indexed(&self, index_count: vkuint, instance_count: vkuint, first_index: vkuint, vertex_offset: vksint, first_instance: vkuint) -> &Self;

    fn end_render_pass(&self) -> &Self;
}
