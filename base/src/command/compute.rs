
use ash::vk;

use crate::command::VkCommandType;
use crate::command::recorder::VkCmdRecorder;
use crate::vkuint;

pub struct ICompute;

impl VkCommandType for ICompute {
    const BIND_POINT: vk::PipelineBindPoint = vk::PipelineBindPoint::COMPUTE;
}

impl<'a> CmdComputeApi for VkCmdRecorder<'a, ICompute> {

    fn bind_pipeline(&self, pipeline: vk::Pipeline) -> &Self {
        unsafe {
            self.device.logic.handle.cmd_bind_pipeline(self.command, ICompute::BIND_POINT, pipeline);
        } self
    }

    fn bind_descriptor_sets(&self, layout: vk::PipelineLayout, first_set: vkuint, descriptor_sets: &[vk::DescriptorSet], dynamic_offsets: &[vkuint]) -> &Self {
        unsafe {
            self.device.logic.handle.cmd_bind_descriptor_sets(self.command, ICompute::BIND_POINT, layout, first_set, descriptor_sets, dynamic_offsets);
        } self
    }

    fn dispatch(&self, group_count_x: vkuint, group_count_y: vkuint, group_count_z: vkuint) -> &Self {
        unsafe {
            self.device.logic.handle.cmd_dispatch(self.command, group_count_x, group_count_y, group_count_z);
        } self
    }

    fn buffer_pipeline_barrier(&self, src_stage: vk::PipelineStageFlags, dst_stage: vk::PipelineStageFlags, dependencies: vk::DependencyFlags, buffer_barriers: &[vk::BufferMemoryBarrier]) -> &Self {
        unsafe {
            self.device.logic.handle.cmd_pipeline_barrier(self.command, src_stage, dst_stage, dependencies, &[], buffer_barriers, &[]);
        } self
    }
}

pub trait CmdComputeApi {

    fn bind_pipeline(&self, pipeline: vk::Pipeline) -> &Self;

    fn bind_descriptor_sets(&self, layout: vk::PipelineLayout, first_set: vkuint, descriptor_sets: &[vk::DescriptorSet], dynamic_offsets: &[vkuint]) -> &Self;

    fn dispatch(&self, group_count_x: vkuint, group_count_y: vkuint, group_count_z: vkuint) -> &Self;

    fn buffer_pipeline_barrier(&self, src_stage: vk::PipelineStageFlags, dst_stage: vk::PipelineStageFlags, dependencies: vk::DependencyFlags, buffer_barriers: &[vk::BufferMemoryBarrier]) -> &Self;
}
