
pub use self::renderpass::{RenderPassBI, RenderPassCI, AttachmentDescCI, SubpassDescCI, SubpassDependencyCI, FramebufferCI};
pub use self::state::{VertexInputSCI, RasterizationSCI, DepthStencilSCI};

mod renderpass;
mod state;

use ash::vk;

use crate::context::{VkDevice, VkObjectDiscardable};
use crate::ci::{VulkanCI, VkObjectBuildableCI};
use crate::ci::shader::ShaderStageCI;
use crate::error::{VkResult, VkError};

use self::state::FixedStates;

// ----------------------------------------------------------------------------------------------
/// Wrapper class for vk::PipelineLayoutCreateInfo.
#[derive(Debug, Clone, Default)]
pub struct PipelineLayoutCI {

    set_layouts: Vec<vk::DescriptorSetLayout>,
    push_constants: Vec<vk::PushConstantRange>,
}

impl VkObjectBuildableCI for PipelineLayoutCI {
    type ObjectType = vk::PipelineLayout;

    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType> {

        let layout_ci = vk::PipelineLayoutCreateInfo {
            set_layout_count: self.set_layouts.len() as _,
            p_set_layouts   : self.set_layouts.as_ptr(),
            push_constant_range_count: self.push_constants.len() as _,
            p_push_constant_ranges   : self.push_constants.as_ptr(),
            ..Default::default()
        };

        unsafe {
            device.logic.handle.create_pipeline_layout(&layout_ci, None)
                .map_err(|e| VkError::vulkan("Pipeline Layout Creation", e))
        }
    }
}

impl PipelineLayoutCI {

    pub fn new() -> PipelineLayoutCI {
        PipelineLayoutCI::default()
    }

    #[inline(always)]
    pub fn add_set_layout(mut self, set_layout: vk::DescriptorSetLayout) -> PipelineLayoutCI {
        self.set_layouts.push(set_layout); self
    }

    #[inline(always)]
    pub fn add_push_constants(mut self, range: vk::PushConstantRange) -> PipelineLayoutCI {
        self.push_constants.push(range); self
    }
}

impl VkObjectDiscardable for vk::PipelineLayout {

    fn discard_by(self, device: &VkDevice) {
        unsafe {
            device.logic.handle.destroy_pipeline_layout(self, None);
        }
    }
}
// ----------------------------------------------------------------------------------------------

// ----------------------------------------------------------------------------------------------
/// Wrapper class for vk::ComputePipelineCreateInfo.
#[derive(Debug)]
pub struct ComputePipelineCI {

    layout: vk::PipelineLayout,
    stage: ShaderStageCI,
}

impl VkObjectBuildableCI for ComputePipelineCI {
    type ObjectType = vk::Pipeline;

    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType> {

        let pipeline_ci = vk::ComputePipelineCreateInfo {
            stage : self.stage.value(),
            layout: self.layout,
            base_pipeline_index: -1,
            ..Default::default()
        };

        let pipelines = unsafe {
            device.logic.handle.create_compute_pipelines(vk::PipelineCache::null(), &[pipeline_ci], None)
                .map_err(|(_, e)| VkError::vulkan("Compute Pipeline Creation", e))?
        };

        pipelines.into_iter().next()
            .ok_or(VkError::create("Compute Pipeline"))
    }
}

impl ComputePipelineCI {

    pub fn new(layout: vk::PipelineLayout, stage: ShaderStageCI) -> ComputePipelineCI {
        ComputePipelineCI { layout, stage }
    }
}

impl VkObjectDiscardable for vk::Pipeline {

    fn discard_by(self, device: &VkDevice) {
        unsafe {
            device.logic.handle.destroy_pipeline(self, None);
        }
    }
}
// ----------------------------------------------------------------------------------------------

// ----------------------------------------------------------------------------------------------
/// Wrapper class for vk::GraphicsPipelineCreateInfo of the first subpass of `render_pass`.
///
/// Vertex input, rasterization and depth stencil can be replaced. The other states are fixed.
#[derive(Debug)]
pub struct GraphicsPipelineCI {

    ci: vk::GraphicsPipelineCreateInfo,
    stages: Vec<ShaderStageCI>,

    vertex_input : VertexInputSCI,
    rasterization: RasterizationSCI,
    depth_stencil: DepthStencilSCI,
    fixed: FixedStates,
}

impl VulkanCI<vk::GraphicsPipelineCreateInfo> for GraphicsPipelineCI {

    fn default_ci() -> vk::GraphicsPipelineCreateInfo {

        vk::GraphicsPipelineCreateInfo {
            subpass: 0,
            base_pipeline_index: -1,
            ..Default::default()
        }
    }
}

impl VkObjectBuildableCI for GraphicsPipelineCI {
    type ObjectType = vk::Pipeline;

    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType> {

        let stages: Vec<vk::PipelineShaderStageCreateInfo> = self.stages.iter()
            .map(ShaderStageCI::value).collect();

        let vertex_input  = self.vertex_input.value();
        let rasterization = self.rasterization.value();
        let depth_stencil = self.depth_stencil.value();
        let viewport      = self.fixed.viewport();
        let color_blend   = self.fixed.color_blend();
        let dynamics      = self.fixed.dynamics();

        let pipeline_ci = vk::GraphicsPipelineCreateInfo {
            stage_count: stages.len() as _,
            p_stages   : stages.as_ptr(),
            p_vertex_input_state  : &vertex_input,
            p_input_assembly_state: &self.fixed.input_assembly,
            p_viewport_state      : &viewport,
            p_rasterization_state : &rasterization,
            p_multisample_state   : &self.fixed.multisample,
            p_depth_stencil_state : &depth_stencil,
            p_color_blend_state   : &color_blend,
            p_dynamic_state       : &dynamics,
            ..self.ci
        };

        let pipelines = unsafe {
            device.logic.handle.create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_ci], None)
                .map_err(|(_, e)| VkError::vulkan("Graphics Pipeline Creation", e))?
        };

        pipelines.into_iter().next()
            .ok_or(VkError::create("Graphics Pipeline"))
    }
}

impl GraphicsPipelineCI {

    pub fn new(render_pass: vk::RenderPass, layout: vk::PipelineLayout) -> GraphicsPipelineCI {

        GraphicsPipelineCI {
            ci: vk::GraphicsPipelineCreateInfo {
                render_pass, layout,
                ..GraphicsPipelineCI::default_ci()
            },
            stages: Vec::new(),
            vertex_input : VertexInputSCI::new(),
            rasterization: RasterizationSCI::new(),
            depth_stencil: DepthStencilSCI::new(),
            fixed: FixedStates::new(),
        }
    }

    #[inline(always)]
    pub fn add_stage(mut self, stage: ShaderStageCI) -> GraphicsPipelineCI {
        self.stages.push(stage); self
    }

    #[inline(always)]
    pub fn set_vertex_input(mut self, state: VertexInputSCI) -> GraphicsPipelineCI {
        self.vertex_input = state; self
    }

    #[inline(always)]
    pub fn set_rasterization(mut self, state: RasterizationSCI) -> GraphicsPipelineCI {
        self.rasterization = state; self
    }

    #[inline(always)]
    pub fn set_depth_stencil(mut self, state: DepthStencilSCI) -> GraphicsPipelineCI {
        self.depth_stencil = state; self
    }
}
// ----------------------------------------------------------------------------------------------
