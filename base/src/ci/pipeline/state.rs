
use ash::vk;

use crate::ci::VulkanCI;

#[inline(always)]
fn vk_bool(is_enable: bool) -> vk::Bool32 {
    if is_enable { vk::TRUE } else { vk::FALSE }
}

// ----------------------------------------------------------------------------------------------
/// Wrapper class for vk::PipelineVertexInputStateCreateInfo.
#[derive(Debug, Clone, Default)]
pub struct VertexInputSCI {

    bindings  : Vec<vk::VertexInputBindingDescription>,
    attributes: Vec<vk::VertexInputAttributeDescription>,
}

impl VertexInputSCI {

    pub fn new() -> VertexInputSCI {
        VertexInputSCI::default()
    }

    /// The returned value points into `self`.
    pub fn value(&self) -> vk::PipelineVertexInputStateCreateInfo {

        vk::PipelineVertexInputStateCreateInfo {
            vertex_binding_description_count  : self.bindings.len() as _,
            p_vertex_binding_descriptions     : self.bindings.as_ptr(),
            vertex_attribute_description_count: self.attributes.len() as _,
            p_vertex_attribute_descriptions   : self.attributes.as_ptr(),
            ..Default::default()
        }
    }

    #[inline(always)]
    pub fn add_binding(mut self, binding: vk::VertexInputBindingDescription) -> VertexInputSCI {
        self.bindings.push(binding); self
    }

    #[inline(always)]
    pub fn add_attribute(mut self, attribute: vk::VertexInputAttributeDescription) -> VertexInputSCI {
        self.attributes.push(attribute); self
    }
}
// ----------------------------------------------------------------------------------------------

// ----------------------------------------------------------------------------------------------
/// Wrapper class for vk::PipelineRasterizationStateCreateInfo. Filled polygons without culling by default.
#[derive(Debug, Clone)]
pub struct RasterizationSCI {
    ci: vk::PipelineRasterizationStateCreateInfo,
}

impl VulkanCI<vk::PipelineRasterizationStateCreateInfo> for RasterizationSCI {

    fn default_ci() -> vk::PipelineRasterizationStateCreateInfo {

        vk::PipelineRasterizationStateCreateInfo {
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode   : vk::CullModeFlags::NONE,
            front_face  : vk::FrontFace::COUNTER_CLOCKWISE,
            line_width  : 1.0,
            ..Default::default()
        }
    }
}

impl RasterizationSCI {

    #[inline(always)]
    pub fn new() -> RasterizationSCI {
        RasterizationSCI { ci: RasterizationSCI::default_ci() }
    }

    pub fn value(&self) -> vk::PipelineRasterizationStateCreateInfo {
        self.ci
    }

    #[inline(always)]
    pub fn cull_face(mut self, mode: vk::CullModeFlags, front_face: vk::FrontFace) -> RasterizationSCI {
        self.ci.cull_mode = mode;
        self.ci.front_face = front_face; self
    }
}
// ----------------------------------------------------------------------------------------------

// ----------------------------------------------------------------------------------------------
/// Wrapper class for vk::PipelineDepthStencilStateCreateInfo. Depth and stencil tests start disabled.
#[derive(Debug, Clone)]
pub struct DepthStencilSCI {
    ci: vk::PipelineDepthStencilStateCreateInfo,
}

impl VulkanCI<vk::PipelineDepthStencilStateCreateInfo> for DepthStencilSCI {

    fn default_ci() -> vk::PipelineDepthStencilStateCreateInfo {

        let keep = vk::StencilOpState {
            fail_op: vk::StencilOp::KEEP,
            pass_op: vk::StencilOp::KEEP,
            depth_fail_op: vk::StencilOp::KEEP,
            compare_op: vk::CompareOp::ALWAYS,
            ..Default::default()
        };

        vk::PipelineDepthStencilStateCreateInfo {
            depth_compare_op: vk::CompareOp::LESS_OR_EQUAL,
            front: keep,
            back : keep,
            max_depth_bounds: 1.0,
            ..Default::default()
        }
    }
}

impl DepthStencilSCI {

    #[inline(always)]
    pub fn new() -> DepthStencilSCI {
        DepthStencilSCI { ci: DepthStencilSCI::default_ci() }
    }

    pub fn value(&self) -> vk::PipelineDepthStencilStateCreateInfo {
        self.ci
    }

    #[inline(always)]
    pub fn depth_test(mut self, is_enable_test: bool, is_enable_write: bool, compare_op: vk::CompareOp) -> DepthStencilSCI {
        self.ci.depth_test_enable = vk_bool(is_enable_test);
        self.ci.depth_write_enable = vk_bool(is_enable_write);
        self.ci.depth_compare_op = compare_op; self
    }
}
// ----------------------------------------------------------------------------------------------

// ----------------------------------------------------------------------------------------------
/// The states shared by every graphics pipeline: triangle lists, a single sample,
/// one opaque color attachment, and viewport and scissor given at record time.
#[derive(Debug, Clone)]
pub(super) struct FixedStates {

    pub input_assembly: vk::PipelineInputAssemblyStateCreateInfo,
    pub multisample: vk::PipelineMultisampleStateCreateInfo,

    blend_attachments: [vk::PipelineColorBlendAttachmentState; 1],
    dynamic_states: [vk::DynamicState; 2],
}

impl FixedStates {

    pub fn new() -> FixedStates {

        FixedStates {
            input_assembly: vk::PipelineInputAssemblyStateCreateInfo {
                topology: vk::PrimitiveTopology::TRIANGLE_LIST,
                ..Default::default()
            },
            multisample: vk::PipelineMultisampleStateCreateInfo {
                rasterization_samples: vk::SampleCountFlags::TYPE_1,
                ..Default::default()
            },
            blend_attachments: [vk::PipelineColorBlendAttachmentState {
                blend_enable: vk::FALSE,
                color_write_mask: vk::ColorComponentFlags::RGBA,
                ..Default::default()
            }],
            dynamic_states: [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR],
        }
    }

    /// Only the counts are read, since both states are dynamic.
    pub fn viewport(&self) -> vk::PipelineViewportStateCreateInfo {

        vk::PipelineViewportStateCreateInfo {
            viewport_count: 1,
            scissor_count : 1,
            ..Default::default()
        }
    }

    /// The returned value points into `self`.
    pub fn color_blend(&self) -> vk::PipelineColorBlendStateCreateInfo {

        vk::PipelineColorBlendStateCreateInfo {
            logic_op: vk::LogicOp::COPY,
            attachment_count: self.blend_attachments.len() as _,
            p_attachments   : self.blend_attachments.as_ptr(),
            ..Default::default()
        }
    }

    /// The returned value points into `self`.
    pub fn dynamics(&self) -> vk::PipelineDynamicStateCreateInfo {

        vk::PipelineDynamicStateCreateInfo {
            dynamic_state_count: self.dynamic_states.len() as _,
            p_dynamic_states   : self.dynamic_states.as_ptr(),
            ..Default::default()
        }
    }
}
// ----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_input_counts_follow_descriptions() {

        let state = VertexInputSCI::new()
            .add_binding(vk::VertexInputBindingDescription { binding: 0, stride: 24, input_rate: vk::VertexInputRate::VERTEX })
            .add_attribute(vk::VertexInputAttributeDescription { location: 0, binding: 0, format: vk::Format::R32G32B32_SFLOAT, offset: 0 })
            .add_attribute(vk::VertexInputAttributeDescription { location: 1, binding: 0, format: vk::Format::R32G32B32_SFLOAT, offset: 12 });

        let value = state.value();
        assert_eq!(value.s_type, vk::StructureType::PIPELINE_VERTEX_INPUT_STATE_CREATE_INFO);
        assert_eq!(value.vertex_binding_description_count, 1);
        assert_eq!(value.vertex_attribute_description_count, 2);
    }

    #[test]
    fn depth_test_enables_write_and_compare() {

        let value = DepthStencilSCI::new()
            .depth_test(true, true, vk::CompareOp::LESS_OR_EQUAL)
            .value();

        assert_eq!(value.depth_test_enable, vk::TRUE);
        assert_eq!(value.depth_write_enable, vk::TRUE);
        assert_eq!(value.stencil_test_enable, vk::FALSE);
        assert_eq!(value.back.compare_op, vk::CompareOp::ALWAYS);
    }

    #[test]
    fn fixed_states_use_dynamic_viewport() {

        let states = FixedStates::new();
        assert_eq!(states.input_assembly.topology, vk::PrimitiveTopology::TRIANGLE_LIST);
        assert_eq!(states.multisample.rasterization_samples, vk::SampleCountFlags::TYPE_1);
        assert_eq!(states.color_blend().attachment_count, 1);
        assert_eq!(states.dynamics().dynamic_state_count, 2);
        assert!(states.viewport().p_viewports.is_null());
    }

    #[test]
    fn back_faces_are_culled_when_requested() {

        let value = RasterizationSCI::new()
            .cull_face(vk::CullModeFlags::BACK, vk::FrontFace::CLOCKWISE)
            .value();

        assert_eq!(value.cull_mode, vk::CullModeFlags::BACK);
        assert_eq!(value.front_face, vk::FrontFace::CLOCKWISE);
        assert_eq!(value.polygon_mode, vk::PolygonMode::FILL);
    }
}
