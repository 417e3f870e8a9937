
use ash::vk;

use crate::context::{VkDevice, VkObjectDiscardable};
use crate::ci::VkObjectBuildableCI;
use crate::error::{VkResult, VkError};
use crate::vkuint;

use std::ptr;

// ----------------------------------------------------------------------------------------------
/// Begin info over the whole framebuffer area, with one clear value per attachment.
#[derive(Clone)]
pub struct RenderPassBI {

    render_pass: vk::RenderPass,
    framebuffer: vk::Framebuffer,
    extent: vk::Extent2D,
    clears: Vec<vk::ClearValue>,
}

impl RenderPassBI {

    pub fn new(render_pass: vk::RenderPass, framebuffer: vk::Framebuffer, extent: vk::Extent2D) -> RenderPassBI {
        RenderPassBI { render_pass, framebuffer, extent, clears: Vec::new() }
    }

    pub fn add_clear_value(mut self, value: vk::ClearValue) -> RenderPassBI {
        self.clears.push(value); self
    }

    /// The returned value points into `self`.
    pub fn value(&self) -> vk::RenderPassBeginInfo {

        vk::RenderPassBeginInfo {
            render_pass: self.render_pass,
            framebuffer: self.framebuffer,
            render_area: vk::Rect2D { offset: vk::Offset2D::default(), extent: self.extent },
            clear_value_count: self.clears.len() as _,
            p_clear_values   : self.clears.as_ptr(),
            ..Default::default()
        }
    }
}
// ----------------------------------------------------------------------------------------------

// ----------------------------------------------------------------------------------------------
/// Wrapper class for vk::RenderPassCreateInfo.
#[derive(Debug, Clone, Default)]
pub struct RenderPassCI {

    attachments : Vec<vk::AttachmentDescription>,
    subpasses   : Vec<SubpassDescCI>,
    dependencies: Vec<vk::SubpassDependency>,
}

impl VkObjectBuildableCI for RenderPassCI {
    type ObjectType = vk::RenderPass;

    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType> {

        // the descriptions point into the references owned by `self.subpasses`.
        let subpasses: Vec<vk::SubpassDescription> = self.subpasses.iter()
            .map(SubpassDescCI::value).collect();

        let render_pass_ci = vk::RenderPassCreateInfo {
            attachment_count: self.attachments.len() as _,
            p_attachments   : self.attachments.as_ptr(),
            subpass_count   : subpasses.len() as _,
            p_subpasses     : subpasses.as_ptr(),
            dependency_count: self.dependencies.len() as _,
            p_dependencies  : self.dependencies.as_ptr(),
            ..Default::default()
        };

        unsafe {
            device.logic.handle.create_render_pass(&render_pass_ci, None)
                .map_err(|e| VkError::vulkan("Render Pass Creation", e))
        }
    }
}

impl RenderPassCI {

    pub fn new() -> RenderPassCI {
        RenderPassCI::default()
    }

    #[inline]
    pub fn add_attachment(mut self, attachment: AttachmentDescCI) -> RenderPassCI {
        self.attachments.push(attachment.desc); self
    }

    #[inline]
    pub fn add_subpass(mut self, subpass: SubpassDescCI) -> RenderPassCI {
        self.subpasses.push(subpass); self
    }

    #[inline]
    pub fn add_dependency(mut self, dependency: SubpassDependencyCI) -> RenderPassCI {
        self.dependencies.push(dependency.dependency); self
    }
}

impl VkObjectDiscardable for vk::RenderPass {

    fn discard_by(self, device: &VkDevice) {
        unsafe {
            device.logic.handle.destroy_render_pass(self, None);
        }
    }
}
// ----------------------------------------------------------------------------------------------

// ----------------------------------------------------------------------------------------------
/// Single sampled attachment. The stencil aspect is neither loaded nor stored.
#[derive(Debug, Clone)]
pub struct AttachmentDescCI {
    desc: vk::AttachmentDescription,
}

impl AttachmentDescCI {

    pub fn new(format: vk::Format) -> AttachmentDescCI {

        AttachmentDescCI {
            desc: vk::AttachmentDescription {
                format,
                samples: vk::SampleCountFlags::TYPE_1,
                load_op : vk::AttachmentLoadOp::DONT_CARE,
                store_op: vk::AttachmentStoreOp::DONT_CARE,
                stencil_load_op : vk::AttachmentLoadOp::DONT_CARE,
                stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
                ..Default::default()
            },
        }
    }

    #[inline(always)]
    pub fn op(mut self, load: vk::AttachmentLoadOp, store: vk::AttachmentStoreOp) -> AttachmentDescCI {
        self.desc.load_op  = load;
        self.desc.store_op = store; self
    }

    #[inline(always)]
    pub fn layout(mut self, initial: vk::ImageLayout, r#final: vk::ImageLayout) -> AttachmentDescCI {
        self.desc.initial_layout = initial;
        self.desc.final_layout   = r#final; self
    }
}
// ----------------------------------------------------------------------------------------------

// ----------------------------------------------------------------------------------------------
/// A graphics subpass writing color attachments and at most one depth stencil attachment.
#[derive(Debug, Clone, Default)]
pub struct SubpassDescCI {

    colors: Vec<vk::AttachmentReference>,
    depth_stencil: Option<vk::AttachmentReference>,
}

impl SubpassDescCI {

    pub fn graphics() -> SubpassDescCI {
        SubpassDescCI::default()
    }

    /// The returned value points into `self`.
    pub fn value(&self) -> vk::SubpassDescription {

        let depth_stencil = self.depth_stencil.as_ref()
            .map_or(ptr::null(), |reference| reference as *const vk::AttachmentReference);

        vk::SubpassDescription {
            pipeline_bind_point: vk::PipelineBindPoint::GRAPHICS,
            color_attachment_count: self.colors.len() as _,
            p_color_attachments   : self.colors.as_ptr(),
            p_depth_stencil_attachment: depth_stencil,
            ..Default::default()
        }
    }

    #[inline]
    pub fn add_color_attachment(mut self, attachment: vkuint, layout: vk::ImageLayout) -> SubpassDescCI {
        self.colors.push(vk::AttachmentReference { attachment, layout }); self
    }

    pub fn set_depth_stencil_attachment(mut self, attachment: vkuint, layout: vk::ImageLayout) -> SubpassDescCI {
        self.depth_stencil = Some(vk::AttachmentReference { attachment, layout }); self
    }
}
// ----------------------------------------------------------------------------------------------

// ----------------------------------------------------------------------------------------------
/// Wrapper class for vk::SubpassDependency.
#[derive(Debug, Clone)]
pub struct SubpassDependencyCI {
    dependency: vk::SubpassDependency,
}

impl SubpassDependencyCI {

    pub fn new(src: vkuint, dst: vkuint) -> SubpassDependencyCI {

        SubpassDependencyCI {
            dependency: vk::SubpassDependency {
                src_subpass: src,
                dst_subpass: dst,
                ..Default::default()
            },
        }
    }

    #[inline(always)]
    pub fn stage_mask(mut self, src: vk::PipelineStageFlags, dst: vk::PipelineStageFlags) -> SubpassDependencyCI {
        self.dependency.src_stage_mask = src;
        self.dependency.dst_stage_mask = dst; self
    }

    #[inline(always)]
    pub fn access_mask(mut self, src: vk::AccessFlags, dst: vk::AccessFlags) -> SubpassDependencyCI {
        self.dependency.src_access_mask = src;
        self.dependency.dst_access_mask = dst; self
    }

    #[inline(always)]
    pub fn flags(mut self, flags: vk::DependencyFlags) -> SubpassDependencyCI {
        self.dependency.dependency_flags = flags; self
    }
}
// ----------------------------------------------------------------------------------------------

// ----------------------------------------------------------------------------------------------
/// Single layer framebuffer of `dimension`.
#[derive(Debug, Clone)]
pub struct FramebufferCI {

    render_pass: vk::RenderPass,
    dimension: vk::Extent2D,
    attachments: Vec<vk::ImageView>,
}

impl VkObjectBuildableCI for FramebufferCI {
    type ObjectType = vk::Framebuffer;

    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType> {

        unsafe {
            device.logic.handle.create_framebuffer(&self.value(), None)
                .map_err(|e| VkError::vulkan("Framebuffer Creation", e))
        }
    }
}

impl FramebufferCI {

    pub fn new_2d(render_pass: vk::RenderPass, dimension: vk::Extent2D) -> FramebufferCI {
        FramebufferCI { render_pass, dimension, attachments: Vec::new() }
    }

    /// The returned value points into `self`.
    pub fn value(&self) -> vk::FramebufferCreateInfo {

        vk::FramebufferCreateInfo {
            render_pass: self.render_pass,
            attachment_count: self.attachments.len() as _,
            p_attachments   : self.attachments.as_ptr(),
            width : self.dimension.width,
            height: self.dimension.height,
            layers: 1,
            ..Default::default()
        }
    }

    #[inline(always)]
    pub fn add_attachment(mut self, attachment: vk::ImageView) -> FramebufferCI {
        self.attachments.push(attachment); self
    }
}

impl VkObjectDiscardable for vk::Framebuffer {

    fn discard_by(self, device: &VkDevice) {
        unsafe {
            device.logic.handle.destroy_framebuffer(self, None);
        }
    }
}
// ----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subpass_references_color_and_depth() {

        let subpass = SubpassDescCI::graphics()
            .add_color_attachment(0, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            .set_depth_stencil_attachment(1, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

        let value = subpass.value();
        assert_eq!(value.pipeline_bind_point, vk::PipelineBindPoint::GRAPHICS);
        assert_eq!(value.color_attachment_count, 1);
        let depth = unsafe { *value.p_depth_stencil_attachment };
        assert_eq!(depth.attachment, 1);
        assert_eq!(depth.layout, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);
    }

    #[test]
    fn subpass_without_depth_has_null_reference() {

        let value = SubpassDescCI::graphics()
            .add_color_attachment(0, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            .value();
        assert!(value.p_depth_stencil_attachment.is_null());
    }

    #[test]
    fn begin_info_covers_framebuffer_and_clears() {

        let extent = vk::Extent2D { width: 64, height: 32 };
        let bi = RenderPassBI::new(vk::RenderPass::null(), vk::Framebuffer::null(), extent)
            .add_clear_value(vk::ClearValue { color: vk::ClearColorValue { float32: [0.0; 4] } })
            .add_clear_value(vk::ClearValue { depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 } });

        let value = bi.value();
        assert_eq!(value.s_type, vk::StructureType::RENDER_PASS_BEGIN_INFO);
        assert_eq!(value.render_area.extent, extent);
        assert_eq!(value.render_area.offset, vk::Offset2D { x: 0, y: 0 });
        assert_eq!(value.clear_value_count, 2);
    }

    #[test]
    fn framebuffer_has_one_layer() {

        let value = FramebufferCI::new_2d(vk::RenderPass::null(), vk::Extent2D { width: 16, height: 8 })
            .add_attachment(vk::ImageView::null())
            .value();

        assert_eq!((value.width, value.height, value.layers), (16, 8, 1));
        assert_eq!(value.attachment_count, 1);
    }
}
