
use ash::vk;

use vkbase::context::VkDevice;
use vkbase::ci::VkObjectBuildableCI;
use vkbase::ci::command::{CommandPoolCI, CommandBufferAI};
use vkbase::ci::image::{ImageCI, ImageViewCI, ImageBarrierCI};
use vkbase::ci::memory::MemoryAI;
use vkbase::ci::pipeline::{RenderPassCI, RenderPassBI, AttachmentDescCI, SubpassDescCI, SubpassDependencyCI, FramebufferCI};
use vkbase::ci::pipeline::{PipelineLayoutCI, GraphicsPipelineCI};
use vkbase::ci::pipeline::{VertexInputSCI, RasterizationSCI, DepthStencilSCI};
use vkbase::ci::shader::ShaderStageCI;
use vkbase::command::{VkCmdRecorder, IGraphics, CmdGraphicsApi, CmdTransferApi};
use vkbase::{VkBuffer, VkResult, VkError, vkuint, vkbytes};

use crate::data::{Vertex, PushConstants, VERTICES, INDICES, TRIANGLE_POSITIONS};

const DEMO_NAME: &'static str = "renderheadless";
const OUTPUT_PATH: &'static str = "headless.ppm";

const COLOR_FORMAT: vk::Format = vk::Format::R8G8B8A8_UNORM;
const DIMENSION: vk::Extent2D = vk::Extent2D { width: 1024, height: 1024 };

pub fn run() -> VkResult<()> {

    let features = vk::PhysicalDeviceFeatures::default();
    let context = vkexamples::default_context(features, vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER)?;
    log::info!("Running headless rendering example on {}.", context.device.phy.device_name);

    let result = VulkanExample::new(&context.device)
        .and_then(|example| {
            let output = example.render(&context.device)
                .and_then(|_| example.save_framebuffer(&context.device, OUTPUT_PATH));
            example.discard(&context.device);
            output
        });

    context.discard();

    result?;
    log::info!("Framebuffer image saved to {}.", OUTPUT_PATH);
    Ok(())
}

struct VulkanExample {

    command_pool: vk::CommandPool,

    vertex_buffer: VkBuffer,
    index_buffer : VkBuffer,

    color: ImageAttachment,
    depth: ImageAttachment,

    render_pass: vk::RenderPass,
    framebuffer: vk::Framebuffer,

    pipelines: PipelineStaff,
}

/// An image created with its own memory and view.
struct ImageAttachment {
    image : vk::Image,
    view  : vk::ImageView,
    memory: vk::DeviceMemory,
}

struct PipelineStaff {
    pipeline: vk::Pipeline,
    layout  : vk::PipelineLayout,
}

impl VulkanExample {

    fn new(device: &VkDevice) -> VkResult<VulkanExample> {

        let graphics_queue = &device.logic.queues.graphics;
        if !graphics_queue.is_available() {
            return Err(VkError::unsupported("Graphics Queue"))
        }

        let command_pool = CommandPoolCI::new(graphics_queue.family_index)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .build(device)?;

        // vertices and indices are staged into device local memory.
        let vertex_buffer = VkBuffer::upload_to_device(device, command_pool, graphics_queue.handle,
            vk::BufferUsageFlags::VERTEX_BUFFER, &VERTICES)?;
        let index_buffer = VkBuffer::upload_to_device(device, command_pool, graphics_queue.handle,
            vk::BufferUsageFlags::INDEX_BUFFER, &INDICES)?;

        let color = ImageAttachment::new(device, COLOR_FORMAT,
            vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_SRC, vk::ImageAspectFlags::COLOR)?;
        let depth = ImageAttachment::new(device, device.phy.depth_format,
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT, depth_aspect(device.phy.depth_format))?;

        let render_pass = setup_renderpass(device)?;
        let framebuffer = FramebufferCI::new_2d(render_pass, DIMENSION)
            .add_attachment(color.view)
            .add_attachment(depth.view)
            .build(device)?;

        let pipelines = prepare_pipelines(device, render_pass)?;

        let example = VulkanExample {
            command_pool, vertex_buffer, index_buffer,
            color, depth, render_pass, framebuffer, pipelines,
        };
        Ok(example)
    }

    fn render(&self, device: &VkDevice) -> VkResult<()> {

        let command = CommandBufferAI::new(self.command_pool, 1)
            .build(device)?
            .into_iter().next()
            .ok_or(VkError::create("Command Buffer"))?;

        let result = self.record_command(device, command)
            .and_then(|recorder| recorder.flush_copy_command(device.logic.queues.graphics.handle));

        device.free(command, self.command_pool);
        result?;

        device.wait_idle()
    }

    fn record_command<'a>(&self, device: &'a VkDevice, command: vk::CommandBuffer) -> VkResult<VkCmdRecorder<'a, IGraphics>> {

        let mut recorder: VkCmdRecorder<IGraphics> = VkCmdRecorder::new(device, command);
        recorder.set_usage(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        let render_pass_bi = RenderPassBI::new(self.render_pass, self.framebuffer, DIMENSION)
            .add_clear_value(vk::ClearValue { color: vk::ClearColorValue { float32: [0.0, 0.0, 0.2, 1.0] } })
            .add_clear_value(vk::ClearValue { depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 } });

        let viewport = vk::Viewport {
            x: 0.0, y: 0.0,
            width: DIMENSION.width as f32, height: DIMENSION.height as f32,
            min_depth: 0.0, max_depth: 1.0,
        };
        let scissor = vk::Rect2D {
            extent: DIMENSION,
            offset: vk::Offset2D { x: 0, y: 0 },
        };

        let screen_aspect = (DIMENSION.width as f32) / (DIMENSION.height as f32);

        recorder.begin_record()?
            .begin_label("Render Headless", [1.0, 0.6, 0.2, 1.0])
            .begin_render_pass(&render_pass_bi)
            .set_viewport(0, &[viewport])
            .set_scissor(0, &[scissor])
            .bind_pipeline(self.pipelines.pipeline)
            .bind_vertex_buffers(0, &[self.vertex_buffer.handle], &[0])
            .bind_index_buffer(self.index_buffer.handle, vk::IndexType::UINT32, 0);

        for position in TRIANGLE_POSITIONS.iter() {
            let constants = PushConstants::new(*position, screen_aspect);
            recorder
                .push_vertex_constants(self.pipelines.layout, 0, &constants)
                .draw_indexed(INDICES.len() as vkuint, 1, 0, 0, 0);
        }

        recorder
            .end_render_pass()
            .end_label()
            .end_record()?;

        Ok(recorder)
    }

    /// Copy the color attachment into a linear host visible image and write it to `path`.
    fn save_framebuffer(&self, device: &VkDevice, path: &str) -> VkResult<()> {

        let (dst_image, requirement) = ImageCI::new_2d(COLOR_FORMAT, DIMENSION)
            .tiling(vk::ImageTiling::LINEAR)
            .usages(vk::ImageUsageFlags::TRANSFER_DST)
            .build(device)?;

        let dst_memory = device.get_memory_type(requirement.memory_type_bits, vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT)
            .and_then(|memory_type| MemoryAI::new(requirement.size, memory_type).build(device));
        let dst_memory = match dst_memory {
            | Ok(memory) => memory,
            | Err(e) => {
                device.discard(dst_image);
                return Err(e)
            },
        };

        let result = device.bind_memory(dst_image, dst_memory, 0)
            .and_then(|_| self.copy_to_host_image(device, dst_image))
            .and_then(|_| read_host_image(device, dst_image, dst_memory, path));

        device.discard(dst_image);
        device.discard(dst_memory);
        result
    }

    fn copy_to_host_image(&self, device: &VkDevice, dst_image: vk::Image) -> VkResult<()> {

        let command = CommandBufferAI::new(self.command_pool, 1)
            .build(device)?
            .into_iter().next()
            .ok_or(VkError::create("Command Buffer"))?;

        let mut recorder: VkCmdRecorder<IGraphics> = VkCmdRecorder::new(device, command);
        recorder.set_usage(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        let color_range = vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0, level_count: 1,
            base_array_layer: 0, layer_count: 1,
        };
        let color_layers = vk::ImageSubresourceLayers {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            mip_level: 0,
            base_array_layer: 0, layer_count: 1,
        };

        let to_transfer_dst = ImageBarrierCI::new(dst_image, color_range)
            .access_mask(vk::AccessFlags::empty(), vk::AccessFlags::TRANSFER_WRITE)
            .layout(vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
        // GENERAL layout is required to map the image memory.
        let to_general = ImageBarrierCI::new(dst_image, color_range)
            .access_mask(vk::AccessFlags::TRANSFER_WRITE, vk::AccessFlags::MEMORY_READ)
            .layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::GENERAL);

        let copy_region = vk::ImageCopy {
            src_subresource: color_layers,
            src_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
            dst_subresource: color_layers,
            dst_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
            extent: vk::Extent3D { width: DIMENSION.width, height: DIMENSION.height, depth: 1 },
        };

        let result = recorder.begin_record()
            .and_then(|recorder| {
                recorder
                    .image_pipeline_barrier(vk::PipelineStageFlags::TRANSFER, vk::PipelineStageFlags::TRANSFER, vk::DependencyFlags::empty(), &[to_transfer_dst.value()])
                    // the render pass leaves the color attachment in TRANSFER_SRC_OPTIMAL.
                    .copy_img2img(self.color.image, vk::ImageLayout::TRANSFER_SRC_OPTIMAL, dst_image, vk::ImageLayout::TRANSFER_DST_OPTIMAL, &[copy_region])
                    .image_pipeline_barrier(vk::PipelineStageFlags::TRANSFER, vk::PipelineStageFlags::HOST, vk::DependencyFlags::empty(), &[to_general.value()]);
                recorder.end_record()
            })
            .and_then(|_| recorder.flush_copy_command(device.logic.queues.graphics.handle));

        device.free(command, self.command_pool);
        result
    }

    fn discard(self, device: &VkDevice) {

        device.discard(self.pipelines.pipeline);
        device.discard(self.pipelines.layout);

        device.discard(self.framebuffer);
        device.discard(self.render_pass);

        self.color.discard(device);
        self.depth.discard(device);

        self.vertex_buffer.discard(device);
        self.index_buffer.discard(device);

        device.discard(self.command_pool);
    }
}

impl ImageAttachment {

    fn new(device: &VkDevice, format: vk::Format, usage: vk::ImageUsageFlags, aspect: vk::ImageAspectFlags) -> VkResult<ImageAttachment> {

        let (image, requirement) = ImageCI::new_2d(format, DIMENSION)
            .usages(usage)
            .build(device)?;

        let memory = device.get_memory_type(requirement.memory_type_bits, vk::MemoryPropertyFlags::DEVICE_LOCAL)
            .and_then(|memory_type| MemoryAI::new(requirement.size, memory_type).build(device));
        let memory = match memory {
            | Ok(memory) => memory,
            | Err(e) => {
                device.discard(image);
                return Err(e)
            },
        };

        let view = device.bind_memory(image, memory, 0)
            .and_then(|_| {
                ImageViewCI::new(image, vk::ImageViewType::TYPE_2D, format)
                    .aspect_mask(aspect)
                    .build(device)
            });

        match view {
            | Ok(view) => Ok(ImageAttachment { image, view, memory }),
            | Err(e) => {
                device.discard(image);
                device.discard(memory);
                Err(e)
            },
        }
    }

    fn discard(&self, device: &VkDevice) {

        device.discard(self.view);
        device.discard(self.image);
        device.discard(self.memory);
    }
}

fn depth_aspect(format: vk::Format) -> vk::ImageAspectFlags {

    match format {
        | vk::Format::D16_UNORM_S8_UINT
        | vk::Format::D24_UNORM_S8_UINT
        | vk::Format::D32_SFLOAT_S8_UINT => vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL,
        | _ => vk::ImageAspectFlags::DEPTH,
    }
}

fn setup_renderpass(device: &VkDevice) -> VkResult<vk::RenderPass> {

    let color_attachment = AttachmentDescCI::new(COLOR_FORMAT)
        .op(vk::AttachmentLoadOp::CLEAR, vk::AttachmentStoreOp::STORE)
        .layout(vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_SRC_OPTIMAL);

    let depth_attachment = AttachmentDescCI::new(device.phy.depth_format)
        .op(vk::AttachmentLoadOp::CLEAR, vk::AttachmentStoreOp::DONT_CARE)
        .layout(vk::ImageLayout::UNDEFINED, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

    let subpass_description = SubpassDescCI::graphics()
        .add_color_attachment(0, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
        .set_depth_stencil_attachment(1, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

    let dependency0 = SubpassDependencyCI::new(vk::SUBPASS_EXTERNAL, 0)
        .stage_mask(vk::PipelineStageFlags::BOTTOM_OF_PIPE, vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .access_mask(vk::AccessFlags::MEMORY_READ, vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
        .flags(vk::DependencyFlags::BY_REGION);

    // the color attachment is read by a transfer after the render pass.
    let dependency1 = SubpassDependencyCI::new(0, vk::SUBPASS_EXTERNAL)
        .stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT, vk::PipelineStageFlags::TRANSFER)
        .access_mask(vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE, vk::AccessFlags::TRANSFER_READ)
        .flags(vk::DependencyFlags::BY_REGION);

    RenderPassCI::new()
        .add_attachment(color_attachment)
        .add_attachment(depth_attachment)
        .add_subpass(subpass_description)
        .add_dependency(dependency0)
        .add_dependency(dependency1)
        .build(device)
}

fn prepare_pipelines(device: &VkDevice, render_pass: vk::RenderPass) -> VkResult<PipelineStaff> {

    let layout = PipelineLayoutCI::new()
        .add_push_constants(PushConstants::range())
        .build(device)?;

    let input_description = Vertex::input_description();
    let vertex_input = VertexInputSCI::new()
        .add_binding(input_description.binding)
        .add_attribute(input_description.attributes[0])
        .add_attribute(input_description.attributes[1]);

    let rasterization = RasterizationSCI::new()
        .cull_face(vk::CullModeFlags::BACK, vk::FrontFace::CLOCKWISE);

    let depth_stencil = DepthStencilSCI::new()
        .depth_test(true, true, vk::CompareOp::LESS_OR_EQUAL);

    let vert_module = vkexamples::shader_module(vk::ShaderStageFlags::VERTEX, DEMO_NAME, "triangle.vert")
        .build(device)?;
    let frag_module = vkexamples::shader_module(vk::ShaderStageFlags::FRAGMENT, DEMO_NAME, "triangle.frag")
        .build(device);
    let frag_module = match frag_module {
        | Ok(module) => module,
        | Err(e) => {
            device.discard(vert_module);
            device.discard(layout);
            return Err(e)
        },
    };

    let pipeline = GraphicsPipelineCI::new(render_pass, layout)
        .add_stage(ShaderStageCI::new(vk::ShaderStageFlags::VERTEX, vert_module))
        .add_stage(ShaderStageCI::new(vk::ShaderStageFlags::FRAGMENT, frag_module))
        .set_vertex_input(vertex_input)
        .set_rasterization(rasterization)
        .set_depth_stencil(depth_stencil)
        .build(device);

    // shader modules are no longer needed once the pipeline is created.
    device.discard(vert_module);
    device.discard(frag_module);

    match pipeline {
        | Ok(pipeline) => Ok(PipelineStaff { pipeline, layout }),
        | Err(e) => {
            device.discard(layout);
            Err(e)
        },
    }
}

fn read_host_image(device: &VkDevice, image: vk::Image, memory: vk::DeviceMemory, path: &str) -> VkResult<()> {

    let subresource = vk::ImageSubresource {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        mip_level: 0,
        array_layer: 0,
    };

    let layout = unsafe {
        device.logic.handle.get_image_subresource_layout(image, subresource)
    };

    let data_ptr = unsafe {
        device.logic.handle.map_memory(memory, 0, vk::WHOLE_SIZE, vk::MemoryMapFlags::empty())
            .map_err(|e| VkError::vulkan("Map Memory", e))?
    };

    let result = {
        let data = unsafe {
            let start = (data_ptr as *const u8).offset(layout.offset as isize);
            ::std::slice::from_raw_parts(start, layout.size as usize)
        };
        vkexamples::write_ppm(path, DIMENSION.width, DIMENSION.height, layout.row_pitch as vkbytes, data, is_bgr_format(COLOR_FORMAT))
    };

    unsafe {
        device.logic.handle.unmap_memory(memory);
    }
    result
}

/// The ppm output is RGB, so BGR formats need their channels swapped.
fn is_bgr_format(format: vk::Format) -> bool {

    match format {
        | vk::Format::B8G8R8A8_SRGB
        | vk::Format::B8G8R8A8_UNORM
        | vk::Format::B8G8R8A8_SNORM => true,
        | _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stencil_formats_carry_stencil_aspect() {

        assert_eq!(depth_aspect(vk::Format::D32_SFLOAT), vk::ImageAspectFlags::DEPTH);
        assert!(depth_aspect(vk::Format::D24_UNORM_S8_UINT).contains(vk::ImageAspectFlags::STENCIL));
    }

    #[test]
    fn only_bgr_formats_are_swizzled() {

        assert!(is_bgr_format(vk::Format::B8G8R8A8_UNORM));
        assert!(!is_bgr_format(COLOR_FORMAT));
    }
}
