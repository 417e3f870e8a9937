
use ash::vk;

use vkbase::context::VkDevice;
use vkbase::ci::VkObjectBuildableCI;
use vkbase::ci::command::{CommandPoolCI, CommandBufferAI};
use vkbase::ci::descriptor::{DescriptorPoolCI, DescriptorSetLayoutCI, DescriptorSetAI};
use vkbase::ci::descriptor::{DescriptorSetWI, DescriptorSetsUpdateCI};
use vkbase::ci::pipeline::{PipelineLayoutCI, ComputePipelineCI};
use vkbase::ci::shader::{ShaderStageCI, SpecializationCI};
use vkbase::command::{VkCmdRecorder, ICompute, CmdComputeApi, CmdTransferApi};
use vkbase::{VkBuffer, VkResult, VkError, vkuint, vkbytes};

use std::mem;

const DEMO_NAME: &'static str = "computeheadless";
const BUFFER_ELEMENTS: vkuint = 32;

pub fn run() -> VkResult<()> {

    let features = vk::PhysicalDeviceFeatures::default();
    let context = vkexamples::default_context(features, vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER)?;
    log::info!("Running headless compute example on {}.", context.device.phy.device_name);

    let result = VulkanExample::new(&context.device)
        .and_then(|mut example| {
            let output = example.compute(&context.device);
            example.discard(&context.device);
            output
        });

    context.discard();

    let output = result?;
    verify(&output)
}

struct VulkanExample {

    command_pool: vk::CommandPool,

    host_buffer  : VkBuffer,
    device_buffer: VkBuffer,

    descriptors: DescriptorStaff,
    pipelines  : PipelineStaff,
}

struct DescriptorStaff {
    pool   : vk::DescriptorPool,
    set    : vk::DescriptorSet,
    layout : vk::DescriptorSetLayout,
}

struct PipelineStaff {
    pipeline: vk::Pipeline,
    layout  : vk::PipelineLayout,
}

impl VulkanExample {

    fn new(device: &VkDevice) -> VkResult<VulkanExample> {

        let compute_queue = &device.logic.queues.compute;
        if !compute_queue.is_available() {
            return Err(VkError::unsupported("Compute Queue"))
        }

        let command_pool = CommandPoolCI::new(compute_queue.family_index)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .build(device)?;

        let input: Vec<vkuint> = (0..BUFFER_ELEMENTS).collect();
        let (host_buffer, device_buffer) = prepare_buffers(device, &input)?;

        let descriptors = setup_descriptor(device, &device_buffer)?;
        let pipelines = prepare_pipelines(device, descriptors.layout)?;

        let example = VulkanExample { command_pool, host_buffer, device_buffer, descriptors, pipelines };
        Ok(example)
    }

    /// Copy the input to device memory, dispatch the shader and copy the values back.
    fn compute(&mut self, device: &VkDevice) -> VkResult<Vec<vkuint>> {

        let command = CommandBufferAI::new(self.command_pool, 1)
            .build(device)?
            .into_iter().next()
            .ok_or(VkError::create("Command Buffer"))?;

        let result = self.record_command(device, command)
            .and_then(|recorder| recorder.flush_copy_command(device.logic.queues.compute.handle));

        device.free(command, self.command_pool);
        result?;

        self.host_buffer.map(device)?;

        let mut output = vec![0; BUFFER_ELEMENTS as usize];
        let read_result = self.host_buffer.invalidate(device)
            .and_then(|_| self.host_buffer.read_into(&mut output));
        self.host_buffer.unmap(device);
        read_result?;

        Ok(output)
    }

    fn record_command<'a>(&self, device: &'a VkDevice, command: vk::CommandBuffer) -> VkResult<VkCmdRecorder<'a, ICompute>> {

        let mut recorder: VkCmdRecorder<ICompute> = VkCmdRecorder::new(device, command);
        recorder.set_usage(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        let copy_region = vk::BufferCopy { src_offset: 0, dst_offset: 0, size: self.host_buffer.size };

        recorder.begin_record()?
            .begin_label("Compute Headless", [0.2, 0.6, 1.0, 1.0])
            .copy_buf2buf(self.host_buffer.handle, self.device_buffer.handle, &[copy_region])
            // make the copied values visible to the shader.
            .buffer_pipeline_barrier(
                vk::PipelineStageFlags::TRANSFER, vk::PipelineStageFlags::COMPUTE_SHADER, vk::DependencyFlags::empty(),
                &[buffer_barrier(self.device_buffer.handle, vk::AccessFlags::TRANSFER_WRITE, vk::AccessFlags::SHADER_READ)])
            .bind_pipeline(self.pipelines.pipeline)
            .bind_descriptor_sets(self.pipelines.layout, 0, &[self.descriptors.set], &[])
            .insert_label("Fibonacci", [1.0, 1.0, 1.0, 1.0])
            .dispatch(BUFFER_ELEMENTS, 1, 1)
            // make the shader writes visible to the copy back.
            .buffer_pipeline_barrier(
                vk::PipelineStageFlags::COMPUTE_SHADER, vk::PipelineStageFlags::TRANSFER, vk::DependencyFlags::empty(),
                &[buffer_barrier(self.device_buffer.handle, vk::AccessFlags::SHADER_WRITE, vk::AccessFlags::TRANSFER_READ)])
            .copy_buf2buf(self.device_buffer.handle, self.host_buffer.handle, &[copy_region])
            // make the copied values visible to the host.
            .buffer_pipeline_barrier(
                vk::PipelineStageFlags::TRANSFER, vk::PipelineStageFlags::HOST, vk::DependencyFlags::empty(),
                &[buffer_barrier(self.host_buffer.handle, vk::AccessFlags::TRANSFER_WRITE, vk::AccessFlags::HOST_READ)])
            .end_label()
            .end_record()?;

        Ok(recorder)
    }

    fn discard(self, device: &VkDevice) {

        device.discard(self.pipelines.pipeline);
        device.discard(self.pipelines.layout);

        device.discard(self.descriptors.layout);
        device.discard(self.descriptors.pool);

        self.host_buffer.discard(device);
        self.device_buffer.discard(device);

        device.discard(self.command_pool);
    }
}

fn prepare_buffers(device: &VkDevice, input: &[vkuint]) -> VkResult<(VkBuffer, VkBuffer)> {

    let buffer_size = (input.len() * mem::size_of::<vkuint>()) as vkbytes;

    // the host buffer carries the input to the device, and the output back.
    let host_buffer = VkBuffer::with_data(device,
        vk::BufferUsageFlags::TRANSFER_SRC | vk::BufferUsageFlags::TRANSFER_DST,
        vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT, input)?;

    let device_buffer = VkBuffer::new(device,
        vk::BufferUsageFlags::STORAGE_BUFFER | vk::BufferUsageFlags::TRANSFER_SRC | vk::BufferUsageFlags::TRANSFER_DST,
        vk::MemoryPropertyFlags::DEVICE_LOCAL, buffer_size);

    match device_buffer {
        | Ok(device_buffer) => Ok((host_buffer, device_buffer)),
        | Err(e) => {
            host_buffer.discard(device);
            Err(e)
        },
    }
}

fn setup_descriptor(device: &VkDevice, storage_buffer: &VkBuffer) -> VkResult<DescriptorStaff> {

    let pool = DescriptorPoolCI::new(1)
        .add_descriptor(vk::DescriptorType::STORAGE_BUFFER, 1)
        .build(device)?;

    // in headless.comp.glsl:
    //
    // layout (binding = 0) buffer Values {
    //     uint values[];
    // };
    let layout = DescriptorSetLayoutCI::new()
        .add_binding(0, vk::DescriptorType::STORAGE_BUFFER, 1, vk::ShaderStageFlags::COMPUTE)
        .build(device)
        .map_err(|e| { device.discard(pool); e })?;

    let set = DescriptorSetAI::new(pool)
        .add_set_layout(layout)
        .build(device)
        .and_then(|sets| sets.into_iter().next().ok_or(VkError::create("Descriptor Set")));
    let set = match set {
        | Ok(set) => set,
        | Err(e) => {
            device.discard(layout);
            device.discard(pool);
            return Err(e)
        },
    };

    let storage_write = DescriptorSetWI::new(set, 0, vk::DescriptorType::STORAGE_BUFFER)
        .add_buffer(storage_buffer.descriptor());

    DescriptorSetsUpdateCI::new()
        .add_write(&storage_write)
        .update(device);

    Ok(DescriptorStaff { pool, set, layout })
}

fn prepare_pipelines(device: &VkDevice, set_layout: vk::DescriptorSetLayout) -> VkResult<PipelineStaff> {

    let layout = PipelineLayoutCI::new()
        .add_set_layout(set_layout)
        .build(device)?;

    let module = vkexamples::shader_module(vk::ShaderStageFlags::COMPUTE, DEMO_NAME, "headless.comp")
        .build(device)
        .map_err(|e| {
            device.discard(layout);
            e
        })?;

    // the element count is passed to the shader as specialization constant 0.
    let specialization = SpecializationCI::new()
        .add_entry(0, BUFFER_ELEMENTS);
    let stage = ShaderStageCI::new(vk::ShaderStageFlags::COMPUTE, module)
        .specialization(specialization);

    let pipeline = ComputePipelineCI::new(layout, stage)
        .build(device);

    // the module is no longer needed once the pipeline is created.
    device.discard(module);

    match pipeline {
        | Ok(pipeline) => Ok(PipelineStaff { pipeline, layout }),
        | Err(e) => {
            device.discard(layout);
            Err(e)
        },
    }
}

fn buffer_barrier(buffer: vk::Buffer, src: vk::AccessFlags, dst: vk::AccessFlags) -> vk::BufferMemoryBarrier {

    vk::BufferMemoryBarrier {
        src_access_mask: src,
        dst_access_mask: dst,
        src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
        dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
        buffer,
        offset: 0,
        size: vk::WHOLE_SIZE,
        ..Default::default()
    }
}

/// The value the shader computes for input `n`.
fn fibonacci(n: vkuint) -> vkuint {

    if n <= 1 {
        return n
    }

    let (mut curr, mut prev): (vkuint, vkuint) = (1, 1);
    for _ in 2..n {
        let temp = curr;
        curr = curr.wrapping_add(prev);
        prev = temp;
    }
    curr
}

fn verify(output: &[vkuint]) -> VkResult<()> {

    let expected: Vec<vkuint> = (0..BUFFER_ELEMENTS).map(fibonacci).collect();

    log::info!("Compute input:  {:?}", (0..BUFFER_ELEMENTS).collect::<Vec<_>>());
    log::info!("Compute output: {:?}", output);

    if output == expected.as_slice() {
        log::info!("Compute result matches the host reference.");
        Ok(())
    } else {
        Err(VkError::other(format!("Compute result mismatch, expected {:?}.", expected)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fibonacci_matches_shader_sequence() {

        let sequence: Vec<vkuint> = (0..10).map(fibonacci).collect();
        // the shader starts its loop from (1, 1), so fibonacci(2) is 1 and fibonacci(3) is 2.
        assert_eq!(sequence, vec![0, 1, 1, 2, 3, 5, 8, 13, 21, 34]);
    }

    #[test]
    fn verify_rejects_wrong_values() {

        let mut output: Vec<vkuint> = (0..BUFFER_ELEMENTS).map(fibonacci).collect();
        assert!(verify(&output).is_ok());

        output[5] += 1;
        assert!(verify(&output).is_err());
    }
}
