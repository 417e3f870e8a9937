
use ash::vk;

use crate::context::{VkSubmitCI, VkDevice};
use crate::error::{VkResult, VkError};

use smallvec::SmallVec;

// ----------------------------------------------------------------------------------------------
/// Queue submission of command buffers. Each wait semaphore carries its own wait stage.
#[derive(Debug, Clone, Default)]
pub struct SubmitCI {

    wait_stage        : SmallVec<[vk::PipelineStageFlags; 2]>,
    wait_semaphores   : SmallVec<[vk::Semaphore; 2]>,
    signal_semaphores : SmallVec<[vk::Semaphore; 2]>,
    commands          : SmallVec<[vk::CommandBuffer; 2]>,
}

impl SubmitCI {

    pub fn new() -> SubmitCI {
        SubmitCI::default()
    }

    #[inline]
    pub fn add_command(mut self, command: vk::CommandBuffer) -> SubmitCI {
        self.commands.push(command); self
    }

    #[inline]
    pub fn add_wait(mut self, stage: vk::PipelineStageFlags, semaphore: vk::Semaphore) -> SubmitCI {
        self.wait_stage.push(stage);
        self.wait_semaphores.push(semaphore); self
    }

    #[inline]
    pub fn add_signal(mut self, semaphore: vk::Semaphore) -> SubmitCI {
        self.signal_semaphores.push(semaphore); self
    }

    pub fn value(&self) -> vk::SubmitInfo {

        vk::SubmitInfo {
            wait_semaphore_count   : self.wait_semaphores.len() as _,
            p_wait_semaphores      : self.wait_semaphores.as_ptr(),
            p_wait_dst_stage_mask  : self.wait_stage.as_ptr(),
            command_buffer_count   : self.commands.len() as _,
            p_command_buffers      : self.commands.as_ptr(),
            signal_semaphore_count : self.signal_semaphores.len() as _,
            p_signal_semaphores    : self.signal_semaphores.as_ptr(),
            ..Default::default()
        }
    }
}

impl VkSubmitCI for SubmitCI {

    fn submit(&self, device: &VkDevice, queue: vk::Queue, wait_fence: vk::Fence) -> VkResult<()> {
        unsafe {
            device.logic.handle.queue_submit(queue, &[self.value()], wait_fence)
                .map_err(|e| VkError::vulkan("Queue Submit", e))
        }
    }
}
// ----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    #[test]
    fn wait_stages_follow_semaphores() {

        let ci = SubmitCI::new()
            .add_wait(vk::PipelineStageFlags::TRANSFER, vk::Semaphore::from_raw(1))
            .add_command(vk::CommandBuffer::from_raw(2))
            .add_signal(vk::Semaphore::from_raw(3));

        let value = ci.value();
        assert_eq!(value.wait_semaphore_count, 1);
        assert_eq!(value.command_buffer_count, 1);
        assert_eq!(value.signal_semaphore_count, 1);
        assert_eq!(unsafe { *value.p_wait_dst_stage_mask }, vk::PipelineStageFlags::TRANSFER);
    }
}
