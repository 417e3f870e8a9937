
use ash::vk;

use crate::context::VkDevice;
use crate::error::{VkResult, VkError};
use crate::vkfloat;

use std::marker::PhantomData;
use std::ptr;

/// Record commands into `command`, with the available commands decided by `T`.
pub struct VkCmdRecorder<'a, T> {

    phantom_marker: PhantomData<T>,

    pub(super) device: &'a VkDevice,
    pub(super) command: vk::CommandBuffer,
    usage: vk::CommandBufferUsageFlags,
}

impl<'a, T> VkCmdRecorder<'a, T> {

    pub fn new(device: &'a VkDevice, command: vk::CommandBuffer) -> VkCmdRecorder<'a, T> {

        VkCmdRecorder {
            device, command,
            usage: vk::CommandBufferUsageFlags::empty(),
            phantom_marker: PhantomData,
        }
    }

    pub fn set_usage(&mut self, flags: vk::CommandBufferUsageFlags) {
        self.usage = flags;
    }

    #[inline]
    pub fn command(&self) -> vk::CommandBuffer {
        self.command
    }

    pub fn begin_record(&self) -> VkResult<&VkCmdRecorder<'a, T>> {

        let begin_ci = vk::CommandBufferBeginInfo {
            s_type: vk::StructureType::COMMAND_BUFFER_BEGIN_INFO,
            p_next: ptr::null(),
            flags : self.usage,
            p_inheritance_info: ptr::null(),
        };

        unsafe {
            self.device.logic.handle.begin_command_buffer(self.command, &begin_ci)
                .map_err(|e| VkError::vulkan("Begin Command Buffer", e))?;
        }
        Ok(self)
    }

    pub fn end_record(&self) -> VkResult<()> {

        unsafe {
            self.device.logic.handle.end_command_buffer(self.command)
                .map_err(|e| VkError::vulkan("End Command Buffer", e))?;
        }
        Ok(())
    }

    /// Open a debug label region. It does nothing when debug utils is not enabled.
    pub fn begin_label(&self, name: &str, color: [vkfloat; 4]) -> &VkCmdRecorder<'a, T> {
        self.device.marker.begin_region(self.command, name, color); self
    }

    pub fn insert_label(&self, name: &str, color: [vkfloat; 4]) -> &VkCmdRecorder<'a, T> {
        self.device.marker.insert(self.command, name, color); self
    }

    pub fn end_label(&self) -> &VkCmdRecorder<'a, T> {
        self.device.marker.end_region(self.command); self
    }
}
