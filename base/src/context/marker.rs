
use ash::vk;
use ash::extensions::ext::DebugUtils;

use crate::context::instance::VkInstance;
use crate::context::debug::DebugType;
use crate::error::{VkResult, VkError};
use crate::vkfloat;

use std::ffi::CString;
use std::ptr;

/// Object naming and command buffer labels through `VK_EXT_debug_utils`.
///
/// If the extension was not enabled in instance creation, every method does nothing.
pub struct DebugMarker {

    loader: Option<DebugUtils>,
    device: vk::Device,
}

impl DebugMarker {

    pub(crate) fn new(instance: &VkInstance, device: &ash::Device) -> DebugMarker {

        let loader = if instance.debug_type == DebugType::DebugUtils {
            Some(DebugUtils::new(&instance.entry, &instance.handle))
        } else {
            None
        };

        DebugMarker { loader, device: device.handle() }
    }

    /// A marker which never calls into Vulkan.
    pub fn disabled() -> DebugMarker {
        DebugMarker { loader: None, device: vk::Device::null() }
    }

    pub fn set_object_name<H: vk::Handle>(&self, object: H, name: &str) -> VkResult<()> {

        if let Some(ref loader) = self.loader {

            let name = cstring(name)?;
            let name_info = vk::DebugUtilsObjectNameInfoEXT {
                s_type: vk::StructureType::DEBUG_UTILS_OBJECT_NAME_INFO_EXT,
                p_next: ptr::null(),
                object_type  : H::TYPE,
                object_handle: object.as_raw(),
                p_object_name: name.as_ptr(),
            };

            unsafe {
                loader.set_debug_utils_object_name(self.device, &name_info)
                    .map_err(|e| VkError::vulkan("Set Debug Object Name", e))?;
            }
        }

        Ok(())
    }

    /// Open a named region in `command`. Every region must be closed by `end_region`.
    pub fn begin_region(&self, command: vk::CommandBuffer, name: &str, color: [vkfloat; 4]) {

        if let Some(ref loader) = self.loader {
            if let Ok(name) = cstring(name) {
                let label = label_info(&name, color);
                unsafe { loader.cmd_begin_debug_utils_label(command, &label); }
            }
        }
    }

    pub fn insert(&self, command: vk::CommandBuffer, name: &str, color: [vkfloat; 4]) {

        if let Some(ref loader) = self.loader {
            if let Ok(name) = cstring(name) {
                let label = label_info(&name, color);
                unsafe { loader.cmd_insert_debug_utils_label(command, &label); }
            }
        }
    }

    pub fn end_region(&self, command: vk::CommandBuffer) {

        if let Some(ref loader) = self.loader {
            unsafe { loader.cmd_end_debug_utils_label(command); }
        }
    }
}

fn cstring(name: &str) -> VkResult<CString> {
    CString::new(name)
        .map_err(|_| VkError::other(format!("Debug label `{}` contains a nul byte.", name)))
}

fn label_info(name: &CString, color: [vkfloat; 4]) -> vk::DebugUtilsLabelEXT {

    vk::DebugUtilsLabelEXT {
        s_type: vk::StructureType::DEBUG_UTILS_LABEL_EXT,
        p_next: ptr::null(),
        p_label_name: name.as_ptr(),
        color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_marker_ignores_every_call() {

        let marker = DebugMarker::disabled();
        assert!(marker.loader.is_none());

        let command = vk::CommandBuffer::null();
        marker.begin_region(command, "Fill Pages", [1.0, 0.0, 0.0, 1.0]);
        marker.insert(command, "Copy Page", [0.0; 4]);
        marker.end_region(command);
        assert!(marker.set_object_name(vk::Image::null(), "Sparse Image").is_ok());
    }

    #[test]
    fn label_keeps_name_and_color() {

        let name = CString::new("Mip Tail").unwrap();
        let label = label_info(&name, [0.5, 0.25, 0.0, 1.0]);
        assert_eq!(label.p_label_name, name.as_ptr());
        assert_eq!(label.color, [0.5, 0.25, 0.0, 1.0]);
        assert!(cstring("bad\0name").is_err());
    }
}
