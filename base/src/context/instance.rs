
use ash::vk;
use ash::extensions::ext::{DebugReport, DebugUtils};

use crate::context::debug::{DebugType, ValidationConfig};
use crate::utils::cast::{chars2string, cstrings2ptrs};
use crate::vkuint;
use crate::error::{VkResult, VkError};

use std::ffi::CString;

#[derive(Debug, Clone)]
pub struct InstanceConfig {

    pub api_version: vkuint,
    pub application_name: String,
    pub engine_name: String,
    /// log every instance layer the loader reports.
    pub print_available_layers: bool,
    /// instance creation fails if any of these layers is missing.
    pub require_layer_names: Vec<String>,
}

impl Default for InstanceConfig {

    fn default() -> InstanceConfig {

        InstanceConfig {
            api_version: vk::make_api_version(0, 1, 0, 0),
            application_name: String::from("Vulkan Headless"),
            engine_name: String::from("vkbase"),
            print_available_layers: false,
            require_layer_names: vec![String::from("VK_LAYER_KHRONOS_validation")],
        }
    }
}

pub struct VkInstance {

    pub(crate) handle: ash::Instance,
    pub(crate) entry: ash::Entry,
    /// also enabled on the logical device.
    pub(crate) enable_layer_names: Vec<CString>,
    pub(crate) debug_type: DebugType,
}

impl VkInstance {

    pub fn new(config: InstanceConfig, validation: &ValidationConfig) -> VkResult<VkInstance> {

        let entry = unsafe {
            ash::Entry::load()
                .map_err(|_| VkError::unlink("Entry"))?
        };

        let app_name = to_cstring(&config.application_name)?;
        let engine_name = to_cstring(&config.engine_name)?;
        let application_info = vk::ApplicationInfo {
            p_application_name: app_name.as_ptr(),
            p_engine_name: engine_name.as_ptr(),
            api_version: config.api_version,
            ..Default::default()
        };

        let available_layers = available_layer_names(&entry)?;
        if config.print_available_layers {
            log::info!("Available instance layers: {}", available_layers.join(", "));
        }

        let missing_layers = missing_layers(&available_layers, &config.require_layer_names);
        if !missing_layers.is_empty() {
            for layer in missing_layers.iter() {
                log::error!("Instance layer {} is not available.", layer);
            }
            return Err(VkError::unsupported("Some of Vulkan instance layer"))
        }

        let enable_layer_names = config.require_layer_names.iter()
            .map(|name| to_cstring(name))
            .collect::<VkResult<Vec<CString>>>()?;
        let layer_ptrs = cstrings2ptrs(&enable_layer_names);
        // everything renders offscreen, so only the debug extension may be needed.
        let extension_ptrs: Vec<_> = debug_extension(validation.debug_type).into_iter()
            .map(|name| name.as_ptr())
            .collect();

        let instance_ci = vk::InstanceCreateInfo {
            p_application_info: &application_info,
            enabled_layer_count: layer_ptrs.len() as _,
            pp_enabled_layer_names: layer_ptrs.as_ptr(),
            enabled_extension_count: extension_ptrs.len() as _,
            pp_enabled_extension_names: extension_ptrs.as_ptr(),
            ..Default::default()
        };

        let handle = unsafe {
            entry.create_instance(&instance_ci, None)
                .map_err(|e| VkError::vulkan("Instance Creation", e))?
        };

        Ok(VkInstance { entry, handle, enable_layer_names, debug_type: validation.debug_type })
    }

    /// Every object created from this instance must have been destroyed before.
    pub(crate) fn discard(&self) {
        unsafe {
            self.handle.destroy_instance(None);
        }
    }
}

fn debug_extension(debug_type: DebugType) -> Option<&'static std::ffi::CStr> {

    match debug_type {
        | DebugType::DebugReport => Some(DebugReport::name()),
        | DebugType::DebugUtils  => Some(DebugUtils::name()),
        | DebugType::None => None,
    }
}

fn available_layer_names(entry: &ash::Entry) -> VkResult<Vec<String>> {

    let properties = entry.enumerate_instance_layer_properties()
        .map_err(|e| VkError::vulkan("Instance Layer Query", e))?;

    Ok(properties.iter().map(|property| chars2string(&property.layer_name)).collect())
}

fn missing_layers<'a>(available: &[String], required: &'a [String]) -> Vec<&'a String> {
    required.iter().filter(|layer| !available.contains(layer)).collect()
}

fn to_cstring(name: &str) -> VkResult<CString> {
    CString::new(name)
        .map_err(|_| VkError::other(format!("Failed to cast `{}` to CString.", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unavailable_layers_are_missing() {

        let available = vec![String::from("VK_LAYER_KHRONOS_validation"), String::from("VK_LAYER_MESA_overlay")];
        let required = vec![String::from("VK_LAYER_KHRONOS_validation"), String::from("VK_LAYER_LUNARG_api_dump")];

        assert_eq!(missing_layers(&available, &required), vec![&required[1]]);
        assert!(missing_layers(&available, &[]).is_empty());
    }

    #[test]
    fn debug_type_selects_one_extension() {

        assert_eq!(debug_extension(DebugType::DebugUtils), Some(DebugUtils::name()));
        assert_eq!(debug_extension(DebugType::DebugReport), Some(DebugReport::name()));
        assert_eq!(debug_extension(DebugType::None), None);
    }

    #[test]
    fn interior_nul_is_rejected() {
        assert!(to_cstring("VK_LAYER\0").is_err());
        assert!(to_cstring("VK_LAYER_KHRONOS_validation").is_ok());
    }
}
