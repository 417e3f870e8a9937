
use ash::vk;
use ash::extensions::ext::{DebugReport, DebugUtils};

use crate::context::instance::VkInstance;
use crate::{vklint, vksint, vkchar, vkptr, vkbool};
use crate::error::{VkResult, VkError};

use std::borrow::Cow;
use std::ffi::CStr;

/// Which validation messages are routed to `log`, and through which extension.
#[derive(Debug, Clone)]
pub struct ValidationConfig {

    pub debug_type: DebugType,
    /// message filter of `DebugType::DebugReport`.
    pub report_flags: vk::DebugReportFlagsEXT,
    /// message filters of `DebugType::DebugUtils`.
    pub severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    pub types: vk::DebugUtilsMessageTypeFlagsEXT,
}

impl Default for ValidationConfig {

    fn default() -> ValidationConfig {

        ValidationConfig {
            debug_type: DebugType::DebugUtils,
            report_flags: vk::DebugReportFlagsEXT::ERROR
                | vk::DebugReportFlagsEXT::WARNING
                | vk::DebugReportFlagsEXT::PERFORMANCE_WARNING,
            severity: vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
            types: vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DebugType {
    DebugReport,
    DebugUtils,
    /// no debug extension is enabled.
    None,
}

/// The validation callback registered on the instance, if any.
pub enum VkDebugger {
    Report { loader: DebugReport, callback: vk::DebugReportCallbackEXT },
    Utils  { loader: DebugUtils, messenger: vk::DebugUtilsMessengerEXT },
    None,
}

impl VkDebugger {

    pub fn new(instance: &VkInstance, config: &ValidationConfig) -> VkResult<VkDebugger> {

        let debugger = match config.debug_type {
            | DebugType::DebugReport => {
                let loader = DebugReport::new(&instance.entry, &instance.handle);
                let callback_ci = vk::DebugReportCallbackCreateInfoEXT {
                    flags: config.report_flags,
                    pfn_callback: Some(vulkan_debug_report_callback),
                    ..Default::default()
                };

                let callback = unsafe {
                    loader.create_debug_report_callback(&callback_ci, None)
                        .map_err(|e| VkError::vulkan("Debug Report Callback Creation", e))?
                };
                VkDebugger::Report { loader, callback }
            },
            | DebugType::DebugUtils => {
                let loader = DebugUtils::new(&instance.entry, &instance.handle);
                let messenger_ci = vk::DebugUtilsMessengerCreateInfoEXT {
                    message_severity: config.severity,
                    message_type    : config.types,
                    pfn_user_callback: Some(vulkan_debug_utils_callback),
                    ..Default::default()
                };

                let messenger = unsafe {
                    loader.create_debug_utils_messenger(&messenger_ci, None)
                        .map_err(|e| VkError::vulkan("Debug Utils Messenger Creation", e))?
                };
                VkDebugger::Utils { loader, messenger }
            },
            | DebugType::None => VkDebugger::None,
        };

        Ok(debugger)
    }

    pub fn discard(&self) {

        unsafe {
            match self {
                | VkDebugger::Report { loader, callback } => loader.destroy_debug_report_callback(*callback, None),
                | VkDebugger::Utils { loader, messenger } => loader.destroy_debug_utils_messenger(*messenger, None),
                | VkDebugger::None => {},
            }
        }
    }
}

/// Map the severity of a validation message to the level it is logged with.
pub(crate) fn utils_severity_level(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> log::Level {

    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        log::Level::Error
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        log::Level::Warn
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        log::Level::Info
    } else {
        log::Level::Debug
    }
}

pub(crate) fn report_flags_level(flags: vk::DebugReportFlagsEXT) -> log::Level {

    if flags.contains(vk::DebugReportFlagsEXT::ERROR) {
        log::Level::Error
    } else if flags.intersects(vk::DebugReportFlagsEXT::WARNING | vk::DebugReportFlagsEXT::PERFORMANCE_WARNING) {
        log::Level::Warn
    } else if flags.contains(vk::DebugReportFlagsEXT::INFORMATION) {
        log::Level::Info
    } else {
        log::Level::Debug
    }
}

fn utils_type_name(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {

    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::GENERAL) {
        "General"
    } else {
        "Unknown"
    }
}

unsafe extern "system" fn vulkan_debug_report_callback(
    flags: vk::DebugReportFlagsEXT,
    _: vk::DebugReportObjectTypeEXT,
    _: vklint,
    _: usize,
    _: vksint,
    layer_prefix: *const vkchar,
    message: *const vkchar,
    _: vkptr,
) -> vkbool {

    let prefix = if layer_prefix.is_null() {
        Cow::Borrowed("")
    } else {
        CStr::from_ptr(layer_prefix).to_string_lossy()
    };

    log::log!(report_flags_level(flags), "[{}] {}", prefix, CStr::from_ptr(message).to_string_lossy());
    vk::FALSE
}

unsafe extern "system" fn vulkan_debug_utils_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _: vkptr,
) -> vkbool {

    let message = CStr::from_ptr((*callback_data).p_message).to_string_lossy();
    log::log!(utils_severity_level(severity), "[{}] {}", utils_type_name(message_type), message);
    vk::FALSE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_severity_maps_to_log_level() {

        assert_eq!(utils_severity_level(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR), log::Level::Error);
        assert_eq!(utils_severity_level(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING), log::Level::Warn);
        assert_eq!(utils_severity_level(vk::DebugUtilsMessageSeverityFlagsEXT::INFO), log::Level::Info);
        assert_eq!(utils_severity_level(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE), log::Level::Debug);

        assert_eq!(report_flags_level(vk::DebugReportFlagsEXT::PERFORMANCE_WARNING), log::Level::Warn);
        assert_eq!(report_flags_level(vk::DebugReportFlagsEXT::ERROR | vk::DebugReportFlagsEXT::WARNING), log::Level::Error);
        assert_eq!(report_flags_level(vk::DebugReportFlagsEXT::DEBUG), log::Level::Debug);
    }

    #[test]
    fn combined_message_types_prefer_validation() {

        let types = vk::DebugUtilsMessageTypeFlagsEXT::GENERAL | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION;
        assert_eq!(utils_type_name(types), "Validation");
        assert_eq!(utils_type_name(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE), "Performance");
        assert_eq!(utils_type_name(vk::DebugUtilsMessageTypeFlagsEXT::empty()), "Unknown");
    }

    #[test]
    fn warnings_and_errors_are_reported_by_default() {

        let config = ValidationConfig::default();
        assert_eq!(config.debug_type, DebugType::DebugUtils);
        assert!(config.severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING));
        assert!(!config.severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE));
        assert!(config.report_flags.contains(vk::DebugReportFlagsEXT::ERROR));
    }
}
