
use ash::vk;

use crate::context::instance::VkInstance;
use crate::utils::cast::chars2string;
use crate::error::{VkResult, VkError};

use std::mem;
use std::slice;

/// Devices of this type are tried first.
const PREFERRED_DEVICE_TYPE: vk::PhysicalDeviceType = vk::PhysicalDeviceType::DISCRETE_GPU;

/// Depth formats from the highest precision down. Any of them may be unsupported.
const DEPTH_FORMAT_CANDIDATES: [vk::Format; 5] = [
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D32_SFLOAT,
    vk::Format::D24_UNORM_S8_UINT,
    vk::Format::D16_UNORM_S8_UINT,
    vk::Format::D16_UNORM,
];

#[derive(Debug, Clone, Default)]
pub struct PhysicalDevConfig {
    request_features: vk::PhysicalDeviceFeatures,
}

impl PhysicalDevConfig {

    /// Devices missing any of `features` are skipped. The same features are enabled on the logical device.
    pub fn with_features(mut self, features: vk::PhysicalDeviceFeatures) -> PhysicalDevConfig {
        self.request_features = features; self
    }
}

pub struct VkPhysicalDevice {

    pub handle: vk::PhysicalDevice,
    pub memories: vk::PhysicalDeviceMemoryProperties,
    pub depth_format: vk::Format,

    pub limits: vk::PhysicalDeviceLimits,
    pub sparse_properties: vk::PhysicalDeviceSparseProperties,
    pub device_name: String,

    instance: ash::Instance,
    config: PhysicalDevConfig,
}

impl VkPhysicalDevice {

    pub(crate) fn new(instance: &VkInstance, config: PhysicalDevConfig) -> VkResult<VkPhysicalDevice> {

        let mut candidates = unsafe {
            instance.handle.enumerate_physical_devices()
                .map_err(|e| VkError::vulkan("Physical Device Enumeration", e))?
        };
        // stable, so enumeration order is kept among devices of the same preference.
        candidates.sort_by_key(|&handle| {
            let property = unsafe { instance.handle.get_physical_device_properties(handle) };
            property.device_type != PREFERRED_DEVICE_TYPE
        });

        for handle in candidates {

            let property = unsafe { instance.handle.get_physical_device_properties(handle) };
            let device_name = chars2string(&property.device_name);

            let available = unsafe { instance.handle.get_physical_device_features(handle) };
            if !is_features_subset(&available, &config.request_features) {
                log::info!("Device {} is skipped for missing requested features.", device_name);
                continue
            }

            log_device_properties(&device_name, &property);

            let memories = unsafe { instance.handle.get_physical_device_memory_properties(handle) };
            let depth_format = query_depth_format(instance, handle)?;

            return Ok(VkPhysicalDevice {
                handle, memories, depth_format, device_name,
                limits: property.limits,
                sparse_properties: property.sparse_properties,
                instance: instance.handle.clone(),
                config,
            })
        }

        Err(VkError::unsupported("Requested features on any Vulkan device"))
    }

    pub fn enable_features(&self) -> &vk::PhysicalDeviceFeatures {
        &self.config.request_features
    }

    /// Query the sparse image properties of a format, returning an empty list if the combination does not support sparse residency.
    pub fn sparse_image_format_properties(&self, format: vk::Format, ty: vk::ImageType, samples: vk::SampleCountFlags, usage: vk::ImageUsageFlags, tiling: vk::ImageTiling) -> Vec<vk::SparseImageFormatProperties> {
        unsafe {
            self.instance.get_physical_device_sparse_image_format_properties(self.handle, format, ty, samples, usage, tiling)
        }
    }
}

fn log_device_properties(device_name: &str, property: &vk::PhysicalDeviceProperties) {

    log::info!("Using device: {}", device_name);
    log::info!("Device API version: {}.{}.{}",
        vk::api_version_major(property.api_version),
        vk::api_version_minor(property.api_version),
        vk::api_version_patch(property.api_version));
    log::info!("Device Type: {}", device_type_name(property.device_type));
}

fn device_type_name(device_type: vk::PhysicalDeviceType) -> &'static str {

    match device_type {
        | vk::PhysicalDeviceType::CPU            => "CPU",
        | vk::PhysicalDeviceType::INTEGRATED_GPU => "Integrated GPU",
        | vk::PhysicalDeviceType::DISCRETE_GPU   => "Discrete GPU",
        | vk::PhysicalDeviceType::VIRTUAL_GPU    => "Virtual GPU",
        | _ => "Unknown",
    }
}

fn feature_flags(features: &vk::PhysicalDeviceFeatures) -> &[vk::Bool32] {

    // vk::PhysicalDeviceFeatures is a repr(C) struct made only of vk::Bool32 members.
    let count = mem::size_of::<vk::PhysicalDeviceFeatures>() / mem::size_of::<vk::Bool32>();
    unsafe {
        slice::from_raw_parts(features as *const vk::PhysicalDeviceFeatures as *const vk::Bool32, count)
    }
}

fn is_features_subset(available: &vk::PhysicalDeviceFeatures, requested: &vk::PhysicalDeviceFeatures) -> bool {

    feature_flags(requested).iter()
        .zip(feature_flags(available))
        .all(|(&requested, &available)| requested == vk::FALSE || available == vk::TRUE)
}

fn query_depth_format(instance: &VkInstance, handle: vk::PhysicalDevice) -> VkResult<vk::Format> {

    DEPTH_FORMAT_CANDIDATES.iter().copied()
        .find(|&format| {
            let properties = unsafe { instance.handle.get_physical_device_format_properties(handle, format) };
            properties.optimal_tiling_features.contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
        })
        .ok_or(VkError::unsupported("Depth Stencil Attachment format"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_features_must_be_available() {

        let requested = vk::PhysicalDeviceFeatures {
            sparse_binding: vk::TRUE,
            sparse_residency_image2_d: vk::TRUE,
            ..Default::default()
        };

        let only_binding = vk::PhysicalDeviceFeatures { sparse_binding: vk::TRUE, ..Default::default() };
        assert!(!is_features_subset(&only_binding, &requested));

        let both = vk::PhysicalDeviceFeatures {
            sparse_binding: vk::TRUE,
            sparse_residency_image2_d: vk::TRUE,
            sampler_anisotropy: vk::TRUE,
            ..Default::default()
        };
        assert!(is_features_subset(&both, &requested));
    }

    #[test]
    fn no_requested_features_accepts_any_device() {
        let config = PhysicalDevConfig::default();
        assert!(is_features_subset(&vk::PhysicalDeviceFeatures::default(), &config.request_features));
    }

    #[test]
    fn last_feature_is_checked() {

        let requested = vk::PhysicalDeviceFeatures { inherited_queries: vk::TRUE, ..Default::default() };
        assert_eq!(feature_flags(&requested).last(), Some(&vk::TRUE));
        assert!(!is_features_subset(&vk::PhysicalDeviceFeatures::default(), &requested));
    }
}
