
pub use self::device::{VkDevice, VkLogicalDevice, VkPhysicalDevice, VkQueue, QueryFamilies};
pub use self::device::{VkObjectDiscardable, VkObjectAllocatable, VkObjectBindable, VkSubmitCI};
pub use self::marker::DebugMarker;

pub use self::instance::{VkInstance, InstanceConfig};
pub use self::debug::{ValidationConfig, DebugType};
pub use self::device::{LogicDevConfig, PhysicalDevConfig};

mod instance;
mod debug;
mod device;
mod marker;

use crate::error::VkResult;

#[derive(Debug, Default)]
pub struct VulkanConfig {

    instance  : InstanceConfig,
    debugger  : ValidationConfig,
    dev_logic : LogicDevConfig,
    dev_phy   : PhysicalDevConfig,
}

/// Everything needed to record and submit work, without any window or swapchain.
pub struct VulkanContext {

    instance: instance::VkInstance,
    debugger: debug::VkDebugger,

    pub device: device::VkDevice,
}

impl VulkanContext {

    pub fn new() -> VulkanContextBuilder {

        VulkanContextBuilder {
            config: VulkanConfig::default(),
        }
    }

    pub fn wait_idle(&self) -> VkResult<()> {
        self.device.wait_idle()
    }

    /// Destroy device, debugger and instance, in that order.
    ///
    /// All objects created by `device` must have been discarded before this call.
    pub fn discard(self) {

        self.device.discard_self();
        self.debugger.discard();
        self.instance.discard();

        log::info!("Vulkan context has been destroyed.");
    }
}

pub struct VulkanContextBuilder {

    config: VulkanConfig,
}

impl VulkanContextBuilder {

    pub fn with_instance_config(mut self, config: InstanceConfig) -> VulkanContextBuilder {
        self.config.instance = config; self
    }

    pub fn with_debugger_config(mut self, config: ValidationConfig) -> VulkanContextBuilder {
        self.config.debugger = config; self
    }

    pub fn with_logic_device_config(mut self, config: LogicDevConfig) -> VulkanContextBuilder {
        self.config.dev_logic = config; self
    }

    pub fn with_physical_device_config(mut self, config: PhysicalDevConfig) -> VulkanContextBuilder {
        self.config.dev_phy = config; self
    }

    pub fn build(self) -> VkResult<VulkanContext> {

        let instance = instance::VkInstance::new(self.config.instance, &self.config.debugger)?;
        let debugger = debug::VkDebugger::new(&instance, &self.config.debugger)?;

        let phy_device = device::VkPhysicalDevice::new(&instance, self.config.dev_phy)?;
        let logic_device = device::VkLogicalDevice::new(&instance, &phy_device, self.config.dev_logic)?;
        let marker = marker::DebugMarker::new(&instance, &logic_device.handle);

        log::info!("Vulkan context is ready on device `{}`.", phy_device.device_name);

        let device = device::VkDevice::new(logic_device, phy_device, marker);
        let context = VulkanContext { instance, debugger, device };
        Ok(context)
    }
}
