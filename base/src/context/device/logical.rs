
use ash::vk;

use crate::context::instance::VkInstance;
use crate::context::device::physical::VkPhysicalDevice;
use crate::context::device::queue::QueueRequester;
use crate::error::{VkResult, VkError};
use crate::vkuint;



#[derive(Debug, Clone)]
pub struct LogicDevConfig {

    pub request_queues: vk::QueueFlags,
}

impl Default for LogicDevConfig {

    fn default() -> LogicDevConfig {

        LogicDevConfig {
            request_queues: vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER,
        }
    }
}


pub struct VkLogicalDevice {

    pub handle: ash::Device,
    pub queues: QueryFamilies,
}

/// The queues requested in device creation. Queues that were not requested stay null.
pub struct QueryFamilies {
    pub graphics: VkQueue,
    pub compute : VkQueue,
    pub transfer: VkQueue,
    pub sparse  : VkQueue,
}

#[derive(Debug, Clone)]
pub struct VkQueue {
    pub handle: vk::Queue,
    pub family_index: vkuint,
}

impl VkQueue {

    pub fn is_available(&self) -> bool {
        self.handle != vk::Queue::null()
    }
}

impl VkLogicalDevice {

    pub fn new(instance: &VkInstance, phy: &VkPhysicalDevice, config: LogicDevConfig) -> VkResult<VkLogicalDevice> {

        let mut queue_requester = QueueRequester::new(instance, phy);
        let mut queue_requests = QueuesRequestInfo::default();

        if config.request_queues.contains(vk::QueueFlags::GRAPHICS) {
            let graphics_index = queue_requester.request_queue(vk::QueueFlags::GRAPHICS, 1.0)?;
            queue_requests.graphics_index = Some(graphics_index);
        }
        if config.request_queues.contains(vk::QueueFlags::COMPUTE) {
            let compute_index = queue_requester.request_queue(vk::QueueFlags::COMPUTE, 1.0)?;
            queue_requests.compute_index = Some(compute_index);
        }
        if config.request_queues.contains(vk::QueueFlags::TRANSFER) {
            let transfer_index = queue_requester.request_queue(vk::QueueFlags::TRANSFER, 1.0)?;
            queue_requests.transfer_index = Some(transfer_index);
        }
        if config.request_queues.contains(vk::QueueFlags::SPARSE_BINDING) {
            let sparse_index = queue_requester.request_queue(vk::QueueFlags::SPARSE_BINDING, 1.0)?;
            queue_requests.sparse_index = Some(sparse_index);
        }

        let queue_cis = queue_requester.queue_cis();

        use crate::utils::cast::cstrings2ptrs;
        let enable_layer_names = cstrings2ptrs(&instance.enable_layer_names);

        // headless rendering needs no device extensions.
        let device_ci = vk::DeviceCreateInfo {
            queue_create_info_count: queue_cis.len() as _,
            p_queue_create_infos   : queue_cis.as_ptr(),
            enabled_layer_count    : enable_layer_names.len() as _,
            pp_enabled_layer_names : enable_layer_names.as_ptr(),
            p_enabled_features     : phy.enable_features(),
            ..Default::default()
        };

        let handle = unsafe {
            instance.handle.create_device(phy.handle, &device_ci, None)
                .map_err(|e| VkError::vulkan("Logical Device Creation", e))?
        };

        let queues = queue_requests.dispatch_queues(&handle, &queue_requester);

        if config.request_queues.contains(vk::QueueFlags::GRAPHICS) {
            debug_assert!(queues.graphics.is_available())
        }
        if config.request_queues.contains(vk::QueueFlags::COMPUTE) {
            debug_assert!(queues.compute.is_available())
        }
        if config.request_queues.contains(vk::QueueFlags::TRANSFER) {
            debug_assert!(queues.transfer.is_available())
        }
        if config.request_queues.contains(vk::QueueFlags::SPARSE_BINDING) {
            debug_assert!(queues.sparse.is_available())
        }

        log::debug!("Queue families: graphics({}), compute({}), transfer({}), sparse({}).",
            queues.graphics.family_index, queues.compute.family_index, queues.transfer.family_index, queues.sparse.family_index);

        let device = VkLogicalDevice { handle, queues };
        Ok(device)
    }

    pub fn discard(&self) {

        unsafe {
            self.handle.destroy_device(None);
        }
    }
}


#[derive(Default)]
struct QueuesRequestInfo {
    graphics_index: Option<usize>,
    compute_index : Option<usize>,
    transfer_index: Option<usize>,
    sparse_index  : Option<usize>,
}

impl QueuesRequestInfo {

    fn dispatch_queues(self, device: &ash::Device, requester: &QueueRequester) -> QueryFamilies {

        let dispatch = |request_index: Option<usize>| {
            request_index.map(|index| requester.dispatch_queue(device, index))
                .unwrap_or_default()
        };

        QueryFamilies {
            graphics: dispatch(self.graphics_index),
            compute : dispatch(self.compute_index),
            transfer: dispatch(self.transfer_index),
            sparse  : dispatch(self.sparse_index),
        }
    }
}

impl Default for VkQueue {

    fn default() -> VkQueue {
        VkQueue {
            handle: vk::Queue::null(),
            family_index: 0,
        }
    }
}
