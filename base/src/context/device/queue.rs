
use ash::vk;

use crate::context::instance::VkInstance;
use crate::context::device::physical::VkPhysicalDevice;
use crate::context::device::logical::VkQueue;
use crate::error::{VkResult, VkError};
use crate::{vkfloat, vkuint};

use std::ptr;

type FamilyIndex   = usize;
type QueueIndex    = usize;
type QueuePriority = vkfloat;

pub struct QueueRequester {

    // record the current create info of each queue family.
    cis: Vec<FamilyQueuesCreateInfo>,
    // the properties of each queue family queried from Vulkan.
    family_properties: Vec<vk::QueueFamilyProperties>,
    // record the family index and inner queue index of each requested queue.
    queues_requested: Vec<(FamilyIndex, QueueIndex)>,
}

#[derive(Default)]
struct FamilyQueuesCreateInfo {

    count: vkuint,
    priorities: Vec<QueuePriority>,
}

impl QueueRequester {

    pub fn new(instance: &VkInstance, phy: &VkPhysicalDevice) -> QueueRequester {

        let families = unsafe {
            instance.handle.get_physical_device_queue_family_properties(phy.handle)
        };

        QueueRequester::from_properties(families)
    }

    pub fn from_properties(families: Vec<vk::QueueFamilyProperties>) -> QueueRequester {

        let mut queue_cis = Vec::with_capacity(families.len());
        for _ in 0..families.len() {
            queue_cis.push(FamilyQueuesCreateInfo::default());
        }

        QueueRequester {
            cis: queue_cis,
            family_properties: families,
            queues_requested: Vec::new(),
        }
    }

    /// Request a queue supporting `request_queue` and return the index of this request.
    ///
    /// A dedicated family is preferred, then the first family with a free queue.
    /// If every supporting family is exhausted, the first queue already created in a supporting family is shared.
    pub fn request_queue(&mut self, request_queue: vk::QueueFlags, priority: QueuePriority) -> VkResult<usize> {

        // get all support queue families.
        let mut candidate_families = self.candidate_family(request_queue);
        let mut selected_family = None;

        if candidate_families.is_empty() {
            return Err(VkError::other(format!("Request Queue with flags({:?}) is not support on current Vulkan device.", request_queue)))
        }

        // try to find a dedicated queue family.
        let dedicated_family = candidate_families.iter().enumerate().find_map(|(pos, &family_index)| {
            if self.family_properties[family_index].queue_flags == request_queue {
                Some((family_index, pos))
            } else {
                None
            }
        });

        // check if there are enough queues remain in dedicated queue family.
        if let Some((dedicated_family_index, position)) = dedicated_family {

            if self.has_free_queue(dedicated_family_index) {
                // set dedicated_family_index as the final selected queue family.
                selected_family = Some(dedicated_family_index);
            } else {
                // if there are no queue remaining in this family.
                // remove this candidate queue family.
                candidate_families.remove(position);
            }
        }

        if selected_family.is_none() {

            // select the first family which has remaining queue.
            selected_family = candidate_families.iter().find(|&&family_index| {
                self.has_free_queue(family_index)
            }).cloned();
        }

        let requested_index = self.queues_requested.len();

        if let Some(final_family) = selected_family {

            let queue_index = self.cis[final_family].count;

            // update queue family counts.
            self.cis[final_family].count += 1;
            self.cis[final_family].priorities.push(priority);

            self.queues_requested.push((final_family, queue_index as usize));
        } else {

            // all queues are in use, share a queue that has been requested before.
            let shared_family = self.candidate_family(request_queue).into_iter()
                .find(|&family_index| self.cis[family_index].count > 0)
                .ok_or(VkError::other(format!("No queue remains for Request Queue with flags({:?}).", request_queue)))?;

            self.queues_requested.push((shared_family, 0));
        }

        Ok(requested_index)
    }

    fn has_free_queue(&self, family_index: FamilyIndex) -> bool {
        self.cis[family_index].count < self.family_properties[family_index].queue_count
    }

    fn candidate_family(&self, request_queue: vk::QueueFlags) -> Vec<FamilyIndex> {

        self.family_properties.iter().enumerate().filter_map(|(i, family)| {

            if family.queue_flags.contains(request_queue) {
                Some(i)
            } else {
                None
            }
        }).collect()
    }

    /// The queue family index and queue index of a request.
    pub fn requested_location(&self, queue_request_index: usize) -> (vkuint, vkuint) {
        let (family_index, queue_index) = self.queues_requested[queue_request_index];
        (family_index as vkuint, queue_index as vkuint)
    }

    pub fn queue_cis(&self) -> Vec<vk::DeviceQueueCreateInfo> {

        self.cis.iter().enumerate().filter_map(|(family_index, ci)| {

            if ci.count > 0 {
                let device_queue_ci = vk::DeviceQueueCreateInfo {
                    s_type: vk::StructureType::DEVICE_QUEUE_CREATE_INFO,
                    p_next: ptr::null(),
                    flags : vk::DeviceQueueCreateFlags::empty(),
                    queue_family_index: family_index as _,
                    queue_count       : ci.priorities.len() as _,
                    p_queue_priorities: ci.priorities.as_ptr(),
                };
                Some(device_queue_ci)
            } else {
                None
            }
        }).collect()
    }

    pub fn dispatch_queue(&self, device: &ash::Device, queue_request_index: usize) -> VkQueue {

        let (family_index, queue_index) = self.requested_location(queue_request_index);

        let handle = unsafe {
            device.get_device_queue(family_index, queue_index)
        };

        VkQueue { handle, family_index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(queue_flags: vk::QueueFlags, queue_count: vkuint) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties { queue_flags, queue_count, ..Default::default() }
    }

    fn discrete_gpu_families() -> Vec<vk::QueueFamilyProperties> {
        vec![
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER | vk::QueueFlags::SPARSE_BINDING, 16),
            family(vk::QueueFlags::TRANSFER | vk::QueueFlags::SPARSE_BINDING, 2),
            family(vk::QueueFlags::COMPUTE, 8),
        ]
    }

    #[test]
    fn dedicated_family_is_preferred() {

        let mut requester = QueueRequester::from_properties(discrete_gpu_families());

        let graphics = requester.request_queue(vk::QueueFlags::GRAPHICS, 1.0).unwrap();
        let compute  = requester.request_queue(vk::QueueFlags::COMPUTE, 1.0).unwrap();

        assert_eq!(requester.requested_location(graphics), (0, 0));
        assert_eq!(requester.requested_location(compute), (2, 0));
    }

    #[test]
    fn exhausted_dedicated_family_falls_back_to_first_free() {

        let mut requester = QueueRequester::from_properties(vec![
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE, 4),
            family(vk::QueueFlags::COMPUTE, 1),
        ]);

        let first  = requester.request_queue(vk::QueueFlags::COMPUTE, 1.0).unwrap();
        let second = requester.request_queue(vk::QueueFlags::COMPUTE, 1.0).unwrap();

        assert_eq!(requester.requested_location(first), (1, 0));
        assert_eq!(requester.requested_location(second), (0, 0));
    }

    #[test]
    fn single_queue_device_shares_its_queue() {

        let mut requester = QueueRequester::from_properties(vec![
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER | vk::QueueFlags::SPARSE_BINDING, 1),
        ]);

        let graphics = requester.request_queue(vk::QueueFlags::GRAPHICS, 1.0).unwrap();
        let sparse   = requester.request_queue(vk::QueueFlags::SPARSE_BINDING, 1.0).unwrap();

        assert_eq!(requester.requested_location(graphics), (0, 0));
        assert_eq!(requester.requested_location(sparse), (0, 0));

        let cis = requester.queue_cis();
        assert_eq!(cis.len(), 1);
        assert_eq!(cis[0].queue_count, 1);
    }

    #[test]
    fn unsupported_flags_fail() {

        let mut requester = QueueRequester::from_properties(vec![
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER, 1),
        ]);
        assert!(requester.request_queue(vk::QueueFlags::SPARSE_BINDING, 1.0).is_err());
    }

    #[test]
    fn queue_cis_only_cover_used_families() {

        let mut requester = QueueRequester::from_properties(discrete_gpu_families());
        requester.request_queue(vk::QueueFlags::GRAPHICS, 1.0).unwrap();
        requester.request_queue(vk::QueueFlags::TRANSFER | vk::QueueFlags::SPARSE_BINDING, 1.0).unwrap();
        requester.request_queue(vk::QueueFlags::GRAPHICS, 0.5).unwrap();

        let cis = requester.queue_cis();
        assert_eq!(cis.len(), 2);
        assert_eq!((cis[0].queue_family_index, cis[0].queue_count), (0, 2));
        assert_eq!((cis[1].queue_family_index, cis[1].queue_count), (1, 1));
    }
}
