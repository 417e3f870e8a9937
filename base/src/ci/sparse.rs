
use ash::vk;

use crate::ci::VulkanCI;
use crate::context::{VkSubmitCI, VkDevice};
use crate::error::{VkResult, VkError};
use crate::vkuint;

use smallvec::SmallVec;

use std::ptr;

// ----------------------------------------------------------------------------------------------
/// Wrapper class for vk::BindSparseInfo targeting a single sparse image.
///
/// The image-bind count (and the opaque-bind count) in the final structure is 1 when the
/// corresponding bind list is not empty, and 0 otherwise.
#[derive(Debug, Clone)]
pub struct BindSparseCI {

    ci: vk::BindSparseInfo,
    image: vk::Image,

    image_binds : Vec<vk::SparseImageMemoryBind>,
    opaque_binds: Vec<vk::SparseMemoryBind>,

    wait_semaphores  : SmallVec<[vk::Semaphore; 2]>,
    signal_semaphores: SmallVec<[vk::Semaphore; 2]>,
}

impl VulkanCI<vk::BindSparseInfo> for BindSparseCI {

    fn default_ci() -> vk::BindSparseInfo {

        vk::BindSparseInfo {
            s_type: vk::StructureType::BIND_SPARSE_INFO,
            p_next: ptr::null(),
            wait_semaphore_count  : 0,
            p_wait_semaphores     : ptr::null(),
            buffer_bind_count     : 0,
            p_buffer_binds        : ptr::null(),
            image_opaque_bind_count: 0,
            p_image_opaque_binds  : ptr::null(),
            image_bind_count      : 0,
            p_image_binds         : ptr::null(),
            signal_semaphore_count: 0,
            p_signal_semaphores   : ptr::null(),
        }
    }
}

impl BindSparseCI {

    pub fn new(image: vk::Image) -> BindSparseCI {

        BindSparseCI {
            ci: BindSparseCI::default_ci(),
            image,
            image_binds : Vec::new(),
            opaque_binds: Vec::new(),
            wait_semaphores  : SmallVec::new(),
            signal_semaphores: SmallVec::new(),
        }
    }

    #[inline(always)]
    pub fn add_image_binds(mut self, binds: impl IntoIterator<Item = vk::SparseImageMemoryBind>) -> BindSparseCI {
        self.image_binds.extend(binds); self
    }

    #[inline(always)]
    pub fn add_opaque_binds(mut self, binds: impl IntoIterator<Item = vk::SparseMemoryBind>) -> BindSparseCI {
        self.opaque_binds.extend(binds); self
    }

    #[inline(always)]
    pub fn add_wait(mut self, semaphore: vk::Semaphore) -> BindSparseCI {
        self.wait_semaphores.push(semaphore); self
    }

    #[inline(always)]
    pub fn add_signal(mut self, semaphore: vk::Semaphore) -> BindSparseCI {
        self.signal_semaphores.push(semaphore); self
    }

    pub fn image_binds(&self) -> &[vk::SparseImageMemoryBind] {
        &self.image_binds
    }

    pub fn opaque_binds(&self) -> &[vk::SparseMemoryBind] {
        &self.opaque_binds
    }

    pub fn image_bind_info(&self) -> vk::SparseImageMemoryBindInfo {

        vk::SparseImageMemoryBindInfo {
            image: self.image,
            bind_count: self.image_binds.len() as _,
            p_binds   : self.image_binds.as_ptr(),
        }
    }

    pub fn opaque_bind_info(&self) -> vk::SparseImageOpaqueMemoryBindInfo {

        vk::SparseImageOpaqueMemoryBindInfo {
            image: self.image,
            bind_count: self.opaque_binds.len() as _,
            p_binds   : self.opaque_binds.as_ptr(),
        }
    }

    /// The raw structure, pointing at `image_info` and `opaque_info` which must outlive it.
    pub fn value(&self, image_info: &vk::SparseImageMemoryBindInfo, opaque_info: &vk::SparseImageOpaqueMemoryBindInfo) -> vk::BindSparseInfo {

        vk::BindSparseInfo {
            wait_semaphore_count   : self.wait_semaphores.len() as _,
            p_wait_semaphores      : self.wait_semaphores.as_ptr(),
            image_bind_count       : bind_info_count(image_info.bind_count),
            p_image_binds          : image_info,
            image_opaque_bind_count: bind_info_count(opaque_info.bind_count),
            p_image_opaque_binds   : opaque_info,
            signal_semaphore_count : self.signal_semaphores.len() as _,
            p_signal_semaphores    : self.signal_semaphores.as_ptr(),
            ..self.ci
        }
    }
}

#[inline]
fn bind_info_count(bind_count: vkuint) -> vkuint {
    if bind_count > 0 { 1 } else { 0 }
}

impl VkSubmitCI for BindSparseCI {

    fn submit(&self, device: &VkDevice, queue: vk::Queue, wait_fence: vk::Fence) -> VkResult<()> {

        let image_info  = self.image_bind_info();
        let opaque_info = self.opaque_bind_info();
        let bind_info = self.value(&image_info, &opaque_info);

        log::debug!("Bind sparse: {} image binds, {} opaque binds.", self.image_binds.len(), self.opaque_binds.len());

        unsafe {
            device.logic.handle.queue_bind_sparse(queue, &[bind_info], wait_fence)
                .map_err(|e| VkError::vulkan("Queue Bind Sparse", e))
        }
    }
}
// ----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    fn image_bind(mip_level: vkuint) -> vk::SparseImageMemoryBind {
        vk::SparseImageMemoryBind {
            subresource: vk::ImageSubresource {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level,
                array_layer: 0,
            },
            ..Default::default()
        }
    }

    #[test]
    fn empty_bind_lists_give_zero_counts() {

        let ci = BindSparseCI::new(vk::Image::from_raw(7));
        let image_info = ci.image_bind_info();
        let opaque_info = ci.opaque_bind_info();
        let value = ci.value(&image_info, &opaque_info);

        assert_eq!(value.image_bind_count, 0);
        assert_eq!(value.image_opaque_bind_count, 0);
        assert_eq!(value.buffer_bind_count, 0);
    }

    #[test]
    fn bind_info_count_is_one_per_image() {

        let ci = BindSparseCI::new(vk::Image::from_raw(7))
            .add_image_binds(vec![image_bind(0), image_bind(0), image_bind(1)])
            .add_opaque_binds(vec![vk::SparseMemoryBind { size: 65536, ..Default::default() }])
            .add_signal(vk::Semaphore::from_raw(3));

        let image_info = ci.image_bind_info();
        let opaque_info = ci.opaque_bind_info();
        let value = ci.value(&image_info, &opaque_info);

        assert_eq!(value.image_bind_count, 1);
        assert_eq!(value.image_opaque_bind_count, 1);
        assert_eq!(value.signal_semaphore_count, 1);
        assert_eq!(value.wait_semaphore_count, 0);

        assert_eq!(image_info.bind_count, 3);
        assert_eq!(image_info.image, vk::Image::from_raw(7));
        assert_eq!(opaque_info.bind_count, 1);

        let bound = unsafe { &*value.p_image_binds };
        assert_eq!(bound.bind_count, 3);
        assert_eq!(unsafe { (*bound.p_binds.add(2)).subresource.mip_level }, 1);
    }
}
