
use ash::vk;
use rand::Rng;

use vkbase::context::{VkDevice, VkQueue};
use vkbase::ci::VkObjectBuildableCI;
use vkbase::ci::command::CommandPoolCI;
use vkbase::texture::{SparseTexture, SparseTextureConfig, VirtualTexture};
use vkbase::{VkResult, VkError, vkuint};

/// The chance of each non-resident page to be filled in the random fill step.
const FILL_PROBABILITY: f64 = 0.1;
/// The chance of each resident page to be released in the random flush step.
const FLUSH_PROBABILITY: f64 = 0.5;
/// The number of mip levels above the mip tail filled one by one, from coarse to fine.
const FILLED_MIP_LEVELS: vkuint = 3;

pub fn run() -> VkResult<()> {

    let mut features = vk::PhysicalDeviceFeatures::default();
    features.sparse_binding = vk::TRUE;
    features.sparse_residency_image2_d = vk::TRUE;

    let queues = vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER | vk::QueueFlags::SPARSE_BINDING;
    let context = vkexamples::default_context(features, queues)?;

    let sparse_properties = &context.device.phy.sparse_properties;
    log::info!("Running sparse texture residency example on {}.", context.device.phy.device_name);
    log::info!("Sparse residency: standard 2D block shape({}), non-resident strict({}).",
        sparse_properties.residency_standard2_d_block_shape == vk::TRUE,
        sparse_properties.residency_non_resident_strict == vk::TRUE);

    let result = VulkanExample::new(&context.device)
        .and_then(|mut example| {
            let output = example.run_script(&context.device, &mut rand::thread_rng());
            // pages may still be referenced by pending work when the script fails halfway.
            let idle = context.device.wait_idle();
            example.discard(&context.device);
            output.and(idle)
        });

    context.discard();
    result
}

struct VulkanExample {

    command_pool: vk::CommandPool,
    texture: SparseTexture,
}

impl VulkanExample {

    fn new(device: &VkDevice) -> VkResult<VulkanExample> {

        let sparse_queue = &device.logic.queues.sparse;
        if !sparse_queue.is_available() {
            return Err(VkError::unsupported("Sparse Binding Queue"))
        }

        let command_pool = CommandPoolCI::new(device.logic.queues.graphics.family_index)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .build(device)?;

        let texture = match SparseTexture::new(device, sparse_queue, &SparseTextureConfig::default()) {
            | Ok(texture) => texture,
            | Err(e) => {
                device.discard(command_pool);
                return Err(e)
            },
        };

        Ok(VulkanExample { command_pool, texture })
    }

    fn run_script(&mut self, device: &VkDevice, rng: &mut impl Rng) -> VkResult<()> {

        let sparse_queue = &device.logic.queues.sparse;
        let transfer_queue = &device.logic.queues.graphics;

        // 1. the mip tail is bound at creation, so it only needs content.
        self.texture.fill_mip_tail(device, self.command_pool, transfer_queue, |_, extent| {
            vkexamples::random_pattern(extent.width, extent.height, &mut *rng)
        })?;
        log_residency("Fill mip tail", &self.texture.virtual_texture);

        // 2. the levels outside the mip tail, from the smallest one toward finer levels.
        for mip_level in fill_levels(self.texture.virtual_texture.mip_tail_start()) {
            let filled = self.texture.fill_mip_level(device, sparse_queue, mip_level)?;
            self.upload_random_content(device, transfer_queue, &filled, &mut *rng, None)?;
            log_residency(&format!("Fill mip level {}", mip_level), &self.texture.virtual_texture);
        }

        // 3. random pages, each with its own pattern.
        let selected = vkexamples::select_fill_pages(self.texture.virtual_texture.pages(), FILL_PROBABILITY, &mut *rng);
        let filled = self.texture.fill_pages(device, sparse_queue, &selected)?;

        let mut expected = filled.first().map(|&index| (index, Vec::new()));
        self.upload_random_content(device, transfer_queue, &filled, &mut *rng, expected.as_mut())?;
        log_residency("Fill random pages", &self.texture.virtual_texture);

        // 4. read one of the new pages back.
        if let Some((index, content)) = expected {
            self.verify_page(device, transfer_queue, index, &content)?;
        }

        // 5. release random pages.
        let selected = vkexamples::select_flush_pages(self.texture.virtual_texture.pages(), FLUSH_PROBABILITY, &mut *rng);
        self.texture.release_pages(device, sparse_queue, &selected)?;
        log_residency("Flush random pages", &self.texture.virtual_texture);

        // 6. release everything except the mip tail.
        self.texture.flush(device, sparse_queue)?;
        log_residency("Flush texture", &self.texture.virtual_texture);

        Ok(())
    }

    /// Upload a random pattern to every page in `indices`. The content of the page in `keep` is stored in it.
    fn upload_random_content(&mut self, device: &VkDevice, queue: &VkQueue, indices: &[usize], rng: &mut impl Rng, mut keep: Option<&mut (usize, Vec<u8>)>) -> VkResult<()> {

        self.texture.upload_pages(device, self.command_pool, queue, indices, |page| {

            let content = vkexamples::random_pattern(page.extent.width, page.extent.height, &mut *rng);
            if let Some(kept) = keep.as_mut() {
                if kept.0 == page.index {
                    kept.1 = content.clone();
                }
            }
            content
        })
    }

    fn verify_page(&mut self, device: &VkDevice, queue: &VkQueue, index: usize, expected: &[u8]) -> VkResult<()> {

        let content = self.texture.read_page(device, self.command_pool, queue, index)?;

        if content.as_slice() == expected {
            log::info!("Content of page {} matches the uploaded pattern.", index);
            Ok(())
        } else {
            Err(VkError::other(format!("Content of page {} does not match the uploaded pattern.", index)))
        }
    }

    fn discard(self, device: &VkDevice) {

        self.texture.discard(device);
        device.discard(self.command_pool);
    }
}

/// The mip levels filled before the random pages, starting from the last one before the mip tail.
fn fill_levels(mip_tail_start: vkuint) -> impl Iterator<Item = vkuint> {
    (mip_tail_start.saturating_sub(FILLED_MIP_LEVELS)..mip_tail_start).rev()
}

fn residency_summary(texture: &VirtualTexture) -> String {

    format!("Resident pages: {} of {} ({} KiB)",
        texture.resident_count(), texture.page_count(), texture.resident_bytes() / 1024)
}

fn log_residency(step: &str, texture: &VirtualTexture) {
    log::info!("{}. {}", step, residency_summary(texture));
}

#[cfg(test)]
mod tests {
    use super::*;
    use vkbase::texture::PageAllocator;
    use vkbase::vkbytes;
    use ash::vk::Handle;

    struct FakeAllocator {
        next: u64,
    }

    impl PageAllocator for FakeAllocator {

        fn allocate_page(&mut self, _size: vkbytes, _memory_type_index: vkuint) -> VkResult<vk::DeviceMemory> {
            self.next += 1;
            Ok(vk::DeviceMemory::from_raw(self.next))
        }

        fn free_page(&mut self, _memory: vk::DeviceMemory) {}
    }

    #[test]
    fn levels_are_filled_from_coarse_to_fine() {

        assert_eq!(fill_levels(8).collect::<Vec<_>>(), vec![7, 6, 5]);
        assert_eq!(fill_levels(2).collect::<Vec<_>>(), vec![1, 0]);
        // every level is in the mip tail.
        assert_eq!(fill_levels(0).count(), 0);
    }

    #[test]
    fn summary_counts_resident_pages() {

        let mut texture = VirtualTexture::new(vk::Image::null(), 0);
        for i in 0..4 {
            let offset = vk::Offset3D { x: i * 128, y: 0, z: 0 };
            texture.add_page(offset, vk::Extent3D { width: 128, height: 128, depth: 1 }, 65536, 0, 0);
        }

        let mut allocator = FakeAllocator { next: 0 };
        assert!(texture.allocate_page(1, &mut allocator).unwrap());
        assert!(texture.allocate_page(3, &mut allocator).unwrap());

        assert_eq!(residency_summary(&texture), "Resident pages: 2 of 4 (128 KiB)");
    }
}
