
use ash::vk;

use crate::ci::sparse::BindSparseCI;
use crate::error::{VkResult, VkError};
use crate::{vkuint, vksint, vkbytes};

/// The source of the device memory blocks that back resident pages.
pub trait PageAllocator {

    fn allocate_page(&mut self, size: vkbytes, memory_type_index: vkuint) -> VkResult<vk::DeviceMemory>;

    fn free_page(&mut self, memory: vk::DeviceMemory);
}

/// The count of granularity blocks on each axis. A partial block counts as a whole one.
pub fn aligned_division(extent: vk::Extent3D, granularity: vk::Extent3D) -> [vkuint; 3] {

    let divide = |length: vkuint, block: vkuint| {
        length / block + if length % block != 0 { 1 } else { 0 }
    };

    [
        divide(extent.width,  granularity.width),
        divide(extent.height, granularity.height),
        divide(extent.depth,  granularity.depth),
    ]
}

/// The length of the full mip chain of an image with size `width` x `height`.
pub fn mip_level_count(width: vkuint, height: vkuint) -> vkuint {

    let max_dimension = width.max(height).max(1);
    // floor(log2(n)) + 1.
    32 - max_dimension.leading_zeros()
}

/// The extent of `mip_level`, where every axis is at least 1.
pub fn mip_extent(extent: vk::Extent3D, mip_level: vkuint) -> vk::Extent3D {

    let shrink = |length: vkuint| length.checked_shr(mip_level).unwrap_or(0).max(1);

    vk::Extent3D {
        width : shrink(extent.width),
        height: shrink(extent.height),
        depth : shrink(extent.depth),
    }
}

// ----------------------------------------------------------------------------------------------
/// A granularity-sized region of one mip level of one layer.
///
/// A page is resident while it owns a memory block.
#[derive(Debug, Clone)]
pub struct VirtualTexturePage {

    pub offset: vk::Offset3D,
    pub extent: vk::Extent3D,
    /// the size of the memory block in bytes. This is the sparse block alignment of the image.
    pub size: vkbytes,
    pub mip_level: vkuint,
    pub layer: vkuint,
    pub index: usize,

    memory: Option<vk::DeviceMemory>,
}

impl VirtualTexturePage {

    /// Back this page with a new memory block. Returns `false` if it was already resident.
    pub fn allocate(&mut self, allocator: &mut impl PageAllocator, memory_type_index: vkuint) -> VkResult<bool> {

        if self.memory.is_some() {
            return Ok(false)
        }

        let memory = allocator.allocate_page(self.size, memory_type_index)?;
        self.memory = Some(memory);
        Ok(true)
    }

    /// Free the memory block of this page. Returns `false` if it was not resident.
    pub fn release(&mut self, allocator: &mut impl PageAllocator) -> bool {

        match self.memory.take() {
            | Some(memory) => {
                allocator.free_page(memory);
                true
            },
            | None => false,
        }
    }

    #[inline]
    pub fn is_resident(&self) -> bool {
        self.memory.is_some()
    }

    #[inline]
    pub fn memory(&self) -> Option<vk::DeviceMemory> {
        self.memory
    }

    /// A null memory in the bind unbinds this page from the image.
    pub fn image_memory_bind(&self) -> vk::SparseImageMemoryBind {

        vk::SparseImageMemoryBind {
            subresource: vk::ImageSubresource {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level  : self.mip_level,
                array_layer: self.layer,
            },
            offset: self.offset,
            extent: self.extent,
            memory: self.memory.unwrap_or(vk::DeviceMemory::null()),
            memory_offset: 0,
            flags: vk::SparseMemoryBindFlags::empty(),
        }
    }
}
// ----------------------------------------------------------------------------------------------

// ----------------------------------------------------------------------------------------------
/// The page table of a partially resident image.
#[derive(Debug)]
pub struct VirtualTexture {

    image: vk::Image,
    memory_type_index: vkuint,

    pages: Vec<VirtualTexturePage>,
    /// the opaque binds of the mip tail, which stay resident until `destroy`.
    opaque_binds: Vec<vk::SparseMemoryBind>,
    mip_tail_start: vkuint,
}

impl VirtualTexture {

    pub fn new(image: vk::Image, memory_type_index: vkuint) -> VirtualTexture {

        VirtualTexture {
            image, memory_type_index,
            pages: Vec::new(),
            opaque_binds: Vec::new(),
            mip_tail_start: 0,
        }
    }

    pub fn add_page(&mut self, offset: vk::Offset3D, extent: vk::Extent3D, size: vkbytes, mip_level: vkuint, layer: vkuint) -> &mut VirtualTexturePage {

        let index = self.pages.len();
        self.pages.push(VirtualTexturePage {
            offset, extent, size, mip_level, layer, index,
            memory: None,
        });

        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Split every mip level before the mip tail of every layer into pages.
    ///
    /// The last page on each axis covers the remainder of the level.
    pub fn build_pages(&mut self, extent: vk::Extent3D, layers: vkuint, requirements: &vk::SparseImageMemoryRequirements, page_size: vkbytes) -> VkResult<()> {

        let granularity = requirements.format_properties.image_granularity;
        if granularity.width == 0 || granularity.height == 0 || granularity.depth == 0 {
            return Err(VkError::other("Sparse image granularity must not be zero."))
        }

        self.mip_tail_start = requirements.image_mip_tail_first_lod;

        for layer in 0..layers {
            for mip_level in 0..requirements.image_mip_tail_first_lod {

                let level_extent = mip_extent(extent, mip_level);
                let [count_x, count_y, count_z] = aligned_division(level_extent, granularity);

                let last_block = |length: vkuint, block: vkuint| {
                    if length % block != 0 { length % block } else { block }
                };
                let last_extent = vk::Extent3D {
                    width : last_block(level_extent.width,  granularity.width),
                    height: last_block(level_extent.height, granularity.height),
                    depth : last_block(level_extent.depth,  granularity.depth),
                };

                for z in 0..count_z {
                    for y in 0..count_y {
                        for x in 0..count_x {

                            let offset = vk::Offset3D {
                                x: (x * granularity.width)  as vksint,
                                y: (y * granularity.height) as vksint,
                                z: (z * granularity.depth)  as vksint,
                            };
                            let page_extent = vk::Extent3D {
                                width : if x == count_x - 1 { last_extent.width  } else { granularity.width  },
                                height: if y == count_y - 1 { last_extent.height } else { granularity.height },
                                depth : if z == count_z - 1 { last_extent.depth  } else { granularity.depth  },
                            };

                            self.add_page(offset, page_extent, page_size, mip_level, layer);
                        }
                    }
                }
            }
        }

        log::debug!("Virtual texture: {} pages for {} layers below mip level {}.", self.pages.len(), layers, self.mip_tail_start);
        Ok(())
    }

    /// Allocate and bind the memory of the mip tail.
    ///
    /// Formats with `SINGLE_MIPTAIL` share one tail among all layers. Otherwise each layer has its own.
    pub fn bind_mip_tail(&mut self, allocator: &mut impl PageAllocator, layers: vkuint, mip_levels: vkuint, requirements: &vk::SparseImageMemoryRequirements) -> VkResult<()> {

        if requirements.image_mip_tail_first_lod >= mip_levels {
            return Ok(())
        }

        let single_mip_tail = requirements.format_properties.flags
            .contains(vk::SparseImageFormatFlags::SINGLE_MIPTAIL);

        let offsets: Vec<vkbytes> = if single_mip_tail {
            vec![requirements.image_mip_tail_offset]
        } else {
            (0..layers).map(|layer| {
                requirements.image_mip_tail_offset + (layer as vkbytes) * requirements.image_mip_tail_stride
            }).collect()
        };

        for resource_offset in offsets {

            let memory = allocator.allocate_page(requirements.image_mip_tail_size, self.memory_type_index)?;
            self.opaque_binds.push(vk::SparseMemoryBind {
                resource_offset,
                size: requirements.image_mip_tail_size,
                memory,
                memory_offset: 0,
                flags: vk::SparseMemoryBindFlags::empty(),
            });
        }

        Ok(())
    }

    /// Collect the binds of every page and of the mip tail.
    ///
    /// Non-resident pages are sent with null memory, so released pages get unbound.
    pub fn update_sparse_bind_info(&self) -> BindSparseCI {

        BindSparseCI::new(self.image)
            .add_image_binds(self.pages.iter().map(VirtualTexturePage::image_memory_bind))
            .add_opaque_binds(self.opaque_binds.iter().cloned())
    }

    pub fn allocate_page(&mut self, index: usize, allocator: &mut impl PageAllocator) -> VkResult<bool> {

        let memory_type_index = self.memory_type_index;
        let page = self.pages.get_mut(index)
            .ok_or(VkError::other(format!("Page {} is out of range.", index)))?;
        page.allocate(allocator, memory_type_index)
    }

    pub fn release_page(&mut self, index: usize, allocator: &mut impl PageAllocator) -> VkResult<bool> {

        let page = self.pages.get_mut(index)
            .ok_or(VkError::other(format!("Page {} is out of range.", index)))?;
        Ok(page.release(allocator))
    }

    /// Make every page of `mip_level` resident. Returns the indices of the pages allocated by this call.
    pub fn fill_mip_level(&mut self, allocator: &mut impl PageAllocator, mip_level: vkuint) -> VkResult<Vec<usize>> {

        let memory_type_index = self.memory_type_index;
        let mut allocated = Vec::new();

        for page in self.pages.iter_mut().filter(|page| page.mip_level == mip_level) {
            if page.allocate(allocator, memory_type_index)? {
                allocated.push(page.index);
            }
        }

        Ok(allocated)
    }

    pub fn release_all(&mut self, allocator: &mut impl PageAllocator) {

        for page in self.pages.iter_mut() {
            page.release(allocator);
        }
    }

    /// Release all pages and the memory of the mip tail.
    pub fn destroy(&mut self, allocator: &mut impl PageAllocator) {

        self.release_all(allocator);

        for bind in self.opaque_binds.drain(..) {
            allocator.free_page(bind.memory);
        }
    }

    #[inline]
    pub fn image(&self) -> vk::Image {
        self.image
    }

    #[inline]
    pub fn memory_type_index(&self) -> vkuint {
        self.memory_type_index
    }

    #[inline]
    pub fn mip_tail_start(&self) -> vkuint {
        self.mip_tail_start
    }

    #[inline]
    pub fn pages(&self) -> &[VirtualTexturePage] {
        &self.pages
    }

    #[inline]
    pub fn page(&self, index: usize) -> Option<&VirtualTexturePage> {
        self.pages.get(index)
    }

    #[inline]
    pub fn opaque_binds(&self) -> &[vk::SparseMemoryBind] {
        &self.opaque_binds
    }

    #[inline]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn resident_count(&self) -> usize {
        self.pages.iter().filter(|page| page.is_resident()).count()
    }

    pub fn resident_bytes(&self) -> vkbytes {
        self.pages.iter()
            .filter(|page| page.is_resident())
            .map(|page| page.size)
            .sum()
    }
}
// ----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;
    use std::collections::HashSet;

    /// Hands out fake memory handles and remembers which ones are still alive.
    #[derive(Default)]
    struct CountingAllocator {
        next_handle: u64,
        live: HashSet<u64>,
        allocated_bytes: vkbytes,
        fail_after: Option<usize>,
    }

    impl PageAllocator for CountingAllocator {

        fn allocate_page(&mut self, size: vkbytes, _memory_type_index: vkuint) -> VkResult<vk::DeviceMemory> {

            if let Some(limit) = self.fail_after {
                if self.live.len() >= limit {
                    return Err(VkError::vulkan("Memory Allocate", vk::Result::ERROR_OUT_OF_DEVICE_MEMORY))
                }
            }

            self.next_handle += 1;
            self.live.insert(self.next_handle);
            self.allocated_bytes += size;
            Ok(vk::DeviceMemory::from_raw(self.next_handle))
        }

        fn free_page(&mut self, memory: vk::DeviceMemory) {
            assert!(self.live.remove(&memory.as_raw()), "double free of page memory");
        }
    }

    const PAGE_SIZE: vkbytes = 65536;

    fn requirements(first_lod: vkuint, flags: vk::SparseImageFormatFlags) -> vk::SparseImageMemoryRequirements {
        vk::SparseImageMemoryRequirements {
            format_properties: vk::SparseImageFormatProperties {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                image_granularity: vk::Extent3D { width: 128, height: 128, depth: 1 },
                flags,
            },
            image_mip_tail_first_lod: first_lod,
            image_mip_tail_size  : 2 * PAGE_SIZE,
            image_mip_tail_offset: 1 << 24,
            image_mip_tail_stride: 1 << 20,
        }
    }

    fn extent(width: vkuint, height: vkuint) -> vk::Extent3D {
        vk::Extent3D { width, height, depth: 1 }
    }

    fn texture_with_pages(width: vkuint, height: vkuint, layers: vkuint, first_lod: vkuint) -> VirtualTexture {
        let mut texture = VirtualTexture::new(vk::Image::from_raw(42), 3);
        texture.build_pages(extent(width, height), layers, &requirements(first_lod, vk::SparseImageFormatFlags::empty()), PAGE_SIZE)
            .expect("valid granularity");
        texture
    }

    #[test]
    fn aligned_division_rounds_partial_blocks_up() {

        let granularity = vk::Extent3D { width: 128, height: 64, depth: 1 };
        assert_eq!(aligned_division(extent(256, 128), granularity), [2, 2, 1]);
        assert_eq!(aligned_division(extent(257, 1), granularity), [3, 1, 1]);
        assert_eq!(aligned_division(extent(0, 0), granularity)[0], 0);
    }

    #[test]
    fn mip_level_count_follows_largest_dimension() {

        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 1), 2);
        assert_eq!(mip_level_count(1024, 1024), 11);
        assert_eq!(mip_level_count(1000, 3), 10);
        assert_eq!(mip_level_count(8192, 4096), 14);
    }

    #[test]
    fn mip_extent_never_reaches_zero() {

        assert_eq!(mip_extent(extent(1024, 256), 3), extent(128, 32));
        assert_eq!(mip_extent(extent(1024, 256), 10), extent(1, 1));
        assert_eq!(mip_extent(extent(4, 4), 40), extent(1, 1));
    }

    #[test]
    fn pages_cover_every_level_before_mip_tail() {

        // 1024x1024 with 128x128 granularity: 64 + 16 + 4 + 1 pages for mip 0..4.
        let texture = texture_with_pages(1024, 1024, 1, 4);
        assert_eq!(texture.page_count(), 85);
        assert_eq!(texture.mip_tail_start(), 4);

        let indices: Vec<usize> = texture.pages().iter().map(|page| page.index).collect();
        assert_eq!(indices, (0..85).collect::<Vec<_>>());
        assert!(texture.pages().iter().all(|page| page.size == PAGE_SIZE && !page.is_resident()));

        let last = texture.page(84).unwrap();
        assert_eq!(last.mip_level, 3);
        assert_eq!(last.extent, extent(128, 128));
    }

    #[test]
    fn last_block_keeps_the_remainder() {

        let texture = texture_with_pages(300, 128, 1, 1);
        assert_eq!(texture.page_count(), 3);

        let pages = texture.pages();
        assert_eq!(pages[0].extent.width, 128);
        assert_eq!(pages[2].offset.x, 256);
        assert_eq!(pages[2].extent.width, 44);
        assert_eq!(pages[2].extent.height, 128);
    }

    #[test]
    fn pages_are_repeated_for_each_layer() {

        let texture = texture_with_pages(256, 256, 3, 1);
        assert_eq!(texture.page_count(), 12);
        assert_eq!(texture.pages().iter().filter(|page| page.layer == 2).count(), 4);
    }

    #[test]
    fn allocate_and_release_are_idempotent() {

        let mut allocator = CountingAllocator::default();
        let mut texture = texture_with_pages(256, 256, 1, 1);

        assert_eq!(texture.allocate_page(1, &mut allocator).unwrap(), true);
        assert_eq!(texture.allocate_page(1, &mut allocator).unwrap(), false);
        assert_eq!(allocator.live.len(), 1);
        assert_eq!(texture.resident_count(), 1);
        assert_eq!(texture.resident_bytes(), PAGE_SIZE);

        assert_eq!(texture.release_page(1, &mut allocator).unwrap(), true);
        assert_eq!(texture.release_page(1, &mut allocator).unwrap(), false);
        assert!(allocator.live.is_empty());
        assert!(texture.allocate_page(99, &mut allocator).is_err());
    }

    #[test]
    fn failed_allocation_leaves_page_non_resident() {

        let mut allocator = CountingAllocator { fail_after: Some(2), ..Default::default() };
        let mut texture = texture_with_pages(512, 512, 1, 1);

        assert!(texture.fill_mip_level(&mut allocator, 0).is_err());
        assert_eq!(texture.resident_count(), 2);
        assert_eq!(allocator.live.len(), 2);
    }

    #[test]
    fn fill_mip_level_reports_only_new_pages() {

        let mut allocator = CountingAllocator::default();
        let mut texture = texture_with_pages(512, 512, 1, 3);

        texture.allocate_page(16, &mut allocator).unwrap();
        let level_one: Vec<usize> = texture.pages().iter()
            .filter(|page| page.mip_level == 1)
            .map(|page| page.index)
            .collect();
        assert!(level_one.contains(&16));

        let filled = texture.fill_mip_level(&mut allocator, 1).unwrap();
        assert_eq!(filled.len(), level_one.len() - 1);
        assert!(!filled.contains(&16));
        assert!(texture.fill_mip_level(&mut allocator, 1).unwrap().is_empty());
    }

    #[test]
    fn bind_info_contains_every_page() {

        let mut allocator = CountingAllocator::default();
        let mut texture = texture_with_pages(256, 256, 1, 1);
        texture.allocate_page(2, &mut allocator).unwrap();

        let bind_info = texture.update_sparse_bind_info();
        let binds = bind_info.image_binds();
        assert_eq!(binds.len(), 4);
        assert_ne!(binds[2].memory, vk::DeviceMemory::null());
        assert_eq!(binds.iter().filter(|bind| bind.memory == vk::DeviceMemory::null()).count(), 3);
        assert_eq!(binds[3].offset, vk::Offset3D { x: 128, y: 128, z: 0 });
        assert_eq!(binds[3].subresource.aspect_mask, vk::ImageAspectFlags::COLOR);
        assert!(bind_info.opaque_binds().is_empty());

        // a released page is sent again with null memory.
        texture.release_page(2, &mut allocator).unwrap();
        let bind_info = texture.update_sparse_bind_info();
        assert!(bind_info.image_binds().iter().all(|bind| bind.memory == vk::DeviceMemory::null()));
    }

    #[test]
    fn mip_tail_is_bound_per_layer() {

        let mut allocator = CountingAllocator::default();
        let mut texture = texture_with_pages(1024, 1024, 2, 4);
        let requirements = requirements(4, vk::SparseImageFormatFlags::empty());

        texture.bind_mip_tail(&mut allocator, 2, 11, &requirements).unwrap();
        let opaque = texture.opaque_binds();
        assert_eq!(opaque.len(), 2);
        assert_eq!(opaque[0].resource_offset, 1 << 24);
        assert_eq!(opaque[1].resource_offset, (1 << 24) + (1 << 20));
        assert!(opaque.iter().all(|bind| bind.size == 2 * PAGE_SIZE));
        assert_eq!(allocator.allocated_bytes, 4 * PAGE_SIZE);
        assert_eq!(texture.update_sparse_bind_info().opaque_binds().len(), 2);
    }

    #[test]
    fn single_mip_tail_is_bound_once() {

        let mut allocator = CountingAllocator::default();
        let mut texture = texture_with_pages(1024, 1024, 2, 4);
        let requirements = requirements(4, vk::SparseImageFormatFlags::SINGLE_MIPTAIL);

        texture.bind_mip_tail(&mut allocator, 2, 11, &requirements).unwrap();
        assert_eq!(texture.opaque_binds().len(), 1);
        assert_eq!(texture.opaque_binds()[0].resource_offset, 1 << 24);
    }

    #[test]
    fn no_mip_tail_when_every_level_has_pages() {

        let mut allocator = CountingAllocator::default();
        let mut texture = texture_with_pages(256, 256, 1, 9);

        texture.bind_mip_tail(&mut allocator, 1, 9, &requirements(9, vk::SparseImageFormatFlags::empty())).unwrap();
        assert!(texture.opaque_binds().is_empty());
        assert!(allocator.live.is_empty());
    }

    #[test]
    fn destroy_frees_pages_and_mip_tail() {

        let mut allocator = CountingAllocator::default();
        let mut texture = texture_with_pages(512, 512, 1, 2);

        texture.bind_mip_tail(&mut allocator, 1, 10, &requirements(2, vk::SparseImageFormatFlags::empty())).unwrap();
        texture.fill_mip_level(&mut allocator, 0).unwrap();
        assert_eq!(allocator.live.len(), 17);

        texture.release_all(&mut allocator);
        assert_eq!(texture.resident_count(), 0);
        assert_eq!(allocator.live.len(), 1);

        texture.destroy(&mut allocator);
        assert!(allocator.live.is_empty());
        assert!(texture.opaque_binds().is_empty());
    }

    #[test]
    fn zero_granularity_is_rejected() {

        let mut texture = VirtualTexture::new(vk::Image::null(), 0);
        let mut requirements = requirements(1, vk::SparseImageFormatFlags::empty());
        requirements.format_properties.image_granularity.width = 0;
        assert!(texture.build_pages(extent(128, 128), 1, &requirements, PAGE_SIZE).is_err());
    }
}
