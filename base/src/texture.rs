
pub use self::virtual_texture::{VirtualTexture, VirtualTexturePage, PageAllocator};
pub use self::virtual_texture::{aligned_division, mip_level_count, mip_extent};
pub use self::sparse::{SparseTexture, SparseTextureConfig};

mod virtual_texture;
mod sparse;
