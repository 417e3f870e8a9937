
pub mod cast;
pub mod memory;
pub mod time;

#[cfg(feature = "runtime-shaders")]
pub mod shaderc;
