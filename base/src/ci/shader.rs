
use ash::vk;

use crate::context::{VkDevice, VkObjectDiscardable};
use crate::ci::VkObjectBuildableCI;
use crate::error::{VkResult, VkError};
use crate::{vkuint, vkchar};

use std::path::{Path, PathBuf};
use std::{mem, ptr, slice};

/// Every shader here is entered through `main`.
const ENTRY_NAME: &str = "main";
const ENTRY_NAME_NUL: &[u8] = b"main\0";

// ---------------------------------------------------------------------------------------------------
/// A shader module loaded from a SPIR-V file, or compiled from a GLSL file at build time.
#[derive(Debug, Clone)]
pub struct ShaderModuleCI {

    path: PathBuf,
    tag_name: String,
    source: ShaderSource,
    stage: vk::ShaderStageFlags,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum ShaderSource {
    Glsl,
    Spirv,
}

impl VkObjectBuildableCI for ShaderModuleCI {
    type ObjectType = vk::ShaderModule;

    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType> {

        let codes = match self.source {
            | ShaderSource::Glsl  => self.compile_glsl()?,
            | ShaderSource::Spirv => load_spirv(&self.path)?,
        };

        let module_ci = vk::ShaderModuleCreateInfo {
            // in bytes.
            code_size: codes.len() * mem::size_of::<u32>(),
            p_code   : codes.as_ptr(),
            ..Default::default()
        };

        unsafe {
            device.logic.handle.create_shader_module(&module_ci, None)
                .map_err(|e| VkError::vulkan("Shader Module Creation", e))
        }
    }
}

impl ShaderModuleCI {

    pub fn from_glsl(stage: vk::ShaderStageFlags, path: impl AsRef<Path>, tag_name: &str) -> ShaderModuleCI {
        ShaderModuleCI::new(stage, ShaderSource::Glsl, path, tag_name)
    }

    pub fn from_spriv(stage: vk::ShaderStageFlags, path: impl AsRef<Path>, tag_name: &str) -> ShaderModuleCI {
        ShaderModuleCI::new(stage, ShaderSource::Spirv, path, tag_name)
    }

    fn new(stage: vk::ShaderStageFlags, source: ShaderSource, path: impl AsRef<Path>, tag_name: &str) -> ShaderModuleCI {
        ShaderModuleCI { path: path.as_ref().to_path_buf(), tag_name: tag_name.into(), source, stage }
    }

    #[cfg(feature = "runtime-shaders")]
    fn compile_glsl(&self) -> VkResult<Vec<u32>> {

        let kind = match self.stage {
            | vk::ShaderStageFlags::VERTEX   => shaderc::ShaderKind::Vertex,
            | vk::ShaderStageFlags::FRAGMENT => shaderc::ShaderKind::Fragment,
            | vk::ShaderStageFlags::COMPUTE  => shaderc::ShaderKind::Compute,
            | _ => return Err(VkError::unsupported("Shader stage for runtime compiling")),
        };

        let mut compiler = crate::utils::shaderc::VkShaderCompiler::new()?;
        compiler.compile_from_path(&self.path, kind, &self.tag_name, ENTRY_NAME)
    }

    #[cfg(not(feature = "runtime-shaders"))]
    fn compile_glsl(&self) -> VkResult<Vec<u32>> {

        log::error!("{} ({:?} stage) is GLSL source, but runtime shader compiling is disabled.", self.tag_name, self.stage);
        Err(VkError::unsupported("Runtime shader compiling(enable `runtime-shaders` feature)"))
    }
}

impl VkObjectDiscardable for vk::ShaderModule {

    fn discard_by(self, device: &VkDevice) {
        unsafe {
            device.logic.handle.destroy_shader_module(self, None);
        }
    }
}
// ---------------------------------------------------------------------------------------------------

// ---------------------------------------------------------------------------------------------------
/// The constant values used to specialize a shader stage.
#[derive(Debug, Clone, Default)]
pub struct SpecializationCI {

    entries: Vec<vk::SpecializationMapEntry>,
    data: Vec<u8>,
}

impl SpecializationCI {

    pub fn new() -> SpecializationCI {
        SpecializationCI::default()
    }

    /// Append the bytes of `value` as the data of specialization constant `constant_id`.
    pub fn add_entry<T: Copy>(mut self, constant_id: vkuint, value: T) -> SpecializationCI {

        let size = mem::size_of::<T>();
        let bytes = unsafe {
            slice::from_raw_parts(&value as *const T as *const u8, size)
        };

        self.entries.push(vk::SpecializationMapEntry {
            constant_id,
            offset: self.data.len() as _,
            size,
        });
        self.data.extend_from_slice(bytes); self
    }

    fn value(&self) -> vk::SpecializationInfo {

        vk::SpecializationInfo {
            map_entry_count: self.entries.len() as _,
            p_map_entries  : self.entries.as_ptr(),
            data_size      : self.data.len(),
            p_data         : self.data.as_ptr() as _,
        }
    }
}
// ---------------------------------------------------------------------------------------------------

// ---------------------------------------------------------------------------------------------------
/// One pipeline stage running `main` of `module`.
#[derive(Debug)]
pub struct ShaderStageCI {

    stage: vk::ShaderStageFlags,
    module: vk::ShaderModule,
    // boxed, so the pointers in `vk::SpecializationInfo` stay valid when this struct moves.
    specialization: Option<(SpecializationCI, Box<vk::SpecializationInfo>)>,
}

impl ShaderStageCI {

    pub fn new(stage: vk::ShaderStageFlags, module: vk::ShaderModule) -> ShaderStageCI {
        ShaderStageCI { stage, module, specialization: None }
    }

    pub fn specialization(mut self, specialization: SpecializationCI) -> ShaderStageCI {

        let info = Box::new(specialization.value());
        self.specialization = Some((specialization, info)); self
    }

    pub fn value(&self) -> vk::PipelineShaderStageCreateInfo {

        let specialization = self.specialization.as_ref()
            .map_or(ptr::null(), |(_, info)| info.as_ref() as *const vk::SpecializationInfo);

        vk::PipelineShaderStageCreateInfo {
            stage : self.stage,
            module: self.module,
            p_name: ENTRY_NAME_NUL.as_ptr() as *const vkchar,
            p_specialization_info: specialization,
            ..Default::default()
        }
    }
}
// ---------------------------------------------------------------------------------------------------

fn load_spirv(path: &Path) -> VkResult<Vec<u32>> {

    let mut file = std::fs::File::open(path)
        .map_err(|_| VkError::path(path))?;
    ash::util::read_spv(&mut file)
        .map_err(|_| VkError::other(format!("Invalid SPIR-V code in {:?}.", path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn specialization_entries_are_packed() {

        let specialization = SpecializationCI::new()
            .add_entry(0, 32_u32)
            .add_entry(1, 0.5_f32);

        let info = specialization.value();
        assert_eq!(info.map_entry_count, 2);
        assert_eq!(info.data_size, 8);
        assert_eq!(specialization.entries[1].offset, 4);
        assert_eq!(&specialization.data[0..4], &32_u32.to_ne_bytes());
    }

    #[test]
    fn stage_points_to_boxed_specialization() {

        let stage = ShaderStageCI::new(vk::ShaderStageFlags::COMPUTE, vk::ShaderModule::null())
            .specialization(SpecializationCI::new().add_entry(0, 32_u32));

        // moving the stage must not invalidate the specialization pointer.
        let moved = stage;
        let value = moved.value();
        let info = unsafe { *value.p_specialization_info };
        assert_eq!(info.data_size, 4);
        assert_eq!(unsafe { *(info.p_data as *const u32) }, 32);
    }

    #[test]
    fn stage_enters_main() {

        let value = ShaderStageCI::new(vk::ShaderStageFlags::VERTEX, vk::ShaderModule::null()).value();
        let name = unsafe { CStr::from_ptr(value.p_name) };
        assert_eq!(name.to_str(), Ok(ENTRY_NAME));
        assert!(value.p_specialization_info.is_null());
    }

    #[test]
    fn missing_spirv_file_is_path_error() {
        assert!(load_spirv(Path::new("not-exist.comp.spv")).is_err());
    }
}
