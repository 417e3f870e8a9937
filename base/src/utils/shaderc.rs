
use crate::error::{VkResult, VkError};

use std::path::Path;

/// Runtime GLSL to SPIR-V compiler. Targets Vulkan, optimizes for performance and keeps debug info.
pub struct VkShaderCompiler {
    compiler: shaderc::Compiler,
}

impl VkShaderCompiler {

    pub fn new() -> VkResult<VkShaderCompiler> {

        let compiler = shaderc::Compiler::new()
            .ok_or(VkError::shaderc("Failed to initialize shader compiler"))?;
        Ok(VkShaderCompiler { compiler })
    }

    fn compile_options() -> VkResult<shaderc::CompileOptions<'static>> {

        let mut options = shaderc::CompileOptions::new()
            .ok_or(VkError::shaderc("Failed to create shader compile options"))?;
        options.set_optimization_level(shaderc::OptimizationLevel::Performance);
        options.set_generate_debug_info();

        Ok(options)
    }

    pub fn compile_from_str(&mut self, source_text: &str, stage: shaderc::ShaderKind, input_name: &str, entry_name: &str) -> VkResult<Vec<u32>> {

        let options = VkShaderCompiler::compile_options()?;
        let artifact = self.compiler.compile_into_spirv(source_text, stage, input_name, entry_name, Some(&options))
            .map_err(|e| VkError::shaderc(format!("Failed to compile {}({})", input_name, e)))?;

        if artifact.get_num_warnings() > 0 {
            log::warn!("{}: {}", input_name, artifact.get_warning_messages());
        }

        Ok(artifact.as_binary().to_vec())
    }

    pub fn compile_from_path(&mut self, path: impl AsRef<Path>, stage: shaderc::ShaderKind, input_name: &str, entry_name: &str) -> VkResult<Vec<u32>> {

        let source_text = std::fs::read_to_string(path.as_ref())
            .map_err(|_| VkError::path(path.as_ref()))?;
        self.compile_from_str(&source_text, stage, input_name, entry_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_glsl_file_is_rejected() {

        if let Ok(mut compiler) = VkShaderCompiler::new() {
            let result = compiler.compile_from_path("not-exist.comp", shaderc::ShaderKind::Compute, "not-exist", "main");
            assert!(result.is_err());
        }
    }
}
