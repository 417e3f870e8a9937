
use ash::vk;
use rand::Rng;

use vkbase::context::{VulkanContext, InstanceConfig, ValidationConfig, DebugType, PhysicalDevConfig, LogicDevConfig};
use vkbase::ci::shader::ShaderModuleCI;
use vkbase::texture::VirtualTexturePage;
use vkbase::{vkuint, vkbytes};
use vkbase::{VkResult, VkError};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Log at `info` level unless `RUST_LOG` says otherwise.
pub fn init_logger() {

    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(log::LevelFilter::Info);

    if let Ok(filters) = ::std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    // the logger may already be installed by an earlier call.
    let _ = builder.try_init();
}

/// Validation is enabled in debug builds only.
pub fn default_context(features: vk::PhysicalDeviceFeatures, queues: vk::QueueFlags) -> VkResult<VulkanContext> {

    let enable_validation = cfg!(debug_assertions);

    let mut instance_config = InstanceConfig::default();
    let mut validation = ValidationConfig::default();
    if !enable_validation {
        instance_config.require_layer_names.clear();
        validation.debug_type = DebugType::None;
    }

    let physical_config = PhysicalDevConfig::default()
        .with_features(features);
    let logic_config = LogicDevConfig {
        request_queues: queues,
    };

    VulkanContext::new()
        .with_instance_config(instance_config)
        .with_debugger_config(validation)
        .with_physical_device_config(physical_config)
        .with_logic_device_config(logic_config)
        .build()
}

/// The path of a shader file placed in the source directory of `demo`.
pub fn shader_path(demo: &str, name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src").join(demo).join(name)
}

/// The file `shader_module` reads: `<name>.glsl` with `runtime-shaders` (the default), `<name>.spv` otherwise.
pub fn shader_source_path(demo: &str, name: &str) -> PathBuf {

    if cfg!(feature = "runtime-shaders") {
        shader_path(demo, &format!("{}.glsl", name))
    } else {
        shader_path(demo, &format!("{}.spv", name))
    }
}

pub fn shader_module(stage: vk::ShaderStageFlags, demo: &str, name: &str) -> ShaderModuleCI {

    let path = shader_source_path(demo, name);
    if cfg!(feature = "runtime-shaders") {
        ShaderModuleCI::from_glsl(stage, path, name)
    } else {
        ShaderModuleCI::from_spriv(stage, path, name)
    }
}

const CHECKER_SIZE: vkuint = 16;

/// RGBA8 content for a `width` x `height` region: one random base colour with a darker checker pattern.
pub fn random_pattern(width: vkuint, height: vkuint, rng: &mut impl Rng) -> Vec<u8> {

    let base: [u8; 3] = [rng.gen(), rng.gen(), rng.gen()];
    let mut pattern = Vec::with_capacity((width * height * 4) as usize);

    for y in 0..height {
        for x in 0..width {
            let is_dark = ((x / CHECKER_SIZE) + (y / CHECKER_SIZE)) % 2 == 1;
            let scale = if is_dark { 0.6 } else { 1.0 };

            pattern.extend(base.iter().map(|&channel| (channel as f32 * scale) as u8));
            pattern.push(255);
        }
    }

    pattern
}

/// Pick each non-resident page with `probability`.
pub fn select_fill_pages(pages: &[VirtualTexturePage], probability: f64, rng: &mut impl Rng) -> Vec<usize> {
    pages.iter()
        .filter(|page| !page.is_resident())
        .filter(|_| rng.gen_bool(probability.max(0.0).min(1.0)))
        .map(|page| page.index)
        .collect()
}

/// Pick each resident page with `probability`.
pub fn select_flush_pages(pages: &[VirtualTexturePage], probability: f64, rng: &mut impl Rng) -> Vec<usize> {
    pages.iter()
        .filter(|page| page.is_resident())
        .filter(|_| rng.gen_bool(probability.max(0.0).min(1.0)))
        .map(|page| page.index)
        .collect()
}

/// Write 4-byte texels as a binary PPM (P6) file, dropping the alpha channel.
///
/// `row_pitch` is the distance between rows in bytes. Set `swizzle_bgr` for BGRA data.
pub fn write_ppm(path: impl AsRef<Path>, width: vkuint, height: vkuint, row_pitch: vkbytes, data: &[u8], swizzle_bgr: bool) -> VkResult<()> {

    let row_pitch = row_pitch as usize;
    let row_bytes = (width as usize) * 4;
    let required = match height as usize {
        | 0 => 0,
        | rows => row_pitch * (rows - 1) + row_bytes,
    };
    if row_pitch < row_bytes || data.len() < required {
        return Err(VkError::other(format!("Image data is too small for {}x{} with row pitch {}.", width, height, row_pitch)))
    }

    let file = File::create(path.as_ref())
        .map_err(|_| VkError::path(path.as_ref()))?;
    let mut writer = BufWriter::new(file);

    let io_error = |e: ::std::io::Error| VkError::other(format!("Failed to write ppm: {}", e));

    write!(writer, "P6\n{}\n{}\n255\n", width, height).map_err(io_error)?;

    for row in 0..(height as usize) {
        let texels = &data[row * row_pitch..(row * row_pitch + row_bytes)];
        for texel in texels.chunks_exact(4) {
            let rgb = if swizzle_bgr {
                [texel[2], texel[1], texel[0]]
            } else {
                [texel[0], texel[1], texel[2]]
            };
            writer.write_all(&rgb).map_err(io_error)?;
        }
    }

    writer.flush().map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use vkbase::texture::VirtualTexture;

    fn texture(page_count: usize) -> VirtualTexture {

        let mut texture = VirtualTexture::new(vk::Image::null(), 0);
        for i in 0..page_count {
            let offset = vk::Offset3D { x: (i * 128) as i32, y: 0, z: 0 };
            texture.add_page(offset, vk::Extent3D { width: 128, height: 128, depth: 1 }, 65536, 0, 0);
        }
        texture
    }

    #[test]
    fn shader_sources_of_every_demo_exist() {

        let shaders = [
            ("computeheadless", "headless.comp"),
            ("renderheadless", "triangle.vert"),
            ("renderheadless", "triangle.frag"),
        ];

        for &(demo, name) in shaders.iter() {
            let path = shader_source_path(demo, name);
            assert!(path.exists(), "missing shader source {:?}", path);
        }
    }

    #[test]
    fn pattern_has_checker_modulation() {

        let mut rng = StdRng::seed_from_u64(7);
        let pattern = random_pattern(32, 32, &mut rng);
        assert_eq!(pattern.len(), 32 * 32 * 4);

        let texel = |x: usize, y: usize| &pattern[(y * 32 + x) * 4..(y * 32 + x) * 4 + 4];
        assert_eq!(texel(0, 0)[3], 255);
        assert_eq!(texel(0, 0), texel(17, 17));
        assert_eq!(texel(16, 0), texel(0, 16));
        assert!(texel(16, 0)[0] <= texel(0, 0)[0]);
    }

    #[test]
    fn selection_respects_probability_bounds() {

        let mut rng = StdRng::seed_from_u64(1);
        let texture = texture(20);

        assert_eq!(select_fill_pages(texture.pages(), 1.0, &mut rng).len(), 20);
        assert!(select_fill_pages(texture.pages(), 0.0, &mut rng).is_empty());
        // no page is resident yet.
        assert!(select_flush_pages(texture.pages(), 1.0, &mut rng).is_empty());
    }

    #[test]
    fn ppm_drops_padding_and_swizzles() {

        let path = ::std::env::temp_dir().join("vkexamples-ppm-test.ppm");
        // 2x2 BGRA texels with 4 bytes of padding per row.
        let data: Vec<u8> = vec![
            1, 2, 3, 255,  4, 5, 6, 255,  0, 0, 0, 0,
            7, 8, 9, 255, 10, 11, 12, 255, 0, 0, 0, 0,
        ];

        write_ppm(&path, 2, 2, 12, &data, true).unwrap();
        let written = ::std::fs::read(&path).unwrap();
        let _ = ::std::fs::remove_file(&path);

        let header = b"P6\n2\n2\n255\n";
        assert_eq!(&written[..header.len()], &header[..]);
        assert_eq!(&written[header.len()..], &[3, 2, 1, 6, 5, 4, 9, 8, 7, 12, 11, 10][..]);

        assert!(write_ppm(&path, 4, 2, 12, &data, false).is_err());
    }
}
