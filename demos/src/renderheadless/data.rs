
use ash::vk;

use vkbase::vkuint;

use std::mem;

type Mat4F = vek::Mat4<f32>;
type Vec3F = vek::Vec3<f32>;

/// Vertex layout used in this example.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct Vertex {
    position: [f32; 3],
    color   : [f32; 3],
}

pub struct InputDescriptionStaff {
    pub binding   : vk::VertexInputBindingDescription,
    pub attributes: [vk::VertexInputAttributeDescription; 2],
}

impl Vertex {

    pub fn input_description() -> InputDescriptionStaff {

        let input_binding = vk::VertexInputBindingDescription {
            binding: 0,
            stride : mem::size_of::<Vertex>() as _,
            input_rate: vk::VertexInputRate::VERTEX,
        };

        // in triangle.vert.glsl:
        //
        // layout (location = 0) in vec3 inPos;
        // layout (location = 1) in vec3 inColor;
        let vertex_input_attributes = [
            vk::VertexInputAttributeDescription {
                location: 0,
                binding : 0,
                format  : vk::Format::R32G32B32_SFLOAT,
                offset  : memoffset::offset_of!(Vertex, position) as _,
            },
            vk::VertexInputAttributeDescription {
                location: 1,
                binding : 0,
                format  : vk::Format::R32G32B32_SFLOAT,
                offset  : memoffset::offset_of!(Vertex, color) as _,
            },
        ];

        InputDescriptionStaff {
            binding   : input_binding,
            attributes: vertex_input_attributes,
        }
    }
}

pub const VERTICES: [Vertex; 3] = [
    Vertex { position: [ 1.0,  1.0, 0.0], color: [1.0, 0.0, 0.0] },
    Vertex { position: [-1.0,  1.0, 0.0], color: [0.0, 1.0, 0.0] },
    Vertex { position: [ 0.0, -1.0, 0.0], color: [0.0, 0.0, 1.0] },
];

pub const INDICES: [vkuint; 3] = [0, 1, 2];

/// Each position gets its own copy of the triangle.
pub const TRIANGLE_POSITIONS: [[f32; 3]; 3] = [
    [-1.5, 0.0, -4.0],
    [ 0.0, 0.0, -2.5],
    [ 1.5, 0.0, -4.0],
];

/// The data of the push constant block in triangle.vert.glsl.
///
/// layout (push_constant) uniform PushConsts {
///     mat4 mvp;
/// } pushConsts;
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct PushConstants {
    pub mvp: [f32; 16],
}

impl PushConstants {

    /// Projection with a 60 degree vertical field of view, and a translation to `position`.
    pub fn new(position: [f32; 3], screen_aspect: f32) -> PushConstants {

        let projection = Mat4F::perspective_rh_zo(60.0_f32.to_radians(), screen_aspect, 0.1, 256.0);
        let model = Mat4F::translation_3d(Vec3F::from(position));

        PushConstants {
            mvp: (projection * model).into_col_array(),
        }
    }

    pub fn range() -> vk::PushConstantRange {
        vk::PushConstantRange {
            stage_flags: vk::ShaderStageFlags::VERTEX,
            offset: 0,
            size: mem::size_of::<PushConstants>() as _,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn vertex_layout_is_tightly_packed() {

        let description = Vertex::input_description();
        assert_eq!(description.binding.stride, 24);
        assert_eq!(description.attributes[0].offset, 0);
        assert_eq!(description.attributes[1].offset, 12);
    }

    #[test]
    fn push_constants_fit_one_matrix() {
        assert_eq!(PushConstants::range().size, 64);
    }

    #[test]
    fn mvp_moves_origin_in_front_of_camera() {

        let constants = PushConstants::new(TRIANGLE_POSITIONS[1], 1.0);
        let mvp = Mat4F::from_col_array(constants.mvp);
        let clip = mvp * vek::Vec4::new(0.0_f32, 0.0, 0.0, 1.0);

        assert_relative_eq!(clip.x, 0.0);
        assert_relative_eq!(clip.y, 0.0);
        // distance to the camera ends up in w.
        assert_relative_eq!(clip.w, 2.5);

        let depth = clip.z / clip.w;
        assert!(depth > 0.0 && depth < 1.0);
    }
}
