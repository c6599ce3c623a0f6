//! GPU-compatible data types

use crate::color::bv_lut;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use orrery_core::{CoordinateSystem, PreparedFrame, ProjectionMode, Viewport};

/// Smallest star sprite in pixels
pub const BASE_STAR_SIZE: f32 = 1.5;

/// Per-frame sky uniform shared by the star, planet and line pipelines.
/// Field order and padding match `Sky` in `shaders/sky.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SkyUniform {
    /// J2000 unit vector to display-frame (north, east, up)
    pub rotation: [[f32; 4]; 4],
    /// Projection plane (x, y, 0, 1) to clip space
    pub plane_to_ndc: [[f32; 4]; 4],
    /// Viewport in pixels
    pub viewport: [f32; 2],
    pub pixel_ratio: f32,
    /// Seconds since the renderer started
    pub time: f32,
    /// [`orrery_core::ProjectionMode::shader_index`]
    pub projection_mode: u32,
    /// 1 when refraction is applied
    pub refraction: u32,
    /// 1 when the horizon dims stars (horizontal frame only)
    pub extinction: u32,
    pub base_size: f32,
    /// B-V bands as (r, g, b, upper bound)
    pub color_lut: [[f32; 4]; 7],
}

impl SkyUniform {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn new(frame: &PreparedFrame, viewport: Viewport, pixel_ratio: f32, time: f32) -> Self {
        let projection = frame.projection();
        Self {
            rotation: Mat4::from_mat3(frame.rotation().as_mat3()).to_cols_array_2d(),
            plane_to_ndc: projection.plane_to_ndc(&viewport).to_cols_array_2d(),
            viewport: [viewport.width as f32, viewport.height as f32],
            pixel_ratio,
            time,
            projection_mode: projection.shader_index(),
            refraction: frame.refraction() as u32,
            extinction: (frame.system() == CoordinateSystem::Horizontal) as u32,
            base_size: BASE_STAR_SIZE,
            color_lut: bv_lut(),
        }
    }

    /// Same frame at a new drawing-surface size
    pub fn resized(mut self, projection: ProjectionMode, viewport: Viewport, pixel_ratio: f32) -> Self {
        self.plane_to_ndc = projection.plane_to_ndc(&viewport).to_cols_array_2d();
        self.viewport = [viewport.width as f32, viewport.height as f32];
        self.pixel_ratio = pixel_ratio;
        self
    }
}

impl Default for SkyUniform {
    fn default() -> Self {
        Self {
            rotation: Mat4::IDENTITY.to_cols_array_2d(),
            plane_to_ndc: Mat4::IDENTITY.to_cols_array_2d(),
            viewport: [1.0, 1.0],
            pixel_ratio: 1.0,
            time: 0.0,
            projection_mode: 0,
            refraction: 0,
            extinction: 0,
            base_size: BASE_STAR_SIZE,
            color_lut: bv_lut(),
        }
    }
}

/// Planet or Moon sprite
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PlanetInstance {
    /// J2000 unit vector
    pub position: [f32; 3],
    /// Sprite diameter in pixels
    pub size: f32,
    pub color: [f32; 4],
}

impl PlanetInstance {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32, 2 => Float32x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::SIZE as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Endpoint of an asterism line segment
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    /// J2000 unit vector
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl LineVertex {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4];

    pub fn new(position: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, color }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::SIZE as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Layouts of the four parallel per-star buffers, one attribute each
pub fn star_buffer_layouts() -> [wgpu::VertexBufferLayout<'static>; 4] {
    const POSITION: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
    const MAGNITUDE: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32];
    const COLOR_INDEX: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32];
    const PHASE: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![3 => Float32];

    let layout = |stride: usize, attributes: &'static [wgpu::VertexAttribute]| wgpu::VertexBufferLayout {
        array_stride: stride as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes,
    };
    [
        layout(12, &POSITION),
        layout(4, &MAGNITUDE),
        layout(4, &COLOR_INDEX),
        layout(4, &PHASE),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use hifitime::Epoch;
    use orrery_core::{ObserverContext, TransformPipeline};

    #[test]
    fn test_uniform_layout_is_16_byte_aligned() {
        assert_eq!(SkyUniform::SIZE % 16, 0);
        assert_eq!(SkyUniform::SIZE, 272);
        assert_eq!(PlanetInstance::SIZE, 32);
        assert_eq!(LineVertex::SIZE, 28);
    }

    #[test]
    fn test_uniform_flags_follow_frame() {
        let view = Viewport::new(800.0, 600.0);
        let observer = ObserverContext::fallback(Epoch::from_gregorian_utc(2024, 6, 21, 0, 0, 0, 0));
        let pipeline = TransformPipeline::new(ProjectionMode::Mercator, view);

        let horizontal = SkyUniform::new(&pipeline.prepare(&observer, CoordinateSystem::Horizontal), view, 2.0, 0.0);
        assert_eq!(horizontal.projection_mode, 2);
        assert_eq!((horizontal.refraction, horizontal.extinction), (1, 1));

        let equatorial = SkyUniform::new(&pipeline.prepare(&observer, CoordinateSystem::Equatorial), view, 2.0, 0.0);
        assert_eq!((equatorial.refraction, equatorial.extinction), (0, 0));
    }
}
