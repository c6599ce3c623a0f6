//! Instanced star-field renderer
//!
//! Star attributes live in four parallel vertex buffers uploaded once per catalog
//! load. Every frame only the sky uniform is rewritten; the vertex shader rotates,
//! refracts and projects each star and expands it into a sprite quad.

use crate::culling::CullingStrategy;
use crate::error::{RenderError, RenderResult};
use crate::gpu_types::{star_buffer_layouts, LineVertex, PlanetInstance, SkyUniform};

use orrery_core::{FrameStats, PreparedFrame, ProjectionMode, Viewport};
use orrery_data::StarRecord;

use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;

/// Planet and Moon sprites drawn per frame
pub const MAX_PLANETS: usize = 16;
/// Asterism line vertices (two per segment)
pub const MAX_LINE_VERTICES: usize = 4096;

const CLEAR_COLOR: wgpu::Color = wgpu::Color { r: 0.0, g: 0.0, b: 0.02, a: 1.0 };

/// Stars add light; overlapping glows brighten instead of occluding
const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

/// Per-star GPU attributes
struct StarBuffers {
    positions: wgpu::Buffer,
    magnitudes: wgpu::Buffer,
    color_indices: wgpu::Buffer,
    twinkle_phases: wgpu::Buffer,
    count: u32,
}

impl StarBuffers {
    fn destroy(&self) {
        self.positions.destroy();
        self.magnitudes.destroy();
        self.color_indices.destroy();
        self.twinkle_phases.destroy();
    }
}

pub struct StarRenderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,

    // Pipelines
    star_pipeline: wgpu::RenderPipeline,
    planet_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,

    // Uniforms
    uniform: SkyUniform,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,

    // Buffers
    stars: Option<StarBuffers>,
    /// CPU copy of the uploaded unit vectors for culling statistics
    star_positions: Vec<[f32; 3]>,
    planet_buffer: wgpu::Buffer,
    planet_count: u32,
    line_buffer: wgpu::Buffer,
    line_vertex_count: u32,

    // State
    viewport: Viewport,
    pixel_ratio: f32,
    projection: ProjectionMode,
    culling: CullingStrategy,
    disposed: bool,
}

impl StarRenderer {
    /// Build pipelines for `format` targets of `width` x `height` physical pixels.
    /// Shader or pipeline validation failures come back as [`RenderError::Shader`].
    pub async fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        pixel_ratio: f32,
    ) -> RenderResult<Self> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sky Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/sky.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sky Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sky Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let star_layouts = star_buffer_layouts();
        let star_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            format,
            PipelineParts {
                label: "Star Pipeline",
                vs: "vs_star",
                fs: "fs_star",
                buffers: &star_layouts,
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: ADDITIVE,
            },
        );
        let planet_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            format,
            PipelineParts {
                label: "Planet Pipeline",
                vs: "vs_point",
                fs: "fs_point",
                buffers: &[PlanetInstance::layout()],
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: wgpu::BlendState::ALPHA_BLENDING,
            },
        );
        let line_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            format,
            PipelineParts {
                label: "Asterism Pipeline",
                vs: "vs_line",
                fs: "fs_line",
                buffers: &[LineVertex::layout()],
                topology: wgpu::PrimitiveTopology::LineList,
                blend: wgpu::BlendState::ALPHA_BLENDING,
            },
        );

        if let Some(error) = device.pop_error_scope().await {
            return Err(RenderError::Shader(error.to_string()));
        }

        let viewport = Viewport::new(width as f64, height as f64);
        let uniform = SkyUniform::default().resized(ProjectionMode::default(), viewport, pixel_ratio);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sky Uniform"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sky Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let planet_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Planet Instances"),
            size: (MAX_PLANETS * PlanetInstance::SIZE) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let line_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Asterism Lines"),
            size: (MAX_LINE_VERTICES * LineVertex::SIZE) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        info!("Star renderer ready: {}x{} @{}x, {:?}", width, height, pixel_ratio, format);

        Ok(Self {
            device,
            queue,
            star_pipeline,
            planet_pipeline,
            line_pipeline,
            uniform,
            uniform_buffer,
            bind_group,
            stars: None,
            star_positions: Vec::new(),
            planet_buffer,
            planet_count: 0,
            line_buffer,
            line_vertex_count: 0,
            viewport,
            pixel_ratio,
            projection: ProjectionMode::default(),
            culling: CullingStrategy::default(),
            disposed: false,
        })
    }

    pub fn with_culling(mut self, culling: CullingStrategy) -> Self {
        self.culling = culling;
        self
    }

    pub fn set_culling(&mut self, culling: CullingStrategy) {
        self.culling = culling;
    }

    pub fn star_count(&self) -> u32 {
        self.stars.as_ref().map_or(0, |s| s.count)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Upload star attributes, replacing any previous upload wholesale
    pub fn load(&mut self, stars: &[StarRecord]) -> RenderResult<()> {
        self.ensure_live()?;

        if let Some(old) = self.stars.take() {
            old.destroy();
        }
        self.star_positions = stars.iter().map(StarRecord::unit_vector).collect();

        if stars.is_empty() {
            debug!("Cleared star buffers");
            return Ok(());
        }

        let magnitudes: Vec<f32> = stars.iter().map(|s| s.magnitude as f32).collect();
        let color_indices: Vec<f32> = stars.iter().map(|s| s.color_index as f32).collect();
        let twinkle_phases: Vec<f32> = stars.iter().map(|s| twinkle_phase(&s.id)).collect();

        let vertex_buffer = |label: &str, contents: &[u8]| {
            self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::VERTEX,
            })
        };

        self.stars = Some(StarBuffers {
            positions: vertex_buffer("Star Positions", bytemuck::cast_slice(&self.star_positions)),
            magnitudes: vertex_buffer("Star Magnitudes", bytemuck::cast_slice(&magnitudes)),
            color_indices: vertex_buffer("Star Color Indices", bytemuck::cast_slice(&color_indices)),
            twinkle_phases: vertex_buffer("Star Twinkle Phases", bytemuck::cast_slice(&twinkle_phases)),
            count: stars.len() as u32,
        });

        info!("Uploaded {} stars ({:.1} KB)", stars.len(), (stars.len() * 24) as f64 / 1024.0);
        Ok(())
    }

    /// Replace the planet sprites in place; extras beyond [`MAX_PLANETS`] are dropped
    pub fn set_planets(&mut self, planets: &[PlanetInstance]) -> RenderResult<()> {
        self.ensure_live()?;
        if planets.len() > MAX_PLANETS {
            warn!("{} planet sprites exceed capacity {}; truncating", planets.len(), MAX_PLANETS);
        }
        let planets = &planets[..planets.len().min(MAX_PLANETS)];
        if !planets.is_empty() {
            self.queue.write_buffer(&self.planet_buffer, 0, bytemuck::cast_slice(planets));
        }
        self.planet_count = planets.len() as u32;
        Ok(())
    }

    /// Replace the asterism line list in place; vertices pair up into segments
    pub fn set_lines(&mut self, vertices: &[LineVertex]) -> RenderResult<()> {
        self.ensure_live()?;
        let capacity = MAX_LINE_VERTICES.min(vertices.len()) & !1;
        if capacity < vertices.len() {
            warn!("{} line vertices exceed capacity {}; truncating", vertices.len(), MAX_LINE_VERTICES);
        }
        let vertices = &vertices[..capacity];
        if !vertices.is_empty() {
            self.queue.write_buffer(&self.line_buffer, 0, bytemuck::cast_slice(vertices));
        }
        self.line_vertex_count = vertices.len() as u32;
        Ok(())
    }

    /// Draw one frame into `target`. The frame supplies the view rotation and the
    /// projection; `time` (seconds) drives the twinkle.
    pub fn render(
        &mut self,
        target: &wgpu::TextureView,
        time: f32,
        frame: &PreparedFrame,
    ) -> RenderResult<FrameStats> {
        self.ensure_live()?;
        let started = Instant::now();

        let frame = frame.with_viewport(self.viewport);
        self.projection = frame.projection();
        self.uniform = SkyUniform::new(&frame, self.viewport, self.pixel_ratio, time);
        self.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniform));

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Sky Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sky Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_bind_group(0, &self.bind_group, &[]);

            if self.line_vertex_count > 0 {
                render_pass.set_pipeline(&self.line_pipeline);
                render_pass.set_vertex_buffer(0, self.line_buffer.slice(..));
                render_pass.draw(0..self.line_vertex_count, 0..1);
            }

            if let Some(stars) = &self.stars {
                render_pass.set_pipeline(&self.star_pipeline);
                render_pass.set_vertex_buffer(0, stars.positions.slice(..));
                render_pass.set_vertex_buffer(1, stars.magnitudes.slice(..));
                render_pass.set_vertex_buffer(2, stars.color_indices.slice(..));
                render_pass.set_vertex_buffer(3, stars.twinkle_phases.slice(..));
                render_pass.draw(0..6, 0..stars.count);
            }

            if self.planet_count > 0 {
                render_pass.set_pipeline(&self.planet_pipeline);
                render_pass.set_vertex_buffer(0, self.planet_buffer.slice(..));
                render_pass.draw(0..6, 0..self.planet_count);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));

        let render_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        let stats = self.culling.frame_stats(&self.star_positions, &frame, render_time_ms);
        debug!(
            "Frame: {} stars ({} visible) in {:.2} ms",
            stats.total_stars, stats.visible_stars, stats.render_time_ms
        );
        Ok(stats)
    }

    /// New drawing-surface size; only the uniforms change
    pub fn resize(&mut self, width: u32, height: u32, pixel_ratio: f32) {
        if self.disposed || width == 0 || height == 0 {
            return;
        }
        self.viewport = Viewport::new(width as f64, height as f64);
        self.pixel_ratio = pixel_ratio;
        self.uniform = self.uniform.resized(self.projection, self.viewport, pixel_ratio);
        self.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniform));
    }

    /// Release every GPU buffer. Later calls are no-ops; drawing afterwards fails.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if let Some(stars) = self.stars.take() {
            stars.destroy();
        }
        self.planet_buffer.destroy();
        self.line_buffer.destroy();
        self.uniform_buffer.destroy();
        self.star_positions = Vec::new();
        self.planet_count = 0;
        self.line_vertex_count = 0;
        self.disposed = true;
        debug!("Star renderer disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn ensure_live(&self) -> RenderResult<()> {
        if self.disposed {
            Err(RenderError::Disposed)
        } else {
            Ok(())
        }
    }
}

impl Drop for StarRenderer {
    fn drop(&mut self) {
        self.dispose();
    }
}

struct PipelineParts<'a> {
    label: &'a str,
    vs: &'a str,
    fs: &'a str,
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    topology: wgpu::PrimitiveTopology,
    blend: wgpu::BlendState,
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    parts: PipelineParts<'_>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(parts.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(parts.vs),
            buffers: parts.buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(parts.fs),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(parts.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: parts.topology,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Stable per-star twinkle phase in [0, 2π) derived from the catalog id
pub fn twinkle_phase(id: &str) -> f32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in id.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    (hash >> 8) as f32 / (1u32 << 24) as f32 * TAU
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::GpuContext;
    use hifitime::Epoch;
    use orrery_core::{CoordinateSystem, EquatorialCoordinate, ObserverContext, TransformPipeline};
    use orrery_data::ProperMotion;

    const SIZE: u32 = 64;
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    fn gpu() -> Option<GpuContext> {
        match pollster::block_on(GpuContext::headless()) {
            Ok(gpu) => Some(gpu),
            Err(e) => {
                eprintln!("skipping GPU test: {e}");
                None
            }
        }
    }

    fn target(gpu: &GpuContext) -> wgpu::TextureView {
        gpu.device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("Test Target"),
                size: wgpu::Extent3d { width: SIZE, height: SIZE, depth_or_array_layers: 1 },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            })
            .create_view(&Default::default())
    }

    fn frame() -> PreparedFrame {
        let observer = ObserverContext::fallback(Epoch::from_gregorian_utc(2024, 6, 21, 0, 0, 0, 0));
        TransformPipeline::new(ProjectionMode::Stereographic, Viewport::new(SIZE as f64, SIZE as f64))
            .prepare(&observer, CoordinateSystem::Horizontal)
    }

    fn star(id: &str, ra: f64, dec: f64, magnitude: f64) -> StarRecord {
        StarRecord {
            id: id.into(),
            name: None,
            position: EquatorialCoordinate::j2000(ra, dec),
            magnitude,
            color_index: 0.0,
            spectral_class: "A0V".into(),
            proper_motion: ProperMotion::default(),
            parallax: None,
            distance_pc: None,
            constellation: "Lyr".into(),
        }
    }

    #[test]
    fn test_twinkle_phase_range_and_stability() {
        for id in ["HIP91262", "SYN0", "", "M31"] {
            let phase = twinkle_phase(id);
            assert!((0.0..TAU).contains(&phase), "{id}: {phase}");
            assert_eq!(phase, twinkle_phase(id));
        }
        assert_ne!(twinkle_phase("SYN1"), twinkle_phase("SYN2"));
    }

    #[test]
    #[ignore = "needs a GPU adapter; the stats path is covered in culling.rs"]
    fn test_zero_stars_render() {
        let Some(gpu) = gpu() else { return };
        let mut renderer = pollster::block_on(StarRenderer::new(
            gpu.device.clone(),
            gpu.queue.clone(),
            FORMAT,
            SIZE,
            SIZE,
            1.0,
        ))
        .unwrap();

        renderer.load(&[]).unwrap();
        let stats = renderer.render(&target(&gpu), 0.0, &frame()).unwrap();
        assert_eq!(stats.total_stars, 0);
        assert_eq!(stats.visible_stars, 0);
        assert_eq!(stats.culled_stars, 0);
        assert!(stats.render_time_ms >= 0.0);
    }

    #[test]
    fn test_reload_replaces_and_dispose_is_final() {
        let Some(gpu) = gpu() else { return };
        let mut renderer = pollster::block_on(StarRenderer::new(
            gpu.device.clone(),
            gpu.queue.clone(),
            FORMAT,
            SIZE,
            SIZE,
            2.0,
        ))
        .unwrap()
        .with_culling(CullingStrategy::CpuFrustum);

        let view = target(&gpu);
        renderer.load(&[star("A", 0.0, 89.0, 2.0), star("B", 0.0, -89.0, 3.0)]).unwrap();
        let stats = renderer.render(&view, 1.0, &frame()).unwrap();
        assert_eq!(stats.total_stars, 2);
        assert_eq!(stats.visible_stars + stats.culled_stars, 2);
        assert_eq!(stats.culled_stars, 1, "south circumpolar star is below New York's horizon");

        renderer.load(&[star("C", 279.23, 38.78, 0.03)]).unwrap();
        assert_eq!(renderer.star_count(), 1);

        renderer.resize(128, 96, 1.0);
        assert_eq!(renderer.viewport(), Viewport::new(128.0, 96.0));

        renderer.dispose();
        renderer.dispose();
        assert!(renderer.is_disposed());
        assert!(matches!(renderer.render(&view, 2.0, &frame()), Err(RenderError::Disposed)));
    }
}
