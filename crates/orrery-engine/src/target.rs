//! Where the orchestrator sends geometry and draw calls

use orrery_core::{FrameStats, PreparedFrame};
use orrery_data::StarRecord;
use orrery_render::{GpuContext, LineVertex, PlanetInstance, RenderResult, StarRenderer};

/// Sink for uploads and draws. The GPU renderer implements it through
/// [`RendererTarget`]; tests substitute a recorder.
pub trait SkyTarget {
    fn upload_stars(&mut self, stars: &[StarRecord]) -> RenderResult<()>;

    fn upload_planets(&mut self, planets: &[PlanetInstance]) -> RenderResult<()>;

    fn upload_lines(&mut self, lines: &[LineVertex]) -> RenderResult<()>;

    fn draw(&mut self, time: f32, frame: &PreparedFrame) -> RenderResult<FrameStats>;
}

/// A renderer paired with this frame's color target
pub struct RendererTarget<'a> {
    pub renderer: &'a mut StarRenderer,
    pub view: &'a wgpu::TextureView,
}

impl SkyTarget for RendererTarget<'_> {
    fn upload_stars(&mut self, stars: &[StarRecord]) -> RenderResult<()> {
        self.renderer.load(stars)
    }

    fn upload_planets(&mut self, planets: &[PlanetInstance]) -> RenderResult<()> {
        self.renderer.set_planets(planets)
    }

    fn upload_lines(&mut self, lines: &[LineVertex]) -> RenderResult<()> {
        self.renderer.set_lines(lines)
    }

    fn draw(&mut self, time: f32, frame: &PreparedFrame) -> RenderResult<FrameStats> {
        self.renderer.render(self.view, time, frame)
    }
}

/// Headless renderer drawing into its own texture
pub struct OffscreenSky {
    pub gpu: GpuContext,
    pub renderer: StarRenderer,
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl OffscreenSky {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    pub async fn new(width: u32, height: u32) -> RenderResult<Self> {
        let gpu = GpuContext::headless().await?;
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Sky"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&Default::default());
        let renderer =
            StarRenderer::new(gpu.device.clone(), gpu.queue.clone(), Self::FORMAT, width, height, 1.0)
                .await?;
        Ok(Self { gpu, renderer, _texture: texture, view })
    }

    pub fn target(&mut self) -> RendererTarget<'_> {
        RendererTarget { renderer: &mut self.renderer, view: &self.view }
    }
}
