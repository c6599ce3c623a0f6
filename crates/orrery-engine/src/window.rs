//! Interactive sky window

use crate::orchestrator::Orchestrator;
use crate::target::RendererTarget;

use anyhow::Context;
use hifitime::Epoch;
use orrery_core::{CoordinateSystem, ProjectionMode, SessionConfig, Viewport};
use orrery_render::{GpuContext, StarRenderer};
use orrery_sim::rates;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

const TITLE: &str = "Orrery";

struct WindowGpu {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    gpu: GpuContext,
    renderer: StarRenderer,
}

impl WindowGpu {
    async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance.create_surface(Arc::clone(&window))?;
        let gpu = GpuContext::request(&instance, Some(&surface)).await?;

        let caps = surface.get_capabilities(&gpu.adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .context("Surface reports no texture formats")?;
        let alpha_mode = caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        info!("Configuring surface: {}x{} {:?}", config.width, config.height, format);
        surface.configure(&gpu.device, &config);

        let renderer = StarRenderer::new(
            gpu.device.clone(),
            gpu.queue.clone(),
            format,
            config.width,
            config.height,
            window.scale_factor() as f32,
        )
        .await?;

        Ok(Self { surface, config, gpu, renderer })
    }

    fn resize(&mut self, size: PhysicalSize<u32>, scale_factor: f32) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.gpu.device, &self.config);
        self.renderer.resize(size.width, size.height, scale_factor);
    }
}

pub struct SkyApp {
    session: SessionConfig,
    start: Epoch,
    window: Option<Arc<Window>>,
    gpu: Option<WindowGpu>,
    orchestrator: Option<Orchestrator>,
    cursor: (f64, f64),
    last_title: Instant,
    failure: Option<anyhow::Error>,
}

impl SkyApp {
    pub fn new(session: SessionConfig, start: Epoch) -> Self {
        Self {
            session,
            start,
            window: None,
            gpu: None,
            orchestrator: None,
            cursor: (0.0, 0.0),
            last_title: Instant::now(),
            failure: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let attrs = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(PhysicalSize::new(1600, 1000));
        let window = Arc::new(event_loop.create_window(attrs)?);
        let gpu = pollster::block_on(WindowGpu::new(Arc::clone(&window)))?;

        let size = window.inner_size();
        let viewport = Viewport::new(size.width as f64, size.height as f64);
        let orchestrator = Orchestrator::new(&self.session, viewport, self.start)?;

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.orchestrator = Some(orchestrator);
        Ok(())
    }

    fn redraw(&mut self) -> anyhow::Result<()> {
        let (Some(gpu), Some(orchestrator)) = (&mut self.gpu, &mut self.orchestrator) else {
            return Ok(());
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.gpu.device, &gpu.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("Surface timeout; skipping frame");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let stats = orchestrator.frame(
            Instant::now(),
            &mut RendererTarget { renderer: &mut gpu.renderer, view: &view },
        )?;
        output.present();

        if self.last_title.elapsed() >= Duration::from_secs(1) {
            self.last_title = Instant::now();
            if let Some(window) = &self.window {
                let clock = orchestrator.clock();
                let disclaimer = if stats.data_quality.is_degraded() { " | approximate data" } else { "" };
                window.set_title(&format!(
                    "{TITLE} | {} | {}/{} stars | {:.0} fps | x{:.0}{}{}",
                    clock.current(),
                    stats.visible_stars,
                    stats.total_stars,
                    stats.fps,
                    clock.rate(),
                    if clock.is_paused() { " (paused)" } else { "" },
                    disclaimer,
                ));
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, event_loop: &ActiveEventLoop) {
        let Some(orchestrator) = &mut self.orchestrator else { return };
        match key {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::Space => orchestrator.clock_mut().toggle_pause(),
            KeyCode::Comma => {
                let rate = orchestrator.clock().rate();
                orchestrator.clock_mut().set_rate(rate * 0.5);
            }
            KeyCode::Period => {
                let rate = orchestrator.clock().rate();
                orchestrator.clock_mut().set_rate(rate * 2.0);
            }
            KeyCode::Digit1 => orchestrator.clock_mut().set_rate(rates::REALTIME),
            KeyCode::Digit2 => orchestrator.clock_mut().set_rate(rates::HOUR_PER_SEC),
            KeyCode::Digit3 => orchestrator.clock_mut().set_rate(rates::DAY_PER_SEC),
            KeyCode::KeyP => {
                let mut config = orchestrator.config().clone();
                config.projection = match config.projection {
                    ProjectionMode::Stereographic => ProjectionMode::Orthographic,
                    ProjectionMode::Orthographic => ProjectionMode::Mercator,
                    ProjectionMode::Mercator => ProjectionMode::Stereographic,
                };
                info!("Projection: {}", config.projection);
                if let Err(e) = orchestrator.set_config(config) {
                    warn!("Projection change rejected: {}", e);
                }
            }
            KeyCode::KeyC => {
                let mut config = orchestrator.config().clone();
                config.coordinate_system = match config.coordinate_system {
                    CoordinateSystem::Horizontal => CoordinateSystem::Equatorial,
                    CoordinateSystem::Equatorial => CoordinateSystem::Ecliptic,
                    CoordinateSystem::Ecliptic => CoordinateSystem::Horizontal,
                };
                info!("Coordinate system: {:?}", config.coordinate_system);
                if let Err(e) = orchestrator.set_config(config) {
                    warn!("Coordinate system change rejected: {}", e);
                }
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for SkyApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            error!("Failed to start sky window: {:#}", e);
            self.failure = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                let scale = self.window.as_ref().map_or(1.0, |w| w.scale_factor() as f32);
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size, scale);
                }
                if let Some(orchestrator) = &mut self.orchestrator {
                    orchestrator.set_viewport(Viewport::new(size.width as f64, size.height as f64));
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x, position.y);
            }

            WindowEvent::MouseInput { state: ElementState::Pressed, button: MouseButton::Left, .. } => {
                if let Some(orchestrator) = &self.orchestrator {
                    match orchestrator.pick(self.cursor.0, self.cursor.1) {
                        Some(star) => info!(
                            "Picked {} [{}] mag {:.2}, B-V {:.2}, {}",
                            star.label(),
                            star.id,
                            star.magnitude,
                            star.color_index,
                            star.constellation
                        ),
                        None => info!("Nothing within reach of ({:.0}, {:.0})", self.cursor.0, self.cursor.1),
                    }
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed {
                    if let PhysicalKey::Code(key) = event.physical_key {
                        self.handle_key(key, event_loop);
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    error!("Render failed: {:#}", e);
                    self.failure = Some(e);
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Open the sky window and run until it is closed
pub fn run(session: SessionConfig, start: Epoch) -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = SkyApp::new(session, start);
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
