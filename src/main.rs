//! Particle Rain
//!
//! Particles scattered above a floor fall under gravity and bounce, updated in parallel
//! each frame and drawn as points once the update has settled.

mod config;
mod frame;
mod stats;

use anyhow::Context as _;
use config::Config;
use frame::{RenderError, SurfaceRenderer};
use particle_simulation::{
    rng_from_seed, Backend, CpuKernel, FrameError, FrameScheduler, GpuKernel,
    HostParticleBuffer, ParticleBuffer, UpdateKernel,
};
use stats::FrameStats;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// The frame scheduler for whichever backend was configured
enum Pipeline {
    Gpu(FrameScheduler<GpuKernel>),
    Cpu(FrameScheduler<CpuKernel>),
}

impl Pipeline {
    fn run_frame(&mut self, renderer: &mut SurfaceRenderer) -> Result<u64, FrameError<RenderError>> {
        match self {
            Pipeline::Gpu(scheduler) => scheduler.run_frame(renderer),
            Pipeline::Cpu(scheduler) => scheduler.run_frame(renderer),
        }
    }

    fn shutdown(&mut self) {
        match self {
            Pipeline::Gpu(scheduler) => scheduler.shutdown(),
            Pipeline::Cpu(scheduler) => scheduler.shutdown(),
        }
    }

    fn particle_count(&self) -> u32 {
        match self {
            Pipeline::Gpu(scheduler) => scheduler.kernel().particle_count(),
            Pipeline::Cpu(scheduler) => scheduler.kernel().particle_count(),
        }
    }
}

struct GpuState {
    renderer: SurfaceRenderer,
    pipeline: Pipeline,
    stats: FrameStats,
}

impl GpuState {
    async fn new(window: Arc<Window>, config: &Config) -> anyhow::Result<Self> {
        let size = window.inner_size();

        // WGPU_BACKEND overrides the default backend set
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::from_env().unwrap_or(wgpu::Backends::PRIMARY),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("creating window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible GPU adapter")?;

        log::info!("✓ Using GPU: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("requesting GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no supported formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoNoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let sim = &config.simulation;
        let step = sim.step_params();
        let mut rng = rng_from_seed(sim.seed);

        // Both backends draw from a device buffer; the CPU one refreshes it after each settled frame
        let particles = ParticleBuffer::allocate(&device, sim.particle_count)?;

        let (pipeline, display_buffer) = match sim.backend {
            Backend::Gpu => {
                particles.initialize(&queue, &mut rng);
                let kernel = GpuKernel::new(device.clone(), queue.clone(), particles, &step)?;
                (Pipeline::Gpu(FrameScheduler::new(kernel)), None)
            }
            Backend::Cpu => {
                let mut host = HostParticleBuffer::allocate(sim.particle_count)?;
                host.initialize(&mut rng);
                let kernel = CpuKernel::new(host, step)?;
                (Pipeline::Cpu(FrameScheduler::new(kernel)), Some(particles))
            }
        };
        log::info!(
            "✓ Simulation initialized: {} particles on the {:?} backend",
            pipeline.particle_count(),
            sim.backend
        );

        let renderer = SurfaceRenderer::new(
            surface,
            device,
            queue,
            surface_config,
            config.display.point_style(),
            display_buffer,
        );

        Ok(Self {
            renderer,
            pipeline,
            stats: FrameStats::new(),
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.renderer.resize(new_size.width, new_size.height);
    }
}

/// Decide whether a failed frame should end the process with an error.
///
/// Redraws already queued when the window closes still arrive after `shutdown`, and the
/// scheduler answers them with `Terminated`. That is the normal way out, not a failure.
fn fatal_frame_error<E>(err: FrameError<E>, shutdown_requested: bool) -> Option<anyhow::Error>
where
    E: std::error::Error + Send + Sync + 'static,
{
    match err {
        FrameError::Terminated if shutdown_requested => None,
        err => Some(anyhow::Error::new(err).context("frame failed")),
    }
}

struct App {
    config: Config,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    shutdown_requested: bool,
    /// First fatal error; reported from `main` after the loop exits
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            config,
            window: None,
            gpu_state: None,
            shutdown_requested: false,
            fatal: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        if self.fatal.is_none() {
            self.fatal = Some(err);
        }
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let [width, height] = self.config.display.window_size;
        let window_attributes = Window::default_attributes()
            .with_title("Particle Rain")
            .with_inner_size(winit::dpi::LogicalSize::new(width, height));

        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("creating window")?,
        );
        self.window = Some(window.clone());
        self.gpu_state = Some(pollster::block_on(GpuState::new(window, &self.config))?);
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(err) = self.init(event_loop) {
                self.fail(event_loop, err);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                self.shutdown_requested = true;
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.pipeline.shutdown();
                }
                event_loop.exit();
                return;
            }

            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }

            WindowEvent::RedrawRequested => {
                if self.shutdown_requested {
                    return;
                }
                let Some(gpu_state) = &mut self.gpu_state else {
                    return;
                };
                match gpu_state.pipeline.run_frame(&mut gpu_state.renderer) {
                    Ok(frame) => {
                        let (fps, frame_time) = gpu_state.stats.tick();
                        if let Some(window) = &self.window {
                            window.set_title(&format!(
                                "Particle Rain - {:.0} FPS ({:.2}ms) - {} particles",
                                fps,
                                frame_time,
                                gpu_state.pipeline.particle_count()
                            ));
                        }
                        log::trace!("Frame {frame} presented");
                    }
                    Err(err) => {
                        if let Some(err) = fatal_frame_error(err, self.shutdown_requested) {
                            self.fail(event_loop, err);
                        }
                        return;
                    }
                }
            }

            _ => {}
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logger (RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting particle rain...");
    let config = Config::load()?;

    let event_loop = EventLoop::new().context("creating event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app).context("running event loop")?;

    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
