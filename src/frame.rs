//! Surface-backed render stage: acquire a swapchain image, draw the settled particles, present.

use particle_renderer::{ParticleRenderer, PointStyle};
use particle_simulation::{
    FrameRenderer, FrameSnapshot, HostParticleBuffer, ParticleBuffer, SimulationError,
};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("surface failure: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("cannot upload settled particles for display")]
    Upload(#[source] SimulationError),
    #[error("CPU backend has no display buffer")]
    NoDisplayBuffer,
}

pub struct SurfaceRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: ParticleRenderer,

    // CPU backend only: GPU copy of the host buffer, refreshed once per settled frame
    display_buffer: Option<ParticleBuffer>,

    frame: Option<wgpu::SurfaceTexture>,
}

impl SurfaceRenderer {
    pub fn new(
        surface: wgpu::Surface<'static>,
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: wgpu::SurfaceConfiguration,
        style: PointStyle,
        display_buffer: Option<ParticleBuffer>,
    ) -> Self {
        surface.configure(&device, &config);
        let renderer = ParticleRenderer::new(&device, &config, style);
        log::info!("✓ Renderer initialized ({:?})", config.format);

        Self {
            surface,
            device,
            queue,
            config,
            renderer,
            display_buffer,
            frame: None,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.renderer.resize(&self.config);
        }
    }

    /// `None` when this frame cannot be drawn but the loop may continue.
    fn acquire(&mut self) -> Result<Option<wgpu::SurfaceTexture>, RenderError> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out acquiring surface texture, skipping frame");
                Ok(None)
            }
            Err(err) => Err(RenderError::Surface(err)),
        }
    }

    fn draw(&mut self, particle_buffer: &wgpu::Buffer, particle_count: u32) -> Result<(), RenderError> {
        let Some(frame) = self.acquire()? else {
            return Ok(());
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.render(
            &self.device,
            &self.queue,
            &view,
            particle_buffer,
            particle_count,
        );
        self.frame = Some(frame);
        Ok(())
    }

    fn present_frame(&mut self) {
        if let Some(frame) = self.frame.take() {
            frame.present();
        }
    }
}

impl FrameRenderer<ParticleBuffer> for SurfaceRenderer {
    type Error = RenderError;

    fn render(&mut self, snapshot: FrameSnapshot<'_, ParticleBuffer>) -> Result<(), RenderError> {
        let particles = snapshot.buffer();
        log::trace!("Drawing frame {}", snapshot.frame());
        self.draw(particles.raw(), particles.capacity())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.present_frame();
        Ok(())
    }
}

impl FrameRenderer<HostParticleBuffer> for SurfaceRenderer {
    type Error = RenderError;

    fn render(&mut self, snapshot: FrameSnapshot<'_, HostParticleBuffer>) -> Result<(), RenderError> {
        let display = self
            .display_buffer
            .take()
            .ok_or(RenderError::NoDisplayBuffer)?;
        log::trace!("Uploading and drawing frame {}", snapshot.frame());

        let result = display
            .upload(&self.queue, snapshot.buffer().as_slice())
            .map_err(RenderError::Upload)
            .and_then(|()| self.draw(display.raw(), display.capacity()));

        self.display_buffer = Some(display);
        result
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.present_frame();
        Ok(())
    }
}
