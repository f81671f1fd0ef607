//! Shared GPU particle storage
//!
//! One `STORAGE` buffer is bound read-write by the update pipeline and read-only by the render
//! pipeline, so particles never travel back through host memory between the two stages.

use crate::spawn::scatter;
use crate::SimulationError;
use particle_physics::Particle;
use rand::Rng;

const PARTICLE_SIZE: u64 = std::mem::size_of::<Particle>() as u64;

pub struct ParticleBuffer {
    buffer: wgpu::Buffer,
    capacity: u32,
}

impl ParticleBuffer {
    /// Reserve storage for `capacity` particles.
    ///
    /// Fails with `Allocation` when the size exceeds the device limits or the device runs out of
    /// memory creating it.
    pub fn allocate(device: &wgpu::Device, capacity: u32) -> Result<Self, SimulationError> {
        if capacity == 0 {
            return Err(SimulationError::Dispatch(
                "particle buffer needs at least one slot".into(),
            ));
        }

        let bytes = capacity as u64 * PARTICLE_SIZE;
        let limits = device.limits();
        let max_bytes = limits
            .max_buffer_size
            .min(limits.max_storage_buffer_binding_size as u64);
        if bytes > max_bytes {
            return Err(SimulationError::Allocation {
                capacity,
                bytes,
                reason: format!("device allows at most {max_bytes} bytes per storage buffer"),
            });
        }

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Buffer"),
            size: bytes,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(SimulationError::Allocation {
                capacity,
                bytes,
                reason: err.to_string(),
            });
        }

        log::info!("✓ Particle buffer: {capacity} particles, {bytes} bytes");
        Ok(Self { buffer, capacity })
    }

    /// Scatter every slot at rest over the spawn rectangle.
    pub fn initialize<R: Rng + ?Sized>(&self, queue: &wgpu::Queue, rng: &mut R) {
        let particles = scatter(rng, self.capacity);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&particles));
    }

    /// Overwrite the whole buffer. `particles` must hold exactly `capacity` entries.
    pub fn upload(&self, queue: &wgpu::Queue, particles: &[Particle]) -> Result<(), SimulationError> {
        if particles.len() != self.capacity as usize {
            return Err(SimulationError::Dispatch(format!(
                "upload of {} particles into a buffer of {}",
                particles.len(),
                self.capacity
            )));
        }
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(particles));
        Ok(())
    }

    /// Copy the buffer back to host memory. Blocks until the copy is mapped.
    pub fn read_back(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Vec<Particle>, SimulationError> {
        let size = self.byte_size();
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Readback Buffer"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Particle Readback Encoder"),
        });
        encoder.copy_buffer_to_buffer(&self.buffer, 0, &staging, 0, size);
        let submission = queue.submit(std::iter::once(encoder.finish()));

        let (sender, receiver) = crossbeam_channel::bounded(1);
        let slice = staging.slice(..);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        device
            .poll(wgpu::PollType::Wait {
                submission_index: Some(submission),
                timeout: None,
            })
            .map_err(|err| SimulationError::Synchronization(err.to_string()))?;

        match receiver.recv() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(SimulationError::Synchronization(err.to_string())),
            Err(_) => {
                return Err(SimulationError::Synchronization(
                    "readback mapping was dropped".into(),
                ))
            }
        }

        let particles = {
            let data = slice.get_mapped_range();
            bytemuck::cast_slice::<u8, Particle>(&data).to_vec()
        };
        staging.unmap();

        Ok(particles)
    }

    /// Underlying wgpu buffer, for binding.
    pub fn raw(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn byte_size(&self) -> u64 {
        self.capacity as u64 * PARTICLE_SIZE
    }
}
