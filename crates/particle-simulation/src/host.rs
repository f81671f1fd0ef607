//! CPU backend: host-memory particle store updated on the rayon thread pool
//!
//! The store is moved into the update job while it runs and handed back through a channel, so
//! nothing can read it mid-pass.

use crate::spawn::random_particle;
use crate::{FrameSnapshot, SimulationError, UpdateKernel};
use bytemuck::Zeroable;
use crossbeam_channel::Receiver;
use particle_physics::{step, Particle, StepParams, WORKGROUP_SIZE};
use rand::Rng;
use rayon::prelude::*;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Fixed-length particle store in host memory
#[derive(Debug, Clone, PartialEq)]
pub struct HostParticleBuffer {
    particles: Box<[Particle]>,
}

impl HostParticleBuffer {
    /// Reserve `capacity` zeroed slots.
    pub fn allocate(capacity: u32) -> Result<Self, SimulationError> {
        let bytes = capacity as u64 * std::mem::size_of::<Particle>() as u64;
        let mut particles = Vec::new();
        particles
            .try_reserve_exact(capacity as usize)
            .map_err(|err| SimulationError::Allocation {
                capacity,
                bytes,
                reason: err.to_string(),
            })?;
        particles.resize(capacity as usize, Particle::zeroed());

        Ok(Self {
            particles: particles.into_boxed_slice(),
        })
    }

    pub fn from_particles(particles: Vec<Particle>) -> Self {
        Self {
            particles: particles.into_boxed_slice(),
        }
    }

    /// Place every slot at rest somewhere in the spawn rectangle.
    pub fn initialize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for slot in self.particles.iter_mut() {
            *slot = random_particle(rng);
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }
}

/// Step every particle once, in groups of [`WORKGROUP_SIZE`].
///
/// Each group walks the full group width and stops at the first index past the end, the same
/// guard the compute shader applies to over-provisioned invocations.
pub fn update_groups(particles: &mut [Particle], params: &StepParams) {
    let count = particles.len();
    let group_size = WORKGROUP_SIZE as usize;

    particles
        .par_chunks_mut(group_size)
        .enumerate()
        .for_each(|(group, chunk)| {
            for local in 0..group_size {
                let index = group * group_size + local;
                if index >= count {
                    return;
                }
                step(&mut chunk[local], params);
            }
        });
}

type PassResult = std::thread::Result<HostParticleBuffer>;

/// [`UpdateKernel`] running on the rayon global pool
pub struct CpuKernel {
    buffer: Option<HostParticleBuffer>,
    in_flight: Option<Receiver<PassResult>>,
    params: StepParams,
    particle_count: u32,
    completed: u64,
}

impl CpuKernel {
    pub fn new(buffer: HostParticleBuffer, params: StepParams) -> Result<Self, SimulationError> {
        if buffer.is_empty() {
            return Err(SimulationError::Dispatch(
                "particle buffer is empty".into(),
            ));
        }
        let particle_count = u32::try_from(buffer.len()).map_err(|_| {
            SimulationError::Dispatch(format!("{} particles exceed u32 indexing", buffer.len()))
        })?;

        log::info!(
            "✓ CPU kernel ready: {} particles in {} groups on {} threads",
            particle_count,
            particle_physics::workgroup_count(particle_count),
            rayon::current_num_threads()
        );

        Ok(Self {
            buffer: Some(buffer),
            in_flight: None,
            params,
            particle_count,
            completed: 0,
        })
    }
}

impl UpdateKernel for CpuKernel {
    type Buffer = HostParticleBuffer;

    fn particle_count(&self) -> u32 {
        self.particle_count
    }

    fn dispatch(&mut self) -> Result<(), SimulationError> {
        if self.in_flight.is_some() {
            return Err(SimulationError::Dispatch(
                "previous update has not been synchronized".into(),
            ));
        }
        let Some(mut buffer) = self.buffer.take() else {
            return Err(SimulationError::Dispatch(
                "particle buffer was lost in a faulted pass".into(),
            ));
        };

        let (sender, receiver) = crossbeam_channel::bounded(1);
        let params = self.params;

        rayon::spawn(move || {
            let pass = panic::catch_unwind(AssertUnwindSafe(move || {
                update_groups(&mut buffer.particles, &params);
                buffer
            }));
            // Receiver is gone only if the kernel was dropped mid-pass.
            let _ = sender.send(pass);
        });

        self.in_flight = Some(receiver);
        Ok(())
    }

    fn synchronize(&mut self) -> Result<FrameSnapshot<'_, HostParticleBuffer>, SimulationError> {
        if let Some(receiver) = self.in_flight.take() {
            let buffer = match receiver.recv() {
                Ok(Ok(buffer)) => buffer,
                Ok(Err(payload)) => {
                    return Err(SimulationError::Synchronization(format!(
                        "update task panicked: {}",
                        panic_message(payload.as_ref())
                    )))
                }
                Err(_) => {
                    return Err(SimulationError::Synchronization(
                        "update task exited without reporting".into(),
                    ))
                }
            };
            self.completed += 1;
            self.buffer = Some(buffer);
        }

        match &self.buffer {
            Some(buffer) => Ok(FrameSnapshot::new(buffer, self.completed)),
            None => Err(SimulationError::Synchronization(
                "particle buffer was lost in a faulted pass".into(),
            )),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
