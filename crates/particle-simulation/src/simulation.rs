//! GPU update kernel
//!
//! One compute pass per frame over the shared [`ParticleBuffer`]. The barrier is a blocking
//! device poll on the submission that carried the pass.

use crate::{FrameSnapshot, ParticleBuffer, PhysicsParams, SimulationError, UpdateKernel};
use crossbeam_channel::Receiver;
use particle_physics::{workgroup_count, StepParams};
use wgpu::util::DeviceExt;

/// GPU-based particle update
pub struct GpuKernel {
    device: wgpu::Device,
    queue: wgpu::Queue,

    particles: ParticleBuffer,
    _params_buffer: wgpu::Buffer,

    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,

    particle_count: u32,
    workgroups: u32,

    in_flight: Option<wgpu::SubmissionIndex>,
    completed: u64,

    lost_receiver: Receiver<String>,
    lost: Option<String>,
}

impl GpuKernel {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        particles: ParticleBuffer,
        step: &StepParams,
    ) -> Result<Self, SimulationError> {
        log::info!("Initializing GpuKernel...");
        let particle_count = particles.capacity();
        let workgroups = workgroup_count(particle_count);

        let max_workgroups = device.limits().max_compute_workgroups_per_dimension;
        if workgroups > max_workgroups {
            return Err(SimulationError::Dispatch(format!(
                "{particle_count} particles need {workgroups} workgroups, device allows {max_workgroups}"
            )));
        }

        let (lost_sender, lost_receiver) = crossbeam_channel::bounded(1);
        device.set_device_lost_callback(move |reason, message| {
            let _ = lost_sender.try_send(format!("{reason:?}: {message}"));
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let params = PhysicsParams::new(step, particle_count);
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Physics Params Buffer"),
            contents: bytemuck::cast_slice(&[params]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Update Compute Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/update.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Update Bind Group Layout"),
            entries: &[
                // Particles (Storage, read-write) - Binding 0
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Params (Uniform) - Binding 1
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Update Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Update Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Update Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: particles.raw().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(SimulationError::Dispatch(format!(
                "update pipeline is invalid: {err}"
            )));
        }

        log::info!("✓ Update pipeline: {particle_count} particles in {workgroups} workgroups");

        Ok(Self {
            device,
            queue,
            particles,
            _params_buffer: params_buffer,
            pipeline,
            bind_group,
            particle_count,
            workgroups,
            in_flight: None,
            completed: 0,
            lost_receiver,
            lost: None,
        })
    }

    /// Copy the current particle state to host memory.
    ///
    /// Only meaningful between frames; it waits for any queued work first.
    pub fn read_back(&self) -> Result<Vec<particle_physics::Particle>, SimulationError> {
        self.particles.read_back(&self.device, &self.queue)
    }

    fn check_device(&mut self) -> Result<(), SimulationError> {
        if let Ok(message) = self.lost_receiver.try_recv() {
            log::error!("GPU device lost: {message}");
            self.lost = Some(message);
        }
        match &self.lost {
            Some(message) => Err(SimulationError::Synchronization(format!(
                "device lost ({message})"
            ))),
            None => Ok(()),
        }
    }
}

impl UpdateKernel for GpuKernel {
    type Buffer = ParticleBuffer;

    fn particle_count(&self) -> u32 {
        self.particle_count
    }

    fn dispatch(&mut self) -> Result<(), SimulationError> {
        if self.in_flight.is_some() {
            return Err(SimulationError::Dispatch(
                "previous update has not been synchronized".into(),
            ));
        }
        if let Some(message) = &self.lost {
            return Err(SimulationError::Dispatch(format!("device lost ({message})")));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Update Encoder"),
            });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Update Compute Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, &self.bind_group, &[]);
            compute_pass.dispatch_workgroups(self.workgroups, 1, 1);
        }

        self.in_flight = Some(self.queue.submit(std::iter::once(encoder.finish())));
        Ok(())
    }

    fn synchronize(&mut self) -> Result<FrameSnapshot<'_, ParticleBuffer>, SimulationError> {
        if let Some(submission) = self.in_flight.take() {
            self.device
                .poll(wgpu::PollType::Wait {
                    submission_index: Some(submission),
                    timeout: None,
                })
                .map_err(|err| SimulationError::Synchronization(err.to_string()))?;
            self.check_device()?;
            self.completed += 1;
        } else {
            self.check_device()?;
        }

        Ok(FrameSnapshot::new(&self.particles, self.completed))
    }
}
