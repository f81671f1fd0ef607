//! Runs the compute shader against the CPU reference. Skips when no adapter is available.

use glam::Vec2;
use particle_physics::{step, Particle, StepParams, WORKGROUP_SIZE};
use particle_simulation::{
    rng_from_seed, scatter, GpuKernel, ParticleBuffer, SimulationError, UpdateKernel,
};

fn device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .ok()?;

    pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("Test Device"),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::default(),
        memory_hints: wgpu::MemoryHints::default(),
        experimental_features: wgpu::ExperimentalFeatures::default(),
        trace: wgpu::Trace::Off,
    }))
    .ok()
}

fn assert_close(gpu: &Particle, cpu: &Particle) {
    let gpu = [gpu.position, gpu.velocity].concat();
    let cpu = [cpu.position, cpu.velocity].concat();
    for (g, c) in gpu.iter().zip(&cpu) {
        assert!((g - c).abs() < 1e-4, "gpu {gpu:?} vs cpu {cpu:?}");
    }
}

#[test]
fn compute_shader_matches_reference_step() {
    let Some((device, queue)) = device() else {
        eprintln!("no GPU adapter, skipping");
        return;
    };

    // Not a multiple of the workgroup size, so the last group is over-provisioned.
    let count = WORKGROUP_SIZE * 4 + 3;
    let mut expected = scatter(&mut rng_from_seed(Some(8)), count);
    expected[0] = Particle::new(Vec2::new(0.0, -0.995), Vec2::new(0.0, -1.0));

    let buffer = ParticleBuffer::allocate(&device, count).unwrap();
    buffer.upload(&queue, &expected).unwrap();

    let params = StepParams::default();
    let mut kernel = GpuKernel::new(device, queue, buffer, &params).unwrap();

    // Short enough that no scattered particle reaches the floor; only slot 0 bounces.
    for frame in 1..=10 {
        kernel.dispatch().unwrap();
        assert_eq!(kernel.synchronize().unwrap().frame(), frame);
        for particle in &mut expected {
            step(particle, &params);
        }
    }

    let actual = kernel.read_back().unwrap();
    assert_eq!(actual.len(), count as usize);
    for (gpu, cpu) in actual.iter().zip(&expected) {
        assert_close(gpu, cpu);
    }
}

#[test]
fn zero_capacity_is_rejected() {
    let Some((device, _queue)) = device() else {
        eprintln!("no GPU adapter, skipping");
        return;
    };

    assert!(matches!(
        ParticleBuffer::allocate(&device, 0),
        Err(SimulationError::Dispatch(_))
    ));
}

#[test]
fn oversized_buffer_is_an_allocation_error() {
    let Some((device, _queue)) = device() else {
        eprintln!("no GPU adapter, skipping");
        return;
    };

    assert!(matches!(
        ParticleBuffer::allocate(&device, u32::MAX),
        Err(SimulationError::Allocation { .. })
    ));
}

#[test]
fn second_dispatch_before_synchronize_is_rejected() {
    let Some((device, queue)) = device() else {
        eprintln!("no GPU adapter, skipping");
        return;
    };

    let particles = scatter(&mut rng_from_seed(Some(3)), WORKGROUP_SIZE);
    let buffer = ParticleBuffer::allocate(&device, WORKGROUP_SIZE).unwrap();
    buffer.upload(&queue, &particles).unwrap();
    let mut kernel = GpuKernel::new(device, queue, buffer, &StepParams::default()).unwrap();

    kernel.dispatch().unwrap();
    assert!(matches!(kernel.dispatch(), Err(SimulationError::Dispatch(_))));

    // The rejected dispatch did not queue a second pass.
    assert_eq!(kernel.synchronize().unwrap().frame(), 1);
    kernel.dispatch().unwrap();
    assert_eq!(kernel.synchronize().unwrap().frame(), 2);
}
