//! Transport sweep as two compute passes

// crate modules
use super::context::GpuContext;
use super::shaders::{self, dispatch_size};
use crate::error::{Error, Result};
use crate::problem::SweepProblem;
use crate::sweep::{SweepOutput, TransportSweep};

// external crates
use log::{debug, info};
use wgpu::util::{BufferInitDescriptor, DeviceExt};
use wgpu::{
    BindGroup, BindGroupLayout, BindGroupLayoutEntry, BindingType, Buffer, BufferBindingType,
    BufferUsages, ComputePipeline, Device, ShaderStages,
};

/// Sweep on a gpu in single precision
///
/// The first kernel runs one invocation per track direction and writes a
/// tally for every segment, the second sums those into FSR tallies. Track
/// data stay on the device between sweeps, only the source and boundary
/// fluxes are uploaded each time.
#[derive(Debug)]
pub struct GpuSweep {
    context: GpuContext,
    state: Option<DeviceState>,
}

/// Buffers and pipelines of a prepared problem
#[derive(Debug)]
struct DeviceState {
    angular_source: Buffer,
    flux_in: Buffer,
    flux_out: Buffer,
    tally: Buffer,
    sweep_pipeline: ComputePipeline,
    sweep_bindings: BindGroup,
    sweep_dispatch: (u32, u32),
    reduce_pipeline: ComputePipeline,
    reduce_bindings: BindGroup,
    reduce_dispatch: (u32, u32),
    num_values: usize,
    boundary_len: usize,
}

impl GpuSweep {
    /// Sweep on the first available adapter
    pub fn new() -> Result<Self> {
        Ok(Self::with_context(GpuContext::new()?))
    }

    pub fn with_context(context: GpuContext) -> Self {
        Self {
            context,
            state: None,
        }
    }

    pub fn context(&self) -> &GpuContext {
        &self.context
    }
}

impl TransportSweep for GpuSweep {
    fn name(&self) -> &str {
        "gpu"
    }

    fn prepare(&mut self, problem: &SweepProblem) -> Result<()> {
        let device = self.context.device();
        let num_tracks = problem.num_tracks();
        let num_segments = problem.segments.len();

        let segments: Vec<u32> = problem
            .segments
            .iter()
            .flat_map(|s| [s.fsr as u32, (s.length as f32).to_bits()])
            .collect();

        let tracks: Vec<u32> = problem
            .tracks
            .iter()
            .flat_map(|t| [t.first as u32, t.count as u32, (t.weight as f32).to_bits()])
            .collect();

        // segments of every fsr, compressed row storage
        let mut offsets = vec![0u32; problem.num_fsrs + 1];
        for s in &problem.segments {
            offsets[s.fsr + 1] += 1;
        }
        for i in 0..problem.num_fsrs {
            offsets[i + 1] += offsets[i];
        }
        let mut cursor = offsets.clone();
        let mut fsr_segments = vec![0u32; num_segments];
        for (i, s) in problem.segments.iter().enumerate() {
            fsr_segments[cursor[s.fsr] as usize] = i as u32;
            cursor[s.fsr] += 1;
        }

        let sweep_dispatch = dispatch_size((2 * num_tracks) as u32);
        let reduce_dispatch = dispatch_size(problem.num_values() as u32);

        let mut params = [0u32; 16];
        params[..4].copy_from_slice(&[
            num_tracks as u32,
            num_segments as u32,
            problem.num_groups as u32,
            problem.num_polar() as u32,
        ]);
        params[4..7].copy_from_slice(&[
            problem.num_fsrs as u32,
            sweep_dispatch.2,
            reduce_dispatch.2,
        ]);
        for (p, (inv_sin, factor)) in problem
            .inv_sin_theta()
            .iter()
            .zip(problem.polar_factors())
            .enumerate()
        {
            params[8 + p] = (*inv_sin as f32).to_bits();
            params[12 + p] = (*factor as f32).to_bits();
        }

        let sigma_t: Vec<f32> = problem.sigma_t.iter().map(|v| *v as f32).collect();

        let params = init_buffer(device, "params", &params, BufferUsages::UNIFORM);
        let segments = init_buffer(device, "segments", &segments, BufferUsages::STORAGE);
        let tracks = init_buffer(device, "tracks", &tracks, BufferUsages::STORAGE);
        let offsets = init_buffer(device, "fsr offsets", &offsets, BufferUsages::STORAGE);
        let fsr_segments = init_buffer(device, "fsr segments", &fsr_segments, BufferUsages::STORAGE);
        let sigma_t = init_buffer(device, "sigma_t", &sigma_t, BufferUsages::STORAGE);

        let writable = BufferUsages::STORAGE | BufferUsages::COPY_DST;
        let readable = BufferUsages::STORAGE | BufferUsages::COPY_SRC;
        let angular_source = empty_buffer(device, "angular source", problem.num_values(), writable);
        let flux_in = empty_buffer(device, "flux in", problem.boundary_len(), writable);
        let flux_out = empty_buffer(device, "flux out", problem.boundary_len(), readable);
        let segment_tally = empty_buffer(
            device,
            "segment tally",
            2 * num_segments * problem.num_groups,
            BufferUsages::STORAGE,
        );
        let tally = empty_buffer(device, "tally", problem.num_values(), readable);

        let (sweep_pipeline, sweep_layout) = compute_pipeline(
            device,
            "sweep",
            shaders::SWEEP,
            &[true, true, true, true, true, false, false],
        );
        let sweep_bindings = bind_group(
            device,
            "sweep",
            &sweep_layout,
            &[
                &params,
                &segments,
                &tracks,
                &sigma_t,
                &angular_source,
                &flux_in,
                &flux_out,
                &segment_tally,
            ],
        );

        let (reduce_pipeline, reduce_layout) =
            compute_pipeline(device, "reduce", shaders::REDUCE, &[true, true, true, false]);
        let reduce_bindings = bind_group(
            device,
            "reduce",
            &reduce_layout,
            &[&params, &segment_tally, &offsets, &fsr_segments, &tally],
        );

        info!(
            "GPU sweep prepared on {}: {} track directions, {} segments",
            self.context.adapter_name(),
            2 * num_tracks,
            num_segments
        );

        self.state = Some(DeviceState {
            angular_source,
            flux_in,
            flux_out,
            tally,
            sweep_pipeline,
            sweep_bindings,
            sweep_dispatch: (sweep_dispatch.0, sweep_dispatch.1),
            reduce_pipeline,
            reduce_bindings,
            reduce_dispatch: (reduce_dispatch.0, reduce_dispatch.1),
            num_values: problem.num_values(),
            boundary_len: problem.boundary_len(),
        });

        Ok(())
    }

    fn sweep(
        &mut self,
        problem: &SweepProblem,
        angular_source: &[f64],
        incoming: &[f64],
        output: &mut SweepOutput,
    ) -> Result<()> {
        if self.state.is_none() {
            self.prepare(problem)?;
        }
        let state = self
            .state
            .as_ref()
            .ok_or(Error::BufferError("gpu sweep was never prepared".into()))?;

        let queue = self.context.queue();
        let source: Vec<f32> = angular_source.iter().map(|v| *v as f32).collect();
        let flux_in: Vec<f32> = incoming.iter().map(|v| *v as f32).collect();
        queue.write_buffer(&state.angular_source, 0, bytemuck::cast_slice(&source));
        queue.write_buffer(&state.flux_in, 0, bytemuck::cast_slice(&flux_in));

        let mut encoder =
            self.context
                .device()
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("transport sweep"),
                });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("sweep"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&state.sweep_pipeline);
            pass.set_bind_group(0, &state.sweep_bindings, &[]);
            pass.dispatch_workgroups(state.sweep_dispatch.0, state.sweep_dispatch.1, 1);
        }
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("reduce"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&state.reduce_pipeline);
            pass.set_bind_group(0, &state.reduce_bindings, &[]);
            pass.dispatch_workgroups(state.reduce_dispatch.0, state.reduce_dispatch.1, 1);
        }
        queue.submit(std::iter::once(encoder.finish()));

        let tally = self.context.read_buffer(&state.tally, state.num_values)?;
        let outgoing = self.context.read_buffer(&state.flux_out, state.boundary_len)?;
        debug!("GPU sweep read back {} tallies", tally.len());

        output.tally = tally.iter().map(|v| *v as f64).collect();
        output.outgoing = outgoing.iter().map(|v| *v as f64).collect();
        Ok(())
    }
}

/// Buffer holding `data`, padded so that it is never empty
fn init_buffer<T: bytemuck::Pod>(device: &Device, label: &str, data: &[T], usage: BufferUsages) -> Buffer {
    let padding = [T::zeroed()];
    let contents = match data.is_empty() {
        true => bytemuck::cast_slice(&padding),
        false => bytemuck::cast_slice(data),
    };
    device.create_buffer_init(&BufferInitDescriptor {
        label: Some(label),
        contents,
        usage,
    })
}

/// Zeroed buffer of `count` f32 values, at least one
fn empty_buffer(device: &Device, label: &str, count: usize, usage: BufferUsages) -> Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: (count.max(1) * std::mem::size_of::<f32>()) as u64,
        usage,
        mapped_at_creation: false,
    })
}

/// Pipeline with a uniform at binding 0 followed by storage buffers
///
/// `read_only` lists the access of each storage binding in order.
fn compute_pipeline(
    device: &Device,
    label: &str,
    source: &str,
    read_only: &[bool],
) -> (ComputePipeline, BindGroupLayout) {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let entries: Vec<BindGroupLayoutEntry> = std::iter::once(layout_entry(0, BufferBindingType::Uniform))
        .chain(read_only.iter().enumerate().map(|(i, read_only)| {
            layout_entry(
                i as u32 + 1,
                BufferBindingType::Storage {
                    read_only: *read_only,
                },
            )
        }))
        .collect();

    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &entries,
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[&layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        module: &module,
        entry_point: Some(label),
        compilation_options: Default::default(),
        cache: None,
    });

    (pipeline, layout)
}

fn layout_entry(binding: u32, ty: BufferBindingType) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::COMPUTE,
        ty: BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn bind_group(device: &Device, label: &str, layout: &BindGroupLayout, buffers: &[&Buffer]) -> BindGroup {
    let entries: Vec<wgpu::BindGroupEntry> = buffers
        .iter()
        .enumerate()
        .map(|(i, buffer)| wgpu::BindGroupEntry {
            binding: i as u32,
            resource: buffer.as_entire_binding(),
        })
        .collect();

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &entries,
    })
}
