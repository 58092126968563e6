//! Source iteration over a transport sweep

// crate modules
use crate::cancel::CancelFlag;
use crate::convergence::{Convergence, ConvergenceStatus};
use crate::cpu::CpuSweep;
use crate::error::{Error, Result};
use crate::options::SolverOptions;
use crate::polar::PolarQuadrature;
use crate::problem::SweepProblem;
use crate::rebalance::{group_factors, scale_groups};
use crate::report::{FluxReport, RegionReport};
use crate::sweep::{SweepOutput, TransportSweep};

// standard library
use std::f64::consts::PI;
use std::path::Path;

// moctools modules
use moctools_geometry::{Geometry, Material, MaterialId};
use moctools_tracks::TrackGenerator;
use moctools_utils::{Timer, ValueExt};

// external crates
use itertools::izip;
use log::{debug, info, warn};

/// Solver on the multi-threaded CPU sweep
pub type CpuSolver<'a> = Solver<'a, CpuSweep>;

/// Solver on the wgpu compute sweep
#[cfg(feature = "gpu")]
pub type GpuSolver<'a> = Solver<'a, crate::gpu::GpuSweep>;

/// Multi-group source iteration with a flat source approximation
///
/// Every iteration rebuilds the scattering, fission and fixed sources from
/// the previous scalar flux, sweeps the tracks with the chosen
/// [TransportSweep], and updates the flux and eigenvalue from the tallies.
/// Each group is then rescaled so the whole domain is in neutron balance,
/// unless [SolverOptions::rebalance] is off. Boundary angular fluxes lag one
/// iteration.
///
/// Without a fixed source the solver finds the fundamental mode, normalising
/// flux to unit fission production. Any fixed source turns it into a fixed
/// source problem with `k` held at 1 and no normalisation.
///
/// ```rust,no_run
/// # use moctools_geometry::Geometry;
/// # use moctools_tracks::TrackGenerator;
/// # use moctools_solver::Solver;
/// # let geometry = Geometry::new();
/// # let mut generator = TrackGenerator::new(&geometry, 16, 0.1).unwrap();
/// # generator.generate_tracks().unwrap();
/// let mut solver = Solver::new(&geometry, &generator).unwrap();
/// solver.set_num_threads(4).unwrap();
/// solver.set_source_convergence_threshold(1e-6).unwrap();
///
/// let convergence = solver.converge_source(1000).unwrap();
/// println!("{convergence}");
/// ```
#[derive(Debug)]
pub struct Solver<'a, S: TransportSweep = CpuSweep> {
    problem: SweepProblem,
    sweep: S,
    options: SolverOptions,
    /// Material of every FSR
    materials: Vec<&'a Material>,
    fixed_source: Vec<f64>,
    scalar_flux: Vec<f64>,
    incoming: Vec<f64>,
    output: SweepOutput,
    keff: f64,
    keff_history: Vec<f64>,
    residual_history: Vec<f64>,
    convergence: Option<Convergence>,
    prepared: bool,
    cancel: CancelFlag,
    timer: Timer,
}

impl<'a> Solver<'a, CpuSweep> {
    /// Solver on the CPU sweep, single threaded until told otherwise
    pub fn new(geometry: &'a Geometry, generator: &TrackGenerator) -> Result<Self> {
        Self::with_sweep(geometry, generator, CpuSweep::new(1)?)
    }
}

#[cfg(feature = "gpu")]
impl<'a> Solver<'a, crate::gpu::GpuSweep> {
    /// Solver on the first available gpu adapter
    pub fn new_gpu(geometry: &'a Geometry, generator: &TrackGenerator) -> Result<Self> {
        Self::with_sweep(geometry, generator, crate::gpu::GpuSweep::new()?)
    }
}

impl<'a, S: TransportSweep> Solver<'a, S> {
    /// Solver on any sweep implementation
    ///
    /// Fails if the tracks are missing or were generated for a different
    /// geometry.
    pub fn with_sweep(geometry: &'a Geometry, generator: &TrackGenerator, mut sweep: S) -> Result<Self> {
        if !generator.is_generated() {
            return Err(Error::TracksNotGenerated);
        }

        if geometry.signature()? != generator.geometry().signature()? {
            return Err(Error::GeometryMismatch);
        }

        let options = SolverOptions::default();
        sweep.set_num_threads(options.num_threads)?;

        let polar = PolarQuadrature::tabuchi_yamamoto(options.num_polar)?;
        let problem = SweepProblem::new(geometry, generator, polar)?;

        let materials = geometry
            .fsrs()
            .iter()
            .map(|fsr| {
                geometry
                    .material(fsr.material)
                    .ok_or(Error::GeometryError(
                        moctools_geometry::Error::UndefinedMaterial {
                            cell: fsr.cell,
                            material: fsr.material,
                        },
                    ))
            })
            .collect::<Result<Vec<_>>>()?;

        let n = problem.num_values();
        let output = SweepOutput::new(&problem);
        let incoming = vec![0.0; problem.boundary_len()];

        Ok(Self {
            problem,
            sweep,
            options,
            materials,
            fixed_source: vec![0.0; n],
            scalar_flux: vec![1.0; n],
            incoming,
            output,
            keff: 1.0,
            keff_history: Vec::new(),
            residual_history: Vec::new(),
            convergence: None,
            prepared: false,
            cancel: CancelFlag::new(),
            timer: Timer::new(),
        })
    }

    /// Worker threads of the sweep, at least 1
    pub fn set_num_threads(&mut self, num_threads: usize) -> Result<()> {
        if num_threads == 0 {
            return Err(Error::InvalidThreadCount);
        }
        self.sweep.set_num_threads(num_threads)?;
        self.options.num_threads = num_threads;
        Ok(())
    }

    /// Iteration stops once the residual falls below `threshold`
    pub fn set_source_convergence_threshold(&mut self, threshold: f64) -> Result<()> {
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(Error::InvalidThreshold(threshold));
        }
        self.options.threshold = threshold;
        Ok(())
    }

    /// Number of Tabuchi-Yamamoto polar angles, 1 to 3
    ///
    /// Changing the quadrature discards the boundary fluxes.
    pub fn set_polar_quadrature(&mut self, num_polar: usize) -> Result<()> {
        let polar = PolarQuadrature::tabuchi_yamamoto(num_polar)?;
        if polar != self.problem.polar {
            self.problem.set_polar(polar);
            self.incoming = vec![0.0; self.problem.boundary_len()];
            self.output = SweepOutput::new(&self.problem);
            self.prepared = false;
        }
        self.options.num_polar = num_polar;
        Ok(())
    }

    /// Rescale each group after every sweep to restore whole-domain balance
    pub fn set_group_rebalance(&mut self, enabled: bool) {
        self.options.rebalance = enabled;
    }

    /// Apply every option at once
    pub fn set_options(&mut self, options: SolverOptions) -> Result<()> {
        options.validate()?;
        self.set_num_threads(options.num_threads)?;
        self.set_source_convergence_threshold(options.threshold)?;
        self.set_group_rebalance(options.rebalance);
        self.set_polar_quadrature(options.num_polar)
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    /// Isotropic source density (n/cm3/s) in one FSR and group
    pub fn set_fixed_source_by_fsr(&mut self, fsr: usize, group: usize, value: f64) -> Result<()> {
        if fsr >= self.problem.num_fsrs {
            return Err(Error::UnknownFsr(fsr));
        }
        self.check_fixed_source(group, value)?;
        self.fixed_source[fsr * self.problem.num_groups + group] = value;
        Ok(())
    }

    /// Isotropic source density in every FSR filled with a material
    pub fn set_fixed_source_by_material(
        &mut self,
        material: MaterialId,
        group: usize,
        value: f64,
    ) -> Result<()> {
        self.check_fixed_source(group, value)?;

        let groups = self.problem.num_groups;
        let mut found = false;
        for (fsr, m) in self.materials.iter().enumerate() {
            if m.id == material {
                self.fixed_source[fsr * groups + group] = value;
                found = true;
            }
        }

        match found {
            true => Ok(()),
            false => Err(Error::UnknownMaterial(material)),
        }
    }

    fn check_fixed_source(&self, group: usize, value: f64) -> Result<()> {
        if group >= self.problem.num_groups {
            return Err(Error::InvalidGroup {
                group,
                groups: self.problem.num_groups,
            });
        }

        if !(value.is_finite() && value >= 0.0) {
            return Err(Error::InvalidFixedSource(value));
        }

        Ok(())
    }

    /// Iterate the source until converged, cancelled, or out of iterations
    ///
    /// Every call starts from a flat unit flux, `k = 1` and zero boundary
    /// fluxes. A call made while the cancel flag is raised returns at once
    /// and keeps the results of the previous run. Running out of iterations
    /// is not an error, check the status of the returned [Convergence].
    pub fn converge_source(&mut self, max_iterations: usize) -> Result<Convergence> {
        let eigenvalue = !self.fixed_source.iter().any(|q| *q > 0.0);
        if eigenvalue && !self.materials.iter().any(|m| m.is_fissionable()) {
            return Err(Error::NoSource);
        }

        if self.cancel.is_cancelled() {
            let convergence = Convergence {
                status: ConvergenceStatus::Cancelled,
                iterations: 0,
                keff: self.keff,
                residual: self.residual_history.last().copied().unwrap_or(f64::INFINITY),
            };
            warn!("{convergence}");
            return Ok(convergence);
        }

        self.timer.reset();
        self.timer.start();
        if !self.prepared {
            self.sweep.prepare(&self.problem)?;
            self.prepared = true;
        }
        self.timer.stop();
        self.timer.record_split("Preparing the transport sweep");
        self.timer.reset();

        self.reset_state();
        info!(
            "Converging the {} source on the {} sweep",
            if eigenvalue { "eigenvalue" } else { "fixed" },
            self.sweep.name()
        );

        self.timer.start();
        let mut convergence = Convergence {
            status: ConvergenceStatus::NotConverged,
            iterations: 0,
            keff: self.keff,
            residual: f64::INFINITY,
        };

        let mut fission_old = self.fission_production(&self.scalar_flux);
        for iteration in 1..=max_iterations {
            if self.cancel.is_cancelled() {
                convergence.status = ConvergenceStatus::Cancelled;
                break;
            }

            let residual = self.iterate(eigenvalue, &mut fission_old)?;
            convergence.iterations = iteration;
            convergence.keff = self.keff;
            convergence.residual = residual;

            debug!(
                "Iteration {iteration:>4}: k = {}, residual = {}",
                self.keff.sci(6, 2),
                residual.sci(3, 2)
            );

            if residual < self.options.threshold {
                convergence.status = ConvergenceStatus::Converged;
                break;
            }
        }

        self.timer.stop();
        self.timer.record_split("Converging the source");
        self.timer.reset();

        match convergence.status {
            ConvergenceStatus::Converged => info!("{convergence}"),
            _ => warn!("{convergence}"),
        }

        self.convergence = Some(convergence);
        Ok(convergence)
    }

    fn reset_state(&mut self) {
        self.scalar_flux.fill(1.0);
        self.incoming.fill(0.0);
        self.keff = 1.0;
        self.keff_history.clear();
        self.residual_history.clear();
        self.convergence = None;
    }

    /// One source update, sweep, flux update and residual, returns the residual
    fn iterate(&mut self, eigenvalue: bool, fission_old: &mut f64) -> Result<f64> {
        let groups = self.problem.num_groups;

        let emission = self.emission_source(&self.scalar_flux, self.keff);
        let mut source = emission.clone();
        self.add_scatter_source(&self.scalar_flux, &mut source);
        let angular_source: Vec<f64> = source
            .iter()
            .zip(&self.problem.sigma_t)
            .map(|(s, sigma_t)| s / (4.0 * PI * sigma_t))
            .collect();

        self.sweep.sweep(
            &self.problem,
            &angular_source,
            &self.incoming,
            &mut self.output,
        )?;

        // phi = 4pi q / sigma_t + tally / (sigma_t V)
        let mut flux = vec![0.0; self.problem.num_values()];
        for (phi, source, sigma_t, tally, volume) in izip!(
            flux.chunks_mut(groups),
            source.chunks(groups),
            self.problem.sigma_t.chunks(groups),
            self.output.tally.chunks(groups),
            &self.problem.volumes
        ) {
            for (phi, s, sigma_t, tally) in izip!(phi, source, sigma_t, tally) {
                *phi = s / sigma_t;
                if *volume > 0.0 {
                    *phi += tally / (sigma_t * volume);
                }
            }
        }

        if self.options.rebalance {
            let factors = group_factors(
                &self.problem,
                &self.materials,
                &emission,
                &flux,
                &self.output.outgoing,
            );
            match factors {
                Some(factors) => {
                    scale_groups(&mut flux, &factors);
                    scale_groups(&mut self.output.outgoing, &factors);
                }
                None => debug!("Skipping the group rebalance, no positive solution"),
            }
        }

        let mut keff = self.keff;
        if eigenvalue {
            let fission_new = self.fission_production(&flux);
            if fission_new > 0.0 && *fission_old > 0.0 {
                keff *= fission_new / *fission_old;
                let scale = 1.0 / fission_new;
                flux.iter_mut().for_each(|v| *v *= scale);
                self.output.outgoing.iter_mut().for_each(|v| *v *= scale);
                *fission_old = 1.0;
            }
        }

        let incoming = self.transfer_boundary_flux();

        let residual = self
            .source_residual(&source, &self.total_source(&flux, keff))
            .max(boundary_residual(&self.incoming, &incoming))
            .max(match eigenvalue {
                true => keff.relative_to(self.keff),
                false => 0.0,
            });

        self.scalar_flux = flux;
        self.incoming = incoming;
        self.keff = keff;
        self.keff_history.push(keff);
        self.residual_history.push(residual);

        Ok(residual)
    }

    /// Scattering, fission and fixed source density per FSR and group
    fn total_source(&self, flux: &[f64], keff: f64) -> Vec<f64> {
        let mut source = self.emission_source(flux, keff);
        self.add_scatter_source(flux, &mut source);
        source
    }

    /// Fission and fixed source density per FSR and group
    fn emission_source(&self, flux: &[f64], keff: f64) -> Vec<f64> {
        let groups = self.problem.num_groups;
        let mut source = self.fixed_source.clone();

        for (material, phi, q) in izip!(
            &self.materials,
            flux.chunks(groups),
            source.chunks_mut(groups)
        ) {
            let fission: f64 = izip!(&material.nu_sigma_f, phi).map(|(nf, p)| nf * p).sum();
            for (q, chi) in q.iter_mut().zip(&material.chi) {
                *q += chi * fission / keff;
            }
        }

        source
    }

    fn add_scatter_source(&self, flux: &[f64], source: &mut [f64]) {
        let groups = self.problem.num_groups;
        for (material, phi, q) in izip!(
            &self.materials,
            flux.chunks(groups),
            source.chunks_mut(groups)
        ) {
            for (to, q) in q.iter_mut().enumerate() {
                *q += phi
                    .iter()
                    .enumerate()
                    .map(|(from, p)| material.scatter(from, to) * p)
                    .sum::<f64>();
            }
        }
    }

    /// RMS over FSRs of the relative change in total source
    fn source_residual(&self, old: &[f64], new: &[f64]) -> f64 {
        let groups = self.problem.num_groups;
        let n = self.problem.num_fsrs;
        if n == 0 {
            return 0.0;
        }

        let sum_sq: f64 = old
            .chunks(groups)
            .zip(new.chunks(groups))
            .map(|(old, new)| {
                let old: f64 = old.iter().sum();
                let new: f64 = new.iter().sum();
                new.relative_to(old).powi(2)
            })
            .sum();

        (sum_sq / n as f64).sqrt()
    }

    /// Hand outgoing flux to the linked track ends, vacuum ends get nothing
    fn transfer_boundary_flux(&self) -> Vec<f64> {
        let stride = self.problem.direction_stride();
        let mut incoming = vec![0.0; self.problem.boundary_len()];

        for (track, links) in self.problem.links.iter().enumerate() {
            for (dir, link) in links.iter().enumerate() {
                let Some(link) = link else {
                    continue;
                };
                let from = self.problem.boundary_offset(track, dir);
                let to = self
                    .problem
                    .boundary_offset(link.track, if link.forward { 0 } else { 1 });
                incoming[to..to + stride]
                    .copy_from_slice(&self.output.outgoing[from..from + stride]);
            }
        }

        incoming
    }

    fn fission_production(&self, flux: &[f64]) -> f64 {
        let groups = self.problem.num_groups;
        izip!(&self.materials, flux.chunks(groups), &self.problem.volumes)
            .map(|(material, phi, volume)| {
                let rate: f64 = izip!(&material.nu_sigma_f, phi).map(|(nf, p)| nf * p).sum();
                rate * volume
            })
            .sum()
    }

    /// Scalar flux indexed by `fsr * num_groups + group`
    pub fn scalar_flux(&self) -> &[f64] {
        &self.scalar_flux
    }

    /// Scalar flux of one FSR and group
    pub fn flux(&self, fsr: usize, group: usize) -> Option<f64> {
        if group >= self.problem.num_groups {
            return None;
        }
        self.scalar_flux
            .get(fsr * self.problem.num_groups + group)
            .copied()
    }

    pub fn keff(&self) -> f64 {
        self.keff
    }

    /// Eigenvalue after each iteration of the last run
    pub fn keff_history(&self) -> &[f64] {
        &self.keff_history
    }

    /// Residual after each iteration of the last run
    pub fn residual_history(&self) -> &[f64] {
        &self.residual_history
    }

    /// Outcome of the last run, if any
    pub fn convergence(&self) -> Option<Convergence> {
        self.convergence
    }

    pub fn num_fsrs(&self) -> usize {
        self.problem.num_fsrs
    }

    pub fn num_groups(&self) -> usize {
        self.problem.num_groups
    }

    pub fn fsr_volumes(&self) -> &[f64] {
        &self.problem.volumes
    }

    /// Volume integrated `nu sigma_f phi` over the whole domain
    pub fn total_fission_production(&self) -> f64 {
        self.fission_production(&self.scalar_flux)
    }

    /// Volume integrated `sigma_f phi` of every FSR
    pub fn fission_rates(&self) -> Vec<f64> {
        let groups = self.problem.num_groups;
        izip!(
            &self.materials,
            self.scalar_flux.chunks(groups),
            &self.problem.volumes
        )
        .map(|(material, phi, volume)| {
            let rate: f64 = izip!(&material.sigma_f, phi).map(|(f, p)| f * p).sum();
            rate * volume
        })
        .collect()
    }

    /// Angular flux entering a track, `num_polar x num_groups` values
    ///
    /// `forward` selects flux entering at the start and travelling to the
    /// end, otherwise flux entering at the end.
    pub fn incoming_flux(&self, track: usize, forward: bool) -> Option<&[f64]> {
        self.boundary_slice(&self.incoming, track, forward)
    }

    /// Angular flux leaving a track after the last sweep
    ///
    /// `forward` selects flux that travelled from the start and left
    /// through the end.
    pub fn outgoing_flux(&self, track: usize, forward: bool) -> Option<&[f64]> {
        self.boundary_slice(&self.output.outgoing, track, forward)
    }

    fn boundary_slice<'s>(&self, values: &'s [f64], track: usize, forward: bool) -> Option<&'s [f64]> {
        if track >= self.problem.num_tracks() {
            return None;
        }
        let start = self.problem.boundary_offset(track, if forward { 0 } else { 1 });
        values.get(start..start + self.problem.direction_stride())
    }

    /// Flag that stops [converge_source()](Solver::converge_source) early
    ///
    /// The returned handle shares state with the solver and can be moved to
    /// another thread.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Splits recorded by the solver
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut Timer {
        &mut self.timer
    }

    /// Name of the sweep in use
    pub fn sweep_name(&self) -> &str {
        self.sweep.name()
    }

    /// Flux, volume and fission rate of every FSR
    pub fn report(&self) -> FluxReport {
        let fission_rates = self.fission_rates();
        let regions = izip!(
            &self.materials,
            self.scalar_flux.chunks(self.problem.num_groups),
            &self.problem.volumes,
            fission_rates
        )
        .enumerate()
        .map(|(fsr, (material, flux, volume, fission_rate))| RegionReport {
            fsr,
            material: material.id,
            volume: *volume,
            flux: flux.to_vec(),
            fission_rate,
        })
        .collect();

        FluxReport {
            sweep: self.sweep.name().to_string(),
            num_groups: self.problem.num_groups,
            keff: self.keff,
            convergence: self.convergence,
            regions,
        }
    }

    /// Write the flux report as JSON
    pub fn write_report<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.report().write(path)
    }
}

/// Relative change of the boundary fluxes in the L2 norm
fn boundary_residual(old: &[f64], new: &[f64]) -> f64 {
    let diff = old
        .iter()
        .zip(new)
        .map(|(o, n)| (n - o).powi(2))
        .sum::<f64>()
        .sqrt();
    let norm = new.iter().map(|n| n * n).sum::<f64>().sqrt();
    match norm > 0.0 {
        true => diff / norm,
        false => diff,
    }
}
