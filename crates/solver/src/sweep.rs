//! Common interface of the transport sweeps

// crate modules
use crate::error::Result;
use crate::problem::{SweepProblem, SweepTrack};

// moctools modules
use moctools_tracks::Segment;

/// Results of one sweep over every track
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepOutput {
    /// Weighted change in angular flux per FSR and group
    pub tally: Vec<f64>,
    /// Angular flux leaving every track, laid out like the incoming flux
    pub outgoing: Vec<f64>,
}

impl SweepOutput {
    /// Zeroed output sized for a problem
    pub fn new(problem: &SweepProblem) -> Self {
        Self {
            tally: vec![0.0; problem.num_values()],
            outgoing: vec![0.0; problem.boundary_len()],
        }
    }
}

/// Transports angular flux along every track
///
/// Implementations must fill every value of the output on each call. The
/// solver owns the source iteration and only asks the sweep to attenuate
/// the incoming boundary flux across the tracks against a fixed source.
pub trait TransportSweep {
    /// Short name used in logs and reports
    fn name(&self) -> &str;

    /// Change the number of worker threads, if the sweep has any
    fn set_num_threads(&mut self, _num_threads: usize) -> Result<()> {
        Ok(())
    }

    /// Called once before the first sweep of a problem
    fn prepare(&mut self, problem: &SweepProblem) -> Result<()>;

    /// Sweep every track in both directions
    ///
    /// `angular_source` is the reduced source divided by the total cross
    /// section, `q / sigma_t`, per FSR and group. `incoming` holds the
    /// boundary flux entering each track direction.
    fn sweep(
        &mut self,
        problem: &SweepProblem,
        angular_source: &[f64],
        incoming: &[f64],
        output: &mut SweepOutput,
    ) -> Result<()>;
}

/// Attenuate the flux along one track in both directions
///
/// `incoming` and `outgoing` are the boundary fluxes of this track only,
/// `tally` is indexed by FSR and group.
pub(crate) fn sweep_track(
    problem: &SweepProblem,
    track: &SweepTrack,
    angular_source: &[f64],
    incoming: &[f64],
    outgoing: &mut [f64],
    tally: &mut [f64],
) {
    let groups = problem.num_groups;
    let segments = &problem.segments[track.first..track.first + track.count];

    for dir in 0..2 {
        for (p, (inv_sin, factor)) in problem
            .inv_sin_theta()
            .iter()
            .zip(problem.polar_factors())
            .enumerate()
        {
            let weight = track.weight * factor;
            let offset = (dir * problem.num_polar() + p) * groups;
            let psi = &mut outgoing[offset..offset + groups];
            psi.copy_from_slice(&incoming[offset..offset + groups]);

            let mut attenuate = |segment: &Segment| {
                let base = segment.fsr * groups;
                for g in 0..groups {
                    let tau = problem.sigma_t[base + g] * segment.length * inv_sin;
                    let delta = (psi[g] - angular_source[base + g]) * -(-tau).exp_m1();
                    tally[base + g] += weight * delta;
                    psi[g] -= delta;
                }
            };

            match dir {
                0 => segments.iter().for_each(&mut attenuate),
                _ => segments.iter().rev().for_each(&mut attenuate),
            }
        }
    }
}
