//! Multi-threaded sweep on the CPU

// crate modules
use crate::error::{Error, Result};
use crate::problem::SweepProblem;
use crate::sweep::{sweep_track, SweepOutput, TransportSweep};

// external crates
use log::debug;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Sweeps tracks in parallel on a dedicated rayon pool
///
/// Each worker folds its tracks into a private tally, the partial tallies
/// are summed once every track is done. Outgoing fluxes are written
/// straight into disjoint chunks of the output.
#[derive(Debug)]
pub struct CpuSweep {
    pool: ThreadPool,
}

impl CpuSweep {
    pub fn new(num_threads: usize) -> Result<Self> {
        Ok(Self {
            pool: build_pool(num_threads)?,
        })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl TransportSweep for CpuSweep {
    fn name(&self) -> &str {
        "cpu"
    }

    fn set_num_threads(&mut self, num_threads: usize) -> Result<()> {
        if num_threads != self.num_threads() {
            self.pool = build_pool(num_threads)?;
        }
        Ok(())
    }

    fn prepare(&mut self, problem: &SweepProblem) -> Result<()> {
        debug!(
            "CPU sweep: {} tracks, {} segments on {} threads",
            problem.num_tracks(),
            problem.segments.len(),
            self.num_threads()
        );
        Ok(())
    }

    fn sweep(
        &mut self,
        problem: &SweepProblem,
        angular_source: &[f64],
        incoming: &[f64],
        output: &mut SweepOutput,
    ) -> Result<()> {
        let n = problem.num_values();
        let stride = problem.track_stride();

        output.tally = self.pool.install(|| {
            output
                .outgoing
                .par_chunks_mut(stride)
                .zip(incoming.par_chunks(stride))
                .zip(problem.tracks.par_iter())
                .fold(
                    || vec![0.0; n],
                    |mut tally, ((outgoing, incoming), track)| {
                        sweep_track(problem, track, angular_source, incoming, outgoing, &mut tally);
                        tally
                    },
                )
                .reduce(
                    || vec![0.0; n],
                    |mut a, b| {
                        a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                        a
                    },
                )
        });

        Ok(())
    }
}

fn build_pool(num_threads: usize) -> Result<ThreadPool> {
    if num_threads == 0 {
        return Err(Error::InvalidThreadCount);
    }

    Ok(ThreadPoolBuilder::new().num_threads(num_threads).build()?)
}
