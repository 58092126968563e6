//! Flattened, read-only view of a problem handed to the transport sweeps

// crate modules
use crate::error::{Error, Result};
use crate::polar::PolarQuadrature;

// standard library
use std::f64::consts::PI;

// moctools modules
use moctools_geometry::Geometry;
use moctools_tracks::{Segment, TrackGenerator, TrackLink};

/// Segments and weight of one track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepTrack {
    /// Index of the first segment in [SweepProblem::segments]
    pub first: usize,
    /// Number of segments on the track
    pub count: usize,
    /// Angular weight `2pi x azimuthal weight x spacing`
    pub weight: f64,
}

/// Everything a sweep needs, in flat arrays
///
/// Cross sections are indexed `fsr * num_groups + group`. Boundary angular
/// fluxes are indexed `((track * 2 + dir) * num_polar + p) * num_groups + g`
/// with `dir` 0 for flux travelling from the start of a track to its end and
/// 1 for the reverse.
#[derive(Debug, Clone)]
pub struct SweepProblem {
    pub num_groups: usize,
    pub num_fsrs: usize,
    pub polar: PolarQuadrature,
    /// Total cross section of every FSR and group
    pub sigma_t: Vec<f64>,
    pub tracks: Vec<SweepTrack>,
    /// Segments of every track in order from start to end
    pub segments: Vec<Segment>,
    /// Continuation of flux leaving each track, indexed by `dir`
    pub links: Vec<[Option<TrackLink>; 2]>,
    pub volumes: Vec<f64>,
    inv_sin_theta: Vec<f64>,
    polar_factors: Vec<f64>,
}

impl SweepProblem {
    /// Flatten the tracks and cross sections of a problem
    pub fn new(
        geometry: &Geometry,
        generator: &TrackGenerator,
        polar: PolarQuadrature,
    ) -> Result<Self> {
        if !generator.is_generated() {
            return Err(Error::TracksNotGenerated);
        }

        let num_groups = geometry.num_groups();
        let num_fsrs = geometry.num_fsrs();

        let mut sigma_t = Vec::with_capacity(num_fsrs * num_groups);
        for fsr in geometry.fsrs() {
            let material = geometry.material(fsr.material).ok_or(
                moctools_geometry::Error::UndefinedMaterial {
                    cell: fsr.cell,
                    material: fsr.material,
                },
            )?;
            sigma_t.extend_from_slice(&material.sigma_t);
        }

        let mut tracks = Vec::with_capacity(generator.num_tracks());
        let mut segments = Vec::with_capacity(generator.num_segments());
        let mut links = Vec::with_capacity(generator.num_tracks());
        for track in generator.tracks() {
            tracks.push(SweepTrack {
                first: segments.len(),
                count: track.num_segments(),
                weight: 2.0 * PI * generator.track_weight(track),
            });
            segments.extend_from_slice(&track.segments);
            links.push([track.outgoing(true), track.outgoing(false)]);
        }

        let mut problem = Self {
            num_groups,
            num_fsrs,
            polar: PolarQuadrature::default(),
            sigma_t,
            tracks,
            segments,
            links,
            volumes: generator.fsr_volumes().to_vec(),
            inv_sin_theta: Vec::new(),
            polar_factors: Vec::new(),
        };
        problem.set_polar(polar);
        Ok(problem)
    }

    /// Swap the polar quadrature, boundary fluxes change size
    pub fn set_polar(&mut self, polar: PolarQuadrature) {
        self.inv_sin_theta = polar.sin_theta().iter().map(|s| 1.0 / s).collect();
        self.polar_factors = polar.weighted_sines().collect();
        self.polar = polar;
    }

    pub fn num_polar(&self) -> usize {
        self.polar.num_polar()
    }

    pub fn num_tracks(&self) -> usize {
        self.tracks.len()
    }

    /// Length of scalar flux, source and tally arrays
    pub fn num_values(&self) -> usize {
        self.num_fsrs * self.num_groups
    }

    /// Boundary flux values per direction of a track
    pub fn direction_stride(&self) -> usize {
        self.num_polar() * self.num_groups
    }

    /// Boundary flux values per track, both directions
    pub fn track_stride(&self) -> usize {
        2 * self.direction_stride()
    }

    /// Length of the boundary flux arrays
    pub fn boundary_len(&self) -> usize {
        self.num_tracks() * self.track_stride()
    }

    /// Start of the boundary fluxes of one track direction
    pub fn boundary_offset(&self, track: usize, dir: usize) -> usize {
        (track * 2 + dir) * self.direction_stride()
    }

    /// Segments of a track from start to end
    pub fn track_segments(&self, track: usize) -> &[Segment] {
        let t = &self.tracks[track];
        &self.segments[t.first..t.first + t.count]
    }

    /// `1 / sin(theta)` of every polar angle
    pub fn inv_sin_theta(&self) -> &[f64] {
        &self.inv_sin_theta
    }

    /// Polar weight times `sin(theta)`, multiplies the track weight in tallies
    pub fn polar_factors(&self) -> &[f64] {
        &self.polar_factors
    }
}
