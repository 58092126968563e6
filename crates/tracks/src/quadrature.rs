//! Azimuthal angles, weights and spacings for cyclic tracking

// crate modules
use crate::error::{Error, Result};

// standard library
use std::f64::consts::{PI, TAU};

// external crates
use serde::{Deserialize, Serialize};

/// Largest number of tracks laid at any one angle
///
/// Spacings small enough to exceed this are rejected as degenerate rather
/// than attempting the allocation.
pub const MAX_TRACKS_PER_ANGLE: usize = 1_000_000;

/// Corrected azimuthal quadrature over `[0, pi)`
///
/// Requested angles are nudged so that an integer number of tracks crosses
/// each side of the domain, which makes every track end on the start of
/// another. Angles in `(pi/2, pi)` are the complements of the first
/// quadrant, so angle `i` and `num_angles() - 1 - i` share track counts.
///
/// ```rust
/// # use moctools_tracks::AzimuthalQuadrature;
/// let quadrature = AzimuthalQuadrature::new(4, 0.5, 1.0, 1.0).unwrap();
///
/// // a square domain gives exact diagonals
/// assert!((quadrature.phi(0) - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
/// assert_eq!(quadrature.num_x(0), 2);
/// assert_eq!(quadrature.num_y(0), 2);
/// assert!((quadrature.weight(0) - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AzimuthalQuadrature {
    num_azim: usize,
    phi: Vec<f64>,
    weights: Vec<f64>,
    spacings: Vec<f64>,
    num_x: Vec<usize>,
    num_y: Vec<usize>,
    width: f64,
    height: f64,
}

impl AzimuthalQuadrature {
    /// Quadrature for a `width` x `height` domain
    ///
    /// `num_azim` counts angles over the full circle and must be a positive
    /// multiple of 4. `spacing` is the requested distance between tracks,
    /// and must not need more than [MAX_TRACKS_PER_ANGLE] tracks per angle.
    pub fn new(num_azim: usize, spacing: f64, width: f64, height: f64) -> Result<Self> {
        if num_azim == 0 || num_azim % 4 != 0 {
            return Err(Error::InvalidAzimuthalAngles(num_azim));
        }
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(Error::InvalidTrackSpacing(spacing));
        }

        let num_angles = num_azim / 2;
        let mut phi = vec![0.0; num_angles];
        let mut spacings = vec![0.0; num_angles];
        let mut num_x = vec![0; num_angles];
        let mut num_y = vec![0; num_angles];

        for i in 0..num_azim / 4 {
            let requested = TAU / num_azim as f64 * (i as f64 + 0.5);
            let nx = (width / spacing * requested.sin().abs()).floor() + 1.0;
            let ny = (height / spacing * requested.cos().abs()).floor() + 1.0;
            if !(nx + ny).is_finite() || nx + ny > MAX_TRACKS_PER_ANGLE as f64 {
                return Err(Error::InvalidTrackSpacing(spacing));
            }
            let (nx, ny) = (nx as usize, ny as usize);
            let corrected = (height * nx as f64 / (width * ny as f64)).atan();

            let c = num_angles - 1 - i;
            phi[i] = corrected;
            phi[c] = PI - corrected;
            spacings[i] = width / nx as f64 * corrected.sin();
            spacings[c] = spacings[i];
            num_x[i] = nx;
            num_x[c] = nx;
            num_y[i] = ny;
            num_y[c] = ny;
        }

        let weights = (0..num_angles)
            .map(|i| {
                let lower = match i {
                    0 => 0.0,
                    _ => 0.5 * (phi[i - 1] + phi[i]),
                };
                let upper = match i + 1 == num_angles {
                    true => PI,
                    false => 0.5 * (phi[i] + phi[i + 1]),
                };
                (upper - lower) / PI
            })
            .collect();

        Ok(Self {
            num_azim,
            phi,
            weights,
            spacings,
            num_x,
            num_y,
            width,
            height,
        })
    }

    /// Number of angles over the full circle
    pub fn num_azim(&self) -> usize {
        self.num_azim
    }

    /// Number of track angles in `[0, pi)`
    pub fn num_angles(&self) -> usize {
        self.phi.len()
    }

    /// Corrected angle in radians
    pub fn phi(&self, i: usize) -> f64 {
        self.phi[i]
    }

    /// Fraction of `[0, pi)` represented by angle `i`, summing to 1
    pub fn weight(&self, i: usize) -> f64 {
        self.weights[i]
    }

    /// Corrected perpendicular distance between tracks
    pub fn spacing(&self, i: usize) -> f64 {
        self.spacings[i]
    }

    /// Tracks starting on the bottom (or top) edge
    pub fn num_x(&self, i: usize) -> usize {
        self.num_x[i]
    }

    /// Tracks starting on the left (or right) edge
    pub fn num_y(&self, i: usize) -> usize {
        self.num_y[i]
    }

    pub fn num_tracks(&self, i: usize) -> usize {
        self.num_x[i] + self.num_y[i]
    }

    /// Distance between track starts along x
    pub fn dx(&self, i: usize) -> f64 {
        self.width / self.num_x[i] as f64
    }

    /// Distance between track starts along y
    pub fn dy(&self, i: usize) -> f64 {
        self.height / self.num_y[i] as f64
    }

    /// Angle index of the mirror image `pi - phi`
    pub fn complement(&self, i: usize) -> usize {
        self.num_angles() - 1 - i
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        let quadrature = AzimuthalQuadrature::new(32, 0.05, 1.26, 2.52).unwrap();
        let total: f64 = (0..quadrature.num_angles())
            .map(|i| quadrature.weight(i))
            .sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn complements_mirror_the_first_quadrant() {
        let quadrature = AzimuthalQuadrature::new(16, 0.1, 3.0, 2.0).unwrap();
        for i in 0..4 {
            let c = quadrature.complement(i);
            assert!((quadrature.phi(c) - (PI - quadrature.phi(i))).abs() < 1e-14);
            assert_eq!(quadrature.num_tracks(c), quadrature.num_tracks(i));
            assert!((quadrature.weight(c) - quadrature.weight(i)).abs() < 1e-14);
        }
    }

    #[test]
    fn corrected_angles_stay_close() {
        let (num_azim, spacing) = (64, 0.02);
        let quadrature = AzimuthalQuadrature::new(num_azim, spacing, 1.0, 1.0).unwrap();
        for i in 0..num_azim / 4 {
            let requested = TAU / num_azim as f64 * (i as f64 + 0.5);
            assert!((quadrature.phi(i) - requested).abs() < TAU / num_azim as f64);
            assert!(quadrature.spacing(i) <= spacing);
        }
    }

    #[test]
    fn spacing_is_consistent_on_both_axes() {
        let quadrature = AzimuthalQuadrature::new(8, 0.1, 2.0, 1.0).unwrap();
        for i in 0..quadrature.num_angles() {
            let from_x = quadrature.dx(i) * quadrature.phi(i).sin();
            let from_y = quadrature.dy(i) * quadrature.phi(i).cos().abs();
            assert!((from_x - quadrature.spacing(i)).abs() < 1e-12);
            assert!((from_y - quadrature.spacing(i)).abs() < 1e-12);
        }
    }

    #[test]
    fn invalid_parameters() {
        assert!(matches!(
            AzimuthalQuadrature::new(6, 0.1, 1.0, 1.0),
            Err(Error::InvalidAzimuthalAngles(6))
        ));
        assert!(matches!(
            AzimuthalQuadrature::new(0, 0.1, 1.0, 1.0),
            Err(Error::InvalidAzimuthalAngles(0))
        ));
        assert!(matches!(
            AzimuthalQuadrature::new(4, -0.1, 1.0, 1.0),
            Err(Error::InvalidTrackSpacing(_))
        ));
        assert!(matches!(
            AzimuthalQuadrature::new(4, f64::INFINITY, 1.0, 1.0),
            Err(Error::InvalidTrackSpacing(_))
        ));
        assert!(matches!(
            AzimuthalQuadrature::new(4, 1e-300, 1.0, 1.0),
            Err(Error::InvalidTrackSpacing(_))
        ));
    }

    #[test]
    fn tiny_spacings_are_degenerate() {
        for spacing in [1e-300, 1e-9] {
            assert!(matches!(
                AzimuthalQuadrature::new(4, spacing, 1.0, 1.0),
                Err(Error::InvalidTrackSpacing(s)) if s == spacing
            ));
        }

        // just under the cap per angle is still accepted
        let spacing = 2.0 / MAX_TRACKS_PER_ANGLE as f64;
        let quadrature = AzimuthalQuadrature::new(4, spacing, 1.0, 1.0).unwrap();
        assert!(quadrature.num_tracks(0) <= MAX_TRACKS_PER_ANGLE);
    }
}
