//! Tabuchi-Yamamoto polar quadrature

// crate modules
use crate::error::{Error, Result};

// external crates
use serde::{Deserialize, Serialize};

/// Polar angles over one hemisphere, optimised for 2D MOC
///
/// Tabuchi and Yamamoto chose the angles and weights to minimise the error
/// of the Bickley-Naylor functions that appear when the polar direction is
/// integrated out analytically. Weights sum to 1 over the hemisphere.
///
/// ```rust
/// # use moctools_solver::PolarQuadrature;
/// let polar = PolarQuadrature::tabuchi_yamamoto(3).unwrap();
/// assert_eq!(polar.num_polar(), 3);
///
/// let total: f64 = polar.weights().iter().sum();
/// assert!((total - 1.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolarQuadrature {
    sin_theta: Vec<f64>,
    weights: Vec<f64>,
}

impl PolarQuadrature {
    /// Quadrature with 1, 2 or 3 angles
    pub fn tabuchi_yamamoto(num_polar: usize) -> Result<Self> {
        let (sin_theta, weights): (&[f64], &[f64]) = match num_polar {
            1 => (&[0.798184], &[1.0]),
            2 => (&[0.363900, 0.899900], &[0.212854, 0.787146]),
            3 => (
                &[0.166648, 0.537707, 0.932954],
                &[0.046233, 0.283619, 0.670148],
            ),
            n => return Err(Error::InvalidPolarAngles(n)),
        };

        Ok(Self {
            sin_theta: sin_theta.to_vec(),
            weights: weights.to_vec(),
        })
    }

    pub fn num_polar(&self) -> usize {
        self.sin_theta.len()
    }

    /// Sine of every polar angle, measured from the axial direction
    pub fn sin_theta(&self) -> &[f64] {
        &self.sin_theta
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Weight times sine of each angle
    ///
    /// Segment chords are projected lengths, so every tally picks up the
    /// sine of the polar angle.
    pub fn weighted_sines(&self) -> impl Iterator<Item = f64> + '_ {
        self.weights
            .iter()
            .zip(&self.sin_theta)
            .map(|(w, s)| w * s)
    }
}

impl Default for PolarQuadrature {
    fn default() -> Self {
        Self {
            sin_theta: vec![0.166648, 0.537707, 0.932954],
            weights: vec![0.046233, 0.283619, 0.670148],
        }
    }
}
