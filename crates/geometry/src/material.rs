//! Multi-group cross-section bundles

// crate modules
use crate::error::{Error, Result};

// moctools modules
use moctools_utils::f;

// external crates
use log::warn;
use serde::{Deserialize, Serialize};

/// Unique material identifier
pub type MaterialId = u32;

/// Multi-group macroscopic cross sections (cm^-1)
///
/// The geometry never interprets these values, it only hands them to the
/// solver by id. The number of energy groups is the length of `sigma_t`.
///
/// Fission data may be left empty for non-fissile materials and are padded
/// with zeros when the material is added to a geometry. The scattering
/// matrix is stored row-major, `sigma_s[from * groups + to]`.
///
/// ```rust
/// # use moctools_geometry::Material;
/// let water = Material {
///     id: 2,
///     name: "water".into(),
///     sigma_t: vec![0.6, 2.0],
///     sigma_a: vec![0.01, 0.05],
///     sigma_s: vec![0.55, 0.04, 0.0, 1.95],
///     ..Default::default()
/// };
///
/// assert_eq!(water.num_groups(), 2);
/// assert_eq!(water.scatter(0, 1), 0.04);
/// assert!(!water.is_fissionable());
/// ```
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: MaterialId,
    #[serde(default)]
    pub name: String,
    pub sigma_t: Vec<f64>,
    #[serde(default)]
    pub sigma_a: Vec<f64>,
    #[serde(default)]
    pub sigma_f: Vec<f64>,
    #[serde(default)]
    pub nu_sigma_f: Vec<f64>,
    #[serde(default)]
    pub chi: Vec<f64>,
    #[serde(default)]
    pub sigma_s: Vec<f64>,
}

impl Material {
    /// Number of energy groups
    pub fn num_groups(&self) -> usize {
        self.sigma_t.len()
    }

    /// Scattering cross section from group `from` into group `to`
    pub fn scatter(&self, from: usize, to: usize) -> f64 {
        self.sigma_s[from * self.num_groups() + to]
    }

    /// Any group with a non-zero fission production?
    pub fn is_fissionable(&self) -> bool {
        self.nu_sigma_f.iter().any(|v| *v > 0.0)
    }

    /// Pad missing optional data with zeros and validate the result
    pub(crate) fn normalise(&mut self) -> Result<()> {
        let groups = self.num_groups();
        if groups == 0 {
            return Err(self.invalid("sigma_t is empty"));
        }

        for v in [
            &mut self.sigma_a,
            &mut self.sigma_f,
            &mut self.nu_sigma_f,
            &mut self.chi,
        ] {
            if v.is_empty() {
                v.resize(groups, 0.0);
            }
        }
        if self.sigma_s.is_empty() {
            self.sigma_s.resize(groups * groups, 0.0);
        }

        self.validate()?;
        self.check_sigma_t();
        Ok(())
    }

    /// Check every array is consistent with the number of groups
    pub fn validate(&self) -> Result<()> {
        let groups = self.num_groups();

        let vectors = [
            ("sigma_a", &self.sigma_a),
            ("sigma_f", &self.sigma_f),
            ("nu_sigma_f", &self.nu_sigma_f),
            ("chi", &self.chi),
        ];
        for (name, v) in vectors {
            if v.len() != groups {
                return Err(self.invalid(&f!(
                    "{name} has {} values, expected {groups}",
                    v.len()
                )));
            }
        }

        if self.sigma_s.len() != groups * groups {
            return Err(self.invalid(&f!(
                "sigma_s has {} values, expected {}",
                self.sigma_s.len(),
                groups * groups
            )));
        }

        if self.sigma_t.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(self.invalid("sigma_t must be positive in every group"));
        }

        let everything = vectors
            .iter()
            .flat_map(|(_, v)| v.iter())
            .chain(self.sigma_s.iter());
        for v in everything {
            if !(v.is_finite() && *v >= 0.0) {
                return Err(self.invalid("cross sections must be finite and non-negative"));
            }
        }

        Ok(())
    }

    /// Warn when sigma_t differs from absorption plus out-scatter
    fn check_sigma_t(&self) {
        let groups = self.num_groups();
        for g in 0..groups {
            let out_scatter: f64 = (0..groups).map(|to| self.scatter(g, to)).sum();
            let expected = self.sigma_a[g] + out_scatter;
            if (expected - self.sigma_t[g]).abs() > 1e-6 * self.sigma_t[g] {
                warn!(
                    "Material {} group {g}: sigma_t = {} but sigma_a + sigma_s = {expected}",
                    self.id, self.sigma_t[g]
                );
            }
        }
    }

    fn invalid(&self, reason: &str) -> Error {
        Error::InvalidMaterial {
            id: self.id,
            reason: reason.to_string(),
        }
    }
}
