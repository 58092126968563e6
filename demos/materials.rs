//! Two group cross sections shared by the demos
//!
//! Collapsed by hand to resemble a light water reactor, good enough to show
//! realistic spectra without a cross-section library.

use moctools::geometry::{Material, MaterialId};

pub fn uo2(id: MaterialId) -> Material {
    Material {
        id,
        name: "UO2".into(),
        sigma_t: vec![0.40, 0.95],
        sigma_a: vec![0.015, 0.10],
        sigma_f: vec![0.004, 0.074],
        nu_sigma_f: vec![0.01, 0.18],
        chi: vec![1.0, 0.0],
        sigma_s: vec![0.37, 0.015, 0.0, 0.85],
    }
}

pub fn water(id: MaterialId) -> Material {
    Material {
        id,
        name: "Water".into(),
        sigma_t: vec![0.60, 2.00],
        sigma_a: vec![0.001, 0.02],
        sigma_s: vec![0.55, 0.049, 0.0, 1.98],
        ..Default::default()
    }
}
