//! JSON export of converged results

// crate modules
use crate::convergence::Convergence;
use crate::error::Result;

// standard library
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

// moctools modules
use moctools_geometry::MaterialId;

// external crates
use log::info;
use serde::{Deserialize, Serialize};

/// Results of one flat source region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionReport {
    pub fsr: usize,
    pub material: MaterialId,
    /// Numerical area from the tracks
    pub volume: f64,
    /// Scalar flux of every group
    pub flux: Vec<f64>,
    /// Volume integrated fission rate
    pub fission_rate: f64,
}

/// Snapshot of a solver for post-processing elsewhere
///
/// ```rust
/// # use moctools_solver::FluxReport;
/// let report = FluxReport {
///     sweep: "cpu".into(),
///     num_groups: 1,
///     keff: 1.0,
///     convergence: None,
///     regions: vec![],
/// };
///
/// let json = serde_json::to_string(&report).unwrap();
/// assert!(json.starts_with("{\"sweep\":\"cpu\""));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxReport {
    /// Name of the sweep that produced the results
    pub sweep: String,
    pub num_groups: usize,
    pub keff: f64,
    pub convergence: Option<Convergence>,
    pub regions: Vec<RegionReport>,
}

impl FluxReport {
    /// Write pretty printed JSON to a file
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        info!("Flux report written to {}", path.display());
        Ok(())
    }

    /// Read a report written by [write()](FluxReport::write)
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
