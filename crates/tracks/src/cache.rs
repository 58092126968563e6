//! On-disk storage of generated tracks

// crate modules
use crate::error::Result;
use crate::track::Track;

// standard library
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

// moctools modules
use moctools_utils::f;

// external crates
use serde::{Deserialize, Serialize};

/// Everything needed to skip track generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct TrackFile {
    pub signature: u64,
    pub num_azim: usize,
    pub spacing: f64,
    pub tracks: Vec<Track>,
    pub fsr_volumes: Vec<f64>,
}

impl TrackFile {
    /// Were these tracks generated with the same inputs?
    pub fn matches(&self, signature: u64, num_azim: usize, spacing: f64) -> bool {
        self.signature == signature && self.num_azim == num_azim && self.spacing == spacing
    }
}

/// Cache file name for a set of tracking parameters
pub(crate) fn file_name(signature: u64, num_azim: usize, spacing: f64) -> String {
    f!("tracks_{signature:016x}_{num_azim}a_{spacing}cm.bin")
}

pub(crate) fn write_tracks<P: AsRef<Path>>(path: P, file: &TrackFile) -> Result<()> {
    let f = BufWriter::new(File::create(path)?);
    Ok(bincode::serialize_into(f, file)?)
}

pub(crate) fn read_tracks<P: AsRef<Path>>(path: P) -> Result<TrackFile> {
    let f = BufReader::new(File::open(path)?);
    Ok(bincode::deserialize_from(f)?)
}
