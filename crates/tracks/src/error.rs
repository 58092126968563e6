//! Result and Error types for moctools-tracks

/// Type alias for Result<T, tracks::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `moctools-tracks` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed input/output stream")]
    IOError(#[from] std::io::Error),

    #[error("failed to read or write binary track file")]
    FailedBinaryOp(#[from] Box<bincode::ErrorKind>),

    #[error("geometry error")]
    GeometryError(#[from] moctools_geometry::Error),

    #[error("number of azimuthal angles must be a positive multiple of 4, found {0}")]
    InvalidAzimuthalAngles(usize),

    #[error("track spacing must be positive, finite and not degenerate, found {0}")]
    InvalidTrackSpacing(f64),

    #[error("no track continues from the {end} of track {track}")]
    UnpairedTrack { track: usize, end: String },

    #[error("track {0} crossed too many region boundaries")]
    SegmentationStalled(usize),

    #[error("tracks have not been generated")]
    TracksNotGenerated,
}
