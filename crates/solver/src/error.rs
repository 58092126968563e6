//! Result and Error types for moctools-solver

/// Type alias for Result<T, solver::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `moctools-solver` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed input/output stream")]
    IOError(#[from] std::io::Error),

    #[error("failed to write flux report")]
    FailedJsonOp(#[from] serde_json::Error),

    #[error("geometry error")]
    GeometryError(#[from] moctools_geometry::Error),

    #[error("track error")]
    TrackError(#[from] moctools_tracks::Error),

    #[error("tracks were generated for a different geometry")]
    GeometryMismatch,

    #[error("tracks have not been generated")]
    TracksNotGenerated,

    #[error("number of threads must be at least 1")]
    InvalidThreadCount,

    #[error("convergence threshold must be positive and finite, found {0}")]
    InvalidThreshold(f64),

    #[error("number of polar angles must be 1, 2 or 3, found {0}")]
    InvalidPolarAngles(usize),

    #[error("flat source region {0} does not exist")]
    UnknownFsr(usize),

    #[error("material {0} is not used by any flat source region")]
    UnknownMaterial(u32),

    #[error("energy group {group} does not exist, problem has {groups}")]
    InvalidGroup { group: usize, groups: usize },

    #[error("fixed source must be finite and non-negative, found {0}")]
    InvalidFixedSource(f64),

    #[error("no fixed source and no fissionable material, nothing drives the flux")]
    NoSource,

    #[error("failed to build thread pool")]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),

    #[cfg(feature = "gpu")]
    #[error("no compatible gpu adapter found")]
    NoAdapter,

    #[cfg(feature = "gpu")]
    #[error("failed to create gpu device")]
    DeviceError(#[from] wgpu::RequestDeviceError),

    #[cfg(feature = "gpu")]
    #[error("failed to read back gpu buffer: {0}")]
    BufferError(String),
}
