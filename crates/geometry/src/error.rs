//! Result and Error types for moctools-geometry

/// Type alias for Result<T, geometry::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `moctools-geometry` crate
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("material {0} is defined more than once")]
    DuplicateMaterial(u32),

    #[error("surface {0} is defined more than once")]
    DuplicateSurface(u32),

    #[error("cell {0} is defined more than once")]
    DuplicateCell(u32),

    #[error("universe {0} is defined more than once")]
    DuplicateUniverse(u32),

    #[error("halfspace must be +1 or -1, found {0}")]
    InvalidHalfspace(i32),

    #[error("surface {id} is invalid: {reason}")]
    InvalidSurface { id: u32, reason: String },

    #[error("material {id} is invalid: {reason}")]
    InvalidMaterial { id: u32, reason: String },

    #[error("lattice {id} is invalid: {reason}")]
    InvalidLattice { id: u32, reason: String },

    #[error("cell {cell} references undefined surface {surface}")]
    UndefinedSurface { cell: u32, surface: u32 },

    #[error("cell {cell} references undefined material {material}")]
    UndefinedMaterial { cell: u32, material: u32 },

    #[error("cell {cell} is filled with undefined universe {universe}")]
    UndefinedUniverse { cell: u32, universe: u32 },

    #[error("lattice {lattice} contains undefined universe {universe}")]
    UndefinedLatticeUniverse { lattice: u32, universe: u32 },

    #[error("no cells were defined in the root universe 0")]
    MissingRootUniverse,

    #[error("universe {0} eventually contains itself")]
    CircularFill(u32),

    #[error("expected two {axis}-plane boundaries, found {found}")]
    MissingBoundary { axis: char, found: usize },

    #[error("surface {0} has a boundary condition but is not an x-plane or y-plane")]
    UnsupportedBoundarySurface(u32),

    #[error("periodic boundaries on opposite sides must be paired ({0} axis)")]
    InconsistentPeriodicBoundary(char),

    #[error(
        "material {material} has {found} energy groups (expected {expected})"
    )]
    InconsistentEnergyGroups {
        material: u32,
        expected: usize,
        found: usize,
    },

    #[error("no materials were defined")]
    NoMaterials,

    #[error("no cell of universe {universe} contains ({x}, {y})")]
    Gap { universe: u32, x: f64, y: f64 },

    #[error("cells {first} and {second} of universe {universe} overlap at ({x}, {y})")]
    Overlap {
        universe: u32,
        first: u32,
        second: u32,
        x: f64,
        y: f64,
    },

    #[error("point ({x}, {y}) is outside the geometry")]
    PointOutsideGeometry { x: f64, y: f64 },

    #[error("geometry is not initialised")]
    NotInitialized,

    #[error("geometry is already initialised and can not be modified")]
    AlreadyInitialized,
}
