//! Error types for mesh-atlas.
//!
//! Two tiers exist. [`AddMeshError`] rejects an input mesh outright and
//! [`AddMeshWarning`] reports degenerate topology that is tolerated. Everything
//! else (file I/O, flattening failures, bad parameters) is an [`AtlasError`].

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`AtlasError`].
pub type Result<T> = std::result::Result<T, AtlasError>;

/// Fatal, per-mesh errors returned by [`Atlas::add_mesh`](crate::Atlas::add_mesh).
///
/// A mesh rejected with one of these contributes nothing to the atlas.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddMeshError {
    /// An index refers past the end of the vertex buffer.
    #[error("index {index} is out of range")]
    IndexOutOfRange {
        /// The offending index value.
        index: u32,
    },

    /// The index count is not a multiple of three.
    #[error("index count {count} is not evenly divisible by 3")]
    InvalidIndexCount {
        /// The number of indices supplied.
        count: u32,
    },
}

impl AddMeshError {
    /// Short name of the error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            AddMeshError::IndexOutOfRange { .. } => "IndexOutOfRange",
            AddMeshError::InvalidIndexCount { .. } => "InvalidIndexCount",
        }
    }
}

/// Advisory warnings raised while building the half-edge mesh.
///
/// Each warning is delivered with the face index and the two input vertex
/// indices of the offending edge; mesh construction always continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddMeshWarning {
    /// The directed edge was already added by an earlier face (non-manifold
    /// or inconsistently wound geometry). The edge is left unlinked.
    AlreadyAddedEdge,
    /// Both endpoints fall into the same colocal group although their
    /// positions do not compare as equal (for example NaN coordinates).
    DegenerateColocalEdge,
    /// Both endpoints are the same input vertex.
    DegenerateEdge,
    /// The same undirected edge appears twice in one face.
    DuplicateEdge,
    /// The endpoints are distinct vertices at the same position.
    ZeroLengthEdge,
}

impl AddMeshWarning {
    /// Short name of the warning kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            AddMeshWarning::AlreadyAddedEdge => "AlreadyAddedEdge",
            AddMeshWarning::DegenerateColocalEdge => "DegenerateColocalEdge",
            AddMeshWarning::DegenerateEdge => "DegenerateEdge",
            AddMeshWarning::DuplicateEdge => "DuplicateEdge",
            AddMeshWarning::ZeroLengthEdge => "ZeroLengthEdge",
        }
    }
}

impl fmt::Display for AddMeshWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A warning together with the face and edge it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshWarning {
    /// What went wrong.
    pub kind: AddMeshWarning,
    /// Face index within the added mesh.
    pub face: u32,
    /// First input vertex of the edge.
    pub index0: u32,
    /// Second input vertex of the edge.
    pub index1: u32,
}

impl fmt::Display for MeshWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on face {} (vertices {}, {})",
            self.kind, self.face, self.index0, self.index1
        )
    }
}

/// Values with a stable diagnostic name.
pub trait EnumName {
    /// The name of this value.
    fn enum_name(&self) -> &'static str;
}

impl EnumName for AddMeshError {
    fn enum_name(&self) -> &'static str {
        self.as_str()
    }
}

impl EnumName for AddMeshWarning {
    fn enum_name(&self) -> &'static str {
        self.as_str()
    }
}

impl EnumName for std::result::Result<(), AddMeshError> {
    fn enum_name(&self) -> &'static str {
        match self {
            Ok(()) => "Success",
            Err(e) => e.as_str(),
        }
    }
}

/// Name of an error, warning or add-mesh result, for diagnostics.
///
/// ```
/// use mesh_atlas::{string_for_enum, AddMeshError, AddMeshWarning};
///
/// assert_eq!(string_for_enum(&AddMeshWarning::ZeroLengthEdge), "ZeroLengthEdge");
/// assert_eq!(string_for_enum(&AddMeshError::InvalidIndexCount { count: 4 }), "InvalidIndexCount");
/// assert_eq!(string_for_enum(&Ok::<(), AddMeshError>(())), "Success");
/// ```
pub fn string_for_enum<E: EnumName + ?Sized>(value: &E) -> &'static str {
    value.enum_name()
}

/// Errors that can occur outside of mesh admission.
#[derive(Error, Debug)]
pub enum AtlasError {
    /// The mesh was rejected by the builder.
    #[error("mesh rejected: {0}")]
    AddMesh(#[from] AddMeshError),

    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A chart has no boundary and cannot be flattened by LSCM.
    #[error("chart has no boundary")]
    NoBoundary,

    /// A chart has no triangle with non-zero area.
    #[error("chart has no non-degenerate triangles")]
    DegenerateChart,

    /// Algorithm failed to converge.
    #[error("algorithm failed to converge after {iterations} iterations")]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving a file.
    #[error("failed to save {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// The atlas has not been generated yet.
    #[error("atlas has not been generated")]
    NotGenerated,

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl AtlasError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        AtlasError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}
