//! # mesh-atlas
//!
//! Lightmap atlas generation for triangle meshes.
//!
//! mesh-atlas splits a mesh into charts of nearly flat, compact regions,
//! flattens every chart into the plane and packs the flattened charts into
//! one or more texel pages. The result is a new UV set suitable for baking
//! lightmaps or other per-texel data.
//!
//! ## Features
//!
//! - **Borrowed input**: vertex and index buffers with explicit strides,
//!   16- or 32-bit indices, optional normals, UV hints and materials
//! - **Half-edge mesh**: colocal welding and diagnostics for degenerate edges
//! - **Charting**: greedy region growing over five weighted metrics
//! - **Flattening**: least squares conformal maps, fold-free by splitting
//! - **Packing**: conservative rasterization, padding, block alignment,
//!   rotation and three sizing strategies
//! - **Parallel**: per-chart work runs on `rayon` with deterministic output
//!
//! ## Quick Start
//!
//! ```
//! use mesh_atlas::prelude::*;
//!
//! // A unit cube as 8 shared corners.
//! let positions = [
//!     [0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0],
//!     [0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0],
//! ];
//! let indices: [u32; 36] = [
//!     0, 2, 1, 0, 3, 2, 4, 5, 6, 4, 6, 7, 0, 1, 5, 0, 5, 4,
//!     2, 3, 7, 2, 7, 6, 1, 2, 6, 1, 6, 5, 0, 4, 7, 0, 7, 3,
//! ];
//!
//! let mut atlas = Atlas::new();
//! atlas.add_mesh(&InputMesh::from_positions(&positions, IndexData::U32(&indices))).unwrap();
//!
//! let packer = PackerOptions::default().with_padding(2).with_resolution(256);
//! atlas.generate(&CharterOptions::default(), &packer).unwrap();
//!
//! assert_eq!(atlas.num_charts(), 6);
//! let mesh = &atlas.meshes()[0];
//! for v in &mesh.vertex_array {
//!     assert!((v.xref as usize) < positions.len());
//! }
//! ```
//!
//! ## Warnings
//!
//! Degenerate input is reported, not rejected:
//!
//! ```
//! use mesh_atlas::prelude::*;
//!
//! // Corners 1 and 2 share a position.
//! let positions = [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
//! let indices = [0u16, 1, 2];
//!
//! let mut warnings = Vec::new();
//! let mut atlas = Atlas::new();
//! atlas
//!     .add_mesh_with(&InputMesh::from_positions(&positions, IndexData::U16(&indices)), false, |w| {
//!         warnings.push(string_for_enum(&w.kind))
//!     })
//!     .unwrap();
//! assert_eq!(warnings, ["ZeroLengthEdge"]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
mod atlas;
pub mod error;
pub mod io;
pub mod mesh;
mod output;
mod print;

pub use algo::charts::CharterOptions;
pub use algo::pack::{PackMethod, PackerOptions};
pub use algo::Progress;
pub use atlas::Atlas;
pub use error::{string_for_enum, AddMeshError, AddMeshWarning, AtlasError, EnumName, MeshWarning, Result};
pub use mesh::{IndexData, IndexFormat, InputMesh, VertexAttribute};
pub use output::{ChartInfo, OutputChart, OutputMesh, OutputVertex};
pub use print::{set_print, PrintFn};

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use mesh_atlas::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        string_for_enum, AddMeshError, AddMeshWarning, Atlas, AtlasError, CharterOptions, IndexData, InputMesh,
        MeshWarning, OutputMesh, PackMethod, PackerOptions, Result,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;
