//! Core mesh data structures.
//!
//! This module provides the borrowed input description of a mesh and the
//! half-edge representation the atlas pipeline works on.
//!
//! # Overview
//!
//! Callers describe geometry with an [`InputMesh`], a set of borrowed buffers
//! with explicit strides. [`build_mesh`] turns it into a [`HalfEdgeMesh`], a
//! triangle mesh stored as a half-edge (doubly-connected edge list) arena with
//! O(1) adjacency queries.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe `u32` index wrappers:
//! - [`VertexId`] - Identifies an input vertex
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`FaceId`] - Identifies a face
//! - [`ChartId`] - Identifies a chart of the atlas
//!
//! # Construction
//!
//! ```
//! use mesh_atlas::mesh::{build_mesh, IndexData, InputMesh};
//!
//! let positions = [
//!     [0.0f32, 0.0, 0.0],
//!     [1.0, 0.0, 0.0],
//!     [0.5, 1.0, 0.0],
//! ];
//! let indices = [0u16, 1, 2];
//! let input = InputMesh::from_positions(&positions, IndexData::U16(&indices));
//!
//! let mut warnings = Vec::new();
//! let mesh = build_mesh(&input, true, &mut |w| warnings.push(w)).unwrap();
//! assert!(warnings.is_empty());
//! assert!(mesh.is_valid());
//! ```

mod builder;
mod halfedge;
mod index;
mod input;

pub use builder::build_mesh;
pub use halfedge::{Face, HalfEdge, HalfEdgeMesh, Vertex};
pub(crate) use halfedge::DEGENERATE_AREA;
pub use index::{ChartId, FaceId, HalfEdgeId, VertexId};
pub use input::{IndexData, IndexFormat, InputMesh, VertexAttribute};
