//! Mesh file I/O.
//!
//! Loads meshes into owned [`MeshBuffers`], which lend an [`InputMesh`] to
//! [`Atlas::add_mesh`](crate::Atlas::add_mesh), and writes generated atlases
//! back out.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | Wavefront OBJ | `.obj` | ✓ | ✓ | Saved with generated UVs |
//! | STL | `.stl` | ✓ | ✗ | Binary and ASCII |
//! | PNG | `.png` | ✗ | ✓ | Chart layout preview |
//!
//! # Usage
//!
//! ```no_run
//! use mesh_atlas::io;
//! use mesh_atlas::{Atlas, CharterOptions, PackerOptions};
//!
//! let buffers = io::load("model.obj").unwrap();
//! let mut atlas = Atlas::new();
//! atlas.add_mesh(&buffers.input()).unwrap();
//! atlas.generate(&CharterOptions::default(), &PackerOptions::default()).unwrap();
//!
//! io::obj::save_with_uvs(&buffers, &atlas.meshes()[0], atlas.width(), atlas.height(), "out.obj").unwrap();
//! io::preview::save_page(&atlas, 0, "out.png").unwrap();
//! ```

pub mod obj;
pub mod preview;
pub mod stl;

use std::path::Path;

use crate::error::{AtlasError, Result};
use crate::mesh::{IndexData, InputMesh};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront OBJ format.
    Obj,
    /// STL (stereolithography) format.
    Stl,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "obj" => Some(Format::Obj),
            "stl" => Some(Format::Stl),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

/// Owned vertex and index buffers of a loaded mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    /// Vertex positions.
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals, if the file had them for every vertex.
    pub normals: Option<Vec<[f32; 3]>>,
    /// Vertex texture coordinates, if the file had them for every vertex.
    pub uvs: Option<Vec<[f32; 2]>>,
    /// Triangle indices.
    pub indices: Vec<u32>,
    /// Material id per face.
    pub face_materials: Option<Vec<u16>>,
}

impl MeshBuffers {
    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn face_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Borrow the buffers as an atlas input.
    pub fn input(&self) -> InputMesh<'_> {
        let mut input = InputMesh::from_positions(&self.positions, IndexData::U32(&self.indices));
        if let Some(normals) = &self.normals {
            input = input.with_normals(normals);
        }
        if let Some(uvs) = &self.uvs {
            input = input.with_uvs(uvs);
        }
        if let Some(materials) = &self.face_materials {
            input = input.with_face_materials(materials);
        }
        input
    }
}

fn unsupported(path: &Path) -> AtlasError {
    AtlasError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    }
}

/// Load a mesh from a file with automatic format detection.
///
/// The format is determined by the file extension.
pub fn load<P: AsRef<Path>>(path: P) -> Result<MeshBuffers> {
    let path = path.as_ref();
    let format = Format::from_path(path).ok_or_else(|| unsupported(path))?;

    let buffers = match format {
        Format::Obj => obj::load(path)?,
        Format::Stl => stl::load(path)?,
    };
    log::debug!(
        "loaded {}: {} vertices, {} faces",
        path.display(),
        buffers.vertex_count(),
        buffers.face_count()
    );
    Ok(buffers)
}
