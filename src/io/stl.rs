//! STL (stereolithography) format support.
//!
//! STL stores three corners per facet. `stl_io` merges bit-identical corners
//! while reading, so the loaded mesh shares vertices between facets. Facet
//! normals are discarded; the atlas derives vertex normals itself.

use std::fs::File;
use std::path::Path;

use super::MeshBuffers;
use crate::error::{AtlasError, Result};

/// Load a mesh from an STL file.
///
/// Automatically detects binary vs ASCII format.
///
/// # Example
///
/// ```no_run
/// use mesh_atlas::io::stl;
///
/// let buffers = stl::load("model.stl").unwrap();
/// println!("{} triangles", buffers.face_count());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<MeshBuffers> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    let stl = stl_io::read_stl(&mut file).map_err(|e| AtlasError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if stl.faces.is_empty() {
        return Err(AtlasError::LoadError {
            path: path.to_path_buf(),
            message: "STL file contains no triangles".to_string(),
        });
    }

    let positions = stl.vertices.iter().map(|v| [v[0], v[1], v[2]]).collect();
    let indices = stl
        .faces
        .iter()
        .flat_map(|tri| tri.vertices.iter().map(|&i| i as u32))
        .collect();

    Ok(MeshBuffers {
        positions,
        indices,
        ..Default::default()
    })
}
