//! Wavefront OBJ format support.
//!
//! Loading goes through `tobj`; every object in the file is merged into one
//! set of buffers, and per-object materials become per-face material ids.
//! Saving writes the atlas output with one `vt` per output vertex and one
//! group per chart.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::MeshBuffers;
use crate::error::{AtlasError, Result};
use crate::output::OutputMesh;

/// Load a mesh from an OBJ file.
///
/// Faces are triangulated and attributes re-indexed so that positions,
/// normals and texture coordinates share one index.
///
/// # Example
///
/// ```no_run
/// use mesh_atlas::io::obj;
///
/// let buffers = obj::load("model.obj").unwrap();
/// println!("{} triangles", buffers.face_count());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<MeshBuffers> {
    let path = path.as_ref();
    let options = tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ..Default::default()
    };
    let (models, _materials) = tobj::load_obj(path, &options).map_err(|e| AtlasError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut buffers = MeshBuffers::default();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut materials = Vec::new();
    let mut has_normals = true;
    let mut has_uvs = true;
    let mut has_materials = false;

    for model in &models {
        let mesh = &model.mesh;
        let base = buffers.positions.len() as u32;
        let count = mesh.positions.len() / 3;

        buffers
            .positions
            .extend(mesh.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]));

        has_normals &= mesh.normals.len() == count * 3;
        if has_normals {
            normals.extend(mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]));
        }
        has_uvs &= mesh.texcoords.len() == count * 2;
        if has_uvs {
            uvs.extend(mesh.texcoords.chunks_exact(2).map(|t| [t[0], t[1]]));
        }

        buffers.indices.extend(mesh.indices.iter().map(|&i| base + i));

        let material = mesh.material_id.map_or(0, |m| m as u16);
        has_materials |= mesh.material_id.is_some();
        materials.extend(std::iter::repeat(material).take(mesh.indices.len() / 3));
    }

    if buffers.indices.is_empty() {
        return Err(AtlasError::LoadError {
            path: path.to_path_buf(),
            message: "OBJ file contains no triangles".to_string(),
        });
    }

    buffers.normals = has_normals.then_some(normals);
    buffers.uvs = has_uvs.then_some(uvs);
    buffers.face_materials = has_materials.then_some(materials);
    Ok(buffers)
}

/// Save a generated mesh as OBJ with atlas UVs.
///
/// Positions come from `buffers` through each output vertex's `xref`; texture
/// coordinates are the page UVs divided by the page size. Each chart is
/// written as its own group.
pub fn save_with_uvs<P: AsRef<Path>>(
    buffers: &MeshBuffers,
    output: &OutputMesh,
    width: u32,
    height: u32,
    path: P,
) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(AtlasError::invalid_param("width x height", format!("{}x{}", width, height), "atlas is empty"));
    }
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let save_err = |e: std::io::Error| AtlasError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    writeln!(writer, "# {} vertices, {} charts", output.vertex_count(), output.chart_count()).map_err(save_err)?;
    for v in &output.vertex_array {
        let p = buffers.positions.get(v.xref as usize).ok_or_else(|| AtlasError::SaveError {
            path: path.to_path_buf(),
            message: format!("vertex xref {} out of range", v.xref),
        })?;
        writeln!(writer, "v {} {} {}", p[0], p[1], p[2]).map_err(save_err)?;
    }
    for v in &output.vertex_array {
        writeln!(writer, "vt {} {}", v.uv[0] / width as f32, v.uv[1] / height as f32).map_err(save_err)?;
    }

    for (n, chart) in output.chart_array.iter().enumerate() {
        writeln!(writer, "g chart_{}", n).map_err(save_err)?;
        for tri in chart.index_array.chunks_exact(3) {
            let (a, b, c) = (tri[0] + 1, tri[1] + 1, tri[2] + 1);
            writeln!(writer, "f {a}/{a} {b}/{b} {c}/{c}").map_err(save_err)?;
        }
    }

    writer.flush().map_err(save_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Atlas, CharterOptions, PackerOptions};

    const QUAD_OBJ: &str = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 2/2 3/3 4/4
";

    #[test]
    fn test_load_quad() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quad.obj");
        std::fs::write(&path, QUAD_OBJ).unwrap();

        let buffers = load(&path).unwrap();
        assert_eq!(buffers.vertex_count(), 4);
        assert_eq!(buffers.face_count(), 2);
        assert!(buffers.uvs.is_some());
        assert!(buffers.normals.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load("does/not/exist.obj").unwrap_err();
        assert!(matches!(err, AtlasError::LoadError { .. }));
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quad.obj");
        std::fs::write(&path, QUAD_OBJ).unwrap();
        let buffers = load(&path).unwrap();

        let mut atlas = Atlas::new();
        atlas.add_mesh(&buffers.input()).unwrap();
        atlas.generate(&CharterOptions::default(), &PackerOptions::default()).unwrap();

        let out = dir.path().join("out.obj");
        save_with_uvs(&buffers, &atlas.meshes()[0], atlas.width(), atlas.height(), &out).unwrap();

        let reloaded = load(&out).unwrap();
        assert_eq!(reloaded.face_count(), 2);
        for uv in reloaded.uvs.unwrap() {
            assert!((0.0..=1.0).contains(&uv[0]) && (0.0..=1.0).contains(&uv[1]));
        }
    }

    #[test]
    fn test_save_empty_atlas() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_with_uvs(&MeshBuffers::default(), &OutputMesh::default(), 0, 0, dir.path().join("x.obj"));
        assert!(err.is_err());
    }
}
