//! Generated atlas output.
//!
//! One [`OutputMesh`] is emitted per added mesh. Its vertex array holds one
//! entry per (chart, input vertex) pair, so a vertex on a chart seam appears
//! once for every chart it belongs to, each copy with its own UV.

use std::collections::HashMap;

use crate::algo::pack::Placement;
use crate::algo::parameterize::{ChartParam, ParamMethod};
use crate::mesh::{HalfEdgeMesh, VertexId};

/// A vertex of the generated atlas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputVertex {
    /// Position in the page, in texels.
    pub uv: [f32; 2],
    /// Index of the originating input vertex.
    pub xref: u32,
    /// Page holding the vertex's chart.
    pub page: u32,
}

/// A chart of an output mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputChart {
    /// Indices into the mesh's vertex array, three per face.
    pub index_array: Vec<u32>,
    /// Input face indices, in the order of `index_array`.
    pub face_array: Vec<u32>,
    /// Page the chart was packed into.
    pub page: u32,
}

impl OutputChart {
    /// Number of faces in the chart.
    pub fn face_count(&self) -> usize {
        self.face_array.len()
    }
}

/// The atlas output for one added mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputMesh {
    /// Charts in generation order.
    pub chart_array: Vec<OutputChart>,
    /// Vertex indices in input face order: entry `3 * f + k` is corner `k`
    /// of input face `f`.
    pub index_array: Vec<u32>,
    /// Vertices, duplicated across chart seams.
    pub vertex_array: Vec<OutputVertex>,
}

impl OutputMesh {
    /// Number of charts.
    pub fn chart_count(&self) -> usize {
        self.chart_array.len()
    }

    /// Number of output vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertex_array.len()
    }

    /// Number of indices.
    pub fn index_count(&self) -> usize {
        self.index_array.len()
    }
}

/// Read-only statistics for one chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartInfo {
    /// Index of the added mesh the chart belongs to.
    pub mesh: u32,
    /// Number of faces.
    pub face_count: u32,
    /// Surface area in world units.
    pub area: f64,
    /// Area covered in the page, in texels.
    pub uv_area: f64,
    /// Page index.
    pub page: u32,
    /// Left edge of the padded chart rectangle.
    pub x: u32,
    /// Bottom edge of the padded chart rectangle.
    pub y: u32,
    /// Padded width in texels.
    pub width: u32,
    /// Padded height in texels.
    pub height: u32,
    /// Whether the chart was rotated by 90 degrees.
    pub rotated: bool,
    /// How the chart was flattened.
    pub method: ParamMethod,
}

/// Build the output of one mesh from its flattened charts and their
/// placements.
pub(crate) fn assemble_mesh(
    mesh: &HalfEdgeMesh,
    params: &[ChartParam],
    placements: &[Placement],
    scale: f64,
) -> OutputMesh {
    let mut output = OutputMesh {
        chart_array: Vec::with_capacity(params.len()),
        index_array: vec![0; mesh.num_faces() * 3],
        vertex_array: Vec::new(),
    };

    for (param, placement) in params.iter().zip(placements) {
        let mut local: HashMap<VertexId, u32> = HashMap::new();
        let mut chart = OutputChart {
            index_array: Vec::with_capacity(param.faces.len() * 3),
            face_array: Vec::with_capacity(param.faces.len()),
            page: placement.page,
        };

        for (&f, tri) in param.faces.iter().zip(&param.triangles) {
            let corners = mesh.face_triangle(f);
            for k in 0..3 {
                let v = corners[k];
                let index = *local.entry(v).or_insert_with(|| {
                    let uv = placement.transform(param.uvs.get(tri[k]), scale);
                    output.vertex_array.push(OutputVertex {
                        uv: [uv.x as f32, uv.y as f32],
                        xref: v.raw(),
                        page: placement.page,
                    });
                    (output.vertex_array.len() - 1) as u32
                });
                chart.index_array.push(index);
                output.index_array[f.index() * 3 + k] = index;
            }
            chart.face_array.push(f.raw());
        }
        output.chart_array.push(chart);
    }

    output
}

/// Per-chart statistics of one mesh.
pub(crate) fn chart_infos(mesh_index: usize, params: &[ChartParam], placements: &[Placement], scale: f64) -> Vec<ChartInfo> {
    params
        .iter()
        .zip(placements)
        .map(|(param, p)| ChartInfo {
            mesh: mesh_index as u32,
            face_count: param.faces.len() as u32,
            area: param.area,
            uv_area: param.uv_area() * scale * scale,
            page: p.page,
            x: p.x,
            y: p.y,
            width: p.width,
            height: p.height,
            rotated: p.rotated,
            method: param.method,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::charts::{build_charts, CharterOptions};
    use crate::algo::pack::{pack_charts, PackerOptions};
    use crate::algo::parameterize::parameterize_charts;
    use crate::algo::Progress;
    use crate::mesh::{build_mesh, IndexData, InputMesh};

    fn assemble(positions: &[[f32; 3]], indices: &[u32]) -> OutputMesh {
        let input = InputMesh::from_positions(positions, IndexData::U32(indices));
        let mesh = build_mesh(&input, true, &mut |_| {}).unwrap();
        let charts = build_charts(&mesh, &CharterOptions::default(), &Progress::none());
        let params = parameterize_charts(&mesh, &charts, false);
        let packed = pack_charts(&params, &PackerOptions::default(), &Progress::none()).unwrap();
        assemble_mesh(&mesh, &params, &packed.placements, packed.scale)
    }

    #[test]
    fn test_single_triangle() {
        let out = assemble(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], &[0, 1, 2]);
        assert_eq!(out.chart_count(), 1);
        assert_eq!(out.vertex_count(), 3);
        assert_eq!(out.index_array, vec![0, 1, 2]);
        let mut xrefs: Vec<u32> = out.vertex_array.iter().map(|v| v.xref).collect();
        xrefs.sort_unstable();
        assert_eq!(xrefs, vec![0, 1, 2]);
        assert_eq!(out.chart_array[0].face_array, vec![0]);
    }

    #[test]
    fn test_seam_vertices_are_duplicated() {
        // Two faces folded at a right angle along edge (0, 1) split into two
        // charts; the shared vertices appear once per chart.
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let indices = [0, 1, 2, 1, 0, 3];
        let out = assemble(&positions, &indices);
        assert_eq!(out.chart_count(), 2);
        assert_eq!(out.vertex_count(), 6);

        for v in &out.vertex_array {
            assert!((v.xref as usize) < positions.len());
        }
        for (f, corners) in indices.chunks(3).enumerate() {
            for k in 0..3 {
                let v = out.vertex_array[out.index_array[f * 3 + k] as usize];
                assert_eq!(v.xref, corners[k]);
            }
        }
    }

    #[test]
    fn test_uvs_inside_page() {
        let positions = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        let out = assemble(&positions, &[0, 1, 2, 0, 2, 3]);
        for v in &out.vertex_array {
            assert!(v.uv[0] >= 0.0 && v.uv[0] <= 512.0);
            assert!(v.uv[1] >= 0.0 && v.uv[1] <= 512.0);
        }
    }
}
