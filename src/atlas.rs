//! The top-level atlas handle.

use std::ops::Range;

use crate::algo::charts::{build_charts, CharterOptions};
use crate::algo::pack::{pack_charts, PackerOptions};
use crate::algo::parameterize::{parameterize_charts, ChartParam};
use crate::algo::Progress;
use crate::error::{AddMeshError, MeshWarning, Result};
use crate::mesh::{build_mesh, HalfEdgeMesh, InputMesh};
use crate::output::{assemble_mesh, chart_infos, ChartInfo, OutputMesh};
use crate::print::status;

/// A lightmap atlas under construction.
///
/// Add one or more meshes, call [`generate`](Atlas::generate), then read the
/// page size and the [`OutputMesh`] of every added mesh. All output is owned
/// by the atlas and released when it is dropped.
///
/// # Example
///
/// ```
/// use mesh_atlas::{Atlas, CharterOptions, IndexData, InputMesh, PackerOptions};
///
/// let positions = [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
/// let indices = [0u16, 1, 2, 0, 2, 3];
///
/// let mut atlas = Atlas::new();
/// atlas.add_mesh(&InputMesh::from_positions(&positions, IndexData::U16(&indices))).unwrap();
/// atlas.generate(&CharterOptions::default(), &PackerOptions::default()).unwrap();
///
/// assert_eq!(atlas.num_charts(), 1);
/// assert_eq!(atlas.meshes()[0].index_array.len(), 6);
/// assert!(atlas.width() > 0 && atlas.height() > 0);
/// ```
#[derive(Debug, Default)]
pub struct Atlas {
    meshes: Vec<HalfEdgeMesh>,
    outputs: Vec<OutputMesh>,
    charts: Vec<ChartInfo>,
    width: u32,
    height: u32,
    page_count: u32,
    utilization: f64,
    generated: bool,
}

impl Atlas {
    /// Create an empty atlas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mesh, welding colocal vertices and discarding warnings.
    pub fn add_mesh(&mut self, input: &InputMesh<'_>) -> std::result::Result<(), AddMeshError> {
        self.add_mesh_with(input, true, |_| {})
    }

    /// Add a mesh, passing every warning to `on_warning`.
    ///
    /// With `use_colocal`, vertices at bit-identical positions are treated as
    /// one vertex for adjacency. A rejected mesh leaves the atlas unchanged.
    /// Adding a mesh to a generated atlas discards the generated output.
    pub fn add_mesh_with<F>(
        &mut self,
        input: &InputMesh<'_>,
        use_colocal: bool,
        mut on_warning: F,
    ) -> std::result::Result<(), AddMeshError>
    where
        F: FnMut(&MeshWarning),
    {
        let index = self.meshes.len();
        let mut warnings = 0usize;
        let mesh = build_mesh(input, use_colocal, &mut |w| {
            warnings += 1;
            log::debug!("mesh {}: {}", index, w);
            on_warning(&w);
        })
        .map_err(|e| {
            log::warn!("mesh {} rejected: {}", index, e);
            e
        })?;

        status!(
            "Added mesh {}: {} vertices, {} faces, {} warnings",
            index,
            mesh.num_vertices(),
            mesh.num_faces(),
            warnings
        );

        self.clear_output();
        self.meshes.push(mesh);
        Ok(())
    }

    /// Number of meshes added so far.
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Run the full pipeline over all added meshes.
    ///
    /// Calling it again discards the previous result and rebuilds from the
    /// added meshes; identical options give identical output.
    pub fn generate(&mut self, charter: &CharterOptions, packer: &PackerOptions) -> Result<()> {
        self.generate_with_progress(charter, packer, &Progress::none())
    }

    /// Like [`generate`](Atlas::generate), reporting progress per stage.
    pub fn generate_with_progress(
        &mut self,
        charter: &CharterOptions,
        packer: &PackerOptions,
        progress: &Progress,
    ) -> Result<()> {
        charter.validate()?;
        packer.validate()?;
        self.clear_output();

        // Charts never span meshes; each mesh is charted and flattened alone.
        let mut params: Vec<ChartParam> = Vec::new();
        let mut ranges: Vec<Range<usize>> = Vec::with_capacity(self.meshes.len());
        for (i, mesh) in self.meshes.iter().enumerate() {
            let charts = build_charts(mesh, charter, progress);
            status!("Mesh {}: {} charts", i, charts.len());

            progress.report(i, self.meshes.len(), "Parameterizing charts");
            let start = params.len();
            params.extend(parameterize_charts(mesh, &charts, charter.parallel));
            if params.len() - start > charts.len() {
                status!("Mesh {}: split into {} charts to avoid fold-over", i, params.len() - start);
            }
            ranges.push(start..params.len());
        }

        let packed = pack_charts(&params, packer, progress)?;

        for (i, (mesh, range)) in self.meshes.iter().zip(&ranges).enumerate() {
            progress.report(i, self.meshes.len(), "Building output meshes");
            let placements = &packed.placements[range.clone()];
            self.outputs.push(assemble_mesh(mesh, &params[range.clone()], placements, packed.scale));
            self.charts.extend(chart_infos(i, &params[range.clone()], placements, packed.scale));
        }

        self.width = packed.width;
        self.height = packed.height;
        self.page_count = packed.page_count;
        self.utilization = packed.utilization();
        self.generated = true;

        status!(
            "Packed {} charts into {} page(s) of {}x{} ({:.1}% used)",
            self.charts.len(),
            self.page_count,
            self.width,
            self.height,
            self.utilization * 100.0
        );
        Ok(())
    }

    fn clear_output(&mut self) {
        self.outputs.clear();
        self.charts.clear();
        self.width = 0;
        self.height = 0;
        self.page_count = 0;
        self.utilization = 0.0;
        self.generated = false;
    }

    /// Whether output is available.
    pub fn is_generated(&self) -> bool {
        self.generated
    }

    /// Page width in texels, 0 before generation.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Page height in texels, 0 before generation.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total number of charts over all meshes.
    pub fn num_charts(&self) -> usize {
        self.charts.len()
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// One output mesh per added mesh, in the order they were added.
    pub fn meshes(&self) -> &[OutputMesh] {
        &self.outputs
    }

    /// Statistics for every chart, ordered by mesh then chart.
    pub fn charts(&self) -> &[ChartInfo] {
        &self.charts
    }

    /// Fraction of page texels covered by charts.
    pub fn utilization(&self) -> f64 {
        self.utilization
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AddMeshWarning;
    use crate::mesh::IndexData;

    const QUAD: [[f32; 3]; 4] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
    const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

    #[test]
    fn test_empty_atlas() {
        let mut atlas = Atlas::new();
        assert_eq!(atlas.width(), 0);
        assert!(atlas.meshes().is_empty());
        atlas.generate(&CharterOptions::default(), &PackerOptions::default()).unwrap();
        assert!(atlas.is_generated());
        assert_eq!(atlas.num_charts(), 0);
        assert_eq!(atlas.page_count(), 0);
    }

    #[test]
    fn test_rejected_mesh_adds_nothing() {
        let mut atlas = Atlas::new();
        let indices = [0u32, 1, 2, 3];
        let input = InputMesh::from_positions(&QUAD, IndexData::U32(&indices));
        assert_eq!(
            atlas.add_mesh(&input),
            Err(AddMeshError::InvalidIndexCount { count: 4 })
        );
        assert_eq!(atlas.mesh_count(), 0);
    }

    #[test]
    fn test_warnings_reach_callback() {
        let positions = [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let indices = [0u32, 1, 2];
        let input = InputMesh::from_positions(&positions, IndexData::U32(&indices));

        let mut seen = Vec::new();
        let mut atlas = Atlas::new();
        atlas.add_mesh_with(&input, false, |w| seen.push(*w)).unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].kind, AddMeshWarning::ZeroLengthEdge);
        assert_eq!((seen[0].face, seen[0].index0, seen[0].index1), (0, 1, 2));
    }

    #[test]
    fn test_add_after_generate_clears_output() {
        let input = InputMesh::from_positions(&QUAD, IndexData::U32(&QUAD_INDICES));
        let mut atlas = Atlas::new();
        atlas.add_mesh(&input).unwrap();
        atlas.generate(&CharterOptions::default(), &PackerOptions::default()).unwrap();
        assert_eq!(atlas.meshes().len(), 1);

        atlas.add_mesh(&input).unwrap();
        assert!(!atlas.is_generated());
        assert!(atlas.meshes().is_empty());

        atlas.generate(&CharterOptions::default(), &PackerOptions::default()).unwrap();
        assert_eq!(atlas.meshes().len(), 2);
        assert_eq!(atlas.num_charts(), 2);
        assert_eq!(atlas.charts()[1].mesh, 1);
    }

    #[test]
    fn test_regenerate_is_identical() {
        let input = InputMesh::from_positions(&QUAD, IndexData::U32(&QUAD_INDICES));
        let mut atlas = Atlas::new();
        atlas.add_mesh(&input).unwrap();
        atlas.generate(&CharterOptions::default(), &PackerOptions::default()).unwrap();
        let first = atlas.meshes().to_vec();
        atlas.generate(&CharterOptions::default(), &PackerOptions::default()).unwrap();
        assert_eq!(atlas.meshes(), &first[..]);
    }

    #[test]
    fn test_invalid_options() {
        let mut atlas = Atlas::new();
        let bad = PackerOptions::default().with_resolution(0);
        assert!(atlas.generate(&CharterOptions::default(), &bad).is_err());
        assert!(!atlas.is_generated());
    }
}
