//! Caller-owned input buffers.
//!
//! The atlas never takes ownership of vertex or index data. An [`InputMesh`]
//! borrows raw byte buffers with explicit strides, so interleaved vertex
//! layouts can be passed without copying.

use bytemuck::Pod;

/// A strided view over one vertex attribute stored as consecutive `f32`s.
#[derive(Debug, Clone, Copy)]
pub struct VertexAttribute<'a> {
    /// Raw bytes, starting at the first vertex's attribute.
    pub data: &'a [u8],
    /// Distance in bytes between consecutive vertices.
    pub stride: usize,
}

impl<'a> VertexAttribute<'a> {
    /// Create a view over raw bytes with the given byte stride.
    pub fn new(data: &'a [u8], stride: usize) -> Self {
        Self { data, stride }
    }

    /// Create a tightly packed view over a typed slice.
    pub fn from_slice<T: Pod>(slice: &'a [T]) -> Self {
        Self {
            data: bytemuck::cast_slice(slice),
            stride: std::mem::size_of::<T>(),
        }
    }

    /// Number of whole elements of `width` bytes reachable through this view.
    fn capacity(&self, width: usize) -> usize {
        if self.data.len() < width {
            0
        } else if self.stride == 0 {
            usize::MAX
        } else {
            (self.data.len() - width) / self.stride + 1
        }
    }

    fn bytes(&self, i: usize, width: usize) -> Option<&'a [u8]> {
        let start = i.checked_mul(self.stride)?;
        self.data.get(start..start.checked_add(width)?)
    }

    /// Read three floats for vertex `i`, or `None` past the end of the buffer.
    pub fn read_vec3(&self, i: usize) -> Option<[f32; 3]> {
        self.bytes(i, 12)
            .map(bytemuck::pod_read_unaligned::<[f32; 3]>)
    }

    /// Read two floats for vertex `i`, or `None` past the end of the buffer.
    pub fn read_vec2(&self, i: usize) -> Option<[f32; 2]> {
        self.bytes(i, 8)
            .map(bytemuck::pod_read_unaligned::<[f32; 2]>)
    }
}

/// Index buffer in either 16- or 32-bit format.
#[derive(Debug, Clone, Copy)]
pub enum IndexData<'a> {
    /// 16-bit indices.
    U16(&'a [u16]),
    /// 32-bit indices.
    U32(&'a [u32]),
}

/// Index format selector, for callers that describe buffers generically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    /// 16-bit indices.
    UInt16,
    /// 32-bit indices.
    UInt32,
}

impl<'a> IndexData<'a> {
    /// Interpret raw bytes according to `format`.
    ///
    /// Trailing bytes that do not form a whole index are ignored. Returns
    /// `None` if the bytes are not suitably aligned for the index type.
    pub fn from_bytes(bytes: &'a [u8], format: IndexFormat) -> Option<Self> {
        match format {
            IndexFormat::UInt16 => {
                let whole = bytes.len() / 2 * 2;
                bytemuck::try_cast_slice(&bytes[..whole]).ok().map(IndexData::U16)
            }
            IndexFormat::UInt32 => {
                let whole = bytes.len() / 4 * 4;
                bytemuck::try_cast_slice(&bytes[..whole]).ok().map(IndexData::U32)
            }
        }
    }

    /// The index format of this buffer.
    pub fn format(&self) -> IndexFormat {
        match self {
            IndexData::U16(_) => IndexFormat::UInt16,
            IndexData::U32(_) => IndexFormat::UInt32,
        }
    }

    /// Number of indices.
    pub fn len(&self) -> usize {
        match self {
            IndexData::U16(s) => s.len(),
            IndexData::U32(s) => s.len(),
        }
    }

    /// Check if there are no indices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index `i` widened to `u32`.
    #[inline]
    pub fn get(&self, i: usize) -> u32 {
        match self {
            IndexData::U16(s) => s[i] as u32,
            IndexData::U32(s) => s[i],
        }
    }
}

/// A triangle mesh described by borrowed buffers.
///
/// # Example
///
/// ```
/// use mesh_atlas::{IndexData, InputMesh};
///
/// let positions = [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
/// let indices = [0u16, 1, 2];
/// let mesh = InputMesh::from_positions(&positions, IndexData::U16(&indices));
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.face_count(), 1);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct InputMesh<'a> {
    /// Declared number of vertices.
    pub vertex_count: u32,
    /// Vertex positions (required).
    pub positions: VertexAttribute<'a>,
    /// Vertex normals (optional).
    pub normals: Option<VertexAttribute<'a>>,
    /// UV hints used to detect texture seams (optional).
    pub uvs: Option<VertexAttribute<'a>>,
    /// Triangle indices.
    pub indices: IndexData<'a>,
    /// Per-face material ids, `indices.len() / 3` long (optional).
    pub face_materials: Option<&'a [u16]>,
}

impl<'a> InputMesh<'a> {
    /// Describe a mesh from tightly packed positions.
    pub fn from_positions(positions: &'a [[f32; 3]], indices: IndexData<'a>) -> Self {
        Self {
            vertex_count: positions.len() as u32,
            positions: VertexAttribute::from_slice(positions),
            normals: None,
            uvs: None,
            indices,
            face_materials: None,
        }
    }

    /// Attach tightly packed vertex normals.
    pub fn with_normals(mut self, normals: &'a [[f32; 3]]) -> Self {
        self.normals = Some(VertexAttribute::from_slice(normals));
        self
    }

    /// Attach tightly packed UV hints.
    pub fn with_uvs(mut self, uvs: &'a [[f32; 2]]) -> Self {
        self.uvs = Some(VertexAttribute::from_slice(uvs));
        self
    }

    /// Attach per-face material ids.
    pub fn with_face_materials(mut self, materials: &'a [u16]) -> Self {
        self.face_materials = Some(materials);
        self
    }

    /// Number of usable vertices: the declared count, capped by what the
    /// position buffer actually holds.
    pub fn vertex_count(&self) -> usize {
        (self.vertex_count as usize).min(self.positions.capacity(12))
    }

    /// Number of whole triangles described by the index buffer.
    pub fn face_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Material of face `f`, or 0 if none were supplied.
    pub fn face_material(&self, f: usize) -> u16 {
        self.face_materials
            .and_then(|m| m.get(f).copied())
            .unwrap_or(0)
    }
}
