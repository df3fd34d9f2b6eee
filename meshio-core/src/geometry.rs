//! Geometry attribute model populated by the STL and OBJ codecs
use crate::error::{MeshError, Result};
use crate::vector::{Vec3, Vec4, Vector};

/// Per-object vertex attributes and per-face index streams.
///
/// Each index stream is independent: a position may pair with different
/// texture or normal values across faces. An empty index stream means the
/// attribute is absent for every face of the object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryData {
    pub positions: Vec<Vec4<f32>>,
    pub normals: Vec<Vec3<f32>>,
    pub tex_coords: Vec<Vec3<f32>>,
    pub colors: Vec<Vec3<f32>>,
    pub param_space_vertices: Vec<Vec3<f32>>,
    pub tri_vertex_indices: Vec<Vec3<u32>>,
    pub quad_vertex_indices: Vec<Vec4<u32>>,
    pub tri_texture_indices: Vec<Vec3<u32>>,
    pub quad_texture_indices: Vec<Vec4<u32>>,
    pub tri_normal_indices: Vec<Vec3<u32>>,
    pub quad_normal_indices: Vec<Vec4<u32>>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty every sequence, releasing their storage
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Verify every index references an existing attribute entry
    pub fn check_indices(&self) -> Result<()> {
        let positions = self.positions.len();
        let tex_coords = self.tex_coords.len();
        let normals = self.normals.len();

        check_stream("triangle vertex", &self.tri_vertex_indices, positions)?;
        check_stream("quad vertex", &self.quad_vertex_indices, positions)?;
        check_stream("triangle texture", &self.tri_texture_indices, tex_coords)?;
        check_stream("quad texture", &self.quad_texture_indices, tex_coords)?;
        check_stream("triangle normal", &self.tri_normal_indices, normals)?;
        check_stream("quad normal", &self.quad_normal_indices, normals)?;
        Ok(())
    }

    /// Move `other` onto the end of `self`, shifting its indices past the
    /// entries already present.
    pub fn append(&mut self, other: GeometryData) -> Result<()> {
        let position = index_base(self.positions.len())?;
        let texture = index_base(self.tex_coords.len())?;
        let normal = index_base(self.normals.len())?;

        shift_onto(&mut self.tri_vertex_indices, other.tri_vertex_indices, position);
        shift_onto(&mut self.quad_vertex_indices, other.quad_vertex_indices, position);
        shift_onto(&mut self.tri_texture_indices, other.tri_texture_indices, texture);
        shift_onto(&mut self.quad_texture_indices, other.quad_texture_indices, texture);
        shift_onto(&mut self.tri_normal_indices, other.tri_normal_indices, normal);
        shift_onto(&mut self.quad_normal_indices, other.quad_normal_indices, normal);

        self.positions.extend(other.positions);
        self.normals.extend(other.normals);
        self.tex_coords.extend(other.tex_coords);
        self.colors.extend(other.colors);
        self.param_space_vertices.extend(other.param_space_vertices);
        Ok(())
    }
}

fn index_base(len: usize) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| MeshError::format(format!("{len} entries exceed the 32-bit index range")))
}

fn shift_onto<const N: usize>(dst: &mut Vec<Vector<u32, N>>, src: Vec<Vector<u32, N>>, by: u32) {
    let by = Vector::from_array([by; N]);
    dst.extend(src.into_iter().map(|face| face + by));
}

fn check_stream<const N: usize>(label: &str, indices: &[Vector<u32, N>], len: usize) -> Result<()> {
    let out_of_range = indices
        .iter()
        .flat_map(|face| face.iter().copied())
        .find(|&i| i as usize >= len);
    match out_of_range {
        Some(bad) => Err(MeshError::format(format!(
            "{label} index {bad} out of range for {len} entries"
        ))),
        None => Ok(()),
    }
}

/// One STL facet: a face normal plus three corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Facet {
    pub normal: Vec3<f32>,
    pub vertices: [Vec4<f32>; 3],
}

impl Facet {
    /// Calculate the face normal from the facet's vertices
    pub fn calculate_normal(&self) -> Vec3<f32> {
        face_normal(self.vertices[0], self.vertices[1], self.vertices[2])
    }
}

/// Unit normal of the triangle `a, b, c`, or zero when degenerate
pub fn face_normal(a: Vec4<f32>, b: Vec4<f32>, c: Vec4<f32>) -> Vec3<f32> {
    let edge1 = b.xyz() - a.xyz();
    let edge2 = c.xyz() - a.xyz();
    edge1
        .cross(&edge2)
        .as_nalgebra()
        .try_normalize(f32::EPSILON)
        .map(Vec3::from)
        .unwrap_or_default()
}

/// Triangle soup read from or written to STL.
///
/// `positions` holds one entry per corner (three per facet) and `normals`
/// one entry per facet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StlData {
    pub geometry: GeometryData,
}

impl StlData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(triangles: usize) -> Self {
        let mut data = Self::new();
        data.geometry.positions.reserve(3 * triangles);
        data.geometry.normals.reserve(triangles);
        data
    }

    /// Preallocate `triangles` facets at the origin with zero normals
    pub fn resize(&mut self, triangles: usize) {
        self.geometry
            .positions
            .resize(3 * triangles, Vec4::new(0.0, 0.0, 0.0, 1.0));
        self.geometry.normals.resize(triangles, Vec3::zeros());
    }

    pub fn push_facet(&mut self, normal: Vec3<f32>, vertices: [Vec4<f32>; 3]) {
        self.geometry.normals.push(normal);
        self.geometry.positions.extend(vertices);
    }

    pub fn triangle_count(&self) -> usize {
        self.geometry.normals.len()
    }

    pub fn positions(&self) -> &[Vec4<f32>] {
        &self.geometry.positions
    }

    pub fn normals(&self) -> &[Vec3<f32>] {
        &self.geometry.normals
    }

    /// Whether the corner/facet counts line up
    pub fn is_consistent(&self) -> bool {
        self.geometry.positions.len() == 3 * self.geometry.normals.len()
    }

    pub fn facets(&self) -> impl Iterator<Item = Facet> + '_ {
        self.geometry
            .normals
            .iter()
            .zip(self.geometry.positions.chunks_exact(3))
            .map(|(normal, corners)| Facet {
                normal: *normal,
                vertices: [corners[0], corners[1], corners[2]],
            })
    }

    pub fn clear(&mut self) {
        self.geometry.clear();
    }

    /// Axis-aligned unit cube spanning (0,0,0)-(1,1,1), 12 outward facets
    pub fn unit_cube() -> Self {
        const FACETS: [([f32; 3], [[f32; 3]; 3]); 12] = [
            ([0.0, 0.0, -1.0], [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]]),
            ([0.0, 0.0, -1.0], [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]]),
            ([1.0, 0.0, 0.0], [[1.0, 0.0, 0.0], [1.0, 1.0, 1.0], [1.0, 0.0, 1.0]]),
            ([1.0, 0.0, 0.0], [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0]]),
            ([0.0, 0.0, 1.0], [[1.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 0.0, 1.0]]),
            ([0.0, 0.0, 1.0], [[1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]]),
            ([-1.0, 0.0, 0.0], [[0.0, 0.0, 0.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0]]),
            ([-1.0, 0.0, 0.0], [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0]]),
            ([0.0, 1.0, 0.0], [[0.0, 1.0, 0.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0]]),
            ([0.0, 1.0, 0.0], [[0.0, 1.0, 0.0], [0.0, 1.0, 1.0], [1.0, 1.0, 1.0]]),
            ([0.0, -1.0, 0.0], [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0]]),
            ([0.0, -1.0, 0.0], [[0.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]]),
        ];

        let mut cube = Self::with_capacity(FACETS.len());
        for (normal, corners) in FACETS {
            cube.push_facet(
                Vec3::from(normal),
                corners.map(|[x, y, z]| Vec4::new(x, y, z, 1.0)),
            );
        }
        cube
    }
}

/// A named, indexed sub-mesh of an OBJ document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjAttribute {
    pub name: String,
    pub geometry: GeometryData,
    /// One entry per triangle, `-1` for "no material"; empty when unassigned
    pub material_ids: Vec<i32>,
}

impl ObjAttribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn clear(&mut self) {
        self.geometry.clear();
        self.material_ids.clear();
    }

    /// Size the three triangle index streams to `triangles` entries
    pub fn resize_indices(&mut self, triangles: usize) {
        self.geometry.tri_vertex_indices.resize(triangles, Vec3::zeros());
        self.geometry.tri_texture_indices.resize(triangles, Vec3::zeros());
        self.geometry.tri_normal_indices.resize(triangles, Vec3::zeros());
    }

    pub fn triangle_count(&self) -> usize {
        self.geometry.tri_vertex_indices.len()
    }

    pub fn has_consistent_materials(&self) -> bool {
        self.material_ids.is_empty() || self.material_ids.len() == self.triangle_count()
    }

    /// Index a triangle soup: every corner keeps its own position and
    /// every facet normal is shared by its three corners.
    pub fn from_triangle_soup(name: impl Into<String>, soup: &StlData) -> Self {
        let mut attribute = Self::new(name);
        let geometry = &mut attribute.geometry;
        geometry.positions = soup.geometry.positions.clone();
        geometry.normals = soup.geometry.normals.clone();
        for t in 0..soup.triangle_count() as u32 {
            geometry
                .tri_vertex_indices
                .push(Vec3::new(3 * t, 3 * t + 1, 3 * t + 2));
            geometry.tri_normal_indices.push(Vec3::new(t, t, t));
        }
        attribute
    }

    /// Flatten into a triangle soup.
    ///
    /// Quads are split along their 0-2 diagonal. Facet normals average the
    /// corner normals when the attribute has them, otherwise they are
    /// computed from the winding.
    pub fn to_triangle_soup(&self) -> Result<StlData> {
        let geometry = &self.geometry;
        geometry.check_indices()?;

        let mut triangles: Vec<([u32; 3], Option<[u32; 3]>)> = Vec::new();
        for (i, tri) in geometry.tri_vertex_indices.iter().enumerate() {
            let normals = geometry.tri_normal_indices.get(i).map(|n| n.to_array());
            triangles.push((tri.to_array(), normals));
        }
        for (i, quad) in geometry.quad_vertex_indices.iter().enumerate() {
            let [a, b, c, d] = quad.to_array();
            let normals = geometry.quad_normal_indices.get(i).map(|n| n.to_array());
            triangles.push(([a, b, c], normals.map(|[na, nb, nc, _]| [na, nb, nc])));
            triangles.push(([a, c, d], normals.map(|[na, _, nc, nd]| [na, nc, nd])));
        }

        let mut soup = StlData::with_capacity(triangles.len());
        for (corners, normals) in triangles {
            let vertices = corners.map(|i| geometry.positions[i as usize]);
            let normal = match normals {
                Some(ids) => {
                    let sum = ids
                        .iter()
                        .map(|&n| geometry.normals[n as usize])
                        .fold(Vec3::zeros(), |acc, n| acc + n);
                    sum.as_nalgebra()
                        .try_normalize(f32::EPSILON)
                        .map(Vec3::from)
                        .unwrap_or_else(|| face_normal(vertices[0], vertices[1], vertices[2]))
                }
                None => face_normal(vertices[0], vertices[1], vertices[2]),
            };
            soup.push_facet(normal, vertices);
        }
        Ok(soup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_preallocates_soup() {
        let mut soup = StlData::new();
        soup.resize(12);
        assert_eq!(soup.positions().len(), 36);
        assert_eq!(soup.normals().len(), 12);
        assert!(soup.is_consistent());
        assert_eq!(soup.positions()[0].w(), 1.0);
    }

    #[test]
    fn test_resize_indices_keeps_streams_parallel() {
        let mut attribute = ObjAttribute::from_triangle_soup("cube", &StlData::unit_cube());
        attribute.resize_indices(4);
        let geometry = &attribute.geometry;
        assert_eq!(attribute.triangle_count(), 4);
        assert_eq!(geometry.tri_texture_indices.len(), 4);
        assert_eq!(geometry.tri_normal_indices.len(), 4);
        assert_eq!(geometry.tri_vertex_indices[3], Vec3::new(9, 10, 11));

        attribute.resize_indices(6);
        assert_eq!(attribute.geometry.tri_vertex_indices[5], Vec3::zeros());
    }

    #[test]
    fn test_append_shifts_each_index_space() {
        let mut first = ObjAttribute::from_triangle_soup("a", &StlData::unit_cube()).geometry;
        let mut second = first.clone();
        second.tex_coords = vec![Vec3::new(0.5, 0.5, 0.0)];
        second.tri_texture_indices = vec![Vec3::zeros(); 12];
        first.append(second).unwrap();

        assert_eq!(first.positions.len(), 72);
        assert_eq!(first.normals.len(), 24);
        assert_eq!(first.tri_vertex_indices.len(), 24);
        assert_eq!(first.tri_vertex_indices[12], Vec3::new(36, 37, 38));
        assert_eq!(first.tri_normal_indices[23], Vec3::new(23, 23, 23));
        assert_eq!(first.tri_texture_indices[0], Vec3::zeros());
        assert!(first.check_indices().is_ok());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut soup = StlData::unit_cube();
        soup.clear();
        assert!(soup.geometry.is_empty());
        soup.clear();
        assert!(soup.geometry.is_empty());

        let mut attribute = ObjAttribute::from_triangle_soup("cube", &StlData::unit_cube());
        attribute.material_ids = vec![0; attribute.triangle_count()];
        attribute.clear();
        assert!(attribute.geometry.is_empty());
        assert!(attribute.material_ids.is_empty());
    }

    #[test]
    fn test_unit_cube_normals_face_outward() {
        let cube = StlData::unit_cube();
        assert_eq!(cube.triangle_count(), 12);
        for facet in cube.facets() {
            assert_eq!(facet.calculate_normal(), facet.normal);
        }
    }

    #[test]
    fn test_equality_tracks_sizes() {
        let reference = StlData::unit_cube();
        let mut other = StlData::new();
        assert_ne!(other, reference);

        other.geometry.positions = reference.geometry.positions.clone();
        assert_ne!(other, reference);

        other.geometry.normals = reference.geometry.normals.clone();
        assert_eq!(other, reference);

        other.geometry.colors.push(Vec3::new(1.0, 0.0, 0.0));
        assert_ne!(other, reference);
        other.geometry.colors.clear();

        other.geometry.param_space_vertices.push(Vec3::new(1.0, 0.0, 0.0));
        assert_ne!(other, reference);
    }

    #[test]
    fn test_extra_tex_coord_breaks_equality() {
        let reference = ObjAttribute::from_triangle_soup("cube", &StlData::unit_cube());
        let mut other = reference.clone();
        other.geometry.tex_coords.push(Vec3::new(1.0, 0.0, 0.0));
        assert_ne!(other, reference);

        other.geometry.tex_coords = reference.geometry.tex_coords.clone();
        assert_eq!(other, reference);
    }

    #[test]
    fn test_check_indices() {
        let mut attribute = ObjAttribute::from_triangle_soup("cube", &StlData::unit_cube());
        assert!(attribute.geometry.check_indices().is_ok());

        attribute.geometry.tri_texture_indices.push(Vec3::new(0, 0, 0));
        let err = attribute.geometry.check_indices().unwrap_err();
        assert!(err.to_string().contains("triangle texture"));
    }

    #[test]
    fn test_soup_conversion_round_trip() {
        let cube = StlData::unit_cube();
        let attribute = ObjAttribute::from_triangle_soup("cube", &cube);
        assert_eq!(attribute.triangle_count(), 12);
        assert!(attribute.has_consistent_materials());
        assert_eq!(attribute.to_triangle_soup().unwrap(), cube);
    }

    #[test]
    fn test_quads_split_into_triangles() {
        let mut attribute = ObjAttribute::new("square");
        attribute.geometry.positions = vec![
            Vec4::new(0.0, 0.0, 0.0, 1.0),
            Vec4::new(1.0, 0.0, 0.0, 1.0),
            Vec4::new(1.0, 1.0, 0.0, 1.0),
            Vec4::new(0.0, 1.0, 0.0, 1.0),
        ];
        attribute.geometry.quad_vertex_indices.push(Vec4::new(0, 1, 2, 3));

        let soup = attribute.to_triangle_soup().unwrap();
        assert_eq!(soup.triangle_count(), 2);
        assert!(soup.is_consistent());
        for facet in soup.facets() {
            assert_eq!(facet.normal, Vec3::new(0.0, 0.0, 1.0));
        }
    }
}
