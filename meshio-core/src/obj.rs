//! Wavefront OBJ adapter.
//!
//! Parsing is delegated to `tobj`; this module reshapes its per-shape output
//! into [`ObjAttribute`]s and serializes documents back to OBJ/MTL text.
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{MeshError, Result};
use crate::geometry::ObjAttribute;
use crate::material::{write_mtl, Material};
use crate::vector::{Vec3, Vec4};

/// An OBJ document: groups in file order plus the material table they index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjData {
    pub attributes: Vec<ObjAttribute>,
    pub materials: Vec<Material>,
}

impl ObjData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.attributes.clear();
        self.materials.clear();
    }

    pub fn attributes_equal(&self, other: &Self) -> bool {
        self.attributes == other.attributes
    }

    pub fn materials_equal(&self, other: &Self) -> bool {
        self.materials == other.materials
    }

    pub fn triangle_count(&self) -> usize {
        self.attributes.iter().map(ObjAttribute::triangle_count).sum()
    }
}

/// Name tobj gives to faces that precede any `g` or `o` line
const UNNAMED_GROUP: &str = "unnamed_object";

const NO_MATERIAL: i32 = -1;

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: false,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    }
}

/// Read an OBJ file.
///
/// `mtllib` references resolve against `material_base_path` when given,
/// otherwise against the OBJ file's directory. A material library that
/// cannot be loaded is logged and leaves the material table empty.
pub fn read(path: impl AsRef<Path>, material_base_path: Option<&Path>) -> Result<ObjData> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| MeshError::io(path, e))?;
    let mut reader = BufReader::new(file);

    let base = match material_base_path {
        Some(dir) => dir.to_path_buf(),
        None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    let (models, materials) =
        tobj::load_obj_buf(&mut reader, &load_options(), |mtl| tobj::load_mtl(base.join(mtl)))
            .map_err(MeshError::Obj)?;

    let materials = materials.unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "could not load material library");
        Vec::new()
    });

    let mut data = ObjData {
        attributes: Vec::with_capacity(models.len()),
        materials: materials.into_iter().map(Material::from).collect(),
    };
    // tobj starts a new model at every `usemtl` switch; fold those back
    // into the group they came from.
    for model in models {
        let part = attribute_from_model(model)?;
        match data.attributes.last_mut() {
            Some(last) if last.name == part.name => {
                last.material_ids.extend(part.material_ids);
                last.geometry.append(part.geometry)?;
            }
            _ => data.attributes.push(part),
        }
    }
    for attribute in &mut data.attributes {
        if attribute.material_ids.iter().all(|&id| id == NO_MATERIAL) {
            attribute.material_ids.clear();
        }
        attribute.geometry.check_indices()?;
    }

    debug!(
        path = %path.display(),
        groups = data.attributes.len(),
        triangles = data.triangle_count(),
        materials = data.materials.len(),
        "read OBJ"
    );
    Ok(data)
}

fn triples(indices: &[u32]) -> Vec<Vec3<u32>> {
    indices
        .chunks_exact(3)
        .map(|t| Vec3::new(t[0], t[1], t[2]))
        .collect()
}

fn attribute_from_model(model: tobj::Model) -> Result<ObjAttribute> {
    let mesh = model.mesh;
    let name = if model.name == UNNAMED_GROUP {
        String::new()
    } else {
        model.name
    };
    let mut attribute = ObjAttribute::new(name);

    let geometry = &mut attribute.geometry;
    geometry.positions = mesh
        .positions
        .chunks_exact(3)
        .map(|p| Vec4::new(p[0], p[1], p[2], 1.0))
        .collect();
    geometry.colors = mesh
        .vertex_color
        .chunks_exact(3)
        .map(|c| Vec3::new(c[0], c[1], c[2]))
        .collect();
    geometry.normals = mesh
        .normals
        .chunks_exact(3)
        .map(|n| Vec3::new(n[0], n[1], n[2]))
        .collect();
    geometry.tex_coords = mesh
        .texcoords
        .chunks_exact(2)
        .map(|t| Vec3::new(t[0], t[1], 0.0))
        .collect();
    geometry.tri_vertex_indices = triples(&mesh.indices);
    geometry.tri_texture_indices = triples(&mesh.texcoord_indices);
    geometry.tri_normal_indices = triples(&mesh.normal_indices);

    let id = match mesh.material_id {
        Some(id) => i32::try_from(id)
            .map_err(|_| MeshError::format(format!("material id {id} out of range")))?,
        None => NO_MATERIAL,
    };
    attribute.material_ids = vec![id; attribute.triangle_count()];

    Ok(attribute)
}

/// Write `data` as OBJ text.
///
/// When the document has materials they go to a sibling `<stem>.mtl`
/// referenced by `mtllib`.
pub fn write(path: impl AsRef<Path>, data: &ObjData) -> Result<()> {
    let path = path.as_ref();
    for attribute in &data.attributes {
        attribute.geometry.check_indices()?;
        if !attribute.has_consistent_materials() {
            return Err(MeshError::format(format!(
                "group {:?} has {} material ids for {} triangles",
                attribute.name,
                attribute.material_ids.len(),
                attribute.triangle_count()
            )));
        }
    }

    let mtllib = if data.materials.is_empty() {
        None
    } else {
        let mtl_path = path.with_extension("mtl");
        let file = File::create(&mtl_path).map_err(|e| MeshError::io(&mtl_path, e))?;
        let mut writer = BufWriter::new(file);
        write_mtl(&mut writer, &data.materials)
            .and_then(|()| writer.flush())
            .map_err(|e| MeshError::io(&mtl_path, e))?;
        mtl_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    };

    let file = File::create(path).map_err(|e| MeshError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    write_obj(&mut writer, data, mtllib.as_deref())
        .and_then(|()| writer.flush())
        .map_err(|e| MeshError::io(path, e))?;

    debug!(path = %path.display(), groups = data.attributes.len(), "wrote OBJ");
    Ok(())
}

/// 1-based offsets of the next `v`, `vt` and `vn` lines
#[derive(Clone, Copy)]
struct Offsets {
    position: usize,
    texture: usize,
    normal: usize,
}

/// The `usemtl` state while writing, which carries across groups
struct MaterialState<'a> {
    materials: &'a [Material],
    /// A name absent from the library; tobj maps it to "no material"
    unassigned: String,
    current: Option<usize>,
}

impl<'a> MaterialState<'a> {
    fn new(materials: &'a [Material]) -> Self {
        let mut unassigned = String::from("meshio_no_material");
        while materials.iter().any(|m| m.name == unassigned) {
            unassigned.push('_');
        }
        Self {
            materials,
            unassigned,
            current: None,
        }
    }

    fn switch<W: Write>(&mut self, writer: &mut W, id: Option<i32>) -> io::Result<()> {
        let wanted = id
            .and_then(|id| usize::try_from(id).ok())
            .filter(|&id| id < self.materials.len());
        if wanted == self.current {
            return Ok(());
        }
        match wanted {
            Some(id) => writeln!(writer, "usemtl {}", self.materials[id].name)?,
            None => writeln!(writer, "usemtl {}", self.unassigned)?,
        }
        self.current = wanted;
        Ok(())
    }
}

fn write_obj<W: Write>(writer: &mut W, data: &ObjData, mtllib: Option<&str>) -> io::Result<()> {
    writeln!(writer, "# meshio")?;
    if let Some(lib) = mtllib {
        writeln!(writer, "mtllib {lib}")?;
    }

    let mut offsets = Offsets {
        position: 1,
        texture: 1,
        normal: 1,
    };
    let mut state = MaterialState::new(&data.materials);
    for attribute in &data.attributes {
        write_attribute(writer, attribute, &mut state, offsets)?;
        let geometry = &attribute.geometry;
        offsets.position += geometry.positions.len();
        offsets.texture += geometry.tex_coords.len();
        offsets.normal += geometry.normals.len();
    }
    Ok(())
}

fn write_attribute<W: Write>(
    writer: &mut W,
    attribute: &ObjAttribute,
    state: &mut MaterialState<'_>,
    offsets: Offsets,
) -> io::Result<()> {
    let geometry = &attribute.geometry;
    // A bare `g` still closes the previous group
    if attribute.name.is_empty() {
        writeln!(writer, "g")?;
    } else {
        writeln!(writer, "g {}", attribute.name)?;
    }

    let with_colors =
        !geometry.colors.is_empty() && geometry.colors.len() == geometry.positions.len();
    for (i, p) in geometry.positions.iter().enumerate() {
        if with_colors {
            let c = geometry.colors[i];
            writeln!(writer, "v {} {} {} {} {} {}", p.x(), p.y(), p.z(), c.x(), c.y(), c.z())?;
        } else {
            writeln!(writer, "v {} {} {}", p.x(), p.y(), p.z())?;
        }
    }
    for t in &geometry.tex_coords {
        writeln!(writer, "vt {} {}", t.x(), t.y())?;
    }
    for n in &geometry.normals {
        writeln!(writer, "vn {} {} {}", n.x(), n.y(), n.z())?;
    }

    for (i, tri) in geometry.tri_vertex_indices.iter().enumerate() {
        state.switch(writer, attribute.material_ids.get(i).copied())?;
        write_face(
            writer,
            tri.as_slice(),
            geometry.tri_texture_indices.get(i).map(|t| t.as_slice()),
            geometry.tri_normal_indices.get(i).map(|n| n.as_slice()),
            offsets,
        )?;
    }
    if !geometry.quad_vertex_indices.is_empty() {
        state.switch(writer, None)?;
    }
    for (i, quad) in geometry.quad_vertex_indices.iter().enumerate() {
        write_face(
            writer,
            quad.as_slice(),
            geometry.quad_texture_indices.get(i).map(|t| t.as_slice()),
            geometry.quad_normal_indices.get(i).map(|n| n.as_slice()),
            offsets,
        )?;
    }
    Ok(())
}

fn write_face<W: Write>(
    writer: &mut W,
    vertices: &[u32],
    tex_coords: Option<&[u32]>,
    normals: Option<&[u32]>,
    offsets: Offsets,
) -> io::Result<()> {
    write!(writer, "f")?;
    for (k, &v) in vertices.iter().enumerate() {
        let v = offsets.position + v as usize;
        let t = tex_coords.map(|t| offsets.texture + t[k] as usize);
        let n = normals.map(|n| offsets.normal + n[k] as usize);
        match (t, n) {
            (Some(t), Some(n)) => write!(writer, " {v}/{t}/{n}")?,
            (Some(t), None) => write!(writer, " {v}/{t}")?,
            (None, Some(n)) => write!(writer, " {v}//{n}")?,
            (None, None) => write!(writer, " {v}")?,
        }
    }
    writeln!(writer)
}
