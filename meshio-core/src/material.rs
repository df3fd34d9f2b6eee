//! Material records carried alongside OBJ documents
use std::io::{self, Write};

use crate::util::{is_equal, parse_f32_triple, triple_is_equal};

/// One `newmtl` block of a material library
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub transmittance: [f32; 3],
    pub emission: [f32; 3],
    pub shininess: f32,
    /// Index of refraction
    pub ior: f32,
    /// 1 is fully opaque
    pub dissolve: f32,
    pub illum: i32,
    pub ambient_texname: String,
    pub diffuse_texname: String,
    pub specular_texname: String,
    pub specular_highlight_texname: String,
    pub bump_texname: String,
    pub displacement_texname: String,
    pub alpha_texname: String,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            ambient: [0.0; 3],
            diffuse: [0.0; 3],
            specular: [0.0; 3],
            transmittance: [0.0; 3],
            emission: [0.0; 3],
            shininess: 1.0,
            ior: 1.0,
            dissolve: 1.0,
            illum: 0,
            ambient_texname: String::new(),
            diffuse_texname: String::new(),
            specular_texname: String::new(),
            specular_highlight_texname: String::new(),
            bump_texname: String::new(),
            displacement_texname: String::new(),
            alpha_texname: String::new(),
        }
    }
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn texture_names(&self) -> [(&'static str, &str); 7] {
        [
            ("map_Ka", self.ambient_texname.as_str()),
            ("map_Kd", self.diffuse_texname.as_str()),
            ("map_Ks", self.specular_texname.as_str()),
            ("map_Ns", self.specular_highlight_texname.as_str()),
            ("bump", self.bump_texname.as_str()),
            ("disp", self.displacement_texname.as_str()),
            ("map_d", self.alpha_texname.as_str()),
        ]
    }
}

impl PartialEq for Material {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && triple_is_equal(&self.ambient, &other.ambient)
            && triple_is_equal(&self.diffuse, &other.diffuse)
            && triple_is_equal(&self.specular, &other.specular)
            && triple_is_equal(&self.transmittance, &other.transmittance)
            && triple_is_equal(&self.emission, &other.emission)
            && is_equal(self.shininess, other.shininess)
            && is_equal(self.ior, other.ior)
            && is_equal(self.dissolve, other.dissolve)
            && self.illum == other.illum
            && self.texture_names() == other.texture_names()
    }
}

impl From<tobj::Material> for Material {
    fn from(m: tobj::Material) -> Self {
        let defaults = Material::default();
        let triple = |key: &str| m.unknown_param.get(key).and_then(|v| parse_f32_triple(v));
        let text = |key: &str| m.unknown_param.get(key).map(|v| v.trim().to_string());

        Self {
            transmittance: triple("Tf").unwrap_or(defaults.transmittance),
            displacement_texname: text("disp").unwrap_or_default(),
            name: m.name,
            ambient: m.ambient.unwrap_or(defaults.ambient),
            diffuse: m.diffuse.unwrap_or(defaults.diffuse),
            specular: m.specular.unwrap_or(defaults.specular),
            emission: m.emissive.unwrap_or(defaults.emission),
            shininess: m.shininess.unwrap_or(defaults.shininess),
            ior: m.optical_density.unwrap_or(defaults.ior),
            dissolve: m.dissolve.unwrap_or(defaults.dissolve),
            illum: m.illumination_model.map_or(defaults.illum, i32::from),
            ambient_texname: m.ambient_texture.unwrap_or_default(),
            diffuse_texname: m.diffuse_texture.unwrap_or_default(),
            specular_texname: m.specular_texture.unwrap_or_default(),
            specular_highlight_texname: m.shininess_texture.unwrap_or_default(),
            bump_texname: m.normal_texture.unwrap_or_default(),
            alpha_texname: m.dissolve_texture.unwrap_or_default(),
        }
    }
}

/// Serialize materials as the text of a `.mtl` library
pub fn write_mtl<W: Write>(writer: &mut W, materials: &[Material]) -> io::Result<()> {
    for m in materials {
        writeln!(writer, "newmtl {}", m.name)?;
        write_color(writer, "Ka", &m.ambient)?;
        write_color(writer, "Kd", &m.diffuse)?;
        write_color(writer, "Ks", &m.specular)?;
        write_color(writer, "Tf", &m.transmittance)?;
        write_color(writer, "Ke", &m.emission)?;
        writeln!(writer, "Ns {}", m.shininess)?;
        writeln!(writer, "Ni {}", m.ior)?;
        writeln!(writer, "d {}", m.dissolve)?;
        writeln!(writer, "illum {}", m.illum)?;
        for (key, name) in m.texture_names() {
            if !name.is_empty() {
                writeln!(writer, "{key} {name}")?;
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn write_color<W: Write>(writer: &mut W, key: &str, c: &[f32; 3]) -> io::Result<()> {
    writeln!(writer, "{key} {} {} {}", c[0], c[1], c[2])
}
