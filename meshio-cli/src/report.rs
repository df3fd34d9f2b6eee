//! Plain-text summaries for `meshio info`
use std::io::{self, Write};

use meshio_core::{ObjData, StlData};

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

pub fn write_stl_summary<W: Write>(out: &mut W, objects: &[StlData]) -> io::Result<()> {
    writeln!(out, "STL: {}", plural(objects.len(), "object"))?;
    for (i, object) in objects.iter().enumerate() {
        writeln!(
            out,
            "  [{i}] {}, {}, {}",
            plural(object.triangle_count(), "triangle"),
            plural(object.positions().len(), "position"),
            plural(object.normals().len(), "normal"),
        )?;
    }
    Ok(())
}

pub fn write_obj_summary<W: Write>(out: &mut W, data: &ObjData) -> io::Result<()> {
    writeln!(
        out,
        "OBJ: {}, {}",
        plural(data.attributes.len(), "group"),
        plural(data.materials.len(), "material")
    )?;
    for (i, attribute) in data.attributes.iter().enumerate() {
        let geometry = &attribute.geometry;
        writeln!(
            out,
            "  [{i}] {:?}: {}, {}, {}, {}",
            attribute.name,
            plural(attribute.triangle_count(), "triangle"),
            plural(geometry.positions.len(), "position"),
            plural(geometry.tex_coords.len(), "texture coordinate"),
            plural(geometry.normals.len(), "normal"),
        )?;
    }
    for material in &data.materials {
        writeln!(out, "  material {:?}", material.name)?;
    }
    Ok(())
}
