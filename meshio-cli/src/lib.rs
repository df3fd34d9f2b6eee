//! Command line front end over `meshio-core`
//!
//! `meshio info` prints per-object counts, `meshio convert` re-encodes STL
//! files and converts between STL and OBJ.
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use meshio_core::{obj, stl, ObjAttribute, ObjData, StlData, StlFormat};

pub mod report;

#[derive(Parser, Debug)]
#[command(name = "meshio", version, about = "Inspect and convert STL and OBJ meshes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print per-object counts for an STL or OBJ file
    Info {
        input: PathBuf,

        /// Directory to resolve `mtllib` references against
        #[arg(long)]
        mtl_dir: Option<PathBuf>,
    },

    /// Convert a mesh; the output type follows the output extension
    Convert {
        input: PathBuf,
        output: PathBuf,

        /// STL encoding for `.stl` outputs
        #[arg(long, value_enum, default_value_t = FormatArg::Binary)]
        format: FormatArg,

        /// Directory to resolve `mtllib` references against
        #[arg(long)]
        mtl_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Ascii,
    Binary,
}

impl From<FormatArg> for StlFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Ascii => StlFormat::Ascii,
            FormatArg::Binary => StlFormat::Binary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MeshKind {
    Stl,
    Obj,
}

fn mesh_kind(path: &Path) -> Result<MeshKind> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("stl") => Ok(MeshKind::Stl),
        Some("obj") => Ok(MeshKind::Obj),
        _ => bail!(
            "cannot tell the mesh type of {} (expected .stl or .obj)",
            path.display()
        ),
    }
}

/// A mesh file loaded in its native model
#[derive(Debug)]
pub enum Loaded {
    Stl(Vec<StlData>),
    Obj(ObjData),
}

pub fn load(path: &Path, mtl_dir: Option<&Path>) -> Result<Loaded> {
    let loaded = match mesh_kind(path)? {
        MeshKind::Stl => Loaded::Stl(
            stl::read(path)
                .with_context(|| format!("Failed to read STL file: {}", path.display()))?,
        ),
        MeshKind::Obj => Loaded::Obj(
            obj::read(path, mtl_dir)
                .with_context(|| format!("Failed to read OBJ file: {}", path.display()))?,
        ),
    };
    Ok(loaded)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Info { input, mtl_dir } => {
            let stdout = std::io::stdout();
            info_to(&input, mtl_dir.as_deref(), &mut stdout.lock())
        }
        Commands::Convert {
            input,
            output,
            format,
            mtl_dir,
        } => convert(&input, &output, format.into(), mtl_dir.as_deref()),
    }
}

/// Write the summary of `input` to `out`
pub fn info_to<W: Write>(input: &Path, mtl_dir: Option<&Path>, out: &mut W) -> Result<()> {
    match load(input, mtl_dir)? {
        Loaded::Stl(objects) => report::write_stl_summary(out, &objects)?,
        Loaded::Obj(data) => report::write_obj_summary(out, &data)?,
    }
    Ok(())
}

pub fn convert(
    input: &Path,
    output: &Path,
    format: StlFormat,
    mtl_dir: Option<&Path>,
) -> Result<()> {
    let loaded = load(input, mtl_dir)?;
    match (loaded, mesh_kind(output)?) {
        (Loaded::Stl(objects), MeshKind::Stl) => write_stl(output, format, &objects),
        (Loaded::Obj(data), MeshKind::Obj) => write_obj(output, &data),
        (Loaded::Stl(objects), MeshKind::Obj) => {
            let data = ObjData {
                attributes: objects
                    .iter()
                    .enumerate()
                    .map(|(i, object)| {
                        ObjAttribute::from_triangle_soup(format!("object_{i}"), object)
                    })
                    .collect(),
                materials: Vec::new(),
            };
            write_obj(output, &data)
        }
        (Loaded::Obj(data), MeshKind::Stl) => {
            let objects = data
                .attributes
                .iter()
                .map(ObjAttribute::to_triangle_soup)
                .collect::<meshio_core::Result<Vec<_>>>()
                .context("Failed to flatten OBJ groups")?;
            write_stl(output, format, &objects)
        }
    }?;

    info!(input = %input.display(), output = %output.display(), "converted");
    Ok(())
}

fn write_stl(path: &Path, format: StlFormat, objects: &[StlData]) -> Result<()> {
    stl::write(path, format, objects)
        .with_context(|| format!("Failed to write STL file: {}", path.display()))
}

fn write_obj(path: &Path, data: &ObjData) -> Result<()> {
    obj::write(path, data).with_context(|| format!("Failed to write OBJ file: {}", path.display()))
}
