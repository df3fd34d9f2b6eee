//! STL reader and writer for the binary and ASCII encodings.
//!
//! Both encodings may hold several objects back to back: repeated
//! `solid ... endsolid` blocks in ASCII, repeated `count + facets` groups
//! after the single 80-byte header in binary. A binary stream ends at end
//! of file or at a zero triangle count.
use nom::{
    bytes::complete::tag,
    character::complete::{multispace0, multispace1, not_line_ending},
    combinator::cut,
    multi::{count, many0},
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::{preceded, tuple},
    IResult,
};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::{MeshError, Result};
use crate::geometry::{Facet, StlData};
use crate::vector::{Vec3, Vec4};

/// Size of the free-form binary header
pub const HEADER_LEN: usize = 80;
/// Size of one binary facet record
pub const FACET_LEN: usize = 50;

const DEFAULT_HEADER: &str = "meshio binary STL";

/// STL encoding selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StlFormat {
    Ascii = 0,
    Binary = 1,
}

impl TryFrom<u32> for StlFormat {
    type Error = MeshError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(StlFormat::Ascii),
            1 => Ok(StlFormat::Binary),
            other => Err(MeshError::InvalidArgument(format!(
                "unknown STL format selector {other}"
            ))),
        }
    }
}

impl FromStr for StlFormat {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ascii" => Ok(StlFormat::Ascii),
            "binary" => Ok(StlFormat::Binary),
            _ => Err(MeshError::InvalidArgument(format!(
                "unknown STL format {s:?}, expected \"ascii\" or \"binary\""
            ))),
        }
    }
}

impl TryFrom<&str> for StlFormat {
    type Error = MeshError;

    fn try_from(value: &str) -> Result<Self> {
        value.parse()
    }
}

/// Knobs for the writers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Binary header text, NUL padded or truncated to 80 bytes
    pub header: String,
    /// Name written after `solid` / `endsolid` in ASCII output
    pub solid_name: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            header: DEFAULT_HEADER.to_string(),
            solid_name: "meshio".to_string(),
        }
    }
}

impl WriteOptions {
    fn header_bytes(&self) -> [u8; HEADER_LEN] {
        let text = if self.header.as_bytes().starts_with(b"solid") {
            warn!(
                header = %self.header,
                "binary header starting with `solid` would be read back as ASCII, using default"
            );
            DEFAULT_HEADER
        } else {
            self.header.as_str()
        };

        let mut header = [0u8; HEADER_LEN];
        let len = text.len().min(HEADER_LEN);
        header[..len].copy_from_slice(&text.as_bytes()[..len]);
        header
    }
}

/// Guess the encoding from the first line.
///
/// Pure prefix check: a binary file whose header happens to begin with
/// `solid` is reported as ASCII.
pub fn detect_format(data: &[u8]) -> StlFormat {
    let window = &data[..data.len().min(HEADER_LEN)];
    let first_line = match window.iter().position(|&b| b == b'\n') {
        Some(end) => &window[..end],
        None => window,
    };

    if first_line.starts_with(b"solid") {
        StlFormat::Ascii
    } else {
        StlFormat::Binary
    }
}

/// Read every object stored in an STL file
pub fn read(path: impl AsRef<Path>) -> Result<Vec<StlData>> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|e| MeshError::io(path, e))?;
    let objects = parse(&data)?;
    debug!(
        path = %path.display(),
        objects = objects.len(),
        triangles = objects.iter().map(StlData::triangle_count).sum::<usize>(),
        "read STL"
    );
    Ok(objects)
}

/// Decode an in-memory STL file of either encoding
pub fn parse(data: &[u8]) -> Result<Vec<StlData>> {
    match detect_format(data) {
        StlFormat::Ascii => {
            let text = std::str::from_utf8(data)
                .map_err(|e| MeshError::format(format!("ASCII STL is not valid UTF-8: {e}")))?;
            parse_ascii(text)
        }
        StlFormat::Binary => parse_binary(data),
    }
}

/// Write `objects` to `path` using the default [`WriteOptions`].
///
/// The format selector is validated before the file is created, so an
/// unknown selector leaves the file system untouched.
pub fn write<F>(path: impl AsRef<Path>, format: F, objects: &[StlData]) -> Result<()>
where
    F: TryInto<StlFormat>,
    MeshError: From<F::Error>,
{
    write_with_options(path, format, objects, &WriteOptions::default())
}

pub fn write_with_options<F>(
    path: impl AsRef<Path>,
    format: F,
    objects: &[StlData],
    options: &WriteOptions,
) -> Result<()>
where
    F: TryInto<StlFormat>,
    MeshError: From<F::Error>,
{
    let path = path.as_ref();
    let format = format.try_into()?;
    check_consistent(objects)?;

    let file = File::create(path).map_err(|e| MeshError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    encode_into(&mut writer, format, objects, options)
        .and_then(|()| writer.flush())
        .map_err(|e| MeshError::io(path, e))?;

    debug!(path = %path.display(), ?format, objects = objects.len(), "wrote STL");
    Ok(())
}

/// Encode `objects` into an in-memory buffer
pub fn encode(format: StlFormat, objects: &[StlData], options: &WriteOptions) -> Result<Vec<u8>> {
    check_consistent(objects)?;
    let mut buffer = Vec::new();
    // Writes into a Vec only fail on oversized inputs
    encode_into(&mut buffer, format, objects, options)
        .map_err(|e| MeshError::format(e.to_string()))?;
    Ok(buffer)
}

fn check_consistent(objects: &[StlData]) -> Result<()> {
    match objects.iter().position(|o| !o.is_consistent()) {
        Some(i) => Err(MeshError::format(format!(
            "object {i} has {} positions for {} normals, expected three per facet",
            objects[i].positions().len(),
            objects[i].normals().len()
        ))),
        None => Ok(()),
    }
}

fn encode_into<W: Write>(
    writer: &mut W,
    format: StlFormat,
    objects: &[StlData],
    options: &WriteOptions,
) -> io::Result<()> {
    match format {
        StlFormat::Ascii => write_ascii(writer, objects, options),
        StlFormat::Binary => write_binary(writer, objects, options),
    }
}

// Binary encoding

fn le_vec3(input: &[u8]) -> IResult<&[u8], [f32; 3]> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, [x, y, z]))
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Facet> {
    let (input, normal) = le_vec3(input)?;
    let (input, corners) = count(le_vec3, 3)(input)?;
    // Attribute byte count, ignored
    let (input, _) = le_u16(input)?;

    let vertices = [corners[0], corners[1], corners[2]].map(|[x, y, z]| Vec4::new(x, y, z, 1.0));
    Ok((
        input,
        Facet {
            normal: Vec3::from(normal),
            vertices,
        },
    ))
}

fn triangle_count(input: &[u8]) -> IResult<&[u8], u32> {
    le_u32(input)
}

/// Decode a binary STL stream, one object per count-prefixed group
pub fn parse_binary(data: &[u8]) -> Result<Vec<StlData>> {
    if data.len() < HEADER_LEN {
        return Err(MeshError::format(format!(
            "binary STL is {} bytes, shorter than its {HEADER_LEN}-byte header",
            data.len()
        )));
    }

    let mut input = &data[HEADER_LEN..];
    let mut objects = Vec::new();
    while !input.is_empty() {
        let (rest, triangles) = triangle_count(input).map_err(|_| {
            MeshError::format(format!(
                "truncated triangle count for object {}",
                objects.len()
            ))
        })?;
        if triangles == 0 {
            break;
        }

        let triangles = triangles as usize;
        if rest.len() / FACET_LEN < triangles {
            return Err(MeshError::format(format!(
                "object {} declares {triangles} facets but only {} bytes remain",
                objects.len(),
                rest.len()
            )));
        }

        let mut object = StlData::with_capacity(triangles);
        let mut records = rest;
        for _ in 0..triangles {
            let (next, facet) = binary_facet(records)
                .map_err(|_| MeshError::format("truncated facet record"))?;
            object.push_facet(facet.normal, facet.vertices);
            records = next;
        }
        objects.push(object);
        input = records;
    }

    Ok(objects)
}

fn write_binary<W: Write>(
    writer: &mut W,
    objects: &[StlData],
    options: &WriteOptions,
) -> io::Result<()> {
    writer.write_all(&options.header_bytes())?;

    for (i, object) in objects.iter().enumerate() {
        if object.triangle_count() == 0 {
            // A zero count terminates the stream on read
            warn!(object = i, "skipping empty object, binary STL cannot store it");
            continue;
        }

        let triangles = u32::try_from(object.triangle_count()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("object {i} has more facets than a binary STL count can hold"),
            )
        })?;
        writer.write_all(&triangles.to_le_bytes())?;

        let mut record = [0u8; FACET_LEN];
        for facet in object.facets() {
            let floats = facet
                .normal
                .iter()
                .chain(facet.vertices.iter().flat_map(|v| v.as_slice()[..3].iter()));
            for (slot, value) in record.chunks_exact_mut(4).zip(floats) {
                slot.copy_from_slice(&value.to_le_bytes());
            }
            // Attribute byte count (unused, set to 0)
            record[48..].copy_from_slice(&0u16.to_le_bytes());
            writer.write_all(&record)?;
        }
    }

    Ok(())
}

// ASCII encoding

fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    preceded(multispace0, tag(word))
}

fn ascii_vec3(input: &str) -> IResult<&str, [f32; 3]> {
    let (input, x) = preceded(multispace1, float)(input)?;
    let (input, y) = preceded(multispace1, float)(input)?;
    let (input, z) = preceded(multispace1, float)(input)?;
    Ok((input, [x, y, z]))
}

fn ascii_vertex(input: &str) -> IResult<&str, Vec4<f32>> {
    let (input, _) = keyword("vertex")(input)?;
    let (input, [x, y, z]) = ascii_vec3(input)?;
    Ok((input, Vec4::new(x, y, z, 1.0)))
}

fn facet_body(input: &str) -> IResult<&str, Facet> {
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = ascii_vec3(input)?;
    let (input, _) = keyword("outer")(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v0) = ascii_vertex(input)?;
    let (input, v1) = ascii_vertex(input)?;
    let (input, v2) = ascii_vertex(input)?;
    let (input, _) = keyword("endloop")(input)?;
    let (input, _) = keyword("endfacet")(input)?;

    Ok((
        input,
        Facet {
            normal: Vec3::from(normal),
            vertices: [v0, v1, v2],
        },
    ))
}

fn ascii_facet(input: &str) -> IResult<&str, Facet> {
    let (input, _) = keyword("facet")(input)?;
    // Past `facet` the grammar is fixed, so report errors where they occur
    cut(facet_body)(input)
}

fn ascii_solid(input: &str) -> IResult<&str, StlData> {
    let (input, _) = keyword("solid")(input)?;
    let (input, name) = not_line_ending(input)?;
    let (input, facets) = many0(ascii_facet)(input)?;
    let (input, _) = cut(keyword("endsolid"))(input)?;
    let (input, _) = not_line_ending(input)?;

    debug!(name = name.trim(), triangles = facets.len(), "parsed ASCII solid");
    let mut object = StlData::with_capacity(facets.len());
    for facet in facets {
        object.push_facet(facet.normal, facet.vertices);
    }
    Ok((input, object))
}

/// Decode ASCII STL text, one object per `solid ... endsolid` block
pub fn parse_ascii(text: &str) -> Result<Vec<StlData>> {
    let mut objects = Vec::new();
    let mut input = text.trim_start();
    while !input.is_empty() {
        let (rest, object) = ascii_solid(input).map_err(|e| ascii_error(text, e))?;
        objects.push(object);
        input = rest.trim_start();
    }
    Ok(objects)
}

fn ascii_error(text: &str, err: nom::Err<nom::error::Error<&str>>) -> MeshError {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let offset = text.len() - e.input.len();
            let line = text[..offset].matches('\n').count() + 1;
            let token = e.input.split_whitespace().next().unwrap_or("end of file");
            MeshError::format(format!(
                "ASCII STL line {line}: unexpected {token:?} ({:?})",
                e.code
            ))
        }
        nom::Err::Incomplete(_) => MeshError::format("ASCII STL ended unexpectedly"),
    }
}

fn write_ascii<W: Write>(
    writer: &mut W,
    objects: &[StlData],
    options: &WriteOptions,
) -> io::Result<()> {
    let name = &options.solid_name;
    for object in objects {
        writeln!(writer, "solid {name}")?;
        for facet in object.facets() {
            let n = facet.normal;
            // `{:e}` is the shortest representation that parses back to the same bits
            writeln!(writer, "  facet normal {:e} {:e} {:e}", n.x(), n.y(), n.z())?;
            writeln!(writer, "    outer loop")?;
            for v in facet.vertices {
                writeln!(writer, "      vertex {:e} {:e} {:e}", v.x(), v.y(), v.z())?;
            }
            writeln!(writer, "    endloop")?;
            writeln!(writer, "  endfacet")?;
        }
        writeln!(writer, "endsolid {name}")?;
    }
    Ok(())
}
