/// Wavefront OBJ importer producing unified, indexed geometry
///
/// Parsing collects the three attribute streams and the triangle list in
/// file order. Unification then assigns one output vertex per distinct
/// `(position, texcoord, normal)` reference triple, in first-seen order.
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use nalgebra::{Vector2, Vector3};
use nom::{
    character::complete::{char, u32 as index},
    combinator::{all_consuming, opt},
    number::complete::float,
    sequence::{pair, preceded},
    IResult,
};
use tracing::{debug, info};

use crate::error::{MeshError, Result};
use crate::geometry::MeshGeometry;

/// Importer settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportOptions {
    /// Store texture coordinates as `(u, 1 - v)` so that a top-left image
    /// origin lines up with a bottom-left sampling origin.
    pub flip_v: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self { flip_v: true }
    }
}

/// One face corner: 0-based indices into the three attribute streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceVertexRef {
    pub position: usize,
    pub tex_coord: Option<usize>,
    pub normal: Option<usize>,
}

/// A triangle as read from an `f` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub corners: [FaceVertexRef; 3],
    /// 1-based source line, kept for error reporting.
    pub line: usize,
}

/// Attribute streams and faces exactly as they appear in the file.
#[derive(Debug, Clone, Default)]
pub struct RawAttributeStreams {
    pub positions: Vec<Vector3<f32>>,
    pub tex_coords: Vec<Vector2<f32>>,
    pub normals: Vec<Vector3<f32>>,
    pub faces: Vec<Face>,
}

impl RawAttributeStreams {
    /// Parse every record of an OBJ document.
    ///
    /// Lines are read as raw bytes. Only `v`, `vt`, `vn` and `f` records
    /// must be valid UTF-8; comments and ignored records may hold any bytes.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut streams = Self::default();
        for (i, line) in reader.split(b'\n').enumerate() {
            streams.parse_line(&line?, i + 1)?;
        }
        Ok(streams)
    }

    fn parse_line(&mut self, line: &[u8], line_no: usize) -> Result<()> {
        let content = match line.iter().position(|&b| b == b'#') {
            Some(pos) => &line[..pos],
            None => line,
        };
        let kind = content
            .split(|b| b.is_ascii_whitespace())
            .find(|token| !token.is_empty());
        if !matches!(kind, Some(b"v" | b"vt" | b"vn" | b"f")) {
            return Ok(());
        }

        let content = std::str::from_utf8(content)
            .map_err(|_| MeshError::format(line_no, "record is not valid UTF-8"))?;
        let mut tokens = content.split_whitespace();
        let Some(kind) = tokens.next() else {
            return Ok(());
        };
        let fields: Vec<&str> = tokens.collect();

        match kind {
            "v" => {
                // An optional fourth (w) component is accepted and dropped
                let [x, y, z] = parse_floats::<3>(&fields, 3..=4, line_no, "v")?;
                self.positions.push(Vector3::new(x, y, z));
            }
            "vt" => {
                let [u, v] = parse_floats::<2>(&fields, 2..=3, line_no, "vt")?;
                self.tex_coords.push(Vector2::new(u, v));
            }
            "vn" => {
                let [x, y, z] = parse_floats::<3>(&fields, 3..=3, line_no, "vn")?;
                self.normals.push(Vector3::new(x, y, z));
            }
            "f" => {
                if fields.len() != 3 {
                    return Err(MeshError::format(
                        line_no,
                        format!("face has {} vertices, only triangles are supported", fields.len()),
                    ));
                }
                let corners = [
                    parse_face_vertex(fields[0], line_no)?,
                    parse_face_vertex(fields[1], line_no)?,
                    parse_face_vertex(fields[2], line_no)?,
                ];
                self.faces.push(Face {
                    corners,
                    line: line_no,
                });
            }
            _ => {}
        }

        Ok(())
    }
}

fn parse_floats<const N: usize>(
    fields: &[&str],
    accepted: std::ops::RangeInclusive<usize>,
    line_no: usize,
    kind: &str,
) -> Result<[f32; N]> {
    if !accepted.contains(&fields.len()) {
        return Err(MeshError::format(
            line_no,
            format!("'{}' expects {} values, found {}", kind, N, fields.len()),
        ));
    }

    let mut values = [0.0; N];
    for (value, field) in values.iter_mut().zip(fields) {
        *value = parse_float(field)
            .map_err(|_| MeshError::format(line_no, format!("invalid number '{}'", field)))?;
    }
    Ok(values)
}

fn parse_float(token: &str) -> std::result::Result<f32, nom::Err<nom::error::Error<&str>>> {
    all_consuming(float)(token).map(|(_, value)| value)
}

/// `p`, `p/t`, `p/t/n` or `p//n`, all 1-based.
fn face_vertex_token(input: &str) -> IResult<&str, (u32, Option<u32>, Option<u32>)> {
    let (input, position) = index(input)?;
    let (input, rest) = opt(preceded(
        char('/'),
        pair(opt(index), opt(preceded(char('/'), index))),
    ))(input)?;

    let (tex_coord, normal) = rest.unwrap_or((None, None));
    Ok((input, (position, tex_coord, normal)))
}

fn parse_face_vertex(token: &str, line_no: usize) -> Result<FaceVertexRef> {
    let (_, (position, tex_coord, normal)) = all_consuming(face_vertex_token)(token)
        .map_err(|_| MeshError::format(line_no, format!("invalid face vertex '{}'", token)))?;

    let to_zero_based = |one_based: u32| -> Result<usize> {
        (one_based as usize).checked_sub(1).ok_or_else(|| {
            MeshError::format(line_no, format!("index 0 in face vertex '{}'", token))
        })
    };

    Ok(FaceVertexRef {
        position: to_zero_based(position)?,
        tex_coord: tex_coord.map(to_zero_based).transpose()?,
        normal: normal.map(to_zero_based).transpose()?,
    })
}

fn fetch<'a, T>(stream: &'a [T], index: usize, line: usize, what: &str) -> Result<&'a T> {
    stream.get(index).ok_or_else(|| {
        MeshError::format(
            line,
            format!("{} index {} out of range ({} defined)", what, index + 1, stream.len()),
        )
    })
}

/// Build unified geometry from parsed streams.
///
/// Every distinct [`FaceVertexRef`] becomes exactly one output vertex, with
/// ids handed out in first-encounter order. Absent texture coordinates and
/// normals are left at zero.
pub fn unify(streams: &RawAttributeStreams, options: &ImportOptions) -> Result<MeshGeometry> {
    let mut ids: HashMap<FaceVertexRef, u32> = HashMap::new();
    let mut indices = Vec::with_capacity(streams.faces.len() * 3);

    for face in &streams.faces {
        for corner in &face.corners {
            let next = u32::try_from(ids.len()).map_err(|_| {
                MeshError::format(face.line, "vertex count exceeds the 32-bit index range")
            })?;
            indices.push(*ids.entry(*corner).or_insert(next));
        }
    }

    let vertex_count = ids.len();
    let mut positions = vec![f32::NAN; vertex_count * 3];
    let mut tex_coords = vec![0.0; vertex_count * 2];
    let mut normals = vec![0.0; vertex_count * 3];
    let mut populated = vec![false; vertex_count];

    let corners = streams
        .faces
        .iter()
        .flat_map(|face| face.corners.iter().map(move |c| (c, face.line)));
    for ((corner, line), &id) in corners.zip(&indices) {
        let id = id as usize;
        if populated[id] {
            continue;
        }

        let p = fetch(&streams.positions, corner.position, line, "position")?;
        positions[3 * id..3 * id + 3].copy_from_slice(p.as_slice());

        if let Some(t) = corner.tex_coord {
            let t = fetch(&streams.tex_coords, t, line, "texture coordinate")?;
            tex_coords[2 * id] = t.x;
            tex_coords[2 * id + 1] = if options.flip_v { 1.0 - t.y } else { t.y };
        }

        if let Some(n) = corner.normal {
            let n = fetch(&streams.normals, n, line, "normal")?;
            normals[3 * id..3 * id + 3].copy_from_slice(n.as_slice());
        }

        populated[id] = true;
    }

    ensure_populated(&populated)?;
    MeshGeometry::from_arrays(positions, tex_coords, normals, indices)
}

/// Every vertex id must have had its slots written by the corner that
/// introduced it.
fn ensure_populated(populated: &[bool]) -> Result<()> {
    match populated.iter().position(|&written| !written) {
        Some(vertex) => Err(MeshError::InconsistentFaceReferences { vertex }),
        None => Ok(()),
    }
}

/// Parse and unify an OBJ document from any buffered reader.
pub fn read_obj<R: BufRead>(reader: R, options: &ImportOptions) -> Result<MeshGeometry> {
    let streams = RawAttributeStreams::parse(reader)?;
    debug!(
        positions = streams.positions.len(),
        tex_coords = streams.tex_coords.len(),
        normals = streams.normals.len(),
        faces = streams.faces.len(),
        "parsed OBJ records"
    );
    unify(&streams, options)
}

/// Parse an in-memory OBJ document with default options.
pub fn parse_obj(input: &str) -> Result<MeshGeometry> {
    read_obj(input.as_bytes(), &ImportOptions::default())
}

/// Load an OBJ file with default options.
pub fn import_mesh<P: AsRef<Path>>(path: P) -> Result<MeshGeometry> {
    import_mesh_with(path, &ImportOptions::default())
}

/// Load an OBJ file.
pub fn import_mesh_with<P: AsRef<Path>>(path: P, options: &ImportOptions) -> Result<MeshGeometry> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let geometry = read_obj(BufReader::new(file), options)?;

    info!(
        path = %path.display(),
        vertices = geometry.vertex_count(),
        faces = geometry.face_count(),
        "imported mesh"
    );
    Ok(geometry)
}
