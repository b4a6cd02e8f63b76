//! TSPLIB `.tsp` instance loader.
//!
//! Supported `EDGE_WEIGHT_TYPE`s are `EUC_2D`, `CEIL_2D`, `ATT`, and
//! `EXPLICIT` with the `FULL_MATRIX`, `UPPER_ROW`, `LOWER_ROW`,
//! `UPPER_DIAG_ROW`, and `LOWER_DIAG_ROW` formats.

use std::fs;
use std::path::Path;

use log::{debug, info, warn};

use crate::distance::{DistanceMatrix, Metric};
use crate::error::{Error, Result};
use crate::graph::CompleteGraph;
use crate::models::{Coords, Instance};

/// Where the depot of a loaded instance sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepotPlacement {
    /// A new vertex 0 at the centroid of all file vertices.
    ///
    /// Needs coordinates; explicit-matrix instances fall back to vertex 0.
    #[default]
    Centroid,
    /// An existing vertex, 0-based in file order.
    Vertex(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Coords,
    Weights,
    Skip,
}

#[derive(Debug, Default)]
struct Header {
    name: Option<String>,
    dimension: Option<usize>,
    weight_type: Option<(usize, String)>,
    weight_format: Option<(usize, String)>,
}

impl Header {
    fn set(&mut self, line_no: usize, line: &str) -> Result<()> {
        let Some((key, value)) = line.split_once(':') else {
            return Err(Error::parse(line_no, format!("expected `KEY : VALUE`, got `{line}`")));
        };
        let value = value.trim();
        match key.trim().to_ascii_uppercase().as_str() {
            "NAME" => self.name = Some(value.to_string()),
            "DIMENSION" => {
                let n = value
                    .parse()
                    .map_err(|_| Error::parse(line_no, format!("invalid DIMENSION `{value}`")))?;
                self.dimension = Some(n);
            }
            "EDGE_WEIGHT_TYPE" => self.weight_type = Some((line_no, value.to_ascii_uppercase())),
            "EDGE_WEIGHT_FORMAT" => {
                self.weight_format = Some((line_no, value.to_ascii_uppercase()))
            }
            other => debug!("ignoring TSPLIB keyword {other}"),
        }
        Ok(())
    }
}

fn section_start(line: &str) -> Option<Section> {
    match line.trim_end_matches(':').trim() {
        "NODE_COORD_SECTION" => Some(Section::Coords),
        "EDGE_WEIGHT_SECTION" => Some(Section::Weights),
        "DISPLAY_DATA_SECTION" | "FIXED_EDGES_SECTION" | "DEPOT_SECTION" => Some(Section::Skip),
        _ => None,
    }
}

fn number(line_no: usize, token: &str) -> Result<f64> {
    token
        .parse()
        .map_err(|_| Error::parse(line_no, format!("invalid number `{token}`")))
}

/// Parses TSPLIB text into an instance with `num_vehicles` vehicles.
///
/// # Examples
///
/// ```
/// use fair_mtsp::io::{parse_tsplib, DepotPlacement};
///
/// let text = "NAME : square\nDIMENSION : 4\nEDGE_WEIGHT_TYPE : EUC_2D\n\
///             NODE_COORD_SECTION\n1 0 0\n2 10 0\n3 10 10\n4 0 10\nEOF\n";
/// let inst = parse_tsplib(text, 2, DepotPlacement::Centroid).unwrap();
/// assert_eq!(inst.name(), "square");
/// assert_eq!(inst.num_vertices(), 5);
/// assert_eq!(inst.distance(0, 1), 7.0);
/// ```
pub fn parse_tsplib(text: &str, num_vehicles: usize, depot: DepotPlacement) -> Result<Instance> {
    parse(text, "unnamed", num_vehicles, depot)
}

/// Reads and parses a TSPLIB file; the file stem names unnamed instances.
pub fn load_tsplib(
    path: impl AsRef<Path>,
    num_vehicles: usize,
    depot: DepotPlacement,
) -> Result<Instance> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed");
    let instance = parse(&text, stem, num_vehicles, depot)?;
    info!(
        "loaded {} from {}: {} vertices, {} vehicles",
        instance.name(),
        path.display(),
        instance.num_vertices(),
        instance.num_vehicles()
    );
    Ok(instance)
}

fn parse(text: &str, fallback_name: &str, num_vehicles: usize, depot: DepotPlacement) -> Result<Instance> {
    let mut header = Header::default();
    let mut coords = Vec::new();
    let mut weights = Vec::new();
    let mut section = Section::Header;
    let mut last_line = 0;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        last_line = line_no;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if line == "EOF" {
            break;
        }
        if let Some(next) = section_start(line) {
            section = next;
            continue;
        }
        // keywords may follow a data section
        if line.contains(':') {
            section = Section::Header;
        }

        match section {
            Section::Header => header.set(line_no, line)?,
            Section::Coords => {
                let tokens: Vec<&str> = line.split_whitespace().collect();
                if tokens.len() < 3 {
                    return Err(Error::parse(line_no, "expected `id x y`"));
                }
                coords.push(Coords::new(number(line_no, tokens[1])?, number(line_no, tokens[2])?));
            }
            Section::Weights => {
                for token in line.split_whitespace() {
                    weights.push(number(line_no, token)?);
                }
            }
            Section::Skip => {}
        }
    }

    let name = header.name.clone().unwrap_or_else(|| fallback_name.to_string());
    let n = header
        .dimension
        .ok_or_else(|| Error::parse(last_line, "missing DIMENSION"))?;
    let (type_line, weight_type) = header
        .weight_type
        .clone()
        .ok_or_else(|| Error::parse(last_line, "missing EDGE_WEIGHT_TYPE"))?;

    let metric = match weight_type.as_str() {
        "EUC_2D" => Metric::Euc2d,
        "CEIL_2D" => Metric::Ceil2d,
        "ATT" => Metric::Att,
        "EXPLICIT" => return explicit(&header, name, n, &weights, num_vehicles, depot, last_line),
        other => {
            return Err(Error::parse(
                type_line,
                format!("unsupported EDGE_WEIGHT_TYPE {other}"),
            ))
        }
    };

    if coords.len() != n {
        return Err(Error::parse(
            last_line,
            format!("expected {n} coordinates, found {}", coords.len()),
        ));
    }

    let (coords, depot) = match depot {
        DepotPlacement::Centroid => {
            let centroid = Coords::centroid(&coords)
                .ok_or_else(|| Error::parse(last_line, "no coordinates"))?;
            let mut all = Vec::with_capacity(n + 1);
            all.push(centroid);
            all.extend(coords);
            (all, 0)
        }
        DepotPlacement::Vertex(i) => (coords, i),
    };
    Ok(Instance::from_coords(name, coords, metric, num_vehicles, depot)?)
}

fn explicit(
    header: &Header,
    name: String,
    n: usize,
    weights: &[f64],
    num_vehicles: usize,
    depot: DepotPlacement,
    last_line: usize,
) -> Result<Instance> {
    let (format_line, format) = header
        .weight_format
        .clone()
        .ok_or_else(|| Error::parse(last_line, "EXPLICIT weights need EDGE_WEIGHT_FORMAT"))?;

    let matrix = if format == "FULL_MATRIX" {
        DistanceMatrix::from_data(n, weights.to_vec()).ok_or_else(|| {
            Error::parse(
                last_line,
                format!("FULL_MATRIX of dimension {n} needs {} weights, found {}", n * n, weights.len()),
            )
        })?
    } else {
        triangle(&format, format_line, n, weights, last_line)?
    };

    let depot = match depot {
        DepotPlacement::Vertex(i) => i,
        DepotPlacement::Centroid => {
            warn!("{name}: explicit weights have no centroid, using vertex 0 as depot");
            0
        }
    };
    Ok(Instance::new(name, CompleteGraph::new(matrix)?, num_vehicles, depot)?)
}

/// Mirrors a triangular weight listing into a full matrix.
fn triangle(format: &str, format_line: usize, n: usize, weights: &[f64], last_line: usize) -> Result<DistanceMatrix> {
    let cells: Vec<(usize, usize)> = match format {
        "UPPER_ROW" => (0..n).flat_map(|i| ((i + 1)..n).map(move |j| (i, j))).collect(),
        "LOWER_ROW" => (0..n).flat_map(|i| (0..i).map(move |j| (i, j))).collect(),
        "UPPER_DIAG_ROW" => (0..n).flat_map(|i| (i..n).map(move |j| (i, j))).collect(),
        "LOWER_DIAG_ROW" => (0..n).flat_map(|i| (0..=i).map(move |j| (i, j))).collect(),
        other => {
            return Err(Error::parse(
                format_line,
                format!("unsupported EDGE_WEIGHT_FORMAT {other}"),
            ))
        }
    };
    if weights.len() != cells.len() {
        return Err(Error::parse(
            last_line,
            format!("{format} of dimension {n} needs {} weights, found {}", cells.len(), weights.len()),
        ));
    }

    let mut matrix = DistanceMatrix::new(n);
    for (&(i, j), &w) in cells.iter().zip(weights) {
        matrix.set(i, j, w);
        matrix.set(j, i, w);
    }
    Ok(matrix)
}
