//! Grid maps in the MovingAI-style text format.
//!
//! # Format
//!
//! ```text
//! type octile
//! height 3
//! width 4
//! map
//! ..@.
//! .E..
//! S..T
//! ```
//!
//! | Char      | Cell                 |
//! |-----------|----------------------|
//! | `@`, `T`  | `Cell::Obstacle`     |
//! | `.`, `S`  | `Cell::Free`         |
//! | `E`       | `Cell::Endpoint`     |
//!
//! The first line (`type`) is ignored.  Any other character is a map error,
//! as is a row whose width or a row count that disagrees with the header.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::{CoreError, CoreResult};

/// Content of one grid cell.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cell {
    Obstacle,
    Free,
    /// A free cell marked as a task endpoint.
    Endpoint,
}

impl Cell {
    fn parse(ch: char) -> Option<Cell> {
        match ch {
            '@' | 'T' => Some(Cell::Obstacle),
            '.' | 'S' => Some(Cell::Free),
            'E'       => Some(Cell::Endpoint),
            _         => None,
        }
    }

    #[inline]
    pub fn is_passable(self) -> bool {
        !matches!(self, Cell::Obstacle)
    }
}

/// A row-major occupancy grid.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridMap {
    pub height: usize,
    pub width:  usize,
    cells:      Vec<Cell>,
}

impl GridMap {
    /// Build a map from explicit rows.  All rows must have the same width.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> CoreResult<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if let Some((r, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != width) {
            return Err(CoreError::Map(format!(
                "row {r} has width {}, expected {width}",
                row.len()
            )));
        }
        Ok(Self { height, width, cells: rows.into_iter().flatten().collect() })
    }

    /// Load a map file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Like [`GridMap::load`] but accepts any `Read` source.
    pub fn from_reader<R: Read>(reader: R) -> CoreResult<Self> {
        let mut lines = BufReader::new(reader).lines();
        let mut header = |expect: &str| -> CoreResult<String> {
            lines
                .next()
                .transpose()?
                .ok_or_else(|| CoreError::Map(format!("missing {expect} line")))
        };

        header("type")?;
        let height = parse_dimension(&header("height")?, "height")?;
        let width = parse_dimension(&header("width")?, "width")?;
        header("map")?;

        let mut rows = Vec::with_capacity(height);
        for line in lines {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let row = line
                .chars()
                .map(|ch| {
                    Cell::parse(ch).ok_or_else(|| {
                        CoreError::Map(format!("unknown map character {ch:?} in row {}", rows.len()))
                    })
                })
                .collect::<CoreResult<Vec<Cell>>>()?;
            if row.len() != width {
                return Err(CoreError::Map(format!(
                    "row {} has width {}, expected {width}",
                    rows.len(),
                    row.len()
                )));
            }
            rows.push(row);
        }

        if rows.len() != height {
            return Err(CoreError::Map(format!(
                "map has {} rows, header says {height}",
                rows.len()
            )));
        }
        Self::from_rows(rows)
    }

    /// The cell at `(row, col)`, or `None` outside the map.
    pub fn get(&self, row: i32, col: i32) -> Option<Cell> {
        if row < 0 || col < 0 || row as usize >= self.height || col as usize >= self.width {
            return None;
        }
        Some(self.cells[row as usize * self.width + col as usize])
    }

    /// Iterate `(row, col, cell)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        let width = self.width.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &c)| (i / width, i % width, c))
    }

    pub fn obstacle_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_passable()).count()
    }
}

/// Name of a map derived from its file path (`maps/warehouse_small.map` →
/// `warehouse_small`).  Used to look up per-map display presets.
pub fn map_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn parse_dimension(line: &str, key: &str) -> CoreResult<usize> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(k), Some(v)) if k == key => v
            .parse()
            .map_err(|_| CoreError::Map(format!("invalid {key} value {v:?}"))),
        _ => Err(CoreError::Map(format!("expected `{key} <n>`, found {line:?}"))),
    }
}
