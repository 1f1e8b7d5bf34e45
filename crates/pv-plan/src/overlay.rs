//! Planner diagnostics drawn over the grid.
//!
//! Three optional side files a solver can write next to its plan:
//!
//! | File          | Format                                                   |
//! |---------------|----------------------------------------------------------|
//! | highway       | edge count, then one encoded edge index per line         |
//! | heuristic     | one CSV line per agent: `agent,h(cell 0),h(cell 1),...`  |
//! | search tree   | CSV with a `loc` column, one row per expanded node       |
//!
//! Cells are numbered row-major: `loc = row * width + col`.  A highway edge
//! index packs both ends as `(from + 1) * cells + to`.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde::Deserialize;

use pv_core::{AgentId, Heading};

use crate::{HeatMap, PlanError, PlanResult};

/// Heuristic values the solver writes for unreachable cells.
const UNREACHABLE: [f64; 2] = [f64::MAX, i32::MAX as f64];

// ── Highway ───────────────────────────────────────────────────────────────────

/// One directed edge between two adjacent cells.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct HighwayEdge {
    pub from: (i32, i32),
    pub to:   (i32, i32),
}

impl HighwayEdge {
    /// Direction of travel along the edge.
    pub fn heading(&self) -> Heading {
        match (self.to.0 - self.from.0, self.to.1 - self.from.1) {
            (0, 1)  => Heading::East,
            (-1, 0) => Heading::North,
            (0, -1) => Heading::West,
            (1, 0)  => Heading::South,
            _       => Heading::Undirected,
        }
    }

    /// Halfway between the two cells, in grid units.
    pub fn midpoint(&self) -> (f32, f32) {
        (
            (self.from.0 + self.to.0) as f32 / 2.0,
            (self.from.1 + self.to.1) as f32 / 2.0,
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Highway {
    pub edges: Vec<HighwayEdge>,
}

pub fn load_highway(path: &Path, height: usize, width: usize) -> PlanResult<Highway> {
    load_highway_reader(File::open(path)?, height, width)
}

pub fn load_highway_reader<R: Read>(reader: R, height: usize, width: usize) -> PlanResult<Highway> {
    let cells = (height * width) as u64;
    let mut lines = numbered_lines(reader);

    let (_, header) = lines.next().transpose()?.ok_or_else(|| highway_error(1, "empty file"))?;
    let declared: usize = header
        .trim()
        .parse()
        .map_err(|_| highway_error(1, format!("edge count `{}` is not a number", header.trim())))?;

    let mut edges = Vec::with_capacity(declared);
    for line in lines {
        let (n, text) = line?;
        let index: u64 = text
            .trim()
            .parse()
            .map_err(|_| highway_error(n, format!("edge index `{}` is not a number", text.trim())))?;
        let from = (index / cells.max(1))
            .checked_sub(1)
            .filter(|&from| from < cells)
            .ok_or_else(|| highway_error(n, format!("edge index {index} has no source cell")))?;
        let to = index % cells.max(1);
        let edge = HighwayEdge { from: cell_of(from, width), to: cell_of(to, width) };
        if edge.heading() == Heading::Undirected {
            return Err(highway_error(n, format!("{:?} and {:?} are not neighbours", edge.from, edge.to)));
        }
        edges.push(edge);
    }

    if edges.len() != declared {
        return Err(highway_error(1, format!("header declares {declared} edges, file lists {}", edges.len())));
    }
    Ok(Highway { edges })
}

fn highway_error(line: usize, reason: impl Into<String>) -> PlanError {
    PlanError::Overlay { what: "highway", line, reason: reason.into() }
}

// ── Heuristic ─────────────────────────────────────────────────────────────────

/// One agent's heuristic value per cell.
#[derive(Clone, Debug, PartialEq)]
pub struct HeuristicMap {
    pub agent:  AgentId,
    pub height: usize,
    pub width:  usize,
    /// Row-major; `None` for cells the agent cannot reach.
    values:     Vec<Option<f64>>,
}

impl HeuristicMap {
    /// Value of `(row, col)`; `None` off the grid or when unreachable.
    pub fn get(&self, row: i32, col: i32) -> Option<f64> {
        let row = usize::try_from(row).ok().filter(|&r| r < self.height)?;
        let col = usize::try_from(col).ok().filter(|&c| c < self.width)?;
        self.values[row * self.width + col]
    }

    /// Smallest and largest reachable value.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.values.iter().flatten().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    pub fn reachable(&self) -> usize {
        self.values.iter().flatten().count()
    }
}

pub fn load_heuristic(path: &Path, agent: AgentId, height: usize, width: usize) -> PlanResult<HeuristicMap> {
    load_heuristic_reader(File::open(path)?, agent, height, width)
}

/// Read the line of `agent` from a heuristic table.
pub fn load_heuristic_reader<R: Read>(
    reader: R,
    agent:  AgentId,
    height: usize,
    width:  usize,
) -> PlanResult<HeuristicMap> {
    for line in numbered_lines(reader) {
        let (n, text) = line?;
        let mut fields = text.trim().split(',');
        let Some(Ok(id)) = fields.next().map(|f| f.trim().parse::<u32>()) else { continue };
        if id != agent.0 {
            continue;
        }

        let values = fields
            .map(|f| -> PlanResult<Option<f64>> {
                let v: f64 = f
                    .trim()
                    .parse()
                    .map_err(|_| heuristic_error(n, format!("value `{}` is not a number", f.trim())))?;
                Ok((v.is_finite() && !UNREACHABLE.contains(&v)).then_some(v))
            })
            .collect::<PlanResult<Vec<_>>>()?;
        if values.len() != height * width {
            return Err(heuristic_error(
                n,
                format!("{} values for a {height}x{width} map", values.len()),
            ));
        }
        return Ok(HeuristicMap { agent, height, width, values });
    }
    Err(PlanError::MissingHeuristic(agent))
}

fn heuristic_error(line: usize, reason: impl Into<String>) -> PlanError {
    PlanError::Overlay { what: "heuristic", line, reason: reason.into() }
}

// ── Search trees ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ExpansionRecord {
    loc: u64,
}

/// How often a low-level search expanded each cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchTree {
    /// File stem; usually the agent the search ran for.
    pub name:       String,
    pub expansions: HeatMap,
}

pub fn load_search_tree(path: &Path, height: usize, width: usize) -> PlanResult<SearchTree> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    load_search_tree_reader(name, File::open(path)?, height, width)
}

pub fn load_search_tree_reader<R: Read>(
    name:   impl Into<String>,
    reader: R,
    height: usize,
    width:  usize,
) -> PlanResult<SearchTree> {
    let mut expansions = HeatMap::new(height, width);
    let mut csv_reader = csv::Reader::from_reader(reader);
    for (i, row) in csv_reader.deserialize::<ExpansionRecord>().enumerate() {
        let loc = row?.loc;
        let (row, col) = cell_of(loc, width);
        if !expansions.visit(row, col) {
            return Err(PlanError::Overlay {
                what:   "search tree",
                line:   i + 2,
                reason: format!("cell {loc} lies outside the {height}x{width} map"),
            });
        }
    }
    Ok(SearchTree { name: name.into(), expansions })
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn cell_of(loc: u64, width: usize) -> (i32, i32) {
    let width = width.max(1) as u64;
    ((loc / width) as i32, (loc % width) as i32)
}

/// Non-blank lines with 1-based line numbers.
fn numbered_lines<R: Read>(reader: R) -> impl Iterator<Item = PlanResult<(usize, String)>> {
    BufReader::new(reader)
        .lines()
        .enumerate()
        .filter(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
        .map(|(i, line)| -> PlanResult<(usize, String)> { Ok((i + 1, line?)) })
}
