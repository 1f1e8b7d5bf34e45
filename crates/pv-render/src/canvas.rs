//! The drawing surface capability.
//!
//! A [`Canvas`] knows how to create, recolor, move, rotate, and hide shapes
//! placed in grid coordinates.  It holds no replay logic: the
//! [`Scene`][crate::Scene] decides what to draw, the canvas only draws it.
//! Every call is idempotent with respect to its arguments except
//! [`Canvas::move_by`], which is relative.

use pv_core::Heading;

use crate::Color;

/// Handle to a shape on a canvas, issued by [`Canvas::create_shape`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct ShapeId(pub u32);

impl ShapeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a shape represents; decides its geometry and stacking.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ShapeKind {
    /// A full-width (`horizontal`) or full-height line on a cell boundary.
    GridLine { horizontal: bool },
    Obstacle,
    HeatCell,
    /// One agent's heuristic value for a cell.
    HeuristicCell,
    /// A cell a low-level search expanded.
    SearchCell,
    /// Direction of a highway edge, placed between its two cells.
    HighwayArrow { heading: Heading },
    /// A future step of a displayed agent path; `wait` steps are drawn larger.
    PathMarker { wait: bool },
    StartMarker,
    Task,
    Agent,
    /// The dot showing an oriented agent's heading.
    HeadingMarker,
}

impl ShapeKind {
    /// Stacking order; higher is drawn on top.
    pub fn layer(self) -> u8 {
        match self {
            ShapeKind::GridLine { .. }     => 0,
            ShapeKind::Obstacle            => 1,
            ShapeKind::HeatCell
            | ShapeKind::HeuristicCell
            | ShapeKind::SearchCell        => 2,
            ShapeKind::HighwayArrow { .. } => 3,
            ShapeKind::PathMarker { .. }   => 4,
            ShapeKind::StartMarker         => 5,
            ShapeKind::Task                => 6,
            ShapeKind::Agent               => 7,
            ShapeKind::HeadingMarker       => 8,
        }
    }
}

/// Everything needed to create a shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub kind:    ShapeKind,
    /// Top-left corner of the shape's cell, in grid units.
    pub row:     f32,
    pub col:     f32,
    pub fill:    Color,
    pub label:   Option<String>,
    pub visible: bool,
}

impl Shape {
    pub fn new(kind: ShapeKind, row: i32, col: i32, fill: Color) -> Self {
        Self { kind, row: row as f32, col: col as f32, fill, label: None, visible: true }
    }

    /// Place at fractional grid coordinates.
    pub fn at(mut self, row: f32, col: f32) -> Self {
        self.row = row;
        self.col = col;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

/// A drawing surface.
pub trait Canvas {
    fn create_shape(&mut self, shape: Shape) -> ShapeId;

    fn set_fill(&mut self, id: ShapeId, fill: Color);

    /// Translate by a fraction of a cell.
    fn move_by(&mut self, id: ShapeId, d_row: f32, d_col: f32);

    /// Orientation in radians (east = 0, counter-clockwise positive).
    /// Shapes without an orientation ignore it.
    fn set_angle(&mut self, _id: ShapeId, _radians: f32) {}

    fn set_visible(&mut self, id: ShapeId, visible: bool);

    fn set_label(&mut self, id: ShapeId, label: Option<&str>);

    /// Present pending changes.  Called once per animation sub-frame.
    fn refresh(&mut self) {}
}
