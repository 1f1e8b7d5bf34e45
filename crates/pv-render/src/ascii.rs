//! A character-cell canvas for terminals.
//!
//! Each grid cell shows the top-most visible shape covering it:
//!
//! | Char         | Shape                                          |
//! |--------------|------------------------------------------------|
//! | `@`          | obstacle                                       |
//! | `0`–`9`      | heat, heuristic, or search cell, by intensity  |
//! | `> ^ < v`    | highway edge direction                         |
//! | `+` / `*`    | path marker (move / wait)                      |
//! | `s`          | start marker                                   |
//! | `u n a f`    | task: unassigned, newly assigned, assigned, finished |
//! | `A N X`      | agent: base, newly assigned, in a selected conflict |
//! | `.`          | empty                                          |
//!
//! Grid lines and heading markers have no character of their own.  Shapes
//! mid-animation are drawn at their nearest cell.

use pv_core::Heading;

use crate::{Canvas, Color, Shape, ShapeId, ShapeKind};

#[derive(Clone, Debug, PartialEq)]
struct Placed {
    shape: Shape,
    angle: f32,
}

#[derive(Clone, Debug, Default)]
pub struct AsciiCanvas {
    height:    usize,
    width:     usize,
    shapes:    Vec<Placed>,
    refreshes: u64,
}

impl AsciiCanvas {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width, shapes: Vec::new(), refreshes: 0 }
    }

    /// Current state of a shape.
    pub fn shape(&self, id: ShapeId) -> &Shape {
        &self.shapes[id.index()].shape
    }

    pub fn angle(&self, id: ShapeId) -> f32 {
        self.shapes[id.index()].angle
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Number of [`Canvas::refresh`] calls so far, i.e. frames presented.
    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    /// The nearest cell a shape covers, if it lies on the grid.
    pub fn cell_of(&self, id: ShapeId) -> Option<(usize, usize)> {
        let shape = self.shape(id);
        let row = shape.row.round();
        let col = shape.col.round();
        if row < 0.0 || col < 0.0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        (row < self.height && col < self.width).then_some((row, col))
    }

    /// The character drawn for `(row, col)`.
    pub fn char_at(&self, row: usize, col: usize) -> char {
        self.top_shape(row, col).and_then(glyph).unwrap_or('.')
    }

    /// One line per grid row.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        let mut top: Vec<Option<&Shape>> = vec![None; self.height * self.width];
        for (i, placed) in self.shapes.iter().enumerate() {
            let shape = &placed.shape;
            if !shape.visible || glyph(shape).is_none() {
                continue;
            }
            let Some((row, col)) = self.cell_of(ShapeId(i as u32)) else { continue };
            let slot = &mut top[row * self.width + col];
            // Later shapes of the same layer win, like on a real canvas.
            if slot.is_none_or(|s| s.kind.layer() <= shape.kind.layer()) {
                *slot = Some(shape);
            }
        }
        for row in top.chunks(self.width.max(1)).take(self.height) {
            out.extend(row.iter().map(|s| s.and_then(glyph).unwrap_or('.')));
            out.push('\n');
        }
        out
    }

    fn top_shape(&self, row: usize, col: usize) -> Option<&Shape> {
        self.shapes
            .iter()
            .enumerate()
            .filter(|(i, p)| p.shape.visible && self.cell_of(ShapeId(*i as u32)) == Some((row, col)))
            .map(|(_, p)| &p.shape)
            .filter(|s| glyph(s).is_some())
            .fold(None, |top: Option<&Shape>, s| match top {
                Some(t) if t.kind.layer() > s.kind.layer() => Some(t),
                _ => Some(s),
            })
    }
}

fn glyph(shape: &Shape) -> Option<char> {
    let ch = match shape.kind {
        ShapeKind::GridLine { .. } | ShapeKind::HeadingMarker => return None,
        ShapeKind::Obstacle => '@',
        ShapeKind::HeatCell | ShapeKind::HeuristicCell | ShapeKind::SearchCell => match shape.fill {
            Color::Heat(level) | Color::Shade(level) | Color::Blues(level) => {
                char::from(b'0' + (level as u16 * 9 / 255) as u8)
            }
            _ => '0',
        },
        ShapeKind::HighwayArrow { heading } => match heading {
            Heading::East       => '>',
            Heading::North      => '^',
            Heading::West       => '<',
            Heading::South      => 'v',
            Heading::Undirected => return None,
        },
        ShapeKind::PathMarker { wait: false } => '+',
        ShapeKind::PathMarker { wait: true } => '*',
        ShapeKind::StartMarker => 's',
        ShapeKind::Task => match shape.fill {
            Color::Khaki       => 'u',
            Color::YellowGreen => 'n',
            Color::Orange      => 'a',
            _                  => 'f',
        },
        ShapeKind::Agent => match shape.fill {
            Color::YellowGreen => 'N',
            Color::Red         => 'X',
            _                  => 'A',
        },
    };
    Some(ch)
}

impl Canvas for AsciiCanvas {
    fn create_shape(&mut self, shape: Shape) -> ShapeId {
        let id = ShapeId(self.shapes.len() as u32);
        self.shapes.push(Placed { shape, angle: 0.0 });
        id
    }

    fn set_fill(&mut self, id: ShapeId, fill: Color) {
        self.shapes[id.index()].shape.fill = fill;
    }

    fn move_by(&mut self, id: ShapeId, d_row: f32, d_col: f32) {
        let shape = &mut self.shapes[id.index()].shape;
        shape.row += d_row;
        shape.col += d_col;
    }

    fn set_angle(&mut self, id: ShapeId, radians: f32) {
        self.shapes[id.index()].angle = radians;
    }

    fn set_visible(&mut self, id: ShapeId, visible: bool) {
        self.shapes[id.index()].shape.visible = visible;
    }

    fn set_label(&mut self, id: ShapeId, label: Option<&str>) {
        self.shapes[id.index()].shape.label = label.map(str::to_owned);
    }

    fn refresh(&mut self) {
        self.refreshes += 1;
    }
}
