//! Scene: the mapping from plan items to canvas shapes.
//!
//! # Lifecycle
//!
//! ```text
//! Scene::build        create every shape once, hidden where the config says
//! Scene::apply        draw a Transition in one go
//! Scene::animate      draw a Transition in `moves` sub-frames with a delay
//! Scene::redraw_all   resynchronise everything from a ReplayState
//! ```
//!
//! The scene remembers the pose each agent is drawn at, so moves are issued
//! as relative `move_by` calls from wherever the shape really is.
//!
//! Overlays (heat map, highway, heuristic, search trees) start hidden and
//! get their shapes on first show.

use std::collections::{BTreeMap, BTreeSet};
use std::f32::consts::FRAC_PI_2;
use std::thread;
use std::time::Duration;

use tracing::debug;

use pv_core::{AgentId, GridMap, Pose, Timestep};
use pv_plan::{Conflict, HeatMap, HeuristicMap, Highway, Plan, SearchTree};
use pv_timeline::{ReplayState, Transition};

use crate::color::{agent_color, heat_color, heuristic_color, search_color, task_color};
use crate::{Canvas, Color, Shape, ShapeId, ShapeKind, VizConfig};

struct AgentShapes {
    body:    ShapeId,
    heading: Option<ShapeId>,
    start:   ShapeId,
    /// One marker per planned-path step.
    path:    Vec<ShapeId>,
}

/// Shapes of one toggleable overlay.
#[derive(Debug, Default)]
struct Overlay {
    shapes:  Vec<ShapeId>,
    visible: bool,
}

impl Overlay {
    /// Reveal the overlay, letting `create` draw it the first time.
    fn show<C, F>(&mut self, canvas: &mut C, create: F)
    where
        C: Canvas + ?Sized,
        F: FnOnce(&mut C) -> Vec<ShapeId>,
    {
        if self.shapes.is_empty() {
            self.shapes = create(canvas);
        } else {
            for &id in &self.shapes {
                canvas.set_visible(id, true);
            }
        }
        self.visible = true;
        canvas.refresh();
    }

    fn hide<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        for &id in &self.shapes {
            canvas.set_visible(id, false);
        }
        self.visible = false;
        canvas.refresh();
    }
}

pub struct Scene {
    config:          VizConfig,
    window_start:    Timestep,
    grid_lines:      Vec<ShapeId>,
    heat:            Overlay,
    highway:         Overlay,
    heuristic:       Overlay,
    /// Keyed by tree name.
    search:          BTreeMap<String, Overlay>,
    agents:          Vec<AgentShapes>,
    /// `[task_slot][errand]`.
    tasks:           Vec<Vec<ShapeId>>,
    /// Pose each agent body is drawn at right now.
    drawn:           Vec<Pose>,
    conflict_agents: BTreeSet<AgentId>,
    selected:        BTreeSet<AgentId>,
    shown_paths:     BTreeSet<AgentId>,
}

impl Scene {
    /// Create every shape for `plan` on `canvas`, matching `state`.
    pub fn build<C: Canvas + ?Sized>(
        plan:   &Plan,
        map:    &GridMap,
        state:  &ReplayState,
        config: VizConfig,
        canvas: &mut C,
    ) -> Self {
        let mut grid_lines = Vec::with_capacity(map.height + map.width + 2);
        for row in 0..=map.height as i32 {
            let line = Shape::new(ShapeKind::GridLine { horizontal: true }, row, 0, Color::Grey);
            grid_lines.push(canvas.create_shape(line.with_visibility(config.show_grid)));
        }
        for col in 0..=map.width as i32 {
            let line = Shape::new(ShapeKind::GridLine { horizontal: false }, 0, col, Color::Grey);
            grid_lines.push(canvas.create_shape(line.with_visibility(config.show_grid)));
        }

        for (row, col, cell) in map.cells() {
            if !cell.is_passable() {
                canvas.create_shape(Shape::new(ShapeKind::Obstacle, row as i32, col as i32, Color::Black));
            }
        }

        let oriented = plan.action_model.is_oriented();
        let mut agents = Vec::with_capacity(plan.team_size());
        for agent in &plan.agents {
            let first = agent.start;
            let mut start = Shape::new(ShapeKind::StartMarker, first.row, first.col, Color::Grey)
                .with_visibility(config.show_static);
            if config.show_agent_ids && config.show_static {
                start = start.with_label(agent.id.0.to_string());
            }
            let start = canvas.create_shape(start);

            let path = agent
                .plan_path
                .iter()
                .enumerate()
                .map(|(i, pose)| {
                    let wait = i > 0 && agent.plan_path[i - 1].same_cell(*pose);
                    let marker = Shape::new(ShapeKind::PathMarker { wait }, pose.row, pose.col, Color::Purple);
                    canvas.create_shape(marker.hidden())
                })
                .collect();

            let pose = state.pose(agent.id);
            let collide = config.show_conflict_agents && plan.conflict_agents.contains(&agent.id);
            let mut body = Shape::new(ShapeKind::Agent, pose.row, pose.col, agent_color(state.highlight(agent.id), collide));
            if config.show_agent_ids {
                body = body.with_label(agent.id.0.to_string());
            }
            let body = canvas.create_shape(body);
            let heading = oriented.then(|| {
                let dot = canvas.create_shape(Shape::new(ShapeKind::HeadingMarker, pose.row, pose.col, Color::Navy));
                canvas.set_angle(dot, pose.heading.angle());
                dot
            });

            agents.push(AgentShapes { body, heading, start, path });
        }

        let tasks = plan
            .tasks
            .iter()
            .zip(state.task_states())
            .map(|(task, states)| {
                task.errands
                    .iter()
                    .zip(states)
                    .map(|(errand, &s)| {
                        let (row, col) = errand.location;
                        let mut shape = Shape::new(ShapeKind::Task, row, col, task_color(s))
                            .with_visibility(config.task_filter.shows(s));
                        if config.show_task_ids {
                            shape = shape.with_label(task.id.0.to_string());
                        }
                        canvas.create_shape(shape)
                    })
                    .collect()
            })
            .collect();

        let scene = Self {
            config,
            window_start: plan.window.start,
            grid_lines,
            heat: Overlay::default(),
            highway: Overlay::default(),
            heuristic: Overlay::default(),
            search: BTreeMap::new(),
            agents,
            tasks,
            drawn: state.poses().to_vec(),
            conflict_agents: plan.conflict_agents.clone(),
            selected: BTreeSet::new(),
            shown_paths: BTreeSet::new(),
        };

        debug!(
            agents = scene.agents.len(),
            tasks = scene.tasks.iter().map(Vec::len).sum::<usize>(),
            "scene built"
        );
        canvas.refresh();
        scene
    }

    pub fn config(&self) -> &VizConfig {
        &self.config
    }

    pub fn agent_shape(&self, agent: AgentId) -> ShapeId {
        self.agents[agent.index()].body
    }

    pub fn heading_shape(&self, agent: AgentId) -> Option<ShapeId> {
        self.agents[agent.index()].heading
    }

    pub fn start_shape(&self, agent: AgentId) -> ShapeId {
        self.agents[agent.index()].start
    }

    pub fn path_shapes(&self, agent: AgentId) -> &[ShapeId] {
        &self.agents[agent.index()].path
    }

    pub fn task_shape(&self, slot: usize, errand: usize) -> ShapeId {
        self.tasks[slot][errand]
    }

    pub fn grid_shapes(&self) -> &[ShapeId] {
        &self.grid_lines
    }

    /// Pose the agent's shape is drawn at.
    pub fn drawn_pose(&self, agent: AgentId) -> Pose {
        self.drawn[agent.index()]
    }

    // ── Drawing transitions ──────────────────────────────────────────────────

    /// Draw `transition` immediately: moves in one jump, then fills.
    pub fn apply<C: Canvas + ?Sized>(&mut self, transition: &Transition, state: &ReplayState, canvas: &mut C) {
        for mv in &transition.moves {
            self.place_agent(mv.agent, mv.to, canvas);
        }
        self.paint(transition, state, canvas);
        canvas.refresh();
    }

    /// Draw `transition` as `moves` sub-frames with `delay` pauses, rotating
    /// heading markers a quarter turn at most.  Blocks the calling thread.
    pub fn animate<C: Canvas + ?Sized>(&mut self, transition: &Transition, state: &ReplayState, canvas: &mut C) {
        let frames = self.config.frames();
        let delay = self.config.frame_delay();

        if !transition.moves.is_empty() {
            for frame in 1..=frames {
                for mv in &transition.moves {
                    let shapes = &self.agents[mv.agent.index()];
                    let from = self.drawn[mv.agent.index()];
                    let d_row = (mv.to.row - from.row) as f32 / frames as f32;
                    let d_col = (mv.to.col - from.col) as f32 / frames as f32;
                    canvas.move_by(shapes.body, d_row, d_col);
                    if let Some(dot) = shapes.heading {
                        canvas.move_by(dot, d_row, d_col);
                        let turn = from.heading.rotation_to(mv.to.heading) as f32 * FRAC_PI_2;
                        canvas.set_angle(dot, from.heading.angle() + turn * frame as f32 / frames as f32);
                    }
                }
                canvas.refresh();
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
            }
            for mv in &transition.moves {
                self.drawn[mv.agent.index()] = mv.to;
                if let Some(dot) = self.agents[mv.agent.index()].heading {
                    canvas.set_angle(dot, mv.to.heading.angle());
                }
            }
        }

        self.paint(transition, state, canvas);
        canvas.refresh();
    }

    /// Resynchronise every agent, task, and path marker with `state`.
    pub fn redraw_all<C: Canvas + ?Sized>(&mut self, state: &ReplayState, canvas: &mut C) {
        for (i, &pose) in state.poses().iter().enumerate() {
            self.place_agent(AgentId(i as u32), pose, canvas);
        }
        for (slot, states) in state.task_states().iter().enumerate() {
            for (errand, &s) in states.iter().enumerate() {
                let id = self.tasks[slot][errand];
                canvas.set_fill(id, task_color(s));
                canvas.set_visible(id, self.config.task_filter.shows(s));
            }
        }
        self.paint_agents(0..self.agents.len(), state, canvas);
        self.refresh_paths(state, canvas);
        canvas.refresh();
    }

    /// Animate `preview`, hold it for `hold`, then jump the agents back.
    /// `state` is the settled state the preview started from.
    pub fn preview<C: Canvas + ?Sized>(
        &mut self,
        preview: &Transition,
        state:   &ReplayState,
        hold:    Duration,
        canvas:  &mut C,
    ) {
        self.animate(preview, state, canvas);
        if !hold.is_zero() {
            thread::sleep(hold);
        }
        self.apply(&preview.reversed_moves(), state, canvas);
    }

    // ── Conflicts, paths, overlays ───────────────────────────────────────────

    /// Paint the agents of `conflicts` red, restoring previously selected
    /// agents to their normal colour.
    pub fn select_conflicts<'c, C: Canvas + ?Sized>(
        &mut self,
        conflicts: impl IntoIterator<Item = &'c Conflict>,
        state:     &ReplayState,
        canvas:    &mut C,
    ) {
        let previous = std::mem::take(&mut self.selected);
        self.selected = conflicts.into_iter().flat_map(Conflict::agents).collect();
        let touched: BTreeSet<usize> = previous.union(&self.selected).map(|a| a.index()).collect();
        self.paint_agents(touched, state, canvas);
        canvas.refresh();
    }

    pub fn clear_selection<C: Canvas + ?Sized>(&mut self, state: &ReplayState, canvas: &mut C) {
        self.select_conflicts(std::iter::empty(), state, canvas);
    }

    pub fn selected(&self) -> &BTreeSet<AgentId> {
        &self.selected
    }

    /// Show or hide the remaining planned path of `agent`.  Returns whether
    /// it is shown afterwards.
    pub fn toggle_path<C: Canvas + ?Sized>(&mut self, agent: AgentId, state: &ReplayState, canvas: &mut C) -> bool {
        let shown = if self.shown_paths.remove(&agent) {
            false
        } else {
            self.shown_paths.insert(agent)
        };
        let offset = state.timestep().since(self.window_start) as usize;
        for (i, &marker) in self.agents[agent.index()].path.iter().enumerate() {
            canvas.set_visible(marker, shown && i > offset);
        }
        canvas.refresh();
        shown
    }

    /// Overlay `heat`, creating the cells on first use.
    pub fn show_heat<C: Canvas + ?Sized>(&mut self, heat: &HeatMap, canvas: &mut C) {
        self.heat.show(canvas, |canvas| counted_cells(heat, ShapeKind::HeatCell, heat_color, heat.max(), canvas));
    }

    pub fn hide_heat<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        self.heat.hide(canvas);
    }

    pub fn heat_visible(&self) -> bool {
        self.heat.visible
    }

    /// Overlay one arrow per highway edge.
    pub fn show_highway<C: Canvas + ?Sized>(&mut self, highway: &Highway, canvas: &mut C) {
        self.highway.show(canvas, |canvas| {
            highway
                .edges
                .iter()
                .map(|edge| {
                    let (row, col) = edge.midpoint();
                    let kind = ShapeKind::HighwayArrow { heading: edge.heading() };
                    canvas.create_shape(Shape::new(kind, 0, 0, Color::Red).at(row, col))
                })
                .collect()
        });
    }

    pub fn hide_highway<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        self.highway.hide(canvas);
    }

    pub fn highway_visible(&self) -> bool {
        self.highway.visible
    }

    /// Overlay the reachable cells of `heuristic`, labelled with their
    /// rounded value.
    pub fn show_heuristic<C: Canvas + ?Sized>(&mut self, heuristic: &HeuristicMap, canvas: &mut C) {
        self.heuristic.show(canvas, |canvas| {
            let Some((lo, hi)) = heuristic.range() else { return Vec::new() };
            let mut shapes = Vec::with_capacity(heuristic.reachable());
            for row in 0..heuristic.height as i32 {
                for col in 0..heuristic.width as i32 {
                    let Some(value) = heuristic.get(row, col) else { continue };
                    let cell = Shape::new(ShapeKind::HeuristicCell, row, col, heuristic_color(value, lo, hi))
                        .with_label(format!("{}", value.round()));
                    shapes.push(canvas.create_shape(cell));
                }
            }
            shapes
        });
    }

    pub fn hide_heuristic<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        self.heuristic.hide(canvas);
    }

    pub fn heuristic_visible(&self) -> bool {
        self.heuristic.visible
    }

    /// Overlay the expansions of `tree`, shaded against `scale`, the
    /// busiest cell over every tree of the session.
    pub fn show_search_tree<C: Canvas + ?Sized>(&mut self, tree: &SearchTree, scale: u32, canvas: &mut C) {
        let overlay = self.search.entry(tree.name.clone()).or_default();
        overlay.show(canvas, |canvas| {
            counted_cells(&tree.expansions, ShapeKind::SearchCell, search_color, scale, canvas)
        });
    }

    pub fn hide_search_tree<C: Canvas + ?Sized>(&mut self, name: &str, canvas: &mut C) {
        if let Some(overlay) = self.search.get_mut(name) {
            overlay.hide(canvas);
        }
    }

    pub fn search_tree_visible(&self, name: &str) -> bool {
        self.search.get(name).is_some_and(|o| o.visible)
    }

    // ── Configuration ────────────────────────────────────────────────────────

    /// Switch display toggles and re-apply them to every shape.
    pub fn set_config<C: Canvas + ?Sized>(&mut self, config: VizConfig, plan: &Plan, state: &ReplayState, canvas: &mut C) {
        self.config = config;
        for &line in &self.grid_lines {
            canvas.set_visible(line, self.config.show_grid);
        }
        for (agent, shapes) in plan.agents.iter().zip(&self.agents) {
            let id = agent.id.0.to_string();
            canvas.set_visible(shapes.start, self.config.show_static);
            let start_label = self.config.show_agent_ids && self.config.show_static;
            canvas.set_label(shapes.start, start_label.then_some(id.as_str()));
            canvas.set_label(shapes.body, self.config.show_agent_ids.then_some(id.as_str()));
        }
        for (task, shapes) in plan.tasks.iter().zip(&self.tasks) {
            let id = task.id.0.to_string();
            for &shape in shapes {
                canvas.set_label(shape, self.config.show_task_ids.then_some(id.as_str()));
            }
        }
        self.redraw_all(state, canvas);
    }

    // ── Internals ────────────────────────────────────────────────────────────

    fn agent_fill(&self, agent: AgentId, state: &ReplayState) -> Color {
        let collide = self.selected.contains(&agent)
            || (self.config.show_conflict_agents && self.conflict_agents.contains(&agent));
        agent_color(state.highlight(agent), collide)
    }

    fn paint_agents<C: Canvas + ?Sized>(
        &self,
        agents: impl IntoIterator<Item = usize>,
        state:  &ReplayState,
        canvas: &mut C,
    ) {
        for i in agents {
            let agent = AgentId(i as u32);
            canvas.set_fill(self.agents[i].body, self.agent_fill(agent, state));
        }
    }

    /// Task and highlight fills of `transition`, then path markers.
    fn paint<C: Canvas + ?Sized>(&self, transition: &Transition, state: &ReplayState, canvas: &mut C) {
        for change in &transition.tasks {
            let id = self.tasks[change.task_slot][change.errand];
            canvas.set_fill(id, task_color(change.state));
            canvas.set_visible(id, self.config.task_filter.shows(change.state));
        }
        self.paint_agents(transition.highlights.iter().map(|h| h.agent.index()), state, canvas);
        if transition.from != transition.to {
            self.refresh_paths(state, canvas);
        }
    }

    /// Hide markers of displayed paths the agents have already passed.
    fn refresh_paths<C: Canvas + ?Sized>(&self, state: &ReplayState, canvas: &mut C) {
        let offset = state.timestep().since(self.window_start) as usize;
        for agent in &self.shown_paths {
            for (i, &marker) in self.agents[agent.index()].path.iter().enumerate() {
                canvas.set_visible(marker, i > offset);
            }
        }
    }

    /// Move an agent's shapes to `to` from wherever they are drawn.
    fn place_agent<C: Canvas + ?Sized>(&mut self, agent: AgentId, to: Pose, canvas: &mut C) {
        let shapes = &self.agents[agent.index()];
        let from = self.drawn[agent.index()];
        let (d_row, d_col) = ((to.row - from.row) as f32, (to.col - from.col) as f32);
        if d_row != 0.0 || d_col != 0.0 {
            canvas.move_by(shapes.body, d_row, d_col);
            if let Some(dot) = shapes.heading {
                canvas.move_by(dot, d_row, d_col);
            }
        }
        if let Some(dot) = shapes.heading {
            canvas.set_angle(dot, to.heading.angle());
        }
        self.drawn[agent.index()] = to;
    }
}

/// One shape per non-zero cell of `counts`.
fn counted_cells<C: Canvas + ?Sized>(
    counts: &HeatMap,
    kind:   ShapeKind,
    color:  fn(u32, u32) -> Color,
    scale:  u32,
    canvas: &mut C,
) -> Vec<ShapeId> {
    let mut shapes = Vec::new();
    for row in 0..counts.height as i32 {
        for col in 0..counts.width as i32 {
            let count = counts.get(row, col).unwrap_or(0);
            if count == 0 {
                continue;
            }
            let cell = Shape::new(kind, row, col, color(count, scale)).with_label(count.to_string());
            shapes.push(canvas.create_shape(cell));
        }
    }
    shapes
}
