//! One interactive replay: reconciler, scene, and canvas kept in step.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, bail};
use tracing::info;

use pv_core::{AgentId, GridMap, TaskId};
use pv_plan::{HeatMap, HeuristicMap, Highway, PathSource, Plan, SearchTree};
use pv_render::{AsciiCanvas, NoopObserver, Player, ReplayObserver, Scene, TaskFilter, TraceWriter, VizConfig};
use pv_timeline::{JumpOutcome, Reconciler};

use crate::command::{Command, HELP};

/// What the command loop should do after a command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Everything the session can draw over the grid.
#[derive(Debug)]
pub struct Overlays {
    pub heat:         HeatMap,
    pub highway:      Option<Highway>,
    pub heuristic:    Option<HeuristicMap>,
    pub search_trees: Vec<SearchTree>,
}

impl Overlays {
    /// Just the heat map.
    pub fn new(heat: HeatMap) -> Self {
        Self { heat, highway: None, heuristic: None, search_trees: Vec::new() }
    }

    /// Busiest cell over every search tree; trees share one shading scale.
    fn search_scale(&self) -> u32 {
        self.search_trees.iter().map(|t| t.expansions.max()).max().unwrap_or(0)
    }
}

pub struct Session<'p> {
    rec:      Reconciler<'p>,
    scene:    Scene,
    canvas:   AsciiCanvas,
    overlays: Overlays,
    /// Cleared to pause `play`; shared with the Ctrl-C handler.
    running:  Arc<AtomicBool>,
    trace:    Option<TraceWriter>,
    noop:     NoopObserver,
}

impl<'p> Session<'p> {
    pub fn new(
        plan:     &'p Plan,
        map:      &GridMap,
        overlays: Overlays,
        config:   VizConfig,
        trace:    Option<TraceWriter>,
    ) -> Self {
        let rec = Reconciler::new(plan);
        let mut canvas = AsciiCanvas::new(map.height, map.width);
        let scene = Scene::build(plan, map, rec.state(), config, &mut canvas);
        let mut session = Self {
            rec,
            scene,
            canvas,
            overlays,
            running: Arc::new(AtomicBool::new(true)),
            trace,
            noop: NoopObserver,
        };
        let (plan, state) = (session.rec.plan(), session.rec.state());
        match &mut session.trace {
            Some(trace) => trace.on_start(plan, state),
            None => session.noop.on_start(plan, state),
        }
        session
    }

    pub fn plan(&self) -> &'p Plan {
        self.rec.plan()
    }

    pub fn canvas(&self) -> &AsciiCanvas {
        &self.canvas
    }

    /// The flag `play` checks between steps.  Store `false` to pause.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// One status line: timestep, task counts, and conflicts right now.
    pub fn status(&self) -> String {
        let snapshot = self.rec.snapshot();
        let source = match self.rec.path_source() {
            PathSource::Executed => "exec",
            PathSource::Planned  => "plan",
        };
        let mut line = format!("{snapshot} ({source}, window {})", self.plan().window);
        let conflicts = self.plan().conflicts_at(self.rec.timestep()).count();
        if conflicts > 0 {
            line.push_str(&format!(", {conflicts} conflict(s) now"));
        }
        line
    }

    /// Run one command.  Listings are returned as text; moves redraw the
    /// canvas.
    pub fn execute(&mut self, command: Command) -> Result<(Flow, Option<String>)> {
        let listing = match command {
            Command::Next => {
                match self.rec.step_forward() {
                    Some(t) => {
                        self.scene.animate(&t, self.rec.state(), &mut self.canvas);
                        observer(&mut self.trace, &mut self.noop).on_step(self.rec.plan(), self.rec.state(), &t);
                    }
                    None => info!("already at the last timestep"),
                }
                None
            }
            Command::Prev => {
                match self.rec.step_backward() {
                    Some(t) => {
                        self.scene.animate(&t, self.rec.state(), &mut self.canvas);
                        observer(&mut self.trace, &mut self.noop).on_step(self.rec.plan(), self.rec.state(), &t);
                    }
                    None => info!("already at the first timestep"),
                }
                None
            }
            Command::Goto(t) => {
                let outcome = self.rec.jump_to(t);
                self.show_jump(&outcome);
                None
            }
            Command::Play(limit) => {
                let mut player = Player::new(self.scene.config());
                if let Some(limit) = limit {
                    player = player.limit(limit);
                }
                self.running.store(true, Ordering::Relaxed);
                let observer = observer(&mut self.trace, &mut self.noop);
                player.play(&mut self.rec, &mut self.scene, &mut self.canvas, observer, &self.running);
                None
            }
            Command::Restart => {
                let outcome = self.rec.restart();
                self.scene.clear_selection(self.rec.state(), &mut self.canvas);
                self.show_jump(&outcome);
                None
            }
            Command::Conflicts => Some(self.conflict_list()),
            Command::Conflict(i) => {
                let plan = self.plan();
                let Some(conflict) = plan.conflicts.get(i) else {
                    bail!("no conflict {i}; there are {}", plan.conflicts.len());
                };
                let outcome = self.rec.jump_to_conflict(conflict);
                self.show_jump(&outcome);
                self.scene.select_conflicts([conflict], self.rec.state(), &mut self.canvas);
                if let Some(preview) = self.rec.planned_preview() {
                    let hold = self.scene.config().preview_hold();
                    self.scene.preview(&preview, self.rec.state(), hold, &mut self.canvas);
                }
                Some(format!("conflict {i}: {conflict}"))
            }
            Command::Events => Some(self.event_list()),
            Command::Event(i) => {
                let plan = self.plan();
                let Some(event) = plan.events.iter().nth(i) else {
                    bail!("no event {i}; there are {}", plan.events.len());
                };
                let outcome = self.rec.jump_to_event(event);
                self.show_jump(&outcome);
                Some(format!("event {i}: {event}"))
            }
            Command::Path(a) => {
                self.check_agent(a)?;
                let shown = self.scene.toggle_path(AgentId(a), self.rec.state(), &mut self.canvas);
                Some(format!("planned path of agent {a} {}", if shown { "shown" } else { "hidden" }))
            }
            Command::Agent(a) => {
                self.check_agent(a)?;
                Some(self.agent_summary(AgentId(a)))
            }
            Command::Task(id) => Some(self.task_summary(TaskId(id))?),
            Command::Source(source) => {
                let t = self.rec.set_path_source(source);
                self.scene.apply(&t, self.rec.state(), &mut self.canvas);
                None
            }
            Command::Tasks(filter) => {
                let plan = self.plan();
                let config = VizConfig { task_filter: filter, ..self.scene.config().clone() };
                self.scene.set_config(config, plan, self.rec.state(), &mut self.canvas);
                Some(match filter {
                    TaskFilter::All => "showing all tasks".to_owned(),
                    TaskFilter::Only(state) => {
                        let tasks = self.rec.tasks_in_state(state);
                        format!("showing {} {state} errands", tasks.len())
                    }
                })
            }
            Command::Heat => {
                let heat = &self.overlays.heat;
                if self.scene.heat_visible() {
                    self.scene.hide_heat(&mut self.canvas);
                } else {
                    self.scene.show_heat(heat, &mut self.canvas);
                }
                Some(format!("heat map: busiest cell {} visits, {} in total", heat.max(), heat.total()))
            }
            Command::Highway => {
                let Some(highway) = &self.overlays.highway else { bail!("no highway loaded; pass --hw") };
                if self.scene.highway_visible() {
                    self.scene.hide_highway(&mut self.canvas);
                } else {
                    self.scene.show_highway(highway, &mut self.canvas);
                }
                Some(format!("highway: {} edges", highway.edges.len()))
            }
            Command::Heuristic => {
                let Some(heuristic) = &self.overlays.heuristic else { bail!("no heuristic loaded; pass --heu") };
                if self.scene.heuristic_visible() {
                    self.scene.hide_heuristic(&mut self.canvas);
                } else {
                    self.scene.show_heuristic(heuristic, &mut self.canvas);
                }
                Some(format!("heuristic of agent {}: {} reachable cells", heuristic.agent.0, heuristic.reachable()))
            }
            Command::Search(None) => Some(self.search_list()),
            Command::Search(Some(i)) => {
                let scale = self.overlays.search_scale();
                let Some(tree) = self.overlays.search_trees.get(i) else {
                    bail!("no search tree {i}; there are {}", self.overlays.search_trees.len());
                };
                if self.scene.search_tree_visible(&tree.name) {
                    self.scene.hide_search_tree(&tree.name, &mut self.canvas);
                } else {
                    self.scene.show_search_tree(tree, scale, &mut self.canvas);
                }
                Some(format!("search tree {}: {} expansions", tree.name, tree.expansions.total()))
            }
            Command::Status => Some(self.status()),
            Command::Help => Some(HELP.to_owned()),
            Command::Quit => return Ok((Flow::Quit, None)),
        };
        Ok((Flow::Continue, listing))
    }

    /// Notify observers that the session is over.
    pub fn finish(&mut self) -> Result<()> {
        let Some(trace) = self.trace.as_mut() else { return Ok(()) };
        trace.on_finish(self.rec.state());
        if let Some(e) = trace.take_error() {
            return Err(e.into());
        }
        info!(rows = trace.rows(), "trace written");
        Ok(())
    }

    fn show_jump(&mut self, outcome: &JumpOutcome) {
        self.scene.apply(&outcome.transition, self.rec.state(), &mut self.canvas);
        observer(&mut self.trace, &mut self.noop).on_jump(self.rec.plan(), self.rec.state(), outcome);
    }

    fn check_agent(&self, a: u32) -> Result<()> {
        if a as usize >= self.plan().team_size() {
            bail!("no agent {a}; the team has {}", self.plan().team_size());
        }
        Ok(())
    }

    /// Pose and assigned tasks of `agent`, each marked done or open.
    fn agent_summary(&self, agent: AgentId) -> String {
        let plan = self.plan();
        let now = self.rec.timestep();
        let tasks: Vec<String> = plan
            .tasks_of(agent)
            .into_iter()
            .filter_map(|id| plan.task(id))
            .map(|task| {
                let done = if task.is_complete_at(now) { "done" } else { "open" };
                format!("{} ({done})", task.id.0)
            })
            .collect();
        let tasks = if tasks.is_empty() { "none".to_owned() } else { tasks.join(", ") };
        format!("agent {} at {}; tasks: {tasks}", agent.0, self.rec.state().pose(agent))
    }

    /// Assignee and errand states of one task.
    fn task_summary(&self, id: TaskId) -> Result<String> {
        let Some(task) = self.plan().task(id) else { bail!("no task {}", id.0) };
        let owner = match task.assignee() {
            Some(agent) => format!("agent {}", agent.0),
            None => "unassigned".to_owned(),
        };
        let errands: Vec<String> = task
            .errands
            .iter()
            .enumerate()
            .filter_map(|(i, errand)| {
                let state = self.rec.task_state(id, i)?;
                let (row, col) = errand.location;
                Some(format!("errand {i} at ({row}, {col}) {state}"))
            })
            .collect();
        Ok(format!("task {}, {owner}: {}", id.0, errands.join("; ")))
    }

    fn conflict_list(&self) -> String {
        let plan = self.plan();
        if plan.conflicts.is_empty() {
            return "no conflicts".to_owned();
        }
        plan.conflicts
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{i:>4}  {c}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn event_list(&self) -> String {
        let plan = self.plan();
        if plan.events.is_empty() {
            return "no events".to_owned();
        }
        plan.events
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{i:>4}  {e}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn search_list(&self) -> String {
        if self.overlays.search_trees.is_empty() {
            return "no search trees; pass --searchTree".to_owned();
        }
        self.overlays
            .search_trees
            .iter()
            .enumerate()
            .map(|(i, t)| format!("{i:>4}  {}", t.name))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn observer<'a>(trace: &'a mut Option<TraceWriter>, noop: &'a mut NoopObserver) -> &'a mut dyn ReplayObserver {
    match trace {
        Some(trace) => trace,
        None => noop,
    }
}
