//! Tests for the palette, the scene, the play loop, and trace export.

use std::sync::atomic::AtomicBool;

use serde_json::{Value, json};

use pv_core::{AgentId, GridMap, Heading, Timestep};
use pv_plan::{
    HeatMap, LoadWindow, PathSource, Plan, TaskState, load_heuristic_reader, load_highway_reader, load_plan_str,
    load_search_tree_reader,
};
use pv_timeline::{AgentHighlight, Reconciler, ReplayState, Transition};

use crate::{
    AsciiCanvas, Canvas, Color, MapPreset, NoopObserver, Player, ReplayObserver, Scene, Shape,
    ShapeKind, TaskFilter, TraceWriter, VizConfig, agent_color, heat_color, heuristic_color, search_color,
    task_color,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Two agents, makespan 5; task 0 at (0, 2) is assigned to agent 0 at t=1
/// and finished by it at t=3.  Both agents conflict at t=3.
fn scenario() -> Value {
    json!({
        "teamSize": 2,
        "makespan": 5,
        "actionModel": "MAPF_T",
        "start": [[0, 0, "E"], [1, 3, "W"]],
        "actualPaths":  ["F,F,W,W,W", "C,F,W,W,W"],
        "plannerPaths": ["F,W,W,W,W", "C,W,W,W,W"],
        "errors": [[0, 1, 3, "vertex conflict"]],
        "tasks":  [[0, 0, 2]],
        "events": [[[0, 1, "assigned"], [0, 3, "finished"]], []]
    })
}

fn scenario_plan() -> Plan {
    load_plan_str(&scenario().to_string(), LoadWindow::default()).unwrap()
}

fn map() -> GridMap {
    let text = "type octile\nheight 3\nwidth 4\nmap\n....\n....\n@...\n";
    GridMap::from_reader(text.as_bytes()).unwrap()
}

/// No pauses, three sub-frames.
fn quick() -> VizConfig {
    VizConfig { delay_secs: 0.0, ..VizConfig::default() }
}

struct Session {
    plan: Plan,
    map:  GridMap,
}

impl Session {
    fn new() -> Self {
        Self { plan: scenario_plan(), map: map() }
    }

    fn start(&self, config: VizConfig) -> (Reconciler<'_>, Scene, AsciiCanvas) {
        let rec = Reconciler::new(&self.plan);
        let mut canvas = AsciiCanvas::new(self.map.height, self.map.width);
        let scene = Scene::build(&self.plan, &self.map, rec.state(), config, &mut canvas);
        (rec, scene, canvas)
    }
}

// ── Palette ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod palette {
    use super::*;

    #[test]
    fn task_colors_follow_state() {
        assert_eq!(task_color(TaskState::Unassigned), Color::Khaki);
        assert_eq!(task_color(TaskState::NewlyAssigned), Color::YellowGreen);
        assert_eq!(task_color(TaskState::Assigned), Color::Orange);
        assert_eq!(task_color(TaskState::Finished), Color::Grey);
        assert_eq!(Color::Khaki.hex(), "#eeeaa2");
        assert_eq!(Color::Khaki.to_string(), "#eeeaa2");
        assert_eq!(Color::DeepSkyBlue.to_string(), "deepskyblue");
    }

    #[test]
    fn conflict_red_overrides_highlight() {
        assert_eq!(agent_color(AgentHighlight::Base, false), Color::DeepSkyBlue);
        assert_eq!(agent_color(AgentHighlight::NewlyAssigned, false), Color::YellowGreen);
        assert_eq!(agent_color(AgentHighlight::NewlyAssigned, true), Color::Red);
    }

    #[test]
    fn heat_scales_to_busiest_cell() {
        assert_eq!(heat_color(0, 0), Color::Heat(0));
        assert_eq!(heat_color(10, 10), Color::Heat(255));
        assert_eq!(heat_color(5, 10), Color::Heat(127));
        assert_eq!(heat_color(20, 10), Color::Heat(255));
        assert_eq!(Color::Heat(255).hex(), "#ff0000");
    }

    #[test]
    fn overlay_shades() {
        assert_eq!(heuristic_color(1.0, 1.0, 6.0), Color::Shade(0));
        assert_eq!(heuristic_color(6.0, 1.0, 6.0), Color::Shade(255));
        assert_eq!(heuristic_color(9.0, 1.0, 6.0), Color::Shade(255));
        assert_eq!(heuristic_color(3.0, 3.0, 3.0), Color::Shade(0));
        assert_eq!(search_color(2, 4), Color::Blues(127));
        assert_eq!(Color::Shade(255).hex(), "#000000");
        assert_eq!(Color::Blues(255).to_string(), "#0080ff");
    }
}

// ── Configuration ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod config {
    use std::time::Duration;

    use super::*;

    #[test]
    fn presets_set_pacing() {
        let small = VizConfig::for_map("warehouse_small");
        assert_eq!((small.pixels_per_move, small.moves), (5, 5));
        assert_eq!(small.tile_size(), 25);

        let large = VizConfig::for_map("Paris_1_256");
        assert_eq!((large.pixels_per_move, large.moves), (2, 2));

        assert_eq!(VizConfig::for_map("my-own-map"), VizConfig::default());
        assert!(MapPreset::lookup("brc202d").is_some());
        assert!(MapPreset::lookup("BRC202D").is_none());
    }

    #[test]
    fn degenerate_pacing_is_clamped() {
        let config = VizConfig { moves: 0, delay_secs: -1.0, ..VizConfig::default() };
        assert_eq!(config.frames(), 1);
        assert_eq!(config.frame_delay(), Duration::ZERO);

        let nan = VizConfig { delay_secs: f64::NAN, ..VizConfig::default() };
        assert_eq!(nan.frame_delay(), Duration::ZERO);
        assert_eq!(VizConfig::default().frame_delay(), Duration::from_secs_f64(0.06));
    }

    #[test]
    fn task_filter() {
        assert!(TaskFilter::All.shows(TaskState::Finished));
        assert!(TaskFilter::Only(TaskState::Assigned).shows(TaskState::Assigned));
        assert!(!TaskFilter::Only(TaskState::Assigned).shows(TaskState::NewlyAssigned));
    }
}

// ── Scene ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod scene {
    use super::*;

    #[test]
    fn builds_initial_frame() {
        let session = Session::new();
        let (_, scene, canvas) = session.start(quick());
        assert_eq!(canvas.render(), "A.u.\n...A\n@...\n");

        // Start markers and grid lines exist but are hidden by default.
        assert!(!canvas.shape(scene.start_shape(AgentId(0))).visible);
        assert!(scene.grid_shapes().iter().all(|&id| !canvas.shape(id).visible));
        assert_eq!(scene.grid_shapes().len(), (3 + 1) + (4 + 1));
        assert_eq!(scene.path_shapes(AgentId(0)).len(), 6);
        assert!(scene.path_shapes(AgentId(0)).iter().all(|&id| !canvas.shape(id).visible));
        assert_eq!(canvas.refreshes(), 1);
    }

    #[test]
    fn oriented_agents_get_heading_markers() {
        let session = Session::new();
        let (_, scene, canvas) = session.start(quick());
        let dot = scene.heading_shape(AgentId(1)).unwrap();
        assert_eq!(canvas.shape(dot).fill, Color::Navy);
        assert_eq!(canvas.angle(dot), Heading::West.angle());

        let mut v = scenario();
        v["actionModel"] = json!("MAPF");
        v["actualPaths"] = json!(["R,R,W,W,W", "W,W,W,W,W"]);
        v["plannerPaths"] = json!(["W,W,W,W,W", "W,W,W,W,W"]);
        let plan = load_plan_str(&v.to_string(), LoadWindow::default()).unwrap();
        let rec = Reconciler::new(&plan);
        let mut canvas = AsciiCanvas::new(3, 4);
        let scene = Scene::build(&plan, &session.map, rec.state(), quick(), &mut canvas);
        assert!(scene.heading_shape(AgentId(0)).is_none());
    }

    #[test]
    fn planned_preview_returns_agents() {
        let mut v = scenario();
        v["plannerPaths"] = json!(["F,W,F,W,W", "C,W,W,W,W"]);
        let plan = load_plan_str(&v.to_string(), LoadWindow::default()).unwrap();
        let map = map();
        let mut rec = Reconciler::new(&plan);
        let mut canvas = AsciiCanvas::new(3, 4);
        let mut scene = Scene::build(&plan, &map, rec.state(), quick(), &mut canvas);

        let out = rec.jump_to_conflict(&plan.conflicts[0]);
        scene.apply(&out.transition, rec.state(), &mut canvas);
        assert_eq!(canvas.render(), "..A.\n....\n@..A\n");

        let preview = rec.planned_preview().unwrap();
        scene.animate(&preview, rec.state(), &mut canvas);
        assert_eq!(canvas.render(), "..aA\n....\n@..A\n");
        scene.apply(&preview.reversed_moves(), rec.state(), &mut canvas);
        assert_eq!(canvas.render(), "..A.\n....\n@..A\n");

        let frames = canvas.refreshes();
        scene.preview(&preview, rec.state(), quick().preview_hold(), &mut canvas);
        assert_eq!(canvas.render(), "..A.\n....\n@..A\n");
        assert_eq!(scene.drawn_pose(AgentId(0)), rec.state().pose(AgentId(0)));
        assert_eq!(canvas.refreshes(), frames + 3 + 1 + 1);
    }

    #[test]
    fn animation_follows_the_replay() {
        let session = Session::new();
        let (mut rec, mut scene, mut canvas) = session.start(quick());

        let t = rec.step_forward().unwrap();
        scene.animate(&t, rec.state(), &mut canvas);
        assert_eq!(canvas.render(), ".Nn.\n...A\n@...\n");
        // One refresh per sub-frame plus the final paint.
        assert_eq!(canvas.refreshes(), 1 + 3 + 1);

        let dot = scene.heading_shape(AgentId(1)).unwrap();
        assert!((canvas.angle(dot) - Heading::South.angle()).abs() < 1e-6);

        let t = rec.step_forward().unwrap();
        scene.animate(&t, rec.state(), &mut canvas);
        assert_eq!(canvas.render(), "..A.\n....\n@..A\n");

        let task = scene.task_shape(0, 0);
        assert_eq!(canvas.shape(task).fill, Color::Orange);

        let t = rec.step_forward().unwrap();
        scene.animate(&t, rec.state(), &mut canvas);
        assert_eq!(canvas.shape(task).fill, Color::Grey);
    }

    #[test]
    fn shapes_land_exactly_on_cells() {
        let session = Session::new();
        let config = VizConfig { moves: 7, ..quick() };
        let (mut rec, mut scene, mut canvas) = session.start(config);

        while let Some(t) = rec.step_forward() {
            scene.animate(&t, rec.state(), &mut canvas);
        }
        while let Some(t) = rec.step_backward() {
            scene.animate(&t, rec.state(), &mut canvas);
        }
        for agent in [AgentId(0), AgentId(1)] {
            let body = canvas.shape(scene.agent_shape(agent));
            let pose = rec.state().pose(agent);
            assert!((body.row - pose.row as f32).abs() < 1e-4, "{agent} row {}", body.row);
            assert!((body.col - pose.col as f32).abs() < 1e-4, "{agent} col {}", body.col);
            assert_eq!(scene.drawn_pose(agent), pose);
        }
        assert_eq!(canvas.render(), "A.u.\n...A\n@...\n");
    }

    #[test]
    fn jumps_redraw_consistently() {
        let session = Session::new();
        let (mut rec, mut scene, mut canvas) = session.start(quick());

        let outcome = rec.jump_to(4);
        scene.apply(&outcome.transition, rec.state(), &mut canvas);

        let mut fresh = Reconciler::new(&session.plan);
        fresh.jump_to(4);
        let mut other = AsciiCanvas::new(3, 4);
        Scene::build(&session.plan, &session.map, fresh.state(), quick(), &mut other);
        assert_eq!(canvas.render(), other.render());

        let outcome = rec.jump_to(1);
        scene.apply(&outcome.transition, rec.state(), &mut canvas);
        assert_eq!(canvas.render(), ".Nn.\n...A\n@...\n");

        scene.redraw_all(rec.state(), &mut canvas);
        assert_eq!(canvas.render(), ".Nn.\n...A\n@...\n");
    }

    #[test]
    fn conflict_selection_paints_agents_red() {
        let session = Session::new();
        let (mut rec, mut scene, mut canvas) = session.start(quick());

        let conflict = session.plan.conflicts[0].clone();
        let outcome = rec.jump_to_conflict(&conflict);
        assert_eq!(outcome.target, Timestep(2));
        scene.apply(&outcome.transition, rec.state(), &mut canvas);

        scene.select_conflicts(session.plan.conflicts_at(Timestep(3)), rec.state(), &mut canvas);
        assert_eq!(scene.selected().len(), 2);
        assert_eq!(canvas.shape(scene.agent_shape(AgentId(0))).fill, Color::Red);
        assert_eq!(canvas.render(), "..X.\n....\n@..X\n");

        scene.clear_selection(rec.state(), &mut canvas);
        assert!(scene.selected().is_empty());
        assert_eq!(canvas.shape(scene.agent_shape(AgentId(1))).fill, Color::DeepSkyBlue);
    }

    #[test]
    fn conflict_agents_flag_marks_them_from_the_start() {
        let session = Session::new();
        let config = VizConfig { show_conflict_agents: true, ..quick() };
        let (_, scene, canvas) = session.start(config);
        assert_eq!(canvas.shape(scene.agent_shape(AgentId(0))).fill, Color::Red);
        assert_eq!(canvas.render(), "X.u.\n...X\n@...\n");
    }

    #[test]
    fn planned_path_shows_only_remaining_steps() {
        let session = Session::new();
        let (mut rec, mut scene, mut canvas) = session.start(quick());
        let markers = scene.path_shapes(AgentId(0)).to_vec();

        assert!(scene.toggle_path(AgentId(0), rec.state(), &mut canvas));
        let visible = |canvas: &AsciiCanvas| markers.iter().filter(|&&id| canvas.shape(id).visible).count();
        assert_eq!(visible(&canvas), 5);
        // Markers 1 (a move) and 2 (a wait) share a cell; the later one is on top.
        assert_eq!(canvas.char_at(0, 1), '*');
        assert_eq!(canvas.shape(markers[1]).kind, ShapeKind::PathMarker { wait: false });
        assert_eq!(canvas.shape(markers[2]).kind, ShapeKind::PathMarker { wait: true });
        assert_eq!(canvas.shape(markers[1]).fill, Color::Purple);

        let t = rec.step_forward().unwrap();
        scene.animate(&t, rec.state(), &mut canvas);
        assert_eq!(visible(&canvas), 4);
        assert!(!canvas.shape(markers[1]).visible);

        assert!(!scene.toggle_path(AgentId(0), rec.state(), &mut canvas));
        assert_eq!(visible(&canvas), 0);
    }

    #[test]
    fn planned_source_moves_agents() {
        let session = Session::new();
        let (mut rec, mut scene, mut canvas) = session.start(quick());
        rec.jump_to(2);
        scene.redraw_all(rec.state(), &mut canvas);
        assert_eq!(scene.drawn_pose(AgentId(0)).cell(), (0, 2));

        let t = rec.set_path_source(PathSource::Planned);
        scene.apply(&t, rec.state(), &mut canvas);
        assert_eq!(scene.drawn_pose(AgentId(0)).cell(), (0, 1));
        assert_eq!(canvas.char_at(0, 1), 'A');
    }

    #[test]
    fn heat_overlay() {
        let session = Session::new();
        let (_, mut scene, mut canvas) = session.start(quick());
        let heat = HeatMap::of(&session.plan, 3, 4);
        assert_eq!(heat.max(), 2);

        scene.show_heat(&heat, &mut canvas);
        assert!(scene.heat_visible());
        assert_eq!(canvas.char_at(0, 1), '4');
        // Agents stay on top of the overlay.
        assert_eq!(canvas.char_at(1, 3), 'A');

        let shapes = canvas.shape_count();
        scene.hide_heat(&mut canvas);
        assert_eq!(canvas.char_at(0, 1), '.');
        scene.show_heat(&heat, &mut canvas);
        assert_eq!(canvas.shape_count(), shapes);
        assert_eq!(canvas.char_at(0, 1), '4');
    }

    #[test]
    fn planner_overlays_toggle() {
        let session = Session::new();
        let (_, mut scene, mut canvas) = session.start(quick());

        // (1,0)->(1,1) and (2,2)->(1,2) on the 3x4 map.
        let highway = load_highway_reader("2\n65\n138\n".as_bytes(), 3, 4).unwrap();
        scene.show_highway(&highway, &mut canvas);
        assert!(scene.highway_visible());
        assert_eq!(canvas.render(), "A.u.\n.>.A\n@.^.\n");
        scene.hide_highway(&mut canvas);
        assert!(!scene.highway_visible());

        let row = "0,1,2,3,4,2,3,4,5,2147483647,4,5,6";
        let heuristic = load_heuristic_reader(row.as_bytes(), AgentId(0), 3, 4).unwrap();
        scene.show_heuristic(&heuristic, &mut canvas);
        assert_eq!(canvas.render(), "A1u5\n135A\n@579\n");
        scene.hide_heuristic(&mut canvas);
        assert_eq!(canvas.render(), "A.u.\n...A\n@...\n");

        let tree = load_search_tree_reader("agent_0", "loc\n5\n5\n6\n".as_bytes(), 3, 4).unwrap();
        scene.show_search_tree(&tree, 4, &mut canvas);
        assert!(scene.search_tree_visible("agent_0"));
        assert!(!scene.search_tree_visible("agent_1"));
        assert_eq!(canvas.render(), "A.u.\n.42A\n@...\n");

        let shapes = canvas.shape_count();
        scene.hide_search_tree("agent_0", &mut canvas);
        scene.show_search_tree(&tree, 4, &mut canvas);
        assert_eq!(canvas.shape_count(), shapes);
    }

    #[test]
    fn task_filter_hides_other_states() {
        let session = Session::new();
        let config = VizConfig { task_filter: TaskFilter::Only(TaskState::Finished), ..quick() };
        let (mut rec, mut scene, mut canvas) = session.start(config);
        let task = scene.task_shape(0, 0);
        assert!(!canvas.shape(task).visible);

        let outcome = rec.jump_to(3);
        scene.apply(&outcome.transition, rec.state(), &mut canvas);
        assert!(canvas.shape(task).visible);
    }

    #[test]
    fn config_toggles_apply_to_existing_shapes() {
        let session = Session::new();
        let (rec, mut scene, mut canvas) = session.start(quick());

        let config = VizConfig {
            show_grid: true,
            show_agent_ids: true,
            show_task_ids: true,
            show_static: true,
            ..quick()
        };
        scene.set_config(config, &session.plan, rec.state(), &mut canvas);

        assert!(scene.grid_shapes().iter().all(|&id| canvas.shape(id).visible));
        let start = canvas.shape(scene.start_shape(AgentId(1)));
        assert!(start.visible);
        assert_eq!(start.label.as_deref(), Some("1"));
        assert_eq!(canvas.shape(scene.agent_shape(AgentId(1))).label.as_deref(), Some("1"));
        assert_eq!(canvas.shape(scene.task_shape(0, 0)).label.as_deref(), Some("0"));

        let config = VizConfig { show_agent_ids: true, ..quick() };
        scene.set_config(config, &session.plan, rec.state(), &mut canvas);
        assert_eq!(canvas.shape(scene.start_shape(AgentId(1))).label, None);
        assert!(scene.config().show_agent_ids);
    }
}

// ── ASCII canvas ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod ascii {
    use super::*;

    #[test]
    fn top_layer_wins() {
        let mut canvas = AsciiCanvas::new(1, 2);
        canvas.create_shape(Shape::new(ShapeKind::Agent, 0, 0, Color::DeepSkyBlue));
        canvas.create_shape(Shape::new(ShapeKind::Task, 0, 0, Color::Orange));
        canvas.create_shape(Shape::new(ShapeKind::HeadingMarker, 0, 1, Color::Navy));
        assert_eq!(canvas.render(), "A.\n");
    }

    #[test]
    fn shapes_mid_move_round_to_nearest_cell() {
        let mut canvas = AsciiCanvas::new(1, 3);
        let id = canvas.create_shape(Shape::new(ShapeKind::Agent, 0, 0, Color::DeepSkyBlue));
        canvas.move_by(id, 0.0, 0.4);
        assert_eq!(canvas.render(), "A..\n");
        canvas.move_by(id, 0.0, 0.4);
        assert_eq!(canvas.render(), ".A.\n");
        canvas.move_by(id, 0.0, 5.0);
        assert_eq!(canvas.cell_of(id), None);
        assert_eq!(canvas.render(), "...\n");
    }
}

// ── Player ────────────────────────────────────────────────────────────────────

/// Timesteps reported by `on_step`.
#[derive(Default)]
struct Recorder(Vec<Timestep>);

impl ReplayObserver for Recorder {
    fn on_step(&mut self, _plan: &Plan, state: &ReplayState, transition: &Transition) {
        assert_eq!(state.timestep(), transition.to);
        self.0.push(transition.to);
    }
}

#[cfg(test)]
mod player {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use super::*;

    #[test]
    fn plays_to_the_end() {
        let session = Session::new();
        let (mut rec, mut scene, mut canvas) = session.start(quick());
        let running = AtomicBool::new(true);
        let mut recorder = Recorder::default();

        let steps = Player::new(&quick()).play(&mut rec, &mut scene, &mut canvas, &mut recorder, &running);
        assert_eq!(steps, 5);
        assert!(rec.at_end());
        assert_eq!(recorder.0, (1..=5).map(Timestep).collect::<Vec<_>>());

        // Nothing left to play.
        let steps = Player::new(&quick()).play(&mut rec, &mut scene, &mut canvas, &mut NoopObserver, &running);
        assert_eq!(steps, 0);
    }

    #[test]
    fn honours_limit_and_stop_flag() {
        let session = Session::new();
        let (mut rec, mut scene, mut canvas) = session.start(quick());
        let running = AtomicBool::new(true);

        let steps = Player::new(&quick()).limit(2).play(&mut rec, &mut scene, &mut canvas, &mut NoopObserver, &running);
        assert_eq!(steps, 2);
        assert_eq!(rec.timestep(), Timestep(2));

        running.store(false, Ordering::Relaxed);
        let steps = Player::new(&quick()).play(&mut rec, &mut scene, &mut canvas, &mut NoopObserver, &running);
        assert_eq!(steps, 0);
        assert_eq!(rec.timestep(), Timestep(2));
    }

    #[test]
    fn pauses_twice_the_frame_delay() {
        let config = VizConfig { delay_secs: 0.05, ..VizConfig::default() };
        assert_eq!(Player::new(&config).step_pause(), Duration::from_secs_f64(0.05) * 2);
    }
}

// ── Trace export ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod trace {
    use std::fs;

    use super::*;

    #[test]
    fn writes_poses_and_task_changes() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new();
        let (mut rec, mut scene, mut canvas) = session.start(quick());
        let mut trace = TraceWriter::new(dir.path()).unwrap();
        let running = AtomicBool::new(true);

        trace.on_start(&session.plan, rec.state());
        Player::new(&quick()).play(&mut rec, &mut scene, &mut canvas, &mut trace, &running);
        let outcome = rec.restart();
        trace.on_jump(&session.plan, rec.state(), &outcome);
        trace.on_finish(rec.state());
        assert!(trace.take_error().is_none());
        trace.finish().unwrap();

        let poses = fs::read_to_string(dir.path().join("agent_poses.csv")).unwrap();
        let lines: Vec<&str> = poses.lines().collect();
        assert_eq!(lines[0], "timestep,agent_id,row,col,heading");
        // Two agents at t0, five steps, and the restart.
        assert_eq!(lines.len(), 1 + 2 * 7);
        assert_eq!(lines[1], "0,0,0,0,E");
        assert_eq!(lines[4], "1,1,1,3,S");

        let tasks = fs::read_to_string(dir.path().join("task_states.csv")).unwrap();
        let lines: Vec<&str> = tasks.lines().collect();
        assert_eq!(
            lines,
            vec![
                "timestep,task_id,errand,state",
                "0,0,0,unassigned",
                "1,0,0,newly-assigned",
                "2,0,0,assigned",
                "3,0,0,finished",
                "0,0,0,unassigned",
            ]
        );
        assert_eq!(trace.rows(), 14 + 5);
    }
}
