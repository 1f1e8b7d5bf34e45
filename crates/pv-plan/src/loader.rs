//! JSON plan loader.
//!
//! Turns a [`PlanRecord`] into a validated [`Plan`]:
//!
//! 1. Required fields (`teamSize`, `makespan`, `actionModel`, `start`,
//!    `actualPaths`) are checked; a missing one is
//!    [`PlanError::MissingField`].
//! 2. Every path string is decoded in full from plan timestep 0, then
//!    truncated to the session window.  Decoding must see the whole string so
//!    that index `i` of the truncated path is absolute timestep `start + i`.
//! 3. Tasks and events are parsed according to the detected [`PlanSchema`],
//!    dropping anything that happens after the window end.
//! 4. Task records are validated (no finish without an earlier or equal
//!    assignment) and the [`EventLog`] is derived from them, so the log and
//!    the per-errand stamps can never disagree.

use std::collections::BTreeMap;
use std::io::{BufReader, Read};
use std::path::Path;

use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use pv_core::{
    ActionModel, AgentId, CoreError, Motion, Pose, TaskId, TimeWindow, Timestep, apply_motion,
    decode_path,
};

use crate::record::{ConflictRecord, EventsRecord, PlanRecord, StartRecord, TaskRecord};
use crate::{
    Agent, Conflict, Event, EventKind, EventLog, Plan, PlanError, PlanResult, PlanSchema,
    SequentialTask, Stamp,
};

// ── Session window ────────────────────────────────────────────────────────────

/// The slice of the plan a session replays, applied at load time.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadWindow {
    /// First timestep shown.
    pub start:      Timestep,
    /// Last timestep shown; `None` uses the plan's declared makespan.
    pub end:        Option<Timestep>,
    /// Show at most this many agents (the first `n`).
    pub team_limit: Option<usize>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load and validate a plan file.
pub fn load_plan_json(path: &Path, window: LoadWindow) -> PlanResult<Plan> {
    let file = std::fs::File::open(path)?;
    load_plan_reader(BufReader::new(file), window)
}

/// Like [`load_plan_json`] but accepts any `Read` source.
pub fn load_plan_reader<R: Read>(reader: R, window: LoadWindow) -> PlanResult<Plan> {
    let record: PlanRecord = serde_json::from_reader(reader)?;
    load(record, window)
}

/// Like [`load_plan_json`] but parses an in-memory JSON document.
pub fn load_plan_str(json: &str, window: LoadWindow) -> PlanResult<Plan> {
    let record: PlanRecord = serde_json::from_str(json)?;
    load(record, window)
}

/// Validate an already-parsed record.
pub fn load(record: PlanRecord, window: LoadWindow) -> PlanResult<Plan> {
    let declared_team = record.team_size.ok_or(PlanError::MissingField("teamSize"))?;
    let makespan = Timestep(record.makespan.ok_or(PlanError::MissingField("makespan"))?);
    let action_model = ActionModel::from_plan_name(
        record
            .action_model
            .as_deref()
            .ok_or(PlanError::MissingField("actionModel"))?,
    );
    let starts = record.start.as_deref().ok_or(PlanError::MissingField("start"))?;
    let actual = record
        .actual_paths
        .as_deref()
        .ok_or(PlanError::MissingField("actualPaths"))?;

    let team = window.team_limit.map_or(declared_team, |n| n.min(declared_team));
    check_len(starts.len(), team, "start")?;
    check_len(actual.len(), team, "actualPaths")?;
    if let Some(planner) = &record.planner_paths {
        check_len(planner.len(), team, "plannerPaths")?;
    } else {
        debug!("no planner paths; planned paths hold the start pose only");
    }

    let session = TimeWindow::new(window.start, window.end.unwrap_or(makespan));

    let (agents, path_makespan) = load_agents(
        &starts[..team],
        &actual[..team],
        record.planner_paths.as_deref().map(|p| &p[..team]),
        action_model,
        session,
    )?;

    let conflicts = load_conflicts(record.errors.as_deref().unwrap_or(&[]), team, session);

    let schema = detect_schema(&record);
    let tasks = match schema {
        PlanSchema::AgentEvents => load_agent_event_tasks(&record, team, session)?,
        PlanSchema::Sequential  => load_sequential_tasks(&record, team, session)?,
    };
    validate_tasks(&tasks)?;
    let events = build_event_log(&tasks);

    info!(
        agents    = team,
        tasks     = tasks.len(),
        events    = events.len(),
        conflicts = conflicts.len(),
        %schema,
        %action_model,
        window    = %session,
        "plan loaded"
    );

    Ok(Plan::new(
        schema,
        action_model,
        makespan,
        Timestep(path_makespan as u32),
        session,
        agents,
        tasks,
        events,
        conflicts,
    ))
}

// ── Paths ─────────────────────────────────────────────────────────────────────

fn load_agents(
    starts:  &[StartRecord],
    actual:  &[String],
    planner: Option<&[String]>,
    model:   ActionModel,
    session: TimeWindow,
) -> PlanResult<(Vec<Agent>, usize)> {
    let mut agents = Vec::with_capacity(starts.len());
    let mut longest = 0;

    for (i, ((row, col, heading), motions)) in starts.iter().zip(actual).enumerate() {
        let id = AgentId(i as u32);
        let start = Pose::new(*row, *col, heading.parse()?);

        let exec = decode_path(start, motions, model).map_err(|(step, source)| {
            PlanError::InvalidMotion { agent: id, path: "actual", step, source }
        })?;
        longest = longest.max(exec.len() - 1);

        let plan = match planner {
            Some(p) => decode_planned(&exec, &p[i], model).map_err(|(step, source)| {
                PlanError::InvalidMotion { agent: id, path: "planner", step, source }
            })?,
            None => vec![start],
        };

        agents.push(Agent {
            id,
            start,
            exec_path: truncate(exec, session),
            plan_path: truncate(plan, session),
        });
    }
    Ok((agents, longest))
}

/// The planner's motion `k` is applied to the *executed* pose at `k`: the
/// planned path is a one-step lookahead from where the agent really was.
fn decode_planned(
    exec:    &[Pose],
    letters: &str,
    model:   ActionModel,
) -> Result<Vec<Pose>, (usize, CoreError)> {
    let mut path = vec![exec[0]];
    for (step, letter) in letters.split(',').filter(|l| !l.trim().is_empty()).enumerate() {
        let Some(&from) = exec.get(step) else {
            warn!(step, "planner path outruns the executed path; ignoring the rest");
            break;
        };
        let motion = Motion::decode(letter, model).map_err(|e| (step, e))?;
        path.push(apply_motion(from, motion).map_err(|e| (step, e))?);
    }
    Ok(path)
}

/// Keep path indices `[start, end]`.  A path that ends before the window
/// starts keeps its final pose so the agent stays visible, frozen.
fn truncate(path: Vec<Pose>, session: TimeWindow) -> Vec<Pose> {
    let first = session.start.0 as usize;
    let last = (session.end.0 as usize + 1).min(path.len());
    if first >= path.len() {
        return path.last().copied().into_iter().collect();
    }
    path[first..last].to_vec()
}

fn check_len(got: usize, expected: usize, what: &'static str) -> PlanResult<()> {
    if got < expected {
        return Err(PlanError::AgentCountMismatch { expected, got, what });
    }
    Ok(())
}

// ── Conflicts ─────────────────────────────────────────────────────────────────

fn load_conflicts(records: &[ConflictRecord], team: usize, session: TimeWindow) -> Vec<Conflict> {
    let agent = |raw: i64| -> Option<AgentId> { u32::try_from(raw).ok().map(AgentId) };

    let mut conflicts: Vec<Conflict> = records
        .iter()
        .filter(|(_, _, t, _)| session.contains(Timestep(*t)))
        .map(|(a1, a2, t, kind)| Conflict {
            first:    agent(*a1),
            second:   agent(*a2),
            timestep: Timestep(*t),
            kind:     kind.clone(),
        })
        .filter(|c| {
            let in_team = c.agents().all(|a| a.index() < team);
            if !in_team {
                debug!(conflict = %c, "conflict involves an agent outside the team; skipped");
            }
            in_team
        })
        .collect();
    conflicts.sort_by_key(|c| c.timestep);
    conflicts
}

// ── Tasks ─────────────────────────────────────────────────────────────────────

fn detect_schema(record: &PlanRecord) -> PlanSchema {
    let chained = record
        .tasks
        .iter()
        .flatten()
        .any(|t| matches!(t, TaskRecord::Chain(..)));
    let flat_events = matches!(record.events, Some(EventsRecord::Finishes(_)));
    if record.actual_schedule.is_some() || chained || flat_events {
        PlanSchema::Sequential
    } else {
        PlanSchema::AgentEvents
    }
}

/// Older schema: per-agent `[task, t, kind]` lists.  Only tasks assigned
/// inside the window are shown.
fn load_agent_event_tasks(
    record:  &PlanRecord,
    team:    usize,
    session: TimeWindow,
) -> PlanResult<Vec<SequentialTask>> {
    let per_agent = match &record.events {
        None => {
            info!("no events; no tasks shown");
            return Ok(Vec::new());
        }
        Some(EventsRecord::PerAgent(v)) => v,
        Some(EventsRecord::Finishes(_)) => return Err(PlanError::SchemaMismatch("flat finish events")),
    };

    let locations: FxHashMap<u32, (i32, i32)> = record
        .tasks
        .iter()
        .flatten()
        .filter_map(|t| match t {
            TaskRecord::Point(id, row, col) => Some((*id, (*row, *col))),
            TaskRecord::Chain(..) => None,
        })
        .collect();

    let mut tasks: BTreeMap<TaskId, SequentialTask> = BTreeMap::new();

    // Assignments first: they decide which tasks exist in this session.
    for (i, events) in per_agent.iter().enumerate().take(team) {
        let agent = AgentId(i as u32);
        for (tid, t, kind) in events {
            if kind != "assigned" || *t > session.end.0 {
                continue;
            }
            let id = TaskId(*tid);
            let location = *locations.get(tid).ok_or(PlanError::UnknownTask(id))?;
            let task = tasks
                .entry(id)
                .or_insert_with(|| SequentialTask::new(id, None, vec![location]));
            keep_latest(&mut task.errands[0].assigned, Stamp { agent, timestep: Timestep(*t) });
        }
    }

    for (i, events) in per_agent.iter().enumerate().take(team) {
        let agent = AgentId(i as u32);
        for (tid, t, kind) in events {
            match kind.as_str() {
                "assigned" => {}
                "finished" if *t <= session.end.0 => {
                    let id = TaskId(*tid);
                    if !locations.contains_key(tid) {
                        return Err(PlanError::UnknownTask(id));
                    }
                    let task = tasks.get_mut(&id).ok_or(PlanError::FinishedBeforeAssigned {
                        task:     id,
                        errand:   0,
                        finished: Timestep(*t),
                    })?;
                    keep_latest(&mut task.errands[0].finished, Stamp { agent, timestep: Timestep(*t) });
                }
                "finished" => {}
                other => warn!(agent = agent.0, kind = other, "unknown event kind; skipped"),
            }
        }
    }

    Ok(tasks.into_values().collect())
}

/// Newer schema: errand chains, `actualSchedule`, flat finish events.
fn load_sequential_tasks(
    record:  &PlanRecord,
    team:    usize,
    session: TimeWindow,
) -> PlanResult<Vec<SequentialTask>> {
    let mut tasks: BTreeMap<TaskId, SequentialTask> = BTreeMap::new();
    for rec in record.tasks.iter().flatten() {
        let task = match rec {
            TaskRecord::Chain(id, release, flat) => {
                if *release > session.end.0 {
                    continue;
                }
                if flat.len() % 2 != 0 {
                    return Err(PlanError::UnpairedLocation { task: TaskId(*id), len: flat.len() });
                }
                let locations = flat.chunks_exact(2).map(|c| (c[0], c[1])).collect();
                SequentialTask::new(TaskId(*id), Some(Timestep(*release)), locations)
            }
            TaskRecord::Point(id, row, col) => {
                SequentialTask::new(TaskId(*id), None, vec![(*row, *col)])
            }
        };
        tasks.insert(task.id, task);
    }
    if tasks.is_empty() {
        info!("no tasks released inside the window");
    }

    for (i, schedule) in record.actual_schedule.iter().flatten().enumerate().take(team) {
        let agent = AgentId(i as u32);
        for entry in schedule.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (t, tid) = parse_schedule_entry(entry)
                .ok_or_else(|| PlanError::Schedule { agent, entry: entry.to_owned() })?;
            if t > session.end.0 {
                continue;
            }
            // `-1` marks an idle slot.
            let Ok(tid) = u32::try_from(tid) else { continue };
            let id = TaskId(tid);
            let task = tasks.get_mut(&id).ok_or(PlanError::UnknownTask(id))?;
            // The whole chain is handed over at once.
            for errand in &mut task.errands {
                keep_latest(&mut errand.assigned, Stamp { agent, timestep: Timestep(t) });
            }
        }
    }

    match &record.events {
        Some(EventsRecord::Finishes(list)) => {
            for &(t, agent, tid, next_errand) in list {
                if t > session.end.0 {
                    continue;
                }
                if agent as usize >= team {
                    continue;
                }
                let id = TaskId(tid);
                let task = tasks.get_mut(&id).ok_or(PlanError::UnknownTask(id))?;
                let errand = (next_errand as usize)
                    .checked_sub(1)
                    .filter(|e| *e < task.errands.len())
                    .ok_or(PlanError::InvalidErrand { task: id, errand: next_errand as usize })?;
                keep_latest(
                    &mut task.errands[errand].finished,
                    Stamp { agent: AgentId(agent), timestep: Timestep(t) },
                );
            }
        }
        Some(EventsRecord::PerAgent(v)) if v.iter().all(Vec::is_empty) => {}
        Some(EventsRecord::PerAgent(_)) => {
            return Err(PlanError::SchemaMismatch("per-agent events"));
        }
        None => info!("no finish events"),
    }

    Ok(tasks.into_values().collect())
}

/// `"12:3"` → `(12, 3)`.
fn parse_schedule_entry(entry: &str) -> Option<(u32, i64)> {
    let (t, task) = entry.split_once(':')?;
    Some((t.trim().parse().ok()?, task.trim().parse().ok()?))
}

/// Record `stamp` unless an equal-or-later one is already there.
fn keep_latest(slot: &mut Option<Stamp>, stamp: Stamp) {
    if slot.is_none_or(|s| stamp.timestep > s.timestep) {
        *slot = Some(stamp);
    }
}

fn validate_tasks(tasks: &[SequentialTask]) -> PlanResult<()> {
    for task in tasks {
        for (i, errand) in task.errands.iter().enumerate() {
            let Some(finished) = errand.finished else { continue };
            let ok = errand.assigned.is_some_and(|a| a.timestep <= finished.timestep);
            if !ok {
                return Err(PlanError::FinishedBeforeAssigned {
                    task:     task.id,
                    errand:   i,
                    finished: finished.timestep,
                });
            }
        }
    }
    Ok(())
}

fn build_event_log(tasks: &[SequentialTask]) -> EventLog {
    let mut log = EventLog::new();
    for (slot, task) in tasks.iter().enumerate() {
        for (errand, record) in task.errands.iter().enumerate() {
            let stamped = [
                (EventKind::Assigned, record.assigned),
                (EventKind::Finished, record.finished),
            ];
            for (kind, stamp) in stamped {
                if let Some(s) = stamp {
                    log.push(Event {
                        timestep:  s.timestep,
                        agent:     s.agent,
                        task:      task.id,
                        task_slot: slot,
                        errand,
                        kind,
                    });
                }
            }
        }
    }
    log
}
