//! Interactive commands read from stdin.

use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};

use pv_plan::{PathSource, TaskState};
use pv_render::TaskFilter;

pub const HELP: &str = "\
commands:
  next | n            step forward
  prev | p            step back
  goto T              jump to timestep T (clamped into the session)
  play [N]            play to the end, or N steps; Ctrl-C pauses
  restart             back to the first timestep
  conflicts           list conflicts
  conflict I          jump before conflict I and mark its agents
  events              list task events
  event I             jump before event I
  path A              show or hide agent A's planned path
  agent A             agent A's pose and tasks
  task I              task I's assignee and errand states
  plan | exec         follow planned or executed paths
  tasks [STATE|all]   show only tasks in STATE
  heat                toggle the heat map
  highway | hw        toggle highway arrows (--hw)
  heuristic | heu     toggle the heuristic map (--heu)
  search [I]          list search trees, or toggle tree I (--searchTree)
  status              task counts at the current timestep
  help                this list
  quit | q            leave";

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Command {
    Next,
    Prev,
    Goto(i64),
    Play(Option<usize>),
    Restart,
    Conflicts,
    Conflict(usize),
    Events,
    Event(usize),
    Path(u32),
    Agent(u32),
    Task(u32),
    Source(PathSource),
    Tasks(TaskFilter),
    Heat,
    Highway,
    Heuristic,
    Search(Option<usize>),
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else { bail!("empty command") };
        let arg = words.next();
        if let Some(extra) = words.next() {
            bail!("unexpected argument `{extra}`");
        }

        let command = match (head, arg) {
            ("next" | "n", None)    => Command::Next,
            ("prev" | "p", None)    => Command::Prev,
            ("goto", Some(t))       => Command::Goto(number(t, "timestep")?),
            ("play", n)             => Command::Play(n.map(|n| number(n, "step count")).transpose()?),
            ("restart", None)       => Command::Restart,
            ("conflicts", None)     => Command::Conflicts,
            ("conflict", Some(i))   => Command::Conflict(number(i, "conflict index")?),
            ("events", None)        => Command::Events,
            ("event", Some(i))      => Command::Event(number(i, "event index")?),
            ("path", Some(a))       => Command::Path(number(a, "agent id")?),
            ("agent", Some(a))      => Command::Agent(number(a, "agent id")?),
            ("task", Some(i))       => Command::Task(number(i, "task id")?),
            ("plan", None)          => Command::Source(PathSource::Planned),
            ("exec", None)          => Command::Source(PathSource::Executed),
            ("tasks", None)         => Command::Tasks(TaskFilter::All),
            ("tasks", Some(state))  => Command::Tasks(task_filter(state)?),
            ("heat", None)          => Command::Heat,
            ("highway" | "hw", None)     => Command::Highway,
            ("heuristic" | "heu", None)  => Command::Heuristic,
            ("search", i)           => Command::Search(i.map(|i| number(i, "search tree index")).transpose()?),
            ("status", None)        => Command::Status,
            ("help" | "?", None)    => Command::Help,
            ("quit" | "q" | "exit", None) => Command::Quit,
            ("goto" | "conflict" | "event" | "path" | "agent" | "task", None) => bail!("`{head}` needs an argument"),
            (_, Some(_)) if is_known(head) => bail!("`{head}` takes no argument"),
            _ => bail!("unknown command `{head}`; try `help`"),
        };
        Ok(command)
    }
}

fn number<T: FromStr>(word: &str, what: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    word.parse().with_context(|| format!("invalid {what} `{word}`"))
}

fn task_filter(word: &str) -> Result<TaskFilter> {
    if word == "all" {
        return Ok(TaskFilter::All);
    }
    TaskState::ALL
        .into_iter()
        .find(|s| s.as_str() == word)
        .map(TaskFilter::Only)
        .ok_or_else(|| anyhow!("unknown task state `{word}`"))
}

fn is_known(head: &str) -> bool {
    matches!(
        head,
        "next" | "n" | "prev" | "p" | "restart" | "conflicts" | "events" | "plan" | "exec" | "heat"
            | "highway" | "hw" | "heuristic" | "heu" | "status" | "help" | "?" | "quit" | "q" | "exit"
    )
}
