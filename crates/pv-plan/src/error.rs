use pv_core::{AgentId, CoreError, TaskId, Timestep};
use thiserror::Error;

/// Load-time failures.  Every one of these is fatal: the replay engine only
/// ever sees a fully validated [`Plan`][crate::Plan].
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("missing required plan field `{0}`")]
    MissingField(&'static str),

    #[error("{what} has {got} entries but the team has {expected} agents")]
    AgentCountMismatch {
        expected: usize,
        got:      usize,
        what:     &'static str,
    },

    #[error("{path} path of agent {agent}, step {step}: {source}")]
    InvalidMotion {
        agent:  AgentId,
        path:   &'static str,
        step:   usize,
        #[source]
        source: CoreError,
    },

    #[error("{0} is referenced by an event but absent from the task list")]
    UnknownTask(TaskId),

    #[error("errand {errand} of {task} does not exist")]
    InvalidErrand { task: TaskId, errand: usize },

    #[error("{task} lists {len} coordinates; errand locations come in (row, col) pairs")]
    UnpairedLocation { task: TaskId, len: usize },

    #[error("errand {errand} of {task} finishes at {finished} without an earlier assignment")]
    FinishedBeforeAssigned {
        task:     TaskId,
        errand:   usize,
        finished: Timestep,
    },

    #[error("malformed schedule entry {entry:?} for agent {agent}")]
    Schedule { agent: AgentId, entry: String },

    #[error("plan mixes {0} with a different schema")]
    SchemaMismatch(&'static str),

    #[error("{what} file, line {line}: {reason}")]
    Overlay {
        what:   &'static str,
        line:   usize,
        reason: String,
    },

    #[error("heuristic file has no line for agent {0}")]
    MissingHeuristic(AgentId),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PlanResult<T> = Result<T, PlanError>;
