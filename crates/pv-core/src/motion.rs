//! Motion letters and the pure pose transition function.
//!
//! Plan files encode each agent's path as a comma-separated string of motion
//! letters, one per timestep, relative to the agent's start pose.  Which
//! alphabet applies depends on the plan's action model:
//!
//! | Model      | Letters                                                   |
//! |------------|-----------------------------------------------------------|
//! | `Rotation` | `F` forward, `R` clockwise, `C` counter-clockwise, `W`/`T` wait |
//! | `Mapf`     | `U` north, `D` south, `L` west, `R` east, `W`/`T` wait    |
//!
//! Note that `R` means different things under the two models.

use std::fmt;

use crate::{CoreError, CoreResult, Pose};

// ── ActionModel ──────────────────────────────────────────────────────────────

/// Selects the motion alphabet used to decode paths.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionModel {
    /// Cardinal moves without orientation (`actionModel: "MAPF"`).
    Mapf,
    /// Oriented agents that move forward and rotate in place (`"MAPF_T"` and
    /// every other value).
    #[default]
    Rotation,
}

impl ActionModel {
    /// Map the plan file's `actionModel` string to a model.
    pub fn from_plan_name(name: &str) -> ActionModel {
        if name.trim() == "MAPF" {
            ActionModel::Mapf
        } else {
            ActionModel::Rotation
        }
    }

    /// `true` when poses carry a meaningful heading.
    pub fn is_oriented(self) -> bool {
        matches!(self, ActionModel::Rotation)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionModel::Mapf     => "MAPF",
            ActionModel::Rotation => "rotation",
        }
    }
}

impl fmt::Display for ActionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Motion ───────────────────────────────────────────────────────────────────

/// One decoded motion letter.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Motion {
    Forward,
    TurnClockwise,
    TurnCounterClockwise,
    North,
    South,
    West,
    East,
    Wait,
}

impl Motion {
    /// Decode a single letter under `model`.
    pub fn decode(letter: &str, model: ActionModel) -> CoreResult<Motion> {
        let motion = match (model, letter.trim()) {
            (_, "W" | "T")                  => Motion::Wait,
            (ActionModel::Rotation, "F")    => Motion::Forward,
            (ActionModel::Rotation, "R")    => Motion::TurnClockwise,
            (ActionModel::Rotation, "C")    => Motion::TurnCounterClockwise,
            (ActionModel::Mapf, "U")        => Motion::North,
            (ActionModel::Mapf, "D")        => Motion::South,
            (ActionModel::Mapf, "L")        => Motion::West,
            (ActionModel::Mapf, "R")        => Motion::East,
            (model, other) => {
                return Err(CoreError::InvalidMotion {
                    letter: other.to_owned(),
                    model:  model.as_str(),
                });
            }
        };
        Ok(motion)
    }
}

// ── Transition ───────────────────────────────────────────────────────────────

/// Apply `motion` to `pose`.
///
/// Cardinal moves keep the heading unchanged.  A `Forward` from an
/// undirected pose has no defined target and is rejected.
pub fn apply_motion(pose: Pose, motion: Motion) -> CoreResult<Pose> {
    let Pose { row, col, heading } = pose;
    let next = match motion {
        Motion::Forward => {
            let (dr, dc) = heading
                .forward_delta()
                .ok_or(CoreError::UndirectedForward(pose))?;
            Pose::new(row + dr, col + dc, heading)
        }
        Motion::TurnClockwise        => Pose::new(row, col, heading.turned_cw()),
        Motion::TurnCounterClockwise => Pose::new(row, col, heading.turned_ccw()),
        Motion::North                => Pose::new(row - 1, col, heading),
        Motion::South                => Pose::new(row + 1, col, heading),
        Motion::West                 => Pose::new(row, col - 1, heading),
        Motion::East                 => Pose::new(row, col + 1, heading),
        Motion::Wait                 => pose,
    };
    Ok(next)
}

/// Decode a whole comma-separated motion string starting from `start`.
///
/// The returned path has one pose per timestep and begins with `start`, so
/// its length is `motions + 1`.  Empty tokens are skipped.  On failure the
/// error is paired with the 0-based index of the offending motion.
pub fn decode_path(
    start:   Pose,
    letters: &str,
    model:   ActionModel,
) -> Result<Vec<Pose>, (usize, CoreError)> {
    let mut path = vec![start];
    let mut cur = start;
    for (step, letter) in letters.split(',').filter(|l| !l.trim().is_empty()).enumerate() {
        let motion = Motion::decode(letter, model).map_err(|e| (step, e))?;
        cur = apply_motion(cur, motion).map_err(|e| (step, e))?;
        path.push(cur);
    }
    Ok(path)
}
