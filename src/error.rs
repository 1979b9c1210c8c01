//! `OptimizeError`: the public error kind, one variant per validation/abort condition.
//!
//! Plain enum with a hand-written `Display` rather than a derive-macro error crate this crate
//! doesn't otherwise depend on. There is deliberately no variant for a single individual's
//! evaluation failing — that degrades to a fitness of 0 inside [crate::fitness] instead of
//! propagating to the caller.
use std::fmt;

use crate::evolve::PartialOutcome;

#[derive(Debug, Clone)]
pub enum OptimizeError {
    /// `tasks` or `agents` was empty.
    EmptyInput,
    /// `config.team_size > agents.len()`.
    TeamTooLarge { team_size: usize, available_agents: usize },
    /// The initial population contained zero valid individuals.
    NoFeasibleStart,
    /// The caller's abort signal fired; carries whatever partial result had been produced.
    Aborted(PartialOutcome),
}

impl fmt::Display for OptimizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizeError::EmptyInput => write!(f, "tasks and agents must both be non-empty"),
            OptimizeError::TeamTooLarge {
                team_size,
                available_agents,
            } => write!(
                f,
                "team_size {team_size} exceeds the number of available agents ({available_agents})"
            ),
            OptimizeError::NoFeasibleStart => {
                write!(f, "initial population contains zero valid individuals")
            }
            OptimizeError::Aborted(_) => write!(f, "optimization was aborted by the caller"),
        }
    }
}

impl std::error::Error for OptimizeError {}
