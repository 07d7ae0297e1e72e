//! Step outcomes and parallel-group aggregation.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Outcome of one step execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionStatus {
    Success,
    /// A scripted fault.
    SimulatedFail,
    /// An unscripted fault, such as a failed outbound call.
    Fail,
}

impl ExecutionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionStatus::Success)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExecutionStatus::Success => "Success",
            ExecutionStatus::SimulatedFail => "SimulatedFail",
            ExecutionStatus::Fail => "Fail",
        })
    }
}

/// How the members of a parallel group combine into one status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum GroupClause {
    /// Same as [`GroupClause::Any`].
    #[default]
    Undefined,
    /// The group fails if any member fails.
    Any,
    /// The group fails only if every member fails.
    All,
    /// Member failures are ignored.
    None,
}

/// Returned for an unrecognised group clause.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown group clause '{0}', expected one of Undefined, Any, All, None")]
pub struct UnknownGroupClause(pub String);

impl FromStr for GroupClause {
    type Err = UnknownGroupClause;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "undefined" => Ok(GroupClause::Undefined),
            "any" => Ok(GroupClause::Any),
            "all" => Ok(GroupClause::All),
            "none" => Ok(GroupClause::None),
            _ => Err(UnknownGroupClause(s.to_string())),
        }
    }
}

impl TryFrom<String> for GroupClause {
    type Error = UnknownGroupClause;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Reduces the statuses of a parallel group. The first matching member in
/// list order decides:
///
/// - `All`: the first `Success`, otherwise the first status
/// - `None`: always `Success`
/// - `Any` / `Undefined`: the first non-`Success`, otherwise `Success`
///
/// An empty group is a `Success`.
pub fn aggregate(statuses: &[ExecutionStatus], clause: GroupClause) -> ExecutionStatus {
    match clause {
        GroupClause::All => {
            if statuses.iter().any(ExecutionStatus::is_success) {
                ExecutionStatus::Success
            } else {
                statuses.first().copied().unwrap_or(ExecutionStatus::Success)
            }
        }
        GroupClause::None => ExecutionStatus::Success,
        GroupClause::Any | GroupClause::Undefined => statuses
            .iter()
            .copied()
            .find(|status| !status.is_success())
            .unwrap_or(ExecutionStatus::Success),
    }
}
