//! Property tests for parallel group aggregation.
//!
//! Invariants tested:
//! - `None` always yields Success
//! - `All` yields Success when any member succeeded, else the first member
//! - `Any` yields the first failure in list order

use faultline_engine::{aggregate, ExecutionStatus, GroupClause};
use proptest::prelude::*;

fn status() -> impl Strategy<Value = ExecutionStatus> {
    prop_oneof![
        Just(ExecutionStatus::Success),
        Just(ExecutionStatus::SimulatedFail),
        Just(ExecutionStatus::Fail),
    ]
}

proptest! {
    #[test]
    fn none_swallows_everything(statuses in prop::collection::vec(status(), 0..32)) {
        prop_assert_eq!(aggregate(&statuses, GroupClause::None), ExecutionStatus::Success);
    }

    #[test]
    fn all_prefers_any_success(statuses in prop::collection::vec(status(), 1..32)) {
        let result = aggregate(&statuses, GroupClause::All);
        if statuses.contains(&ExecutionStatus::Success) {
            prop_assert_eq!(result, ExecutionStatus::Success);
        } else {
            prop_assert_eq!(result, statuses[0]);
        }
    }

    #[test]
    fn any_and_undefined_report_first_failure(statuses in prop::collection::vec(status(), 0..32)) {
        let expected = statuses
            .iter()
            .copied()
            .find(|status| *status != ExecutionStatus::Success)
            .unwrap_or(ExecutionStatus::Success);
        prop_assert_eq!(aggregate(&statuses, GroupClause::Any), expected);
        prop_assert_eq!(aggregate(&statuses, GroupClause::Undefined), expected);
    }

    /// Property: aggregation depends on the vector only, not on call count
    #[test]
    fn aggregation_is_deterministic(
        statuses in prop::collection::vec(status(), 0..16),
        clause in prop_oneof![
            Just(GroupClause::Undefined),
            Just(GroupClause::Any),
            Just(GroupClause::All),
            Just(GroupClause::None),
        ],
    ) {
        prop_assert_eq!(aggregate(&statuses, clause), aggregate(&statuses, clause));
    }
}

#[test]
fn documented_examples() {
    use ExecutionStatus::{Fail, SimulatedFail, Success};

    assert_eq!(aggregate(&[SimulatedFail, Fail, Fail], GroupClause::None), Success);
    assert_eq!(aggregate(&[SimulatedFail, Success, Fail], GroupClause::All), Success);
    assert_eq!(aggregate(&[SimulatedFail, Fail], GroupClause::All), SimulatedFail);
}
