//! Step classification
//!
//! Derives, for every step index of a session, whether the step passed, is
//! unresolved, is new, or is missing, plus its human-readable name. Both
//! derivations are pure functions of the session document, so re-running them
//! on the same document always yields the same output.

use crate::types::{SessionDocument, StepRecord, StepStatus};

/// Classify every step of a session
///
/// The result has exactly `max(len(expected), len(actual))` entries. For each
/// index the checks apply in order:
/// 1. no expected record → [`StepStatus::New`]
/// 2. no actual record → [`StepStatus::Missing`]
/// 3. actual record matched → [`StepStatus::Passed`]
/// 4. otherwise → [`StepStatus::Unresolved`]
///
/// The ordering matters: a step with no baseline is `New` even when the live
/// run also produced nothing at that index.
pub fn step_statuses(doc: &SessionDocument) -> Vec<StepStatus> {
    let steps = doc.expected_app_output.len().max(doc.actual_app_output.len());

    (0..steps)
        .map(|i| {
            let expected = record_at(&doc.expected_app_output, i);
            let actual = record_at(&doc.actual_app_output, i);
            match (expected, actual) {
                (None, _) => StepStatus::New,
                (Some(_), None) => StepStatus::Missing,
                (Some(_), Some(a)) if a.is_matching => StepStatus::Passed,
                (Some(_), Some(_)) => StepStatus::Unresolved,
            }
        })
        .collect()
}

/// Resolve the display name of every step
///
/// A `New` step is named from the actual record's tag (there is no expected
/// record to name it from); every other status uses the expected record's
/// tag. An absent or untagged record yields an empty name.
pub fn step_names(doc: &SessionDocument, statuses: &[StepStatus]) -> Vec<String> {
    statuses
        .iter()
        .enumerate()
        .map(|(i, status)| {
            let source = if *status == StepStatus::New {
                record_at(&doc.actual_app_output, i)
            } else {
                record_at(&doc.expected_app_output, i)
            };
            source.map(|r| r.tag.clone()).unwrap_or_default()
        })
        .collect()
}

/// Record at an index, treating both out-of-range and explicit `null` as absent
pub(crate) fn record_at(output: &[Option<StepRecord>], index: usize) -> Option<&StepRecord> {
    output.get(index).and_then(Option::as_ref)
}
