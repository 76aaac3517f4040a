//! Artifact URL resolution
//!
//! Decides, per step index, which artifact URLs are valid to request given
//! the step classification, and constructs them. Every resolver returns one
//! entry per step — `None` marks "no such artifact for this step", which
//! downstream code logs and skips rather than treating as an error.

use crate::classify::record_at;
use crate::session::SessionIds;
use crate::types::{SessionDocument, StepRecord, StepStatus};

/// URLs of the screenshots captured by the live run
///
/// A step classified [`StepStatus::Missing`] has no current image. Any step
/// whose actual record carries no stored image also resolves to `None`.
pub fn current_image_urls(
    doc: &SessionDocument,
    statuses: &[StepStatus],
    server: &str,
) -> Vec<Option<String>> {
    statuses
        .iter()
        .enumerate()
        .map(|(i, status)| {
            if *status == StepStatus::Missing {
                return None;
            }
            image_url(record_at(&doc.actual_app_output, i), server)
        })
        .collect()
}

/// URLs of the baseline screenshots the run was compared against
///
/// A step classified [`StepStatus::New`] has no baseline image.
pub fn baseline_image_urls(
    doc: &SessionDocument,
    statuses: &[StepStatus],
    server: &str,
) -> Vec<Option<String>> {
    statuses
        .iter()
        .enumerate()
        .map(|(i, status)| {
            if *status == StepStatus::New {
                return None;
            }
            image_url(record_at(&doc.expected_app_output, i), server)
        })
        .collect()
}

/// URLs of the rendered visual diffs
///
/// A diff exists exactly for [`StepStatus::Unresolved`] steps. The step
/// number in the path is 1-based.
pub fn diff_urls(ids: &SessionIds, statuses: &[StepStatus], server: &str) -> Vec<Option<String>> {
    statuses
        .iter()
        .enumerate()
        .map(|(i, status)| {
            if *status != StepStatus::Unresolved {
                return None;
            }
            Some(format!(
                "{}/api/sessions/batches/{}/{}/steps/{}/diff",
                server,
                ids.batch_id,
                ids.session_id,
                i + 1
            ))
        })
        .collect()
}

fn image_url(record: Option<&StepRecord>, server: &str) -> Option<String> {
    let image = record?.image.as_ref()?;
    Some(format!("{}/api/images/{}", server, image.id))
}
