//! Core types for visreg-dl

use serde::{Deserialize, Serialize};

/// Opaque reference to a completed test run
///
/// Wraps the single addressable URL exposed by the visual-testing SDK for a
/// finished run, of the form `.../app/batches/{batchId}/{sessionId}/...`.
/// Supplied once by the caller and immutable thereafter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultsHandle {
    url: String,
}

impl ResultsHandle {
    /// Create a handle from the results URL of a completed run
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// The addressable URL of the run
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Display for ResultsHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// Outcome of comparing one step against its baseline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepStatus {
    /// The live screenshot matched the baseline
    Passed,
    /// The live screenshot differed from the baseline
    Unresolved,
    /// The step has no baseline (first run of this checkpoint)
    New,
    /// The baseline exists but the live run produced no screenshot
    Missing,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            StepStatus::Passed => "PASSED",
            StepStatus::Unresolved => "UNRESOLVED",
            StepStatus::New => "NEW",
            StepStatus::Missing => "MISSING",
        };
        write!(f, "{}", label)
    }
}

/// Kind of downloadable artifact associated with a step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Screenshot captured by the live run
    Current,
    /// Baseline screenshot the run was compared against
    Baseline,
    /// Rendered visual difference between baseline and current
    Diff,
}

impl ArtifactKind {
    /// Label used in artifact file names and log lines
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::Current => "Current",
            ArtifactKind::Baseline => "Baseline",
            ArtifactKind::Diff => "Diff",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Session metadata document for one test run
///
/// Fetched once per session from the metadata endpoint and immutable
/// thereafter. The expected sequence holds the baseline per-step records, the
/// actual sequence the live run's records; either may contain explicit `null`
/// holes for steps the respective side did not produce.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDocument {
    /// Environment attributes of the run
    pub start_info: StartInfo,
    /// Baseline per-step records, indexed by step
    #[serde(default)]
    pub expected_app_output: Vec<Option<StepRecord>>,
    /// Live-run per-step records, indexed by step
    #[serde(default)]
    pub actual_app_output: Vec<Option<StepRecord>>,
}

impl SessionDocument {
    /// Scenario name of the run
    pub fn test_name(&self) -> &str {
        &self.start_info.scenario_name
    }

    /// Application under test
    pub fn app_name(&self) -> &str {
        &self.start_info.app_name
    }

    /// Viewport rendered as `{width}x{height}`
    pub fn viewport(&self) -> String {
        let size = &self.start_info.environment.display_size;
        format!("{}x{}", size.width, size.height)
    }

    /// Operating system the run executed on
    pub fn hosting_os(&self) -> &str {
        &self.start_info.environment.os
    }

    /// Browser or app hosting the checkpoints
    pub fn hosting_app(&self) -> &str {
        &self.start_info.environment.hosting_app
    }
}

/// Run-level metadata recorded when the session started
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartInfo {
    /// Scenario (test) name
    pub scenario_name: String,
    /// Application name
    pub app_name: String,
    /// Execution environment attributes
    pub environment: Environment,
}

/// Execution environment of the run
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    /// Viewport dimensions
    pub display_size: DisplaySize,
    /// Operating system
    pub os: String,
    /// Hosting application (browser)
    pub hosting_app: String,
}

/// Viewport dimensions in pixels
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct DisplaySize {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// One per-step record from either output sequence
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    /// Human-readable checkpoint tag
    #[serde(default)]
    pub tag: String,
    /// Stored screenshot reference, absent when the side produced no image
    #[serde(default)]
    pub image: Option<ImageRef>,
    /// Whether the live screenshot matched the baseline
    #[serde(default)]
    pub is_matching: bool,
}

/// Reference to a stored screenshot
#[derive(Clone, Debug, Deserialize)]
pub struct ImageRef {
    /// Service-side image identifier
    pub id: String,
}
