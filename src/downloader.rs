//! Artifact download orchestration
//!
//! [`ArtifactDownloader`] ties the pieces together for one test run: it
//! fetches the session document once, classifies every step, resolves the
//! per-step artifact URLs, and downloads each artifact through the
//! long-running request client into named files. All work is strictly
//! sequential — artifacts of a kind are processed in ascending step order,
//! and kinds one after another, never interleaved.

use std::path::{Path, PathBuf};

use reqwest::Method;

use crate::classify::{step_names, step_statuses};
use crate::config::Config;
use crate::error::Result;
use crate::long_request::LongRequestClient;
use crate::session::{SessionDataClient, SessionIds, server_url};
use crate::types::{ArtifactKind, ResultsHandle, SessionDocument, StepStatus};
use crate::urls::{baseline_image_urls, current_image_urls, diff_urls};
use crate::utils::strip_high_bytes;

/// Downloader for the artifacts of one completed test run
///
/// Constructed once per run via [`connect`](ArtifactDownloader::connect),
/// which performs the bootstrap session-metadata fetch. The classification
/// and step names are derived once and immutable afterwards.
pub struct ArtifactDownloader {
    document: SessionDocument,
    ids: SessionIds,
    server: String,
    statuses: Vec<StepStatus>,
    names: Vec<String>,
    client: LongRequestClient,
    path_prefix: String,
}

impl ArtifactDownloader {
    /// Fetch the session document for a run and prepare a downloader
    pub async fn connect(handle: &ResultsHandle, api_key: &str, config: Config) -> Result<Self> {
        let session_client = SessionDataClient::new(api_key, &config)?;
        let document = session_client.fetch(handle).await?;
        let ids = SessionIds::from_handle(handle)?;
        let server = server_url(handle)?;

        let statuses = step_statuses(&document);
        let names = step_names(&document, &statuses);

        tracing::info!(
            test = document.test_name(),
            app = document.app_name(),
            steps = statuses.len(),
            "Session loaded"
        );

        let mut downloader = Self {
            document,
            ids,
            server,
            statuses,
            names,
            client: LongRequestClient::new(api_key, &config)?,
            path_prefix: String::new(),
        };
        downloader.set_path_template("");
        Ok(downloader)
    }

    /// Per-step classification of the run, in step order
    pub fn step_statuses(&self) -> &[StepStatus] {
        &self.statuses
    }

    /// Per-step display names, in step order
    pub fn step_names(&self) -> &[String] {
        &self.names
    }

    /// Batch and session identifiers of the run
    pub fn session_ids(&self) -> &SessionIds {
        &self.ids
    }

    /// Set the templated sub-path artifacts are written under
    ///
    /// The template may use `{testName}`, `{appName}`, `{viewport}`,
    /// `{hostingOS}` and `{hostingApp}` placeholders, substituted from the
    /// session document; `{sessionId}/{batchId}/` is always appended. The
    /// default (empty template) writes under `{sessionId}/{batchId}/`.
    pub fn set_path_template(&mut self, template: &str) {
        let mut path = template
            .replace("{testName}", self.document.test_name())
            .replace("{appName}", self.document.app_name())
            .replace("{viewport}", &self.document.viewport())
            .replace("{hostingOS}", self.document.hosting_os())
            .replace("{hostingApp}", self.document.hosting_app());

        if !path.is_empty() && !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(&format!("{}/{}/", self.ids.session_id, self.ids.batch_id));
        self.path_prefix = path;
    }

    /// Download the live run's screenshots
    ///
    /// Steps classified `MISSING` have no current image and are skipped with
    /// an informational notice.
    pub async fn download_current(&mut self, destination: &Path) -> Result<()> {
        let urls = current_image_urls(&self.document, &self.statuses, &self.server);
        self.download_set(&urls, destination, ArtifactKind::Current)
            .await
    }

    /// Download the baseline screenshots
    ///
    /// Steps classified `NEW` have no baseline and are skipped with an
    /// informational notice.
    pub async fn download_baseline(&mut self, destination: &Path) -> Result<()> {
        let urls = baseline_image_urls(&self.document, &self.statuses, &self.server);
        self.download_set(&urls, destination, ArtifactKind::Baseline)
            .await
    }

    /// Download the rendered visual diffs
    ///
    /// Only steps classified `UNRESOLVED` have a diff; every other step is
    /// skipped with an informational notice.
    pub async fn download_diffs(&mut self, destination: &Path) -> Result<()> {
        let urls = diff_urls(&self.ids, &self.statuses, &self.server);
        self.download_set(&urls, destination, ArtifactKind::Diff)
            .await
    }

    /// Download baseline then current screenshots, sequentially
    pub async fn download_images(&mut self, destination: &Path) -> Result<()> {
        self.download_baseline(destination).await?;
        self.download_current(destination).await
    }

    /// Destination directory with the templated prefix applied and sanitized
    fn prep_path(&self, destination: &Path) -> PathBuf {
        let combined = format!("{}/{}", destination.display(), self.path_prefix);
        PathBuf::from(strip_high_bytes(&combined))
    }

    async fn download_set(
        &mut self,
        urls: &[Option<String>],
        destination: &Path,
        kind: ArtifactKind,
    ) -> Result<()> {
        let target = self.prep_path(destination);

        for (index, url) in urls.iter().enumerate() {
            let step = index + 1;
            let Some(url) = url else {
                tracing::info!("No {} image in step {}", kind, step);
                continue;
            };

            tokio::fs::create_dir_all(&target).await?;

            let response = self.client.resolve(Method::GET, url).await?;

            let name = self.names.get(index).map(String::as_str).unwrap_or("");
            let file = target.join(format!(
                "{}_step_{}_{}.png",
                strip_high_bytes(name),
                step,
                kind.label()
            ));
            tokio::fs::write(&file, &response.body).await?;

            tracing::info!(
                step = step,
                bytes = response.body.len(),
                path = %file.display(),
                "Saved {} image",
                kind
            );
        }

        Ok(())
    }
}
