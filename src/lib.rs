//! # visreg-dl
//!
//! Library for retrieving visual-regression test artifacts from a remote
//! image-comparison service.
//!
//! Given the results handle of a completed test run, visreg-dl fetches the
//! session metadata, classifies every step (`PASSED`, `UNRESOLVED`, `NEW`,
//! `MISSING`), and downloads the baseline, current and diff images that exist
//! for each step. The service resolves some artifact requests asynchronously;
//! the long-running request client polls follow-up locations with capped
//! backoff and retries transport failures, so callers see a single resolved
//! result per artifact.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Sequential by design** - Artifacts are fetched one at a time, in step
//!   order; there is no fan-out and no cancellation primitive
//! - **Sensible defaults** - Retry and polling intervals match the service's
//!   documented behavior out of the box
//!
//! ## Quick Start
//!
//! ```no_run
//! use visreg_dl::{ArtifactDownloader, Config, ResultsHandle};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handle = ResultsHandle::new("https://eyes.example.com/app/batches/51384/73266");
//!     let mut downloader =
//!         ArtifactDownloader::connect(&handle, "view-key", Config::default()).await?;
//!
//!     for (i, status) in downloader.step_statuses().iter().enumerate() {
//!         println!("step {}: {}", i + 1, status);
//!     }
//!
//!     let destination = std::path::Path::new("./artifacts");
//!     downloader.download_images(destination).await?;
//!     downloader.download_diffs(destination).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Step classification
pub mod classify;
/// Configuration types
pub mod config;
/// Artifact download orchestration
pub mod downloader;
/// Error types
pub mod error;
/// Long-running request protocol client
pub mod long_request;
/// Session metadata retrieval
pub mod session;
/// Core types
pub mod types;
/// Artifact URL resolution
pub mod urls;
/// File name and path sanitization helpers
pub mod utils;

// Re-export commonly used types
pub use config::{Config, PollingConfig, RetryConfig};
pub use downloader::ArtifactDownloader;
pub use error::{Error, Result};
pub use long_request::{CountedRequestIds, FinalResponse, LongRequestClient, RequestIds};
pub use session::{SessionDataClient, SessionIds};
pub use types::{ArtifactKind, ResultsHandle, SessionDocument, StepStatus};
