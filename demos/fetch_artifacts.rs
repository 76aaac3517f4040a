//! Fetch every artifact of a completed test run
//!
//! Usage: cargo run --example fetch_artifacts
//!
//! Reads the run's results URL, the view-scoped API key and an optional
//! destination from the environment, prints the per-step classification, and
//! downloads baseline, current and diff images sequentially.

use std::path::Path;
use visreg_dl::{ArtifactDownloader, Config, ResultsHandle};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let results_url =
        std::env::var("VISREG_RESULTS_URL").expect("Set VISREG_RESULTS_URL to a run's results URL");
    let view_key = std::env::var("VISREG_VIEW_KEY").expect("Set VISREG_VIEW_KEY to a view API key");
    let destination = std::env::var("VISREG_DESTINATION").unwrap_or_else(|_| "artifacts".to_string());

    let handle = ResultsHandle::new(results_url);
    let mut downloader = ArtifactDownloader::connect(&handle, &view_key, Config::default()).await?;

    println!("Test: {} steps", downloader.step_statuses().len());
    let names = downloader.step_names().to_vec();
    for (i, status) in downloader.step_statuses().iter().enumerate() {
        println!("  step {} ({}): {}", i + 1, names[i], status);
    }

    let destination = Path::new(&destination);
    downloader.download_images(destination).await?;
    downloader.download_diffs(destination).await?;

    println!("Artifacts written to {}", destination.display());
    Ok(())
}
