//! Staging-file materialization
//!
//! Downloads a run's output file to a uniquely named local staging path.
//! The staging file is a scratch artifact for one sync: the [`StagedFile`]
//! guard removes it when it goes out of scope, on every exit path.

use chrono::{DateTime, Utc};
use sigma_common::{Result, TapError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound on the download request, including the body read.
/// Matches the upstream report sizes we have seen; there are no retries.
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 300;

/// Normalize a query name into a stream name.
///
/// Lower-cases and replaces spaces and hyphens with underscores. The
/// result is a pure function of the name and is idempotent, so callers
/// may re-normalize freely.
pub fn stream_name(query_name: &str) -> String {
    query_name
        .to_lowercase()
        .replace([' ', '-'], "_")
}

/// Build the staging path `{folder}/{stream}_{timestamp}.csv` for a
/// query downloaded at `now`.
pub fn staging_path(folder: &str, query_name: &str, now: DateTime<Utc>) -> PathBuf {
    let timestamp = now.format("%Y%m%d_%H%M%S");
    Path::new(folder).join(format!("{}_{}.csv", stream_name(query_name), timestamp))
}

/// Build a client with the download timeout applied.
///
/// The timeout covers the whole request; reqwest has no per-request
/// deadline on an already-built client.
pub fn download_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .build()
        .map_err(TapError::network)
}

/// Download the run file at `url` to `output_path`, overwriting.
///
/// Sends one authenticated GET with `Authorization: Bearer <secret>`.
/// A transport failure or non-success status is fatal to the sync; no
/// retry is attempted. The body is interpreted as UTF-8 text.
pub async fn download_run_file(
    client: &reqwest::Client,
    url: &str,
    client_secret: &str,
    output_path: &Path,
) -> Result<()> {
    let response = client
        .get(url)
        .bearer_auth(client_secret)
        .send()
        .await
        .map_err(TapError::network)?
        .error_for_status()
        .map_err(TapError::network)?;

    let body = response.text().await.map_err(TapError::network)?;
    std::fs::write(output_path, body)?;
    Ok(())
}

/// RAII guard for the staging file.
///
/// Deletes the file on drop so that a parse or emission fault cannot
/// leak the downloaded artifact onto disk.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed staging file"),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Failed to remove staging file")
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_stream_name_normalization() {
        assert_eq!(stream_name("Q1 Report"), "q1_report");
        assert_eq!(stream_name("monthly-revenue"), "monthly_revenue");
        assert_eq!(stream_name("Churn - EU"), "churn___eu");
    }

    #[test]
    fn test_stream_name_idempotent() {
        for name in ["Q1 Report", "monthly-revenue", "already_normal"] {
            let once = stream_name(name);
            assert_eq!(stream_name(&once), once);
        }
    }

    #[test]
    fn test_staging_path_shape() {
        let now = Utc.with_ymd_and_hms(2024, 1, 18, 9, 30, 5).unwrap();
        let path = staging_path("stripe_files", "Q1 Report", now);
        assert_eq!(
            path,
            PathBuf::from("stripe_files/q1_report_20240118_093005.csv")
        );
    }

    #[test]
    fn test_staged_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scratch.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();

        {
            let _guard = StagedFile::new(path.clone());
            assert!(path.exists());
        }
        assert!(!path.exists());
    }
}
