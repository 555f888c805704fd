//! Scheduled query run descriptors and resolution
//!
//! A Sigma scheduled query produces one run descriptor per execution.
//! The tap only ever reads these: it filters for a completed run of the
//! requested query and takes the authorized download URL from it.

use serde::Deserialize;
use sigma_common::{Result, TapError};

/// Stripe API base URL for listing scheduled query runs
const SCHEDULED_QUERY_RUNS_URL: &str = "https://api.stripe.com/v1/sigma/scheduled_query_runs";

/// A run's output file reference
#[derive(Debug, Clone, Deserialize)]
pub struct FileRef {
    #[serde(default)]
    pub id: Option<String>,
    /// Authorized download location; absent until Stripe has produced
    /// the file
    #[serde(default)]
    pub url: Option<String>,
}

/// One execution of a named scheduled query
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduledQueryRun {
    #[serde(default)]
    pub id: Option<String>,
    /// Report name as shown in the Sigma dashboard
    pub title: String,
    /// Run status; only `"completed"` runs have usable output
    pub status: String,
    #[serde(default)]
    pub file: Option<FileRef>,
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default)]
    pub created: Option<i64>,
}

/// List envelope returned by the Stripe list endpoint
#[derive(Debug, Deserialize)]
struct RunList {
    data: Vec<ScheduledQueryRun>,
}

/// Find the download URL for the first completed run of `query_name`.
///
/// Matching is exact and case-sensitive on the title. Returns `None`
/// when no run matches, which callers treat as a skip rather than an
/// error. When several completed runs share the title, the first one in
/// input order wins; that tie-break is inherited behavior, not a
/// guarantee.
pub fn resolve_file_url<'a>(query_name: &str, runs: &'a [ScheduledQueryRun]) -> Option<&'a str> {
    runs.iter()
        .find(|run| run.title == query_name && run.status == "completed")
        .and_then(|run| run.file.as_ref())
        .and_then(|file| file.url.as_deref())
}

/// Fetch the scheduled query run list from the Stripe API.
///
/// Used by the CLI so callers don't have to pre-fetch the list; the sync
/// entry point itself takes the list as a parameter.
pub async fn list_scheduled_query_runs(
    client: &reqwest::Client,
    client_secret: &str,
) -> Result<Vec<ScheduledQueryRun>> {
    let response = client
        .get(SCHEDULED_QUERY_RUNS_URL)
        .bearer_auth(client_secret)
        .send()
        .await
        .map_err(TapError::network)?
        .error_for_status()
        .map_err(TapError::network)?;

    let list: RunList = response.json().await.map_err(TapError::network)?;
    Ok(list.data)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn run(title: &str, status: &str, url: Option<&str>) -> ScheduledQueryRun {
        ScheduledQueryRun {
            id: None,
            title: title.to_string(),
            status: status.to_string(),
            file: Some(FileRef {
                id: None,
                url: url.map(String::from),
            }),
            sql: None,
            created: None,
        }
    }

    #[test]
    fn test_no_matching_run() {
        let runs = vec![
            run("Q1 Report", "pending", Some("x")),
            run("Other Report", "completed", Some("y")),
        ];
        assert_eq!(resolve_file_url("Q1 Report", &runs), None);
    }

    #[test]
    fn test_single_match_returns_its_url() {
        let runs = vec![
            run("Q1 Report", "pending", Some("x")),
            run("Q1 Report", "completed", Some("https://example/q1.csv")),
        ];
        assert_eq!(
            resolve_file_url("Q1 Report", &runs),
            Some("https://example/q1.csv")
        );
    }

    #[test]
    fn test_first_completed_run_wins() {
        let runs = vec![
            run("Q1 Report", "completed", Some("first")),
            run("Q1 Report", "completed", Some("second")),
        ];
        assert_eq!(resolve_file_url("Q1 Report", &runs), Some("first"));
    }

    #[test]
    fn test_title_match_is_case_sensitive() {
        let runs = vec![run("q1 report", "completed", Some("x"))];
        assert_eq!(resolve_file_url("Q1 Report", &runs), None);
    }

    #[test]
    fn test_completed_run_without_file_url() {
        let runs = vec![run("Q1 Report", "completed", None)];
        assert_eq!(resolve_file_url("Q1 Report", &runs), None);
    }

    #[test]
    fn test_deserializes_stripe_shape() {
        let json = r#"{
            "id": "sqr_1",
            "title": "Q1 Report",
            "status": "completed",
            "file": {"id": "file_1", "url": "https://files.stripe.com/x"},
            "created": 1700000000,
            "livemode": true
        }"#;
        let run: ScheduledQueryRun = serde_json::from_str(json).unwrap();
        assert_eq!(run.title, "Q1 Report");
        assert_eq!(run.file.unwrap().url.unwrap(), "https://files.stripe.com/x");
    }
}
