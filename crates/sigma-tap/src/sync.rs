//! Sync orchestration
//!
//! One call syncs one scheduled query: resolve the completed run,
//! download its file to a staging path, parse the rows, infer and
//! declare the schema, then emit each converted record. The stages run
//! strictly in sequence; nothing persists across calls.

use crate::fetch::{download_run_file, staging_path, stream_name, StagedFile};
use crate::runs::{resolve_file_url, ScheduledQueryRun};
use crate::schema::{Schema, SchemaBuilder};
use crate::singer::StreamSink;
use crate::transform::transform_record;
use chrono::Utc;
use sigma_common::{Record, Result, TapError, Value};
use std::path::Path;
use tracing::{info, warn};

/// What a sync call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No completed run matched the query name; nothing was fetched or
    /// emitted
    Skipped,
    /// Schema declared and all records emitted
    Synced { stream: String, records: usize },
}

/// Sync one scheduled query to the sink.
///
/// `runs` is the externally supplied run list (see
/// [`crate::runs::list_scheduled_query_runs`] for fetching it live).
/// The client should carry the download timeout; use
/// [`crate::fetch::download_client`].
///
/// A missing run is a skip, not an error. Every other failure is fatal
/// to the invocation and propagates; the staging file is removed on all
/// of those paths too.
pub async fn sync_sigma_query<S: StreamSink>(
    client: &reqwest::Client,
    query_name: &str,
    runs: &[ScheduledQueryRun],
    client_secret: &str,
    folder_name: &str,
    sink: &mut S,
) -> Result<SyncOutcome> {
    let Some(file_url) = resolve_file_url(query_name, runs) else {
        warn!(query = %query_name, "No completed query run found, skipping");
        return Ok(SyncOutcome::Skipped);
    };

    std::fs::create_dir_all(folder_name)?;
    let stream = stream_name(query_name);
    let output_path = staging_path(folder_name, query_name, Utc::now());

    info!(query = %query_name, path = %output_path.display(), "Downloading query file");
    download_run_file(client, file_url, client_secret, &output_path).await?;
    info!(query = %query_name, path = %output_path.display(), "Finished downloading query file");

    // From here on the staging file is removed on every exit path.
    let staged = StagedFile::new(output_path);

    info!(path = %staged.path().display(), "Converting query file to records");
    let (columns, records) = parse_staged_file(staged.path())?;

    info!(stream = %stream, records = records.len(), "Building schema");
    let schema = build_schema(&columns, &records);

    // No primary key for sigma queries; streams are append-only.
    sink.write_schema(&stream, &schema, &[])?;

    for record in &records {
        let converted = transform_record(record, &schema)?;
        sink.write_record(&stream, &converted)?;
    }

    info!(query = %query_name, stream = %stream, records = records.len(), "Finished syncing");
    Ok(SyncOutcome::Synced {
        stream,
        records: records.len(),
    })
}

/// Infer the stream schema, keeping header columns that have no data
/// rows (they come out nullable).
fn build_schema(columns: &[String], records: &[Record]) -> Schema {
    let mut builder = SchemaBuilder::new();
    for column in columns {
        builder.declare_column(column);
    }
    for record in records {
        builder.add(record);
    }
    builder.finish()
}

/// Parse the staged CSV into its header columns and ordered records.
///
/// The header row names the columns; each data row becomes one record
/// in file order. An empty file has no header to derive a schema from
/// and is fatal; ragged rows surface as parse faults from the reader.
fn parse_staged_file(path: &Path) -> Result<(Vec<String>, Vec<Record>)> {
    let mut reader = csv::Reader::from_path(path).map_err(TapError::parse)?;

    let headers = reader.headers().map_err(TapError::parse)?.clone();
    if headers.is_empty() {
        return Err(TapError::SchemaInference(format!(
            "staged file {} is empty, cannot infer a schema",
            path.display()
        )));
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(TapError::parse)?;
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(column, raw)| (column.to_string(), Value::from_csv_field(raw)))
            .collect();
        records.push(record);
    }
    let columns = headers.iter().map(String::from).collect();
    Ok((columns, records))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_staged_file_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        std::fs::write(&path, "id,amount\n1,10\n2,20\n").unwrap();

        let (columns, records) = parse_staged_file(&path).unwrap();
        assert_eq!(columns, vec!["id".to_string(), "amount".to_string()]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("id"), Some(&Value::Integer(1)));
        assert_eq!(records[1].get("amount"), Some(&Value::Integer(20)));
    }

    #[test]
    fn test_parse_empty_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "").unwrap();

        let err = parse_staged_file(&path).unwrap_err();
        assert!(matches!(err, TapError::SchemaInference(_)));
    }

    #[test]
    fn test_parse_header_only_file_yields_no_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("header.csv");
        std::fs::write(&path, "a,b\n").unwrap();

        let (columns, records) = parse_staged_file(&path).unwrap();
        assert_eq!(columns.len(), 2);
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_ragged_row_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragged.csv");
        std::fs::write(&path, "a,b\n1\n").unwrap();

        let err = parse_staged_file(&path).unwrap_err();
        assert!(matches!(err, TapError::Parse(_)));
    }

    #[test]
    fn test_empty_cells_parse_as_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nulls.csv");
        std::fs::write(&path, "a,b\n1,\n").unwrap();

        let (_, records) = parse_staged_file(&path).unwrap();
        assert_eq!(records[0].get("b"), Some(&Value::Null));
    }
}
