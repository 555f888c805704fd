//! Sigma Tap Library
//!
//! An extraction connector for Stripe Sigma scheduled queries. Given a
//! query name and the list of its scheduled runs, the tap locates the
//! most recent completed run, downloads its CSV output to a transient
//! staging file, infers a structural schema from the rows, and emits a
//! Singer-style (SCHEMA, RECORD...) message stream to a sink.
//!
//! # Pipeline
//!
//! 1. **Run resolution** ([`runs`]): pick the first completed run whose
//!    title matches the requested query and take its authorized file URL.
//! 2. **File materialization** ([`fetch`]): download the file with bearer
//!    auth to `{folder}/{stream}_{timestamp}.csv`.
//! 3. **Schema & stream emission** ([`schema`], [`transform`],
//!    [`singer`]): parse the rows, infer the item schema, declare it,
//!    then emit each converted record.
//!
//! # Example
//!
//! ```no_run
//! use sigma_tap::singer::JsonLinesSink;
//! use sigma_tap::sync::sync_sigma_query;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = reqwest::Client::new();
//!     let runs = sigma_tap::runs::list_scheduled_query_runs(&client, "sk_test_x").await?;
//!     let mut sink = JsonLinesSink::stdout();
//!     sync_sigma_query(&client, "Q1 Report", &runs, "sk_test_x", "stripe_files", &mut sink)
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod fetch;
pub mod runs;
pub mod schema;
pub mod singer;
pub mod sync;
pub mod transform;

pub use sync::{sync_sigma_query, SyncOutcome};
