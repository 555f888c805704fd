//! Sigma Tap Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the sigma-tap workspace.
//!
//! # Overview
//!
//! This crate provides common functionality used across all sigma-tap
//! workspace members:
//!
//! - **Error Handling**: The [`TapError`] type and [`Result`] alias
//! - **Logging**: Tracing configuration and initialization
//! - **Values**: The tagged scalar value model and record type used by
//!   schema inference and record emission
//!
//! # Example
//!
//! ```no_run
//! use sigma_common::{Result, Value};
//!
//! fn parse_cell(raw: &str) -> Result<Value> {
//!     Ok(Value::from_csv_field(raw))
//! }
//! ```

pub mod error;
pub mod logging;
pub mod value;

// Re-export commonly used types
pub use error::{Result, TapError};
pub use value::{Record, Value};
