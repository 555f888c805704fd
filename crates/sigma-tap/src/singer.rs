//! Singer message sink
//!
//! The downstream consumer speaks a line-oriented message protocol: one
//! SCHEMA message declaring the stream's shape, followed by one RECORD
//! message per row. The sink is a trait so the sync pipeline can write
//! to stdout in production and to memory in tests.

use crate::schema::Schema;
use serde::Serialize;
use sigma_common::{Record, Result};
use std::io::Write;

/// Destination for a (schema, records) stream.
///
/// For a given stream, `write_schema` is called exactly once, strictly
/// before any `write_record` call.
pub trait StreamSink {
    /// Declare the stream's schema
    fn write_schema(
        &mut self,
        stream: &str,
        schema: &Schema,
        key_properties: &[String],
    ) -> Result<()>;

    /// Emit one record for the stream
    fn write_record(&mut self, stream: &str, record: &Record) -> Result<()>;
}

#[derive(Serialize)]
struct SchemaMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    stream: &'a str,
    schema: &'a Schema,
    key_properties: &'a [String],
}

#[derive(Serialize)]
struct RecordMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    stream: &'a str,
    record: &'a Record,
}

/// Writes Singer messages as JSON lines to any writer.
///
/// In production this wraps stdout; human logs go to stderr so the
/// message stream stays parseable.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_line<T: Serialize>(&mut self, message: &T) -> Result<()> {
        serde_json::to_writer(&mut self.writer, message)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl JsonLinesSink<std::io::Stdout> {
    /// Sink over stdout, the conventional tap output channel
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> StreamSink for JsonLinesSink<W> {
    fn write_schema(
        &mut self,
        stream: &str,
        schema: &Schema,
        key_properties: &[String],
    ) -> Result<()> {
        self.write_line(&SchemaMessage {
            kind: "SCHEMA",
            stream,
            schema,
            key_properties,
        })
    }

    fn write_record(&mut self, stream: &str, record: &Record) -> Result<()> {
        self.write_line(&RecordMessage {
            kind: "RECORD",
            stream,
            record,
        })
    }
}

/// Captured message, for test assertions
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Schema {
        stream: String,
        schema: serde_json::Value,
        key_properties: Vec<String>,
    },
    Record {
        stream: String,
        record: serde_json::Value,
    },
}

/// In-memory sink capturing messages in emission order
#[derive(Debug, Default)]
pub struct MemorySink {
    pub messages: Vec<Message>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the RECORD messages, in order
    pub fn records(&self) -> Vec<&serde_json::Value> {
        self.messages
            .iter()
            .filter_map(|message| match message {
                Message::Record { record, .. } => Some(record),
                Message::Schema { .. } => None,
            })
            .collect()
    }
}

impl StreamSink for MemorySink {
    fn write_schema(
        &mut self,
        stream: &str,
        schema: &Schema,
        key_properties: &[String],
    ) -> Result<()> {
        self.messages.push(Message::Schema {
            stream: stream.to_string(),
            schema: serde_json::to_value(schema)?,
            key_properties: key_properties.to_vec(),
        });
        Ok(())
    }

    fn write_record(&mut self, stream: &str, record: &Record) -> Result<()> {
        self.messages.push(Message::Record {
            stream: stream.to_string(),
            record: serde_json::to_value(record)?,
        });
        Ok(())
    }
}
