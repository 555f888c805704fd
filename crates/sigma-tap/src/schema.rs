//! Structural schema inference
//!
//! The column set and column types of a Sigma report are not known ahead
//! of time and vary per query definition, so the tap derives the stream
//! schema from the rows it actually observes. Inference is a pure fold
//! over the records: each record's keys and value types are unioned into
//! the accumulator, with widening only (integer + float widens to
//! number, any type + null becomes nullable, a column missing from some
//! record becomes nullable). Union-only merging makes the fold
//! commutative, so the resulting schema does not depend on row order.
//!
//! The serialized form is the JSON-Schema item schema of "array of flat
//! objects": `{"type": "object", "properties": {...}}`.

use serde::ser::{Serialize, SerializeMap, Serializer};
use sigma_common::{Record, Value};
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Plausible Unix-epoch-seconds window for date-time detection
/// (2001-09-09 through 2286-11-20). Keeps small counters and huge ids
/// from being mistaken for timestamps.
const EPOCH_SECONDS_MIN: i64 = 1_000_000_000;
const EPOCH_SECONDS_MAX: i64 = 10_000_000_000;

/// Scalar JSON-Schema type tags.
///
/// Variant order matches alphabetical name order so that serialized
/// type unions come out sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SchemaType {
    Boolean,
    Integer,
    Null,
    Number,
    String,
}

impl SchemaType {
    /// The type tag of an observed value
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => SchemaType::Null,
            Value::Bool(_) => SchemaType::Boolean,
            Value::Integer(_) => SchemaType::Integer,
            Value::Float(_) => SchemaType::Number,
            Value::String(_) => SchemaType::String,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SchemaType::Boolean => "boolean",
            SchemaType::Integer => "integer",
            SchemaType::Null => "null",
            SchemaType::Number => "number",
            SchemaType::String => "string",
        }
    }
}

/// Inferred schema for one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySchema {
    types: BTreeSet<SchemaType>,
    /// Set when every observed value is a plausible epoch-seconds
    /// integer and the column name is date-like
    datetime: bool,
}

impl PropertySchema {
    fn new() -> Self {
        Self {
            types: BTreeSet::new(),
            datetime: false,
        }
    }

    /// Widen this property with one observed value
    fn observe(&mut self, value: &Value) {
        self.types.insert(SchemaType::of(value));
        // number absorbs integer
        if self.types.contains(&SchemaType::Number) {
            self.types.remove(&SchemaType::Integer);
        }
    }

    /// Mark the column as nullable (value absent in some record)
    fn widen_nullable(&mut self) {
        self.types.insert(SchemaType::Null);
    }

    /// True when the column is typed as a date-time representation
    pub fn is_datetime(&self) -> bool {
        self.datetime
    }

    /// The widened type union, sorted by type name
    pub fn types(&self) -> impl Iterator<Item = SchemaType> + '_ {
        self.types.iter().copied()
    }
}

impl Serialize for PropertySchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if self.types.len() == 1 {
            // Single type serializes as a bare string, like genson output
            if let Some(t) = self.types.iter().next() {
                map.serialize_entry("type", t.name())?;
            }
        } else {
            let names: Vec<&str> = self.types.iter().map(|t| t.name()).collect();
            map.serialize_entry("type", &names)?;
        }
        if self.datetime {
            map.serialize_entry("format", "date-time")?;
        }
        map.end()
    }
}

/// The inferred item schema of the record stream
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    properties: BTreeMap<String, PropertySchema>,
}

impl Schema {
    /// Infer the stream schema from the full record batch.
    ///
    /// Folds every record into one generalized description; the fold is
    /// commutative, so a fixed record set always produces the same
    /// schema regardless of order. An empty batch yields an object
    /// schema with no properties.
    pub fn infer(records: &[Record]) -> Self {
        let mut builder = SchemaBuilder::new();
        for record in records {
            builder.add(record);
        }
        builder.finish()
    }

    /// Look up the schema for one column
    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertySchema)> {
        self.properties.iter().map(|(name, prop)| (name.as_str(), prop))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", "object")?;
        map.serialize_entry("properties", &self.properties)?;
        map.end()
    }
}

/// Accumulator for the schema fold
struct ColumnState {
    prop: PropertySchema,
    /// Rows in which the column appeared
    seen: usize,
    /// AND over observations: every non-null value so far was an
    /// integer inside the epoch-seconds window
    epoch_plausible: bool,
}

impl ColumnState {
    fn new() -> Self {
        Self {
            prop: PropertySchema::new(),
            seen: 0,
            epoch_plausible: true,
        }
    }
}

/// Incremental schema builder.
///
/// [`Schema::infer`] drives it over a slice; it is public so callers
/// that stream records can fold incrementally without buffering twice.
pub struct SchemaBuilder {
    columns: BTreeMap<String, ColumnState>,
    rows: usize,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            columns: BTreeMap::new(),
            rows: 0,
        }
    }

    /// Declare a column without observing a value.
    ///
    /// Keeps header columns in the schema when the file has no data
    /// rows; a never-observed column comes out nullable.
    pub fn declare_column(&mut self, name: &str) {
        self.columns
            .entry(name.to_string())
            .or_insert_with(ColumnState::new);
    }

    /// Merge one record into the accumulated schema
    pub fn add(&mut self, record: &Record) {
        self.rows += 1;
        for (name, value) in record.iter() {
            let state = self
                .columns
                .entry(name.to_string())
                .or_insert_with(ColumnState::new);
            state.seen += 1;
            state.prop.observe(value);
            match value {
                Value::Null => {},
                Value::Integer(i) => {
                    if !(EPOCH_SECONDS_MIN..EPOCH_SECONDS_MAX).contains(i) {
                        state.epoch_plausible = false;
                    }
                },
                _ => state.epoch_plausible = false,
            }
        }
    }

    /// Finalize: nullable-widen columns absent from some rows and tag
    /// date-like epoch columns as date-time.
    pub fn finish(self) -> Schema {
        let rows = self.rows;
        let properties = self
            .columns
            .into_iter()
            .map(|(name, mut state)| {
                if state.seen < rows || state.prop.types.is_empty() {
                    state.prop.widen_nullable();
                }
                state.prop.datetime = state.epoch_plausible
                    && state.prop.types.contains(&SchemaType::Integer)
                    && state
                        .prop
                        .types
                        .iter()
                        .all(|t| matches!(t, SchemaType::Integer | SchemaType::Null))
                    && column_name_is_datelike(&name);
                (name, state.prop)
            })
            .collect();
        Schema { properties }
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Heuristic for columns that carry a point in time.
///
/// Epoch-window checks alone would convert ids and amounts that happen
/// to land in the window, so the column name has to agree.
fn column_name_is_datelike(name: &str) -> bool {
    let name = name.to_lowercase();
    name == "date"
        || name == "time"
        || name == "timestamp"
        || name.ends_with("_date")
        || name.ends_with("_time")
        || name.ends_with("_timestamp")
        || name.ends_with("_at")
}
