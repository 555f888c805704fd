//! Schema-driven record conversion
//!
//! Sigma exports timestamps as Unix epoch seconds. For columns the
//! inferred schema typed as date-time, the raw integer is replaced with
//! the RFC 3339 UTC instant before emission; every other field passes
//! through unchanged.

use crate::schema::Schema;
use chrono::{DateTime, SecondsFormat, Utc};
use sigma_common::{Record, Result, TapError, Value};

/// Convert one record according to the declared schema.
///
/// An epoch value the calendar cannot represent is a fatal transform
/// error rather than a silent pass-through.
pub fn transform_record(record: &Record, schema: &Schema) -> Result<Record> {
    record
        .iter()
        .map(|(name, value)| {
            let datetime = schema
                .property(name)
                .is_some_and(|prop| prop.is_datetime());
            let converted = match (datetime, value) {
                (true, Value::Integer(epoch)) => Value::String(epoch_to_rfc3339(name, *epoch)?),
                _ => value.clone(),
            };
            Ok((name.to_string(), converted))
        })
        .collect()
}

fn epoch_to_rfc3339(field: &str, epoch: i64) -> Result<String> {
    let instant: DateTime<Utc> =
        DateTime::from_timestamp(epoch, 0).ok_or_else(|| TapError::Transform {
            field: field.to_string(),
            reason: format!("epoch seconds {} out of range", epoch),
        })?;
    Ok(instant.to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn record(fields: &[(&str, Value)]) -> Record {
        fields
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_epoch_column_converts_to_rfc3339() {
        let rows = vec![record(&[
            ("date", Value::Integer(1_700_000_000)),
            ("amount", Value::Integer(10)),
        ])];
        let schema = Schema::infer(&rows);

        let converted = transform_record(&rows[0], &schema).unwrap();
        assert_eq!(
            converted.get("date"),
            Some(&Value::String("2023-11-14T22:13:20Z".to_string()))
        );
        // amount is integer-typed but not date-time, so it passes through
        assert_eq!(converted.get("amount"), Some(&Value::Integer(10)));
    }

    #[test]
    fn test_null_in_datetime_column_passes_through() {
        let rows = vec![
            record(&[("created_at", Value::Integer(1_700_000_000))]),
            record(&[("created_at", Value::Null)]),
        ];
        let schema = Schema::infer(&rows);

        let converted = transform_record(&rows[1], &schema).unwrap();
        assert_eq!(converted.get("created_at"), Some(&Value::Null));
    }

    #[test]
    fn test_untyped_columns_unchanged() {
        let rows = vec![record(&[
            ("name", Value::String("alpha".to_string())),
            ("ratio", Value::Float(0.5)),
        ])];
        let schema = Schema::infer(&rows);

        let converted = transform_record(&rows[0], &schema).unwrap();
        assert_eq!(converted, rows[0]);
    }
}
