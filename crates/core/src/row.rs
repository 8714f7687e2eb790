//! Row structure for sluice streams.
//!
//! This module defines the `Row` struct, the unit of data flowing through a
//! pipeline. A row is immutable once built.

use crate::schema::StreamSchema;
use crate::value::{Timestamp, Value};
use chrono::Utc;

/// A row flowing through a stream.
#[derive(Clone, Debug)]
pub struct Row {
    /// Values indexed by column position.
    values: Vec<Value>,
    /// Processing time: when the row entered the pipeline.
    ptime: Timestamp,
}

impl Row {
    /// Creates a new row stamped with the current processing time.
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            ptime: Utc::now().naive_utc(),
        }
    }

    /// Creates a new row with an explicit processing time.
    ///
    /// Rows derived from another row carry the processing time of their input.
    pub fn with_ptime(values: Vec<Value>, ptime: Timestamp) -> Self {
        Self { values, ptime }
    }

    /// Returns a reference to the values.
    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consumes the row and returns its values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Gets a value at the given column index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Returns the processing time.
    #[inline]
    pub fn ptime(&self) -> Timestamp {
        self.ptime
    }

    /// Returns the event time of this row under `schema`.
    ///
    /// This is the ROWTIME column's value when the schema declares one and the
    /// value is present, otherwise the processing time.
    pub fn rowtime(&self, schema: &StreamSchema) -> Timestamp {
        schema
            .rowtime_index()
            .and_then(|i| self.values.get(i))
            .and_then(Value::as_timestamp)
            .unwrap_or(self.ptime)
    }

    /// Returns the number of values in this row.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this row has no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, StreamSchemaBuilder};
    use crate::types::DataType;

    fn ts(text: &str) -> Timestamp {
        Value::parse_timestamp(text).unwrap().as_timestamp().unwrap()
    }

    #[test]
    fn test_row_new() {
        let row = Row::new(vec![Value::BigInt(42), Value::Text("Alice".into())]);
        assert_eq!(row.len(), 2);
        assert!(!row.is_empty());
    }

    #[test]
    fn test_row_get_value() {
        let row = Row::new(vec![Value::BigInt(1), Value::Text("Alice".into())]);
        assert_eq!(row.get(0), Some(&Value::BigInt(1)));
        assert_eq!(row.get(1), Some(&Value::Text("Alice".into())));
        assert_eq!(row.get(2), None);
    }

    #[test]
    fn test_row_equality_ignores_ptime() {
        let row1 = Row::with_ptime(vec![Value::Integer(42)], ts("2021-01-01 00:00:00"));
        let row2 = Row::with_ptime(vec![Value::Integer(42)], ts("2022-01-01 00:00:00"));
        assert_eq!(row1, row2);
    }

    #[test]
    fn test_rowtime_uses_rowtime_column() {
        let schema = StreamSchemaBuilder::new()
            .add_column(Column::new("ts", DataType::Timestamp).rowtime(true))
            .unwrap()
            .add_column(Column::new("v", DataType::Integer))
            .unwrap()
            .build()
            .unwrap();

        let event = ts("2020-05-05 10:00:00");
        let arrival = ts("2020-05-05 10:00:03");
        let row = Row::with_ptime(vec![Value::Timestamp(event), Value::Integer(1)], arrival);
        assert_eq!(row.rowtime(&schema), event);
    }

    #[test]
    fn test_rowtime_falls_back_to_ptime() {
        let schema = StreamSchemaBuilder::new()
            .add_column(Column::new("v", DataType::Integer))
            .unwrap()
            .build()
            .unwrap();

        let arrival = ts("2020-05-05 10:00:03");
        let row = Row::with_ptime(vec![Value::Integer(1)], arrival);
        assert_eq!(row.rowtime(&schema), arrival);
        assert_eq!(row.ptime(), arrival);
    }
}
