//! Rows crossing the pipeline boundary.
//!
//! [`SourceRow`]s are built by the embedding program and pushed into source
//! queues; their values are matched to the stream schema by column name.
//! [`SinkRow`]s are popped from sink queues and read by column position.

use crate::error::{ColumnAccessError, Error, Result};
use sluice_connectors::codec::json_to_value;
use sluice_core::schema::StreamSchema;
use sluice_core::{DataType, Row, Timestamp, Value};
use std::borrow::Cow;
use std::sync::Arc;

/// Builds a [`SourceRow`] one named column at a time.
#[derive(Clone, Debug, Default)]
pub struct SourceRowBuilder {
    columns: Vec<(String, Value)>,
}

impl SourceRowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column value. A column name may be given once.
    pub fn add_column(mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        let name = name.into();
        if self.columns.iter().any(|(n, _)| *n == name) {
            return Err(Error::row_build(format!("column '{}' given more than once", name)));
        }
        self.columns.push((name, value.into()));
        Ok(self)
    }

    pub fn build(self) -> SourceRow {
        SourceRow {
            columns: self.columns,
        }
    }
}

/// A row of named values, not yet bound to a stream.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceRow {
    columns: Vec<(String, Value)>,
}

impl SourceRow {
    /// Parses a JSON object such as `{"ts": "2021-06-01 12:00:00", "temperature": 21.5}`.
    pub fn from_json(text: &str) -> Result<Self> {
        let json: serde_json::Value =
            serde_json::from_str(text).map_err(|e| Error::row_build(e.to_string()))?;
        let object = json
            .as_object()
            .ok_or_else(|| Error::row_build("expected a JSON object"))?;
        let mut builder = SourceRowBuilder::new();
        for (name, value) in object {
            let value = json_to_value(value)
                .map_err(|e| Error::row_build(format!("column '{}': {}", name, e)))?;
            builder = builder.add_column(name.as_str(), value)?;
        }
        Ok(builder.build())
    }

    /// Returns the named values in insertion order.
    pub fn columns(&self) -> &[(String, Value)] {
        &self.columns
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Binds the values to `schema`: each value is cast to its column's type
    /// and columns not given are NULL.
    pub(crate) fn into_row(self, schema: &StreamSchema) -> Result<Row> {
        let mut values: Vec<Option<Value>> = vec![None; schema.len()];
        for (name, value) in self.columns {
            let column = schema
                .get_column(&name)
                .ok_or_else(|| Error::row_build(format!("unknown column '{}'", name)))?;
            let value = value
                .cast_to(column.data_type())
                .map_err(|e| Error::row_build(format!("column '{}': {}", name, e)))?;
            values[column.index()] = Some(value);
        }

        let mut row = Vec::with_capacity(values.len());
        for (column, value) in schema.columns().iter().zip(values) {
            let value = value.unwrap_or(Value::Null);
            if value.is_null() && !column.is_nullable() {
                return Err(Error::row_build(format!(
                    "NOT NULL column '{}' has no value",
                    column.name()
                )));
            }
            row.push(value);
        }
        Ok(Row::new(row))
    }
}

/// A row popped from a sink queue.
#[derive(Clone, Debug)]
pub struct SinkRow {
    schema: Arc<StreamSchema>,
    row: Row,
}

impl SinkRow {
    pub(crate) fn new(schema: Arc<StreamSchema>, row: Row) -> Self {
        Self { schema, row }
    }

    /// Returns the schema of the sink stream the row came from.
    pub fn schema(&self) -> &StreamSchema {
        &self.schema
    }

    pub fn row(&self) -> &Row {
        &self.row
    }

    pub fn into_row(self) -> Row {
        self.row
    }

    pub fn len(&self) -> usize {
        self.row.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row.is_empty()
    }

    /// Processing time of the row.
    pub fn ptime(&self) -> Timestamp {
        self.row.ptime()
    }

    /// Event time of the row: its ROWTIME column, or the processing time.
    pub fn rowtime(&self) -> Timestamp {
        self.row.rowtime(&self.schema)
    }

    /// Returns the value at `index`, which may be NULL.
    pub fn column_value(&self, index: usize) -> Result<&Value> {
        self.row.get(index).ok_or_else(|| {
            ColumnAccessError::IndexOutOfRange {
                index,
                len: self.row.len(),
            }
            .into()
        })
    }

    fn non_null(&self, index: usize) -> Result<&Value> {
        match self.column_value(index)? {
            Value::Null => Err(ColumnAccessError::Null { index }.into()),
            value => Ok(value),
        }
    }

    fn mismatch(&self, index: usize, expected: &'static str, value: &Value) -> Error {
        let actual = value
            .data_type()
            .or_else(|| self.schema.column(index).map(|c| c.data_type()))
            .unwrap_or(DataType::Blob);
        ColumnAccessError::TypeMismatch {
            index,
            expected,
            actual,
        }
        .into()
    }

    pub fn column_bool(&self, index: usize) -> Result<bool> {
        match self.non_null(index)? {
            Value::Boolean(b) => Ok(*b),
            other => Err(self.mismatch(index, "BOOLEAN", other)),
        }
    }

    pub fn column_short(&self, index: usize) -> Result<i16> {
        match self.non_null(index)? {
            Value::SmallInt(v) => Ok(*v),
            other => Err(self.mismatch(index, "SMALLINT", other)),
        }
    }

    /// Reads an INTEGER column; SMALLINT columns widen.
    pub fn column_int(&self, index: usize) -> Result<i32> {
        match self.non_null(index)? {
            Value::SmallInt(v) => Ok(i32::from(*v)),
            Value::Integer(v) => Ok(*v),
            other => Err(self.mismatch(index, "INTEGER", other)),
        }
    }

    /// Reads a BIGINT column; narrower integer columns widen.
    pub fn column_long(&self, index: usize) -> Result<i64> {
        match self.non_null(index)? {
            Value::SmallInt(v) => Ok(i64::from(*v)),
            Value::Integer(v) => Ok(i64::from(*v)),
            Value::BigInt(v) => Ok(*v),
            other => Err(self.mismatch(index, "BIGINT", other)),
        }
    }

    /// Reads a FLOAT column at single precision.
    pub fn column_float(&self, index: usize) -> Result<f32> {
        match self.non_null(index)? {
            Value::Float(v) => Ok(*v as f32),
            other => Err(self.mismatch(index, "FLOAT", other)),
        }
    }

    pub fn column_double(&self, index: usize) -> Result<f64> {
        match self.non_null(index)? {
            Value::Float(v) => Ok(*v),
            other => Err(self.mismatch(index, "FLOAT", other)),
        }
    }

    /// Reads a TEXT column, or a TIMESTAMP column in its text form.
    pub fn column_text(&self, index: usize) -> Result<Cow<'_, str>> {
        match self.non_null(index)? {
            Value::Text(s) => Ok(Cow::Borrowed(s.as_str())),
            Value::Timestamp(ts) => Ok(Cow::Owned(Value::format_timestamp(ts))),
            other => Err(self.mismatch(index, "TEXT", other)),
        }
    }

    pub fn column_blob(&self, index: usize) -> Result<&[u8]> {
        match self.non_null(index)? {
            Value::Blob(b) => Ok(b.as_slice()),
            other => Err(self.mismatch(index, "BLOB", other)),
        }
    }

    pub fn column_timestamp(&self, index: usize) -> Result<Timestamp> {
        match self.non_null(index)? {
            Value::Timestamp(ts) => Ok(*ts),
            other => Err(self.mismatch(index, "TIMESTAMP", other)),
        }
    }

    /// Byte length of a TEXT, TIMESTAMP or BLOB column as the `*_into`
    /// accessors would copy it.
    pub fn column_len(&self, index: usize) -> Result<usize> {
        match self.non_null(index)? {
            Value::Blob(b) => Ok(b.len()),
            Value::Text(_) | Value::Timestamp(_) => Ok(self.column_text(index)?.len()),
            other => Err(self.mismatch(index, "TEXT or BLOB", other)),
        }
    }

    /// Copies the UTF-8 text of a TEXT or TIMESTAMP column into `buf`.
    ///
    /// Returns the number of bytes written. Nothing is written when `buf` is
    /// too small.
    pub fn column_text_into(&self, index: usize, buf: &mut [u8]) -> Result<usize> {
        let text = self.column_text(index)?;
        copy_into(text.as_bytes(), buf)
    }

    /// Copies the bytes of a BLOB column into `buf`.
    ///
    /// Returns the number of bytes written. Nothing is written when `buf` is
    /// too small.
    pub fn column_blob_into(&self, index: usize, buf: &mut [u8]) -> Result<usize> {
        let blob = self.column_blob(index)?;
        copy_into(blob, buf)
    }
}

fn copy_into(bytes: &[u8], buf: &mut [u8]) -> Result<usize> {
    if buf.len() < bytes.len() {
        return Err(ColumnAccessError::BufferTooSmall {
            required: bytes.len(),
            provided: buf.len(),
        }
        .into());
    }
    buf[..bytes.len()].copy_from_slice(bytes);
    Ok(bytes.len())
}
