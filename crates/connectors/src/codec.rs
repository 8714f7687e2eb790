//! JSON-lines row codec.
//!
//! Each record is one JSON object per line, keyed by column name:
//!
//! ```text
//! {"ts": "2021-06-01 12:00:00", "temperature": 21.5}
//! ```
//!
//! Numbers map to integer or float values, strings to text (or timestamps for
//! TIMESTAMP columns), booleans and null map directly, and arrays of 0-255
//! integers map to blobs. Encoding is the inverse, with timestamps rendered in
//! text form.

use crate::error::ConnectorError;
use serde_json::{Map, Number, Value as Json};
use sluice_core::schema::StreamSchema;
use sluice_core::{Row, Value};

/// Converts a JSON value to a value without a target type.
///
/// Integral numbers become BIGINT, other numbers FLOAT, strings TEXT and
/// byte arrays BLOB. Objects and non-byte arrays are rejected.
pub fn json_to_value(json: &Json) -> Result<Value, ConnectorError> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Boolean(*b)),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::BigInt(i)),
            None => n
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| ConnectorError::Codec(format!("number {} out of range", n))),
        },
        Json::String(s) => Ok(Value::Text(s.clone())),
        Json::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|b| u8::try_from(b).ok())
                    .ok_or_else(|| {
                        ConnectorError::Codec(format!("blob element {} is not a byte", item))
                    })
            })
            .collect::<Result<Vec<u8>, _>>()
            .map(Value::Blob),
        Json::Object(_) => Err(ConnectorError::Codec(
            "nested objects are not supported".to_string(),
        )),
    }
}

/// Converts a value to JSON.
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::SmallInt(v) => Json::from(*v),
        Value::Integer(v) => Json::from(*v),
        Value::BigInt(v) => Json::from(*v),
        Value::Float(v) => Number::from_f64(*v).map_or(Json::Null, Json::Number),
        Value::Text(s) => Json::String(s.clone()),
        Value::Blob(b) => Json::Array(b.iter().map(|byte| Json::from(*byte)).collect()),
        Value::Timestamp(ts) => Json::String(Value::format_timestamp(ts)),
    }
}

/// Decodes one JSON line into a row of `schema`.
///
/// Absent keys decode to NULL; keys that are not columns are rejected. Every
/// value is cast to its column type and the row is checked against the schema.
pub fn decode_line(line: &str, schema: &StreamSchema) -> Result<Row, ConnectorError> {
    let json: Json = serde_json::from_str(line.trim())?;
    let object = json
        .as_object()
        .ok_or_else(|| ConnectorError::Codec("expected a JSON object".to_string()))?;

    if let Some(unknown) = object.keys().find(|k| schema.get_column(k).is_none()) {
        return Err(ConnectorError::Codec(format!("unknown column '{}'", unknown)));
    }

    let mut values = Vec::with_capacity(schema.len());
    for column in schema.columns() {
        let value = match object.get(column.name()) {
            Some(json) => json_to_value(json)?
                .cast_to(column.data_type())
                .map_err(|e| ConnectorError::Codec(format!("column '{}': {}", column.name(), e)))?,
            None => Value::Null,
        };
        values.push(value);
    }

    let row = Row::new(values);
    schema.check_row(&row)?;
    Ok(row)
}

/// Encodes a row of `schema` as one JSON line, without the trailing newline.
pub fn encode_row(row: &Row, schema: &StreamSchema) -> Result<String, ConnectorError> {
    if row.len() != schema.len() {
        return Err(ConnectorError::Codec(format!(
            "row has {} values, schema has {} columns",
            row.len(),
            schema.len()
        )));
    }
    let object: Map<String, Json> = schema
        .columns()
        .iter()
        .zip(row.values())
        .map(|(column, value)| (column.name().to_string(), value_to_json(value)))
        .collect();
    Ok(serde_json::to_string(&Json::Object(object))?)
}
