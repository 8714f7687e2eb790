//! Stream schema definition.

use super::column::Column;
use crate::error::{Error, Result};
use crate::row::Row;
use crate::types::DataType;

/// The ordered column layout of a stream.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamSchema {
    /// Column definitions, in declared order.
    columns: Vec<Column>,
    /// Position of the ROWTIME column, if any.
    rowtime_index: Option<usize>,
}

impl StreamSchema {
    /// Returns the columns.
    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the number of columns.
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the schema has no columns.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Gets a column by position.
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Gets a column by name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Gets a column index by name.
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// Returns the position of the ROWTIME column.
    #[inline]
    pub fn rowtime_index(&self) -> Option<usize> {
        self.rowtime_index
    }

    /// Checks that `row` conforms to this schema: arity, value types and
    /// NOT NULL constraints.
    pub fn check_row(&self, row: &Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::invalid_operation(format!(
                "row has {} values, schema has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        for (column, value) in self.columns.iter().zip(row.values()) {
            match value.data_type() {
                None if !column.is_nullable() => {
                    return Err(Error::null_constraint(column.name()));
                }
                Some(dt) if dt != column.data_type() => {
                    return Err(Error::type_mismatch(column.data_type(), dt));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Builder for stream schemas.
#[derive(Default)]
pub struct StreamSchemaBuilder {
    columns: Vec<Column>,
}

impl StreamSchemaBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a name follows naming rules.
    pub fn check_naming_rules(name: &str) -> Result<()> {
        let first = match name.chars().next() {
            Some(c) => c,
            None => return Err(Error::invalid_schema("Name cannot be empty")),
        };
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(Error::invalid_schema(format!(
                "Name must start with letter or underscore: {}",
                name
            )));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::invalid_schema(format!(
                "Name contains invalid characters: {}",
                name
            )));
        }
        Ok(())
    }

    /// Adds a column to the schema.
    pub fn add_column(mut self, column: Column) -> Result<Self> {
        Self::check_naming_rules(column.name())?;
        if self.columns.iter().any(|c| c.name() == column.name()) {
            return Err(Error::invalid_schema(format!(
                "Column already exists: {}",
                column.name()
            )));
        }
        let index = self.columns.len();
        self.columns.push(column.with_index(index));
        Ok(self)
    }

    /// Builds the schema.
    ///
    /// At most one column may be the ROWTIME column and it must be a TIMESTAMP.
    pub fn build(self) -> Result<StreamSchema> {
        if self.columns.is_empty() {
            return Err(Error::invalid_schema("Stream must have at least one column"));
        }

        let mut rowtime_index = None;
        for column in self.columns.iter().filter(|c| c.is_rowtime()) {
            if rowtime_index.is_some() {
                return Err(Error::invalid_schema(format!(
                    "More than one ROWTIME column: {}",
                    column.name()
                )));
            }
            if column.data_type() != DataType::Timestamp {
                return Err(Error::invalid_schema(format!(
                    "ROWTIME column {} must be TIMESTAMP, got {}",
                    column.name(),
                    column.data_type()
                )));
            }
            rowtime_index = Some(column.index());
        }

        Ok(StreamSchema {
            columns: self.columns,
            rowtime_index,
        })
    }
}
