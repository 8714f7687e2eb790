//! Column definition for stream schemas.

use crate::types::DataType;

/// A column definition in a stream schema.
#[derive(Clone, Debug)]
pub struct Column {
    /// Column name.
    name: String,
    /// Data type of the column.
    data_type: DataType,
    /// Whether this column allows null values.
    nullable: bool,
    /// Whether this column is the stream's event-time column.
    rowtime: bool,
    /// Column index in the stream (0-based).
    index: usize,
}

impl Column {
    /// Creates a new nullable column definition.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            rowtime: false,
            index: 0,
        }
    }

    /// Sets whether this column is nullable.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Marks this column as the ROWTIME column.
    pub fn rowtime(mut self, rowtime: bool) -> Self {
        self.rowtime = rowtime;
        self
    }

    /// Sets the column index.
    pub(crate) fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Returns the column name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the data type.
    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns whether this column is nullable.
    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Returns whether this column is the ROWTIME column.
    #[inline]
    pub fn is_rowtime(&self) -> bool {
        self.rowtime
    }

    /// Returns the column index.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.data_type == other.data_type
            && self.nullable == other.nullable
            && self.rowtime == other.rowtime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_new() {
        let col = Column::new("price", DataType::Float);
        assert_eq!(col.name(), "price");
        assert_eq!(col.data_type(), DataType::Float);
        assert!(col.is_nullable());
        assert!(!col.is_rowtime());
    }

    #[test]
    fn test_column_builder() {
        let col = Column::new("ts", DataType::Timestamp)
            .nullable(false)
            .rowtime(true);

        assert!(!col.is_nullable());
        assert!(col.is_rowtime());
    }
}
