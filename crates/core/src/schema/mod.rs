//! Schema module for sluice streams.
//!
//! This module contains the column and stream schema definitions.

mod column;
mod stream;

pub use column::Column;
pub use stream::{StreamSchema, StreamSchemaBuilder};
