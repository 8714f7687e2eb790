//! Sluice Reactive - Observable stream hubs.
//!
//! Every stream in a pipeline owns a [`StreamHub`]. Producers (source reader
//! tasks and pumps) publish rows into the hub, and the hub fans each row out
//! synchronously, on the producing thread, to every subscriber: pumps reading
//! the stream and sink writers draining it.
//!
//! # Core Concepts
//!
//! - `StreamHub`: The observable fan-out point of a stream
//! - `SubscriptionManager`: Tracks the callbacks subscribed to a hub
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use sluice_core::schema::{Column, StreamSchemaBuilder};
//! use sluice_core::{DataType, Row, Value};
//! use sluice_reactive::StreamHub;
//!
//! let schema = StreamSchemaBuilder::new()
//!     .add_column(Column::new("v", DataType::Integer))
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! let hub = StreamHub::new("numbers", Arc::new(schema));
//!
//! let seen = Arc::new(AtomicUsize::new(0));
//! let seen_clone = seen.clone();
//! hub.subscribe(move |_row| {
//!     seen_clone.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! hub.publish(&Row::new(vec![Value::Integer(1)]));
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! ```

pub mod hub;
pub mod subscription;

pub use hub::StreamHub;
pub use subscription::{RowCallback, SubscriptionId, SubscriptionManager};
