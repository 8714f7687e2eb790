//! Pump runtime.
//!
//! A pump is compiled into one [`PumpProgram`] per input stream. Each program
//! is subscribed to its input's hub and runs on whatever thread publishes into
//! that hub; its output is published into the target hub on the same thread.

use crate::config::RowErrorPolicy;
use crate::diagnostics::ErrorSink;
use crate::error::Error;
use crate::pipeline::Lifecycle;
use sluice_core::Row;
use sluice_query::planner::PumpProgram;
use sluice_reactive::{StreamHub, SubscriptionId};
use std::sync::Arc;

/// State shared by every program of one pump.
pub(crate) struct PumpTask {
    name: String,
    target: Arc<StreamHub>,
    policy: RowErrorPolicy,
    lifecycle: Arc<Lifecycle>,
    errors: Arc<dyn ErrorSink>,
}

impl PumpTask {
    pub(crate) fn new(
        name: impl Into<String>,
        target: Arc<StreamHub>,
        policy: RowErrorPolicy,
        lifecycle: Arc<Lifecycle>,
        errors: Arc<dyn ErrorSink>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            target,
            policy,
            lifecycle,
            errors,
        })
    }

    /// Subscribes `program` to its input hub.
    pub(crate) fn attach(self: &Arc<Self>, input: &StreamHub, program: PumpProgram) -> SubscriptionId {
        let task = Arc::clone(self);
        input.subscribe(move |row| task.process(&program, row))
    }

    fn process(&self, program: &PumpProgram, row: &Row) {
        if !self.lifecycle.is_running() {
            return;
        }
        match program.apply(row) {
            Ok(Some(output)) => {
                self.target.publish(&output);
            }
            Ok(None) => {}
            Err(e) => self.fail(program, Error::Evaluation(e)),
        }
    }

    fn fail(&self, program: &PumpProgram, error: Error) {
        self.errors.report(&self.name, &error);
        match self.policy {
            RowErrorPolicy::Drop => {
                tracing::warn!(pump = %self.name, input = %program.input, "dropping row: {}", error);
            }
            RowErrorPolicy::Abort => {
                tracing::error!(pump = %self.name, input = %program.input, "aborting pipeline: {}", error);
                self.lifecycle.abort();
            }
        }
    }
}
