//! DDL execution.
//!
//! Every statement is validated completely before the catalog changes, so a
//! failing statement leaves the pipeline as it was.

use crate::catalog::{Catalog, PumpEntry, ReaderEntry, StreamEntry, StreamUse, WriterEntry};
use crate::error::{Error, Result};
use crate::graph::PumpNode;
use crate::pipeline::Shared;
use crate::pump::PumpTask;
use crate::tasks::{attach_writer, spawn_reader};
use sluice_connectors::{ConnectorContext, ConnectorOptions};
use sluice_core::schema::{Column, StreamSchema, StreamSchemaBuilder};
use sluice_core::DataType;
use sluice_query::ast::{CreateConnector, CreatePump, CreateStream, Statement};
use sluice_query::parser::parse_statement;
use sluice_query::planner::{plan_pump, PumpProgram};
use sluice_reactive::StreamHub;
use std::sync::Arc;

/// Parses and executes one DDL statement.
pub(crate) fn execute(shared: &Shared, catalog: &mut Catalog, sql: &str) -> Result<()> {
    let statement = parse_statement(sql)?;
    catalog.ensure_unused(statement.object_name())?;
    match statement {
        Statement::CreateStream(create) => create_stream(catalog, create),
        Statement::CreatePump(create) => create_pump(shared, catalog, create),
        Statement::CreateSourceReader(create) => create_source_reader(shared, catalog, create),
        Statement::CreateSinkWriter(create) => create_sink_writer(shared, catalog, create),
    }
}

/// Builds the schema of a `CREATE ... STREAM` statement.
pub(crate) fn build_schema(create: &CreateStream) -> Result<StreamSchema> {
    StreamSchemaBuilder::check_naming_rules(&create.name).map_err(Error::Schema)?;
    let mut builder = StreamSchemaBuilder::new();
    for def in &create.columns {
        if def.rowtime_markers > 1 {
            return Err(Error::Schema(sluice_core::Error::invalid_schema(format!(
                "ROWTIME given more than once for column {}",
                def.name
            ))));
        }
        let data_type = DataType::from_sql_name(&def.type_name).ok_or_else(|| {
            Error::Schema(sluice_core::Error::invalid_schema(format!(
                "unknown type {} for column {}",
                def.type_name, def.name
            )))
        })?;
        let column = Column::new(def.name.as_str(), data_type)
            .nullable(!def.not_null)
            .rowtime(def.rowtime_markers == 1);
        builder = builder.add_column(column).map_err(Error::Schema)?;
    }
    builder.build().map_err(Error::Schema)
}

fn create_stream(catalog: &mut Catalog, create: CreateStream) -> Result<()> {
    let schema = Arc::new(build_schema(&create)?);
    let hub = Arc::new(StreamHub::new(create.name.as_str(), Arc::clone(&schema)));
    tracing::info!(
        stream = %create.name,
        kind = %create.kind,
        columns = schema.len(),
        "created stream"
    );
    catalog.add_stream(
        create.name,
        StreamEntry {
            kind: create.kind,
            schema,
            hub,
        },
    );
    Ok(())
}

fn create_pump(shared: &Shared, catalog: &mut Catalog, create: CreatePump) -> Result<()> {
    let target = catalog.stream_for(&create.target, StreamUse::PumpTarget)?;
    let target_hub = Arc::clone(&target.hub);
    let target_schema = Arc::clone(&target.schema);

    let mut programs: Vec<(Arc<StreamHub>, PumpProgram)> = Vec::with_capacity(create.inputs.len());
    for (i, input) in create.inputs.iter().enumerate() {
        if create.inputs[..i].contains(input) {
            return Err(Error::Schema(sluice_core::Error::invalid_schema(format!(
                "stream {} listed twice in pump {}",
                input, create.name
            ))));
        }
        let entry = catalog.stream_for(input, StreamUse::PumpInput)?;
        let program =
            plan_pump(&create, input, &entry.schema, &target_schema).map_err(Error::Schema)?;
        programs.push((Arc::clone(&entry.hub), program));
    }

    if let Some(stream) = catalog.graph().find_cycle(&create.inputs, &create.target) {
        return Err(Error::Cycle {
            pump: create.name.clone(),
            stream: stream.to_string(),
        });
    }

    let task = PumpTask::new(
        create.name.as_str(),
        target_hub,
        shared.config.pipeline.row_error_policy,
        Arc::clone(&shared.lifecycle),
        Arc::clone(&shared.errors),
    );
    let subscriptions = programs
        .into_iter()
        .map(|(hub, program)| {
            let id = task.attach(&hub, program);
            (hub, id)
        })
        .collect();

    let node = catalog.graph_mut().add_node(PumpNode {
        name: create.name.clone(),
        inputs: create.inputs.clone(),
        target: create.target.clone(),
    });
    tracing::info!(
        pump = %create.name,
        inputs = ?create.inputs,
        target = %create.target,
        "created pump"
    );
    catalog.add_pump(create.name, PumpEntry { node, subscriptions });
    Ok(())
}

fn connector_context(
    shared: &Shared,
    create: &CreateConnector,
    entry: &StreamEntry,
    sink: bool,
) -> ConnectorContext {
    ConnectorContext {
        name: create.name.clone(),
        stream: create.stream.clone(),
        schema: Arc::clone(&entry.schema),
        queues: Arc::clone(&shared.queues),
        settings: if sink {
            shared.config.sink_settings()
        } else {
            shared.config.source_settings()
        },
    }
}

fn create_source_reader(shared: &Shared, catalog: &mut Catalog, create: CreateConnector) -> Result<()> {
    let entry = catalog.stream_for(&create.stream, StreamUse::SourceReader)?;
    let options = ConnectorOptions::from_pairs(&create.connector_type, create.options.iter().cloned())?;
    let ctx = connector_context(shared, &create, entry, false);
    let reader = shared
        .registry
        .create_source(&create.connector_type, &options, &ctx)?;
    let local_addr = reader.local_addr();

    let handle = spawn_reader(
        &create.name,
        reader,
        Arc::clone(&entry.hub),
        Arc::clone(&shared.lifecycle),
        Arc::clone(&shared.errors),
        ctx.settings.poll_interval,
    )
    .map_err(|e| Error::from(sluice_connectors::ConnectorError::Io(e)))?;

    tracing::info!(
        reader = %create.name,
        stream = %create.stream,
        connector = %create.connector_type,
        addr = ?local_addr,
        "created source reader"
    );
    catalog.add_reader(
        create.name,
        ReaderEntry {
            stream: create.stream,
            local_addr,
            handle,
        },
    );
    Ok(())
}

fn create_sink_writer(shared: &Shared, catalog: &mut Catalog, create: CreateConnector) -> Result<()> {
    let entry = catalog.stream_for(&create.stream, StreamUse::SinkWriter)?;
    let options = ConnectorOptions::from_pairs(&create.connector_type, create.options.iter().cloned())?;
    let ctx = connector_context(shared, &create, entry, true);
    let writer = shared
        .registry
        .create_sink(&create.connector_type, &options, &ctx)?;

    let hub = Arc::clone(&entry.hub);
    shared.lifecycle.track_writer(Arc::clone(&writer));
    let subscription = attach_writer(
        &create.name,
        Arc::clone(&writer),
        &hub,
        Arc::clone(&shared.lifecycle),
        Arc::clone(&shared.errors),
    );

    tracing::info!(
        writer = %create.name,
        stream = %create.stream,
        connector = %create.connector_type,
        "created sink writer"
    );
    catalog.add_writer(
        create.name,
        WriterEntry {
            hub,
            subscription,
            writer,
        },
    );
    Ok(())
}
