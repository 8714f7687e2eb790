//! Benchmarks for pump evaluation and end-to-end row flow.
//!
//! Run with: cargo bench -p sluice

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sluice::{Config, Pipeline, SourceRowBuilder};
use sluice_core::schema::{Column, StreamSchema, StreamSchemaBuilder};
use sluice_core::{DataType, Row, Value};
use sluice_query::ast::Statement;
use sluice_query::parser::parse_statement;
use sluice_query::planner::plan_pump;

fn temperature_schema() -> StreamSchema {
    StreamSchemaBuilder::new()
        .add_column(Column::new("ts", DataType::Timestamp).nullable(false).rowtime(true))
        .unwrap()
        .add_column(Column::new("temperature", DataType::Float).nullable(false))
        .unwrap()
        .build()
        .unwrap()
}

fn bench_pump_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("pump_apply");
    let schema = temperature_schema();
    let row = Row::new(vec![
        Value::parse_timestamp("2021-06-01 12:00:00").unwrap(),
        Value::Float(21.5),
    ]);

    for (name, sql) in [
        ("passthrough", "CREATE PUMP p AS INSERT INTO f (ts, temperature) SELECT STREAM ts, temperature FROM c"),
        ("c_to_f", "CREATE PUMP p AS INSERT INTO f (ts, temperature) SELECT STREAM ts, 32.0 + temperature * 1.8 FROM c"),
        (
            "filtered",
            "CREATE PUMP p AS INSERT INTO f (ts, temperature) SELECT STREAM ts, temperature FROM c WHERE temperature > 0.0",
        ),
    ] {
        let Statement::CreatePump(pump) = parse_statement(sql).unwrap() else {
            unreachable!()
        };
        let program = plan_pump(&pump, "c", &schema, &schema).unwrap();
        group.bench_function(name, |b| b.iter(|| program.apply(black_box(&row)).unwrap()));
    }

    group.finish();
}

fn celsius_pipeline() -> Pipeline {
    let pipeline = Pipeline::open(Config::default()).unwrap();
    for sql in [
        "CREATE SOURCE STREAM c (ts TIMESTAMP NOT NULL ROWTIME, temperature FLOAT NOT NULL)",
        "CREATE SINK STREAM f (ts TIMESTAMP NOT NULL ROWTIME, temperature FLOAT NOT NULL)",
        "CREATE PUMP c_to_f AS INSERT INTO f (ts, temperature) SELECT STREAM ts, 32.0 + temperature * 1.8 FROM c",
        "CREATE SINK WRITER out FOR f TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'out')",
        "CREATE SOURCE READER inp FOR c TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'in')",
    ] {
        pipeline.command(sql).unwrap();
    }
    pipeline
}

fn bench_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_pop");
    let pipeline = celsius_pipeline();

    for batch in [1, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("c_to_f", batch), &batch, |b, &batch| {
            b.iter(|| {
                for i in 0..batch {
                    let row = SourceRowBuilder::new()
                        .add_column("ts", "2021-06-01 12:00:00")
                        .unwrap()
                        .add_column("temperature", i as f64)
                        .unwrap()
                        .build();
                    pipeline.push("in", row).unwrap();
                }
                for _ in 0..batch {
                    black_box(pipeline.pop("out").unwrap());
                }
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pump_apply, bench_push_pop);
criterion_main!(benches);
