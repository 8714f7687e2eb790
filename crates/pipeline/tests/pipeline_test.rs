//! End-to-end pipeline tests over in-memory queues.

use sluice::{
    CollectingErrorSink, Config, Error, ErrorKind, Pipeline, RowErrorPolicy, SourceRow,
    SourceRowBuilder, Value,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const SOURCE_C: &str = "CREATE SOURCE STREAM source_temperature_celsius (
    ts TIMESTAMP NOT NULL ROWTIME,
    temperature FLOAT NOT NULL
);";

const SINK_F: &str = "CREATE SINK STREAM sink_temperature_fahrenheit (
    ts TIMESTAMP NOT NULL ROWTIME,
    temperature FLOAT NOT NULL
);";

const PUMP_C_TO_F: &str = "CREATE PUMP c_to_f AS
    INSERT INTO sink_temperature_fahrenheit (ts, temperature)
    SELECT STREAM
        source_temperature_celsius.ts,
        32.0 + source_temperature_celsius.temperature * 1.8
    FROM source_temperature_celsius;";

fn celsius_pipeline(config: Config) -> Pipeline {
    let pipeline = Pipeline::open(config).unwrap();
    pipeline.command(SOURCE_C).unwrap();
    pipeline.command(SINK_F).unwrap();
    pipeline.command(PUMP_C_TO_F).unwrap();
    pipeline
        .command(
            "CREATE SINK WRITER queue_f FOR sink_temperature_fahrenheit
                TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'q_f');",
        )
        .unwrap();
    pipeline
        .command(
            "CREATE SOURCE READER queue_c FOR source_temperature_celsius
                TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'q_c');",
        )
        .unwrap();
    pipeline
}

fn celsius(ts: &str, temperature: f64) -> SourceRow {
    SourceRowBuilder::new()
        .add_column("ts", ts)
        .unwrap()
        .add_column("temperature", temperature)
        .unwrap()
        .build()
}

#[test]
fn test_celsius_to_fahrenheit() {
    let pipeline = celsius_pipeline(Config::default());
    pipeline.push("q_c", celsius("2021-06-01 12:00:00", 0.0)).unwrap();
    pipeline.push("q_c", celsius("2021-06-01 12:00:01", 100.0)).unwrap();

    let first = pipeline.pop("q_f").unwrap();
    assert_eq!(first.column_text(0).unwrap(), "2021-06-01 12:00:00.000000000");
    assert_eq!(first.column_double(1).unwrap(), 32.0);
    assert_eq!(first.column_float(1).unwrap(), 32.0);

    let second = pipeline.pop("q_f").unwrap();
    assert_eq!(second.column_text(0).unwrap(), "2021-06-01 12:00:01.000000000");
    assert_eq!(second.column_double(1).unwrap(), 212.0);

    assert!(pipeline.pop_non_blocking("q_f").unwrap().is_none());
    pipeline.close().unwrap();
}

#[test]
fn test_blob_round_trip_in_order() {
    let pipeline = Pipeline::open(Config::default()).unwrap();
    pipeline.command("CREATE SOURCE STREAM src (b BLOB NOT NULL)").unwrap();
    pipeline.command("CREATE SINK STREAM snk (b BLOB NOT NULL)").unwrap();
    pipeline
        .command("CREATE PUMP p AS INSERT INTO snk (b) SELECT STREAM b FROM src")
        .unwrap();
    pipeline
        .command("CREATE SINK WRITER w FOR snk TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'out')")
        .unwrap();
    pipeline
        .command("CREATE SOURCE READER r FOR src TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'in')")
        .unwrap();

    let blob = |i: u32| (0x1234_5678u32 + i).to_be_bytes().to_vec();
    for i in 0..10 {
        let row = SourceRowBuilder::new().add_column("b", blob(i)).unwrap().build();
        pipeline.push("in", row).unwrap();
    }
    for i in 0..10 {
        let row = pipeline.pop("out").unwrap();
        assert_eq!(row.column_blob(0).unwrap(), blob(i).as_slice());
        let mut buf = [0u8; 4];
        assert_eq!(row.column_blob_into(0, &mut buf).unwrap(), 4);
        assert_eq!(buf.to_vec(), blob(i));
    }
}

#[test]
fn test_pop_blocks_until_delayed_push() {
    let pipeline = Arc::new(celsius_pipeline(Config::default()));
    let producer = {
        let pipeline = Arc::clone(&pipeline);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            pipeline.push("q_c", celsius("2021-06-01 12:00:00", 10.0)).unwrap();
        })
    };
    let row = pipeline.pop("q_f").unwrap();
    assert_eq!(row.column_double(1).unwrap(), 50.0);
    producer.join().unwrap();
}

#[test]
fn test_duplicate_names_leave_pipeline_unchanged() {
    let pipeline = celsius_pipeline(Config::default());
    let before = pipeline.stream_names().unwrap();

    let err = pipeline.command(SOURCE_C).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateName);
    let err = pipeline.command(PUMP_C_TO_F).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateName);
    // Names are shared across object kinds.
    let err = pipeline
        .command("CREATE STREAM c_to_f (v INTEGER)")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateName);
    let err = pipeline
        .command("CREATE SINK WRITER other FOR sink_temperature_fahrenheit TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'q_f')")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectorOptionInvalid);

    assert_eq!(pipeline.stream_names().unwrap(), before);
    assert_eq!(pipeline.pump_names().unwrap(), vec!["c_to_f".to_string()]);
    assert_eq!(pipeline.sink_writer_names().unwrap(), vec!["queue_f".to_string()]);

    pipeline.push("q_c", celsius("2021-06-01 12:00:00", 0.0)).unwrap();
    assert_eq!(pipeline.pop("q_f").unwrap().column_double(1).unwrap(), 32.0);
}

#[test]
fn test_unknown_stream_then_valid_ddl() {
    let pipeline = Pipeline::open(Config::default()).unwrap();
    pipeline.command(SOURCE_C).unwrap();
    let err = pipeline.command(PUMP_C_TO_F).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownStreamReference);
    assert!(matches!(err, Error::UnknownStream(ref s) if s == "sink_temperature_fahrenheit"));
    assert!(pipeline.pump_names().unwrap().is_empty());

    pipeline.command(SINK_F).unwrap();
    pipeline.command(PUMP_C_TO_F).unwrap();
    assert_eq!(pipeline.pump_names().unwrap(), vec!["c_to_f".to_string()]);
}

#[test]
fn test_ddl_failures() {
    let pipeline = Pipeline::open(Config::default()).unwrap();
    pipeline.command("CREATE SOURCE STREAM a (v INTEGER NOT NULL, t TEXT)").unwrap();
    pipeline.command("CREATE SINK STREAM b (v INTEGER NOT NULL, t TEXT)").unwrap();

    let cases = [
        ("CREATE SOURCE STREAM", ErrorKind::Sql),
        ("CREATE PUMP p AS INSERT INTO b (v) SELECT STREAM v, t FROM a", ErrorKind::SchemaInvalid),
        ("CREATE PUMP p AS INSERT INTO b (x) SELECT STREAM v FROM a", ErrorKind::SchemaInvalid),
        ("CREATE PUMP p AS INSERT INTO b (v) SELECT STREAM x FROM a", ErrorKind::SchemaInvalid),
        ("CREATE PUMP p AS INSERT INTO b (v) SELECT STREAM t FROM a", ErrorKind::SchemaInvalid),
        ("CREATE PUMP p AS INSERT INTO b (t) SELECT STREAM t FROM a", ErrorKind::SchemaInvalid),
        ("CREATE PUMP p AS INSERT INTO b (v) SELECT STREAM NULL FROM a", ErrorKind::SchemaInvalid),
        ("CREATE PUMP p AS INSERT INTO b (v) SELECT STREAM v FROM a WHERE v + 1", ErrorKind::SchemaInvalid),
        ("CREATE PUMP p AS INSERT INTO a (v) SELECT STREAM v FROM b", ErrorKind::StreamKindMismatch),
        ("CREATE SOURCE READER r FOR b TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'q')", ErrorKind::StreamKindMismatch),
        ("CREATE SINK WRITER w FOR a TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'q')", ErrorKind::StreamKindMismatch),
        ("CREATE SOURCE READER r FOR a TYPE KAFKA OPTIONS (NAME 'q')", ErrorKind::ConnectorOptionInvalid),
        ("CREATE SOURCE READER r FOR a TYPE IN_MEMORY_QUEUE OPTIONS (QUEUE 'q')", ErrorKind::ConnectorOptionInvalid),
        ("CREATE SOURCE READER r FOR a TYPE IN_MEMORY_QUEUE", ErrorKind::ConnectorOptionInvalid),
        ("CREATE SOURCE READER r FOR a TYPE NET_SERVER OPTIONS (PROTOCOL 'UDP', PORT '0')", ErrorKind::ConnectorOptionInvalid),
        ("CREATE SINK WRITER w FOR b TYPE NET_SERVER OPTIONS (PROTOCOL 'TCP', PORT '0')", ErrorKind::ConnectorOptionInvalid),
        ("CREATE SOURCE READER r FOR nope TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'q')", ErrorKind::UnknownStreamReference),
        ("CREATE STREAM c (ts TIMESTAMP ROWTIME ROWTIME)", ErrorKind::SchemaInvalid),
        ("CREATE STREAM c (ts TIMESTAMP ROWTIME, ts2 TIMESTAMP ROWTIME)", ErrorKind::SchemaInvalid),
        ("CREATE STREAM c (n BIGINT ROWTIME)", ErrorKind::SchemaInvalid),
        ("CREATE STREAM c (n NUMBER)", ErrorKind::SchemaInvalid),
    ];
    for (sql, kind) in cases {
        let err = pipeline.command(sql).unwrap_err();
        assert_eq!(err.kind(), kind, "{}: {}", sql, err);
    }

    assert_eq!(pipeline.stream_names().unwrap(), vec!["a".to_string(), "b".to_string()]);
    assert!(pipeline.pump_names().unwrap().is_empty());
    assert!(pipeline.source_reader_names().unwrap().is_empty());
    assert!(pipeline.sink_writer_names().unwrap().is_empty());
}

#[test]
fn test_rowtime_column() {
    let pipeline = celsius_pipeline(Config::default());
    let schema = pipeline.stream_schema("sink_temperature_fahrenheit").unwrap();
    assert_eq!(schema.rowtime_index(), Some(0));

    pipeline.push("q_c", celsius("2021-06-01 12:00:00.5", 0.0)).unwrap();
    let row = pipeline.pop("q_f").unwrap();
    assert_eq!(row.rowtime(), row.column_timestamp(0).unwrap());
    assert_ne!(row.rowtime(), row.ptime());
}

#[test]
fn test_where_filters_rows() {
    let pipeline = Pipeline::open(Config::default()).unwrap();
    pipeline.command("CREATE SOURCE STREAM readings (sensor TEXT NOT NULL, v INTEGER)").unwrap();
    pipeline.command("CREATE SINK STREAM alerts (sensor TEXT NOT NULL, v BIGINT, note TEXT)").unwrap();
    pipeline
        .command(
            "CREATE PUMP high AS INSERT INTO alerts (sensor, v)
                SELECT STREAM UPPER(sensor), v FROM readings WHERE v > 100 AND v IS NOT NULL",
        )
        .unwrap();
    pipeline
        .command("CREATE SINK WRITER w FOR alerts TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'alerts')")
        .unwrap();
    pipeline
        .command("CREATE SOURCE READER r FOR readings TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'readings')")
        .unwrap();

    for (sensor, v) in [("a", Some(5)), ("b", Some(150)), ("c", None), ("d", Some(101))] {
        let row = SourceRowBuilder::new()
            .add_column("sensor", sensor)
            .unwrap()
            .add_column("v", v)
            .unwrap()
            .build();
        pipeline.push("readings", row).unwrap();
    }

    let first = pipeline.pop("alerts").unwrap();
    assert_eq!(first.column_text(0).unwrap(), "B");
    assert_eq!(first.column_long(1).unwrap(), 150);
    assert_eq!(first.column_value(2).unwrap(), &Value::Null);
    let second = pipeline.pop("alerts").unwrap();
    assert_eq!(second.column_text(0).unwrap(), "D");

    thread::sleep(Duration::from_millis(100));
    assert!(pipeline.pop_non_blocking("alerts").unwrap().is_none());
}

#[test]
fn test_intermediate_stream_chain() {
    let pipeline = Pipeline::open(Config::default()).unwrap();
    pipeline.command("CREATE SOURCE STREAM a (v INTEGER NOT NULL)").unwrap();
    pipeline.command("CREATE STREAM b (v INTEGER NOT NULL)").unwrap();
    pipeline.command("CREATE SINK STREAM c (v BIGINT NOT NULL)").unwrap();
    pipeline
        .command("CREATE PUMP p1 AS INSERT INTO b (v) SELECT STREAM v + 1 FROM a")
        .unwrap();
    pipeline
        .command("CREATE PUMP p2 AS INSERT INTO c (v) SELECT STREAM b.v * 10 FROM b")
        .unwrap();
    pipeline
        .command("CREATE SINK WRITER w FOR c TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'out')")
        .unwrap();
    pipeline
        .command("CREATE SOURCE READER r FOR a TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'in')")
        .unwrap();

    for v in 0..5 {
        pipeline
            .push("in", SourceRowBuilder::new().add_column("v", v).unwrap().build())
            .unwrap();
    }
    let out: Vec<i64> = (0..5)
        .map(|_| pipeline.pop("out").unwrap().column_long(0).unwrap())
        .collect();
    assert_eq!(out, vec![10, 20, 30, 40, 50]);
}

#[test]
fn test_multi_input_pump_unions() {
    let pipeline = Pipeline::open(Config::default()).unwrap();
    pipeline.command("CREATE SOURCE STREAM left_in (v INTEGER NOT NULL)").unwrap();
    pipeline.command("CREATE SOURCE STREAM right_in (v INTEGER NOT NULL)").unwrap();
    pipeline.command("CREATE SINK STREAM merged (v INTEGER NOT NULL)").unwrap();
    pipeline
        .command("CREATE PUMP m AS INSERT INTO merged (v) SELECT STREAM v FROM left_in, right_in")
        .unwrap();
    pipeline
        .command("CREATE SINK WRITER w FOR merged TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'out')")
        .unwrap();
    pipeline
        .command("CREATE SOURCE READER l FOR left_in TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'l')")
        .unwrap();
    pipeline
        .command("CREATE SOURCE READER r FOR right_in TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'r')")
        .unwrap();

    pipeline.push("l", SourceRowBuilder::new().add_column("v", 1).unwrap().build()).unwrap();
    pipeline.push("r", SourceRowBuilder::new().add_column("v", 2).unwrap().build()).unwrap();
    let mut values: Vec<i32> = (0..2)
        .map(|_| pipeline.pop("out").unwrap().column_int(0).unwrap())
        .collect();
    values.sort_unstable();
    assert_eq!(values, vec![1, 2]);

    let err = pipeline
        .command("CREATE PUMP q AS INSERT INTO merged (v) SELECT STREAM left_in.v FROM left_in, right_in")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaInvalid);
}

#[test]
fn test_pump_cycle_rejected() {
    let pipeline = Pipeline::open(Config::default()).unwrap();
    pipeline.command("CREATE STREAM x (v INTEGER)").unwrap();
    pipeline.command("CREATE STREAM y (v INTEGER)").unwrap();
    pipeline
        .command("CREATE PUMP xy AS INSERT INTO y (v) SELECT STREAM v FROM x")
        .unwrap();

    let err = pipeline
        .command("CREATE PUMP yx AS INSERT INTO x (v) SELECT STREAM v FROM y")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaInvalid);
    assert!(matches!(err, Error::Cycle { .. }));
    let err = pipeline
        .command("CREATE PUMP xx AS INSERT INTO x (v) SELECT STREAM v FROM x")
        .unwrap_err();
    assert!(matches!(err, Error::Cycle { .. }));
    assert_eq!(pipeline.pump_names().unwrap(), vec!["xy".to_string()]);
}

#[test]
fn test_push_validation() {
    let pipeline = celsius_pipeline(Config::default());
    let push = |row: SourceRow| pipeline.push("q_c", row).unwrap_err().kind();

    assert_eq!(
        push(SourceRowBuilder::new().add_column("temperature", 1.0).unwrap().build()),
        ErrorKind::RowBuildInvalid
    );
    assert_eq!(
        push(
            SourceRowBuilder::new()
                .add_column("ts", "2021-06-01 00:00:00")
                .unwrap()
                .add_column("temperature", 1.0)
                .unwrap()
                .add_column("humidity", 0.5)
                .unwrap()
                .build()
        ),
        ErrorKind::RowBuildInvalid
    );
    assert_eq!(push(celsius("not a time", 1.0)), ErrorKind::RowBuildInvalid);
    assert_eq!(
        pipeline.push("nope", celsius("2021-06-01 00:00:00", 1.0)).unwrap_err().kind(),
        ErrorKind::UnknownQueue
    );
    // Sink queues cannot be pushed and source queues cannot be popped.
    assert_eq!(
        pipeline.push("q_f", celsius("2021-06-01 00:00:00", 1.0)).unwrap_err().kind(),
        ErrorKind::UnknownQueue
    );
    assert_eq!(pipeline.pop_non_blocking("q_c").unwrap_err().kind(), ErrorKind::UnknownQueue);
}

#[test]
fn test_source_row_from_json() {
    let pipeline = celsius_pipeline(Config::default());
    let row = SourceRow::from_json(r#"{"ts": "2021-06-01T12:00:00", "temperature": 100}"#).unwrap();
    pipeline.push("q_c", row).unwrap();
    assert_eq!(pipeline.pop("q_f").unwrap().column_double(1).unwrap(), 212.0);
}

#[test]
fn test_close_semantics() {
    let pipeline = Arc::new(celsius_pipeline(Config::default()));
    let blocked = {
        let pipeline = Arc::clone(&pipeline);
        thread::spawn(move || pipeline.pop("q_f"))
    };
    thread::sleep(Duration::from_millis(100));

    pipeline.close().unwrap();
    assert!(matches!(blocked.join().unwrap(), Err(Error::PipelineClosed)));

    assert!(pipeline.close().is_ok());
    for err in [
        pipeline.push("q_c", celsius("2021-06-01 00:00:00", 1.0)).unwrap_err(),
        pipeline.pop("q_f").unwrap_err(),
        pipeline.pop_non_blocking("q_f").unwrap_err(),
        pipeline.command("CREATE STREAM z (v INTEGER)").unwrap_err(),
        pipeline.stream_schema("source_temperature_celsius").unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::PipelineClosed);
    }
}

#[test]
fn test_drop_policy_reports_to_error_sink() {
    let errors = Arc::new(CollectingErrorSink::new());
    let pipeline = Pipeline::open_with_error_sink(Config::default(), errors.clone()).unwrap();
    pipeline.command("CREATE SOURCE STREAM a (v INTEGER NOT NULL)").unwrap();
    pipeline.command("CREATE SINK STREAM b (v INTEGER NOT NULL)").unwrap();
    pipeline
        .command("CREATE PUMP ratio AS INSERT INTO b (v) SELECT STREAM 100 / v FROM a")
        .unwrap();
    pipeline
        .command("CREATE SINK WRITER w FOR b TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'out')")
        .unwrap();
    pipeline
        .command("CREATE SOURCE READER r FOR a TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'in')")
        .unwrap();

    for v in [0, 4] {
        pipeline
            .push("in", SourceRowBuilder::new().add_column("v", v).unwrap().build())
            .unwrap();
    }
    assert_eq!(pipeline.pop("out").unwrap().column_int(0).unwrap(), 25);
    assert!(errors.wait_for(1, Duration::from_secs(5)));

    let reported = errors.errors();
    assert_eq!(reported[0].origin, "ratio");
    assert_eq!(reported[0].kind, ErrorKind::Evaluation);
    assert!(pipeline.stream_names().is_ok());
}

#[test]
fn test_abort_policy_closes_pipeline() {
    let errors = Arc::new(CollectingErrorSink::new());
    let config = Config::default().with_row_error_policy(RowErrorPolicy::Abort);
    let pipeline = Arc::new(Pipeline::open_with_error_sink(config, errors.clone()).unwrap());
    pipeline.command("CREATE SOURCE STREAM a (v SMALLINT NOT NULL)").unwrap();
    pipeline.command("CREATE SINK STREAM b (v SMALLINT NOT NULL)").unwrap();
    pipeline
        .command("CREATE PUMP grow AS INSERT INTO b (v) SELECT STREAM v * 1000 FROM a")
        .unwrap();
    pipeline
        .command("CREATE SINK WRITER w FOR b TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'out')")
        .unwrap();
    pipeline
        .command("CREATE SOURCE READER r FOR a TYPE IN_MEMORY_QUEUE OPTIONS (NAME 'in')")
        .unwrap();

    let blocked = {
        let pipeline = Arc::clone(&pipeline);
        thread::spawn(move || pipeline.pop("out"))
    };
    pipeline
        .push("in", SourceRowBuilder::new().add_column("v", 1000i16).unwrap().build())
        .unwrap();

    assert!(matches!(blocked.join().unwrap(), Err(Error::PipelineClosed)));
    assert!(errors.wait_for(1, Duration::from_secs(5)));
    assert_eq!(errors.errors()[0].kind, ErrorKind::Evaluation);
    assert_eq!(
        pipeline.command("CREATE STREAM z (v INTEGER)").unwrap_err().kind(),
        ErrorKind::PipelineClosed
    );
    assert!(pipeline.close().is_ok());
}

#[test]
fn test_config_from_toml() {
    let config = Config::from_toml(
        r#"
        [pipeline]
        row_error_policy = "abort"

        [source_reader]
        poll_interval_msec = 10
        "#,
    )
    .unwrap();
    let pipeline = Pipeline::open(config).unwrap();
    assert_eq!(pipeline.config().pipeline.row_error_policy, RowErrorPolicy::Abort);
    assert_eq!(pipeline.config().source_reader.poll_interval_msec, 10);
}
