//! Sluice demo: converts Celsius readings received over TCP to Fahrenheit.
//!
//! Start the demo, then send one JSON object per line:
//!
//! ```text
//! $ cargo run -p sluice-demo -- --port 9876
//! $ echo '{"ts": "2021-06-01 12:00:00", "temperature": 21.5}' | nc localhost 9876
//! ```
//!
//! Each converted reading is written to stderr as `<ts>\t<fahrenheit>`, the
//! temperature with six decimals (`2021-06-01 12:00:00.000000000\t70.700000`).

use anyhow::{Context, Result};
use clap::Parser;
use sluice::{Config, ErrorKind, Pipeline};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Celsius to Fahrenheit streaming demo
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TCP port the source reader listens on
    #[arg(short, long, default_value_t = 9876)]
    port: u16,

    /// Pipeline configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

const SINK_QUEUE: &str = "q_sink_temperature_fahrenheit";

fn ddl(port: u16) -> Vec<String> {
    vec![
        "CREATE SOURCE STREAM source_temperature_celsius (
            ts TIMESTAMP NOT NULL ROWTIME,
            temperature FLOAT NOT NULL
        );"
        .to_string(),
        "CREATE SINK STREAM sink_temperature_fahrenheit (
            ts TIMESTAMP NOT NULL ROWTIME,
            temperature FLOAT NOT NULL
        );"
        .to_string(),
        "CREATE PUMP c_to_f AS
            INSERT INTO sink_temperature_fahrenheit (ts, temperature)
            SELECT STREAM
                source_temperature_celsius.ts,
                32.0 + source_temperature_celsius.temperature * 1.8
            FROM source_temperature_celsius;"
            .to_string(),
        format!(
            "CREATE SINK WRITER queue_temperature_fahrenheit FOR sink_temperature_fahrenheit
                TYPE IN_MEMORY_QUEUE OPTIONS (NAME '{}');",
            SINK_QUEUE
        ),
        format!(
            "CREATE SOURCE READER tcp_temperature_celsius FOR source_temperature_celsius
                TYPE NET_SERVER OPTIONS (PROTOCOL 'TCP', PORT '{}');",
            port
        ),
    ]
}

fn format_reading(ts: &str, fahrenheit: f64) -> String {
    format!("{}\t{:.6}", ts, fahrenheit)
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("sluice={0},sluice_demo={0}", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };

    let pipeline = Pipeline::open(config)?;
    for sql in ddl(args.port) {
        pipeline.command(&sql).with_context(|| format!("executing {}", sql.trim()))?;
    }
    if let Some(addr) = pipeline.source_reader_addr("tcp_temperature_celsius")? {
        info!("listening on {}", addr);
    }

    loop {
        let row = match pipeline.pop(SINK_QUEUE) {
            Ok(row) => row,
            Err(e) if e.kind() == ErrorKind::PipelineClosed => break,
            Err(e) => return Err(e.into()),
        };
        eprintln!("{}", format_reading(&row.column_text(0)?, row.column_double(1)?));
    }

    info!("pipeline closed");
    Ok(())
}
