use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use std::path::PathBuf;
use tokendb::{Durability, Engine, EngineConfig, Filters, Record, Trip, User};
use tracing::info;

#[derive(Parser)]
#[command(name = "tokendb")]
#[command(about = "Inspect and edit a tokendb data directory", long_about = None)]
struct Args {
    /// JSON engine configuration file
    #[arg(long, env = "TOKENDB_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory holding the fjall database [default: ./data]
    #[arg(long, env = "TOKENDB_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Commit durability (sync-all, sync-data, buffered) [default: sync-all]
    #[arg(long, env = "TOKENDB_DURABILITY")]
    durability: Option<Durability>,

    /// Record kind to operate on
    #[arg(long, env = "TOKENDB_KIND", value_enum)]
    kind: Kind,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Trip,
    User,
}

#[derive(Subcommand)]
enum Command {
    /// Create a record from a JSON object; a missing id is generated
    Create { json: String },
    /// Print one record
    Read { id: String },
    /// Replace a record with a JSON object
    Update { id: String, json: String },
    /// Delete a record
    Delete { id: String },
    /// Query with field=value filters; repeat a field to accept any of its values
    Query {
        #[arg(required = true)]
        filters: Vec<String>,
    },
    /// Print every key of the kind, decoded
    Dump,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    info!("tokendb v{}", tokendb::VERSION);

    // Flags and environment override the file
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(durability) = args.durability {
        config.durability = durability;
    }
    let engine = Engine::open(config)?;

    let output = match args.kind {
        Kind::Trip => run::<Trip>(&engine, args.command)?,
        Kind::User => run::<User>(&engine, args.command)?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run<R: Record>(engine: &Engine, command: Command) -> Result<Value> {
    let collection = engine.collection::<R>()?;

    match command {
        Command::Create { json } => {
            let record: R = parse_record(&json, None)?;
            let id = collection.create(&record)?;
            Ok(json!({ "id": id }))
        }
        Command::Read { id } => Ok(serde_json::to_value(collection.read(&id)?)?),
        Command::Update { id, json } => {
            let record: R = parse_record(&json, Some(&id))?;
            collection.update(&id, &record)?;
            Ok(json!({ "id": id, "updated": true }))
        }
        Command::Delete { id } => {
            collection.delete(&id)?;
            Ok(json!({ "id": id, "deleted": true }))
        }
        Command::Query { filters } => {
            let filters = parse_filters(&filters)?;
            let result = collection.query(&filters)?;
            Ok(json!({
                "records": result.records,
                "scanned_count": result.scanned_count,
            }))
        }
        Command::Dump => Ok(serde_json::to_value(collection.dump()?)?),
    }
}

/// Parse a record, filling in `id` when the object omits it.
fn parse_record<R: Record>(raw: &str, id: Option<&str>) -> Result<R> {
    let mut value: Value = serde_json::from_str(raw).context("record is not valid JSON")?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| anyhow!("record must be a JSON object"))?;

    let has_id = object
        .get("id")
        .and_then(Value::as_str)
        .map_or(false, |s| !s.is_empty());
    if !has_id {
        let id = id.map(str::to_string).unwrap_or_else(tokendb::new_identifier);
        object.insert("id".to_string(), Value::from(id));
    }

    serde_json::from_value(value).with_context(|| format!("not a valid {} record", R::KIND))
}

fn parse_filters(raw: &[String]) -> Result<Filters> {
    let mut filters = Filters::new();
    for pair in raw {
        let Some((field, value)) = pair.split_once('=') else {
            bail!("filter '{}' is not of the form field=value", pair);
        };
        filters.push(field, value);
    }
    Ok(filters)
}
