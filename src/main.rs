use std::process::ExitCode;

use campus_records::{
    Collection, FsMedium, MemoryMedium, RecordStore, StorageMedium, StoreConfig, StoreError,
};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[clap(name = "campus-records", about = "Manage Employee, Student and Room records")]
pub struct CommandLine {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print every record of a collection
    List { collection: Collection },
    /// Print one record
    Get { collection: Collection, key: String },
    /// Insert a record given as JSON
    Add { collection: Collection, record: String },
    /// Replace the record at KEY with a JSON record
    Update {
        collection: Collection,
        key: String,
        record: String,
    },
    /// Delete a record (missing keys are ignored)
    Delete { collection: Collection, key: String },
    /// Print records whose indexed field equals a JSON value
    Find {
        collection: Collection,
        index: String,
        value: String,
    },
    /// Discard every record and recreate the empty store
    Reset {
        #[clap(long, action)]
        yes: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("CAMPUS_RECORDS_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("CAMPUS_RECORDS_LOG_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn parse_json(raw: &str) -> Result<Value, StoreError> {
    serde_json::from_str(raw).map_err(StoreError::from)
}

fn print_json(value: &Value) -> Result<(), StoreError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run<M: StorageMedium>(
    medium: M,
    config: &StoreConfig,
    command: Command,
) -> Result<(), StoreError> {
    let store = RecordStore::open_config(medium, config).await?;

    match command {
        Command::List { collection } => {
            let records = store.get_all(collection).await?;
            print_json(&Value::Array(records))?;
        }
        Command::Get { collection, key } => {
            print_json(&store.get_by_key(collection, &key).await?)?;
        }
        Command::Add { collection, record } => {
            let key = store.insert(collection, parse_json(&record)?).await?;
            println!("inserted {}:{}", collection, key);
        }
        Command::Update {
            collection,
            key,
            record,
        } => {
            store.update(collection, &key, parse_json(&record)?).await?;
            println!("updated {}:{}", collection, key);
        }
        Command::Delete { collection, key } => {
            store.delete(collection, &key).await?;
            println!("deleted {}:{}", collection, key);
        }
        Command::Find {
            collection,
            index,
            value,
        } => {
            let records = store
                .find_by_index(collection, &index, &parse_json(&value)?)
                .await?;
            print_json(&Value::Array(records))?;
        }
        Command::Reset { yes } => {
            if !yes {
                eprintln!("reset discards every record; pass --yes to confirm");
                return Ok(());
            }
            let store = store.reset().await?;
            println!("reset {} (version {})", store.name(), store.version());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = CommandLine::parse();
    let config = StoreConfig::from_env();

    let result = match &config.data_dir {
        Some(dir) => run(FsMedium::new(dir), &config, cli.command).await,
        None => {
            tracing::warn!("CAMPUS_RECORDS_DIR is not set; using a throwaway in-memory store");
            run(MemoryMedium::new(), &config, cli.command).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
