//! LedgerKV CLI
//!
//! Command-line interface for a LedgerKV data directory.

use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use ledgerkv::{Config, Store, StorePaths, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// LedgerKV CLI
#[derive(Parser, Debug)]
#[command(name = "ledgerkv-cli")]
#[command(about = "CLI for the LedgerKV key-value store")]
#[command(version)]
struct Args {
    /// Data directory (db.json, wal.json, checkpoint.json)
    #[arg(short, long, default_value = "./ledgerkv_data")]
    data_dir: PathBuf,

    /// Mutations between automatic checkpoints (0 disables)
    #[arg(short = 'c', long, default_value = "5")]
    checkpoint_every: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value (parsed as JSON, otherwise stored as a string)
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Snapshot and checkpoint now
    Checkpoint,

    /// Print store counters
    Stats,

    /// Write k0=0, k1=1, ... in order
    Fill {
        /// Number of keys
        #[arg(short = 'n', long, default_value = "1000")]
        count: u64,

        /// Pause between writes
        #[arg(long, default_value = "0")]
        delay_ms: u64,

        /// Delete each key right after writing it
        #[arg(long)]
        delete: bool,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> ledgerkv::Result<()> {
    std::fs::create_dir_all(&args.data_dir)?;

    let config = Config::builder()
        .checkpoint_every(args.checkpoint_every)
        .build();
    let store = Store::open(StorePaths::in_dir(&args.data_dir), config)?;

    match args.command {
        Commands::Get { key } => match store.get(&key) {
            Some(value) => println!("{}", value),
            None => println!("(nil)"),
        },
        Commands::Put { key, value } => {
            store.put(key, parse_value(&value))?;
            println!("OK");
        }
        Commands::Del { key } => {
            store.delete(key)?;
            println!("OK");
        }
        Commands::Checkpoint => {
            store.checkpoint()?;
            println!("OK");
        }
        Commands::Stats => {
            let stats = store.stats();
            println!("keys:                 {}", stats.keys);
            println!("wal_len:              {}", stats.wal_len);
            println!("checkpoint_offset:    {}", stats.checkpoint_offset);
            println!("ops_since_checkpoint: {}", stats.ops_since_checkpoint);
            println!("replayed_on_open:     {}", store.recovery_report().records_replayed);
        }
        Commands::Fill { count, delay_ms, delete } => {
            for i in 0..count {
                let key = format!("k{}", i);
                store.put(key.clone(), i)?;
                if delete {
                    store.delete(key)?;
                }
                if delay_ms > 0 {
                    thread::sleep(Duration::from_millis(delay_ms));
                }
            }
            println!("OK");
        }
    }

    store.close()
}

/// `1` → number, `{"a":1}` → object, `hello` → string
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
