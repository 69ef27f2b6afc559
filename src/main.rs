//! # linekv command-line client
//!
//! Runs a single command against a linekv server and prints the result.
//!
//! ## Configuration Priority
//! 1. `--server` on the command line (highest priority)
//! 2. `LINEKV_*` environment variables
//! 3. Configuration file given with `--config`
//! 4. Default values (lowest priority)
//!
//! Use `RUST_LOG=debug` to see every command and response on the wire.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use linekv::{Client, ClientConfig, SetOptions};
use log::info;
use std::path::PathBuf;

/// linekv CLI
#[derive(Parser, Debug)]
#[command(name = "linekv")]
#[command(about = "Client for a line-oriented key-value server")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server address (host:port), overrides the configuration file
    #[arg(short, long)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get { key: String },

    /// Set a key-value pair
    Set {
        key: String,
        value: String,
        /// Expire the key after this many seconds
        #[arg(long, allow_hyphen_values = true)]
        ttl: Option<i64>,
    },

    /// Set a key-value pair only if the key is absent
    Add {
        key: String,
        value: String,
        /// Expire the key after this many seconds
        #[arg(long, allow_hyphen_values = true)]
        ttl: Option<i64>,
    },

    /// Increment a counter
    Incr {
        key: String,
        /// Amount to add (server default when omitted)
        #[arg(long, allow_hyphen_values = true)]
        by: Option<i64>,
    },

    /// Decrement a counter
    Decr {
        key: String,
        /// Amount to subtract (server default when omitted)
        #[arg(long, allow_hyphen_values = true)]
        by: Option<i64>,
    },

    /// Delete a key
    Del { key: String },

    /// Set `a` to 1, increment it by 2 and print it
    Demo,
}

fn main() -> Result<()> {
    // Initialize logging - use RUST_LOG environment variable to control verbosity
    env_logger::init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => ClientConfig::from_env()?,
    };

    if let Some(server) = &args.server {
        let (host, port) = server
            .rsplit_once(':')
            .context("--server must be host:port")?;
        config.host = host.to_string();
        config.port = port.parse().context("--server port must be a number")?;
    }

    let mut client = Client::connect_with_config(&config)?;
    let outcome = run(&mut client, args.command);

    // Always release the connection, but report the command's error first
    let closed = client.close();
    let output = outcome?;
    closed?;

    println!("{}", output);
    Ok(())
}

fn run(client: &mut Client, command: Commands) -> Result<String> {
    let output = match command {
        Commands::Get { key } => client.get(key)?,
        Commands::Set { key, value, ttl } => {
            let opts = SetOptions { ttl };
            client.set_with(key, value, &opts)?.to_string()
        }
        Commands::Add { key, value, ttl } => {
            let opts = SetOptions { ttl };
            client.add_with(key, value, &opts)?.to_string()
        }
        Commands::Incr { key, by: Some(delta) } => client.incr_by(key, delta)?,
        Commands::Incr { key, by: None } => client.incr(key)?,
        Commands::Decr { key, by: Some(delta) } => client.decr_by(key, delta)?,
        Commands::Decr { key, by: None } => client.decr(key)?,
        Commands::Del { key } => client.delete(key)?.to_string(),
        Commands::Demo => {
            client.set("a", "1")?;
            let a = client.get("a")?;
            info!("a was {}", a);
            let a = client.incr_by("a", 2)?;
            format!("a = {}", a)
        }
    };
    Ok(output)
}
