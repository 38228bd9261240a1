//! fs-cache CLI
//!
//! Entry point for the `fs-cache` command-line tool: inspect the effective
//! cache configuration and the state of the shared caches it produces.

use clap::{Parser, Subcommand};
use fs_caching::{
    global_file_handle_cache, global_membuffer_cache, global_registry, set_cache_config,
    ConfigLoader, LoadedConfig,
};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::process;
use tracing::info;

#[derive(Parser)]
#[command(name = "fs-cache")]
#[command(about = "Inspect filesystem cache configuration", version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the effective configuration and where it came from
    Config {
        #[command(flatten)]
        source: SourceArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Apply the configuration and report the shared caches it produces
    Status {
        #[command(flatten)]
        source: SourceArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Path to cache config file (TOML with a [cache] table)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Override a setting, e.g. --set cache_size=64M (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match cli.command {
        Commands::Config { source, json } => cmd_config(&source, json),
        Commands::Status { source, json } => cmd_status(&source, json),
    };

    process::exit(exit_code);
}

fn load(source: &SourceArgs) -> Result<LoadedConfig, String> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &source.config {
        loader = loader.with_file(path);
    }
    if !source.overrides.is_empty() {
        loader = loader.with_overrides(parse_overrides(&source.overrides)?);
    }
    loader.load().map_err(|e| e.to_string())
}

/// Turn `key=value` pairs into a `{"cache": {...}}` override layer.
fn parse_overrides(pairs: &[String]) -> Result<Value, String> {
    let mut table = Map::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected KEY=VALUE, got {:?}", pair))?;

        let value = match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => raw
                .parse::<u64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(raw.to_string())),
        };
        table.insert(key.trim().to_string(), value);
    }
    Ok(json!({ "cache": table }))
}

fn cmd_config(source: &SourceArgs, json_output: bool) -> i32 {
    let loaded = match load(source) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 2;
        }
    };

    if json_output {
        match serde_json::to_string_pretty(&loaded) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
        return 0;
    }

    let config = loaded.config;
    println!("cache_size:        {}", config.cache_size);
    println!("file_handle_count: {}", config.file_handle_count);
    println!("cache_fulltexts:   {}", config.cache_fulltexts);
    println!("cache_deltas:      {}", config.cache_deltas);
    println!("single_threaded:   {}", config.single_threaded);
    println!();
    println!("Sources:");
    for src in &loaded.sources {
        match (&src.path, &src.digest) {
            (Some(path), Some(digest)) => println!("  {:?}: {} (sha256 {})", src.origin, path, digest),
            _ => println!("  {:?}", src.origin),
        }
    }
    0
}

fn cmd_status(source: &SourceArgs, json_output: bool) -> i32 {
    let loaded = match load(source) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 2;
        }
    };

    info!(config = ?loaded.config, "applying cache configuration");
    set_cache_config(loaded.config);

    let membuffer = match global_membuffer_cache() {
        Some(cache) => json!({
            "present": true,
            "total_size": cache.total_size(),
            "directory_size": cache.directory_size(),
            "segments": cache.segment_count(),
            "thread_safe": cache.is_thread_safe(),
        }),
        None => json!({ "present": false }),
    };

    let (file_handles, exit_code) = match global_file_handle_cache() {
        Ok(cache) => (
            json!({
                "max_handles": cache.max_handles(),
                "thread_safe": cache.is_thread_safe(),
            }),
            0,
        ),
        Err(e) => (json!({ "error": e.to_string() }), 1),
    };

    let report = json!({
        "config": global_registry().config(),
        "membuffer": membuffer,
        "file_handles": file_handles,
    });

    if json_output {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    } else {
        println!("Buffer cache:");
        if report["membuffer"]["present"] == true {
            println!("  total size:     {}", report["membuffer"]["total_size"]);
            println!("  directory size: {}", report["membuffer"]["directory_size"]);
            println!("  segments:       {}", report["membuffer"]["segments"]);
            println!("  thread safe:    {}", report["membuffer"]["thread_safe"]);
        } else {
            println!("  absent");
        }
        println!("File handle cache:");
        match report["file_handles"].get("error") {
            Some(err) => println!("  error: {}", err),
            None => {
                println!("  max handles:    {}", report["file_handles"]["max_handles"]);
                println!("  thread safe:    {}", report["file_handles"]["thread_safe"]);
            }
        }
    }

    exit_code
}
