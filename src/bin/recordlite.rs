use clap::{Parser, Subcommand};
use recordlite::cli::{self as prog_cli, Command, OutputMode};
use recordlite::{Collection, MemoryStore, QueryConfig, Schema};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct AppConfig {
    schema: Option<PathBuf>,
    data: Option<PathBuf>,
    log_config: Option<PathBuf>,
    collection: Option<String>,
    #[serde(default)]
    query: QueryConfig,
}

fn load_config(cli: &Cli) -> Result<AppConfig, Box<dyn std::error::Error>> {
    // Precedence: CLI > env > config file > defaults
    let mut cfg = match &cli.config {
        Some(p) => toml::from_str::<AppConfig>(&std::fs::read_to_string(p)?)?,
        None => AppConfig::default(),
    };
    if let Ok(s) = std::env::var("RECORDLITE_SCHEMA") {
        cfg.schema = Some(PathBuf::from(s));
    }
    if let Ok(s) = std::env::var("RECORDLITE_DATA") {
        cfg.data = Some(PathBuf::from(s));
    }
    if let Ok(s) = std::env::var("RECORDLITE_LOG_CONFIG") {
        cfg.log_config = Some(PathBuf::from(s));
    }
    if let Some(p) = &cli.schema {
        cfg.schema = Some(p.clone());
    }
    if let Some(p) = &cli.data {
        cfg.data = Some(p.clone());
    }
    cfg.query = cfg.query.with_env_overrides();
    Ok(cfg)
}

#[derive(Parser, Debug)]
#[command(name = "recordlite", version, about = "Query NDJSON records against a typed schema", long_about = None)]
struct Cli {
    /// Path to a config file (TOML)
    #[arg(long, help = "Path to a config file (TOML). If omitted, defaults are used.")]
    config: Option<PathBuf>,
    #[arg(long, help = "Schema file (TOML [[fields]] entries). Overrides config/env.")]
    schema: Option<PathBuf>,
    #[arg(long, help = "NDJSON records file. Overrides config/env.")]
    data: Option<PathBuf>,
    #[arg(long, help = "Print bare counts/booleans instead of JSON objects")]
    plain: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Find records; prints NDJSON to stdout")]
    Find {
        #[arg(help = "Query JSON (e.g., {\"where\": {\"order\": {\"gt\": 2}}, \"order\": \"name\"})")]
        query: Option<String>,
    },
    #[command(name = "find-one", about = "Print the first matching record")]
    FindOne {
        #[arg(help = "Query JSON")]
        query: Option<String>,
    },
    #[command(name = "find-by-id", about = "Print the record with the given identifier")]
    FindById {
        #[arg(help = "Record identifier")]
        id: u64,
    },
    #[command(about = "Count records matching a where clause")]
    Count {
        #[arg(help = "Where clause JSON (e.g., {\"vip\": true})")]
        filter: Option<String>,
    },
    #[command(about = "Report whether a record exists")]
    Exists {
        #[arg(help = "Record identifier")]
        id: u64,
    },
}

impl From<Commands> for Command {
    fn from(c: Commands) -> Self {
        match c {
            Commands::Find { query } => Self::Find { query_json: query },
            Commands::FindOne { query } => Self::FindOne { query_json: query },
            Commands::FindById { id } => Self::FindById { id },
            Commands::Count { filter } => Self::Count { where_json: filter },
            Commands::Exists { id } => Self::Exists { id },
        }
    }
}

fn open_collection(cfg: &AppConfig) -> Result<Collection, Box<dyn std::error::Error>> {
    let schema_path = cfg.schema.as_deref().ok_or("no schema given (--schema or RECORDLITE_SCHEMA)")?;
    let schema = Schema::from_toml_str(&std::fs::read_to_string(schema_path)?)?;
    let name = cfg.collection.clone().unwrap_or_else(|| stem_or(schema_path, "records"));
    let col = Collection::with_store(name, schema, Box::new(MemoryStore::new()), cfg.query.clone());
    if let Some(data) = cfg.data.as_deref() {
        let f = std::fs::File::open(data)?;
        prog_cli::load_ndjson(&col, std::io::BufReader::new(f))?;
    }
    Ok(col)
}

fn stem_or(p: &Path, fallback: &str) -> String {
    p.file_stem().and_then(|s| s.to_str()).unwrap_or(fallback).to_owned()
}

fn main() {
    let cli = Cli::parse();
    let cfg = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {e}");
            std::process::exit(2);
        }
    };
    let log_res = match &cfg.log_config {
        Some(p) => recordlite::utils::logger::init_path(p),
        None => recordlite::init(),
    };
    if let Err(e) = log_res {
        eprintln!("logging disabled: {e}");
    }
    let mode = if cli.plain { OutputMode::Plain } else { OutputMode::Json };
    let result = open_collection(&cfg).and_then(|col| {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        prog_cli::run_with_format(&col, cli.command.into(), mode, &mut out)?;
        out.flush()?;
        Ok(())
    });
    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
