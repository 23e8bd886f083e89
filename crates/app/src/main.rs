use std::fmt;
use std::io;
use std::sync::Arc;

use exam_core::reveal::RevealMode;
use services::{BankLoader, BankSource, SecondSourcePolicy, SessionConfig, SessionController};
use storage::repository::Storage;
use tracing_subscriber::EnvFilter;

use crate::repl::{LineConfirm, SharedInput};

mod repl;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidPageSize { raw: String },
    InvalidMode { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidPageSize { raw } => write!(f, "invalid --page-size value: {raw}"),
            ArgsError::InvalidMode { raw } => {
                write!(f, "invalid --mode value: {raw} (expected per-question or per-page)")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct Args {
    db_url: String,
    primary: BankSource,
    secondary: BankSource,
    page_size: Option<usize>,
    mode: Option<RevealMode>,
    allow_missing_secondary: bool,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  exam [--db <sqlite_url>] [--primary <path|url>] [--secondary <path|url>]"
    );
    eprintln!("       [--page-size <n>] [--mode per-question|per-page] [--allow-missing-secondary]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:exam.sqlite3");
    eprintln!("  --primary data/data.json");
    eprintln!("  --secondary data/data2.json");
    eprintln!("  --page-size 50, --mode per-question");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_DB_URL, EXAM_PRIMARY, EXAM_SECONDARY,");
    eprintln!("  EXAM_PAGE_SIZE, EXAM_REVEAL_MODE, EXAM_SECOND_SOURCE, RUST_LOG");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("EXAM_DB_URL")
            .ok()
            .map_or_else(|| normalize_sqlite_url("sqlite:exam.sqlite3".into()), normalize_sqlite_url);
        let mut primary = env_source("EXAM_PRIMARY", "data/data.json");
        let mut secondary = env_source("EXAM_SECONDARY", "data/data2.json");
        let mut page_size = None;
        let mut mode = None;
        let mut allow_missing_secondary = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--primary" => primary = BankSource::parse(&require_value(args, "--primary")?),
                "--secondary" => {
                    secondary = BankSource::parse(&require_value(args, "--secondary")?);
                }
                "--page-size" => {
                    let value = require_value(args, "--page-size")?;
                    let parsed = value
                        .parse::<usize>()
                        .ok()
                        .filter(|size| *size > 0)
                        .ok_or_else(|| ArgsError::InvalidPageSize { raw: value.clone() })?;
                    page_size = Some(parsed);
                }
                "--mode" => {
                    let value = require_value(args, "--mode")?;
                    let parsed = value
                        .parse::<RevealMode>()
                        .map_err(|_| ArgsError::InvalidMode { raw: value.clone() })?;
                    mode = Some(parsed);
                }
                "--allow-missing-secondary" => allow_missing_secondary = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            primary,
            secondary,
            page_size,
            mode,
            allow_missing_secondary,
        })
    }

    /// Flags win over `EXAM_*` variables, which win over defaults.
    fn session_config(&self) -> Result<SessionConfig, Box<dyn std::error::Error>> {
        let mut config = SessionConfig::from_env()?;
        if let Some(size) = self.page_size {
            config = config.with_page_size(size)?;
        }
        if let Some(mode) = self.mode {
            config = config.with_reveal_mode(mode);
        }
        if self.allow_missing_secondary {
            config = config.with_second_source(SecondSourcePolicy::Optional);
        }
        Ok(config)
    }
}

fn env_source(var: &str, default: &str) -> BankSource {
    let raw = std::env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string());
    BankSource::parse(&raw)
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let config = args.session_config()?;

    // Loading is all-or-nothing; a failure ends the process before any state is touched.
    let loader = BankLoader::new(config.second_source);
    let bank = loader.load(&args.primary, &args.secondary).await?;

    tracing::debug!(db = %args.db_url, "opening progress store");
    prepare_sqlite_file(&args.db_url)?;
    let storage = Storage::sqlite(&args.db_url).await?;

    let input = SharedInput::new(io::BufReader::new(io::stdin()));
    let controller = SessionController::open(
        Arc::new(bank),
        config,
        Arc::clone(&storage.kv),
        Arc::new(LineConfirm::new(input.clone())),
    )
    .await;

    repl::run(controller, input, io::stdout()).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
