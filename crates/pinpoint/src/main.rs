use anyhow::Context;
use clap::{Parser, Subcommand};
use pinpoint_engine::{
    ConfigLoader, PageContext, ResolveOptions, Resolver, ResolverConfig, SnapshotAccessor,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod repl;

#[derive(Parser)]
#[command(name = "pinpoint", version, about = "Resolve natural-language element descriptions")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Resolver config file (defaults to ./pinpoint.yaml, then ~/.pinpoint/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log verbosity when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Print the structured query a phrase parses into
    Parse { phrase: String },
    /// Resolve a phrase against a page snapshot (JSON)
    Resolve {
        /// Snapshot file
        #[arg(long)]
        snapshot: PathBuf,
        /// Print every plausible node, best first
        #[arg(long)]
        all: bool,
        /// Skip the result cache
        #[arg(long)]
        no_cache: bool,
        phrase: String,
    },
    /// Resolve phrases interactively, or from a file, against one snapshot
    Repl {
        #[arg(long)]
        snapshot: PathBuf,
        /// Phrases to resolve, one per line (non-interactive mode)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr; stdout carries results.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    match args.command {
        Command::Parse { phrase } => {
            let query = pinpoint_parser::parse(&phrase);
            println!("{}", serde_json::to_string_pretty(&query)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Resolve {
            snapshot,
            all,
            no_cache,
            phrase,
        } => {
            let resolver = Resolver::new(load_config(args.config.as_deref()).await?)?;
            let mut ctx = PageContext::new(load_snapshot(&snapshot).await?);

            if all {
                let nodes = resolver.resolve_all(&ctx, &phrase).await;
                println!("{}", serde_json::to_string(&nodes)?);
                return Ok(if nodes.is_empty() {
                    ExitCode::FAILURE
                } else {
                    ExitCode::SUCCESS
                });
            }

            let mut options = ResolveOptions::new();
            if no_cache {
                options = options.bypass_cache();
            }
            match resolver.resolve_with(&mut ctx, &phrase, &options).await {
                Ok(resolution) => {
                    println!("{}", serde_json::to_string_pretty(&resolution)?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("{}", e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Repl { snapshot, file } => {
            let resolver = Resolver::new(load_config(args.config.as_deref()).await?)?;
            let ctx = PageContext::new(load_snapshot(&snapshot).await?);
            match file {
                Some(path) => repl::run_file(&resolver, ctx, &path).await?,
                None => repl::run_repl(&resolver, ctx).await?,
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn load_config(path: Option<&Path>) -> anyhow::Result<ResolverConfig> {
    let config = match path {
        Some(path) => ConfigLoader::load_from(path)
            .await
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ConfigLoader::load_default().await?,
    };
    debug!(strategies = ?config.strategies, retry_count = config.retry_count, "Resolver configured");
    Ok(config)
}

pub(crate) async fn load_snapshot(path: &Path) -> anyhow::Result<SnapshotAccessor> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let accessor = SnapshotAccessor::from_json(&json)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;
    info!("Loaded snapshot {} ({})", path.display(), accessor.url().await);
    Ok(accessor)
}
