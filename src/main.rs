//! hookrelay command line
//!
//! - `hookrelay run` - relay JSON-lines events read from stdin
//! - `hookrelay sign` - print the `X-Hub-Signature` for a body
//! - `hookrelay verify` - check a body against a signature

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use hookrelay::logging::LogConfig;
use hookrelay::prelude::*;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Webhook event relay
#[derive(Parser)]
#[command(name = "hookrelay")]
#[command(version)]
#[command(about = "Relay application events to webhook subscribers")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Relay events read as JSON lines from stdin until EOF or Ctrl-C
    Run(RunArgs),

    /// Sign a body and print the signature header value
    Sign(SignArgs),

    /// Verify a body against a signature
    Verify(VerifyArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Settings file (JSON, TOML or .env)
    #[arg(short, long, env = "HOOKRELAY_CONFIG")]
    config: Option<PathBuf>,

    /// JSON file with the subscriptions to load
    #[arg(short, long)]
    subscriptions: Option<PathBuf>,
}

#[derive(Args)]
struct SignArgs {
    /// Shared secret
    #[arg(long, env = "HOOKRELAY_SECRET", hide_env_values = true)]
    secret: String,

    /// File holding the body; stdin when omitted
    file: Option<PathBuf>,
}

#[derive(Args)]
struct VerifyArgs {
    /// Shared secret
    #[arg(long, env = "HOOKRELAY_SECRET", hide_env_values = true)]
    secret: String,

    /// Signature to check, e.g. `sha1=...`
    #[arg(long)]
    signature: String,

    /// File holding the body; stdin when omitted
    file: Option<PathBuf>,
}

/// One entry of the subscriptions file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionEntry {
    event: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default = "default_owner")]
    created_by_id: String,
    #[serde(default = "default_active")]
    is_active: bool,
    config: SubscriptionConfig,
}

fn default_owner() -> String {
    "hookrelay".to_string()
}

fn default_active() -> bool {
    true
}

/// One line of event input
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventLine {
    event_name: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Sign(args) => sign(args),
        Commands::Verify(args) => verify(args),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: RunArgs) -> anyhow::Result<ExitCode> {
    let settings = RelaySettings::load(args.config.as_deref()).context("loading settings")?;
    let _guard = LogConfig::from_settings(&settings.log)?.init()?;

    let registry = InMemorySubscriptionRegistry::new();
    if let Some(path) = &args.subscriptions {
        let loaded = load_subscriptions(&registry, path)?;
        info!(count = loaded, path = %path.display(), "Loaded subscriptions");
    }

    let relay = HookRelay::builder(settings)
        .registry(Arc::new(registry))
        .build()
        .await?;

    let queue = InMemoryEventQueue::new();
    let worker = relay.worker(Arc::new(queue.clone()));
    let stop = CancellationToken::new();
    let cancel = CancellationToken::new();
    let worker_task = tokio::spawn({
        let (stop, cancel) = (stop.clone(), cancel.clone());
        async move { worker.run_until(stop, cancel).await }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, cancelling in-flight deliveries");
                cancel.cancel();
                break;
            }
            line = lines.next_line() => match line.context("reading stdin")? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => enqueue(&queue, &line).await,
                None => {
                    info!("End of input, draining queued events");
                    break;
                }
            },
        }
    }
    stop.cancel();

    // Ctrl-C while draining aborts deliveries
    let interrupt = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });
    let outcome = worker_task.await.context("worker task failed");
    interrupt.abort();
    outcome??;

    Ok(ExitCode::SUCCESS)
}

async fn enqueue(queue: &InMemoryEventQueue, line: &str) {
    let parsed: EventLine = match serde_json::from_str(line) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "Skipping malformed event line");
            return;
        }
    };
    if let Err(e) = queue.write(&parsed.event_name, parsed.data).await {
        warn!(error = %e, "Skipping invalid event");
    }
}

fn load_subscriptions(registry: &InMemorySubscriptionRegistry, path: &Path) -> anyhow::Result<usize> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading subscriptions from {}", path.display()))?;
    let entries: Vec<SubscriptionEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing subscriptions in {}", path.display()))?;

    let count = entries.len();
    for entry in entries {
        let mut subscription = WebhookSubscription::new(entry.event, entry.created_by_id, entry.config);
        if let Some(name) = entry.name {
            subscription = subscription.with_name(name);
        }
        if !entry.is_active {
            subscription = subscription.deactivated();
        }
        registry.add(subscription)?;
    }
    Ok(count)
}

fn read_body(file: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    match file {
        Some(path) => std::fs::read(path).with_context(|| format!("reading {}", path.display())),
        None => {
            let mut body = Vec::new();
            std::io::stdin().read_to_end(&mut body).context("reading stdin")?;
            Ok(body)
        }
    }
}

fn sign(args: SignArgs) -> anyhow::Result<ExitCode> {
    if args.secret.is_empty() {
        bail!("secret must not be empty");
    }
    let body = read_body(args.file.as_deref())?;
    println!("{}", WebhookSignature::sign(&body, &args.secret)?);
    Ok(ExitCode::SUCCESS)
}

fn verify(args: VerifyArgs) -> anyhow::Result<ExitCode> {
    let body = read_body(args.file.as_deref())?;
    if WebhookSignature::verify(&body, &args.signature, &args.secret)? {
        println!("valid");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("invalid");
        Ok(ExitCode::FAILURE)
    }
}
