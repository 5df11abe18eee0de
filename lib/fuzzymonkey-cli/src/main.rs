#![allow(missing_docs)]
//! Command-line entry point: `fuzz`, `validate`, and `lint` over a
//! configuration script plus the OpenAPI document its modeler names
//! (§6 "CLI surface").

mod document;
mod stdio_transport;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use fuzzymonkey_core::check::CheckEngine;
use fuzzymonkey_core::config::{self, Sandbox};
use fuzzymonkey_core::http::HttpCaller;
use fuzzymonkey_core::resetter::Resetter;
use fuzzymonkey_core::runtime::{
    Campaign, CampaignOutcome, FuzzAnnounce, Runtime, ShrinkBudget, default_reporter,
};

use stdio_transport::StdioCoordinatorStream;

/// The exit codes §6 assigns meaning to.
mod exit {
    pub const SUCCESS: u8 = 0;
    pub const USAGE_OR_CONFIG: u8 = 1;
    pub const VALIDATION_FAILED: u8 = 2;
    #[allow(dead_code)] // no version handshake exists without a real coordinator transport
    pub const TOOL_OUT_OF_DATE: u8 = 3;
    pub const MISSING_API_KEY: u8 = 4;
    pub const SUBPROCESS_UNAVAILABLE: u8 = 5;
    pub const BUG_FOUND: u8 = 6;
    pub const RESETTER_ERROR: u8 = 7;
}

#[derive(Debug)]
struct Args {
    command: Command,
    config: PathBuf,
    verbosity: u8,
    intensity: u32,
    seed: Option<u64>,
    shrink_attempts: u32,
    api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Fuzz,
    Validate,
    Lint,
}

impl Args {
    fn parse() -> Result<Self> {
        let verbosity = count_verbosity();
        let filtered: Vec<std::ffi::OsString> = std::env::args_os()
            .skip(1)
            .filter(|arg| {
                arg.to_str()
                    .is_none_or(|s| !(s.starts_with('-') && s[1..].chars().all(|c| c == 'v') && s.len() > 1))
            })
            .collect();
        let mut pargs = pico_args::Arguments::from_vec(filtered);

        let command = match pargs.subcommand().context("parsing subcommand")? {
            Some(s) if s == "fuzz" => Command::Fuzz,
            Some(s) if s == "validate" => Command::Validate,
            Some(s) if s == "lint" => Command::Lint,
            Some(other) => bail!("unknown subcommand {other:?}, expected fuzz|validate|lint"),
            None => bail!("missing subcommand, expected fuzz|validate|lint"),
        };

        let config: PathBuf = pargs
            .opt_value_from_str(["-c", "--config"])
            .context("parsing --config")?
            .unwrap_or_else(|| PathBuf::from("fuzzymonkey.cfg"));

        let intensity = pargs
            .opt_value_from_str(["-i", "--intensity"])
            .context("parsing --intensity")?
            .unwrap_or(1);

        let seed = pargs
            .opt_value_from_fn("--seed", parse_hex_seed)
            .context("parsing --seed")?;

        let shrink_attempts = pargs
            .opt_value_from_str("--shrink-attempts")
            .context("parsing --shrink-attempts")?
            .unwrap_or(10);

        let api_key = pargs
            .opt_value_from_str::<_, String>("--api-key")
            .context("parsing --api-key")?
            .or_else(|| std::env::var("API_KEY").ok());

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            warn!(?remaining, "unused arguments left");
        }

        Ok(Self {
            command,
            config,
            verbosity,
            intensity,
            seed,
            shrink_attempts,
            api_key,
        })
    }
}

/// Counts `-v`/`-vv`/`-vvv` verbosity, capped at 3. Scanned directly from
/// `std::env::args` since pico-args has no repeat-flag counter.
fn count_verbosity() -> u8 {
    let mut count = 0u8;
    for arg in std::env::args().skip(1) {
        if let Some(vs) = arg.strip_prefix('-') {
            if !vs.is_empty() && vs.chars().all(|c| c == 'v') {
                count = count.saturating_add(u8::try_from(vs.len()).unwrap_or(0));
            }
        }
    }
    count.min(3)
}

fn parse_hex_seed(s: &str) -> Result<u64, String> {
    let trimmed = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(trimmed, 16).map_err(|e| e.to_string())
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_sandbox(config_path: &std::path::Path) -> Result<Sandbox> {
    let source = std::fs::read_to_string(config_path)
        .with_context(|| format!("reading configuration script at {}", config_path.display()))?;
    config::load(&source).context("loading configuration script")
}

fn base_url(sandbox: &Sandbox) -> Result<url::Url> {
    let host = sandbox
        .modelers
        .iter()
        .find_map(|m| m.fields.get("host"))
        .and_then(|v| v.as_text())
        .map(str::to_string)
        .or_else(|| sandbox.exports.get("host").and_then(|v| v.as_text()).map(str::to_string))
        .unwrap_or_else(|| "http://localhost:8080".to_string());
    url::Url::parse(&host).with_context(|| format!("parsing host {host:?} as a URL"))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse()?;
    init_tracing(args.verbosity);

    let code = match args.command {
        Command::Lint => run_lint(&args),
        Command::Validate => run_validate(&args).await,
        Command::Fuzz => run_fuzz(args).await,
    }?;
    Ok(ExitCode::from(code))
}

/// `lint`: the configuration script alone must parse and evaluate.
fn run_lint(args: &Args) -> Result<u8> {
    match load_sandbox(&args.config) {
        Ok(sandbox) => {
            info!(modelers = sandbox.modelers.len(), "configuration script is valid");
            Ok(exit::SUCCESS)
        }
        Err(err) => {
            warn!(%err, "configuration script is invalid");
            Ok(exit::USAGE_OR_CONFIG)
        }
    }
}

/// `validate`: the configuration script plus the full OpenAPI normalization
/// pipeline must both succeed (§6 exit code 2, "Validation failed (static)").
async fn run_validate(args: &Args) -> Result<u8> {
    let sandbox = match load_sandbox(&args.config) {
        Ok(sandbox) => sandbox,
        Err(err) => {
            warn!(%err, "configuration script is invalid");
            return Ok(exit::USAGE_OR_CONFIG);
        }
    };

    let config_dir = args.config.parent().unwrap_or_else(|| std::path::Path::new("."));
    let Some(modeler) = sandbox.modelers.iter().find(|m| m.kind == "OpenAPIv3") else {
        warn!("no OpenAPIv3 modeler bound");
        return Ok(exit::VALIDATION_FAILED);
    };

    let document = match document::load_document(modeler, config_dir) {
        Ok(doc) => doc,
        Err(err) => {
            warn!(%err, "failed to load OpenAPI document");
            return Ok(exit::VALIDATION_FAILED);
        }
    };

    match Campaign::resolve(&sandbox, &document) {
        Ok(campaign) => {
            info!(
                endpoints = campaign.endpoints.len(),
                "specification validated"
            );
            Ok(exit::SUCCESS)
        }
        Err(err) => {
            warn!(%err, "specification failed validation");
            Ok(exit::VALIDATION_FAILED)
        }
    }
}

/// `fuzz`: runs a full campaign against a coordinator speaking JSON-Lines
/// over this process's stdin/stdout.
async fn run_fuzz(args: Args) -> Result<u8> {
    if args.api_key.is_none() {
        warn!("no API key supplied (--api-key or API_KEY)");
        return Ok(exit::MISSING_API_KEY);
    }

    let sandbox = match load_sandbox(&args.config) {
        Ok(sandbox) => sandbox,
        Err(err) => {
            warn!(%err, "configuration script is invalid");
            return Ok(exit::USAGE_OR_CONFIG);
        }
    };

    let config_dir = args.config.parent().unwrap_or_else(|| std::path::Path::new("."));
    let Some(modeler) = sandbox.modelers.iter().find(|m| m.kind == "OpenAPIv3") else {
        warn!("no OpenAPIv3 modeler bound");
        return Ok(exit::USAGE_OR_CONFIG);
    };

    let document = match document::load_document(modeler, config_dir) {
        Ok(doc) => doc,
        Err(err) => {
            warn!(%err, "failed to load OpenAPI document");
            return Ok(exit::USAGE_OR_CONFIG);
        }
    };

    let campaign = match Campaign::resolve(&sandbox, &document) {
        Ok(campaign) => campaign,
        Err(err) => {
            warn!(%err, "failed to resolve campaign");
            return Ok(exit::VALIDATION_FAILED);
        }
    };

    let base_url = base_url(&sandbox)?;
    let caller = HttpCaller::new(
        base_url,
        args.api_key.clone(),
        format!("fuzzymonkey/{}", env!("CARGO_PKG_VERSION")),
    )
    .context("building HTTP caller")?;

    let resetter = Resetter::new(campaign.resetter.clone());
    let checks = CheckEngine::new();
    let shrink_budget = ShrinkBudget::from_attempts(args.shrink_attempts);
    let stream = Box::new(StdioCoordinatorStream::new());
    let reporter = default_reporter();

    let (cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let announce = FuzzAnnounce {
        endpoint_count: campaign.endpoints.len(),
        env_read: sandbox.env_reads.clone(),
        model_kind: modeler.kind.clone(),
        intensity: args.intensity,
        resetter_bound: campaign.resetter.exec_start.is_some()
            || campaign.resetter.exec_reset.is_some()
            || campaign.resetter.exec_stop.is_some(),
        seed: args.seed,
        tags: Vec::new(),
        usage: Some("fuzzymonkey-cli".to_string()),
    };

    let mut runtime = Runtime::new(
        stream,
        caller,
        checks,
        resetter,
        campaign.ir,
        campaign.validator,
        campaign.endpoints,
        campaign.state,
        reporter,
        shrink_budget,
        announce,
        cancel_rx,
    );

    match runtime.run().await {
        Ok(report) => {
            info!(calls = report.calls.len(), bugs = report.bugs_found, outcome = ?report.outcome, "campaign finished");
            Ok(match report.outcome {
                CampaignOutcome::Success => exit::SUCCESS,
                CampaignOutcome::Failure | CampaignOutcome::Shrinkable => exit::BUG_FOUND,
                CampaignOutcome::FailureDueToResetterError => exit::RESETTER_ERROR,
            })
        }
        Err(fuzzymonkey_core::FuzzError::Cancelled) => {
            warn!("campaign cancelled");
            Ok(exit::USAGE_OR_CONFIG)
        }
        Err(fuzzymonkey_core::FuzzError::Resetter(err)) => {
            warn!(%err, "resetter error ended the campaign");
            if err.status.contains("failed to spawn") {
                Ok(exit::SUBPROCESS_UNAVAILABLE)
            } else {
                Ok(exit::RESETTER_ERROR)
            }
        }
        Err(err) => {
            warn!(%err, "campaign ended with a fatal error");
            Ok(exit::USAGE_OR_CONFIG)
        }
    }
}
