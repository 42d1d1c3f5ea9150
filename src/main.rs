use std::io::Read as _;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use eidentity::generator::GenerateOptions;
use eidentity::host::scraper_host::{leak_document, ScraperHandle, ScraperQueryEngine};
use eidentity::resolver::ResolveOptions;
use eidentity::scoring::ScoringWeights;
use eidentity::{generate, resolve, Eid};

#[derive(Parser)]
#[command(name = "eidentity")]
#[command(about = "Generate and resolve stable semantic element identity descriptors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an EID for one element in an HTML document
    Generate {
        /// HTML file path, or '-' for stdin
        input: String,

        /// CSS selector identifying the target element (must match exactly one)
        #[arg(short, long)]
        target: String,

        /// Root selector to scope generation/resolution against
        #[arg(long, default_value = "html")]
        root: String,
    },

    /// Resolve a previously generated EID against an HTML document
    Resolve {
        /// HTML file path, or '-' for stdin
        input: String,

        /// Path to a JSON file holding the EID, or '-' for stdin
        #[arg(short, long)]
        eid: String,

        /// Root selector to scope resolution against
        #[arg(long, default_value = "html")]
        root: String,

        /// Fail rather than guess when multiple candidates remain
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { input, target, root } => run_generate(&input, &target, &root),
        Commands::Resolve { input, eid, root, strict } => run_resolve(&input, &eid, &root, strict),
    }
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading {input}"))
    }
}

fn select_one(document: &'static scraper::Html, selector: &str) -> Result<ScraperHandle> {
    let parsed = scraper::Selector::parse(selector)
        .map_err(|e| anyhow!("invalid selector {selector:?}: {e:?}"))?;
    let element = document
        .select(&parsed)
        .next()
        .ok_or_else(|| anyhow!("selector {selector:?} matched nothing"))?;
    Ok(ScraperHandle::new(element))
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn run_generate(input: &str, target_selector: &str, root_selector: &str) -> Result<()> {
    let html = read_input(input)?;
    let document = leak_document(&html);
    let root = select_one(document, root_selector)?;
    let target = select_one(document, target_selector)?;

    info!(target = %target_selector, "generating descriptor");
    let eid = generate(
        &target,
        &root,
        &ScraperQueryEngine,
        &GenerateOptions::default(),
        &ScoringWeights::default(),
        None,
        now_millis(),
    );

    match eid {
        Some(eid) => {
            println!("{}", serde_json::to_string_pretty(&eid)?);
            Ok(())
        }
        None => Err(anyhow!("no descriptor could be generated for {target_selector:?}")),
    }
}

fn run_resolve(input: &str, eid_input: &str, root_selector: &str, strict: bool) -> Result<()> {
    let html = read_input(input)?;
    let document = leak_document(&html);
    let root = select_one(document, root_selector)?;

    let eid_json = read_input(eid_input)?;
    let eid: Eid = serde_json::from_str(&eid_json).context("parsing EID JSON")?;

    let options = ResolveOptions { strict_mode: strict, ..ResolveOptions::default() };
    let result = resolve(&eid, &root, &ScraperQueryEngine, &options);

    info!(status = ?result.status, confidence = result.confidence, "resolve complete");
    for warning in &result.warnings {
        tracing::warn!("{warning}");
    }

    #[derive(serde::Serialize)]
    struct Output {
        status: String,
        confidence: f64,
        degraded: bool,
        degradation_reason: Option<String>,
        matches: usize,
    }

    let status = match result.status {
        eidentity::resolver::Status::Success => "success",
        eidentity::resolver::Status::Ambiguous => "ambiguous",
        eidentity::resolver::Status::Error => "error",
        eidentity::resolver::Status::DegradedFallback => "degraded-fallback",
    };

    let output = Output {
        status: status.to_string(),
        confidence: result.confidence,
        degraded: result.degraded,
        degradation_reason: result.degradation_reason,
        matches: result.elements.len(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
