use crate::infra::{build_service, http_client, load_raw_evaluation};
use crate::server;
use church_finder::config::AppConfig;
use church_finder::error::AppError;
use church_finder::telemetry;
use church_finder::workflows::churches::EvaluationEngine;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Church Finder",
    about = "Evaluate church websites and serve the church directory",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Crawl, evaluate, and persist a single church website
    Evaluate(EvaluateArgs),
    /// Score a saved extractor output without calling any provider
    Score(ScoreArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Church website, with or without a scheme
    pub(crate) website: String,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Path to a JSON file holding a raw church evaluation
    #[arg(long)]
    pub(crate) raw: PathBuf,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Evaluate(args) => run_evaluate(args).await,
        Command::Score(args) => run_score(args),
    }
}

async fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let service = build_service(&config, http_client())?;
    let detail = service.evaluate(&args.website).await?;

    print_json(&detail)
}

fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let raw = load_raw_evaluation(&args.raw)?;
    let processed = EvaluationEngine::default().process(&raw);
    print_json(&processed)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
    println!("{rendered}");
    Ok(())
}
