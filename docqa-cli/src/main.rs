use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use docqa_cli::{AppConfig, EvaluateOptions, ask, evaluate, format_answer};
use docqa_telemetry::{LogFormat, TelemetryConfig, init_telemetry};

#[derive(Parser)]
#[command(name = "docqa", about = "Question answering and evaluation over document folders")]
#[command(version)]
struct Cli {
    /// Log output format
    #[arg(long, global = true, default_value = "pretty")]
    log_format: LogFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer every client's question file and write one CSV report per client
    Evaluate {
        /// Path to the TOML config file
        #[arg(long, short)]
        config: PathBuf,
        /// Directory for the reports (overrides the config file)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Only run this client; repeatable
        #[arg(long = "client")]
        clients: Vec<String>,
        /// Use the offline hash embedder and echo model
        #[arg(long)]
        dry_run: bool,
    },

    /// Answer a single question over one folder of documents
    Ask {
        /// Path to the TOML config file (defaults apply when omitted)
        #[arg(long, short)]
        config: Option<PathBuf>,
        /// Folder of documents to index
        #[arg(long)]
        docs: PathBuf,
        /// Use the offline hash embedder and echo model
        #[arg(long)]
        dry_run: bool,
        /// The question
        question: String,
    },
}

fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let telemetry = TelemetryConfig::new("docqa")
        .with_filter(log_filter(cli.verbose))
        .with_format(cli.log_format);
    init_telemetry(&telemetry)?;

    match cli.command {
        Command::Evaluate { config, output_dir, clients, dry_run } => {
            let config = AppConfig::load(&config)?;
            let options = EvaluateOptions { output_dir, clients, dry_run };
            let summary = evaluate(&config, &options).await?;
            if summary.all_succeeded() {
                Ok(ExitCode::SUCCESS)
            } else {
                for skipped in &summary.skipped {
                    let kind = if skipped.build_failure { "index unavailable" } else { "run failed" };
                    eprintln!("{}: {kind}: {}", skipped.client, skipped.reason);
                }
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Ask { config, docs, dry_run, question } => {
            let config = match config {
                Some(path) => AppConfig::load(&path)?,
                None => AppConfig::default(),
            };
            let answer = ask(&config, &docs, &question, dry_run).await?;
            println!("{}", format_answer(&answer));
            Ok(ExitCode::SUCCESS)
        }
    }
}
