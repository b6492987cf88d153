//! `evaluate` and `ask`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use docqa_eval::{EvaluationRunner, load_questions};
use docqa_rag::{AnswerResult, QuestionAnswerer, RagError};
use tracing::{error, info, warn};

use crate::config::{AppConfig, ClientConfig};
use crate::factory::build_orchestrator;

/// Options of the `evaluate` command.
#[derive(Debug, Clone, Default)]
pub struct EvaluateOptions {
    /// Overrides `output_dir` from the config file.
    pub output_dir: Option<PathBuf>,
    /// Client names to run; empty runs all.
    pub clients: Vec<String>,
    /// Use the offline hash embedder and echo model.
    pub dry_run: bool,
}

/// A client whose report was written.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOutcome {
    /// Client name from the config.
    pub client: String,
    /// Where the CSV report was written.
    pub report_path: PathBuf,
    /// Rows in the report.
    pub question_count: usize,
    /// Rows whose answer could not be produced.
    pub failed_rows: usize,
}

/// A client that produced no report.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedClient {
    /// Client name from the config.
    pub client: String,
    /// The error chain, rendered on one line.
    pub reason: String,
    /// The corpus, a model backend or the configuration was unusable, so no
    /// question could have been answered. `false` means the questions or the
    /// report failed instead.
    pub build_failure: bool,
}

impl SkippedClient {
    fn from_error(client: &str, error: &anyhow::Error) -> Self {
        let build_failure = error
            .chain()
            .filter_map(|cause| cause.downcast_ref::<RagError>())
            .any(RagError::is_fatal_for_run);
        Self { client: client.to_string(), reason: format!("{error:#}"), build_failure }
    }
}

/// What happened to every selected client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationSummary {
    /// Clients with a written report, in run order.
    pub completed: Vec<ClientOutcome>,
    /// Clients that were skipped, in run order.
    pub skipped: Vec<SkippedClient>,
}

impl EvaluationSummary {
    /// `true` if every selected client produced a report.
    pub fn all_succeeded(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Run the evaluation for every selected client, in config order.
///
/// A client that fails to load, build or write is logged and skipped; the
/// remaining clients still run. Only an unknown `--client` name fails the
/// whole command.
pub async fn evaluate(
    config: &AppConfig,
    options: &EvaluateOptions,
) -> anyhow::Result<EvaluationSummary> {
    let clients = config.select_clients(&options.clients)?;
    let output_dir = options.output_dir.clone().unwrap_or_else(|| config.output_dir.clone());
    let total = clients.len();
    let mut summary = EvaluationSummary::default();

    for (position, client) in clients.into_iter().enumerate() {
        println!("[{}/{}] {}: evaluating", position + 1, total, client.name);
        match evaluate_client(config, client, &output_dir, options.dry_run).await {
            Ok(outcome) => {
                println!(
                    "[{}/{}] {}: {} questions, {} failed -> {}",
                    position + 1,
                    total,
                    client.name,
                    outcome.question_count,
                    outcome.failed_rows,
                    outcome.report_path.display()
                );
                summary.completed.push(outcome);
            }
            Err(e) => {
                let skipped = SkippedClient::from_error(&client.name, &e);
                if skipped.build_failure {
                    error!(
                        client = %client.name,
                        error = %skipped.reason,
                        "client index unavailable, skipping"
                    );
                } else {
                    warn!(client = %client.name, error = %skipped.reason, "client run failed, skipping");
                }
                println!(
                    "[{}/{}] {}: skipped ({})",
                    position + 1,
                    total,
                    client.name,
                    skipped.reason
                );
                summary.skipped.push(skipped);
            }
        }
    }

    info!(
        completed = summary.completed.len(),
        skipped = summary.skipped.len(),
        "evaluation run finished"
    );
    Ok(summary)
}

async fn evaluate_client(
    config: &AppConfig,
    client: &ClientConfig,
    output_dir: &Path,
    dry_run: bool,
) -> anyhow::Result<ClientOutcome> {
    let started = Instant::now();
    let orchestrator = build_orchestrator(config, &client.input_path, dry_run).await?;
    let rows = load_questions(&client.question_path)?;
    info!(client = %client.name, question_count = rows.len(), "questions loaded");

    let report = EvaluationRunner::new(Arc::new(orchestrator))
        .with_client(&client.name)
        .with_placeholders(client.placeholders.clone())
        .run(&rows)
        .await;
    let report_path = report.write_csv(output_dir, &client.name)?;

    info!(
        client = %client.name,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "client finished"
    );
    Ok(ClientOutcome {
        client: client.name.clone(),
        report_path,
        question_count: report.len(),
        failed_rows: report.failed_count(),
    })
}

/// Build an index over `docs` and answer one question.
pub async fn ask(
    config: &AppConfig,
    docs: &Path,
    question: &str,
    dry_run: bool,
) -> anyhow::Result<AnswerResult> {
    let orchestrator = build_orchestrator(config, docs, dry_run).await?;
    Ok(orchestrator.answer(question).await?)
}

/// Human-readable rendering of an answer and its sources.
pub fn format_answer(answer: &AnswerResult) -> String {
    let mut out = answer.text.trim().to_string();
    if !answer.source_chunks.is_empty() {
        out.push_str("\n\nSources:");
        for result in &answer.source_chunks {
            out.push_str(&format!(
                "\n  {:.3}  {} (chunk {})",
                result.score, result.chunk.document_id, result.chunk.index
            ));
        }
    }
    out
}
