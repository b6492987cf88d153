//! Dry-run evaluation across several clients, one of them broken.

use std::fs;
use std::path::Path;

use docqa_cli::{AppConfig, ClientConfig, EvaluateOptions, ask, evaluate};
use docqa_eval::Placeholders;

fn write_corpus(root: &Path) {
    let docs = root.join("docs");
    fs::create_dir_all(&docs).unwrap();
    fs::write(
        docs.join("policy.txt"),
        "The management fee of Alpha Fund I is 2% per annum.\n\n\
         The auditor of the fund is KPMG.",
    )
    .unwrap();
    fs::write(
        root.join("questions.csv"),
        "questions,actual_answers\n\
         What is the management fee of FUND?,2%\n\
         Who audits FUND?,KPMG\n",
    )
    .unwrap();
}

fn config(root: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.output_dir = root.join("reports");
    config.clients = vec![
        ClientConfig {
            name: "alpha".to_string(),
            input_path: root.join("docs"),
            question_path: root.join("questions.csv"),
            placeholders: Placeholders::new().with("FUND", "Alpha Fund I"),
        },
        ClientConfig {
            name: "ghost".to_string(),
            input_path: root.join("no-such-folder"),
            question_path: root.join("questions.csv"),
            placeholders: Placeholders::new(),
        },
    ];
    config
}

#[tokio::test]
async fn test_broken_client_is_skipped_and_others_complete() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    let config = config(dir.path());

    let options = EvaluateOptions { dry_run: true, ..Default::default() };
    let summary = evaluate(&config, &options).await.unwrap();

    assert!(!summary.all_succeeded());
    assert_eq!(summary.completed.len(), 1);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].client, "ghost");
    assert!(summary.skipped[0].build_failure);

    let outcome = &summary.completed[0];
    assert_eq!(outcome.question_count, 2);
    assert_eq!(outcome.failed_rows, 0);
    assert_eq!(outcome.report_path, dir.path().join("reports/alpha_evaluation_output.csv"));

    let report = fs::read_to_string(&outcome.report_path).unwrap();
    assert!(report.starts_with("id,question,predicted_answers,actual_answers,result"));
    assert!(report.contains("What is the management fee of Alpha Fund I?"));
    assert!(!dir.path().join("reports/ghost_evaluation_output.csv").exists());
}

#[tokio::test]
async fn test_client_filter_and_output_override() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    let config = config(dir.path());

    let options = EvaluateOptions {
        output_dir: Some(dir.path().join("elsewhere")),
        clients: vec!["alpha".to_string()],
        dry_run: true,
    };
    let summary = evaluate(&config, &options).await.unwrap();

    assert!(summary.all_succeeded());
    assert!(dir.path().join("elsewhere/alpha_evaluation_output.csv").exists());

    let unknown = EvaluateOptions { clients: vec!["nobody".to_string()], ..options };
    assert!(evaluate(&config, &unknown).await.is_err());
}

#[tokio::test]
async fn test_ask_answers_from_documents() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    let config = config(dir.path());

    let answer = ask(&config, &dir.path().join("docs"), "Who is the auditor?", true).await.unwrap();

    assert!(!answer.no_context);
    assert!(answer.text.contains("KPMG"));
    assert_eq!(answer.source_chunks[0].chunk.document_id, "policy.txt");
}
