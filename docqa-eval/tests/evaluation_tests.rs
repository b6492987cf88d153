//! Evaluation from a question file to a written report, over a real index.

use std::sync::Arc;

use docqa_eval::{EvaluationRunner, FAILED_MARKER, Placeholders, RecordStatus, load_questions};
use docqa_model::MockModel;
use docqa_rag::{
    Document, DocumentPreprocessor, FlatIndex, HashEmbeddingProvider, PromptReader, RagConfig,
    RagOrchestrator, RecursiveChunker, VectorIndex,
};

async fn orchestrator(model: Arc<MockModel>) -> RagOrchestrator {
    let config = RagConfig::default();
    let preprocessor = Arc::new(DocumentPreprocessor::new(
        Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap)),
        Arc::new(HashEmbeddingProvider::new(384).unwrap()),
    ));
    let index = Arc::new(FlatIndex::new(preprocessor));
    index
        .add(&[Document::new("policy.txt", "Fees are 2%. Returns were 10% over 3 years.")])
        .await
        .unwrap();

    RagOrchestrator::builder()
        .config(config)
        .index(index)
        .reader(Arc::new(PromptReader::new(model)))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_batch_with_malformed_row_writes_full_report() {
    let dir = tempfile::tempdir().unwrap();
    let questions = dir.path().join("advent.csv");
    std::fs::write(
        &questions,
        "questions,actual_answers\n\
         What fee does FUND charge?,2%\n\
         ,missing question\n\
         What were the returns?,10%\n",
    )
    .unwrap();

    let model = Arc::new(MockModel::echo());
    let rows = load_questions(&questions).unwrap();
    let runner = EvaluationRunner::new(Arc::new(orchestrator(model.clone()).await))
        .with_client("advent")
        .with_placeholders(Placeholders::new().with("FUND", "Advent GPE X"));
    let report = runner.run(&rows).await;

    assert_eq!(report.len(), 3);
    assert_eq!(report.records[0].status, RecordStatus::Answered);
    assert_eq!(report.records[0].question, "What fee does Advent GPE X charge?");
    assert!(report.records[0].predicted_answers.contains("Fees are 2%."));
    assert_eq!(report.records[1].predicted_answers, FAILED_MARKER);
    assert_eq!(report.records[2].status, RecordStatus::Answered);
    assert_eq!(model.call_count(), 2);

    let path = report.write_csv(dir.path(), "advent").unwrap();
    let mut reader = csv::Reader::from_path(&path).unwrap();
    let ids: Vec<String> = reader.records().map(|r| r.unwrap()[0].to_string()).collect();
    assert_eq!(ids, vec!["0", "1", "2"]);
}

#[tokio::test]
async fn test_model_failure_marks_every_row_failed() {
    let rows = vec![
        docqa_eval::QuestionRow::new(0, "What is the fee?", "2%"),
        docqa_eval::QuestionRow::new(1, "What were the returns?", "10%"),
    ];
    let model = Arc::new(MockModel::failing("out of memory"));
    let report = EvaluationRunner::new(Arc::new(orchestrator(model).await)).run(&rows).await;

    assert_eq!(report.failed_count(), 2);
    assert!(report.records.iter().all(|r| r.result["error"].as_str().unwrap().contains("out of memory")));
}
