//! End-to-end tests: ingestion, retrieval and the session controller.

mod common;

use std::sync::Arc;

use common::{HashEmbedder, RecordingChat, ingestor, test_config};
use notes_rag::session::NO_CONTEXT_ANSWER;
use notes_rag::{
    AnswerGenerator, Document, EmbeddingProvider, FileStatus, InMemoryVectorStore, Retriever,
    Role, SessionController, VectorStore,
};

const SHARPE: &str = "The Sharpe ratio measures risk-adjusted return.";

fn session(
    embedder: Arc<HashEmbedder>,
    store: Arc<InMemoryVectorStore>,
    chat: Arc<RecordingChat>,
) -> SessionController {
    let config = test_config();
    let retriever = Retriever::new(embedder, store, config.top_k);
    SessionController::new(retriever, AnswerGenerator::new(chat, config.generation))
}

#[tokio::test]
async fn embedding_is_deterministic() {
    let embedder = HashEmbedder::new();
    let first = embedder.embed("hello").await.unwrap();
    let second = embedder.embed("hello").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), embedder.dimensions());
}

#[tokio::test]
async fn empty_collection_never_reaches_the_generator() {
    let embedder = HashEmbedder::new();
    let store = Arc::new(InMemoryVectorStore::default());
    let chat = RecordingChat::answering("should not be used");

    let retriever = Retriever::new(embedder.clone(), store.clone(), 3);
    let retrieval = retriever.retrieve("What is CAPM?").await.unwrap();
    assert!(retrieval.context.is_empty());
    assert!(retrieval.sources.is_empty());

    let mut session = session(embedder, store, chat.clone());
    let outcome = session.handle("What is CAPM?").await.unwrap();
    assert_eq!(outcome.answer, NO_CONTEXT_ANSWER);
    assert!(outcome.sources.is_empty());
    assert!(!outcome.generated);
    assert_eq!(chat.call_count(), 0);
}

#[tokio::test]
async fn single_sentence_document_is_retrieved_and_cited() {
    let embedder = HashEmbedder::new();
    let store = Arc::new(InMemoryVectorStore::default());
    let ingestor = ingestor(embedder.clone(), store.clone());

    let added = ingestor.ingest_document(Document::from_text("sharpe.txt", SHARPE)).await.unwrap();
    assert_eq!(added, 1);
    assert_eq!(store.count().await.unwrap(), 1);

    let retrieval = Retriever::new(embedder.clone(), store.clone(), 3)
        .retrieve("What is the Sharpe ratio?")
        .await
        .unwrap();
    assert_eq!(retrieval.context, SHARPE);
    assert_eq!(retrieval.sources.into_iter().collect::<Vec<_>>(), vec!["sharpe.txt"]);

    let chat = RecordingChat::answering("It is excess return divided by volatility.");
    let mut session = session(embedder, store, chat.clone());
    let outcome = session.handle("What is the Sharpe ratio?").await.unwrap();

    assert!(outcome.generated);
    assert_eq!(outcome.sources, vec!["sharpe.txt"]);
    assert_eq!(outcome.answer, "It is excess return divided by volatility.");

    let requests = chat.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].messages[1].content.contains(SHARPE));
    assert_eq!(requests[0].model, "llama-3.3-70b-versatile");
}

#[tokio::test]
async fn generation_failure_is_recorded_with_empty_sources() {
    let embedder = HashEmbedder::new();
    let store = Arc::new(InMemoryVectorStore::default());
    ingestor(embedder.clone(), store.clone())
        .ingest_document(Document::from_text("sharpe.txt", SHARPE))
        .await
        .unwrap();

    let chat = RecordingChat::failing("invalid API key");
    let mut session = session(embedder, store, chat);
    let outcome = session.handle("Sharpe ratio?").await.unwrap();

    assert!(outcome.answer.starts_with("Response generation error:"));
    assert!(outcome.answer.contains("invalid API key"));
    let history = session.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].text, outcome.answer);
    assert!(outcome.sources.is_empty());
    assert_eq!(history[1].sources.as_deref(), Some(&[][..]));
    assert_eq!(history[0].sources, None);

    session.reset();
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn reingesting_without_reset_doubles_the_count() {
    let embedder = HashEmbedder::new();
    let store = Arc::new(InMemoryVectorStore::default());
    let ingestor = ingestor(embedder, store.clone());
    let text: String = (0..1200).map(|i| format!("parola{i} ")).collect();

    let first =
        ingestor.ingest_document(Document::from_text("lezione.txt", text.clone())).await.unwrap();
    let after_first = store.count().await.unwrap();
    let second = ingestor.ingest_document(Document::from_text("lezione.txt", text)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(after_first, first);
    assert_eq!(store.count().await.unwrap(), 2 * after_first);
}

#[tokio::test]
async fn batching_does_not_change_records() {
    let text: String = (0..3000).map(|i| format!("w{i} ")).collect();
    let embedder = HashEmbedder::new();
    let store = Arc::new(InMemoryVectorStore::default());
    let added = ingestor(embedder.clone(), store.clone())
        .ingest_document(Document::from_text("long.txt", text))
        .await
        .unwrap();

    // 3000 words with 500/50 windows; the test config embeds four at a time.
    assert_eq!(added, 7);
    assert_eq!(embedder.calls(), 7);

    let hits = store.query(&common::hash_embedding("w0"), added).await.unwrap();
    let mut indices: Vec<usize> = hits.iter().map(|h| h.record.metadata.chunk_index).collect();
    indices.sort_unstable();
    assert_eq!(indices, (0..7).collect::<Vec<_>>());
    for hit in &hits {
        let expected = common::hash_embedding(&hit.record.text);
        assert_eq!(hit.record.embedding, expected);
    }
}

#[tokio::test]
async fn folder_ingestion_reports_each_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("capm.txt"), "The CAPM relates expected return to beta.")
        .unwrap();
    std::fs::write(dir.path().join("empty.txt"), "   \n").unwrap();
    std::fs::write(dir.path().join("broken.pdf"), b"not really a pdf").unwrap();
    std::fs::write(dir.path().join("slides.pptx"), b"ignored").unwrap();

    let store = Arc::new(InMemoryVectorStore::default());
    let report =
        ingestor(HashEmbedder::new(), store.clone()).ingest_folder(dir.path()).await.unwrap();

    assert_eq!(report.files.len(), 3);
    assert_eq!(report.ingested(), 1);
    assert_eq!(report.skipped(), 2);
    assert_eq!(report.total_chunks, 1);
    let capm = report.files.iter().find(|f| f.path.ends_with("capm.txt")).unwrap();
    assert_eq!(capm.status, FileStatus::Ingested { chunks: 1 });
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn upload_adds_to_live_collection() {
    let embedder = HashEmbedder::new();
    let store = Arc::new(InMemoryVectorStore::default());
    let ingestor = ingestor(embedder, store.clone());

    let body = "Markowitz portfolio theory. ".repeat(80);
    let outcome = ingestor.upload("markowitz.txt", body.into_bytes()).await;
    assert!(outcome.success, "{}", outcome.message);
    assert!(outcome.chunks_added > 1);
    assert_eq!(
        outcome.message,
        format!("Successfully added {} chunks from markowitz.txt", outcome.chunks_added)
    );
    assert_eq!(store.count().await.unwrap(), outcome.chunks_added);

    let rejected = ingestor.upload("scan.png", vec![1, 2, 3]).await;
    assert!(!rejected.success);
    assert_eq!(rejected.chunks_added, 0);
    assert_eq!(rejected.message, "Unsupported file type. Please upload PDF or TXT files.");

    let empty = ingestor.upload("blank.txt", Vec::new()).await;
    assert!(!empty.success);
    assert_eq!(store.count().await.unwrap(), outcome.chunks_added);
}

#[tokio::test]
async fn model_switch_applies_to_next_turn() {
    let embedder = HashEmbedder::new();
    let store = Arc::new(InMemoryVectorStore::default());
    ingestor(embedder.clone(), store.clone())
        .ingest_document(Document::from_text("sharpe.txt", SHARPE))
        .await
        .unwrap();

    let chat = RecordingChat::answering("ok");
    let mut session = session(embedder, store, chat.clone());
    session.set_model("llama-3.1-8b-instant").unwrap();
    assert!(session.set_model("  ").is_err());
    session.handle("Sharpe?").await.unwrap();

    assert_eq!(chat.requests.lock().unwrap()[0].model, "llama-3.1-8b-instant");
}

#[tokio::test]
async fn blank_message_is_rejected_without_recording() {
    let mut session = session(
        HashEmbedder::new(),
        Arc::new(InMemoryVectorStore::default()),
        RecordingChat::answering("x"),
    );
    assert!(session.handle("   ").await.is_err());
    assert!(session.history().is_empty());
}
