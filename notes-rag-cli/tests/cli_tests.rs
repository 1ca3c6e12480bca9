use std::path::{Path, PathBuf};

use clap::Parser;
use notes_rag::{
    Chunk, DocumentKind, EmbeddingBackend, FileReport, FileStatus, IngestReport, SearchResult,
    StoreBackend, VectorRecord,
};
use notes_rag_cli::commands::{render_hit, render_report};
use notes_rag_cli::console::{Input, render_answer, render_models};
use notes_rag_cli::{Cli, Command, EmbedderKind, Settings};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("notes-rag").chain(args.iter().copied())).unwrap()
}

#[test]
fn ingest_defaults_to_rebuilding_the_notes_folder() {
    let cli = parse(&["ingest"]);
    match cli.command {
        Command::Ingest { data_dir, append } => {
            assert_eq!(data_dir, PathBuf::from("data/appunti"));
            assert!(!append);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn global_flags_are_accepted_after_the_subcommand() {
    let cli = parse(&[
        "probe",
        "What is the Sharpe ratio?",
        "--vectorstore-dir",
        "/tmp/store",
        "--top-k",
        "5",
        "--model",
        "llama-3.1-8b-instant",
    ]);
    assert!(matches!(
        cli.command,
        Command::Probe { query: Some(ref q) } if q == "What is the Sharpe ratio?"
    ));
    assert_eq!(cli.global.vectorstore_dir, PathBuf::from("/tmp/store"));

    let settings = Settings::from_args(&cli.global).unwrap();
    assert_eq!(settings.config.top_k, 5);
    assert_eq!(settings.config.generation.model, "llama-3.1-8b-instant");
    assert_eq!(settings.config.vectorstore_dir, PathBuf::from("/tmp/store"));
}

#[test]
fn loader_prefers_qdrant_when_a_url_is_given() {
    let cli = parse(&["chat", "--qdrant-url", "http://localhost:6334"]);
    let settings = Settings::from_args(&cli.global).unwrap();
    let loader = settings.loader(false);
    assert_eq!(loader.store, StoreBackend::Qdrant { url: "http://localhost:6334".into() });
}

#[test]
fn file_loader_honours_create_flag() {
    let cli = parse(&["chat", "--qdrant-url", "", "--vectorstore-dir", "vs"]);
    let settings = Settings::from_args(&cli.global).unwrap();
    assert_eq!(
        settings.loader(true).store,
        StoreBackend::File { dir: PathBuf::from("vs"), create: true }
    );
    assert_eq!(settings.loader(false).collection, "appunti_corso");
}

#[test]
fn openai_embedder_requires_a_key() {
    let cli = parse(&["probe", "--embedder", "openai", "--embedding-api-key", " "]);
    assert_eq!(cli.global.embedder, EmbedderKind::Openai);
    assert!(Settings::from_args(&cli.global).is_err());

    let cli = parse(&["probe", "--embedder", "openai", "--embedding-api-key", "sk-test"]);
    let settings = Settings::from_args(&cli.global).unwrap();
    assert!(matches!(
        settings.embedding,
        EmbeddingBackend::OpenAi { ref api_key, .. } if api_key == "sk-test"
    ));
}

#[test]
fn invalid_top_k_is_a_configuration_error() {
    let cli = parse(&["chat", "--top-k", "0"]);
    assert!(Settings::from_args(&cli.global).is_err());
}

#[test]
fn blank_api_key_counts_as_missing() {
    let cli = parse(&["chat", "--api-key", "  "]);
    let settings = Settings::from_args(&cli.global).unwrap();
    assert!(settings.require_api_key().is_err());
}

#[test]
fn slash_commands_are_parsed() {
    assert_eq!(Input::parse("  "), Input::Empty);
    assert_eq!(Input::parse("/clear"), Input::Clear);
    assert_eq!(Input::parse("/models"), Input::Models);
    assert_eq!(Input::parse("/quit"), Input::Quit);
    assert_eq!(
        Input::parse("/model  llama-3.1-8b-instant "),
        Input::Model("llama-3.1-8b-instant".into())
    );
    assert_eq!(
        Input::parse("/upload notes/week 3.pdf"),
        Input::Upload(PathBuf::from("notes/week 3.pdf"))
    );
    assert!(matches!(Input::parse("/model"), Input::Invalid(_)));
    assert!(matches!(Input::parse("/frobnicate"), Input::Invalid(_)));
    assert_eq!(Input::parse("What is CAPM?"), Input::Question("What is CAPM?".into()));
}

#[test]
fn model_list_marks_the_active_model() {
    let list = render_models("llama-3.1-8b-instant");
    assert!(list.contains("* llama-3.1-8b-instant\n"));
    assert!(list.contains("  llama-3.3-70b-versatile\n"));
}

#[test]
fn answers_list_sources_only_when_present() {
    assert_eq!(render_answer("No idea.", &[]), "No idea.\n");
    let rendered = render_answer("Beta is risk.", &["a.pdf".into(), "b.txt".into()]);
    assert!(rendered.ends_with("Sources: a.pdf, b.txt\n"));
}

#[test]
fn report_lists_each_file() {
    let report = IngestReport {
        files: vec![
            FileReport {
                path: Path::new("data/lezione1.pdf").into(),
                status: FileStatus::Ingested { chunks: 4 },
            },
            FileReport {
                path: Path::new("data/scan.png").into(),
                status: FileStatus::Skipped { reason: "no text extracted".into() },
            },
        ],
        total_chunks: 4,
    };
    let rendered = render_report(&report);
    assert!(rendered.contains("  lezione1.pdf: 4 chunks\n"));
    assert!(rendered.contains("  scan.png: skipped (no text extracted)\n"));
    assert!(rendered.ends_with("Ingested 1 files, skipped 1, 4 chunks total\n"));
}

#[test]
fn probe_hit_preview_is_truncated() {
    let chunk = Chunk {
        text: "x".repeat(300),
        source: "lezione2.pdf".into(),
        index: 0,
        kind: DocumentKind::Pdf,
    };
    let hit = SearchResult { record: VectorRecord::from_chunk("id", chunk, vec![1.0]), score: 0.5 };
    let rendered = render_hit(1, &hit);
    assert!(rendered.starts_with("1. lezione2.pdf [pdf] score 0.500\n"));
    assert!(rendered.contains(&format!("{}...", "x".repeat(200))));
    assert!(!rendered.contains(&"x".repeat(201)));
}
