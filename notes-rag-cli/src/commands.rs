//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use notes_rag::{
    AnswerGenerator, FileStatus, IngestReport, Ingestor, OpenAiCompatibleChat, ResourceCache,
    ResourceLoader, Retriever, SearchResult, SessionController, SharedResources,
};
use tracing::info;

use crate::console::Console;
use crate::settings::Settings;

/// Characters of chunk text shown per probe hit.
pub const PREVIEW_CHARS: usize = 200;

/// Rebuild (or extend, with `append`) the collection from `data_dir`.
pub async fn ingest(settings: &Settings, data_dir: &Path, append: bool) -> Result<IngestReport> {
    let resources = load(settings, true).await?;
    if !append {
        let previous = resources.store.count().await?;
        resources.store.reset().await?;
        info!(collection = resources.store.collection(), removed = previous, "collection reset");
    }

    let ingestor = ingestor(settings, &resources)?;
    let report = ingestor.ingest_folder(data_dir).await?;
    print!("{}", render_report(&report));
    println!(
        "Collection '{}' now holds {} chunks",
        resources.store.collection(),
        resources.store.count().await?
    );
    Ok(report)
}

/// Add a single pdf or txt file to the collection.
pub async fn upload(settings: &Settings, file: &Path) -> Result<()> {
    let resources = load(settings, true).await?;
    let outcome = upload_file(&ingestor(settings, &resources)?, file).await?;
    println!("{}", outcome.message);
    if !outcome.success {
        bail!("upload failed");
    }
    Ok(())
}

/// Print the record count and, for `query`, the top three hits.
pub async fn probe(settings: &Settings, query: Option<&str>) -> Result<()> {
    let resources = load(settings, false).await?;
    let count = resources.store.count().await?;
    println!("Collection '{}': {count} chunks", resources.store.collection());

    if let Some(query) = query {
        let embedding = resources.embedder.embed(query).await?;
        let hits = resources.store.query(&embedding, 3).await?;
        println!("Top {} results for {query:?}:", hits.len());
        for (rank, hit) in hits.iter().enumerate() {
            print!("{}", render_hit(rank + 1, hit));
        }
    }
    Ok(())
}

/// Start the interactive chat loop.
pub async fn chat(settings: &Settings) -> Result<()> {
    let api_key = settings.require_api_key()?;
    let cache = ResourceCache::new(Arc::new(settings.loader(false)));
    let resources = cache.get_or_init().await.context("cannot open the notes collection")?;

    let chat = OpenAiCompatibleChat::new(api_key, &settings.config.generation)?;
    let generator = AnswerGenerator::new(Arc::new(chat), settings.config.generation.clone());
    let session = SessionController::new(retriever(settings, &resources), generator);

    let mut console = Console::new(settings.clone(), cache, session);
    console.run().await
}

pub(crate) async fn load(settings: &Settings, create: bool) -> Result<Arc<SharedResources>> {
    let loader = settings.loader(create);
    let embedder = loader.load_embedder().await.context("cannot load the embedding model")?;
    let store = loader
        .load_store(embedder.dimensions())
        .await
        .context("cannot open the notes collection")?;
    Ok(Arc::new(SharedResources { embedder, store }))
}

pub(crate) fn retriever(settings: &Settings, resources: &SharedResources) -> Retriever {
    Retriever::new(resources.embedder.clone(), resources.store.clone(), settings.config.top_k)
}

pub(crate) fn ingestor(settings: &Settings, resources: &SharedResources) -> Result<Ingestor> {
    Ok(Ingestor::new(
        &settings.config,
        settings.extractor(),
        resources.embedder.clone(),
        resources.store.clone(),
    )?)
}

pub(crate) async fn upload_file(
    ingestor: &Ingestor,
    file: &Path,
) -> Result<notes_rag::UploadOutcome> {
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("'{}' is not a file name", file.display()))?;
    let content =
        tokio::fs::read(file).await.with_context(|| format!("cannot read '{}'", file.display()))?;
    Ok(ingestor.upload(name, content).await)
}

/// One line per file plus a total.
pub fn render_report(report: &IngestReport) -> String {
    let mut out = String::new();
    for file in &report.files {
        let name = file.path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        match &file.status {
            FileStatus::Ingested { chunks } => {
                out.push_str(&format!("  {name}: {chunks} chunks\n"));
            }
            FileStatus::Skipped { reason } => {
                out.push_str(&format!("  {name}: skipped ({reason})\n"));
            }
        }
    }
    out.push_str(&format!(
        "Ingested {} files, skipped {}, {} chunks total\n",
        report.ingested(),
        report.skipped(),
        report.total_chunks
    ));
    out
}

/// A numbered probe hit with source, type, score and a text preview.
pub fn render_hit(rank: usize, hit: &SearchResult) -> String {
    let metadata = &hit.record.metadata;
    let preview: String = hit.record.text.chars().take(PREVIEW_CHARS).collect();
    let ellipsis = if hit.record.text.chars().count() > PREVIEW_CHARS { "..." } else { "" };
    format!(
        "{rank}. {} [{}] score {:.3}\n   {}{ellipsis}\n",
        metadata.source,
        metadata.kind.as_str(),
        hit.score,
        preview.replace('\n', " ")
    )
}
