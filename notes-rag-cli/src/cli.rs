//! Command-line arguments.
//!
//! Every global option also reads an environment variable, so a `.env` file
//! loaded at startup can supply the API key and paths.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use notes_rag::config::{DEFAULT_COLLECTION, DEFAULT_MODEL, GROQ_API_BASE};

/// Ask questions about your course notes.
#[derive(Parser, Debug, Clone)]
#[command(name = "notes-rag", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Directory holding the persisted collection
    #[arg(
        long,
        global = true,
        value_name = "DIR",
        env = "NOTES_RAG_VECTORSTORE_DIR",
        default_value = "vectorstore"
    )]
    pub vectorstore_dir: PathBuf,

    /// Collection name
    #[arg(long, global = true, env = "NOTES_RAG_COLLECTION", default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// API key for the chat-completion service
    #[arg(long, global = true, env = "GROQ_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible chat-completion service
    #[arg(
        long,
        global = true,
        value_name = "URL",
        env = "NOTES_RAG_API_BASE",
        default_value = GROQ_API_BASE
    )]
    pub api_base: String,

    /// Generation model used when a chat starts
    #[arg(long, global = true, env = "NOTES_RAG_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Chunks retrieved per question
    #[arg(long, global = true, value_name = "K", default_value_t = 3)]
    pub top_k: usize,

    /// Embedding backend
    #[arg(
        long,
        global = true,
        value_enum,
        env = "NOTES_RAG_EMBEDDER",
        default_value_t = EmbedderKind::Fastembed
    )]
    pub embedder: EmbedderKind,

    /// API key for the `openai` embedder
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub embedding_api_key: Option<String>,

    /// Base URL for the `openai` embedder
    #[arg(long, global = true, value_name = "URL", default_value = "https://api.openai.com/v1")]
    pub embedding_base_url: String,

    /// Model for the `openai` embedder
    #[arg(long, global = true, default_value = "text-embedding-3-small")]
    pub embedding_model: String,

    /// Use a Qdrant server instead of the local collection file
    #[arg(long, global = true, value_name = "URL", env = "QDRANT_URL")]
    pub qdrant_url: Option<String>,

    /// Tesseract language set for OCR
    #[arg(long, global = true, default_value = "ita+eng")]
    pub ocr_languages: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Embedding backends selectable from the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedderKind {
    /// Local multilingual MiniLM
    Fastembed,
    /// OpenAI-compatible embeddings endpoint
    Openai,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build the collection from a folder of notes
    Ingest {
        /// Folder scanned recursively for pdf, image and txt files
        #[arg(long, value_name = "DIR", default_value = "data/appunti")]
        data_dir: PathBuf,

        /// Add to the existing collection instead of rebuilding it
        #[arg(long)]
        append: bool,
    },
    /// Ask questions interactively
    Chat,
    /// Add one pdf or txt file to the collection
    Upload {
        file: PathBuf,
    },
    /// Check the collection and optionally run a test query
    Probe {
        query: Option<String>,
    },
}
