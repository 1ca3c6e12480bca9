//! Command-line front end for the course notes assistant.
//!
//! The `notes-rag` binary has four subcommands: `ingest` builds the
//! collection from a folder, `chat` starts the interactive loop, `upload`
//! adds a single file and `probe` checks the collection.

pub mod cli;
pub mod commands;
pub mod console;
pub mod settings;
pub mod telemetry;

pub use cli::{Cli, Command, EmbedderKind, GlobalArgs};
pub use settings::Settings;
