//! Interactive question-and-answer loop.

use std::path::PathBuf;

use anyhow::Result;
use notes_rag::{AVAILABLE_MODELS, ResourceCache, SessionController};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{error, info};

use crate::commands;
use crate::settings::Settings;

pub const HELP: &str = "\
Commands:
  /clear          forget the conversation so far
  /model <id>     switch the generation model
  /models         list known models
  /upload <path>  add a pdf or txt file to the notes
  /help           show this help
  /quit           leave
Anything else is a question about the notes.";

/// A line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Question(String),
    Clear,
    Model(String),
    Models,
    Upload(PathBuf),
    Help,
    Quit,
    Empty,
    /// A slash command that was not recognized or is missing its argument.
    Invalid(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Self::Question(line.to_string());
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };
        match (name, arg) {
            ("clear", _) => Self::Clear,
            ("models", _) => Self::Models,
            ("help", _) => Self::Help,
            ("quit" | "exit", _) => Self::Quit,
            ("model", "") => Self::Invalid("usage: /model <id>".to_string()),
            ("model", id) => Self::Model(id.to_string()),
            ("upload", "") => Self::Invalid("usage: /upload <path>".to_string()),
            ("upload", path) => Self::Upload(PathBuf::from(path)),
            _ => Self::Invalid(format!("unknown command /{name}; try /help")),
        }
    }
}

/// The model list with the active one marked.
pub fn render_models(current: &str) -> String {
    AVAILABLE_MODELS
        .iter()
        .map(|m| if *m == current { format!("* {m}\n") } else { format!("  {m}\n") })
        .collect()
}

/// Formats an answer and its sources for the terminal.
pub fn render_answer(answer: &str, sources: &[String]) -> String {
    if sources.is_empty() {
        format!("{answer}\n")
    } else {
        format!("{answer}\n\nSources: {}\n", sources.join(", "))
    }
}

/// Reads lines, dispatches slash commands and sends questions to the session.
pub struct Console {
    settings: Settings,
    cache: ResourceCache,
    session: SessionController,
}

impl Console {
    pub fn new(settings: Settings, cache: ResourceCache, session: SessionController) -> Self {
        Self { settings, cache, session }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut editor = DefaultEditor::new()?;
        println!(
            "Course notes assistant. Model: {}. Type /help for commands.",
            self.session.model()
        );

        loop {
            let line = match editor.readline("> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            };
            let _ = editor.add_history_entry(line.as_str());

            match Input::parse(&line) {
                Input::Empty => {}
                Input::Quit => break,
                Input::Help => println!("{HELP}"),
                Input::Invalid(message) => println!("{message}"),
                Input::Clear => {
                    self.session.reset();
                    println!("Conversation cleared.");
                }
                Input::Models => print!("{}", render_models(self.session.model())),
                Input::Model(id) => match self.session.set_model(&id) {
                    Ok(()) => println!("Model set to {}", self.session.model()),
                    Err(e) => println!("{e}"),
                },
                Input::Upload(path) => self.upload(&path).await,
                Input::Question(question) => match self.session.handle(&question).await {
                    Ok(outcome) => print!("{}", render_answer(&outcome.answer, &outcome.sources)),
                    Err(e) => {
                        error!(error = %e, "turn failed");
                        println!("Error: {e}");
                    }
                },
            }
        }
        Ok(())
    }

    /// Add a file, then reload the shared resources so the session reads
    /// the updated collection.
    async fn upload(&mut self, path: &std::path::Path) {
        let resources = match self.cache.get_or_init().await {
            Ok(resources) => resources,
            Err(e) => {
                println!("Error: {e}");
                return;
            }
        };
        let outcome = match commands::ingestor(&self.settings, &resources) {
            Ok(ingestor) => commands::upload_file(&ingestor, path).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(outcome) => {
                println!("{}", outcome.message);
                if !outcome.success {
                    return;
                }
            }
            Err(e) => {
                println!("Error: {e:#}");
                return;
            }
        }

        self.cache.invalidate().await;
        match self.cache.get_or_init().await {
            Ok(resources) => {
                self.session.set_retriever(commands::retriever(&self.settings, &resources));
                info!("session now reads the updated collection");
            }
            Err(e) => println!("Error reloading the collection: {e}"),
        }
    }
}
