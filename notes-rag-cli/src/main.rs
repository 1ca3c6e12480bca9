use anyhow::Result;
use clap::Parser;
use notes_rag_cli::telemetry::init_tracing;
use notes_rag_cli::{Cli, Command, Settings, commands};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the environment may already be set.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.global.log_json);

    let settings = Settings::from_args(&cli.global)?;
    match cli.command {
        Command::Ingest { data_dir, append } => {
            commands::ingest(&settings, &data_dir, append).await?;
        }
        Command::Chat => commands::chat(&settings).await?,
        Command::Upload { file } => commands::upload(&settings, &file).await?,
        Command::Probe { query } => commands::probe(&settings, query.as_deref()).await?,
    }
    Ok(())
}
