pub mod card_service;
pub mod commands;
pub mod error;
pub mod generation;
pub mod models;
pub mod session;
pub mod spaced_repetition;
pub mod storage;

pub use card_service::CardService;
pub use error::{Result, SrsError};
pub use models::{AppSettings, CardDraft, CardStatus, Rating, ReviewItem};
pub use session::{DeckKind, ReviewSession};
pub use spaced_repetition::SpacedRepetition;
pub use storage::{CardStore, MemoryStore, Storage};

use clap::Parser;
use commands::Cli;

/// Entry point for the command-line front end.
pub fn run() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let service = CardService::new(Storage::new(cli.data_dir)?)?;
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    commands::execute(&service, cli.command, chrono::Utc::now(), stdin.lock(), &mut stdout)
}
