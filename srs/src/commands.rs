use crate::card_service::CardService;
use crate::error::Result;
use crate::generation::DraftFile;
use crate::models::{Rating, ReviewItem, SearchRequest};
use crate::session::{DeckKind, ReviewSession};
use crate::storage::parse_items;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "foco-srs", version, about = "Spaced repetition for exam flashcards")]
pub struct Cli {
    /// Directory holding cards.json and settings.json
    #[arg(long, env = "FOCO_SRS_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List graded cards whose review date has arrived
    Due,
    /// List cards that have never been graded
    New,
    /// Grade a card as hard, good or easy
    Grade { id: String, rating: String },
    /// Go through the learn or review deck one card at a time
    Study {
        #[arg(long, value_enum, default_value = "review")]
        deck: DeckKind,
    },
    /// Add new cards from a file written by the card generator
    Generate {
        #[arg(long)]
        from: PathBuf,
        /// Topics in priority order; may be repeated
        #[arg(long = "topic")]
        topics: Vec<String>,
    },
    /// Append cards exported from another session
    Import { path: PathBuf },
    Stats,
    Topics,
    Search {
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        topic: Option<String>,
    },
    Delete { id: String },
    /// Show or change settings
    Settings {
        #[arg(long)]
        topics_per_generation: Option<usize>,
        #[arg(long)]
        cards_per_generation: Option<usize>,
        #[arg(long, conflicts_with = "no_session_limit")]
        session_limit: Option<usize>,
        /// Remove the cap on session size
        #[arg(long)]
        no_session_limit: bool,
    },
}

/// Run one command against the service. `input` is only read by `study`.
pub fn execute<R: BufRead, W: Write>(
    service: &CardService,
    command: Command,
    now: DateTime<Utc>,
    input: R,
    out: &mut W,
) -> Result<()> {
    match command {
        Command::Due => {
            let due = service.due_cards(now)?;
            if due.is_empty() {
                writeln!(out, "No cards due for review")?;
            }
            write_cards(out, &due)?;
        }
        Command::New => {
            let new = service.new_cards()?;
            if new.is_empty() {
                writeln!(out, "No new cards")?;
            }
            write_cards(out, &new)?;
        }
        Command::Grade { id, rating } => {
            let rating: Rating = rating.parse()?;
            let card = service.review_card(&id, rating, now)?;
            writeln!(
                out,
                "{}: next review in {} day(s) at {} (ease {:.2})",
                card.id,
                card.interval,
                card.next_review.to_rfc3339(),
                card.ease_factor
            )?;
        }
        Command::Study { deck } => study(service, deck, now, input, out)?,
        Command::Generate { from, topics } => {
            let created = service.generate_cards(&DraftFile::new(from), &topics, now)?;
            writeln!(out, "Added {} new cards", created.len())?;
        }
        Command::Import { path } => {
            let items = parse_items(&std::fs::read_to_string(path)?)?;
            let count = service.import_items(items)?;
            writeln!(out, "Imported {} cards", count)?;
        }
        Command::Stats => {
            let stats = service.get_review_stats(now)?;
            writeln!(
                out,
                "total {}  due {}  new {}  review {}  mature {}",
                stats.total_cards, stats.cards_due, stats.cards_new, stats.cards_review, stats.cards_mature
            )?;
            for topic in service.get_topic_stats(now)? {
                writeln!(
                    out,
                    "  {}: total {}  due {}  new {}  mature {}",
                    topic.name, topic.total_cards, topic.cards_due, topic.cards_new, topic.cards_mature
                )?;
            }
        }
        Command::Topics => {
            for topic in service.get_topics()? {
                writeln!(out, "{}", topic)?;
            }
        }
        Command::Search { query, topic } => {
            let found = service.search_cards(&SearchRequest { query, topic })?;
            write_cards(out, &found)?;
        }
        Command::Delete { id } => {
            service.delete_card(&id)?;
            writeln!(out, "Deleted {}", id)?;
        }
        Command::Settings {
            topics_per_generation,
            cards_per_generation,
            session_limit,
            no_session_limit,
        } => {
            let mut settings = service.get_settings()?;
            let changed = topics_per_generation.is_some()
                || cards_per_generation.is_some()
                || session_limit.is_some()
                || no_session_limit;

            if let Some(value) = topics_per_generation {
                settings.topics_per_generation = value;
            }
            if let Some(value) = cards_per_generation {
                settings.cards_per_generation = value;
            }
            if session_limit.is_some() {
                settings.session_limit = session_limit;
            }
            if no_session_limit {
                settings.session_limit = None;
            }
            if changed {
                settings = service.update_settings(settings)?;
            }

            writeln!(out, "topics_per_generation = {}", settings.topics_per_generation)?;
            writeln!(out, "cards_per_generation = {}", settings.cards_per_generation)?;
            match settings.session_limit {
                Some(limit) => writeln!(out, "session_limit = {}", limit)?,
                None => writeln!(out, "session_limit = none")?,
            }
        }
    }

    Ok(())
}

/// Show each card's front, wait for a line, show the back, then read ratings
/// until one parses. Stops early at end of input.
fn study<R: BufRead, W: Write>(
    service: &CardService,
    deck: DeckKind,
    now: DateTime<Utc>,
    mut input: R,
    out: &mut W,
) -> Result<()> {
    let mut session = ReviewSession::start(service, deck, now)?;
    if session.is_empty() {
        writeln!(out, "Nothing to study in the {} deck", deck)?;
        return Ok(());
    }

    let mut graded = 0;
    let mut line = String::new();
    'cards: while let Some(card) = session.current(service)? {
        writeln!(out, "[{}] {}\n  {}", session.progress(), card.topic, card.front)?;
        write!(out, "(enter to show answer) ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        session.flip();
        writeln!(out, "  {}", card.back)?;

        loop {
            write!(out, "hard / good / easy: ")?;
            out.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                break 'cards;
            }
            match line.parse::<Rating>() {
                Ok(rating) => {
                    let updated = session.rate(service, rating, now)?;
                    writeln!(out, "  next review in {} day(s)", updated.interval)?;
                    graded += 1;
                    break;
                }
                Err(e) => writeln!(out, "  {}", e)?,
            }
        }
    }

    writeln!(out, "Graded {} of {} cards", graded, session.len())?;
    Ok(())
}

fn write_cards<W: Write>(out: &mut W, cards: &[ReviewItem]) -> Result<()> {
    for card in cards {
        writeln!(
            out,
            "{}  [{}] {}  ({}, interval {}d, next {})",
            card.id,
            card.topic,
            card.front,
            card.status,
            card.interval,
            card.next_review.format("%Y-%m-%d %H:%M")
        )?;
    }
    Ok(())
}
