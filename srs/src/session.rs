use crate::card_service::CardService;
use crate::error::{Result, SrsError};
use crate::models::{Rating, ReviewItem};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use log::debug;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeckKind {
    /// Cards never graded
    Learn,
    /// Graded cards whose review date has arrived
    Review,
}

impl DeckKind {
    pub fn other(self) -> Self {
        match self {
            DeckKind::Learn => DeckKind::Review,
            DeckKind::Review => DeckKind::Learn,
        }
    }
}

impl fmt::Display for DeckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckKind::Learn => f.write_str("learning"),
            DeckKind::Review => f.write_str("reviewing"),
        }
    }
}

/// Walks through one deck a card at a time.
///
/// The deck is fixed when the session starts: grading a card moves it out
/// of the new or due set, but it stays in this session's order so the
/// cursor never skips the card after it.
#[derive(Debug, Clone)]
pub struct ReviewSession {
    kind: DeckKind,
    deck: Vec<String>,
    position: usize,
    flipped: bool,
}

impl ReviewSession {
    pub fn start(service: &CardService, kind: DeckKind, now: DateTime<Utc>) -> Result<Self> {
        let cards = match kind {
            DeckKind::Learn => service.new_cards()?,
            DeckKind::Review => service.due_cards(now)?,
        };

        let mut deck: Vec<String> = cards.into_iter().map(|card| card.id).collect();
        if let Some(limit) = service.get_settings()?.session_limit {
            deck.truncate(limit);
        }

        debug!("Started {} session with {} cards", kind, deck.len());
        Ok(ReviewSession {
            kind,
            deck,
            position: 0,
            flipped: false,
        })
    }

    /// Start over on the other deck.
    pub fn switch_mode(&self, service: &CardService, now: DateTime<Utc>) -> Result<Self> {
        Self::start(service, self.kind.other(), now)
    }

    pub fn kind(&self) -> DeckKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.deck.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deck.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.position >= self.deck.len()
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn current(&self, service: &CardService) -> Result<Option<ReviewItem>> {
        match self.deck.get(self.position) {
            Some(id) => service
                .get_card(id)?
                .map(Some)
                .ok_or_else(|| SrsError::NotFound(id.clone())),
            None => Ok(None),
        }
    }

    /// Show the other face of the current card.
    pub fn flip(&mut self) {
        if !self.is_complete() {
            self.flipped = !self.flipped;
        }
    }

    /// Grade the current card and move on to the next one.
    pub fn rate(&mut self, service: &CardService, rating: Rating, now: DateTime<Utc>) -> Result<ReviewItem> {
        let id = self
            .deck
            .get(self.position)
            .ok_or_else(|| SrsError::invalid("Session is already complete"))?;
        if !self.flipped {
            return Err(SrsError::invalid("Flip the card before rating it"));
        }

        let graded = service.review_card(id, rating, now)?;
        self.flipped = false;
        self.position += 1;
        Ok(graded)
    }

    /// "3 / 10" style counter for the card currently shown.
    pub fn progress(&self) -> String {
        format!("{} / {}", (self.position + 1).min(self.deck.len()), self.deck.len())
    }
}
