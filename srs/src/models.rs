use crate::error::{Result, SrsError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// A flashcard together with its SM-2 scheduling state.
///
/// Field names follow the camelCase layout the web client writes, so a
/// collection exported from the browser loads as-is. Every field is
/// required; a record missing one fails to deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub id: String,
    pub front: String,
    pub back: String,
    pub topic: String,
    pub status: CardStatus,
    pub next_review: DateTime<Utc>,
    pub interval: u32,    // days
    pub ease_factor: f64, // SM-2 ease factor
    pub repetitions: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    New,
    Learning,
    Review,
    // Reserved for a long-interval promotion rule; nothing produces it yet.
    Graduated,
}

impl CardStatus {
    pub fn is_new(self) -> bool {
        self == CardStatus::New
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardStatus::New => "new",
            CardStatus::Learning => "learning",
            CardStatus::Review => "review",
            CardStatus::Graduated => "graduated",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Rating {
    Hard = 0, // Failed or struggled, start over
    Good = 1, // Normal recall
    Easy = 2, // Effortless recall
}

impl Rating {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Rating::Hard),
            1 => Ok(Rating::Good),
            2 => Ok(Rating::Easy),
            _ => Err(SrsError::invalid(format!("Invalid rating value: {}", value))),
        }
    }
}

impl FromStr for Rating {
    type Err = SrsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hard" => Ok(Rating::Hard),
            "good" => Ok(Rating::Good),
            "easy" => Ok(Rating::Easy),
            other => Err(SrsError::invalid(format!("Invalid rating: '{}' (expected hard, good or easy)", other))),
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        };
        f.write_str(name)
    }
}

/// Card content produced by the external generator, before it has any
/// scheduling state.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CardDraft {
    pub front: String,
    pub back: String,
    pub topic: String,
}

impl CardDraft {
    pub fn validate(&self) -> Result<()> {
        if self.front.trim().is_empty() {
            return Err(SrsError::invalid("Card draft has an empty front"));
        }
        if self.back.trim().is_empty() {
            return Err(SrsError::invalid("Card draft has an empty back"));
        }
        if self.topic.trim().is_empty() {
            return Err(SrsError::invalid("Card draft has an empty topic"));
        }
        Ok(())
    }
}

impl ReviewItem {
    /// A brand-new card, available for first-time learning immediately.
    pub fn from_draft(draft: CardDraft, now: DateTime<Utc>) -> Self {
        ReviewItem {
            id: Uuid::new_v4().to_string(),
            front: draft.front,
            back: draft.back,
            topic: draft.topic,
            status: CardStatus::New,
            next_review: now,
            interval: 0,
            ease_factor: DEFAULT_EASE_FACTOR,
            repetitions: 0,
        }
    }

    /// Checks the numeric invariants serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(SrsError::invalid("Card has an empty id"));
        }
        if !self.ease_factor.is_finite() {
            return Err(SrsError::invalid(format!("Card {} has a non-finite ease factor", self.id)));
        }
        if self.ease_factor < MIN_EASE_FACTOR {
            return Err(SrsError::invalid(format!(
                "Card {} has ease factor {} below the minimum of {}",
                self.id, self.ease_factor, MIN_EASE_FACTOR
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewStats {
    pub total_cards: usize,
    pub cards_due: usize,
    pub cards_new: usize,
    pub cards_review: usize,
    pub cards_mature: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicStats {
    pub name: String,
    pub total_cards: usize,
    pub cards_due: usize,
    pub cards_new: usize,
    pub cards_mature: usize,
}

#[derive(Debug, Default, Clone)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// How many of the highest-ranked topics a generation request covers.
    pub topics_per_generation: usize,
    pub cards_per_generation: usize,
    /// Upper bound on cards in a single learn or review session.
    pub session_limit: Option<usize>,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            topics_per_generation: 3,
            cards_per_generation: 10,
            session_limit: None,
        }
    }
}

impl AppSettings {
    pub fn validate(&self) -> Result<()> {
        if self.topics_per_generation == 0 || self.cards_per_generation == 0 {
            return Err(SrsError::invalid("Generation settings must be at least 1"));
        }
        if self.session_limit == Some(0) {
            return Err(SrsError::invalid("Session limit must be at least 1"));
        }
        Ok(())
    }
}
