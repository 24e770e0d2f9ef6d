//! Boundary with the external card generator.
//!
//! The generator is an AI service that turns topic labels into card text.
//! Its output is untrusted JSON, so everything passes through
//! [`parse_drafts`] before it can become a [`ReviewItem`].

use crate::error::{Result, SrsError};
use crate::models::CardDraft;
use log::warn;
use std::fs;
use std::path::PathBuf;

pub trait CardGenerator {
    /// Produce up to `count` drafts covering `topics`.
    fn generate(&self, topics: &[String], count: usize) -> Result<Vec<CardDraft>>;
}

/// Parse a JSON array of drafts, rejecting the whole batch if any record is malformed.
pub fn parse_drafts(json: &str) -> Result<Vec<CardDraft>> {
    let drafts: Vec<CardDraft> = serde_json::from_str(json)?;

    for (index, draft) in drafts.iter().enumerate() {
        draft.validate().map_err(|e| {
            warn!("Rejected generated card #{}: {}", index, e);
            SrsError::invalid(format!("Generated card #{}: {}", index, e))
        })?;
    }

    Ok(drafts)
}

/// Reads drafts the generator already wrote to disk.
pub struct DraftFile {
    path: PathBuf,
}

impl DraftFile {
    pub fn new(path: PathBuf) -> Self {
        DraftFile { path }
    }
}

impl CardGenerator for DraftFile {
    fn generate(&self, topics: &[String], count: usize) -> Result<Vec<CardDraft>> {
        let json = fs::read_to_string(&self.path)?;
        let drafts = parse_drafts(&json)?;

        Ok(drafts
            .into_iter()
            .filter(|draft| topics.is_empty() || topics.iter().any(|topic| topic == &draft.topic))
            .take(count)
            .collect())
    }
}
