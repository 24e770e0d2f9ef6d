use crate::error::{Result, SrsError};
use crate::models::{AppSettings, ReviewItem};
use log::{debug, warn};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const CARDS_FILE: &str = "cards.json";
pub const SETTINGS_FILE: &str = "settings.json";
pub const DATA_DIR_NAME: &str = "foco-srs";

/// Where the card collection lives between sessions.
///
/// Implementations hand back exactly what they were given: order, ids,
/// fractional ease factors and full-precision timestamps all survive a
/// save/load cycle.
pub trait CardStore: Send + Sync {
    fn load_cards(&self) -> Result<Vec<ReviewItem>>;
    fn save_cards(&self, cards: &[ReviewItem]) -> Result<()>;
    fn load_settings(&self) -> Result<AppSettings>;
    fn save_settings(&self, settings: &AppSettings) -> Result<()>;
}

/// Reject a collection that breaks the item invariants or reuses an id.
pub fn validate_collection(cards: &[ReviewItem]) -> Result<()> {
    let mut seen = HashSet::new();
    for card in cards {
        card.validate()?;
        if !seen.insert(card.id.as_str()) {
            return Err(SrsError::invalid(format!("Duplicate card id: {}", card.id)));
        }
    }
    Ok(())
}

/// Parse and validate a JSON array of stored cards.
pub fn parse_items(json: &str) -> Result<Vec<ReviewItem>> {
    let cards: Vec<ReviewItem> = serde_json::from_str(json)?;
    validate_collection(&cards)?;
    Ok(cards)
}

pub struct Storage {
    data_file: PathBuf,
    settings_file: PathBuf,
}

impl Storage {
    /// Open the store in `data_dir`, or the platform data directory when none is given.
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };

        std::fs::create_dir_all(&data_dir)?;
        Ok(Storage::new_with_path(data_dir.join(CARDS_FILE)))
    }

    /// Store cards at `data_file`; settings go next to it.
    pub fn new_with_path(data_file: PathBuf) -> Self {
        let settings_file = data_file
            .parent()
            .map(|dir| dir.join(SETTINGS_FILE))
            .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE));

        Storage { data_file, settings_file }
    }

    pub fn get_data_file_path(&self) -> &PathBuf {
        &self.data_file
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(DATA_DIR_NAME))
        .ok_or_else(|| SrsError::invalid("Failed to get app data directory"))
}

impl CardStore for Storage {
    fn load_cards(&self) -> Result<Vec<ReviewItem>> {
        if !self.data_file.exists() {
            debug!("No card file at {}, starting empty", self.data_file.display());
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.data_file)?);
        let cards: Vec<ReviewItem> = serde_json::from_reader(reader).map_err(|e| {
            warn!("Rejected card file {}: {}", self.data_file.display(), e);
            e
        })?;
        validate_collection(&cards)?;

        debug!("Loaded {} cards from {}", cards.len(), self.data_file.display());
        Ok(cards)
    }

    fn save_cards(&self, cards: &[ReviewItem]) -> Result<()> {
        write_json(&self.data_file, cards)
    }

    fn load_settings(&self) -> Result<AppSettings> {
        if !self.settings_file.exists() {
            return Ok(AppSettings::default());
        }

        let reader = BufReader::new(File::open(&self.settings_file)?);
        let settings: AppSettings = serde_json::from_reader(reader)?;
        settings.validate()?;
        Ok(settings)
    }

    fn save_settings(&self, settings: &AppSettings) -> Result<()> {
        write_json(&self.settings_file, settings)
    }
}

/// Write to a sibling `.tmp` file, then rename it over `path`.
fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(value)?;
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Keeps everything in memory. Used by tests and by hosts that persist elsewhere.
#[derive(Default)]
pub struct MemoryStore {
    cards: Mutex<Vec<ReviewItem>>,
    settings: Mutex<AppSettings>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cards(cards: Vec<ReviewItem>) -> Self {
        MemoryStore {
            cards: Mutex::new(cards),
            settings: Mutex::new(AppSettings::default()),
        }
    }
}

impl CardStore for MemoryStore {
    fn load_cards(&self) -> Result<Vec<ReviewItem>> {
        let cards = self.cards.lock().map_err(|_| SrsError::Lock("stored cards"))?;
        validate_collection(&cards)?;
        Ok(cards.clone())
    }

    fn save_cards(&self, cards: &[ReviewItem]) -> Result<()> {
        let mut stored = self.cards.lock().map_err(|_| SrsError::Lock("stored cards"))?;
        *stored = cards.to_vec();
        Ok(())
    }

    fn load_settings(&self) -> Result<AppSettings> {
        let settings = self.settings.lock().map_err(|_| SrsError::Lock("stored settings"))?;
        settings.validate()?;
        Ok(settings.clone())
    }

    fn save_settings(&self, settings: &AppSettings) -> Result<()> {
        let mut stored = self.settings.lock().map_err(|_| SrsError::Lock("stored settings"))?;
        *stored = settings.clone();
        Ok(())
    }
}
