use crate::error::{Result, SrsError};
use crate::generation::CardGenerator;
use crate::models::{AppSettings, Rating, ReviewItem, ReviewStats, SearchRequest, TopicStats};
use crate::spaced_repetition::SpacedRepetition;
use crate::storage::{validate_collection, CardStore};
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Owns the card collection for a session and writes it back after every change.
///
/// Changes are staged on a copy and only committed in memory once the store
/// accepted them, so a failed save leaves the session as it was.
pub struct CardService {
    cards: Mutex<Vec<ReviewItem>>,
    settings: Mutex<AppSettings>,
    storage: Box<dyn CardStore>,
}

impl CardService {
    pub fn new(storage: impl CardStore + 'static) -> Result<Self> {
        let cards = storage.load_cards()?;
        let settings = storage.load_settings()?;
        info!("Card service started with {} cards", cards.len());
        Ok(CardService {
            cards: Mutex::new(cards),
            settings: Mutex::new(settings),
            storage: Box::new(storage),
        })
    }

    pub fn get_cards(&self) -> Result<Vec<ReviewItem>> {
        Ok(self.lock_cards()?.clone())
    }

    pub fn get_card(&self, id: &str) -> Result<Option<ReviewItem>> {
        let cards = self.lock_cards()?;
        Ok(cards.iter().find(|card| card.id == id).cloned())
    }

    pub fn due_cards(&self, now: DateTime<Utc>) -> Result<Vec<ReviewItem>> {
        let cards = self.lock_cards()?;
        let due = SpacedRepetition::due_for_review(&cards, now);
        debug!("{} of {} cards due at {}", due.len(), cards.len(), now);
        Ok(due)
    }

    pub fn new_cards(&self) -> Result<Vec<ReviewItem>> {
        let cards = self.lock_cards()?;
        Ok(SpacedRepetition::new_cards(&cards))
    }

    /// Grade one card and persist the replacement.
    pub fn review_card(&self, id: &str, rating: Rating, now: DateTime<Utc>) -> Result<ReviewItem> {
        let mut cards = self.lock_cards()?;

        let position = cards
            .iter()
            .position(|card| card.id == id)
            .ok_or_else(|| SrsError::NotFound(id.to_string()))?;
        let graded = SpacedRepetition::grade(&cards[position], rating, now);

        let mut updated = cards.clone();
        updated[position] = graded.clone();
        self.commit(&mut cards, updated)?;

        info!(
            "Graded card {} as {}: interval {}d, ease {:.2}, next review {}",
            graded.id, rating, graded.interval, graded.ease_factor, graded.next_review
        );
        Ok(graded)
    }

    /// Ask the generator for new cards on the best-ranked topics and append them.
    pub fn generate_cards(
        &self,
        generator: &dyn CardGenerator,
        ranked_topics: &[String],
        now: DateTime<Utc>,
    ) -> Result<Vec<ReviewItem>> {
        let settings = self.get_settings()?;
        let topics: Vec<String> = ranked_topics.iter().take(settings.topics_per_generation).cloned().collect();

        let drafts = generator.generate(&topics, settings.cards_per_generation)?;
        for draft in &drafts {
            draft.validate()?;
        }

        let created: Vec<ReviewItem> = drafts.into_iter().map(|draft| ReviewItem::from_draft(draft, now)).collect();
        self.append(created.clone())?;

        info!("Generated {} new cards for topics {:?}", created.len(), topics);
        Ok(created)
    }

    /// Add cards exported from another session, keeping their scheduling state.
    pub fn import_items(&self, items: Vec<ReviewItem>) -> Result<usize> {
        validate_collection(&items)?;
        let count = items.len();
        self.append(items)?;
        info!("Imported {} cards", count);
        Ok(count)
    }

    pub fn delete_card(&self, id: &str) -> Result<()> {
        let mut cards = self.lock_cards()?;

        let mut updated = cards.clone();
        updated.retain(|card| card.id != id);
        if updated.len() == cards.len() {
            return Err(SrsError::NotFound(id.to_string()));
        }

        self.commit(&mut cards, updated)?;
        info!("Deleted card {}", id);
        Ok(())
    }

    pub fn search_cards(&self, request: &SearchRequest) -> Result<Vec<ReviewItem>> {
        let cards = self.lock_cards()?;
        let mut filtered_cards = cards.clone();

        // Filter by query (searches front and back text)
        if let Some(query) = &request.query {
            let query_lower = query.to_lowercase();
            filtered_cards
                .retain(|card| card.front.to_lowercase().contains(&query_lower) || card.back.to_lowercase().contains(&query_lower));
        }

        if let Some(topic) = &request.topic {
            filtered_cards.retain(|card| &card.topic == topic);
        }

        Ok(filtered_cards)
    }

    pub fn get_topics(&self) -> Result<Vec<String>> {
        let cards = self.lock_cards()?;
        let mut topics: Vec<String> = cards
            .iter()
            .map(|card| card.topic.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        topics.sort();
        Ok(topics)
    }

    pub fn get_review_stats(&self, now: DateTime<Utc>) -> Result<ReviewStats> {
        let cards = self.lock_cards()?;
        Ok(SpacedRepetition::calculate_stats(&cards, now))
    }

    pub fn get_topic_stats(&self, now: DateTime<Utc>) -> Result<Vec<TopicStats>> {
        let cards = self.lock_cards()?;
        let mut topic_map: BTreeMap<&str, Vec<ReviewItem>> = BTreeMap::new();

        for card in cards.iter() {
            topic_map.entry(card.topic.as_str()).or_default().push(card.clone());
        }

        Ok(topic_map
            .into_iter()
            .map(|(name, cards)| {
                let stats = SpacedRepetition::calculate_stats(&cards, now);
                TopicStats {
                    name: name.to_string(),
                    total_cards: stats.total_cards,
                    cards_due: stats.cards_due,
                    cards_new: stats.cards_new,
                    cards_mature: stats.cards_mature,
                }
            })
            .collect())
    }

    // Settings management methods
    pub fn get_settings(&self) -> Result<AppSettings> {
        let settings = self.settings.lock().map_err(|_| SrsError::Lock("settings"))?;
        Ok(settings.clone())
    }

    pub fn update_settings(&self, new_settings: AppSettings) -> Result<AppSettings> {
        new_settings.validate()?;

        let mut settings = self.settings.lock().map_err(|_| SrsError::Lock("settings"))?;
        self.storage.save_settings(&new_settings)?;
        *settings = new_settings.clone();
        info!("Settings updated: {:?}", new_settings);
        Ok(new_settings)
    }

    fn append(&self, items: Vec<ReviewItem>) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let mut cards = self.lock_cards()?;
        let existing: HashSet<&str> = cards.iter().map(|card| card.id.as_str()).collect();
        if let Some(clash) = items.iter().find(|item| existing.contains(item.id.as_str())) {
            return Err(SrsError::invalid(format!("Duplicate card id: {}", clash.id)));
        }

        let mut updated = cards.clone();
        updated.extend(items);
        self.commit(&mut cards, updated)
    }

    fn commit(&self, cards: &mut MutexGuard<'_, Vec<ReviewItem>>, updated: Vec<ReviewItem>) -> Result<()> {
        self.storage.save_cards(&updated)?;
        **cards = updated;
        Ok(())
    }

    fn lock_cards(&self) -> Result<MutexGuard<'_, Vec<ReviewItem>>> {
        self.cards.lock().map_err(|_| SrsError::Lock("cards"))
    }
}
