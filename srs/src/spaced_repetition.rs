use crate::models::{CardStatus, Rating, ReviewItem, ReviewStats, MIN_EASE_FACTOR};
use chrono::{DateTime, Duration, Utc};

/// Intervals longer than this are clamped so `next_review` stays representable.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// Cards at or beyond this interval count as mature in the statistics.
pub const MATURE_INTERVAL_DAYS: u32 = 21;

/// Simplified SM-2 spaced repetition algorithm
pub struct SpacedRepetition;

impl SpacedRepetition {
    /// Apply a grade to a card and return its replacement.
    pub fn grade(card: &ReviewItem, rating: Rating, now: DateTime<Utc>) -> ReviewItem {
        let (repetitions, interval, ease_factor) = Self::calculate_next_review(card, rating);

        ReviewItem {
            status: CardStatus::Review,
            repetitions,
            interval,
            ease_factor,
            next_review: now + Duration::days(i64::from(interval)),
            ..card.clone()
        }
    }

    /// Calculate new (repetitions, interval, ease factor) for a rating
    fn calculate_next_review(card: &ReviewItem, rating: Rating) -> (u32, u32, f64) {
        let ease_factor = card.ease_factor;

        match rating {
            Rating::Hard => {
                // Start over, make the card harder
                (0, 1, (ease_factor - 0.2).max(MIN_EASE_FACTOR))
            }
            Rating::Good => {
                let repetitions = card.repetitions.saturating_add(1);
                let interval = match repetitions {
                    1 => 1,
                    2 => 6,
                    _ => Self::clamp_interval(f64::from(card.interval) * ease_factor),
                };
                (repetitions, interval, ease_factor)
            }
            Rating::Easy => {
                let repetitions = card.repetitions.saturating_add(1);
                let interval = match repetitions {
                    1 => 4,
                    2 => 10,
                    _ => Self::clamp_interval(f64::from(card.interval) * ease_factor * 1.3),
                };
                (repetitions, interval, ease_factor + 0.15)
            }
        }
    }

    // A zero interval can only come from hand-edited data; it still has to move forward.
    fn clamp_interval(days: f64) -> u32 {
        (days.round() as u32).clamp(1, MAX_INTERVAL_DAYS)
    }

    /// Check if a graded card is due for review. New cards are never due.
    pub fn is_due(card: &ReviewItem, now: DateTime<Utc>) -> bool {
        !card.status.is_new() && card.next_review <= now
    }

    /// Cards that have been graded before and whose review date has arrived
    pub fn due_for_review(cards: &[ReviewItem], now: DateTime<Utc>) -> Vec<ReviewItem> {
        cards.iter().filter(|card| Self::is_due(card, now)).cloned().collect()
    }

    /// Cards that have never been graded
    pub fn new_cards(cards: &[ReviewItem]) -> Vec<ReviewItem> {
        cards.iter().filter(|card| card.status.is_new()).cloned().collect()
    }

    /// Calculate review statistics
    pub fn calculate_stats(cards: &[ReviewItem], now: DateTime<Utc>) -> ReviewStats {
        let cards_new = cards.iter().filter(|card| card.status.is_new()).count();

        ReviewStats {
            total_cards: cards.len(),
            cards_due: cards.iter().filter(|card| Self::is_due(card, now)).count(),
            cards_new,
            cards_review: cards.len() - cards_new,
            cards_mature: cards.iter().filter(|card| Self::is_mature(card)).count(),
        }
    }

    pub fn is_mature(card: &ReviewItem) -> bool {
        !card.status.is_new() && card.interval >= MATURE_INTERVAL_DAYS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CardDraft;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap()
    }

    fn new_card() -> ReviewItem {
        let draft = CardDraft {
            front: "Princípio da legalidade".to_string(),
            back: "A administração só age conforme a lei".to_string(),
            topic: "Direito Administrativo".to_string(),
        };
        ReviewItem::from_draft(draft, now())
    }

    fn reviewed_card(repetitions: u32, interval: u32, ease_factor: f64) -> ReviewItem {
        ReviewItem {
            status: CardStatus::Review,
            repetitions,
            interval,
            ease_factor,
            ..new_card()
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
    }

    #[test]
    fn test_good_progression() {
        let first = SpacedRepetition::grade(&new_card(), Rating::Good, now());
        assert_eq!(first.repetitions, 1);
        assert_eq!(first.interval, 1);
        assert_eq!(first.status, CardStatus::Review);
        assert_eq!(first.next_review, now() + Duration::days(1));

        let second = SpacedRepetition::grade(&first, Rating::Good, now());
        assert_eq!(second.repetitions, 2);
        assert_eq!(second.interval, 6);
        assert_eq!(second.next_review, now() + Duration::days(6));

        let third = SpacedRepetition::grade(&second, Rating::Good, now());
        assert_eq!(third.repetitions, 3);
        assert_eq!(third.interval, 15);
        assert_close(third.ease_factor, 2.5);
    }

    #[test]
    fn test_hard_resets_progress() {
        let card = reviewed_card(2, 6, 2.5);
        let graded = SpacedRepetition::grade(&card, Rating::Hard, now());

        assert_eq!(graded.repetitions, 0);
        assert_eq!(graded.interval, 1);
        assert_close(graded.ease_factor, 2.3);
        assert_eq!(graded.next_review, now() + Duration::days(1));
    }

    #[test]
    fn test_easy_second_repetition() {
        let card = reviewed_card(1, 4, 2.5);
        let graded = SpacedRepetition::grade(&card, Rating::Easy, now());

        assert_eq!(graded.repetitions, 2);
        assert_eq!(graded.interval, 10);
        assert_close(graded.ease_factor, 2.65);
    }

    #[test]
    fn test_easy_first_and_later_repetitions() {
        let first = SpacedRepetition::grade(&new_card(), Rating::Easy, now());
        assert_eq!(first.interval, 4);
        assert_close(first.ease_factor, 2.65);

        // round(10 * 2.5 * 1.3) = round(32.5) = 33
        let later = SpacedRepetition::grade(&reviewed_card(2, 10, 2.5), Rating::Easy, now());
        assert_eq!(later.interval, 33);
        assert_eq!(later.repetitions, 3);
    }

    #[test]
    fn test_ease_floor() {
        let mut card = reviewed_card(5, 30, 2.5);
        for _ in 0..20 {
            card = SpacedRepetition::grade(&card, Rating::Hard, now());
            assert!(card.ease_factor >= MIN_EASE_FACTOR);
        }
        assert_close(card.ease_factor, MIN_EASE_FACTOR);
    }

    #[test]
    fn test_every_grade_moves_review_forward() {
        let cards = vec![
            new_card(),
            reviewed_card(0, 1, 1.3),
            reviewed_card(2, 6, 2.5),
            reviewed_card(7, 0, 1.3),
            reviewed_card(9, 400, 3.1),
        ];

        for card in &cards {
            for rating in [Rating::Hard, Rating::Good, Rating::Easy] {
                let graded = SpacedRepetition::grade(card, rating, now());
                assert!(graded.interval >= 1);
                assert!(graded.next_review > now());
                assert!(!SpacedRepetition::is_due(&graded, now()));
            }
        }
    }

    #[test]
    fn test_interval_is_clamped() {
        let card = reviewed_card(40, MAX_INTERVAL_DAYS, 9.0);
        let graded = SpacedRepetition::grade(&card, Rating::Easy, now());
        assert_eq!(graded.interval, MAX_INTERVAL_DAYS);
    }

    #[test]
    fn test_grade_keeps_content() {
        let card = new_card();
        let graded = SpacedRepetition::grade(&card, Rating::Good, now());
        assert_eq!(graded.id, card.id);
        assert_eq!(graded.front, card.front);
        assert_eq!(graded.topic, card.topic);
    }

    #[test]
    fn test_new_cards_never_due() {
        let mut card = new_card();
        card.next_review = now() - Duration::days(365);
        let cards = vec![card];

        for offset in [-10, 0, 10, 10_000] {
            let at = now() + Duration::days(offset);
            assert!(SpacedRepetition::due_for_review(&cards, at).is_empty());
        }
        assert_eq!(SpacedRepetition::new_cards(&cards).len(), 1);
    }

    #[test]
    fn test_graded_card_leaves_new_deck() {
        let cards = vec![new_card(), new_card()];
        let graded = SpacedRepetition::grade(&cards[0], Rating::Hard, now());
        let cards = vec![graded.clone(), cards[1].clone()];

        let new_ids: Vec<String> = SpacedRepetition::new_cards(&cards).into_iter().map(|c| c.id).collect();
        assert_eq!(new_ids, vec![cards[1].id.clone()]);
        assert!(!new_ids.contains(&graded.id));
    }

    #[test]
    fn test_due_boundary() {
        let graded = SpacedRepetition::grade(&new_card(), Rating::Good, now());
        let cards = vec![graded.clone()];

        let before = graded.next_review - Duration::seconds(1);
        let after = graded.next_review + Duration::seconds(1);
        assert!(SpacedRepetition::due_for_review(&cards, before).is_empty());
        assert_eq!(SpacedRepetition::due_for_review(&cards, graded.next_review).len(), 1);
        assert_eq!(SpacedRepetition::due_for_review(&cards, after).len(), 1);
    }

    #[test]
    fn test_due_preserves_order_and_is_repeatable() {
        let mut a = reviewed_card(1, 1, 2.5);
        a.next_review = now() - Duration::days(1);
        let mut b = reviewed_card(1, 1, 2.5);
        b.next_review = now() + Duration::days(1);
        let mut c = reviewed_card(2, 6, 2.5);
        c.next_review = now() - Duration::days(3);
        let cards = vec![a.clone(), b, new_card(), c.clone()];

        let first = SpacedRepetition::due_for_review(&cards, now());
        let second = SpacedRepetition::due_for_review(&cards, now());
        assert_eq!(first, second);

        let ids: Vec<&str> = first.iter().map(|card| card.id.as_str()).collect();
        assert_eq!(ids, vec![a.id.as_str(), c.id.as_str()]);
    }

    #[test]
    fn test_calculate_stats() {
        let mut due = reviewed_card(1, 1, 2.5);
        due.next_review = now() - Duration::hours(1);
        let mut mature = reviewed_card(4, 40, 2.5);
        mature.next_review = now() + Duration::days(40);
        let cards = vec![new_card(), new_card(), due, mature];

        let stats = SpacedRepetition::calculate_stats(&cards, now());
        assert_eq!(stats.total_cards, 4);
        assert_eq!(stats.cards_new, 2);
        assert_eq!(stats.cards_due, 1);
        assert_eq!(stats.cards_review, 2);
        assert_eq!(stats.cards_mature, 1);
    }

    #[test]
    fn test_empty_collection() {
        assert!(SpacedRepetition::due_for_review(&[], now()).is_empty());
        assert!(SpacedRepetition::new_cards(&[]).is_empty());
        assert_eq!(SpacedRepetition::calculate_stats(&[], now()).total_cards, 0);
    }
}
