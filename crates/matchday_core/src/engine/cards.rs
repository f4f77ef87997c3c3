//! Card tracking with ejection support (yellow accumulation + red cards).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    Yellow,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardRuling {
    Warning,
    Ejection,
}

/// A booked card as it appears in the snapshot card list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookedCard {
    pub player_id: u32,
    pub card: CardType,
    pub minute: u8,
}

#[derive(Debug, Default, Clone)]
pub struct CardBook {
    yellow_cards: HashMap<u32, u8>,
    ejected_players: HashSet<u32>,
    booked: Vec<BookedCard>,
}

impl CardBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Book a card. A second yellow or a straight red ejects the player.
    pub fn issue_card(&mut self, player_id: u32, card: CardType, minute: u8) -> (CardRuling, u8) {
        self.booked.push(BookedCard { player_id, card, minute });
        match card {
            CardType::Yellow => {
                let count = {
                    let entry = self.yellow_cards.entry(player_id).or_insert(0);
                    *entry = entry.saturating_add(1);
                    *entry
                };
                if count >= 2 {
                    self.ejected_players.insert(player_id);
                    (CardRuling::Ejection, count)
                } else {
                    (CardRuling::Warning, count)
                }
            }
            CardType::Red => {
                self.ejected_players.insert(player_id);
                (CardRuling::Ejection, 0)
            }
        }
    }

    pub fn is_ejected(&self, player_id: u32) -> bool {
        self.ejected_players.contains(&player_id)
    }

    pub fn yellow_count(&self, player_id: u32) -> u8 {
        *self.yellow_cards.get(&player_id).unwrap_or(&0)
    }

    pub fn booked(&self) -> &[BookedCard] {
        &self.booked
    }

    pub fn reset(&mut self) {
        self.yellow_cards.clear();
        self.ejected_players.clear();
        self.booked.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_yellow_ejects() {
        let mut book = CardBook::new();
        let (ruling, count) = book.issue_card(7, CardType::Yellow, 20);
        assert_eq!(ruling, CardRuling::Warning);
        assert_eq!(count, 1);
        assert!(!book.is_ejected(7));

        let (ruling, count) = book.issue_card(7, CardType::Yellow, 55);
        assert_eq!(ruling, CardRuling::Ejection);
        assert_eq!(count, 2);
        assert!(book.is_ejected(7));
    }

    #[test]
    fn straight_red_ejects() {
        let mut book = CardBook::new();
        let (ruling, _) = book.issue_card(3, CardType::Red, 70);
        assert_eq!(ruling, CardRuling::Ejection);
        assert!(book.is_ejected(3));
    }

    #[test]
    fn booked_list_is_append_only() {
        let mut book = CardBook::new();
        book.issue_card(5, CardType::Yellow, 10);
        book.issue_card(9, CardType::Red, 30);
        assert_eq!(book.booked().len(), 2);
        assert_eq!(book.booked()[1].player_id, 9);
    }

    #[test]
    fn reset_clears_everything() {
        let mut book = CardBook::new();
        book.issue_card(5, CardType::Yellow, 10);
        book.issue_card(5, CardType::Red, 12);
        book.reset();
        assert_eq!(book.yellow_count(5), 0);
        assert!(!book.is_ejected(5));
        assert!(book.booked().is_empty());
    }
}
