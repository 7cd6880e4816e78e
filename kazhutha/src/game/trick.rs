use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::entities::{Card, SeatIndex, Suit};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TrickPlay {
    pub player: SeatIndex,
    pub card: Card,
}

/// What recording a play did to the trick.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum TrickProgress {
    /// First card of the trick; it sets the lead suit.
    Led,
    /// Followed suit. `promoted` is set when the card became the highest.
    Followed { promoted: bool },
    /// A void player broke suit. The current highest picks the trick up.
    OffSuit { collector: SeatIndex },
}

/// Cards on the table for the trick in progress.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Trick {
    plays: Vec<TrickPlay>,
    lead_suit: Option<Suit>,
    highest: Option<TrickPlay>,
    participants: BTreeSet<SeatIndex>,
    /// How many seats must play before the trick is complete.
    active_at_start: usize,
}

impl Trick {
    pub fn new(active_at_start: usize) -> Self {
        Self {
            active_at_start,
            ..Default::default()
        }
    }

    pub fn plays(&self) -> &[TrickPlay] {
        &self.plays
    }

    pub fn lead_suit(&self) -> Option<Suit> {
        self.lead_suit
    }

    pub fn highest(&self) -> Option<TrickPlay> {
        self.highest
    }

    pub fn participants(&self) -> &BTreeSet<SeatIndex> {
        &self.participants
    }

    pub fn active_at_start(&self) -> usize {
        self.active_at_start
    }

    pub fn has_played(&self, seat: SeatIndex) -> bool {
        self.participants.contains(&seat)
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }

    pub fn len(&self) -> usize {
        self.plays.len()
    }

    /// True once every seat that was active when the trick began has played.
    pub fn is_complete(&self) -> bool {
        self.active_at_start > 0 && self.participants.len() >= self.active_at_start
    }

    pub(crate) fn set_active_at_start(&mut self, count: usize) {
        self.active_at_start = count;
    }

    pub(crate) fn record(&mut self, play: TrickPlay) -> TrickProgress {
        self.plays.push(play);
        self.participants.insert(play.player);

        let (Some(lead), Some(highest)) = (self.lead_suit, self.highest) else {
            self.lead_suit = Some(play.card.suit);
            self.highest = Some(play);
            return TrickProgress::Led;
        };

        if play.card.suit != lead {
            return TrickProgress::OffSuit {
                collector: highest.player,
            };
        }

        let promoted = play.card.rank > highest.card.rank;
        if promoted {
            self.highest = Some(play);
        }
        TrickProgress::Followed { promoted }
    }

    /// Empties the table, returning the cards in play order.
    pub(crate) fn take_cards(&mut self) -> Vec<Card> {
        let cards = self.plays.drain(..).map(|p| p.card).collect();
        self.lead_suit = None;
        self.highest = None;
        self.participants.clear();
        cards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Rank;

    fn play(player: SeatIndex, suit: Suit, rank: Rank) -> TrickPlay {
        TrickPlay {
            player,
            card: Card::new(suit, rank),
        }
    }

    #[test]
    fn first_play_sets_lead_and_highest() {
        let mut trick = Trick::new(3);
        assert_eq!(
            trick.record(play(2, Suit::Heart, Rank::Five)),
            TrickProgress::Led
        );
        assert_eq!(trick.lead_suit(), Some(Suit::Heart));
        assert_eq!(trick.highest().map(|p| p.player), Some(2));
    }

    #[test]
    fn higher_follow_is_promoted_and_lower_is_not() {
        let mut trick = Trick::new(3);
        trick.record(play(0, Suit::Heart, Rank::Five));
        assert_eq!(
            trick.record(play(2, Suit::Heart, Rank::Three)),
            TrickProgress::Followed { promoted: false }
        );
        assert_eq!(
            trick.record(play(1, Suit::Heart, Rank::Queen)),
            TrickProgress::Followed { promoted: true }
        );
        assert_eq!(trick.highest().map(|p| p.player), Some(1));
        assert!(trick.is_complete());
    }

    #[test]
    fn off_suit_names_current_highest_as_collector() {
        let mut trick = Trick::new(4);
        trick.record(play(0, Suit::Spade, Rank::Nine));
        trick.record(play(3, Suit::Spade, Rank::King));
        assert_eq!(
            trick.record(play(2, Suit::Club, Rank::Two)),
            TrickProgress::OffSuit { collector: 3 }
        );
        assert!(!trick.is_complete());
    }

    #[test]
    fn take_cards_resets_the_table() {
        let mut trick = Trick::new(2);
        trick.record(play(0, Suit::Spade, Rank::Nine));
        trick.record(play(1, Suit::Spade, Rank::Ten));
        let cards = trick.take_cards();
        assert_eq!(cards.len(), 2);
        assert!(trick.is_empty());
        assert_eq!(trick.lead_suit(), None);
        assert!(trick.participants().is_empty());
    }
}
