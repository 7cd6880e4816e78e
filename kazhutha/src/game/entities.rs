use chrono::{DateTime, Utc};
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

use super::constants::{self, DECK_SIZE};

/// Suits in the order hands are displayed: ♠ ♥ ♦ ♣.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Suit {
    Spade,
    Heart,
    Diamond,
    Club,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spade, Suit::Heart, Suit::Diamond, Suit::Club];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Spade => "♠",
            Self::Heart => "♥",
            Self::Diamond => "♦",
            Self::Club => "♣",
        };
        write!(f, "{repr}")
    }
}

impl FromStr for Suit {
    type Err = CardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "♠" | "s" | "spade" | "spades" => Ok(Self::Spade),
            "♥" | "h" | "heart" | "hearts" => Ok(Self::Heart),
            "♦" | "d" | "diamond" | "diamonds" => Ok(Self::Diamond),
            "♣" | "c" | "club" | "clubs" => Ok(Self::Club),
            _ => Err(CardParseError::UnknownSuit(s.to_string())),
        }
    }
}

/// Card ranks, declared low to high so the derived ordering matches
/// trick strength. Ace is high.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "J")]
    Jack,
    #[serde(rename = "Q")]
    Queen,
    #[serde(rename = "K")]
    King,
    #[serde(rename = "A")]
    Ace,
}

impl Rank {
    /// Highest first, the order a fresh deck is built in.
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::King,
        Rank::Queen,
        Rank::Jack,
        Rank::Ten,
        Rank::Nine,
        Rank::Eight,
        Rank::Seven,
        Rank::Six,
        Rank::Five,
        Rank::Four,
        Rank::Three,
        Rank::Two,
    ];

    /// Numeric strength: A=13 down to 2=1.
    pub fn value(&self) -> u8 {
        *self as u8 + 1
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::Five => "5",
            Self::Six => "6",
            Self::Seven => "7",
            Self::Eight => "8",
            Self::Nine => "9",
            Self::Ten => "10",
            Self::Jack => "J",
            Self::Queen => "Q",
            Self::King => "K",
            Self::Ace => "A",
        };
        write!(f, "{repr}")
    }
}

impl FromStr for Rank {
    type Err = CardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rank = match s.to_ascii_uppercase().as_str() {
            "2" => Self::Two,
            "3" => Self::Three,
            "4" => Self::Four,
            "5" => Self::Five,
            "6" => Self::Six,
            "7" => Self::Seven,
            "8" => Self::Eight,
            "9" => Self::Nine,
            "10" | "T" => Self::Ten,
            "J" => Self::Jack,
            "Q" => Self::Queen,
            "K" => Self::King,
            "A" | "1" => Self::Ace,
            _ => return Err(CardParseError::UnknownRank(s.to_string())),
        };
        Ok(rank)
    }
}

#[derive(Debug, Eq, Error, PartialEq)]
pub enum CardParseError {
    #[error("card is empty")]
    Empty,
    #[error("unknown rank '{0}'")]
    UnknownRank(String),
    #[error("unknown suit '{0}'")]
    UnknownSuit(String),
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

impl Card {
    pub const ACE_OF_SPADES: Card = Card::new(Suit::Spade, Rank::Ace);

    pub const fn new(suit: Suit, rank: Rank) -> Self {
        Self { suit, rank }
    }

    /// Hand ordering: suit (♠ ♥ ♦ ♣), then rank descending.
    pub fn hand_order(&self, other: &Card) -> std::cmp::Ordering {
        self.suit
            .cmp(&other.suit)
            .then_with(|| other.rank.cmp(&self.rank))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

/// Accepts `10♥`, `10h`, `QS`, `a♠` and similar.
impl FromStr for Card {
    type Err = CardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some(suit_char) = s.chars().last() else {
            return Err(CardParseError::Empty);
        };
        let split = s.len() - suit_char.len_utf8();
        let rank = s[..split].parse()?;
        let suit = s[split..].parse()?;
        Ok(Self::new(suit, rank))
    }
}

/// Sorts a hand in display order.
pub fn sort_hand(hand: &mut [Card]) {
    hand.sort_by(Card::hand_order);
}

#[derive(Clone, Debug)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Splits the deck into `seats` hands. Cards are dealt round robin for
    /// as many full rounds as the deck allows, then the remainder goes one
    /// each to the lowest seats.
    pub fn deal(self, seats: usize) -> Vec<Vec<Card>> {
        let mut hands = vec![Vec::new(); seats];
        if seats == 0 {
            return hands;
        }
        let per_player = self.cards.len() / seats;
        let mut cards = self.cards.into_iter();
        for _ in 0..per_player {
            for hand in hands.iter_mut() {
                hand.extend(cards.next());
            }
        }
        for (hand, card) in hands.iter_mut().zip(cards) {
            hand.push(card);
        }
        hands
    }
}

impl Default for Deck {
    fn default() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for suit in Suit::ALL {
            for rank in Rank::ALL {
                cards.push(Card::new(suit, rank));
            }
        }
        Self { cards }
    }
}

/// Opaque network identity of a participant.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(s: &str) -> Self {
        let mut id: String = s.trim().chars().filter(|c| !c.is_whitespace()).collect();
        if id.len() > constants::MAX_USER_INPUT_LENGTH {
            let cut = (0..=constants::MAX_USER_INPUT_LENGTH)
                .rev()
                .find(|i| id.is_char_boundary(*i))
                .unwrap_or(0);
            id.truncate(cut);
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for PeerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<&str> for PeerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PeerId {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

/// Type alias for seat positions during the game.
pub type SeatIndex = usize;

/// Cleans up a display name the same way for every entry point.
pub fn sanitize_name(name: &str) -> String {
    let name: String = name
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(constants::MAX_USER_INPUT_LENGTH)
        .collect();
    if name.is_empty() {
        "Player".to_string()
    } else {
        name
    }
}

/// Who sits in a seat when a game is set up.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlayerConfig {
    pub name: String,
    pub is_human: bool,
    pub peer_id: Option<PeerId>,
}

impl PlayerConfig {
    pub fn human(name: &str, peer_id: Option<PeerId>) -> Self {
        Self {
            name: sanitize_name(name),
            is_human: true,
            peer_id,
        }
    }

    pub fn bot(name: &str) -> Self {
        Self {
            name: sanitize_name(name),
            is_human: false,
            peer_id: None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Player {
    pub name: String,
    pub is_human: bool,
    pub peer_id: Option<PeerId>,
    pub hand: Vec<Card>,
    /// Set once the hand empties (or is given away). Never cleared until
    /// the next deal.
    pub out: bool,
}

impl Player {
    pub fn holds(&self, card: &Card) -> bool {
        self.hand.contains(card)
    }

    pub fn holds_suit(&self, suit: Suit) -> bool {
        self.hand.iter().any(|c| c.suit == suit)
    }
}

impl From<PlayerConfig> for Player {
    fn from(config: PlayerConfig) -> Self {
        Self {
            name: config.name,
            is_human: config.is_human,
            peer_id: config.peer_id,
            hand: Vec::new(),
            out: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Info,
    Ok,
    Warn,
    Bad,
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Info => "info",
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Bad => "bad",
        };
        write!(f, "{repr}")
    }
}

/// A human-readable game event, shown in every participant's log.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct LogEntry {
    pub message: String,
    pub kind: LogKind,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(message: impl Into<String>, kind: LogKind) -> Self {
        Self {
            message: message.into(),
            kind,
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.timestamp.format("%H:%M:%S"),
            self.message
        )
    }
}
