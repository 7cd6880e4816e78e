//! Bot decision-making.

use crate::game::{
    PublicState,
    entities::{Card, SeatIndex},
};

/// Picks a card for a bot seat. Returning `None` means the bot has nothing
/// to play; the table then falls back to the first legal card.
pub trait BotStrategy: Send + Sync {
    fn choose_card(&self, hand: &[Card], table: &PublicState, seat: SeatIndex) -> Option<Card>;
}

/// The default heuristic: shed low cards while following, dump the highest
/// card when void so the current leader has to pick the trick up.
///
/// # Examples
///
/// ```
/// use kazhutha::{Card, PublicState, bot::{BotDecisionMaker, BotStrategy}};
///
/// let hand: Vec<Card> = ["K♥", "3♦"].iter().map(|c| c.parse().unwrap()).collect();
/// let card = BotDecisionMaker.choose_card(&hand, &PublicState::default(), 0);
/// assert_eq!(card, Some("3♦".parse().unwrap()));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct BotDecisionMaker;

impl BotDecisionMaker {
    /// First lowest-ranked card, in hand order.
    fn lowest(cards: impl IntoIterator<Item = Card>) -> Option<Card> {
        cards
            .into_iter()
            .reduce(|low, c| if c.rank < low.rank { c } else { low })
    }

    /// First highest-ranked card, in hand order.
    fn highest(cards: impl IntoIterator<Item = Card>) -> Option<Card> {
        cards
            .into_iter()
            .reduce(|high, c| if c.rank > high.rank { c } else { high })
    }
}

impl BotStrategy for BotDecisionMaker {
    fn choose_card(&self, hand: &[Card], table: &PublicState, seat: SeatIndex) -> Option<Card> {
        let Some(lead) = table.lead_suit else {
            if table.first_trick && seat == table.leader && hand.contains(&Card::ACE_OF_SPADES) {
                return Some(Card::ACE_OF_SPADES);
            }
            return Self::lowest(hand.iter().copied());
        };

        if hand.iter().any(|c| c.suit == lead) {
            Self::lowest(hand.iter().copied().filter(|c| c.suit == lead))
        } else {
            Self::highest(hand.iter().copied())
        }
    }
}
