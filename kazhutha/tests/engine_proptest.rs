/// Property-based tests for the rules engine using proptest
///
/// Each case deals a seeded random game and plays it out with a mix of
/// legal and arbitrary moves, checking the engine's invariants after every
/// step.
use kazhutha::{
    Card, KazhuthaState, PlayError, PlayOutcome, Rank, Suit,
    constants::DECK_SIZE,
    game::entities::PlayerConfig,
};
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};

fn all_cards() -> Vec<Card> {
    Suit::ALL
        .iter()
        .flat_map(|suit| Rank::ALL.iter().map(move |rank| Card::new(*suit, *rank)))
        .collect()
}

fn dealt_game(players: usize, seed: u64) -> KazhuthaState {
    let configs = (0..players)
        .map(|i| PlayerConfig::bot(&format!("Bot {i}")))
        .collect();
    let mut game = KazhuthaState::new();
    game.setup_players(configs).unwrap();
    game.deal_with_rng(&mut StdRng::seed_from_u64(seed));
    game
}

/// What the engine should answer when the seat on turn tries `card`.
fn expected_for_turn_seat(game: &KazhuthaState, card: Card) -> Result<(), PlayError> {
    let hand = game.hand(game.turn());
    if let Some(lead) = game.lead_suit() {
        if card.suit != lead && hand.iter().any(|c| c.suit == lead) {
            return Err(PlayError::MustFollowSuit);
        }
    }
    if !hand.contains(&card) {
        return Err(PlayError::CardNotHeld);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_random_games_preserve_invariants(
        players in 2usize..=8,
        seed in any::<u64>(),
        moves in prop::collection::vec((0u8..8, any::<u16>()), 1..600),
    ) {
        let mut game = dealt_game(players, seed);
        let deck = all_cards();
        prop_assert_eq!(game.total_cards(), DECK_SIZE);

        for (kind, pick) in moves {
            if game.is_game_over() {
                break;
            }

            if game.pending_trick().is_some() {
                prop_assert!(game.finalize_pending_trick().is_some());
                let settled = game.public_state();
                prop_assert!(game.finalize_pending_trick().is_none());
                prop_assert_eq!(game.public_state(), settled);
                prop_assert_eq!(game.total_cards(), DECK_SIZE);
                continue;
            }

            let seat = game.turn();
            match kind {
                // Someone other than the seat on turn tries to play.
                0 => {
                    let other = (seat + 1 + pick as usize % (players - 1)) % players;
                    let attempt = game.hand(other).first().copied()
                        .unwrap_or(deck[pick as usize % DECK_SIZE]);
                    prop_assert_eq!(game.play_card(other, attempt), Err(PlayError::NotYourTurn));
                }
                // The seat on turn tries an arbitrary card.
                1 | 2 => {
                    let attempt = deck[pick as usize % DECK_SIZE];
                    let expected = expected_for_turn_seat(&game, attempt);
                    let before = game.public_state();
                    let highest = game.trick().highest();
                    match game.play_card(seat, attempt) {
                        Ok(outcome) => {
                            prop_assert!(expected.is_ok());
                            check_outcome(&game, outcome, highest, seat)?;
                        }
                        Err(error) => {
                            let actual: Result<(), PlayError> = Err(error);
                            prop_assert_eq!(actual, expected);
                            prop_assert_eq!(game.public_state(), before);
                        }
                    }
                }
                // The seat on turn plays a legal card.
                _ => {
                    let legal = game.legal_cards(seat);
                    prop_assert!(!legal.is_empty());
                    let attempt = legal[pick as usize % legal.len()];
                    let highest = game.trick().highest();
                    let outcome = game.play_card(seat, attempt);
                    prop_assert!(outcome.is_ok());
                    if let Ok(outcome) = outcome {
                        check_outcome(&game, outcome, highest, seat)?;
                    }
                }
            }
            prop_assert_eq!(game.total_cards(), DECK_SIZE);
            prop_assert_eq!(game.public_state().cards_accounted(), DECK_SIZE);
        }

        let active = game.players().iter().filter(|p| !p.out).count();
        prop_assert_eq!(game.is_game_over(), active == 1);
        if game.is_game_over() {
            let seat = game.turn();
            let card = game.hand(seat).first().copied().unwrap_or(Card::ACE_OF_SPADES);
            prop_assert_eq!(game.play_card(seat, card), Err(PlayError::GameOver));
        }
    }
}

fn check_outcome(
    game: &KazhuthaState,
    outcome: PlayOutcome,
    highest_before: Option<kazhutha::game::TrickPlay>,
    seat: usize,
) -> Result<(), TestCaseError> {
    match outcome {
        PlayOutcome::Pickup { collector } => {
            let highest = highest_before.map(|p| p.player);
            prop_assert_eq!(Some(collector), highest);
            prop_assert_ne!(collector, seat);
        }
        PlayOutcome::Clean { next_leader } => {
            let highest = game.trick().highest().map(|p| p.player);
            prop_assert_eq!(Some(next_leader), highest);
            let lead = game.lead_suit();
            let best = game
                .trick()
                .plays()
                .iter()
                .filter(|p| Some(p.card.suit) == lead)
                .map(|p| p.card.rank)
                .max();
            prop_assert_eq!(best, game.trick().highest().map(|p| p.card.rank));
        }
        PlayOutcome::Continued => {}
    }
    Ok(())
}
