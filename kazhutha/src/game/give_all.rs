use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    entities::{LogKind, SeatIndex, sort_hand},
    state_machine::{KazhuthaState, Phase, PlayOutcome},
};

/// A player asking another to hand over their whole hand. Accepting takes
/// the target out of the game as a winner.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GiveAllRequest {
    pub requester: SeatIndex,
    pub target: SeatIndex,
}

/// Why a Give-All request was turned away before reaching its target.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GiveAllDenial {
    #[error("not seated at the table")]
    NotSeated,
    #[error("invalid target")]
    InvalidTarget,
    #[error("cannot target yourself")]
    NoSelfTarget,
    #[error("game is over")]
    GameOver,
    #[error("another request is pending")]
    AnotherRequestPending,
    #[error("a trick is being finalized")]
    TrickInProgress,
    #[error("target could not be reached")]
    TargetUnreachable,
    #[error("you are already out")]
    RequesterOut,
}

/// Result of an accepted Give-All.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GiveAllOutcome {
    pub request: GiveAllRequest,
    /// Number of cards that moved to the requester.
    pub transferred: usize,
    /// Set when the target's departure completed the trick in progress.
    pub trick_end: Option<PlayOutcome>,
}

impl KazhuthaState {
    pub fn give_all_request(&self) -> Option<GiveAllRequest> {
        match self.phase {
            Phase::AwaitingGiveAllDecision(request) => Some(request),
            _ => None,
        }
    }

    /// Validates and records a request, locking turns until it is answered.
    pub fn open_give_all(
        &mut self,
        requester: SeatIndex,
        target: SeatIndex,
    ) -> Result<GiveAllRequest, GiveAllDenial> {
        if requester >= self.players.len() {
            return Err(GiveAllDenial::NotSeated);
        }
        if target >= self.players.len() {
            return Err(GiveAllDenial::InvalidTarget);
        }
        if requester == target {
            return Err(GiveAllDenial::NoSelfTarget);
        }
        if self.game_over || !self.dealt {
            return Err(GiveAllDenial::GameOver);
        }
        match self.phase {
            Phase::AwaitingGiveAllDecision(_) => {
                return Err(GiveAllDenial::AnotherRequestPending);
            }
            Phase::AwaitingTrickFinalize(_) => return Err(GiveAllDenial::TrickInProgress),
            Phase::Idle if self.held => return Err(GiveAllDenial::TrickInProgress),
            Phase::Idle => {}
        }
        if self.players[requester].out {
            return Err(GiveAllDenial::RequesterOut);
        }
        if self.players[target].out {
            return Err(GiveAllDenial::InvalidTarget);
        }

        let request = GiveAllRequest { requester, target };
        self.phase = Phase::AwaitingGiveAllDecision(request);
        let announcement = self.give_all_announcement(request);
        self.push_log(announcement, LogKind::Info);
        Ok(request)
    }

    fn give_all_announcement(&self, request: GiveAllRequest) -> String {
        let from = self.name_of(request.requester);
        let to = self.name_of(request.target);
        format!("{from} asked {to} to give all their cards.")
    }

    /// Drops a pending request without a decision, e.g. when the target
    /// could not be reached. An announcement not yet drained from the log
    /// is withdrawn with it.
    pub fn cancel_give_all(&mut self) -> Option<GiveAllRequest> {
        let request = self.give_all_request()?;
        self.phase = Phase::Idle;
        let announcement = self.give_all_announcement(request);
        self.retract_log(&announcement);
        Some(request)
    }

    /// Moves every card the target holds to the requester and takes the
    /// target out. Returns `None` when no request is pending.
    pub fn accept_give_all(&mut self) -> Option<GiveAllOutcome> {
        let request = self.give_all_request()?;
        let GiveAllRequest { requester, target } = request;

        let taken = std::mem::take(&mut self.players[target].hand);
        let transferred = taken.len();
        let receiver = &mut self.players[requester];
        receiver.hand.extend(taken);
        sort_hand(&mut receiver.hand);
        if receiver.hand.is_empty() {
            receiver.out = true;
        }
        self.players[target].out = true;
        self.phase = Phase::Idle;

        let from = self.name_of(requester);
        let to = self.name_of(target);
        self.push_log(
            format!(
                "{to} accepted a Give-All request from {from} and is finished (winner)."
            ),
            LogKind::Ok,
        );

        self.check_game_end();
        let trick_end = if self.game_over {
            None
        } else {
            self.rebalance_trick_after_departure(target)
        };
        Some(GiveAllOutcome {
            request,
            transferred,
            trick_end,
        })
    }

    pub fn reject_give_all(&mut self) -> Option<GiveAllRequest> {
        let request = self.give_all_request()?;
        self.phase = Phase::Idle;
        let from = self.name_of(request.requester);
        let to = self.name_of(request.target);
        self.push_log(
            format!("{to} rejected the Give-All request from {from}."),
            LogKind::Warn,
        );
        Some(request)
    }

    /// Fixes up trick bookkeeping after `departed` left mid-game. The
    /// required play count shrinks to the seats still able to play, the
    /// turn moves on if it was theirs, and a trick that is now complete is
    /// parked as a clean trick.
    fn rebalance_trick_after_departure(&mut self, departed: SeatIndex) -> Option<PlayOutcome> {
        if self.trick.is_empty() {
            self.trick.set_active_at_start(self.active_players_count());
            if self.turn == departed {
                let next = self.next_active(departed);
                self.leader = next;
                self.turn = next;
            }
            return None;
        }

        let waiting = self
            .players
            .iter()
            .enumerate()
            .filter(|(seat, p)| !p.out && !self.trick.has_played(*seat))
            .count();
        self.trick
            .set_active_at_start(self.trick.participants().len() + waiting);

        if let Some(pending) = self.complete_clean_trick() {
            return Some(pending.into());
        }
        if self.turn == departed {
            self.turn = self.next_active(departed);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{Card, PlayerConfig};

    fn card(s: &str) -> Card {
        s.parse().unwrap()
    }

    fn game(layout: &[&[&str]]) -> KazhuthaState {
        let configs = (0..layout.len())
            .map(|i| PlayerConfig::human(&format!("P{i}"), None))
            .collect();
        let mut game = KazhuthaState::new();
        game.setup_players(configs).unwrap();
        game.deal_prepared(
            layout.iter()
                .map(|h| h.iter().map(|c| card(c)).collect())
                .collect(),
        );
        game
    }

    #[test]
    fn denials_cover_bad_targets_and_busy_tables() {
        let mut game = game(&[&["A♠", "2♥"], &["3♠"], &["4♠", "5♥"]]);
        assert_eq!(game.open_give_all(0, 9), Err(GiveAllDenial::InvalidTarget));
        assert_eq!(game.open_give_all(0, 0), Err(GiveAllDenial::NoSelfTarget));
        game.open_give_all(0, 1).unwrap();
        assert_eq!(
            game.open_give_all(2, 1),
            Err(GiveAllDenial::AnotherRequestPending)
        );
        game.reject_give_all();
        game.lock_turn();
        assert_eq!(game.open_give_all(2, 1), Err(GiveAllDenial::TrickInProgress));
    }

    #[test]
    fn pending_request_locks_turns() {
        let mut game = game(&[&["A♠"], &["3♠"]]);
        game.open_give_all(1, 0).unwrap();
        assert!(game.is_turn_locked());
        assert_eq!(
            game.play_card(0, card("A♠")),
            Err(crate::PlayError::TurnLocked)
        );
        assert!(game.cancel_give_all().is_some());
        assert!(!game.is_turn_locked());
    }

    #[test]
    fn cancel_withdraws_undelivered_announcement() {
        let mut game = game(&[&["A♠"], &["3♠"]]);
        game.take_log();
        game.open_give_all(0, 1).unwrap();
        game.cancel_give_all();
        assert!(game.take_log().is_empty());

        // Once drained, the announcement stays on record.
        game.open_give_all(0, 1).unwrap();
        assert_eq!(game.take_log().len(), 1);
        game.cancel_give_all();
        assert!(game.take_log().is_empty());
    }

    #[test]
    fn accept_moves_hand_and_retires_target() {
        let mut game = game(&[&["A♠", "2♥"], &["3♠", "4♦"], &["5♠", "6♣"]]);
        game.open_give_all(0, 2).unwrap();
        let outcome = game.accept_give_all().unwrap();
        assert_eq!(outcome.transferred, 2);
        assert_eq!(outcome.trick_end, None);
        assert_eq!(game.hand(0).len(), 4);
        assert!(game.players()[2].out);
        assert_eq!(game.trick().active_at_start(), 2);
        assert_eq!(game.total_cards(), 6);
    }

    #[test]
    fn accepting_with_one_opponent_ends_the_game() {
        let mut game = game(&[&["A♠"], &["3♠"]]);
        game.open_give_all(0, 1).unwrap();
        game.accept_give_all().unwrap();
        assert!(game.is_game_over());
        assert_eq!(game.loser(), Some(0));
    }

    #[test]
    fn reject_leaves_hands_untouched() {
        let mut game = game(&[&["A♠"], &["3♠"]]);
        game.open_give_all(0, 1).unwrap();
        assert_eq!(
            game.reject_give_all(),
            Some(GiveAllRequest {
                requester: 0,
                target: 1
            })
        );
        assert_eq!(game.hand(1), &[card("3♠")]);
        assert_eq!(game.reject_give_all(), None);
    }
}
