use super::{
    entities::{Card, SeatIndex, Suit, sort_hand},
    state_machine::PlayError,
    view::{PlayerView, PublicState},
};

/// A participant's local copy of the table, rebuilt from host snapshots.
///
/// Only the participant's own hand is ever known here. Snapshots carry
/// counts, never cards, so applying one cannot clobber the hand.
#[derive(Clone, Debug, Default)]
pub struct MirrorState {
    shared: PublicState,
    seat: Option<SeatIndex>,
    hand: Vec<Card>,
}

impl MirrorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the shared view with the host's snapshot. The roster is
    /// grown with placeholders to `player_count` when the snapshot lists
    /// fewer seats.
    pub fn apply_host_state(&mut self, snapshot: PublicState) {
        let mut players = snapshot.players;
        while players.len() < snapshot.player_count {
            players.push(PlayerView::placeholder(players.len()));
        }
        if let Some(seat) = self.seat {
            if let Some(me) = players.get_mut(seat) {
                me.is_human = true;
            }
        }
        self.shared = PublicState {
            players,
            ..snapshot
        };
    }

    /// Installs the private hand the host sent for this participant.
    pub fn apply_own_hand(&mut self, seat: SeatIndex, mut hand: Vec<Card>) {
        while self.shared.players.len() <= seat {
            let next = self.shared.players.len();
            self.shared.players.push(PlayerView::placeholder(next));
        }
        self.shared.players[seat].is_human = true;
        sort_hand(&mut hand);
        self.seat = Some(seat);
        self.hand = hand;
    }

    pub fn public(&self) -> &PublicState {
        &self.shared
    }

    pub fn seat(&self) -> Option<SeatIndex> {
        self.seat
    }

    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    pub fn lead_suit(&self) -> Option<Suit> {
        self.shared.lead_suit
    }

    pub fn is_my_turn(&self) -> bool {
        self.seat == Some(self.shared.turn) && !self.shared.turn_locked && !self.shared.game_over
    }

    /// Local pre-check of a play. Advisory only; the host decides.
    pub fn check_play(&self, card: Card) -> Result<(), PlayError> {
        if self.shared.game_over {
            return Err(PlayError::GameOver);
        }
        if self.shared.turn_locked {
            return Err(PlayError::TurnLocked);
        }
        if self.seat != Some(self.shared.turn) {
            return Err(PlayError::NotYourTurn);
        }
        if let Some(lead) = self.shared.lead_suit {
            if card.suit != lead && self.hand.iter().any(|c| c.suit == lead) {
                return Err(PlayError::MustFollowSuit);
            }
        }
        if !self.hand.contains(&card) {
            return Err(PlayError::CardNotHeld);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(s: &str) -> Card {
        s.parse().unwrap()
    }

    fn snapshot(player_count: usize, listed: usize) -> PublicState {
        PublicState {
            players: (0..listed)
                .map(|i| PlayerView {
                    name: format!("Seat {i}"),
                    is_human: false,
                    hand_count: 5,
                    out: false,
                    peer_id: None,
                })
                .collect(),
            player_count,
            ..Default::default()
        }
    }

    #[test]
    fn host_state_pads_roster_to_player_count() {
        let mut mirror = MirrorState::new();
        mirror.apply_host_state(snapshot(4, 2));
        assert_eq!(mirror.public().players.len(), 4);
        assert_eq!(mirror.public().players[3].name, "Player 4");
    }

    #[test]
    fn host_state_never_touches_own_hand() {
        let mut mirror = MirrorState::new();
        mirror.apply_own_hand(1, vec![card("2♣"), card("A♥")]);
        mirror.apply_host_state(snapshot(3, 3));
        assert_eq!(mirror.hand(), &[card("A♥"), card("2♣")]);
        assert!(mirror.public().players[1].is_human);
    }

    #[test]
    fn own_hand_before_any_snapshot_pads_roster() {
        let mut mirror = MirrorState::new();
        mirror.apply_own_hand(2, vec![card("2♣")]);
        assert_eq!(mirror.seat(), Some(2));
        assert_eq!(mirror.public().players.len(), 3);
    }

    #[test]
    fn check_play_mirrors_host_rules() {
        let mut mirror = MirrorState::new();
        let mut state = snapshot(2, 2);
        state.turn = 1;
        state.lead_suit = Some(Suit::Heart);
        mirror.apply_host_state(state.clone());
        mirror.apply_own_hand(1, vec![card("2♥"), card("K♣")]);

        assert_eq!(mirror.check_play(card("K♣")), Err(PlayError::MustFollowSuit));
        assert_eq!(mirror.check_play(card("2♥")), Ok(()));
        assert!(mirror.is_my_turn());

        state.turn_locked = true;
        mirror.apply_host_state(state);
        assert_eq!(mirror.check_play(card("2♥")), Err(PlayError::TurnLocked));
    }
}
