use serde::{Deserialize, Serialize};

use super::{
    entities::{PeerId, Player, SeatIndex, Suit},
    give_all::GiveAllRequest,
    state_machine::{KazhuthaState, PendingTrick},
    trick::TrickPlay,
};

/// What everyone may know about a seat. Hands are reduced to a count.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerView {
    pub name: String,
    pub is_human: bool,
    pub hand_count: usize,
    pub out: bool,
    pub peer_id: Option<PeerId>,
}

impl PlayerView {
    pub fn placeholder(seat: SeatIndex) -> Self {
        Self {
            name: format!("Player {}", seat + 1),
            is_human: false,
            hand_count: 0,
            out: false,
            peer_id: None,
        }
    }
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            name: player.name.clone(),
            is_human: player.is_human,
            hand_count: player.hand.len(),
            out: player.out,
            peer_id: player.peer_id.clone(),
        }
    }
}

/// The snapshot broadcast to every participant after each change.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PublicState {
    pub players: Vec<PlayerView>,
    pub player_count: usize,
    pub leader: SeatIndex,
    /// The displayed turn: the pause override when one is set.
    pub turn: SeatIndex,
    pub trick: Vec<TrickPlay>,
    pub lead_suit: Option<Suit>,
    pub game_over: bool,
    pub first_trick: bool,
    pub turn_locked: bool,
    pub pending_trick: Option<PendingTrick>,
    pub display_turn: Option<SeatIndex>,
    pub give_all_request: Option<GiveAllRequest>,
    pub discard_count: usize,
}

impl PublicState {
    /// Cards in hands, on the table, and in the discard pile.
    pub fn cards_accounted(&self) -> usize {
        self.players.iter().map(|p| p.hand_count).sum::<usize>()
            + self.trick.len()
            + self.discard_count
    }

    pub fn seat_of(&self, peer_id: &PeerId) -> Option<SeatIndex> {
        self.players
            .iter()
            .position(|p| p.peer_id.as_ref() == Some(peer_id))
    }

    pub fn loser(&self) -> Option<SeatIndex> {
        if !self.game_over {
            return None;
        }
        self.players.iter().position(|p| !p.out)
    }
}

impl KazhuthaState {
    /// Projects the authoritative state into the shareable snapshot.
    pub fn public_state(&self) -> PublicState {
        PublicState {
            players: self.players.iter().map(PlayerView::from).collect(),
            player_count: self.players.len(),
            leader: self.leader,
            turn: self.effective_turn(),
            trick: self.trick.plays().to_vec(),
            lead_suit: self.trick.lead_suit(),
            game_over: self.game_over,
            first_trick: self.first_trick,
            turn_locked: self.is_turn_locked(),
            pending_trick: self.pending_trick(),
            display_turn: self.display_turn,
            give_all_request: self.give_all_request(),
            discard_count: self.discarded_count(),
        }
    }
}
