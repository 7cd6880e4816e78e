//! Message types for the client-server protocol.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::protocol_version::ProtocolVersion;
use crate::game::{
    GiveAllDenial, PlayError, PublicState,
    entities::{Card, LogEntry, PeerId, SeatIndex},
};

/// Requests a participant sends to the host.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Must be the first frame on a connection.
    RequestJoin {
        name: String,
        peer_id: PeerId,
        #[serde(default)]
        version: ProtocolVersion,
    },
    StartGame,
    PlayRequest {
        card: Card,
    },
    GiveAllRequest {
        target_peer_id: PeerId,
    },
    GiveAllResponse {
        accepted: bool,
    },
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::RequestJoin { name, peer_id, .. } => format!("join as {name} ({peer_id})"),
            Self::StartGame => "start game".to_string(),
            Self::PlayRequest { card } => format!("play {card}"),
            Self::GiveAllRequest { target_peer_id } => format!("give-all from {target_peer_id}"),
            Self::GiveAllResponse { accepted: true } => "accept give-all".to_string(),
            Self::GiveAllResponse { accepted: false } => "reject give-all".to_string(),
        };
        write!(f, "{repr}")
    }
}

/// A connected participant as shown in the lobby.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RosterEntry {
    pub peer_id: PeerId,
    pub name: String,
    pub is_host: bool,
}

/// Frames the host sends to participants.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Public snapshot. Always followed by the recipient's `YourHand` when
    /// they are seated.
    GameState {
        state: PublicState,
    },
    YourHand {
        player_index: SeatIndex,
        hand: Vec<Card>,
    },
    GiveAllPrompt {
        from_peer_id: Option<PeerId>,
        from_index: SeatIndex,
        from_name: String,
    },
    GiveAllDenied {
        reason: GiveAllDenial,
    },
    GiveAllResult {
        accepted: bool,
        from_index: SeatIndex,
        target_index: SeatIndex,
    },
    PlayersList {
        list: Vec<RosterEntry>,
    },
    LogEntry {
        entry: LogEntry,
    },
    PlayRejected {
        reason: PlayError,
    },
    Error {
        message: String,
    },
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::GameState { state } => format!(
                "game state ({} seats, turn {})",
                state.player_count, state.turn
            ),
            Self::YourHand { player_index, hand } => {
                format!("hand for seat {player_index} ({} cards)", hand.len())
            }
            Self::GiveAllPrompt { from_name, .. } => format!("give-all prompt from {from_name}"),
            Self::GiveAllDenied { reason } => format!("give-all denied: {reason}"),
            Self::GiveAllResult { accepted, .. } => {
                let verdict = if *accepted { "accepted" } else { "rejected" };
                format!("give-all {verdict}")
            }
            Self::PlayersList { list } => format!("{} participants", list.len()),
            Self::LogEntry { entry } => entry.message.clone(),
            Self::PlayRejected { reason } => format!("play rejected: {reason}"),
            Self::Error { message } => format!("error: {message}"),
        };
        write!(f, "{repr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::utils::{decode, encode};

    #[test]
    fn join_request_defaults_version() {
        let msg: ClientMessage =
            decode(r#"{"type":"request_join","name":"Asha","peer_id":"p1"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::RequestJoin {
                name: "Asha".to_string(),
                peer_id: PeerId::new("p1"),
                version: ProtocolVersion::current(),
            }
        );
    }

    #[test]
    fn play_request_carries_card_object() {
        let msg: ClientMessage =
            decode(r#"{"type":"play_request","card":{"suit":"heart","rank":"10"}}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::PlayRequest {
                card: "10♥".parse().unwrap()
            }
        );
    }

    #[test]
    fn denial_reasons_are_snake_case() {
        let text = encode(&ServerMessage::GiveAllDenied {
            reason: GiveAllDenial::TargetUnreachable,
        })
        .unwrap();
        assert_eq!(
            text,
            r#"{"type":"give_all_denied","reason":"target_unreachable"}"#
        );
        let text = encode(&ServerMessage::PlayRejected {
            reason: PlayError::MustFollowSuit,
        })
        .unwrap();
        assert!(text.contains(r#""reason":"must_follow_suit""#));
    }

    #[test]
    fn unknown_type_is_an_error() {
        assert!(decode::<ClientMessage>(r#"{"type":"cheat"}"#).is_err());
    }
}
