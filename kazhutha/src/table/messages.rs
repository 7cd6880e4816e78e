//! Table actor message types.

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::{
    game::{
        PublicState, SetupError,
        entities::{Card, PeerId},
    },
    net::{
        messages::{RosterEntry, ServerMessage},
        protocol_version::ProtocolVersion,
    },
};

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// Join the table. `outbox` receives every frame for this participant.
    Join {
        peer_id: PeerId,
        name: String,
        version: ProtocolVersion,
        outbox: mpsc::Sender<ServerMessage>,
        response: oneshot::Sender<TableResponse>,
    },

    /// Participant disconnected or left
    Leave { peer_id: PeerId },

    /// Deal a new game (host only)
    StartGame {
        peer_id: PeerId,
        response: oneshot::Sender<TableResponse>,
    },

    /// Play a card. Outcomes reach the participant through its outbox.
    PlayCard { peer_id: PeerId, card: Card },

    /// Ask another seat to give all their cards
    RequestGiveAll { peer_id: PeerId, target: PeerId },

    /// Target's answer to a pending Give-All
    RespondGiveAll { peer_id: PeerId, accepted: bool },

    /// Get current table state
    GetState {
        response: oneshot::Sender<TableStateResponse>,
    },

    /// Trick pause elapsed. Stale generations are ignored.
    FinalizeTrick { generation: u64 },

    /// Bot think delay elapsed. Stale generations are ignored.
    BotTurn { generation: u64 },

    /// Close the table
    Close {
        response: oneshot::Sender<TableResponse>,
    },
}

/// Response from table operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableResponse {
    /// Operation succeeded
    Success,

    /// Operation failed
    Error(String),

    /// Table is full
    TableFull,

    /// Peer id is already connected
    AlreadyJoined,

    /// Client speaks another protocol version
    IncompatibleVersion { server: ProtocolVersion },

    /// Game could not be set up
    Setup(SetupError),
}

impl TableResponse {
    /// Check if response is success
    pub fn is_success(&self) -> bool {
        matches!(self, TableResponse::Success)
    }

    /// Get error message if response is error
    pub fn error_message(&self) -> Option<String> {
        match self {
            TableResponse::Success => None,
            TableResponse::Error(msg) => Some(msg.clone()),
            TableResponse::TableFull => Some("Table is full".to_string()),
            TableResponse::AlreadyJoined => Some("Peer id already joined".to_string()),
            TableResponse::IncompatibleVersion { server } => {
                Some(format!("Incompatible protocol version, server speaks {server}"))
            }
            TableResponse::Setup(error) => Some(error.to_string()),
        }
    }
}

/// Table state response
#[derive(Debug, Clone, Serialize)]
pub struct TableStateResponse {
    /// Table name
    pub table_name: String,

    /// Maximum seats
    pub max_seats: usize,

    /// Bot seats filled at start
    pub bot_seats: usize,

    /// Has a game been dealt
    pub started: bool,

    /// Connected participants, host first
    pub roster: Vec<RosterEntry>,

    /// Public snapshot of the game
    pub state: PublicState,
}
