//! # Kazhutha
//!
//! A trick-taking shedding card game for 2 to 8 players, played with a
//! single 52-card deck. Players race to empty their hands; the last one
//! still holding cards is the Kazhutha (the donkey).
//!
//! The crate is split into a pure rules engine and the host-side plumbing
//! that keeps every participant's view of the table in sync.
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, the authoritative [`KazhuthaState`], the public
//!   projection, and the [`MirrorState`] that non-host participants keep
//! - [`bot`]: Card selection for seats without a human behind them
//! - [`table`]: The table actor that owns the authoritative state, times
//!   trick pauses, and publishes snapshots to subscribers
//! - [`net`]: Wire messages and JSON helpers shared by server and client
//!
//! ## Example
//!
//! ```
//! use kazhutha::{KazhuthaState, game::entities::PlayerConfig};
//!
//! let mut game = KazhuthaState::new();
//! game.setup_players(vec![
//!     PlayerConfig::human("Asha", None),
//!     PlayerConfig::bot("Bot 1"),
//! ])
//! .unwrap();
//! game.deal();
//! assert_eq!(game.public_state().cards_accounted(), 52);
//! ```

/// Card-selection strategies for bot seats.
pub mod bot;

/// Core game logic, entities, and the rules engine.
pub mod game;
pub use game::{
    GiveAllDenial, GiveAllRequest, KazhuthaState, MirrorState, PendingTrick, Phase, PlayError,
    PlayOutcome, PublicState, SetupError, constants,
    entities::{self, Card, PeerId, Rank, SeatIndex, Suit},
};

/// Wire protocol shared by the server and clients.
pub mod net;
pub use net::{messages, utils};

/// The host-side table actor.
pub mod table;
pub use table::{TableActor, TableConfig, TableHandle};
