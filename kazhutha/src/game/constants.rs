use std::time::Duration;

/// Fewest seats a game can be dealt for.
pub const MIN_PLAYERS: usize = 2;

/// Most seats a game can be dealt for.
pub const MAX_PLAYERS: usize = 8;

pub const DECK_SIZE: usize = 52;

/// Player names and peer ids are truncated to this many characters.
pub const MAX_USER_INPUT_LENGTH: usize = 32;

/// How long a finished trick stays on the table before it is finalized.
pub const DEFAULT_TRICK_PAUSE: Duration = Duration::from_millis(3000);

/// How long a bot seat "thinks" before it plays.
pub const DEFAULT_BOT_THINK_DELAY: Duration = Duration::from_millis(600);

/// Oldest log entries are dropped once the engine holds this many unread.
pub const MAX_PENDING_LOG_ENTRIES: usize = 256;
