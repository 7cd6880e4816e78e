use kazhutha::{Card, messages::ClientMessage};
use std::fmt;

/// Something the player typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Play a card from hand.
    Play(Card),
    /// Ask someone for their whole hand. Either a seat number or a peer id.
    GiveAll(String),
    /// Accept the pending Give-All prompt.
    Accept,
    /// Reject the pending Give-All prompt.
    Reject,
    /// Start the game (host only).
    Start,
    /// Show the hand and table again.
    Show,
    Help,
    Quit,
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Play command without a card.
    PlayMissingCard,
    /// Card text that is not a rank followed by a suit.
    InvalidCard(String),
    /// Give-All command without a target.
    GiveAllMissingTarget,
    /// Unrecognized command.
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlayMissingCard => write!(f, "Play requires a card (e.g., 'play Q♥' or 'play QH')"),
            Self::InvalidCard(value) => write!(
                f,
                "Invalid card '{}'. Use a rank then a suit (e.g., '10S', 'A♠', 'kd')",
                value
            ),
            Self::GiveAllMissingTarget => write!(
                f,
                "Give-All requires a seat number or peer id (e.g., 'give 2')"
            ),
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{}'. Type 'help' to see available commands",
                cmd
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a command string into a [`Command`].
///
/// # Examples
///
/// ```
/// use kazhutha::Card;
/// use kz_client::commands::{Command, parse_command};
///
/// assert_eq!(parse_command("start"), Ok(Command::Start));
/// assert_eq!(parse_command("play A♠"), Ok(Command::Play(Card::ACE_OF_SPADES)));
/// assert_eq!(parse_command("give 2"), Ok(Command::GiveAll("2".to_string())));
/// ```
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let trimmed = input.trim();

    // Try single-word commands first
    match trimmed.to_ascii_lowercase().as_str() {
        "accept" | "yes" | "y" => return Ok(Command::Accept),
        "reject" | "no" | "n" => return Ok(Command::Reject),
        "start" => return Ok(Command::Start),
        "show" | "hand" => return Ok(Command::Show),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        _ => {}
    }

    // Parse multi-word commands
    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    match parts.first().map(|p| p.to_ascii_lowercase()).as_deref() {
        Some("play" | "p") => parse_play_command(&parts),
        Some("give" | "giveall" | "give-all") => match parts.get(1) {
            Some(target) => Ok(Command::GiveAll(target.to_string())),
            None => Err(ParseError::GiveAllMissingTarget),
        },
        _ => Err(ParseError::UnrecognizedCommand(trimmed.to_string())),
    }
}

/// Parse a play command: "play CARD"
fn parse_play_command(parts: &[&str]) -> Result<Command, ParseError> {
    let value = parts.get(1).ok_or(ParseError::PlayMissingCard)?;
    value
        .parse::<Card>()
        .map(Command::Play)
        .map_err(|_| ParseError::InvalidCard(value.to_string()))
}

impl Command {
    /// The frame this command sends, if it talks to the host at all.
    ///
    /// Give-All targets must already be resolved to a peer id.
    pub fn into_message(self) -> Option<ClientMessage> {
        match self {
            Self::Play(card) => Some(ClientMessage::PlayRequest { card }),
            Self::GiveAll(target) => Some(ClientMessage::GiveAllRequest {
                target_peer_id: target.into(),
            }),
            Self::Accept => Some(ClientMessage::GiveAllResponse { accepted: true }),
            Self::Reject => Some(ClientMessage::GiveAllResponse { accepted: false }),
            Self::Start => Some(ClientMessage::StartGame),
            Self::Show | Self::Help | Self::Quit => None,
        }
    }
}
