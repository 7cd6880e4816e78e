//! WebSocket client for a Kazhutha table.

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use kazhutha::{
    MirrorState, PeerId,
    messages::{ClientMessage, RosterEntry, ServerMessage},
    net::protocol_version::ProtocolVersion,
    utils,
};
use log::{debug, warn};
use std::sync::Arc;
use tokio::{io::AsyncBufReadExt, sync::Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::{
    commands::{Command, parse_command},
    display::{HELP, render_log, render_table},
};

/// What to do after a typed command.
#[derive(Debug, Default, PartialEq)]
pub struct Reply {
    /// Frame for the host, if any.
    pub message: Option<ClientMessage>,
    /// Lines to print locally.
    pub notes: Vec<String>,
    pub quit: bool,
}

/// Local view of the table built only from what the host sends.
#[derive(Debug, Default)]
pub struct ClientSession {
    mirror: MirrorState,
    roster: Vec<RosterEntry>,
    prompt_from: Option<String>,
}

impl ClientSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mirror(&self) -> &MirrorState {
        &self.mirror
    }

    pub fn roster(&self) -> &[RosterEntry] {
        &self.roster
    }

    /// Name of the player waiting on our Give-All answer.
    pub fn prompt_from(&self) -> Option<&str> {
        self.prompt_from.as_deref()
    }

    /// Applies a host frame and returns the lines to show.
    pub fn apply_server_message(&mut self, message: ServerMessage) -> Vec<String> {
        match message {
            ServerMessage::GameState { state } => {
                if state.give_all_request.is_none() {
                    self.prompt_from = None;
                }
                self.mirror.apply_host_state(state);
                // Seated players redraw once their hand arrives.
                if self.mirror.seat().is_none() {
                    vec![render_table(&self.mirror)]
                } else {
                    Vec::new()
                }
            }
            ServerMessage::YourHand { player_index, hand } => {
                self.mirror.apply_own_hand(player_index, hand);
                vec![render_table(&self.mirror)]
            }
            ServerMessage::GiveAllPrompt { from_name, .. } => {
                let line = format!(
                    "{from_name} asks you to give all your cards. Type 'accept' or 'reject'."
                );
                self.prompt_from = Some(from_name);
                vec![line]
            }
            ServerMessage::GiveAllDenied { reason } => {
                vec![format!("Give-All request denied: {reason}")]
            }
            ServerMessage::GiveAllResult {
                accepted,
                target_index,
                ..
            } => {
                let target = self.seat_name(target_index);
                let verdict = if accepted { "accepted" } else { "rejected" };
                vec![format!("{target} {verdict} your Give-All request.")]
            }
            ServerMessage::PlayersList { list } => {
                let names = list
                    .iter()
                    .map(|entry| {
                        if entry.is_host {
                            format!("{} (host)", entry.name)
                        } else {
                            entry.name.clone()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                self.roster = list;
                vec![format!("Players: {names}")]
            }
            ServerMessage::LogEntry { entry } => vec![render_log(&entry)],
            ServerMessage::PlayRejected { reason } => vec![format!("Play rejected: {reason}")],
            ServerMessage::Error { message } => vec![format!("Error: {message}")],
        }
    }

    /// Turns a typed command into a frame and local notes.
    pub fn handle_command(&mut self, command: Command) -> Reply {
        let mut reply = Reply::default();
        match command {
            Command::Quit => reply.quit = true,
            Command::Help => reply.notes.push(HELP.to_string()),
            Command::Show => reply.notes.push(render_table(&self.mirror)),
            Command::Play(card) => {
                // The host has the final word; this only warns early.
                if let Err(reason) = self.mirror.check_play(card) {
                    reply.notes.push(format!("Note: {reason}"));
                }
                reply.message = Command::Play(card).into_message();
            }
            Command::GiveAll(target) => {
                let target = self.resolve_target(&target);
                reply.message = Some(ClientMessage::GiveAllRequest {
                    target_peer_id: target,
                });
            }
            command @ (Command::Accept | Command::Reject) => {
                if self.prompt_from.take().is_none() {
                    reply.notes.push("Note: no Give-All request is waiting for you".to_string());
                }
                reply.message = command.into_message();
            }
            Command::Start => reply.message = Command::Start.into_message(),
        }
        reply
    }

    /// A seat number (1-based) or roster name maps to that peer's id.
    /// Anything else is taken as a peer id.
    pub fn resolve_target(&self, target: &str) -> PeerId {
        let players = &self.mirror.public().players;
        if let Ok(number) = target.parse::<usize>() {
            if let Some(peer_id) = number
                .checked_sub(1)
                .and_then(|seat| players.get(seat))
                .and_then(|p| p.peer_id.clone())
            {
                return peer_id;
            }
        }
        self.roster
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(target))
            .map(|entry| entry.peer_id.clone())
            .unwrap_or_else(|| PeerId::new(target))
    }

    fn seat_name(&self, seat: usize) -> String {
        self.mirror
            .public()
            .players
            .get(seat)
            .map_or_else(|| format!("Player {}", seat + 1), |p| p.name.clone())
    }
}

/// WebSocket game client
pub struct WebSocketClient {
    ws_url: String,
    name: String,
    peer_id: PeerId,
}

impl WebSocketClient {
    /// Create a new WebSocket client
    pub fn new(ws_url: String, name: String, peer_id: PeerId) -> Self {
        Self {
            ws_url,
            name,
            peer_id,
        }
    }

    /// The first frame sent on a new connection.
    pub fn join_message(&self) -> ClientMessage {
        ClientMessage::RequestJoin {
            name: self.name.clone(),
            peer_id: self.peer_id.clone(),
            version: ProtocolVersion::current(),
        }
    }

    /// Connect to the host and run the session until quit or disconnect.
    pub async fn connect_and_play(self) -> Result<()> {
        println!("Connecting to {}...", self.ws_url);

        let (ws_stream, _) = connect_async(&self.ws_url)
            .await
            .context("Failed to connect to WebSocket")?;
        let (mut write, mut read) = ws_stream.split();

        let join = utils::encode(&self.join_message())?;
        write
            .send(Message::Text(join.into()))
            .await
            .context("Failed to send join request")?;
        println!("Connected as {} ({}). Type 'help' for commands.\n", self.name, self.peer_id);

        let session = Arc::new(Mutex::new(ClientSession::new()));

        let read_session = session.clone();
        let mut read_handle = tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => match utils::decode::<ServerMessage>(text.as_str()) {
                        Ok(frame) => {
                            debug!("Received {}", frame);
                            let lines = read_session.lock().await.apply_server_message(frame);
                            for line in lines {
                                println!("{line}");
                            }
                        }
                        Err(e) => warn!("Failed to parse server frame: {}", e),
                    },
                    Ok(Message::Close(_)) => {
                        println!("Server closed connection");
                        break;
                    }
                    Err(e) => {
                        eprintln!("WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        });

        let mut stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut line = String::new();

        loop {
            line.clear();
            let read_line = tokio::select! {
                result = stdin.read_line(&mut line) => result,
                _ = &mut read_handle => break,
            };
            match read_line {
                Ok(0) => break,
                Ok(_) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let command = match parse_command(&line) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{e}");
                            continue;
                        }
                    };

                    let reply = session.lock().await.handle_command(command);
                    for note in &reply.notes {
                        println!("{note}");
                    }
                    if reply.quit {
                        println!("Disconnecting...");
                        break;
                    }
                    if let Some(message) = reply.message {
                        let json = utils::encode(&message)?;
                        write
                            .send(Message::Text(json.into()))
                            .await
                            .context("Failed to send command")?;
                    }
                }
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    break;
                }
            }
        }

        let _ = write.close().await;
        read_handle.abort();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kazhutha::{
        Card, GiveAllDenial, PlayError, PublicState,
        entities::{LogEntry, LogKind},
        game::PlayerView,
    };

    fn card(s: &str) -> Card {
        s.parse().unwrap()
    }

    fn seat(name: &str, peer: Option<&str>) -> PlayerView {
        PlayerView {
            name: name.to_string(),
            is_human: peer.is_some(),
            hand_count: 3,
            out: false,
            peer_id: peer.map(PeerId::new),
        }
    }

    fn snapshot() -> PublicState {
        PublicState {
            players: vec![seat("Asha", Some("p-asha")), seat("Ravi", Some("p-ravi"))],
            player_count: 2,
            turn: 1,
            ..Default::default()
        }
    }

    // === Frame Tests ===

    #[test]
    fn test_snapshot_waits_for_hand_when_seated() {
        let mut session = ClientSession::new();
        let lines = session.apply_server_message(ServerMessage::YourHand {
            player_index: 1,
            hand: vec![card("3♣"), card("A♠")],
        });
        assert_eq!(lines.len(), 1);

        let lines = session.apply_server_message(ServerMessage::GameState { state: snapshot() });
        assert!(lines.is_empty());
        assert_eq!(session.mirror().hand(), &[card("A♠"), card("3♣")][..]);
        assert!(session.mirror().is_my_turn());
    }

    #[test]
    fn test_spectator_renders_each_snapshot() {
        let mut session = ClientSession::new();
        let lines = session.apply_server_message(ServerMessage::GameState { state: snapshot() });
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Ravi"));
    }

    #[test]
    fn test_prompt_tracked_until_answered() {
        let mut session = ClientSession::new();
        let lines = session.apply_server_message(ServerMessage::GiveAllPrompt {
            from_peer_id: Some(PeerId::new("p-asha")),
            from_index: 0,
            from_name: "Asha".to_string(),
        });
        assert!(lines[0].contains("Asha asks you"));
        assert_eq!(session.prompt_from(), Some("Asha"));

        let reply = session.handle_command(Command::Accept);
        assert_eq!(
            reply.message,
            Some(ClientMessage::GiveAllResponse { accepted: true })
        );
        assert!(reply.notes.is_empty());
        assert_eq!(session.prompt_from(), None);
    }

    #[test]
    fn test_feedback_lines() {
        let mut session = ClientSession::new();
        session.apply_server_message(ServerMessage::GameState { state: snapshot() });

        let lines = session.apply_server_message(ServerMessage::GiveAllDenied {
            reason: GiveAllDenial::NoSelfTarget,
        });
        assert!(lines[0].starts_with("Give-All request denied"));

        let lines = session.apply_server_message(ServerMessage::GiveAllResult {
            accepted: false,
            from_index: 0,
            target_index: 1,
        });
        assert_eq!(lines[0], "Ravi rejected your Give-All request.");

        let lines = session.apply_server_message(ServerMessage::PlayRejected {
            reason: PlayError::MustFollowSuit,
        });
        assert!(lines[0].starts_with("Play rejected"));

        let lines = session.apply_server_message(ServerMessage::LogEntry {
            entry: LogEntry::new("Clean trick.", LogKind::Ok),
        });
        assert!(lines[0].ends_with("Clean trick."));
    }

    // === Command Tests ===

    #[test]
    fn test_give_all_target_resolution() {
        let mut session = ClientSession::new();
        session.apply_server_message(ServerMessage::GameState { state: snapshot() });
        session.apply_server_message(ServerMessage::PlayersList {
            list: vec![
                RosterEntry {
                    peer_id: PeerId::new("p-asha"),
                    name: "Asha".to_string(),
                    is_host: true,
                },
                RosterEntry {
                    peer_id: PeerId::new("p-ravi"),
                    name: "Ravi".to_string(),
                    is_host: false,
                },
            ],
        });

        assert_eq!(session.resolve_target("2"), PeerId::new("p-ravi"));
        assert_eq!(session.resolve_target("asha"), PeerId::new("p-asha"));
        assert_eq!(session.resolve_target("p-zed"), PeerId::new("p-zed"));
    }

    #[test]
    fn test_play_warns_but_still_sends() {
        let mut session = ClientSession::new();
        session.apply_server_message(ServerMessage::GameState { state: snapshot() });
        session.apply_server_message(ServerMessage::YourHand {
            player_index: 0,
            hand: vec![card("4♦")],
        });

        let reply = session.handle_command(Command::Play(card("4♦")));
        assert_eq!(
            reply.message,
            Some(ClientMessage::PlayRequest { card: card("4♦") })
        );
        assert_eq!(reply.notes.len(), 1);
    }

    #[test]
    fn test_quit_and_help_stay_local() {
        let mut session = ClientSession::new();
        let reply = session.handle_command(Command::Quit);
        assert!(reply.quit);
        assert!(reply.message.is_none());

        let reply = session.handle_command(Command::Help);
        assert!(reply.notes[0].contains("give SEAT|PEER"));
    }
}
