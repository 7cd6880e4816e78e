//! Plain-text rendering of the mirrored table.

use kazhutha::{
    Card, MirrorState, PublicState,
    entities::{LogEntry, LogKind},
};

pub const HELP: &str = "\
Commands:
  play CARD        Play a card, e.g. 'play Q♥' or 'p qh'
  give SEAT|PEER   Ask a player to give you their whole hand
  accept / reject  Answer a Give-All request
  start            Deal a new game (host only)
  show             Show the table and your hand again
  help             Show this help
  quit             Leave the table";

/// Render cards separated by spaces.
pub fn render_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(Card::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// One line per seat, then the trick on the table and the own hand.
pub fn render_table(mirror: &MirrorState) -> String {
    let state = mirror.public();
    let mut lines = Vec::new();

    for (seat, player) in state.players.iter().enumerate() {
        let marker = if seat == state.turn && !state.game_over {
            '>'
        } else {
            ' '
        };
        let mut tags = Vec::new();
        if Some(seat) == mirror.seat() {
            tags.push("you");
        }
        if seat == state.leader {
            tags.push("leader");
        }
        if !player.is_human {
            tags.push("bot");
        }
        if player.out {
            tags.push("out");
        }
        let tags = if tags.is_empty() {
            String::new()
        } else {
            format!(" ({})", tags.join(", "))
        };
        lines.push(format!(
            "{marker} {}. {}{tags}: {} cards",
            seat + 1,
            player.name,
            player.hand_count
        ));
    }

    lines.push(render_trick(state));
    if let Some(status) = render_status(mirror) {
        lines.push(status);
    }
    if mirror.seat().is_some() {
        lines.push(format!("Your hand: {}", render_cards(mirror.hand())));
    }
    lines.join("\n")
}

fn render_trick(state: &PublicState) -> String {
    if state.trick.is_empty() {
        return "Table: (empty)".to_string();
    }
    let plays = state
        .trick
        .iter()
        .map(|play| {
            let name = state
                .players
                .get(play.player)
                .map_or("?", |p| p.name.as_str());
            format!("{name} {}", play.card)
        })
        .collect::<Vec<_>>()
        .join(", ");
    match state.lead_suit {
        Some(lead) => format!("Table ({lead} led): {plays}"),
        None => format!("Table: {plays}"),
    }
}

fn render_status(mirror: &MirrorState) -> Option<String> {
    let state = mirror.public();
    if state.game_over {
        let loser = state
            .loser()
            .and_then(|seat| state.players.get(seat))
            .map_or("Nobody", |p| p.name.as_str());
        return Some(format!("Game over. {loser} is the Kazhutha."));
    }
    if state.turn_locked {
        return Some("Waiting for the trick to clear...".to_string());
    }
    if mirror.is_my_turn() {
        return Some(match mirror.lead_suit() {
            Some(lead) => format!("Your turn. Follow {lead} if you can."),
            None => "Your turn to lead.".to_string(),
        });
    }
    None
}

/// A log line with a severity prefix.
pub fn render_log(entry: &LogEntry) -> String {
    let prefix = match entry.kind {
        LogKind::Info => "",
        LogKind::Ok => "+ ",
        LogKind::Warn => "! ",
        LogKind::Bad => "x ",
    };
    format!("{prefix}{entry}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use kazhutha::game::PlayerView;

    fn card(s: &str) -> Card {
        s.parse().unwrap()
    }

    fn mirror() -> MirrorState {
        let mut mirror = MirrorState::new();
        mirror.apply_own_hand(0, vec![card("2♥"), card("A♠")]);
        mirror.apply_host_state(PublicState {
            players: vec![
                PlayerView {
                    name: "Asha".to_string(),
                    is_human: true,
                    hand_count: 2,
                    out: false,
                    peer_id: None,
                },
                PlayerView {
                    name: "Bot 1".to_string(),
                    is_human: false,
                    hand_count: 3,
                    out: false,
                    peer_id: None,
                },
            ],
            player_count: 2,
            first_trick: true,
            ..Default::default()
        });
        mirror
    }

    #[test]
    fn test_render_table_marks_turn_and_hand() {
        let text = render_table(&mirror());
        assert!(text.contains("> 1. Asha (you, leader): 2 cards"));
        assert!(text.contains("2. Bot 1 (bot): 3 cards"));
        assert!(text.contains("Your turn to lead."));
        assert!(text.contains("Your hand: A♠ 2♥"));
    }

    #[test]
    fn test_render_game_over() {
        let mut mirror = mirror();
        let mut state = mirror.public().clone();
        state.game_over = true;
        state.players[0].out = true;
        mirror.apply_host_state(state);
        assert!(render_table(&mirror).contains("Bot 1 is the Kazhutha."));
    }

    #[test]
    fn test_render_log_prefix() {
        let entry = LogEntry::new("Game over!", LogKind::Bad);
        assert!(render_log(&entry).starts_with("x ["));
    }
}
