use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

use super::{
    constants::{MAX_PENDING_LOG_ENTRIES, MAX_PLAYERS, MIN_PLAYERS},
    entities::{Card, Deck, LogEntry, LogKind, Player, PlayerConfig, SeatIndex, Suit, sort_hand},
    give_all::GiveAllRequest,
    trick::{Trick, TrickPlay, TrickProgress},
};

/// Reasons a play is refused. Checked in declaration order; the first
/// failing check wins.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayError {
    #[error("game is over")]
    GameOver,
    #[error("turns are locked")]
    TurnLocked,
    #[error("not your turn")]
    NotYourTurn,
    #[error("must follow the lead suit")]
    MustFollowSuit,
    #[error("card is not in hand")]
    CardNotHeld,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupError {
    #[error("need at least {} players", MIN_PLAYERS)]
    NotEnoughPlayers,
    #[error("at most {} players can sit", MAX_PLAYERS)]
    TooManyPlayers,
    #[error("a game is already in progress")]
    GameInProgress,
    #[error("only the host can do that")]
    NotHost,
}

/// A completed trick waiting out its pause before it is cleared.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PendingTrick {
    /// Everyone followed suit; the cards are discarded.
    Clean { next_leader: SeatIndex },
    /// Someone broke suit; the collector takes every card on the table.
    Pickup { collector: SeatIndex },
}

impl PendingTrick {
    /// Seat that will lead once the trick is finalized.
    pub fn next_actor(&self) -> SeatIndex {
        match self {
            Self::Clean { next_leader } => *next_leader,
            Self::Pickup { collector } => *collector,
        }
    }
}

/// What the engine is waiting on, if anything.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    AwaitingTrickFinalize(PendingTrick),
    AwaitingGiveAllDecision(GiveAllRequest),
}

/// Result of an accepted play.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlayOutcome {
    /// The trick goes on (or the game just ended mid-trick).
    Continued,
    Clean { next_leader: SeatIndex },
    Pickup { collector: SeatIndex },
}

impl PlayOutcome {
    /// The seat shown as acting during the pause, when the trick ended.
    pub fn next_actor(&self) -> Option<SeatIndex> {
        match self {
            Self::Continued => None,
            Self::Clean { next_leader } => Some(*next_leader),
            Self::Pickup { collector } => Some(*collector),
        }
    }
}

impl From<PendingTrick> for PlayOutcome {
    fn from(value: PendingTrick) -> Self {
        match value {
            PendingTrick::Clean { next_leader } => Self::Clean { next_leader },
            PendingTrick::Pickup { collector } => Self::Pickup { collector },
        }
    }
}

/// The authoritative game. Only the host owns one; everyone else keeps a
/// [`MirrorState`](super::MirrorState) built from its projection.
///
/// The engine is synchronous and never sleeps. Trick pauses are the
/// caller's business: a completed trick parks the engine in
/// [`Phase::AwaitingTrickFinalize`] until [`finalize_pending_trick`] is
/// called.
///
/// [`finalize_pending_trick`]: KazhuthaState::finalize_pending_trick
#[derive(Debug, Default)]
pub struct KazhuthaState {
    pub(super) players: Vec<Player>,
    pub(super) leader: SeatIndex,
    pub(super) turn: SeatIndex,
    pub(super) trick: Trick,
    pub(super) discard_pile: Vec<Card>,
    pub(super) first_trick: bool,
    pub(super) game_over: bool,
    pub(super) dealt: bool,
    pub(super) phase: Phase,
    /// Host-side hold that keeps turns locked independently of `phase`.
    pub(super) held: bool,
    pub(super) display_turn: Option<SeatIndex>,
    log: VecDeque<LogEntry>,
}

impl KazhuthaState {
    pub fn new() -> Self {
        Self::default()
    }

    // === Setup ===

    /// Replaces the roster. Any game in progress is discarded.
    pub fn setup_players(&mut self, configs: Vec<PlayerConfig>) -> Result<(), SetupError> {
        if configs.len() < MIN_PLAYERS {
            return Err(SetupError::NotEnoughPlayers);
        }
        if configs.len() > MAX_PLAYERS {
            return Err(SetupError::TooManyPlayers);
        }
        *self = Self {
            players: configs.into_iter().map(Player::from).collect(),
            log: std::mem::take(&mut self.log),
            ..Self::default()
        };
        Ok(())
    }

    /// Shuffles a fresh deck and deals it.
    pub fn deal(&mut self) {
        self.deal_with_rng(&mut rand::rng());
    }

    pub fn deal_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut deck = Deck::default();
        deck.shuffle_with(rng);
        let per_player = deck.len() / self.players.len().max(1);
        let extras = deck.len() % self.players.len().max(1);
        let hands = deck.deal(self.players.len());
        self.deal_prepared(hands);
        if extras > 0 {
            self.push_log(
                format!("Cards per player: {per_player} ({extras} players get +1)"),
                LogKind::Info,
            );
        } else {
            self.push_log(format!("Cards per player: {per_player}"), LogKind::Info);
        }
    }

    /// Starts a game from hands chosen by the caller. Missing hands are
    /// treated as empty and extra hands are ignored.
    pub fn deal_prepared(&mut self, hands: Vec<Vec<Card>>) {
        let mut hands = hands.into_iter();
        for player in self.players.iter_mut() {
            player.hand = hands.next().unwrap_or_default();
            sort_hand(&mut player.hand);
            player.out = player.hand.is_empty();
        }

        let leader = self
            .players
            .iter()
            .position(|p| p.holds(&Card::ACE_OF_SPADES))
            .unwrap_or(0);
        self.leader = leader;
        self.turn = leader;
        self.first_trick = true;
        self.game_over = false;
        self.dealt = true;
        self.phase = Phase::Idle;
        self.held = false;
        self.display_turn = None;
        self.discard_pile.clear();
        self.trick = Trick::new(self.active_players_count());

        let name = self.name_of(leader);
        self.push_log(
            format!(
                "New {}-player game. {name} holds {} and leads.",
                self.players.len(),
                Card::ACE_OF_SPADES
            ),
            LogKind::Ok,
        );
    }

    // === Queries ===

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, seat: SeatIndex) -> Option<&Player> {
        self.players.get(seat)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn hand(&self, seat: SeatIndex) -> &[Card] {
        self.players.get(seat).map_or(&[], |p| p.hand.as_slice())
    }

    pub fn leader(&self) -> SeatIndex {
        self.leader
    }

    pub fn turn(&self) -> SeatIndex {
        self.turn
    }

    /// The seat shown as acting: the display override if set, else `turn`.
    pub fn effective_turn(&self) -> SeatIndex {
        self.display_turn.unwrap_or(self.turn)
    }

    pub fn display_turn(&self) -> Option<SeatIndex> {
        self.display_turn
    }

    pub fn trick(&self) -> &Trick {
        &self.trick
    }

    pub fn lead_suit(&self) -> Option<Suit> {
        self.trick.lead_suit()
    }

    pub fn is_first_trick(&self) -> bool {
        self.first_trick
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn pending_trick(&self) -> Option<PendingTrick> {
        match self.phase {
            Phase::AwaitingTrickFinalize(pending) => Some(pending),
            _ => None,
        }
    }

    pub fn discarded_count(&self) -> usize {
        self.discard_pile.len()
    }

    /// The seat left holding cards once the game is over.
    pub fn loser(&self) -> Option<SeatIndex> {
        if !self.game_over {
            return None;
        }
        self.players.iter().position(|p| !p.out)
    }

    pub fn active_players_count(&self) -> usize {
        self.players.iter().filter(|p| !p.out).count()
    }

    /// Cards in hands, on the table, and discarded. Constant for a deal.
    pub fn total_cards(&self) -> usize {
        self.players.iter().map(|p| p.hand.len()).sum::<usize>()
            + self.trick.len()
            + self.discard_pile.len()
    }

    /// Next seat anticlockwise (decreasing index, wrapping) that is still
    /// in the game. Returns `from` when nobody else is.
    pub fn next_active(&self, from: SeatIndex) -> SeatIndex {
        let n = self.players.len();
        if n == 0 {
            return from;
        }
        let mut seat = from % n;
        for _ in 0..n {
            seat = (seat + n - 1) % n;
            if !self.players[seat].out {
                return seat;
            }
        }
        from
    }

    /// Cards `seat` could legally play right now, ignoring whose turn it is.
    pub fn legal_cards(&self, seat: SeatIndex) -> Vec<Card> {
        let hand = self.hand(seat);
        match self.trick.lead_suit() {
            Some(lead) if hand.iter().any(|c| c.suit == lead) => {
                hand.iter().filter(|c| c.suit == lead).copied().collect()
            }
            _ => hand.to_vec(),
        }
    }

    // === Turn lock ===

    /// Turns are locked while a trick or give-all is pending, or while the
    /// host holds them.
    pub fn is_turn_locked(&self) -> bool {
        self.held || self.phase != Phase::Idle
    }

    pub fn lock_turn(&mut self) {
        self.held = true;
    }

    pub fn unlock_turn(&mut self) {
        self.held = false;
    }

    pub fn set_display_turn(&mut self, seat: Option<SeatIndex>) {
        self.display_turn = seat;
    }

    // === Play ===

    pub fn play_card(&mut self, seat: SeatIndex, card: Card) -> Result<PlayOutcome, PlayError> {
        if self.game_over {
            return Err(PlayError::GameOver);
        }
        if self.is_turn_locked() {
            return Err(PlayError::TurnLocked);
        }
        if !self.dealt || seat != self.turn || seat >= self.players.len() {
            return Err(PlayError::NotYourTurn);
        }
        let player = &self.players[seat];
        if let Some(lead) = self.trick.lead_suit() {
            if card.suit != lead && player.holds_suit(lead) {
                return Err(PlayError::MustFollowSuit);
            }
        }
        let Some(position) = player.hand.iter().position(|c| *c == card) else {
            return Err(PlayError::CardNotHeld);
        };

        self.players[seat].hand.remove(position);
        debug!("Seat {seat} played {card}");
        let name = self.name_of(seat);
        if self.players[seat].hand.is_empty() {
            self.players[seat].out = true;
            self.push_log(format!("{name} is out of cards!"), LogKind::Ok);
            self.check_game_end();
        }

        match self.trick.record(TrickPlay { player: seat, card }) {
            TrickProgress::Led => {
                self.push_log(format!("{name} leads {card}."), LogKind::Info);
            }
            TrickProgress::Followed { promoted: true } => {
                self.push_log(format!("{name} now highest with {card}."), LogKind::Info);
            }
            TrickProgress::Followed { promoted: false } => {}
            TrickProgress::OffSuit { collector } => {
                let lead = self.trick.lead_suit().map(|s| s.to_string()).unwrap_or_default();
                let collector_name = self.name_of(collector);
                self.push_log(
                    format!(
                        "{name} is void in {lead} and throws {card} → {collector_name} will pick up the trick!"
                    ),
                    LogKind::Bad,
                );
                let pending = PendingTrick::Pickup { collector };
                self.phase = Phase::AwaitingTrickFinalize(pending);
                return Ok(pending.into());
            }
        }

        if let Some(pending) = self.complete_clean_trick() {
            return Ok(pending.into());
        }
        if !self.game_over {
            self.turn = self.next_active(self.turn);
        }
        Ok(PlayOutcome::Continued)
    }

    /// Parks a fully-followed trick as pending. Does nothing if the trick
    /// still has seats to hear from.
    pub(super) fn complete_clean_trick(&mut self) -> Option<PendingTrick> {
        if !self.trick.is_complete() {
            return None;
        }
        let highest = self.trick.highest()?;
        let name = self.name_of(highest.player);
        self.push_log(
            format!(
                "Clean trick. Highest was {name} with {}. They lead next.",
                highest.card
            ),
            LogKind::Warn,
        );
        let pending = PendingTrick::Clean {
            next_leader: highest.player,
        };
        self.phase = Phase::AwaitingTrickFinalize(pending);
        self.check_game_end();
        Some(pending)
    }

    /// Applies the pending trick. Returns what was applied, or `None` if
    /// nothing was pending.
    pub fn finalize_pending_trick(&mut self) -> Option<PendingTrick> {
        let Phase::AwaitingTrickFinalize(pending) = self.phase else {
            return None;
        };
        self.phase = Phase::Idle;
        self.display_turn = None;

        let cards = self.trick.take_cards();
        match pending {
            PendingTrick::Pickup { collector } => {
                let name = self.name_of(collector);
                self.push_log(
                    format!("{name} picks up {} cards.", cards.len()),
                    LogKind::Bad,
                );
                let player = &mut self.players[collector];
                player.hand.extend(cards);
                sort_hand(&mut player.hand);
            }
            PendingTrick::Clean { .. } => self.discard_pile.extend(cards),
        }

        self.check_game_end();
        if self.game_over {
            self.trick = Trick::new(0);
        } else {
            self.begin_new_trick(pending.next_actor());
        }
        Some(pending)
    }

    /// Resets trick bookkeeping with `leader` to lead. A leader who is out
    /// hands the lead to the next active seat.
    fn begin_new_trick(&mut self, leader: SeatIndex) {
        let leader = match self.players.get(leader) {
            Some(p) if !p.out => leader,
            _ => self.next_active(leader),
        };
        self.leader = leader;
        self.turn = leader;
        self.first_trick = false;
        self.trick = Trick::new(self.active_players_count());
        debug!("Seat {leader} leads the next trick");
    }

    pub(super) fn check_game_end(&mut self) {
        if self.game_over || self.players.is_empty() || self.active_players_count() > 1 {
            return;
        }
        self.game_over = true;
        match self.players.iter().position(|p| !p.out) {
            Some(loser) => {
                let name = self.name_of(loser);
                self.push_log(
                    format!("Game over! {name} is the Kazhutha."),
                    LogKind::Bad,
                );
            }
            None => self.push_log("Game over!", LogKind::Bad),
        }
    }

    // === Roster changes ===

    /// A human seat is taken over by a bot, e.g. after a disconnect.
    pub fn hand_over_to_bot(&mut self, seat: SeatIndex) -> bool {
        let Some(player) = self.players.get_mut(seat) else {
            return false;
        };
        if !player.is_human {
            return false;
        }
        player.is_human = false;
        player.peer_id = None;
        let name = player.name.clone();
        self.push_log(format!("{name} left. A bot plays their seat."), LogKind::Warn);
        true
    }

    // === Log ===

    pub(super) fn name_of(&self, seat: SeatIndex) -> String {
        self.players
            .get(seat)
            .map_or_else(|| format!("Seat {seat}"), |p| p.name.clone())
    }

    pub(super) fn push_log(&mut self, message: impl Into<String>, kind: LogKind) {
        let entry = LogEntry::new(message, kind);
        info!("{}", entry.message);
        if self.log.len() == MAX_PENDING_LOG_ENTRIES {
            self.log.pop_front();
        }
        self.log.push_back(entry);
    }

    /// Removes the newest undrained entry if it carries `message`.
    pub(super) fn retract_log(&mut self, message: &str) {
        if self.log.back().is_some_and(|entry| entry.message == message) {
            self.log.pop_back();
        }
    }

    /// Drains log entries produced since the last call.
    pub fn take_log(&mut self) -> Vec<LogEntry> {
        self.log.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(s: &str) -> Card {
        s.parse().unwrap()
    }

    fn hands(layout: &[&[&str]]) -> Vec<Vec<Card>> {
        layout.iter()
            .map(|h| h.iter().map(|c| card(c)).collect())
            .collect()
    }

    fn game(layout: &[&[&str]]) -> KazhuthaState {
        let configs = (0..layout.len())
            .map(|i| PlayerConfig::bot(&format!("P{i}")))
            .collect();
        let mut game = KazhuthaState::new();
        game.setup_players(configs).unwrap();
        game.deal_prepared(hands(layout));
        game
    }

    // === Setup Tests ===

    #[test]
    fn setup_rejects_out_of_range_counts() {
        let mut game = KazhuthaState::new();
        assert_eq!(
            game.setup_players(vec![PlayerConfig::bot("a")]),
            Err(SetupError::NotEnoughPlayers)
        );
        let nine = (0..9).map(|i| PlayerConfig::bot(&i.to_string())).collect();
        assert_eq!(game.setup_players(nine), Err(SetupError::TooManyPlayers));
    }

    #[test]
    fn deal_gives_ace_of_spades_holder_the_lead() {
        let game = game(&[&["2♣"], &["3♣"], &["A♠", "4♣"]]);
        assert_eq!(game.leader(), 2);
        assert_eq!(game.turn(), 2);
        assert!(game.is_first_trick());
        assert_eq!(game.trick().active_at_start(), 3);
    }

    #[test]
    fn random_deal_conserves_the_deck() {
        let configs = (0..7).map(|i| PlayerConfig::bot(&i.to_string())).collect();
        let mut game = KazhuthaState::new();
        game.setup_players(configs).unwrap();
        game.deal();
        assert_eq!(game.total_cards(), 52);
        let holder = game.leader();
        assert!(game.hand(holder).contains(&Card::ACE_OF_SPADES));
    }

    // === Rotation Tests ===

    #[test]
    fn next_active_goes_anticlockwise_and_skips_out_seats() {
        let mut game = game(&[&["2♣"], &["3♣"], &["4♣"], &["A♠"]]);
        assert_eq!(game.next_active(0), 3);
        assert_eq!(game.next_active(3), 2);
        game.players[2].out = true;
        assert_eq!(game.next_active(3), 1);
    }

    // === Play Tests ===

    #[test]
    fn rejections_follow_precedence() {
        let mut game = game(&[&["A♠", "2♥"], &["3♠", "4♥"]]);
        assert_eq!(game.play_card(1, card("3♠")), Err(PlayError::NotYourTurn));
        assert_eq!(game.play_card(0, card("K♦")), Err(PlayError::CardNotHeld));
        game.play_card(0, card("A♠")).unwrap();
        assert_eq!(game.play_card(1, card("4♥")), Err(PlayError::MustFollowSuit));
        game.lock_turn();
        assert_eq!(game.play_card(1, card("3♠")), Err(PlayError::TurnLocked));
        game.unlock_turn();
        game.game_over = true;
        assert_eq!(game.play_card(1, card("3♠")), Err(PlayError::GameOver));
    }

    #[test]
    fn off_suit_play_is_a_pickup_for_the_highest() {
        let mut game = game(&[&["A♠", "2♠"], &["K♦", "3♦"], &["5♠", "6♥"]]);
        game.play_card(0, card("A♠")).unwrap();
        // Seat 2 is next anticlockwise from seat 0.
        game.play_card(2, card("5♠")).unwrap();
        let outcome = game.play_card(1, card("K♦")).unwrap();
        assert_eq!(outcome, PlayOutcome::Pickup { collector: 0 });
        assert!(game.is_turn_locked());

        assert_eq!(
            game.finalize_pending_trick(),
            Some(PendingTrick::Pickup { collector: 0 })
        );
        assert_eq!(game.hand(0).len(), 4);
        assert_eq!(game.turn(), 0);
        assert!(!game.is_first_trick());
        assert_eq!(game.total_cards(), 6);
    }

    #[test]
    fn clean_trick_discards_and_highest_leads() {
        let mut game = game(&[&["A♠", "2♥"], &["9♠", "3♥"], &["K♠", "4♥"]]);
        game.play_card(0, card("A♠")).unwrap();
        game.play_card(2, card("K♠")).unwrap();
        let outcome = game.play_card(1, card("9♠")).unwrap();
        assert_eq!(outcome, PlayOutcome::Clean { next_leader: 0 });
        game.finalize_pending_trick();
        assert_eq!(game.discarded_count(), 3);
        assert_eq!(game.leader(), 0);
        assert_eq!(game.trick().active_at_start(), 3);
    }

    #[test]
    fn finalize_without_pending_is_a_no_op() {
        let mut game = game(&[&["A♠"], &["2♠"]]);
        assert_eq!(game.finalize_pending_trick(), None);
        assert_eq!(game.turn(), 0);
    }

    #[test]
    fn last_player_holding_cards_loses() {
        let mut game = game(&[&["A♠"], &["2♠", "3♥"]]);
        let outcome = game.play_card(0, card("A♠")).unwrap();
        assert_eq!(outcome, PlayOutcome::Continued);
        assert!(game.is_game_over());
        assert_eq!(game.loser(), Some(1));
        assert_eq!(game.play_card(1, card("2♠")), Err(PlayError::GameOver));
    }

    #[test]
    fn game_ends_when_the_second_to_last_hand_empties() {
        let mut game = game(&[&["A♠", "2♦"], &["3♠", "4♦"], &["K♥", "5♠", "6♦"]]);
        game.play_card(0, card("A♠")).unwrap();
        game.play_card(2, card("5♠")).unwrap();
        game.play_card(1, card("3♠")).unwrap();
        game.finalize_pending_trick();
        game.play_card(0, card("2♦")).unwrap();
        assert!(game.players()[0].out);
        game.play_card(2, card("6♦")).unwrap();
        let outcome = game.play_card(1, card("4♦")).unwrap();
        assert_eq!(outcome, PlayOutcome::Clean { next_leader: 2 });
        assert!(game.is_game_over());
        game.finalize_pending_trick();
        assert_eq!(game.loser(), Some(2));
    }

    #[test]
    fn out_leader_passes_the_lead() {
        let mut game = game(&[&["A♠"], &["3♠", "4♦"], &["5♠", "6♦", "7♦"]]);
        game.play_card(0, card("A♠")).unwrap();
        game.play_card(2, card("5♠")).unwrap();
        let outcome = game.play_card(1, card("3♠")).unwrap();
        assert_eq!(outcome, PlayOutcome::Clean { next_leader: 0 });
        game.finalize_pending_trick();
        assert_eq!(game.leader(), 2);
        assert_eq!(game.turn(), 2);
        assert_eq!(game.trick().active_at_start(), 2);
    }

    #[test]
    fn legal_cards_restricts_to_lead_suit_when_held() {
        let mut game = game(&[&["A♠", "2♥"], &["3♠", "4♥"]]);
        game.play_card(0, card("A♠")).unwrap();
        assert_eq!(game.legal_cards(1), vec![card("3♠")]);
        assert_eq!(game.legal_cards(0), vec![card("2♥")]);
    }
}
