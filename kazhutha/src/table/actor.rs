//! Table actor implementation with async message handling.

use log::{debug, info, warn};
use std::{collections::HashMap, time::Duration};
use thiserror::Error;
use tokio::{
    sync::{
        mpsc::{self, error::TrySendError},
        oneshot,
    },
    task::JoinHandle,
    time::sleep,
};

use super::{
    config::TableConfig,
    messages::{TableMessage, TableResponse, TableStateResponse},
};
use crate::{
    bot::{BotDecisionMaker, BotStrategy},
    game::{
        GiveAllDenial, GiveAllRequest, KazhuthaState, PlayError, PublicState, SetupError,
        entities::{Card, PeerId, PlayerConfig, SeatIndex, sanitize_name},
    },
    net::{
        messages::{RosterEntry, ServerMessage},
        protocol_version::ProtocolVersion,
    },
};

const INBOX_CAPACITY: usize = 100;

/// Suggested capacity for a participant's outbox channel.
pub const OUTBOX_CAPACITY: usize = 256;

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("table is closed")]
pub struct TableClosed;

/// Table actor handle for sending messages
#[derive(Clone, Debug)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
}

impl TableHandle {
    /// Create a new table handle
    pub fn new(sender: mpsc::Sender<TableMessage>) -> Self {
        Self { sender }
    }

    /// Send a message to the table
    pub async fn send(&self, message: TableMessage) -> Result<(), TableClosed> {
        self.sender.send(message).await.map_err(|_| TableClosed)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> TableMessage,
    ) -> Result<T, TableClosed> {
        let (response, receiver) = oneshot::channel();
        self.send(build(response)).await?;
        receiver.await.map_err(|_| TableClosed)
    }

    pub async fn join(
        &self,
        peer_id: PeerId,
        name: &str,
        version: ProtocolVersion,
        outbox: mpsc::Sender<ServerMessage>,
    ) -> Result<TableResponse, TableClosed> {
        let name = name.to_string();
        self.request(|response| TableMessage::Join {
            peer_id,
            name,
            version,
            outbox,
            response,
        })
        .await
    }

    pub async fn leave(&self, peer_id: PeerId) -> Result<(), TableClosed> {
        self.send(TableMessage::Leave { peer_id }).await
    }

    pub async fn start_game(&self, peer_id: PeerId) -> Result<TableResponse, TableClosed> {
        self.request(|response| TableMessage::StartGame { peer_id, response })
            .await
    }

    pub async fn play_card(&self, peer_id: PeerId, card: Card) -> Result<(), TableClosed> {
        self.send(TableMessage::PlayCard { peer_id, card }).await
    }

    pub async fn request_give_all(
        &self,
        peer_id: PeerId,
        target: PeerId,
    ) -> Result<(), TableClosed> {
        self.send(TableMessage::RequestGiveAll { peer_id, target })
            .await
    }

    pub async fn respond_give_all(
        &self,
        peer_id: PeerId,
        accepted: bool,
    ) -> Result<(), TableClosed> {
        self.send(TableMessage::RespondGiveAll { peer_id, accepted })
            .await
    }

    pub async fn state(&self) -> Result<TableStateResponse, TableClosed> {
        self.request(|response| TableMessage::GetState { response })
            .await
    }

    pub async fn close(&self) -> Result<TableResponse, TableClosed> {
        self.request(|response| TableMessage::Close { response })
            .await
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// A connected participant and where its frames go.
struct Participant {
    peer_id: PeerId,
    name: String,
    outbox: mpsc::Sender<ServerMessage>,
}

impl Participant {
    fn deliver(&self, message: ServerMessage) -> bool {
        self.deliver_all(vec![message])
    }

    /// Queues the frames together or not at all, so a snapshot never
    /// arrives without the hand that goes with it.
    fn deliver_all(&self, batch: Vec<ServerMessage>) -> bool {
        if batch.is_empty() {
            return true;
        }
        match self.outbox.try_reserve_many(batch.len()) {
            Ok(permits) => {
                for (permit, message) in permits.zip(batch) {
                    permit.send(message);
                }
                true
            }
            Err(TrySendError::Full(())) => {
                warn!(
                    "Outbox for {} full, dropping {} frames",
                    self.peer_id,
                    batch.len()
                );
                false
            }
            Err(TrySendError::Closed(())) => {
                debug!("Outbox for {} closed", self.peer_id);
                false
            }
        }
    }
}

/// Table actor owning the authoritative game
pub struct TableActor {
    /// Table configuration
    config: TableConfig,

    /// The authoritative game
    state: KazhuthaState,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    /// Handed to timer tasks so they never keep the table alive
    timer_sender: mpsc::WeakSender<TableMessage>,

    /// Connected participants in join order. The first is the host.
    participants: Vec<Participant>,

    /// Peer id to seat for the dealt game. Departed peers stay mapped so
    /// requests naming them are reported unreachable.
    seats: HashMap<PeerId, SeatIndex>,

    /// Card selection for bot seats
    bot: Box<dyn BotStrategy>,

    pause_timer: Option<JoinHandle<()>>,
    pause_generation: u64,

    bot_timer: Option<JoinHandle<()>>,
    bot_generation: u64,

    /// Has a game been dealt
    started: bool,

    /// Is table closed
    is_closed: bool,
}

impl TableActor {
    /// Create a new table actor with the default bot heuristic
    pub fn new(config: TableConfig) -> (Self, TableHandle) {
        Self::with_strategy(config, Box::new(BotDecisionMaker))
    }

    pub fn with_strategy(config: TableConfig, bot: Box<dyn BotStrategy>) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);

        let actor = Self {
            config,
            state: KazhuthaState::new(),
            inbox,
            timer_sender: sender.downgrade(),
            participants: Vec::new(),
            seats: HashMap::new(),
            bot,
            pause_timer: None,
            pause_generation: 0,
            bot_timer: None,
            bot_generation: 0,
            started: false,
            is_closed: false,
        };

        (actor, TableHandle::new(sender))
    }

    /// Spawns the actor on the current runtime.
    pub fn spawn(config: TableConfig) -> TableHandle {
        let (actor, handle) = Self::new(config);
        tokio::spawn(actor.run());
        handle
    }

    /// Run the table actor event loop. Returns once the table is closed or
    /// every handle has been dropped.
    pub async fn run(mut self) {
        info!("Table '{}' starting", self.config.name);

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message);

            if self.is_closed {
                break;
            }
        }

        self.cancel_timers();
        info!("Table '{}' closed", self.config.name);
    }

    fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::Join {
                peer_id,
                name,
                version,
                outbox,
                response,
            } => {
                let result = self.handle_join(peer_id, &name, version, outbox);
                let _ = response.send(result);
            }

            TableMessage::Leave { peer_id } => self.handle_leave(&peer_id),

            TableMessage::StartGame { peer_id, response } => {
                let result = self.handle_start(&peer_id);
                let _ = response.send(result);
            }

            TableMessage::PlayCard { peer_id, card } => self.handle_play(&peer_id, card),

            TableMessage::RequestGiveAll { peer_id, target } => {
                if let Err(reason) = self.open_give_all(&peer_id, &target) {
                    info!("Give-All from {peer_id} to {target} denied: {reason}");
                    self.send_to(&peer_id, ServerMessage::GiveAllDenied { reason });
                    if matches!(
                        reason,
                        GiveAllDenial::TrickInProgress | GiveAllDenial::AnotherRequestPending
                    ) {
                        self.resync(&peer_id);
                    }
                }
            }

            TableMessage::RespondGiveAll { peer_id, accepted } => {
                self.handle_give_all_response(&peer_id, accepted);
            }

            TableMessage::GetState { response } => {
                let _ = response.send(self.get_state());
            }

            TableMessage::FinalizeTrick { generation } => self.handle_finalize(generation),

            TableMessage::BotTurn { generation } => self.handle_bot_turn(generation),

            TableMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(TableResponse::Success);
            }
        }
    }

    // === Roster ===

    fn handle_join(
        &mut self,
        peer_id: PeerId,
        name: &str,
        version: ProtocolVersion,
        outbox: mpsc::Sender<ServerMessage>,
    ) -> TableResponse {
        let server = ProtocolVersion::current();
        if !version.is_compatible_with(&server) {
            return TableResponse::IncompatibleVersion { server };
        }
        if peer_id.is_empty() {
            return TableResponse::Error("Peer id must not be empty".to_string());
        }
        if self.participants.iter().any(|p| p.peer_id == peer_id) {
            return TableResponse::AlreadyJoined;
        }
        let in_progress = self.started && !self.state.is_game_over();
        if !in_progress && self.participants.len() >= self.config.human_seats() {
            return TableResponse::TableFull;
        }

        // A returning peer watches; its old seat stays with the bot.
        self.seats.remove(&peer_id);

        let name = sanitize_name(name);
        info!("{name} ({peer_id}) joined table '{}'", self.config.name);
        self.participants.push(Participant {
            peer_id: peer_id.clone(),
            name,
            outbox,
        });
        self.broadcast_roster();
        if self.started {
            self.resync(&peer_id);
        }
        TableResponse::Success
    }

    fn handle_leave(&mut self, peer_id: &PeerId) {
        let Some(position) = self.participants.iter().position(|p| &p.peer_id == peer_id) else {
            return;
        };
        let participant = self.participants.remove(position);
        info!(
            "{} ({peer_id}) left table '{}'",
            participant.name, self.config.name
        );

        let seat = self.seats.get(peer_id).copied();
        if let Some(seat) = seat {
            if self.started && !self.state.is_game_over() {
                self.release_seat(seat);
            }
        }
        self.broadcast_roster();
    }

    /// Hands a departed human's seat to the bot and settles any Give-All
    /// waiting on them.
    fn release_seat(&mut self, seat: SeatIndex) {
        if let Some(request) = self.state.give_all_request() {
            if request.target == seat {
                self.resolve_give_all(request, false);
            } else if request.requester == seat {
                self.state.cancel_give_all();
            }
        }
        self.state.hand_over_to_bot(seat);
        self.publish();
        self.schedule_bot();
    }

    /// Host first, then everyone else ordered by peer id.
    fn roster(&self) -> Vec<RosterEntry> {
        let Some((host, rest)) = self.participants.split_first() else {
            return Vec::new();
        };
        let mut others: Vec<&Participant> = rest.iter().collect();
        others.sort_by(|a, b| a.peer_id.cmp(&b.peer_id));
        std::iter::once(host)
            .chain(others)
            .map(|p| RosterEntry {
                peer_id: p.peer_id.clone(),
                name: p.name.clone(),
                is_host: p.peer_id == host.peer_id,
            })
            .collect()
    }

    fn broadcast_roster(&self) {
        let list = self.roster();
        for participant in &self.participants {
            participant.deliver(ServerMessage::PlayersList { list: list.clone() });
        }
    }

    // === Game lifecycle ===

    fn handle_start(&mut self, peer_id: &PeerId) -> TableResponse {
        if self.started && !self.state.is_game_over() {
            return TableResponse::Setup(SetupError::GameInProgress);
        }
        if self.participants.first().map(|p| &p.peer_id) != Some(peer_id) {
            return TableResponse::Setup(SetupError::NotHost);
        }

        let humans = self.roster();
        if let Err(error) = self.config.check_seat_count(humans.len()) {
            return TableResponse::Setup(error);
        }
        let mut configs: Vec<PlayerConfig> = humans
            .iter()
            .map(|entry| PlayerConfig::human(&entry.name, Some(entry.peer_id.clone())))
            .collect();
        configs.extend((0..self.config.bot_seats).map(|i| PlayerConfig::bot(&format!("Bot {}", i + 1))));
        if let Err(error) = self.state.setup_players(configs) {
            return TableResponse::Setup(error);
        }

        self.cancel_timers();
        self.seats = humans
            .into_iter()
            .enumerate()
            .map(|(seat, entry)| (entry.peer_id, seat))
            .collect();
        self.state.deal();
        self.started = true;
        info!(
            "Table '{}' dealt a {}-player game",
            self.config.name,
            self.state.player_count()
        );

        self.publish();
        self.schedule_bot();
        TableResponse::Success
    }

    fn handle_play(&mut self, peer_id: &PeerId, card: Card) {
        let Some(&seat) = self.seats.get(peer_id) else {
            self.send_to(
                peer_id,
                ServerMessage::Error {
                    message: "You are not seated".to_string(),
                },
            );
            return;
        };

        match self.submit_play(seat, card) {
            Ok(()) => {}
            Err(PlayError::TurnLocked) => {
                debug!("Play from {peer_id} while turns are locked; resyncing everyone");
                self.send_to(peer_id, ServerMessage::PlayRejected {
                    reason: PlayError::TurnLocked,
                });
                self.publish();
            }
            Err(reason) => {
                debug!("Play of {card} from {peer_id} rejected: {reason}");
                self.send_to(peer_id, ServerMessage::PlayRejected { reason });
                self.resync(peer_id);
            }
        }
    }

    /// The one path every play takes, human or bot.
    fn submit_play(&mut self, seat: SeatIndex, card: Card) -> Result<(), PlayError> {
        let outcome = self.state.play_card(seat, card)?;
        match outcome.next_actor() {
            Some(next) => self.begin_trick_pause(next),
            None => {
                self.publish();
                self.schedule_bot();
            }
        }
        Ok(())
    }

    /// Shows `next` as acting, holds turns, and arms the finalize timer.
    /// Re-arming cancels any earlier timer.
    fn begin_trick_pause(&mut self, next: SeatIndex) {
        self.state.set_display_turn(Some(next));
        self.state.lock_turn();
        self.publish();

        if let Some(timer) = self.pause_timer.take() {
            timer.abort();
        }
        self.pause_generation += 1;
        let timer = self.schedule(
            self.config.trick_pause(),
            TableMessage::FinalizeTrick {
                generation: self.pause_generation,
            },
        );
        self.pause_timer = Some(timer);
    }

    fn handle_finalize(&mut self, generation: u64) {
        if generation != self.pause_generation {
            debug!("Ignoring stale trick timer {generation}");
            return;
        }
        self.pause_timer = None;
        self.state.finalize_pending_trick();
        self.state.set_display_turn(None);
        self.state.unlock_turn();
        self.publish();
        self.schedule_bot();
    }

    // === Bots ===

    fn bot_may_act(&self) -> bool {
        self.started
            && !self.state.is_game_over()
            && !self.state.is_turn_locked()
            && self
                .state
                .player(self.state.turn())
                .is_some_and(|p| !p.is_human && !p.out)
    }

    fn schedule_bot(&mut self) {
        if let Some(timer) = self.bot_timer.take() {
            timer.abort();
        }
        if !self.bot_may_act() {
            return;
        }
        self.bot_generation += 1;
        let timer = self.schedule(
            self.config.bot_think_delay(),
            TableMessage::BotTurn {
                generation: self.bot_generation,
            },
        );
        self.bot_timer = Some(timer);
    }

    fn handle_bot_turn(&mut self, generation: u64) {
        if generation != self.bot_generation {
            debug!("Ignoring stale bot timer {generation}");
            return;
        }
        self.bot_timer = None;
        if !self.bot_may_act() {
            return;
        }

        let seat = self.state.turn();
        let view = self.state.public_state();
        let legal = self.state.legal_cards(seat);
        let choice = self
            .bot
            .choose_card(self.state.hand(seat), &view, seat)
            .filter(|card| legal.contains(card))
            .or_else(|| legal.first().copied());
        let Some(card) = choice else {
            warn!("Bot seat {seat} has no card to play");
            return;
        };

        if let Err(error) = self.submit_play(seat, card) {
            warn!("Bot seat {seat} could not play {card}: {error}");
        }
    }

    // === Give-All ===

    fn open_give_all(&mut self, peer_id: &PeerId, target_peer: &PeerId) -> Result<(), GiveAllDenial> {
        let requester = *self.seats.get(peer_id).ok_or(GiveAllDenial::NotSeated)?;
        let target = *self
            .seats
            .get(target_peer)
            .ok_or(GiveAllDenial::InvalidTarget)?;
        let request = self.state.open_give_all(requester, target)?;

        if !self.is_connected(target_peer) {
            self.state.cancel_give_all();
            return Err(GiveAllDenial::TargetUnreachable);
        }

        let from_name = self
            .state
            .player(request.requester)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        let prompt = ServerMessage::GiveAllPrompt {
            from_peer_id: Some(peer_id.clone()),
            from_index: request.requester,
            from_name,
        };
        if !self.send_to(target_peer, prompt) {
            self.state.cancel_give_all();
            return Err(GiveAllDenial::TargetUnreachable);
        }
        self.publish();
        Ok(())
    }

    fn handle_give_all_response(&mut self, peer_id: &PeerId, accepted: bool) {
        let Some(request) = self.state.give_all_request() else {
            debug!("No Give-All pending; resyncing {peer_id}");
            self.resync(peer_id);
            return;
        };
        if self.seats.get(peer_id) != Some(&request.target) {
            warn!("{peer_id} answered a Give-All addressed to seat {}", request.target);
            self.resync(peer_id);
            return;
        }
        self.resolve_give_all(request, accepted);
    }

    fn resolve_give_all(&mut self, request: GiveAllRequest, accepted: bool) {
        let trick_end = if accepted {
            self.state.accept_give_all().and_then(|outcome| outcome.trick_end)
        } else {
            self.state.reject_give_all();
            None
        };

        match trick_end.and_then(|outcome| outcome.next_actor()) {
            Some(next) => self.begin_trick_pause(next),
            None => self.publish(),
        }

        if let Some(requester) = self.peer_at(request.requester) {
            self.send_to(
                &requester,
                ServerMessage::GiveAllResult {
                    accepted,
                    from_index: request.requester,
                    target_index: request.target,
                },
            );
        }
        self.schedule_bot();
    }

    // === Publishing ===

    /// Sends every participant the snapshot, then its own hand, then the
    /// log entries produced since the last publish.
    fn publish(&mut self) {
        let snapshot = self.state.public_state();
        let entries = self.state.take_log();
        for participant in &self.participants {
            participant.deliver_all(self.sync_frames(&participant.peer_id, snapshot.clone()));
            let log = entries
                .iter()
                .map(|entry| ServerMessage::LogEntry {
                    entry: entry.clone(),
                })
                .collect();
            participant.deliver_all(log);
        }
    }

    /// Snapshot and hand for one participant only.
    fn resync(&self, peer_id: &PeerId) {
        let Some(participant) = self.participant(peer_id) else {
            return;
        };
        participant.deliver_all(self.sync_frames(peer_id, self.state.public_state()));
    }

    /// The snapshot followed by the hand of `peer_id`'s seat, if it has one.
    fn sync_frames(&self, peer_id: &PeerId, snapshot: PublicState) -> Vec<ServerMessage> {
        let mut frames = vec![ServerMessage::GameState { state: snapshot }];
        if let Some(&seat) = self.seats.get(peer_id) {
            frames.push(ServerMessage::YourHand {
                player_index: seat,
                hand: self.state.hand(seat).to_vec(),
            });
        }
        frames
    }

    fn participant(&self, peer_id: &PeerId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.peer_id == peer_id)
    }

    fn is_connected(&self, peer_id: &PeerId) -> bool {
        self.participant(peer_id)
            .is_some_and(|p| !p.outbox.is_closed())
    }

    fn send_to(&self, peer_id: &PeerId, message: ServerMessage) -> bool {
        self.participant(peer_id)
            .is_some_and(|p| p.deliver(message))
    }

    fn peer_at(&self, seat: SeatIndex) -> Option<PeerId> {
        self.seats
            .iter()
            .find(|(_, s)| **s == seat)
            .map(|(peer, _)| peer.clone())
    }

    fn get_state(&self) -> TableStateResponse {
        TableStateResponse {
            table_name: self.config.name.clone(),
            max_seats: self.config.max_seats,
            bot_seats: self.config.bot_seats,
            started: self.started,
            roster: self.roster(),
            state: self.state.public_state(),
        }
    }

    // === Timers ===

    fn schedule(&self, delay: Duration, message: TableMessage) -> JoinHandle<()> {
        let sender = self.timer_sender.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            if let Some(sender) = sender.upgrade() {
                let _ = sender.send(message).await;
            }
        })
    }

    fn cancel_timers(&mut self) {
        if let Some(timer) = self.pause_timer.take() {
            timer.abort();
        }
        if let Some(timer) = self.bot_timer.take() {
            timer.abort();
        }
        self.pause_generation += 1;
        self.bot_generation += 1;
    }
}
