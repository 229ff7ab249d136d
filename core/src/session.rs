use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::time::Duration;

use rand::{RngExt, SeedableRng};
use rand::rngs::SmallRng;

use minefray_protocol::{Command, Event, RejectReason, RoomConfig, SeatView};

use crate::*;

/// Liveness token of the single-shot round timer. A fired token that no
/// longer matches the armed one belongs to a discarded round and must be a
/// no-op.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RoundToken(u64);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Lobby,
    Playing,
}

/// What the transport should do on the session's behalf. The session never
/// talks to connections or clocks directly.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEffect {
    /// Deliver to the requesting connection only.
    Reply(Event),
    Broadcast(Event),
    /// Fire `round_timeout(token)` once, `delay` from now.
    ArmRoundTimer { token: RoundToken, delay: Duration },
}

#[derive(Clone, Debug)]
struct Seat {
    id: ParticipantId,
    name: String,
    ready: bool,
}

/// Coordination layer for one table: membership, readiness, chat, config,
/// and the lone live [`RoundEngine`]. An engine exists if and only if the
/// session is in the `Playing` phase.
pub struct RoomSession {
    seats: Vec<Seat>,
    config: RoomConfig,
    chat_log: String,
    engine: Option<RoundEngine>,
    armed: Option<RoundToken>,
    timer_serial: u64,
    rng: SmallRng,
}

impl RoomSession {
    pub fn new(seed: u64) -> Self {
        Self {
            seats: Vec::new(),
            config: RoomConfig::default(),
            chat_log: String::new(),
            engine: None,
            armed: None,
            timer_serial: 0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.engine.is_some() {
            SessionPhase::Playing
        } else {
            SessionPhase::Lobby
        }
    }

    pub fn engine(&self) -> Option<&RoundEngine> {
        self.engine.as_ref()
    }

    pub fn config(&self) -> RoomConfig {
        self.config
    }

    /// Humans seated plus configured bots, with `extra` hypothetical seats.
    fn check_capacity(&self, extra: usize) -> Result<()> {
        if self.seats.len() + usize::from(self.config.bots) + extra > usize::from(MAX_SEATS) {
            return Err(GameError::CapacityExceeded);
        }
        Ok(())
    }

    /// Seats a new connection, or turns it away when the table is full.
    /// The rejection goes to the requester alone; the roster is unchanged.
    pub fn connect(&mut self, id: ParticipantId, name: &str) -> Vec<SessionEffect> {
        if self.check_capacity(1).is_err() {
            return alloc::vec![SessionEffect::Reply(Event::Rejection {
                reason: RejectReason::RoomFull,
            })];
        }
        let name = name.to_string();
        self.seats.push(Seat {
            id,
            name: name.clone(),
            ready: false,
        });
        let mut effects = alloc::vec![self.membership()];
        effects.push(self.chat(&format!("{name} joined the room")));
        effects
    }

    /// Removes a connection's seat. A running game keeps playing against the
    /// roster snapshot it started with.
    pub fn disconnect(&mut self, id: &ParticipantId) -> Vec<SessionEffect> {
        let Some(position) = self.seats.iter().position(|seat| &seat.id == id) else {
            return Vec::new();
        };
        let seat = self.seats.remove(position);
        let mut effects = alloc::vec![self.membership()];
        effects.push(self.chat(&format!("{} left the room", seat.name)));
        effects
    }

    pub fn command(&mut self, sender: &ParticipantId, command: Command) -> Vec<SessionEffect> {
        match command {
            Command::Config(config) => {
                if self.engine.is_some() {
                    log::debug!("config change from {sender} ignored mid-game");
                    return Vec::new();
                }
                self.config = config;
                alloc::vec![SessionEffect::Broadcast(Event::Config(self.config))]
            }
            Command::Ready => {
                let Some(seat) = self.seats.iter_mut().find(|seat| &seat.id == sender) else {
                    return Vec::new();
                };
                seat.ready = true;
                let name = seat.name.clone();
                let mut effects = alloc::vec![self.membership()];
                effects.push(self.chat(&format!("{name} is ready")));
                let all_ready = !self.seats.is_empty() && self.seats.iter().all(|seat| seat.ready);
                if all_ready && self.engine.is_none() {
                    effects.extend(self.start_game());
                }
                effects
            }
            Command::Action(message) => {
                let Some(engine) = &mut self.engine else {
                    log::debug!("action from {sender} with no live engine, dropped");
                    return Vec::new();
                };
                let action = Action {
                    cell: message.cell,
                    kind: message.kind,
                };
                if let Err(error) = engine.submit(sender, action) {
                    log::debug!("action from {sender} dropped: {error}");
                }
                Vec::new()
            }
            Command::Chat(text) => {
                let name = self
                    .seats
                    .iter()
                    .find(|seat| &seat.id == sender)
                    .map(|seat| seat.name.clone())
                    .unwrap_or_else(|| sender.to_string());
                alloc::vec![self.chat(&format!("{name}: {text}"))]
            }
        }
    }

    /// The round timer callback. Stale tokens are no-ops.
    pub fn round_timeout(&mut self, token: RoundToken) -> Vec<SessionEffect> {
        if self.armed != Some(token) {
            log::debug!("stale round timer fired, ignored");
            return Vec::new();
        }
        self.armed = None;
        let Some(engine) = &mut self.engine else {
            return Vec::new();
        };
        let events = engine.resolve_round();
        let finished = engine.phase().is_finished();
        let mut effects = self.relay_engine_events(events);
        if finished {
            // the engine reported termination; back to the lobby
            self.engine = None;
        } else {
            effects.push(self.arm_timer());
        }
        effects
    }

    fn start_game(&mut self) -> Vec<SessionEffect> {
        if self.check_capacity(0).is_err() {
            let mut effects = alloc::vec![SessionEffect::Broadcast(Event::Rejection {
                reason: RejectReason::TooManySeats,
            })];
            effects.push(self.chat("Too many seats taken (1-8 supported), the game could not start"));
            return effects;
        }

        for seat in &mut self.seats {
            seat.ready = false;
        }
        let mut effects = alloc::vec![self.membership()];
        effects.push(SessionEffect::Broadcast(Event::RoundStarted));
        effects.push(self.chat("The game has started"));

        let humans: Vec<(ParticipantId, String)> = self
            .seats
            .iter()
            .map(|seat| (seat.id.clone(), seat.name.clone()))
            .collect();
        let bots = usize::from(self.config.bots).min(BOT_SEATS.len());
        let layout = MineLayout::random(self.rng.random());
        let mut engine = RoundEngine::new(layout, humans, bots, self.rng.random());
        let opening = engine.start();
        self.engine = Some(engine);

        effects.extend(self.relay_engine_events(opening));
        effects.push(self.arm_timer());
        effects
    }

    fn relay_engine_events(&mut self, events: Vec<EngineEvent>) -> Vec<SessionEffect> {
        let mut effects = Vec::new();
        for event in events {
            match event {
                EngineEvent::Narrative(line) => effects.push(self.chat(&line)),
                EngineEvent::Snapshot(snapshot) => {
                    effects.push(SessionEffect::Broadcast(Event::Board(snapshot)));
                }
                EngineEvent::Finished(winner) => {
                    effects.push(SessionEffect::Broadcast(Event::RoundEnded {
                        winner_id: winner.id.0.clone(),
                        winner_name: winner.name.clone(),
                        winner_score: winner.score,
                    }));
                    effects.push(self.chat(&format!(
                        "Game over! {} takes it with {} points",
                        winner.name, winner.score
                    )));
                }
            }
        }
        effects
    }

    fn arm_timer(&mut self) -> SessionEffect {
        self.timer_serial += 1;
        let token = RoundToken(self.timer_serial);
        self.armed = Some(token);
        SessionEffect::ArmRoundTimer {
            token,
            delay: Duration::from_secs(u64::from(self.config.round_secs)),
        }
    }

    fn membership(&self) -> SessionEffect {
        SessionEffect::Broadcast(Event::Membership(
            self.seats
                .iter()
                .enumerate()
                .map(|(position, seat)| SeatView {
                    id: seat.id.0.clone(),
                    name: seat.name.clone(),
                    ready: seat.ready,
                    color: position as u8,
                })
                .collect(),
        ))
    }

    /// Appends a line and rebroadcasts the whole transcript.
    fn chat(&mut self, line: &str) -> SessionEffect {
        self.chat_log.push_str(line);
        self.chat_log.push('\n');
        SessionEffect::Broadcast(Event::Chat(self.chat_log.clone()))
    }
}
