use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use rand::SeedableRng;
use rand::rngs::SmallRng;

use minefray_protocol::{ActionMsg, BoardSnapshot, GuessKind, ParticipantView};

use crate::*;

/// Named artificial seats, filled in order up to the configured bot count.
pub const BOT_SEATS: [(&str, &str); 6] = [
    ("bot_89757", "Lazarus"),
    ("bot_89758", "TokyoCronos"),
    ("bot_89759", "SmartRibbit"),
    ("bot_89760", "Teddy98"),
    ("bot_89761", "Momo"),
    ("bot_89762", "Linux"),
];

/// Points at stake each round, split between same-kind claimants of a cell.
const ROUND_STAKE: i32 = 6;
const MISS_PENALTY: i32 = -6;

fn contested_reward(claimants: u8) -> i32 {
    (ROUND_STAKE / i32::from(claimants)).max(1)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EnginePhase {
    Idle,
    RoundOpen,
    Resolving,
    Finished,
}

impl EnginePhase {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// What the engine tells its owner; the session turns these into protocol
/// events. The engine never hands out references to its own state.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    /// Chat-style commentary line.
    Narrative(String),
    Snapshot(BoardSnapshot),
    Finished(Winner),
}

/// The authoritative per-game state machine: owns the board and the roster,
/// and is their only mutator.
#[derive(Clone, Debug)]
pub struct RoundEngine {
    board: Board,
    roster: Vec<Participant>,
    rng: SmallRng,
    phase: EnginePhase,
}

impl RoundEngine {
    /// Roster order is humans in join order, then bots; roster position
    /// doubles as the display-color index.
    pub fn new(
        layout: MineLayout,
        humans: impl IntoIterator<Item = (ParticipantId, String)>,
        bot_count: usize,
        seed: u64,
    ) -> Self {
        let mut roster: Vec<Participant> = humans
            .into_iter()
            .map(|(id, name)| Participant::human(id, name))
            .collect();
        for &(id, name) in BOT_SEATS.iter().take(bot_count) {
            roster.push(Participant::bot(id, name));
        }
        Self {
            board: Board::new(layout),
            roster,
            rng: SmallRng::seed_from_u64(seed),
            phase: EnginePhase::Idle,
        }
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn roster(&self) -> &[Participant] {
        &self.roster
    }

    /// Opens the first round: emits the initial snapshot and lets the bots
    /// plan. Their submissions land in the same pending slots as human ones.
    pub fn start(&mut self) -> Vec<EngineEvent> {
        debug_assert_eq!(self.phase, EnginePhase::Idle);
        self.phase = EnginePhase::RoundOpen;
        let events = alloc::vec![EngineEvent::Snapshot(self.snapshot(false))];
        self.run_policy();
        events
    }

    /// Stores `action` in the sender's pending slot; last write wins.
    /// Late and duplicate submissions are expected under concurrent timing,
    /// so the rejections here are advisory, not fatal.
    pub fn submit(&mut self, id: &ParticipantId, action: Action) -> Result<()> {
        if self.phase != EnginePhase::RoundOpen {
            return Err(GameError::RoundClosed);
        }
        if usize::from(action.cell) >= CELL_COUNT {
            return Err(GameError::InvalidCell);
        }
        if self.board.state_at(action.cell).is_revealed() {
            return Err(GameError::AlreadyRevealed);
        }
        if let Some(participant) = self.roster.iter_mut().find(|p| &p.id == id) {
            participant.pending = Some(action);
        } else {
            log::debug!("action from {id} outside the roster, dropped");
        }
        Ok(())
    }

    /// Closes the round: resolves all pending actions simultaneously, scores
    /// with pre-resolution contention tallies, and either reopens or
    /// finishes.
    pub fn resolve_round(&mut self) -> Vec<EngineEvent> {
        if self.phase != EnginePhase::RoundOpen {
            return Vec::new();
        }
        self.phase = EnginePhase::Resolving;

        for participant in &mut self.roster {
            participant.last_action = participant.pending.take();
        }

        // contention tallies, captured before anything is revealed or scored
        let mut safe_claims = [0u8; CELL_COUNT];
        let mut mine_claims = [0u8; CELL_COUNT];
        for participant in &self.roster {
            if let Some(action) = participant.last_action {
                match action.kind {
                    GuessKind::Safe => safe_claims[usize::from(action.cell)] += 1,
                    GuessKind::Mine => mine_claims[usize::from(action.cell)] += 1,
                }
            }
        }

        for participant in &self.roster {
            if let Some(action) = participant.last_action {
                self.board.reveal(action.cell);
            }
        }

        for participant in &mut self.roster {
            let delta = match participant.last_action {
                None => MISS_PENALTY,
                Some(action) => {
                    let mined = self.board.has_mine(action.cell);
                    match (action.kind, mined) {
                        (GuessKind::Safe, false) => {
                            contested_reward(safe_claims[usize::from(action.cell)])
                        }
                        (GuessKind::Mine, true) => {
                            contested_reward(mine_claims[usize::from(action.cell)])
                        }
                        _ => MISS_PENALTY,
                    }
                }
            };
            participant.apply_delta(delta);
        }

        let mut events = Vec::new();
        self.crowd_narratives(&safe_claims, &mine_claims, &mut events);
        self.streak_narratives(&mut events);

        let finished = self.board.is_complete();
        events.push(EngineEvent::Snapshot(self.snapshot(finished)));
        if finished {
            if let Some(winner) = leading(&self.roster) {
                events.push(EngineEvent::Finished(winner));
            }
            self.phase = EnginePhase::Finished;
        } else {
            self.phase = EnginePhase::RoundOpen;
            self.run_policy();
        }
        events
    }

    fn run_policy(&mut self) {
        let seats = self.roster.iter().filter(|p| p.artificial).count();
        if seats == 0 {
            return;
        }
        let states = self.board.states();
        let actions = policy::choose_actions(&states, seats, &mut self.rng);
        for (participant, action) in self
            .roster
            .iter_mut()
            .filter(|p| p.artificial)
            .zip(actions)
        {
            participant.pending = Some(action);
        }
    }

    fn crowd_narratives(
        &self,
        safe_claims: &[u8; CELL_COUNT],
        mine_claims: &[u8; CELL_COUNT],
        events: &mut Vec<EngineEvent>,
    ) {
        for cell in 0..CELL_COUNT as u8 {
            for (claims, kind) in [(safe_claims, GuessKind::Safe), (mine_claims, GuessKind::Mine)] {
                if claims[usize::from(cell)] < 2 {
                    continue;
                }
                let names: Vec<&str> = self
                    .roster
                    .iter()
                    .filter(|p| p.last_action == Some(Action { cell, kind }))
                    .map(|p| p.name.as_str())
                    .collect();
                let scale = if names.len() > 2 { "Massive pile-up" } else { "Pile-up" };
                events.push(EngineEvent::Narrative(format!(
                    "{scale} on the same cell! Involved: {}",
                    names.join(" ")
                )));
            }
        }
    }

    fn streak_narratives(&self, events: &mut Vec<EngineEvent>) {
        for participant in &self.roster {
            if participant.combo > 0 && participant.combo % 5 == 0 {
                events.push(EngineEvent::Narrative(format!(
                    "Unbelievable! {} is on a {}-round streak!",
                    participant.name, participant.combo
                )));
            }
            if participant.negcombo > 0 && participant.negcombo % 3 == 0 {
                events.push(EngineEvent::Narrative(format!(
                    "Brutal! {} has now fumbled {} rounds straight!",
                    participant.name, participant.negcombo
                )));
            }
        }
    }

    fn snapshot(&self, is_final: bool) -> BoardSnapshot {
        BoardSnapshot {
            cells: self.board.codes(),
            participants: self
                .roster
                .iter()
                .enumerate()
                .map(|(position, p)| ParticipantView {
                    id: p.id.0.clone(),
                    name: p.name.clone(),
                    artificial: p.artificial,
                    score: p.score,
                    score_change: p.score_change,
                    combo: p.combo,
                    negcombo: p.negcombo,
                    action: p.last_action.map(|a| ActionMsg {
                        cell: a.cell,
                        kind: a.kind,
                    }),
                    color: position as u8,
                })
                .collect(),
            remaining_mines: self.board.hidden_mine_count(),
            is_final,
        }
    }
}
