use alloc::string::String;
use core::fmt;

use serde::{Deserialize, Serialize};

use minefray_protocol::GuessKind;

use crate::*;

/// Stable participant identity, supplied by the transport for humans and
/// fixed for the named bot seats.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// A bet on one cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub cell: CellId,
    pub kind: GuessKind,
}

/// One seat at the table, human or artificial.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub artificial: bool,
    pub score: u32,
    /// Last round's delta, kept for display and streak logic.
    pub score_change: i32,
    /// Consecutive rounds with a positive delta.
    pub combo: u32,
    /// Consecutive rounds with a non-positive delta.
    pub negcombo: u32,
    /// The in-flight round's slot; last write before round close wins.
    pub pending: Option<Action>,
    /// The action resolved last round, shown in snapshots.
    pub last_action: Option<Action>,
}

impl Participant {
    pub fn human(id: ParticipantId, name: impl Into<String>) -> Self {
        Self::seat(id, name.into(), false)
    }

    pub fn bot(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::seat(ParticipantId::new(id), name.into(), true)
    }

    fn seat(id: ParticipantId, name: String, artificial: bool) -> Self {
        Self {
            id,
            name,
            artificial,
            score: 0,
            score_change: 0,
            combo: 0,
            negcombo: 0,
            pending: None,
            last_action: None,
        }
    }

    /// Commits one round's delta. The cumulative score never drops below
    /// zero; each round clamps independently.
    pub fn apply_delta(&mut self, delta: i32) {
        self.score_change = delta;
        self.score = self.score.saturating_add_signed(delta);
        if delta > 0 {
            self.combo += 1;
            self.negcombo = 0;
        } else {
            self.negcombo += 1;
            self.combo = 0;
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    pub id: ParticipantId,
    pub name: String,
    pub score: u32,
}

/// Strictly-highest score wins; the first seat in roster order keeps ties.
/// The `-1` sentinel guarantees any real participant beats the seed.
pub fn leading(roster: &[Participant]) -> Option<Winner> {
    let mut best: i64 = -1;
    let mut winner = None;
    for participant in roster {
        if i64::from(participant.score) > best {
            best = i64::from(participant.score);
            winner = Some(Winner {
                id: participant.id.clone(),
                name: participant.name.clone(),
                score: participant.score,
            });
        }
    }
    winner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_floors_at_zero_each_round() {
        let mut seat = Participant::human(ParticipantId::from("player_ana"), "ana");
        seat.apply_delta(-6);
        assert_eq!(seat.score, 0);
        assert_eq!(seat.score_change, -6);

        seat.apply_delta(4);
        seat.apply_delta(-6);
        assert_eq!(seat.score, 0);
    }

    #[test]
    fn streak_counters_track_delta_sign() {
        let mut seat = Participant::human(ParticipantId::from("player_ana"), "ana");
        seat.apply_delta(6);
        seat.apply_delta(3);
        assert_eq!((seat.combo, seat.negcombo), (2, 0));

        seat.apply_delta(0);
        assert_eq!((seat.combo, seat.negcombo), (0, 1));
        seat.apply_delta(-6);
        assert_eq!((seat.combo, seat.negcombo), (0, 2));

        seat.apply_delta(1);
        assert_eq!((seat.combo, seat.negcombo), (1, 0));
    }

    #[test]
    fn leading_keeps_the_first_seat_on_ties() {
        let mut first = Participant::human(ParticipantId::from("player_ana"), "ana");
        let mut second = Participant::human(ParticipantId::from("player_bo"), "bo");
        first.apply_delta(3);
        second.apply_delta(3);

        let winner = leading(&[first, second]).unwrap();
        assert_eq!(winner.id, ParticipantId::from("player_ana"));
        assert_eq!(winner.score, 3);
    }

    #[test]
    fn leading_beats_the_sentinel_even_at_zero_score() {
        let seat = Participant::human(ParticipantId::from("player_ana"), "ana");
        let winner = leading(core::slice::from_ref(&seat)).unwrap();
        assert_eq!(winner.score, 0);
        assert!(leading(&[]).is_none());
    }
}
