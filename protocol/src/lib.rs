//! Wire types exchanged between room sessions and their participants.
//!
//! Messages are adjacently tagged JSON objects (`{"type": ..., "data": ...}`)
//! with camelCase keys. The core never touches the transport; it only
//! consumes [`Command`]s and produces [`Event`]s.

use serde::{Deserialize, Serialize};

/// Snapshot encoding for a cell nobody has revealed yet.
pub const HIDDEN_CELL: i8 = -2;
/// Snapshot encoding for an exposed mine.
pub const MINE_CELL: i8 = -1;

/// Which way a participant is betting on a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GuessKind {
    /// The cell is safe to open.
    Safe,
    /// The cell hides a mine.
    Mine,
}

/// Lobby-configurable room settings.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomConfig {
    /// Artificial seats filled when the game starts.
    pub bots: u8,
    /// Wall-clock length of one round.
    pub round_secs: u32,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            bots: 0,
            round_secs: 10,
        }
    }
}

/// A participant's bet for the round in flight.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMsg {
    /// Flat row-major cell index, `0..64`.
    pub cell: u8,
    pub kind: GuessKind,
}

/// Everything a connection may ask of the room.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Command {
    Config(RoomConfig),
    Ready,
    Action(ActionMsg),
    Chat(String),
}

/// One seat as shown in the lobby roster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub id: String,
    pub name: String,
    pub ready: bool,
    /// Display-color index, assigned by roster position.
    pub color: u8,
}

/// One participant as shown on the scoreboard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    pub id: String,
    pub name: String,
    pub artificial: bool,
    pub score: u32,
    pub score_change: i32,
    pub combo: u32,
    pub negcombo: u32,
    /// The action resolved last round, if any was submitted.
    pub action: Option<ActionMsg>,
    pub color: u8,
}

/// Materialized board state broadcast after every resolution.
///
/// `cells` uses [`HIDDEN_CELL`], [`MINE_CELL`], or the revealed neighbor
/// count `0..=8`, in flat row-major order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub cells: Vec<i8>,
    pub participants: Vec<ParticipantView>,
    pub remaining_mines: u16,
    pub is_final: bool,
}

/// Why a request was turned down.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RejectReason {
    RoomFull,
    TooManySeats,
}

/// Everything the room may tell its connections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum Event {
    Membership(Vec<SeatView>),
    Config(RoomConfig),
    /// Full accumulated chat transcript, not a diff.
    Chat(String),
    RoundStarted,
    RoundEnded {
        winner_id: String,
        winner_name: String,
        winner_score: u32,
    },
    Board(BoardSnapshot),
    Rejection {
        reason: RejectReason,
    },
}

/// Serialize an event for the wire.
pub fn encode_event(event: &Event) -> serde_json::Result<String> {
    serde_json::to_string(event)
}

/// Parse and validate an inbound command. A failure here is the
/// unknown-message class: callers log it and keep the connection.
pub fn decode_command(raw: &str) -> serde_json::Result<Command> {
    serde_json::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_use_the_tagged_wire_shape() {
        let ready = serde_json::to_string(&Command::Ready).unwrap();
        assert_eq!(ready, r#"{"type":"ready"}"#);

        let config = serde_json::to_string(&Command::Config(RoomConfig {
            bots: 2,
            round_secs: 10,
        }))
        .unwrap();
        assert_eq!(
            config,
            r#"{"type":"config","data":{"bots":2,"roundSecs":10}}"#
        );

        let action = serde_json::to_string(&Command::Action(ActionMsg {
            cell: 12,
            kind: GuessKind::Safe,
        }))
        .unwrap();
        assert_eq!(
            action,
            r#"{"type":"action","data":{"cell":12,"kind":"safe"}}"#
        );
    }

    #[test]
    fn decode_accepts_what_encode_produced() {
        let command = decode_command(r#"{"type":"action","data":{"cell":63,"kind":"mine"}}"#)
            .unwrap();
        assert_eq!(
            command,
            Command::Action(ActionMsg {
                cell: 63,
                kind: GuessKind::Mine,
            })
        );
    }

    #[test]
    fn malformed_input_is_an_error_not_a_panic() {
        assert!(decode_command(r#"{"type":"defuse"}"#).is_err());
        assert!(decode_command("not even json").is_err());
    }

    #[test]
    fn events_keep_camel_case_fields() {
        let ended = encode_event(&Event::RoundEnded {
            winner_id: "player_ana".into(),
            winner_name: "ana".into(),
            winner_score: 42,
        })
        .unwrap();
        assert_eq!(
            ended,
            r#"{"type":"roundEnded","data":{"winnerId":"player_ana","winnerName":"ana","winnerScore":42}}"#
        );

        let rejection = encode_event(&Event::Rejection {
            reason: RejectReason::RoomFull,
        })
        .unwrap();
        assert_eq!(
            rejection,
            r#"{"type":"rejection","data":{"reason":"roomFull"}}"#
        );
    }

    #[test]
    fn board_snapshot_round_trips() {
        let snapshot = Event::Board(BoardSnapshot {
            cells: vec![HIDDEN_CELL; 64],
            participants: vec![ParticipantView {
                id: "bot_89757".into(),
                name: "Lazarus".into(),
                artificial: true,
                score: 6,
                score_change: 6,
                combo: 1,
                negcombo: 0,
                action: Some(ActionMsg {
                    cell: 0,
                    kind: GuessKind::Safe,
                }),
                color: 0,
            }],
            remaining_mines: 25,
            is_final: false,
        });
        let raw = encode_event(&snapshot).unwrap();
        assert!(raw.contains(r#""remainingMines":25"#));
        assert!(raw.contains(r#""scoreChange":6"#));
        let back: Event = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, snapshot);
    }
}
