use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("cell index out of range")]
    InvalidCell,
    #[error("cell is already revealed")]
    AlreadyRevealed,
    #[error("seat capacity exceeded, rooms hold 1-8 players")]
    CapacityExceeded,
    #[error("no round is accepting actions")]
    RoundClosed,
}

pub type Result<T> = core::result::Result<T, GameError>;
