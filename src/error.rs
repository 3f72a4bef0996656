use thiserror::Error;

use crate::notice::Notice;

/// Everything that can go wrong while playing. None of these are fatal: the
/// worst outcome is a full reset back to the idle screen.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("no chances remaining")]
    NoChancesRemaining,
    #[error("wrong cell: expected {expected}, got {got}")]
    WrongClick { expected: u32, got: u32 },
    #[error("time ran out in round {round}")]
    Timeout { round: u8 },
    #[error("could not load the global ranking: {0}")]
    RemoteFetchFailed(String),
    #[error("could not upload the score: {0}")]
    RemotePushFailed(String),
    #[error("the share service is not available")]
    ShareUnavailable,
    #[error("the share reward was already claimed")]
    ShareAlreadyUsed,
    #[error("sharing failed: {0}")]
    ShareFailed(String),
    #[error("a ranking name must not be empty")]
    InvalidName,
    #[error("storage error: {0}")]
    Storage(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl GameError {
    /// The message shown to the player for this error.
    pub fn notice(&self) -> Notice {
        match self {
            GameError::NoChancesRemaining => Notice::NoChancesRemaining,
            GameError::WrongClick { .. } => Notice::WrongClick,
            GameError::Timeout { .. } => Notice::Timeout,
            GameError::RemoteFetchFailed(_) => Notice::RankingOffline,
            GameError::RemotePushFailed(_) => Notice::SavedLocallyOnly,
            GameError::ShareUnavailable => Notice::ShareUnavailable,
            GameError::ShareAlreadyUsed => Notice::ShareAlreadyUsed,
            GameError::ShareFailed(_) => Notice::ShareFailed,
            GameError::InvalidName => Notice::InvalidName,
            GameError::Storage(_) | GameError::Config(_) => Notice::Internal,
        }
    }
}

impl From<serde_json::Error> for GameError {
    fn from(err: serde_json::Error) -> Self {
        GameError::Storage(err.to_string())
    }
}

pub type GameResult<T> = Result<T, GameError>;
