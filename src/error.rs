use thiserror::Error;

#[derive(Error, Debug)]
pub enum OfcError {
    #[error("Invalid rank: {0}")]
    InvalidRank(char),

    #[error("Invalid suit: {0}")]
    InvalidSuit(char),

    #[error("Invalid card notation: {0}")]
    InvalidCardNotation(String),

    #[error("Invalid board notation: {0}")]
    InvalidBoardNotation(String),

    #[error("{line} line needs exactly {expected} cards, got {got}")]
    MalformedHand {
        line: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Fantasy hand needs {expected} cards, got {got}")]
    FantasyHandSize { expected: usize, got: usize },

    #[error("Cannot deal {requested} cards, only {available} remaining")]
    NotEnoughDeck { requested: usize, available: usize },

    #[error("Card {0} is already on the board")]
    DuplicateCard(String),

    #[error("{0} line is already full")]
    LineFull(&'static str),

    #[error("Unsupported state version {found} (expected {expected})")]
    UnsupportedStateVersion { found: u32, expected: u32 },

    #[error("Variant mismatch: got progressive={found}, agent uses progressive={expected}")]
    VariantMismatch { found: bool, expected: bool },

    #[error("Invalid value in saved state: {0}")]
    InvalidStateValue(String),

    #[error("Progress storage unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type OfcResult<T> = Result<T, OfcError>;
