//! Error types for every concern of the planner core.
//!
//! None of these are fatal. A [`Rejection`] leaves the current snapshot in
//! place, a [`DecodeError`] collapses to "no shared timeline", and the cache
//! and catalog errors are surfaced to the page as a short message.

use thiserror::Error;

/// Why an editing operation left the timeline unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("cell {x},{y} is inside the boss area")]
    BossArea { x: i32, y: i32 },
    #[error("cell {x},{y} is outside the grid")]
    OutOfGrid { x: i32, y: i32 },
    #[error("cell {x},{y} is already occupied by {occupant}")]
    CellOccupied { x: i32, y: i32, occupant: String },
    #[error("no actor selected")]
    NoActor,
    #[error("unknown actor {0}")]
    UnknownActor(String),
    #[error("unknown character {0}")]
    UnknownCharacter(String),
    #[error("unknown summon {0}")]
    UnknownSummon(String),
    #[error("summon name {0} is not in the catalog")]
    UnknownSummonName(String),
    #[error("summon roster is full ({0} max)")]
    SummonCapacity(usize),
    #[error("phase {0} does not exist")]
    InvalidPhase(u8),
    #[error("the preparation phase has no previous phase")]
    NoPreviousPhase,
    #[error("step order {0} is outside 1..=5")]
    InvalidOrder(u8),
}

impl Rejection {
    /// Stable machine code for the JSON surface.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::BossArea { .. } => "boss_area",
            Rejection::OutOfGrid { .. } => "out_of_grid",
            Rejection::CellOccupied { .. } => "cell_occupied",
            Rejection::NoActor => "no_actor",
            Rejection::UnknownActor(_) => "unknown_actor",
            Rejection::UnknownCharacter(_) => "unknown_character",
            Rejection::UnknownSummon(_) => "unknown_summon",
            Rejection::UnknownSummonName(_) => "unknown_summon_name",
            Rejection::SummonCapacity(_) => "summon_capacity",
            Rejection::InvalidPhase(_) => "invalid_phase",
            Rejection::NoPreviousPhase => "no_previous_phase",
            Rejection::InvalidOrder(_) => "invalid_order",
        }
    }
}

/// Stage at which a shareable link failed to decode.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("missing v1: prefix")]
    Prefix,
    #[error("base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("inflate: {0}")]
    Inflate(#[from] std::io::Error),
    #[error("inflated payload exceeds {0} bytes")]
    TooLarge(usize),
    #[error("utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported version {0}")]
    Version(u64),
    #[error("malformed timeline: {0}")]
    Shape(&'static str),
}

/// Failure while producing a shareable link.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("deflate: {0}")]
    Deflate(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("a title is required to save a timeline")]
    MissingTitle,
    #[error("no saved timeline with id {0}")]
    NotFound(String),
}

impl CacheError {
    pub fn code(&self) -> &'static str {
        match self {
            CacheError::MissingTitle => "missing_title",
            CacheError::NotFound(_) => "not_found",
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
}
