//! Timeline state model: the shared encounter plan and its editing rules.
//!
//! A timeline holds a fixed five-slot character roster, up to ten summons,
//! and eight phases (preparation + turns 1..=7) of grid placements and
//! ordered steps. All edits go through [`ops`], which returns new snapshots.

pub mod ids;
pub mod model;
pub mod ops;
pub mod sanitize;

pub use model::{Character, Equipment, Grid, Position, Step, Summon, Timeline, Turn};
