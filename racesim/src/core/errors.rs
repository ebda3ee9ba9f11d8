use thiserror::Error;

/// Faults that prevent a race from being set up. The frame loop never starts if one of these
/// occurs.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("track path has zero or invalid length ({0})")]
    InvalidPathLength(f64),

    #[error("track requires at least two points, but got {0}")]
    TooFewTrackPoints(usize),

    #[error("track point {0} is not finite")]
    NonFiniteTrackPoint(usize),

    #[error("agent roster is empty")]
    EmptyRoster,

    #[error("agent {0} is listed more than once in the roster")]
    DuplicateAgent(u32),

    #[error("agent {0} has an invalid base speed factor ({1})")]
    InvalidSpeedFactor(u32, f64),

    #[error("finish line ({x:.3}, {y:.3}) does not lie at the end of the track path")]
    FinishLineOffPath { x: f64, y: f64 },
}

/// Faults of a single path sampler query. They only affect the queried agent in the current tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    #[error("distance {0} is not finite")]
    NonFinite(f64),

    #[error("distance {distance:.3} lies outside of [0.0, {length:.3}]")]
    OutOfRange { distance: f64, length: f64 },
}
