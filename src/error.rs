use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Pool is empty: R0 and B0 cannot both be zero")]
    EmptyPool,

    #[error("{field} must be a non-negative number, got {value}")]
    NegativeAmount { field: &'static str, value: f64 },

    #[error("{field} must be a positive number, got {value}")]
    NonPositiveMultiplier { field: &'static str, value: f64 },

    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("{field} must not exceed {max}, got {value}")]
    DimensionTooLarge {
        field: &'static str,
        value: usize,
        max: usize,
    },

    #[error("Lattice rooted at ({r0}, {b0}) is too large to allocate")]
    LatticeTooLarge { r0: usize, b0: usize },

    #[error("State ({r}, {b}) is outside the solved lattice (0..={r0}, 0..={b0})")]
    StateOutOfRange {
        r: usize,
        b: usize,
        r0: usize,
        b0: usize,
    },

    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type SolverOutcome<T> = Result<T, SolverError>;
