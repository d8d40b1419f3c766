use thiserror::Error;

#[derive(Error, Debug)]
pub enum RopeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("arena out of capacity: requested {requested} bytes, {remaining} remaining")]
    OutOfCapacity { requested: usize, remaining: usize },

    #[error("misaligned request: alignment {align} is not a power of two")]
    MisalignedRequest { align: usize },

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("stale handle: generation {handle}, arena is at generation {current}")]
    StaleHandle { handle: u32, current: u32 },

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("Invalid arena capacity: {0}")]
    InvalidCapacity(String),
}

impl RopeError {
    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        RopeError::InvariantViolation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, RopeError>;
