use std::{error::Error, fmt, io};

use crate::initialization::RandErr;

/// The crate's result type.
pub type Result<T> = std::result::Result<T, RnnErr>;

/// Failures raised while building, training, sampling or persisting a network.
#[derive(Debug)]
pub enum RnnErr {
    /// A configuration value can't describe a usable network.
    InvalidConfig(String),
    /// A vector, batch or buffer doesn't have the size the configuration requires.
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// A NaN or infinite value showed up before it could be committed.
    NumericInstability { what: &'static str },
    /// A checkpoint couldn't be encoded or decoded.
    Serialization(String),
    UnknownSymbol(char),
    EmptyPriming,
    /// A session already has a running pipeline.
    PipelineBusy,
    /// The pipeline's worker is gone and no longer accepts batches.
    PipelineClosed,
    Worker(String),
    Io(io::Error),
}

impl fmt::Display for RnnErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RnnErr::InvalidConfig(reason) => write!(f, "invalid configuration: {reason}"),
            RnnErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(f, "{what} size mismatch: got {got}, expected {expected}"),
            RnnErr::NumericInstability { what } => {
                write!(f, "numeric instability: non finite values in {what}")
            }
            RnnErr::Serialization(reason) => write!(f, "serialization error: {reason}"),
            RnnErr::UnknownSymbol(c) => write!(f, "symbol {c:?} is not in the vocabulary"),
            RnnErr::EmptyPriming => f.write_str("the priming sequence is empty"),
            RnnErr::PipelineBusy => f.write_str("the session is already training"),
            RnnErr::PipelineClosed => f.write_str("the training pipeline is closed"),
            RnnErr::Worker(reason) => write!(f, "training worker failed: {reason}"),
            RnnErr::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for RnnErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RnnErr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RnnErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for RnnErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}

impl From<RandErr> for RnnErr {
    fn from(value: RandErr) -> Self {
        Self::InvalidConfig(value.to_string())
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<RnnErr> for io::Error {
    fn from(value: RnnErr) -> Self {
        match value {
            RnnErr::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
