//! Centralized error type for the loudprobe umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] loudprobe_core::Error),

    #[error(transparent)]
    Live(#[from] loudprobe_live::Error),
}

impl Error {
    /// The underlying metering error, whichever layer raised it.
    pub fn as_core(&self) -> Option<&loudprobe_core::Error> {
        match self {
            Error::Core(e) | Error::Live(loudprobe_live::Error::Core(e)) => Some(e),
            Error::Live(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
