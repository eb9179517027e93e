//! Error types for loudprobe-live.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] loudprobe_core::Error),

    #[error("Failed to spawn metering thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),

    #[error("Metering thread is no longer running")]
    Disconnected,
}

pub type Result<T> = core::result::Result<T, Error>;
