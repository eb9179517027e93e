//! Error types for loudprobe-core.

use thiserror::Error;

/// Error type for metering engine operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Sample rate changed without reset: expected {expected} Hz, got {actual} Hz")]
    SampleRateMismatch { expected: f64, actual: f64 },

    #[error("Block length changed without reset: expected {expected} frames, got {actual}")]
    BlockLengthMismatch { expected: usize, actual: usize },

    #[error("Channel length mismatch: left={left}, right={right}")]
    ChannelLengthMismatch { left: usize, right: usize },

    #[error("Block rejected: {count} non-finite samples")]
    NonFiniteSamples { count: usize },

    #[error("Snapshot schema version {actual} does not match expected {expected}")]
    SchemaMismatch { expected: u32, actual: u32 },

    #[error("Reference measurement failed: {0}")]
    Reference(String),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_both_values() {
        let err = Error::SampleRateMismatch {
            expected: 48000.0,
            actual: 44100.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("48000"));
        assert!(msg.contains("44100"));
    }
}
