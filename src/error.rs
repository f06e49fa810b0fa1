//! Error Types
//!
//! Construction errors are precondition failures reported by the encoder.
//! Decode errors mean the channels do not hold a well-formed stream.
//! Replay errors wrap either a decode error or the sink's own error.

use thiserror::Error;

/// Name of a channel, used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Structure,
    Strings,
    Characters,
    Objects,
}

impl Channel {
    pub fn name(self) -> &'static str {
        match self {
            Channel::Structure => "structure",
            Channel::Strings => "structure-strings",
            Channel::Characters => "content-characters",
            Channel::Objects => "content-objects",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Precondition violations raised by the structural encoder
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// An end was requested with nothing matching open
    #[error("unbalanced end: {0}")]
    UnbalancedEnd(&'static str),

    /// The encoder was finished and has not been reset
    #[error("encoder already finished; call reset() before appending")]
    Finished,

    /// Character range lies outside the source text or splits a character
    #[error("invalid character range {offset}..{offset}+{length} for text of {available} bytes")]
    InvalidRange {
        offset: usize,
        length: usize,
        available: usize,
    },
}

/// Errors raised while walking the channels of a buffer or mark
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Ran past the recorded data of a channel before the terminal opcode
    #[error("unexpected end of {channel} channel")]
    UnexpectedEnd { channel: Channel },

    /// Structure byte does not map to any opcode
    #[error("invalid opcode 0x{0:02x}")]
    InvalidOpcode(u8),

    /// Inline character run is not valid UTF-8
    #[error("inline character data is not valid UTF-8")]
    InvalidUtf8,

    /// The storage under this view was reset and reused (debug builds only)
    #[error("view refers to storage that has been reset")]
    StaleView,
}

/// Errors from a push replay
#[derive(Debug, Error)]
pub enum ReplayError<E> {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The sink rejected an event; the remaining replay was abandoned
    #[error("sink error: {0}")]
    Sink(E),
}

/// Invalid encoder configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} chunk capacity must be greater than zero")]
    ZeroCapacity(Channel),

    #[error("character chunk capacity {capacity} is smaller than the copy threshold {threshold}")]
    CharChunkTooSmall { capacity: usize, threshold: usize },
}

/// Errors from the XML text producer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProduceError {
    #[error("malformed XML at byte {position}: {message}")]
    Syntax {
        message: &'static str,
        position: usize,
    },

    #[error("mismatched end tag at byte {position}: expected </{expected}>, found </{found}>")]
    MismatchedEndTag {
        expected: String,
        found: String,
        position: usize,
    },

    #[error("unclosed element <{0}> at end of input")]
    Unclosed(String),

    #[error("undeclared namespace prefix '{0}'")]
    UndeclaredPrefix(String),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ProduceError {
    pub(crate) fn syntax(message: &'static str, position: usize) -> Self {
        ProduceError::Syntax { message, position }
    }
}
