//! Errors raised by the token codec, delta engine and store.

use crate::tokens::RECORD_STRIDE;

/// A protocol or caller fault while installing token data.
///
/// None of these are steady-state conditions. The expected reaction is to log
/// the fault and request a fresh full snapshot from the language server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The buffer length is not a multiple of the record stride.
    #[error(
        "token buffer of length {len} is not a multiple of the record stride ({})",
        RECORD_STRIDE
    )]
    MalformedBuffer { len: usize },

    /// A record starts before the record preceding it.
    #[error("token record {index} starts before the preceding record")]
    UnorderedBuffer { index: usize },

    /// A splice edit reaches past the end of the buffer it is applied to.
    #[error("edit at {start} deleting {delete_count} exceeds buffer length {len}")]
    OutOfRangeEdit {
        start: usize,
        delete_count: usize,
        len: usize,
    },

    /// A delta arrived while the store had no baseline state.
    #[error("delta applied with no baseline token state")]
    Precondition,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_offending_values() {
        let err = TokenError::MalformedBuffer { len: 7 };
        assert_eq!(
            err.to_string(),
            "token buffer of length 7 is not a multiple of the record stride (5)"
        );

        let err = TokenError::OutOfRangeEdit {
            start: 8,
            delete_count: 4,
            len: 10,
        };
        assert_eq!(
            err.to_string(),
            "edit at 8 deleting 4 exceeds buffer length 10"
        );
    }
}
