//! Immutable token snapshots and the viewport query.

use crate::error::TokenError;
use crate::tokens::{decode, DecodedToken, DeltaOutcome, TokenPos, RECORD_STRIDE};

/// One immutable snapshot of a document's semantic tokens.
///
/// `tokens[i]` is always the decoding of record `i` of `buffer`, and tokens
/// are in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenState {
    /// Identifier of the response that produced this snapshot, if any.
    request_id: Option<String>,
    /// The flat buffer, kept for applying the next delta.
    buffer: Vec<u32>,
    /// Decoded records in document order.
    tokens: Vec<DecodedToken>,
}

impl TokenState {
    /// Decode a full buffer into a snapshot with no request id.
    pub fn from_buffer(buffer: Vec<u32>) -> Result<Self, TokenError> {
        let tokens = decode(&buffer)?;
        Ok(Self {
            request_id: None,
            buffer,
            tokens,
        })
    }

    /// Build the snapshot that follows a successfully applied delta.
    pub(crate) fn from_outcome(outcome: DeltaOutcome, request_id: Option<String>) -> Self {
        debug_assert_eq!(outcome.tokens.len() * RECORD_STRIDE, outcome.buffer.len());
        Self {
            request_id,
            buffer: outcome.buffer,
            tokens: outcome.tokens,
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn buffer(&self) -> &[u32] {
        &self.buffer
    }

    pub fn tokens(&self) -> &[DecodedToken] {
        &self.tokens
    }

    /// Tokens whose start lies in the closed interval `[start, end]`.
    ///
    /// Binary search finds the first token starting at or after `start`, then
    /// the scan extends while tokens start at or before `end`. An inverted
    /// interval yields an empty slice.
    pub fn tokens_in(&self, start: TokenPos, end: TokenPos) -> &[DecodedToken] {
        let first = self.tokens.partition_point(|t| t.start() < start);
        let count = self.tokens[first..]
            .iter()
            .take_while(|t| t.start() <= end)
            .count();
        &self.tokens[first..first + count]
    }
}
