//! Flat token buffer decoding.
//!
//! A token buffer is a flat array of `u32` values in groups of five:
//! `[line, startChar, length, tokenType, tokenModifiers]`, with absolute
//! document positions. The buffer itself is the encoded form, so there is no
//! encoder here; only the delta engine ever rewrites a buffer.

use tower_lsp::lsp_types::Position;

use crate::error::TokenError;

/// Number of integers that encode one token record.
pub const RECORD_STRIDE: usize = 5;

/// A line-major document position used to order and search tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenPos {
    pub line: u32,
    pub character: u32,
}

impl TokenPos {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl From<Position> for TokenPos {
    fn from(position: Position) -> Self {
        Self::new(position.line, position.character)
    }
}

impl From<TokenPos> for Position {
    fn from(pos: TokenPos) -> Self {
        Position::new(pos.line, pos.character)
    }
}

/// One token record read out of a flat buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecodedToken {
    pub line: u32,
    pub character: u32,
    pub length: u32,
    pub token_type: u32,
    pub modifiers: u32,
}

impl DecodedToken {
    /// Build a token from one complete record.
    fn from_record(record: &[u32]) -> Self {
        Self {
            line: record[0],
            character: record[1],
            length: record[2],
            token_type: record[3],
            modifiers: record[4],
        }
    }

    /// Position of the first character of the token.
    pub fn start(&self) -> TokenPos {
        TokenPos::new(self.line, self.character)
    }
}

/// Decode a flat buffer into tokens, preserving record order.
///
/// Fails if the buffer is not a whole number of records, or if a record starts
/// before its predecessor: queries rely on document order.
pub fn decode(buffer: &[u32]) -> Result<Vec<DecodedToken>, TokenError> {
    if buffer.len() % RECORD_STRIDE != 0 {
        return Err(TokenError::MalformedBuffer { len: buffer.len() });
    }

    let mut tokens = Vec::with_capacity(buffer.len() / RECORD_STRIDE);
    for (index, record) in buffer.chunks_exact(RECORD_STRIDE).enumerate() {
        let token = DecodedToken::from_record(record);
        if let Some(prev) = tokens.last().map(DecodedToken::start) {
            if token.start() < prev {
                return Err(TokenError::UnorderedBuffer { index });
            }
        }
        tokens.push(token);
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        assert_eq!(decode(&[]), Ok(vec![]));
    }

    #[test]
    fn decodes_records_in_order() {
        let tokens = decode(&[1, 0, 4, 0, 0, 1, 10, 3, 1, 2]).unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].start(), TokenPos::new(1, 0));
        assert_eq!(tokens[0].length, 4);
        assert_eq!(tokens[1].start(), TokenPos::new(1, 10));
        assert_eq!(tokens[1].token_type, 1);
        assert_eq!(tokens[1].modifiers, 2);
    }

    #[test]
    fn rejects_partial_record() {
        assert_eq!(
            decode(&[1, 0, 4, 0, 0, 1, 10]),
            Err(TokenError::MalformedBuffer { len: 7 })
        );
    }

    #[test]
    fn rejects_out_of_order_records() {
        let buffer = [2, 0, 1, 0, 0, 1, 5, 1, 0, 0];
        assert_eq!(
            decode(&buffer),
            Err(TokenError::UnorderedBuffer { index: 1 })
        );
    }

    #[test]
    fn equal_start_positions_are_ordered() {
        let tokens = decode(&[3, 4, 1, 0, 0, 3, 4, 2, 1, 0]).unwrap();
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn positions_order_line_major() {
        assert!(TokenPos::new(0, 99) < TokenPos::new(1, 0));
        assert!(TokenPos::new(1, 2) < TokenPos::new(1, 3));
        assert_eq!(TokenPos::from(Position::new(4, 7)), TokenPos::new(4, 7));
    }
}
