//! Splice edits against a flat token buffer.
//!
//! Edits carry raw integer offsets into the absolute-position buffer. Offsets
//! need not be record-aligned; invalidation is always reported per whole
//! record.

use tower_lsp::lsp_types::{Position, Range};

use super::codec::{decode, DecodedToken, TokenPos, RECORD_STRIDE};
use crate::error::TokenError;

/// A single splice against a flat buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpliceEdit {
    /// Integer offset into the buffer.
    pub start: usize,
    /// Number of integers (not records) to remove at `start`.
    pub delete_count: usize,
    /// Integers to insert at `start` after the removal.
    pub insert: Option<Vec<u32>>,
}

impl SpliceEdit {
    pub fn new(start: usize, delete_count: usize, insert: Option<Vec<u32>>) -> Self {
        Self {
            start,
            delete_count,
            insert,
        }
    }

    /// Remove `delete_count` integers at `start`.
    pub fn delete(start: usize, delete_count: usize) -> Self {
        Self::new(start, delete_count, None)
    }

    /// Insert `data` at `start` without removing anything.
    pub fn insert(start: usize, data: Vec<u32>) -> Self {
        Self::new(start, 0, Some(data))
    }

    fn inserted(&self) -> &[u32] {
        self.insert.as_deref().unwrap_or(&[])
    }

    fn is_noop(&self) -> bool {
        self.delete_count == 0 && self.inserted().is_empty()
    }
}

/// A document span whose highlighting must be redrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InvalidatedRange {
    pub line: u32,
    pub character: u32,
    pub length: u32,
}

impl InvalidatedRange {
    /// Read the span of the record starting at `index`.
    ///
    /// Intermediate buffers inside a batch may end in a partial record; the
    /// missing fields read as zero.
    fn at(buffer: &[u32], index: usize) -> Option<Self> {
        let field = |offset: usize| buffer.get(index + offset).copied().unwrap_or(0);
        Some(Self {
            line: *buffer.get(index)?,
            character: field(1),
            length: field(2),
        })
    }

    pub fn start(&self) -> TokenPos {
        TokenPos::new(self.line, self.character)
    }

    /// The span as a single-line LSP range.
    pub fn to_range(&self) -> Range {
        Range::new(
            Position::new(self.line, self.character),
            Position::new(self.line, self.character.saturating_add(self.length)),
        )
    }
}

/// Result of applying a batch of edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaOutcome {
    pub buffer: Vec<u32>,
    pub tokens: Vec<DecodedToken>,
    /// Ranges in application order; may contain duplicates.
    pub invalidated: Vec<InvalidatedRange>,
}

/// Apply `edits` to a copy of `buffer`.
///
/// Edits are applied from the highest `start` down so that lower offsets
/// still refer to unshifted positions. Edits sharing a `start` are applied
/// last-submitted first, which leaves their inserted data in submission order.
/// The input buffer is never touched, so a failed batch leaves no trace.
pub fn apply_edits(buffer: &[u32], edits: &[SpliceEdit]) -> Result<DeltaOutcome, TokenError> {
    let mut ordered: Vec<&SpliceEdit> = edits.iter().collect();
    ordered.sort_by_key(|edit| edit.start);

    let mut buffer = buffer.to_vec();
    let mut invalidated = Vec::new();

    for edit in ordered.into_iter().rev() {
        if edit.is_noop() {
            continue;
        }

        let end = edit
            .start
            .checked_add(edit.delete_count)
            .filter(|&end| end <= buffer.len())
            .ok_or(TokenError::OutOfRangeEdit {
                start: edit.start,
                delete_count: edit.delete_count,
                len: buffer.len(),
            })?;

        invalidate_span(&buffer, edit.start, end, &mut invalidated);

        let inserted = edit.inserted();
        buffer.splice(edit.start..end, inserted.iter().copied());

        if !inserted.is_empty() {
            invalidate_span(
                &buffer,
                edit.start,
                edit.start + inserted.len(),
                &mut invalidated,
            );
        }
    }

    let tokens = decode(&buffer)?;
    Ok(DeltaOutcome {
        buffer,
        tokens,
        invalidated,
    })
}

/// Push one range per record touched by the integer span `[start, end)`.
///
/// `start` is rounded down to a record boundary so a partially touched record
/// is reported whole.
fn invalidate_span(buffer: &[u32], start: usize, end: usize, out: &mut Vec<InvalidatedRange>) {
    let mut index = start - start % RECORD_STRIDE;
    while index < end {
        out.extend(InvalidatedRange::at(buffer, index));
        index += RECORD_STRIDE;
    }
}
