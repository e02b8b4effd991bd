//! The per-document token store.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tower_lsp::lsp_types::Range;

use super::state::TokenState;
use crate::error::TokenError;
use crate::tokens::{apply_edits, DecodedToken, InvalidatedRange, SpliceEdit};

/// Semantic tokens for one open document.
///
/// State is published as whole immutable snapshots through an atomic pointer:
/// readers holding an `Arc<TokenStore>` always see either the previous or the
/// next snapshot, never a mix. Writes are expected to come from a single owner
/// (see [`crate::session`]) in the order responses were received, since a
/// delta is only valid against the snapshot immediately before it.
#[derive(Debug)]
pub struct TokenStore {
    state: ArcSwapOption<TokenState>,
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore {
    /// Create a store with no tokens.
    pub fn new() -> Self {
        Self {
            state: ArcSwapOption::empty(),
        }
    }

    /// Replace all state with a full buffer.
    ///
    /// A full snapshot resets staleness tracking, so the installed state has no
    /// request id. If the buffer does not decode, the store is left empty: the
    /// previous baseline has been superseded and must not accept deltas.
    pub fn set_data(&self, buffer: Vec<u32>) -> Result<(), TokenError> {
        match TokenState::from_buffer(buffer) {
            Ok(state) => {
                tracing::debug!(tokens = state.tokens().len(), "installed full token snapshot");
                self.state.store(Some(Arc::new(state)));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "rejected full token snapshot");
                self.state.store(None);
                Err(e)
            }
        }
    }

    /// Apply a batch of splice edits to the current snapshot.
    ///
    /// On success the new snapshot is tagged with `request_id` and the ranges
    /// to redraw are returned (possibly with duplicates). On failure the
    /// current snapshot stays installed.
    pub fn apply_delta(
        &self,
        edits: &[SpliceEdit],
        request_id: Option<String>,
    ) -> Result<Vec<InvalidatedRange>, TokenError> {
        let Some(current) = self.state.load_full() else {
            tracing::warn!("token delta received with no baseline");
            return Err(TokenError::Precondition);
        };

        let outcome = apply_edits(current.buffer(), edits).inspect_err(|e| {
            tracing::warn!(
                error = %e,
                edits = edits.len(),
                base = ?current.request_id(),
                "rejected token delta"
            );
        })?;

        let invalidated = outcome.invalidated.clone();
        tracing::debug!(
            edits = edits.len(),
            tokens = outcome.tokens.len(),
            invalidated = invalidated.len(),
            request_id = ?request_id,
            "applied token delta"
        );
        self.state
            .store(Some(Arc::new(TokenState::from_outcome(outcome, request_id))));
        Ok(invalidated)
    }

    /// Tokens starting inside `range`, both ends inclusive, in document order.
    ///
    /// Empty when there is no state or nothing starts in the range.
    pub fn tokens_for(&self, range: Range) -> Vec<DecodedToken> {
        let guard = self.state.load();
        match guard.as_deref() {
            Some(state) => state.tokens_in(range.start.into(), range.end.into()).to_vec(),
            None => Vec::new(),
        }
    }

    /// Request id of the current snapshot.
    pub fn last_request_id(&self) -> Option<String> {
        self.state
            .load()
            .as_deref()
            .and_then(|state| state.request_id().map(str::to_owned))
    }

    /// The current snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<TokenState>> {
        self.state.load_full()
    }

    /// Whether a baseline exists for deltas.
    pub fn has_state(&self) -> bool {
        self.state.load().is_some()
    }

    /// Drop all state.
    pub fn clear(&self) {
        self.state.store(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Position;

    fn lines(from: u32, to: u32) -> Range {
        Range::new(Position::new(from, 0), Position::new(to, u32::MAX))
    }

    #[test]
    fn new_store_is_empty() {
        let store = TokenStore::new();
        assert!(!store.has_state());
        assert!(store.tokens_for(lines(0, 100)).is_empty());
        assert_eq!(store.last_request_id(), None);
    }

    #[test]
    fn delta_without_baseline_fails() {
        let store = TokenStore::new();
        let result = store.apply_delta(&[SpliceEdit::delete(0, 0)], Some("1".into()));
        assert_eq!(result, Err(TokenError::Precondition));
        assert!(!store.has_state());
    }

    #[test]
    fn delta_tags_state_and_full_resets_it() {
        let store = TokenStore::new();
        store.set_data(vec![0, 0, 1, 0, 0]).unwrap();
        assert_eq!(store.last_request_id(), None);

        store
            .apply_delta(&[SpliceEdit::insert(5, vec![1, 0, 1, 0, 0])], Some("7".into()))
            .unwrap();
        assert_eq!(store.last_request_id().as_deref(), Some("7"));

        store.set_data(vec![0, 0, 1, 0, 0]).unwrap();
        assert_eq!(store.last_request_id(), None);
    }

    #[test]
    fn failed_delta_keeps_previous_snapshot() {
        let store = TokenStore::new();
        store.set_data(vec![0, 0, 1, 0, 0]).unwrap();
        let before = store.snapshot().unwrap();

        let result = store.apply_delta(&[SpliceEdit::delete(4, 3)], Some("2".into()));
        assert!(matches!(result, Err(TokenError::OutOfRangeEdit { .. })));
        assert!(Arc::ptr_eq(&before, &store.snapshot().unwrap()));
    }

    #[test]
    fn malformed_full_snapshot_clears_state() {
        let store = TokenStore::new();
        store.set_data(vec![0, 0, 1, 0, 0]).unwrap();

        let result = store.set_data(vec![0, 0, 1]);
        assert_eq!(result, Err(TokenError::MalformedBuffer { len: 3 }));
        assert!(!store.has_state());
    }

    #[test]
    fn snapshots_outlive_updates() {
        let store = TokenStore::new();
        store.set_data(vec![0, 0, 1, 0, 0]).unwrap();
        let held = store.snapshot().unwrap();

        store.set_data(vec![1, 0, 1, 0, 0, 2, 0, 1, 0, 0]).unwrap();
        assert_eq!(held.tokens().len(), 1);
        assert_eq!(store.snapshot().unwrap().tokens().len(), 2);
    }

    #[test]
    fn multi_line_buffer_decodes_at_absolute_positions() {
        let store = TokenStore::new();
        store
            .set_data(vec![
                1, 4, 3, 0, 0, //
                3, 2, 5, 1, 0, //
                3, 9, 2, 2, 1, //
                7, 0, 4, 0, 0,
            ])
            .unwrap();

        let starts: Vec<(u32, u32)> = store
            .tokens_for(lines(0, 10))
            .iter()
            .map(|t| (t.line, t.character))
            .collect();
        assert_eq!(starts, vec![(1, 4), (3, 2), (3, 9), (7, 0)]);

        let on_three: Vec<u32> = store
            .tokens_for(lines(3, 3))
            .iter()
            .map(|t| t.length)
            .collect();
        assert_eq!(on_three, vec![5, 2]);
    }

    #[test]
    fn line_going_backwards_is_rejected() {
        // Positions must be absolute; a record on an earlier line than its
        // predecessor is a server fault.
        let store = TokenStore::new();
        let result = store.set_data(vec![2, 0, 3, 0, 0, 0, 5, 3, 0, 0]);
        assert_eq!(result, Err(TokenError::UnorderedBuffer { index: 1 }));
        assert!(!store.has_state());
    }

    #[test]
    fn clear_drops_state() {
        let store = TokenStore::new();
        store.set_data(vec![0, 0, 1, 0, 0]).unwrap();
        store.clear();
        assert!(store.snapshot().is_none());
    }
}
