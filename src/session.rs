//! Per-document token session.
//!
//! The session is the single writer of a document's [`TokenStore`]. Server
//! responses are pushed into a bounded queue and applied one at a time in the
//! order they were received; each outcome is published to the renderer as a
//! [`TokenEvent`]. Stale deltas are dropped here using the store's last
//! request id, and protocol faults are reported as [`TokenEvent::RefreshRequired`]
//! so the client can ask the server for a fresh full snapshot.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::TokenError;
use crate::settings::SemanticTokenSettings;
use crate::store::TokenStore;
use crate::tokens::{InvalidatedRange, SpliceEdit};

/// A server response to be applied to a document's tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenUpdate {
    /// A complete token buffer with absolute positions.
    Full { data: Vec<u32> },
    /// Splice edits computed against the snapshot tagged `base`.
    Delta {
        base: Option<String>,
        request_id: Option<String>,
        edits: Vec<SpliceEdit>,
    },
    /// Forget all tokens, e.g. on `workspace/semanticTokens/refresh`.
    Clear,
}

/// What the renderer must do after an update was processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenEvent {
    /// Tokens were replaced or cleared wholesale; redraw everything visible.
    Reset,
    /// Redraw these ranges.
    Invalidated(Vec<InvalidatedRange>),
    /// A delta was computed against a snapshot that is no longer current.
    StaleDiscarded {
        base: Option<String>,
        current: Option<String>,
    },
    /// The update was rejected; request a new full snapshot.
    RefreshRequired(TokenError),
}

/// Handle to a running session task.
#[derive(Debug)]
pub struct TokenSession {
    updates: mpsc::Sender<TokenUpdate>,
    task: JoinHandle<()>,
}

impl TokenSession {
    /// Start a session that writes to `store`.
    ///
    /// Returns the session handle and the receiver the renderer reads events
    /// from. Must be called inside a tokio runtime.
    pub fn spawn(
        store: Arc<TokenStore>,
        settings: &SemanticTokenSettings,
    ) -> (Self, mpsc::Receiver<TokenEvent>) {
        let capacity = settings.queue_capacity();
        let (updates, update_rx) = mpsc::channel(capacity);
        let (event_tx, events) = mpsc::channel(capacity);
        let merge = settings.merge_invalidations;

        let task = tokio::spawn(run(store, update_rx, event_tx, merge));
        (Self { updates, task }, events)
    }

    /// Queue a server response, waiting for room if the queue is full.
    pub async fn push(
        &self,
        update: TokenUpdate,
    ) -> Result<(), mpsc::error::SendError<TokenUpdate>> {
        self.updates.send(update).await
    }

    /// A sender for feeding the session from another task.
    pub fn sender(&self) -> mpsc::Sender<TokenUpdate> {
        self.updates.clone()
    }

    /// Stop accepting updates and wait for queued ones to be applied.
    ///
    /// Senders obtained through [`TokenSession::sender`] keep the session
    /// alive until they are dropped too.
    pub async fn shutdown(self) {
        drop(self.updates);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "token session task failed");
        }
    }
}

async fn run(
    store: Arc<TokenStore>,
    mut updates: mpsc::Receiver<TokenUpdate>,
    events: mpsc::Sender<TokenEvent>,
    merge: bool,
) {
    while let Some(update) = updates.recv().await {
        let Some(event) = process(&store, update, merge) else {
            continue;
        };
        if events.send(event).await.is_err() {
            tracing::trace!("token event receiver dropped");
        }
    }
    tracing::debug!("token session closed");
}

/// Apply one update to the store and describe the outcome.
///
/// Returns `None` when nothing visible changed.
pub fn process(store: &TokenStore, update: TokenUpdate, merge: bool) -> Option<TokenEvent> {
    match update {
        TokenUpdate::Full { data } => match store.set_data(data) {
            Ok(()) => Some(TokenEvent::Reset),
            Err(e) => Some(TokenEvent::RefreshRequired(e)),
        },
        TokenUpdate::Delta {
            base,
            request_id,
            edits,
        } => {
            if !store.has_state() {
                return Some(TokenEvent::RefreshRequired(TokenError::Precondition));
            }

            let current = store.last_request_id();
            if base != current {
                tracing::debug!(?base, ?current, "discarding stale token delta");
                return Some(TokenEvent::StaleDiscarded { base, current });
            }

            match store.apply_delta(&edits, request_id) {
                Ok(ranges) if ranges.is_empty() => None,
                Ok(mut ranges) => {
                    if merge {
                        merge_ranges(&mut ranges);
                    }
                    Some(TokenEvent::Invalidated(ranges))
                }
                Err(e) => Some(TokenEvent::RefreshRequired(e)),
            }
        }
        TokenUpdate::Clear => {
            store.clear();
            Some(TokenEvent::Reset)
        }
    }
}

/// Sort ranges into document order and drop exact duplicates.
pub fn merge_ranges(ranges: &mut Vec<InvalidatedRange>) {
    ranges.sort_unstable();
    ranges.dedup();
}
