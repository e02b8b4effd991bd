//! Token stores for all open documents.

use std::sync::Arc;

use dashmap::DashMap;
use tower_lsp::lsp_types::Url;

use super::cache::TokenStore;

/// Thread-safe map from open documents to their token stores.
///
/// Each store is handed out as an `Arc` so the renderer and the language
/// server session can hold the same store without going back through here.
#[derive(Debug, Default)]
pub struct StoreRegistry {
    stores: DashMap<Url, Arc<TokenStore>>,
}

impl StoreRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            stores: DashMap::new(),
        }
    }

    /// Get the store for a document, creating an empty one when first opened.
    pub fn open(&self, uri: Url) -> Arc<TokenStore> {
        let store = self
            .stores
            .entry(uri)
            .or_insert_with(|| Arc::new(TokenStore::new()));
        Arc::clone(&store)
    }

    /// Forget a closed document. Outstanding handles keep their last state.
    pub fn close(&self, uri: &Url) -> Option<Arc<TokenStore>> {
        self.stores.remove(uri).map(|(_, store)| store)
    }

    /// Get a document's store.
    pub fn get(&self, uri: &Url) -> Option<Arc<TokenStore>> {
        self.stores.get(uri).map(|r| Arc::clone(&r))
    }

    /// Drop the tokens of every open document, keeping the stores.
    ///
    /// Used when the server asks for a refresh or restarts: no existing
    /// baseline is valid for its future deltas.
    pub fn clear_all(&self) {
        for entry in self.stores.iter() {
            entry.value().clear();
        }
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}
