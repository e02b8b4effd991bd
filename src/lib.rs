//! Incremental semantic token store for LSP clients.
//!
//! Keeps a document's semantic highlighting in step with a language server's
//! full and delta token responses, reports which document ranges must be
//! redrawn after each delta, and answers viewport queries by binary search.

mod error;
pub mod session;
pub mod settings;
mod store;
mod tokens;

pub use error::TokenError;
pub use session::{TokenEvent, TokenSession, TokenUpdate};
pub use settings::{discover_settings, load_settings, SemanticTokenSettings, Settings};
pub use store::{StoreRegistry, TokenState, TokenStore};
pub use tokens::{
    apply_edits, decode, DecodedToken, DeltaOutcome, InvalidatedRange, SpliceEdit, TokenPos,
    RECORD_STRIDE,
};
