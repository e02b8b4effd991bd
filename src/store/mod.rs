//! Token store state management.
//!
//! This module provides:
//! - `TokenState`, the immutable snapshot and its range query
//! - `TokenStore`, the per-document owner of the current snapshot
//! - `StoreRegistry` for looking up stores by document URI

mod cache;
mod registry;
mod state;

pub use cache::TokenStore;
pub use registry::StoreRegistry;
pub use state::TokenState;
