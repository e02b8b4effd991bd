//! Token buffer codec and delta engine.
//!
//! This module provides:
//! - `decode` for turning a flat fixed-stride buffer into ordered tokens
//! - `apply_edits` for splicing a batch of delta edits into a buffer and
//!   reporting the document ranges that changed

mod codec;
mod delta;

pub use codec::{decode, DecodedToken, TokenPos, RECORD_STRIDE};
pub use delta::{apply_edits, DeltaOutcome, InvalidatedRange, SpliceEdit};
