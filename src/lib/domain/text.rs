//! Plain-text rendering of HTML bodies.

mod errors;
mod reducer;

pub use errors::{MarkupKind, ReducerError};
pub use reducer::{reduce, TagReducer, Unterminated, DEFAULT_EXPAND_TAGS};
