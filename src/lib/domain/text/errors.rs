//! Tag reducer errors

use std::fmt;

use thiserror::Error;

/// The kind of markup construct the reducer was scanning
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkupKind {
    /// An HTML comment, `<!-- ... -->`
    Comment,

    /// A tag whose whole span is removed, e.g. `<script>...</script>`
    ExpandBlock,

    /// Any other tag
    Tag,
}

impl fmt::Display for MarkupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comment => write!(f, "comment"),
            Self::ExpandBlock => write!(f, "expand block"),
            Self::Tag => write!(f, "tag"),
        }
    }
}

/// Errors that can occur when reducing HTML to plain text
#[derive(Debug, Error)]
pub enum ReducerError {
    /// A keep or expand tag name can never match a tag
    #[error("invalid tag name {name:?}")]
    InvalidTagName {
        /// The rejected name
        name: String,
    },

    /// Markup was opened but never closed
    #[error("unterminated {kind} starting at byte {offset}")]
    Unterminated {
        /// What was being scanned
        kind: MarkupKind,

        /// Byte offset of the opening `<`
        offset: usize,
    },

    /// A tag pattern could not be compiled
    #[error(transparent)]
    Pattern(#[from] regex::Error),
}
