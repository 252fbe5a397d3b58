//! Message errors

use std::{io, path::PathBuf};

use css_inline::InlineError;
use thiserror::Error;
use tracing::debug;

use crate::domain::text::ReducerError;

/// Errors that can occur while building or rendering a message
#[derive(Debug, Error)]
pub enum MessageError {
    /// The CSS inliner rejected the HTML body or the stylesheet
    #[error("rendering failed at stage css-inlining")]
    CssInlining(#[source] InlineError),

    /// A stylesheet file could not be read
    #[error("could not read stylesheet {path}")]
    CssFile {
        /// The stylesheet path
        path: PathBuf,

        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// An attachment file could not be read
    #[error("could not read attachment {path}")]
    Attachment {
        /// The attachment path
        path: PathBuf,

        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The encoding was set to an empty string
    #[error("encoding must not be empty")]
    EmptyEncoding,

    /// The HTML body could not be reduced to text
    #[error(transparent)]
    Markup(#[from] ReducerError),
}

impl From<InlineError> for MessageError {
    fn from(err: InlineError) -> Self {
        debug!("InlineError -> MessageError");

        MessageError::CssInlining(err)
    }
}
