//! Outbound mail messages and their value objects.

mod address;
mod attachment;
mod errors;
mod inliner;
mod message;

pub use address::MailAddress;
pub use attachment::{Disposition, MailAttachment, DEFAULT_ATTACHMENT_ENCODING};
pub use errors::MessageError;
pub use inliner::{CssInline, CssInliner, HtmlSource};
pub use message::{Message, DEFAULT_ENCODING};
