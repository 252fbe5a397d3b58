//! Mail address

use std::fmt;

/// A mailbox with an optional display name
///
/// No format checking happens here, the transport decides what it accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailAddress {
    address: String,
    display_name: Option<String>,
}

impl MailAddress {
    /// Create a new mail address without a display name
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            display_name: None,
        }
    }

    /// Create a new mail address with a display name
    pub fn with_name(address: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            display_name: Some(display_name.into()),
        }
    }

    /// The address itself
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The name to display, if any
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }
}

impl fmt::Display for MailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{} <{}>", name, self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

impl From<&str> for MailAddress {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}
