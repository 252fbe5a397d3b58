//! Mail attachment

use std::{fs, path::Path};

use super::errors::MessageError;

/// Transfer encoding used for attachments unless told otherwise
pub const DEFAULT_ATTACHMENT_ENCODING: &str = "base64";

/// How a mail client should present an attachment
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Disposition {
    /// Offered as a separate file
    #[default]
    Attachment,

    /// Shown in the body, usually referenced through its content id
    Inline,
}

impl Disposition {
    /// The `Content-Disposition` value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attachment => "attachment",
            Self::Inline => "inline",
        }
    }
}

/// A file attached to a message
#[derive(Clone, PartialEq, Eq)]
pub struct MailAttachment {
    file_name: String,
    content: Vec<u8>,
    mime_type: String,
    encoding: String,
    disposition: Disposition,
    content_id: Option<String>,
}

impl MailAttachment {
    /// Create a new attachment
    pub fn new(
        file_name: impl Into<String>,
        content: impl Into<Vec<u8>>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
            mime_type: mime_type.into(),
            encoding: DEFAULT_ATTACHMENT_ENCODING.to_string(),
            disposition: Disposition::default(),
            content_id: None,
        }
    }

    /// Create an attachment from a file on disk, named after the file
    ///
    /// # Returns
    /// [`MessageError::Attachment`] if the file cannot be read.
    pub fn from_file(
        path: impl AsRef<Path>,
        mime_type: impl Into<String>,
    ) -> Result<Self, MessageError> {
        let path = path.as_ref();

        let content = fs::read(path).map_err(|source| MessageError::Attachment {
            path: path.to_path_buf(),
            source,
        })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self::new(file_name, content, mime_type))
    }

    /// Mark the attachment as inline, referenced from the HTML body as `cid:<content_id>`
    pub fn inline(mut self, content_id: impl Into<String>) -> Self {
        self.disposition = Disposition::Inline;
        self.content_id = Some(content_id.into());
        self
    }

    /// Override the transfer encoding
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// The file name shown to the recipient
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The raw content
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// The mime type, e.g. `application/pdf`
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The transfer encoding
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// The disposition
    pub fn disposition(&self) -> Disposition {
        self.disposition
    }

    /// The content id of an inline attachment
    pub fn content_id(&self) -> Option<&str> {
        self.content_id.as_deref()
    }
}

impl std::fmt::Debug for MailAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailAttachment")
            .field("file_name", &self.file_name)
            .field("content", &format_args!("{} bytes", self.content.len()))
            .field("mime_type", &self.mime_type)
            .field("encoding", &self.encoding)
            .field("disposition", &self.disposition)
            .field("content_id", &self.content_id)
            .finish()
    }
}
