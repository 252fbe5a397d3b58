//! Outbound mail message

use std::{fmt, fs, path::Path, sync::Arc};

use tracing::debug;

use crate::domain::text::TagReducer;

use super::{
    address::MailAddress,
    attachment::MailAttachment,
    errors::MessageError,
    inliner::{CssInline, CssInliner, HtmlSource},
};

/// Encoding used unless told otherwise
pub const DEFAULT_ENCODING: &str = "utf-8";

/// An outbound mail: bodies, recipients, attachments and the stylesheet to inline
///
/// When no text body is set the message derives one from the HTML body by
/// stripping its markup, unless [`Message::auto_create_body_text`] turned that off.
/// CSS registered with [`Message::add_css_text`] or [`Message::add_css_file`] is
/// inlined every time the HTML body is read.
#[derive(Clone)]
pub struct Message {
    title: String,
    body_text: Option<String>,
    body_html: Option<String>,
    css: String,
    from: Option<MailAddress>,
    to_recipients: Vec<MailAddress>,
    cc_recipients: Vec<MailAddress>,
    bcc_recipients: Vec<MailAddress>,
    attachments: Vec<MailAttachment>,
    encoding: String,
    auto_create_missing_text: bool,
    text_reducer: TagReducer,
    inliner: Arc<dyn CssInliner>,
    html_source: Option<Arc<dyn HtmlSource>>,
}

impl Message {
    /// Creates a new message with the given title and no bodies
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body_text: None,
            body_html: None,
            css: String::new(),
            from: None,
            to_recipients: Vec::new(),
            cc_recipients: Vec::new(),
            bcc_recipients: Vec::new(),
            attachments: Vec::new(),
            encoding: DEFAULT_ENCODING.to_string(),
            auto_create_missing_text: true,
            text_reducer: TagReducer::default(),
            inliner: Arc::new(CssInline),
            html_source: None,
        }
    }

    /// Creates a new message with a title and a text body
    pub fn with_text(title: impl Into<String>, body_text: impl Into<String>) -> Self {
        let mut message = Self::new(title);
        message.body_text = Some(body_text.into());
        message
    }

    /// Replaces the CSS inliner
    pub fn with_inliner(mut self, inliner: impl CssInliner) -> Self {
        self.inliner = Arc::new(inliner);
        self
    }

    /// The mail title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Sets the mail title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Returns the text body
    ///
    /// # Returns
    /// - The explicit text body when one was set, even an empty one.
    /// - Otherwise, with auto creation on, the final HTML body reduced to text.
    /// - [`None`] when auto creation is off or there is no HTML body either.
    ///
    /// Errors from CSS inlining or, with a strict reducer, from malformed markup
    /// are returned as they are.
    pub fn body_text(&self) -> Result<Option<String>, MessageError> {
        if let Some(text) = &self.body_text {
            return Ok(Some(text.clone()));
        }

        if !self.auto_create_missing_text {
            debug!(title = %self.title, "no text body and auto creation is off");

            return Ok(None);
        }

        let Some(html) = self.body_html()? else {
            return Ok(None);
        };

        debug!(title = %self.title, "deriving text body from html body");

        Ok(Some(self.text_reducer.reduce(&html)?))
    }

    /// Sets the text body
    pub fn set_body_text(&mut self, body_text: impl Into<String>) {
        self.body_text = Some(body_text.into());
    }

    /// Removes the text body so that it is derived again
    pub fn clear_body_text(&mut self) {
        self.body_text = None;
    }

    /// Returns the HTML body with the registered CSS inlined
    pub fn body_html(&self) -> Result<Option<String>, MessageError> {
        let Some(html) = self.html_before_inlining() else {
            return Ok(None);
        };

        if self.css.is_empty() {
            return Ok(Some(html));
        }

        debug!(title = %self.title, css_len = self.css.len(), "inlining css into html body");

        Ok(Some(self.inliner.inline(&html, &self.css)?))
    }

    /// Returns the HTML body before CSS is inlined, from the [`HtmlSource`] if one is set
    pub fn html_before_inlining(&self) -> Option<String> {
        match &self.html_source {
            Some(source) => source.html_before_inlining(self),
            None => self.body_html.clone(),
        }
    }

    /// The HTML body exactly as it was set
    pub fn raw_body_html(&self) -> Option<&str> {
        self.body_html.as_deref()
    }

    /// Sets the HTML body
    pub fn set_body_html(&mut self, body_html: impl Into<String>) {
        self.body_html = Some(body_html.into());
    }

    /// Computes the HTML body from `source` instead of the stored one
    pub fn set_html_source(&mut self, source: impl HtmlSource) {
        self.html_source = Some(Arc::new(source));
    }

    /// The sender
    pub fn from(&self) -> Option<&MailAddress> {
        self.from.as_ref()
    }

    /// Sets the sender
    pub fn set_from(&mut self, from: MailAddress) {
        self.from = Some(from);
    }

    /// The recipients, in the order they were added
    pub fn to_recipients(&self) -> &[MailAddress] {
        &self.to_recipients
    }

    /// Replaces the recipients
    pub fn set_to_recipients(&mut self, recipients: Vec<MailAddress>) {
        self.to_recipients = recipients;
    }

    /// Adds a recipient
    pub fn add_to_recipient(&mut self, recipient: MailAddress) {
        self.to_recipients.push(recipient);
    }

    /// The recipients in Cc
    pub fn cc_recipients(&self) -> &[MailAddress] {
        &self.cc_recipients
    }

    /// Replaces the recipients in Cc
    pub fn set_cc_recipients(&mut self, recipients: Vec<MailAddress>) {
        self.cc_recipients = recipients;
    }

    /// Adds a recipient in Cc
    pub fn add_cc_recipient(&mut self, recipient: MailAddress) {
        self.cc_recipients.push(recipient);
    }

    /// The recipients in Bcc
    pub fn bcc_recipients(&self) -> &[MailAddress] {
        &self.bcc_recipients
    }

    /// Replaces the recipients in Bcc
    pub fn set_bcc_recipients(&mut self, recipients: Vec<MailAddress>) {
        self.bcc_recipients = recipients;
    }

    /// Adds a recipient in Bcc
    pub fn add_bcc_recipient(&mut self, recipient: MailAddress) {
        self.bcc_recipients.push(recipient);
    }

    /// The attachments
    pub fn attachments(&self) -> &[MailAttachment] {
        &self.attachments
    }

    /// Replaces the attachments
    pub fn set_attachments(&mut self, attachments: Vec<MailAttachment>) {
        self.attachments = attachments;
    }

    /// Adds an attachment
    pub fn add_attachment(&mut self, attachment: MailAttachment) {
        self.attachments.push(attachment);
    }

    /// The mail encoding, `utf-8` by default
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Sets the mail encoding
    ///
    /// # Returns
    /// [`MessageError::EmptyEncoding`] for an empty value, leaving the encoding as it was.
    pub fn set_encoding(&mut self, encoding: impl Into<String>) -> Result<(), MessageError> {
        let encoding = encoding.into();

        if encoding.trim().is_empty() {
            return Err(MessageError::EmptyEncoding);
        }

        self.encoding = encoding;

        Ok(())
    }

    /// Turns deriving the text body from the HTML body on or off
    pub fn auto_create_body_text(&mut self, auto_create: bool) {
        self.auto_create_missing_text = auto_create;
    }

    /// Whether a missing text body is derived from the HTML body
    pub fn auto_creates_body_text(&self) -> bool {
        self.auto_create_missing_text
    }

    /// The reducer used to derive the text body
    pub fn text_reducer(&self) -> &TagReducer {
        &self.text_reducer
    }

    /// Replaces the reducer used to derive the text body
    pub fn set_text_reducer(&mut self, reducer: TagReducer) {
        self.text_reducer = reducer;
    }

    /// The stylesheet registered so far
    pub fn css(&self) -> &str {
        &self.css
    }

    /// Registers CSS to inline into the HTML body
    pub fn add_css_text(&mut self, css: &str) {
        self.css.push_str(css);
    }

    /// Registers a CSS file to inline into the HTML body
    ///
    /// # Returns
    /// [`MessageError::CssFile`] if the file cannot be read.
    pub fn add_css_file(&mut self, path: impl AsRef<Path>) -> Result<(), MessageError> {
        let path = path.as_ref();

        let css = fs::read_to_string(path).map_err(|source| MessageError::CssFile {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), "registered stylesheet");

        self.css.push_str(&css);

        Ok(())
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("title", &self.title)
            .field("body_text", &self.body_text)
            .field("body_html", &self.body_html)
            .field("css", &self.css)
            .field("from", &self.from)
            .field("to_recipients", &self.to_recipients)
            .field("cc_recipients", &self.cc_recipients)
            .field("bcc_recipients", &self.bcc_recipients)
            .field("attachments", &self.attachments)
            .field("encoding", &self.encoding)
            .field("auto_create_missing_text", &self.auto_create_missing_text)
            .field("text_reducer", &self.text_reducer)
            .field("html_source", &self.html_source.is_some())
            .finish_non_exhaustive()
    }
}
