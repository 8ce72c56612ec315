//! Provider-neutral outgoing message.

use super::address::EmailAddress;
use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::collections::BTreeMap;

/// Header names the provider sets itself (compared case-insensitively).
pub const RESERVED_HEADERS: &[&str] = &[
    "x-sg-id",
    "x-sg-eid",
    "received",
    "dkim-signature",
    "content-type",
    "content-transfer-encoding",
    "to",
    "from",
    "subject",
    "reply-to",
    "cc",
    "bcc",
];

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name shown to the recipient.
    pub filename: String,
    /// Base64-encoded content.
    pub content: String,
    /// MIME type, e.g. `text/csv`.
    pub mime_type: Option<String>,
    /// `attachment` or `inline`.
    pub disposition: Option<String>,
    /// Content id for inline attachments.
    pub content_id: Option<String>,
}

impl Attachment {
    /// Creates an attachment from already base64-encoded content.
    #[must_use]
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            mime_type: None,
            disposition: None,
            content_id: None,
        }
    }

    /// Creates an attachment from raw bytes.
    #[must_use]
    pub fn from_bytes(filename: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(filename, BASE64.encode(bytes))
    }

    /// Sets the MIME type.
    #[must_use]
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Marks the attachment inline with the given content id.
    #[must_use]
    pub fn inline(mut self, content_id: impl Into<String>) -> Self {
        self.disposition = Some("inline".to_string());
        self.content_id = Some(content_id.into());
        self
    }
}

/// An outgoing email, built fresh for every send.
///
/// Categories are a set, custom args and headers are maps with unique keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Sender.
    pub from: EmailAddress,
    /// Primary recipients.
    pub to: Vec<EmailAddress>,
    /// Carbon-copy recipients.
    pub cc: Vec<EmailAddress>,
    /// Blind carbon-copy recipients.
    pub bcc: Vec<EmailAddress>,
    /// Reply-to address.
    pub reply_to: Option<EmailAddress>,
    /// Plain text body.
    pub plain_text: String,
    /// HTML body.
    pub html: String,
    /// Attachments, in order.
    pub attachments: Vec<Attachment>,
    subject: String,
    categories: Vec<String>,
    custom_args: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
}

impl Message {
    /// Creates an empty message from a sender.
    #[must_use]
    pub fn new(from: EmailAddress) -> Self {
        Self {
            from,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: None,
            plain_text: String::new(),
            html: String::new(),
            attachments: Vec::new(),
            subject: String::new(),
            categories: Vec::new(),
            custom_args: BTreeMap::new(),
            headers: BTreeMap::new(),
        }
    }

    /// Returns the subject.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Sets the subject; line breaks become spaces.
    #[must_use]
    pub fn with_subject(mut self, subject: &str) -> Self {
        self.subject = subject.replace(['\r', '\n'], " ");
        self
    }

    /// Adds a primary recipient.
    #[must_use]
    pub fn to(mut self, address: EmailAddress) -> Self {
        self.to.push(address);
        self
    }

    /// Adds primary recipients.
    #[must_use]
    pub fn to_all(mut self, addresses: impl IntoIterator<Item = EmailAddress>) -> Self {
        self.to.extend(addresses);
        self
    }

    /// Adds carbon-copy recipients.
    #[must_use]
    pub fn cc_all(mut self, addresses: impl IntoIterator<Item = EmailAddress>) -> Self {
        self.cc.extend(addresses);
        self
    }

    /// Adds blind carbon-copy recipients.
    #[must_use]
    pub fn bcc_all(mut self, addresses: impl IntoIterator<Item = EmailAddress>) -> Self {
        self.bcc.extend(addresses);
        self
    }

    /// Sets the reply-to address.
    #[must_use]
    pub fn reply_to(mut self, address: EmailAddress) -> Self {
        self.reply_to = Some(address);
        self
    }

    /// Sets both bodies.
    #[must_use]
    pub fn body(mut self, plain_text: impl Into<String>, html: impl Into<String>) -> Self {
        self.plain_text = plain_text.into();
        self.html = html.into();
        self
    }

    /// Adds an attachment.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Categories, in insertion order.
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Adds a category. Duplicates are ignored.
    pub fn add_category(&mut self, category: impl Into<String>) {
        let category = category.into();
        if !self.categories.contains(&category) {
            self.categories.push(category);
        }
    }

    /// Custom arguments carried along with the send.
    #[must_use]
    pub const fn custom_args(&self) -> &BTreeMap<String, String> {
        &self.custom_args
    }

    /// Inserts or replaces a custom argument.
    pub fn add_custom_arg(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.custom_args.insert(key.into(), value.into());
    }

    /// Extra headers.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Inserts or replaces a header.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is one of [`RESERVED_HEADERS`].
    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        if RESERVED_HEADERS
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(&key))
        {
            return Err(Error::ReservedHeader(key));
        }
        self.headers.insert(key, value.into());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn message() -> Message {
        Message::new(EmailAddress::new("jobs@example.com"))
    }

    #[test]
    fn test_subject_line_breaks_become_spaces() {
        let message = message().with_subject("Nightly\r\nreport\n");
        assert_eq!(message.subject(), "Nightly  report ");
    }

    #[test]
    fn test_categories_are_a_set() {
        let mut message = message();
        message.add_category("nightly job");
        message.add_category("billing");
        message.add_category("nightly job");
        assert_eq!(message.categories(), ["nightly job", "billing"]);
    }

    #[test]
    fn test_custom_args_insert_or_replace() {
        let mut message = message();
        message.add_custom_arg("run", "1");
        message.add_custom_arg("run", "2");
        assert_eq!(message.custom_args().len(), 1);
        assert_eq!(message.custom_args()["run"], "2");
    }

    #[test]
    fn test_reserved_headers_are_refused() {
        let mut message = message();
        message.add_header("X-Job-Id", "42").unwrap();
        message.add_header("X-Job-Id", "43").unwrap();

        let err = message.add_header("Reply-To", "x@example.com").unwrap_err();
        assert!(matches!(err, Error::ReservedHeader(ref name) if name == "Reply-To"));
        assert!(message.add_header("DKIM-Signature", "x").is_err());

        assert_eq!(message.headers().len(), 1);
        assert_eq!(message.headers()["X-Job-Id"], "43");
    }

    #[test]
    fn test_attachment_from_bytes_is_base64() {
        let attachment = Attachment::from_bytes("report.csv", b"id,total\n1,10\n").mime_type("text/csv");
        assert_eq!(attachment.content, "aWQsdG90YWwKMSwxMAo=");
        assert_eq!(attachment.mime_type.as_deref(), Some("text/csv"));
        assert!(attachment.disposition.is_none());
    }

    #[test]
    fn test_builder() {
        let message = message()
            .to(EmailAddress::new("a@example.com"))
            .cc_all([EmailAddress::new("b@example.com")])
            .bcc_all([EmailAddress::new("c@example.com")])
            .reply_to(EmailAddress::new("ops@example.com"))
            .body("plain", "<p>html</p>")
            .attach(Attachment::new("logo.png", "AAAA").inline("logo"));

        assert_eq!(message.to.len(), 1);
        assert_eq!(message.cc.len(), 1);
        assert_eq!(message.bcc.len(), 1);
        assert_eq!(message.html, "<p>html</p>");
        assert_eq!(message.attachments[0].disposition.as_deref(), Some("inline"));
    }
}
