//! Message composition on top of a transport.

use crate::error::{Result, SendError};
use crate::settings::{LEGACY_SEND_TO_DEVELOPER, SEND_ALL_EMAIL_TO_DEVELOPER, Settings};
use crate::transport::MailTransport;
use crate::types::{Attachment, EmailAddress, Message, parse_address_list};
use jobmail_text::{strip_html_tags, text_to_html};
use std::sync::Arc;

/// Inputs of [`Mailer::create`].
#[derive(Debug, Clone, Default)]
pub struct Draft {
    /// Sender.
    pub from: EmailAddress,
    /// Primary recipients.
    pub to: Vec<EmailAddress>,
    /// Carbon-copy recipients.
    pub cc: Vec<EmailAddress>,
    /// Blind carbon-copy recipients.
    pub bcc: Vec<EmailAddress>,
    /// Subject; line breaks are replaced.
    pub subject: String,
    /// Body, HTML or plain text depending on `is_html`.
    pub body: String,
    /// True if `body` is HTML.
    pub is_html: bool,
    /// Attachments.
    pub attachments: Vec<Attachment>,
}

impl Draft {
    /// Starts a draft from a sender and its recipients.
    #[must_use]
    pub fn new(from: EmailAddress, to: Vec<EmailAddress>) -> Self {
        Self {
            from,
            to,
            ..Self::default()
        }
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets a plain text body.
    #[must_use]
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self.is_html = false;
        self
    }

    /// Sets an HTML body.
    #[must_use]
    pub fn html(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self.is_html = true;
        self
    }

    /// Adds carbon-copy recipients.
    #[must_use]
    pub fn cc(mut self, addresses: Vec<EmailAddress>) -> Self {
        self.cc.extend(addresses);
        self
    }

    /// Adds blind carbon-copy recipients.
    #[must_use]
    pub fn bcc(mut self, addresses: Vec<EmailAddress>) -> Self {
        self.bcc.extend(addresses);
        self
    }

    /// Adds an attachment.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Builds messages and hands them to a transport.
///
/// When `SendGridSendAllEmailToDeveloper` (or the older
/// `AzureEmailSendToDeveloper`) is set, every message goes to those
/// addresses only and cc/bcc are dropped.
#[derive(Clone)]
pub struct Mailer {
    transport: Arc<dyn MailTransport>,
    settings: Arc<Settings>,
}

impl Mailer {
    /// Creates a mailer.
    #[must_use]
    pub fn new(transport: impl MailTransport + 'static, settings: Settings) -> Self {
        Self {
            transport: Arc::new(transport),
            settings: Arc::new(settings),
        }
    }

    /// Creates a mailer from shared parts.
    #[must_use]
    pub fn from_shared(transport: Arc<dyn MailTransport>, settings: Arc<Settings>) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Settings used for recipients and the developer redirect.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Addresses every message is redirected to, if the redirect is on.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured list is malformed.
    pub fn developer_recipients(&self) -> Result<Option<Vec<EmailAddress>>> {
        let Some(csv) = self
            .settings
            .get_any(&[SEND_ALL_EMAIL_TO_DEVELOPER, LEGACY_SEND_TO_DEVELOPER])
        else {
            return Ok(None);
        };
        Ok(Some(parse_address_list(&csv)?))
    }

    /// Builds a message.
    ///
    /// The plain text part is the body with HTML tags stripped when
    /// `is_html`; the HTML part is the body converted with
    /// [`text_to_html`] when not.
    ///
    /// # Errors
    ///
    /// Returns an error if the developer redirect list is malformed.
    pub fn create(&self, draft: Draft) -> Result<Message> {
        let (plain_text, html) = if draft.is_html {
            (strip_html_tags(&draft.body), draft.body)
        } else {
            (draft.body.clone(), text_to_html(&draft.body))
        };

        let message = Message::new(draft.from)
            .with_subject(&draft.subject)
            .body(plain_text, html);

        let message = match self.developer_recipients()? {
            Some(developers) => {
                tracing::info!(
                    recipients = developers.len(),
                    dropped = draft.to.len() + draft.cc.len() + draft.bcc.len(),
                    "Redirecting message to developer recipients"
                );
                message.to_all(developers)
            }
            None => message.to_all(draft.to).cc_all(draft.cc).bcc_all(draft.bcc),
        };

        Ok(draft.attachments.into_iter().fold(message, Message::attach))
    }

    /// Builds an HTML message.
    ///
    /// # Errors
    ///
    /// Returns an error if the developer redirect list is malformed.
    pub fn create_html(
        &self,
        from: EmailAddress,
        to: Vec<EmailAddress>,
        subject: &str,
        body: &str,
    ) -> Result<Message> {
        self.create(Draft::new(from, to).subject(subject).html(body))
    }

    /// Builds a plain text message.
    ///
    /// # Errors
    ///
    /// Returns an error if the developer redirect list is malformed.
    pub fn create_plain_text(
        &self,
        from: EmailAddress,
        to: Vec<EmailAddress>,
        subject: &str,
        body: &str,
    ) -> Result<Message> {
        self.create(Draft::new(from, to).subject(subject).text(body))
    }

    /// Sends a message.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::NoRecipients`] without contacting the
    /// transport if `to` is empty, otherwise whatever the transport
    /// reports.
    pub fn send(&self, message: &Message, must_wait: bool) -> std::result::Result<(), SendError> {
        if message.to.is_empty() {
            return Err(SendError::NoRecipients);
        }
        self.transport.send(message, must_wait)
    }
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
