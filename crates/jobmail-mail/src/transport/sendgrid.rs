//! SendGrid v3 `mail/send` transport.

use super::{MailTransport, WaitPolicy};
use crate::error::{Result, SendError};
use crate::settings::{SENDGRID_API_KEY, Settings};
use crate::types::{Attachment, EmailAddress, Message};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use tokio::sync::oneshot;

/// Production endpoint of the mail send API.
pub const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where background sends run.
enum Executor {
    Owned(Option<Runtime>),
    Shared(Handle),
}

impl Executor {
    /// Joins the ambient runtime if it has worker threads, or starts a
    /// small one.
    ///
    /// A current-thread runtime cannot make progress while `send` blocks
    /// its only thread, so it is never joined.
    fn current_or_owned() -> Result<Self> {
        if let Ok(handle) = Handle::try_current() {
            if handle.runtime_flavor() != RuntimeFlavor::CurrentThread {
                return Ok(Self::Shared(handle));
            }
            tracing::debug!("Ambient runtime is single-threaded, starting a private one");
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("jobmail-send")
            .enable_all()
            .build()?;
        Ok(Self::Owned(Some(runtime)))
    }

    fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match self {
            Self::Owned(Some(runtime)) => drop(runtime.spawn(future)),
            Self::Owned(None) => {}
            Self::Shared(handle) => drop(handle.spawn(future)),
        }
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        // A plain drop blocks, and panics inside an async context.
        if let Self::Owned(runtime) = self
            && let Some(runtime) = runtime.take()
        {
            runtime.shutdown_background();
        }
    }
}

/// Sends messages through the SendGrid HTTP API.
///
/// The request runs on a tokio runtime: the ambient one when built inside
/// a multi-threaded runtime, otherwise a private single-worker runtime.
/// `send` blocks the calling thread while it waits.
///
/// Sends still in flight when a client with a private runtime is dropped
/// are abandoned.
pub struct SendGridClient {
    api_key: Option<String>,
    endpoint: String,
    http_client: Client,
    executor: Executor,
    wait_policy: WaitPolicy,
}

impl SendGridClient {
    /// Creates a client with an explicit API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or the runtime cannot be started.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        Self::build((!api_key.is_empty()).then_some(api_key))
    }

    /// Creates a client whose API key comes from `SendGridApiKey`.
    ///
    /// A missing key is not an error here; sends fail with
    /// [`SendError::MissingApiKey`].
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or the runtime cannot be started.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.get(SENDGRID_API_KEY);
        if api_key.is_none() {
            tracing::warn!("No SendGrid API key configured");
        }
        Self::build(api_key)
    }

    fn build(api_key: Option<String>) -> Result<Self> {
        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            api_key,
            endpoint: SENDGRID_ENDPOINT.to_string(),
            http_client,
            executor: Executor::current_or_owned()?,
            wait_policy: WaitPolicy::default(),
        })
    }

    /// Posts to a different URL (proxies, tests).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets how long `send` blocks when asked to wait.
    #[must_use]
    pub const fn with_wait_policy(mut self, wait_policy: WaitPolicy) -> Self {
        self.wait_policy = wait_policy;
        self
    }

    /// Runs sends on the given runtime.
    ///
    /// The runtime needs worker threads of its own if callers wait.
    #[must_use]
    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.executor = Executor::Shared(handle);
        self
    }

    /// Target URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Current wait policy.
    #[must_use]
    pub const fn wait_policy(&self) -> WaitPolicy {
        self.wait_policy
    }

    /// Returns true if an API key is configured.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl MailTransport for SendGridClient {
    fn send(&self, message: &Message, must_wait: bool) -> std::result::Result<(), SendError> {
        let api_key = self.api_key.as_deref().ok_or(SendError::MissingApiKey)?;
        let body = serde_json::to_value(MailSend::from(message))?;

        let request = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body);

        tracing::debug!(
            endpoint = %self.endpoint,
            recipients = message.to.len(),
            must_wait,
            "Sending message"
        );

        let (tx, mut rx) = oneshot::channel();
        self.executor.spawn(async move {
            let outcome = deliver(request).await;
            if let Err(e) = &outcome {
                tracing::error!(error = %e, "SendGrid send failed");
            }
            let _ = tx.send(outcome);
        });

        self.wait_policy.wait(&mut rx, must_wait)
    }
}

async fn deliver(request: RequestBuilder) -> std::result::Result<(), SendError> {
    let response = request.send().await?;
    let status = response.status();

    if status.is_success() {
        tracing::info!(status = status.as_u16(), "Message accepted by SendGrid");
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    Err(SendError::rejected(status.as_u16(), body))
}

impl fmt::Debug for SendGridClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendGridClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("wait_policy", &self.wait_policy)
            .finish_non_exhaustive()
    }
}

// Wire format of POST /v3/mail/send.

#[derive(Debug, Serialize)]
struct MailSend<'a> {
    personalizations: [Personalization<'a>; 1],
    from: &'a EmailAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a EmailAddress>,
    subject: &'a str,
    content: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "is_empty_list")]
    categories: &'a [String],
    #[serde(skip_serializing_if = "is_empty_map")]
    custom_args: &'a BTreeMap<String, String>,
    #[serde(skip_serializing_if = "is_empty_map")]
    headers: &'a BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<WireAttachment<'a>>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: &'a [EmailAddress],
    #[serde(skip_serializing_if = "is_empty_list")]
    cc: &'a [EmailAddress],
    #[serde(skip_serializing_if = "is_empty_list")]
    bcc: &'a [EmailAddress],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    mime_type: &'static str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct WireAttachment<'a> {
    content: &'a str,
    filename: &'a str,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    disposition: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_id: Option<&'a str>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_empty_list<T>(items: &&[T]) -> bool {
    items.is_empty()
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_empty_map(map: &&BTreeMap<String, String>) -> bool {
    map.is_empty()
}

impl<'a> From<&'a Message> for MailSend<'a> {
    fn from(message: &'a Message) -> Self {
        // text/plain must come before text/html.
        let content = [
            ("text/plain", message.plain_text.as_str()),
            ("text/html", message.html.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(mime_type, value)| Content { mime_type, value })
        .collect();

        Self {
            personalizations: [Personalization {
                to: &message.to,
                cc: &message.cc,
                bcc: &message.bcc,
            }],
            from: &message.from,
            reply_to: message.reply_to.as_ref(),
            subject: message.subject(),
            content,
            categories: message.categories(),
            custom_args: message.custom_args(),
            headers: message.headers(),
            attachments: message.attachments.iter().map(WireAttachment::from).collect(),
        }
    }
}

impl<'a> From<&'a Attachment> for WireAttachment<'a> {
    fn from(attachment: &'a Attachment) -> Self {
        Self {
            content: &attachment.content,
            filename: &attachment.filename,
            mime_type: attachment.mime_type.as_deref(),
            disposition: attachment.disposition.as_deref(),
            content_id: attachment.content_id.as_deref(),
        }
    }
}
