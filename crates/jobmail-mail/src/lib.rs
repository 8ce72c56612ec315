//! # jobmail-mail
//!
//! Turns a job's console output into a notification email.
//!
//! ## Features
//!
//! - **Recipient lists**: `a@b.com, "Name" <c@d.com>` parsing and rendering
//! - **Message model**: provider-neutral [`Message`] with categories,
//!   custom args, headers and attachments
//! - **Settings chain**: environment (`APPSETTING_*`) first, then
//!   `appsettings.json`, first non-empty value wins
//! - **Developer redirect**: `SendGridSendAllEmailToDeveloper` sends every
//!   message to the developers instead
//! - **SendGrid transport**: v3 `mail/send` over HTTPS with a bounded wait
//! - **Email console**: [`EmailConsole`] mails its own buffer with a
//!   subject built from the run outcome
//!
//! ## Quick Start
//!
//! ```ignore
//! use jobmail_console::{ConsoleOptions, UsageScenario};
//! use jobmail_mail::{EmailConsole, EmailConsoleConfig};
//!
//! let config = EmailConsoleConfig::new("Nightly Job").execution_to("ops@example.com");
//! let mut console =
//!     EmailConsole::sendgrid(UsageScenario::ConsoleApp, Some(config), ConsoleOptions::default())?;
//!
//! console.try_to("Import customers");
//! console.try_ok();
//!
//! // [OK] Nightly Job - Successfully completed
//! console.send_buffer_by_email(false, false, &[], None);
//! ```
//!
//! ## Sending
//!
//! ```text
//! EmailConsole ── Draft ──→ Mailer::create ── Message ──→ Mailer::send
//!                                │                            │
//!                        developer redirect            MailTransport
//!                                                             │
//!                                                      SendGridClient
//! ```
//!
//! ## Modules
//!
//! - [`settings`]: setting sources and the lookup chain
//! - [`transport`]: the transport trait, wait policy and SendGrid client
//! - [`types`]: addresses and messages

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod email_console;
mod error;
mod mailer;
pub mod settings;
pub mod transport;
pub mod types;

pub use email_console::{EmailConsole, EmailConsoleConfig, NotificationRecipients};
pub use error::{Error, Result, SendError};
pub use mailer::{Draft, Mailer};
pub use settings::Settings;
pub use transport::{MailTransport, SendGridClient, WaitPolicy};
pub use types::{
    Attachment, EmailAddress, Message, dump_address, dump_address_list, format_address,
    parse_address_list,
};
