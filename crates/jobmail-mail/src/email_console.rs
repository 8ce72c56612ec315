//! Console that mails its own buffer when the job is done.

use crate::error::Result;
use crate::mailer::{Draft, Mailer};
use crate::settings::{
    ERROR_NOTIFICATION_TO, EXECUTION_NOTIFICATION_TO, Settings, WARNING_NOTIFICATION_TO,
};
use crate::transport::SendGridClient;
use crate::types::{EmailAddress, dump_address, dump_address_list, format_address, parse_address_list};
use jobmail_console::{
    Console, ConsoleConfig, ConsoleEvents, ConsoleOptions, HandlerResult, LifecycleArgs,
    StandardConsole, UsageScenario,
};
use serde::Deserialize;
use std::fmt::Display;
use std::io::Write;

const SEPARATOR_WIDTH: usize = 80;

/// Mail settings of an [`EmailConsole`].
///
/// Recipient fields are comma-separated lists (`a@b.com, "Name" <c@d.com>`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailConsoleConfig {
    /// Console settings (job title, init handler).
    #[serde(flatten)]
    pub console: ConsoleConfig,
    /// Sender display name; the job title when empty.
    pub from_name: String,
    /// Sender address.
    pub from_email: String,
    /// Notified after every run.
    pub execution_notification_to: String,
    /// Also notified when the run reported warnings.
    pub warning_notification_to: String,
    /// Also notified when the run reported errors.
    pub error_notification_to: String,
    /// Subject suffix of a successful run.
    pub notification_subject: String,
    /// Subject suffix of a failed run.
    pub error_subject: String,
    /// Subject prefix of a successful run.
    pub notification_tags: String,
    /// Subject prefix of a failed run.
    pub error_tags: String,
    /// Added after the prefix when the run reported warnings.
    pub warning_tags: String,
    /// Send the buffer as HTML instead of plain text.
    pub html_format: bool,
}

impl Default for EmailConsoleConfig {
    fn default() -> Self {
        Self {
            console: ConsoleConfig::default(),
            from_name: String::new(),
            from_email: "no-reply@localhost".to_string(),
            execution_notification_to: String::new(),
            warning_notification_to: String::new(),
            error_notification_to: String::new(),
            notification_subject: "Successfully completed".to_string(),
            error_subject: "Errors found".to_string(),
            notification_tags: "[OK]".to_string(),
            error_tags: "[KO]".to_string(),
            warning_tags: "[WARNING]".to_string(),
            html_format: false,
        }
    }
}

impl EmailConsoleConfig {
    /// Creates the default configuration for the named job.
    #[must_use]
    pub fn new(job_title: impl Into<String>) -> Self {
        Self {
            console: ConsoleConfig::new(job_title),
            ..Self::default()
        }
    }

    /// Job title.
    #[must_use]
    pub fn job_title(&self) -> &str {
        &self.console.job_title
    }

    /// Sets the sender.
    #[must_use]
    pub fn from(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.from_name = name.into();
        self.from_email = email.into();
        self
    }

    /// Sets the recipients of every run.
    #[must_use]
    pub fn execution_to(mut self, csv: impl Into<String>) -> Self {
        self.execution_notification_to = csv.into();
        self
    }

    /// Sets the recipients added on warnings.
    #[must_use]
    pub fn warning_to(mut self, csv: impl Into<String>) -> Self {
        self.warning_notification_to = csv.into();
        self
    }

    /// Sets the recipients added on errors.
    #[must_use]
    pub fn error_to(mut self, csv: impl Into<String>) -> Self {
        self.error_notification_to = csv.into();
        self
    }

    /// Sends HTML instead of plain text.
    #[must_use]
    pub const fn html(mut self, html_format: bool) -> Self {
        self.html_format = html_format;
        self
    }

    /// Sets the console init handler.
    #[must_use]
    pub fn on_init<F>(mut self, handler: F) -> Self
    where
        F: Fn(&LifecycleArgs) -> HandlerResult + Send + Sync + 'static,
    {
        self.console = self.console.on_init(handler);
        self
    }

    /// Sender: the from name, or the job title when it is empty.
    #[must_use]
    pub fn sender(&self) -> EmailAddress {
        let name = if self.from_name.is_empty() {
            self.job_title()
        } else {
            &self.from_name
        };
        format_address(name, &self.from_email)
    }

    /// Builds the notification subject.
    ///
    /// ```text
    /// [KO][WARNING][URGENT] Nightly Job - Errors found
    ///  │    │        │       │             └ error or notification subject
    ///  │    │        │       └ job title
    ///  │    │        └ caller tags, upper-cased
    ///  │    └ warning tags
    ///  └ error or notification tags
    /// ```
    ///
    /// Leading and trailing spaces and dashes are trimmed.
    #[must_use]
    pub fn subject(&self, has_errors: bool, has_warnings: bool, subject_tags: &[&str]) -> String {
        let (tags, suffix) = if has_errors {
            (&self.error_tags, &self.error_subject)
        } else {
            (&self.notification_tags, &self.notification_subject)
        };

        let mut subject = tags.clone();
        if has_warnings {
            subject.push_str(&self.warning_tags);
        }
        for tag in subject_tags.iter().filter(|t| !t.is_empty()) {
            subject.push('[');
            subject.push_str(&tag.to_uppercase());
            subject.push(']');
        }
        if !self.job_title().is_empty() {
            subject.push(' ');
            subject.push_str(self.job_title());
        }
        if !suffix.is_empty() {
            subject.push_str(" - ");
            subject.push_str(suffix);
        }

        subject.trim_matches([' ', '-']).to_string()
    }
}

/// Recipient lists found in the settings chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationRecipients {
    /// `ExecutionNotificationTo`.
    pub execution: String,
    /// `WarningNotificationTo`.
    pub warning: String,
    /// `ErrorNotificationTo`.
    pub error: String,
}

impl NotificationRecipients {
    /// Resolves the three lists together from the first source that has any.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        let mut values = settings
            .get_group(&[
                EXECUTION_NOTIFICATION_TO,
                WARNING_NOTIFICATION_TO,
                ERROR_NOTIFICATION_TO,
            ])
            .into_iter();
        Self {
            execution: values.next().unwrap_or_default(),
            warning: values.next().unwrap_or_default(),
            error: values.next().unwrap_or_default(),
        }
    }
}

/// A [`StandardConsole`] that can mail its buffer as a job report.
///
/// Recipients come from the settings chain (resolved once at
/// construction) followed by the configuration.
///
/// ```ignore
/// let mut console = EmailConsole::sendgrid(
///     UsageScenario::ConsoleApp,
///     Some(EmailConsoleConfig::new("Nightly Job").execution_to("ops@example.com")),
///     ConsoleOptions::default(),
/// )?;
///
/// console.try_to("Import customers");
/// console.try_ok();
///
/// let sent = console.send_buffer_by_email(false, false, &[], None);
/// ```
#[derive(Debug)]
pub struct EmailConsole {
    inner: StandardConsole,
    config: Option<EmailConsoleConfig>,
    defaults: NotificationRecipients,
    mailer: Mailer,
}

impl EmailConsole {
    /// Creates a console with the default configuration.
    #[must_use]
    pub fn new(usage_scenario: UsageScenario, mailer: Mailer) -> Self {
        Self::with_config(
            usage_scenario,
            Some(EmailConsoleConfig::default()),
            ConsoleOptions::default(),
            mailer,
        )
    }

    /// Creates a console with an optional configuration.
    ///
    /// Without a configuration the console still writes, but
    /// [`EmailConsole::send_buffer_by_email`] reports the missing
    /// configuration and returns false.
    #[must_use]
    pub fn with_config(
        usage_scenario: UsageScenario,
        config: Option<EmailConsoleConfig>,
        options: ConsoleOptions,
        mailer: Mailer,
    ) -> Self {
        let console_config = config
            .as_ref()
            .map(|c| c.console.clone())
            .unwrap_or_default();
        let defaults = NotificationRecipients::from_settings(mailer.settings());

        Self {
            inner: StandardConsole::with_config(usage_scenario, console_config, options),
            config,
            defaults,
            mailer,
        }
    }

    /// Creates a console mailing through SendGrid with the standard
    /// settings chain (environment, then `appsettings.json`).
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be loaded or the
    /// transport cannot be started.
    pub fn sendgrid(
        usage_scenario: UsageScenario,
        config: Option<EmailConsoleConfig>,
        options: ConsoleOptions,
    ) -> Result<Self> {
        let settings = Settings::standard()?;
        let transport = SendGridClient::from_settings(&settings)?;
        Ok(Self::with_config(
            usage_scenario,
            config,
            options,
            Mailer::new(transport, settings),
        ))
    }

    /// Replaces the output sink.
    #[must_use]
    pub fn with_sink(self, sink: impl Write + Send + 'static) -> Self {
        Self {
            inner: self.inner.with_sink(sink),
            ..self
        }
    }

    /// Mail configuration, if any.
    #[must_use]
    pub const fn config(&self) -> Option<&EmailConsoleConfig> {
        self.config.as_ref()
    }

    /// Recipients found in the settings at construction.
    #[must_use]
    pub const fn default_recipients(&self) -> &NotificationRecipients {
        &self.defaults
    }

    /// The mailer used for sending.
    #[must_use]
    pub const fn mailer(&self) -> &Mailer {
        &self.mailer
    }

    /// Usage scenario fixed at construction.
    #[must_use]
    pub const fn usage_scenario(&self) -> UsageScenario {
        self.inner.usage_scenario()
    }

    /// Event channels for subscribing.
    pub const fn events_mut(&mut self) -> &mut ConsoleEvents {
        self.inner.events_mut()
    }

    /// Announces a step.
    pub fn try_to(&mut self, action: &str) -> String {
        self.inner.try_to(action)
    }

    /// Closes the current step as successful.
    pub fn try_ok(&mut self) -> String {
        self.inner.try_ok()
    }

    /// Closes the current step as failed.
    pub fn try_ko(&mut self, reason: &str) -> String {
        self.inner.try_ko(reason)
    }

    /// Disposes the underlying console.
    pub fn dispose(&mut self) {
        self.inner.dispose();
    }

    /// Mails the whole buffer to the notification recipients.
    ///
    /// Error recipients are added when `has_errors`, warning recipients
    /// when `has_warnings`. The recipient preview, the subject and the
    /// optional `body_first_line` are written before the buffer is read,
    /// so they are part of the mail. Short-lived scenarios wait for the
    /// provider (see [`UsageScenario::must_wait_for_async`]).
    ///
    /// Returns true if the message was sent (or handed off without
    /// waiting). Every failure is written to the console.
    pub fn send_buffer_by_email(
        &mut self,
        has_errors: bool,
        has_warnings: bool,
        subject_tags: &[&str],
        body_first_line: Option<&str>,
    ) -> bool {
        let separator = "-".repeat(SEPARATOR_WIDTH);
        self.print_line(&separator);

        self.try_to("SendBufferByEmail - Check config");
        let Some(config) = self.config.clone() else {
            self.try_ko("Missing configuration! (EmailConsoleConfig)");
            return false;
        };
        self.try_ok();

        let recipients = self.recipients(&config, has_errors, has_warnings);

        self.try_to("SendBufferByEmail - Load recipients");
        let recipients = match recipients {
            Ok(recipients) if !recipients.is_empty() => recipients,
            Ok(_) => {
                tracing::warn!(job = config.job_title(), "No notification recipients");
                self.try_ko("No recipients found!");
                return false;
            }
            Err(e) => {
                tracing::error!(job = config.job_title(), error = %e, "Invalid notification recipients");
                self.try_ko(&e.to_string());
                return false;
            }
        };
        self.try_ok();

        self.print_line("SendBufferByEmail - Email notification preview:");
        let from = config.sender();
        self.print_line(&format!("  FROM: {}", dump_address(&from)));
        self.print_line(&format!("  TO: {}", dump_address_list(&recipients)));

        let subject = config.subject(has_errors, has_warnings, subject_tags);
        self.print_line(&format!("  SUBJECT: {subject}"));

        let category = config.job_title().to_lowercase();
        self.print_line(&format!("  CATEGORY: {category}"));
        self.try_to("SendBufferByEmail - Sending");
        self.try_ok();
        self.print_line(&separator);
        if let Some(line) = body_first_line.filter(|l| !l.trim().is_empty()) {
            self.print_line(line);
            self.print_line("");
        }

        let mut draft = Draft::new(from, recipients).subject(subject);
        draft.body = self.buffer();
        draft.is_html = config.html_format;

        let mut message = match self.mailer.create(draft) {
            Ok(message) => message,
            Err(e) => {
                self.print_line(&format!("SEND ERRORS: {e}"));
                return false;
            }
        };
        if !category.is_empty() {
            message.add_category(category);
        }

        let must_wait = self.usage_scenario().must_wait_for_async();
        match self.mailer.send(&message, must_wait) {
            Ok(()) => {
                tracing::info!(
                    job = config.job_title(),
                    recipients = message.to.len(),
                    must_wait,
                    "Buffer sent by email"
                );
                true
            }
            Err(e) => {
                self.print_line(&format!("SEND ERRORS: {e}"));
                false
            }
        }
    }

    /// Execution recipients, then error and warning recipients as
    /// requested. Settings come before configuration; duplicates are kept.
    fn recipients(
        &self,
        config: &EmailConsoleConfig,
        has_errors: bool,
        has_warnings: bool,
    ) -> Result<Vec<EmailAddress>> {
        let mut lists = vec![&self.defaults.execution, &config.execution_notification_to];
        if has_errors {
            lists.extend([&self.defaults.error, &config.error_notification_to]);
        }
        if has_warnings {
            lists.extend([&self.defaults.warning, &config.warning_notification_to]);
        }

        let mut recipients = Vec::new();
        for csv in lists {
            recipients.extend(parse_address_list(csv)?);
        }
        Ok(recipients)
    }
}

impl Console for EmailConsole {
    fn write(&mut self, format: &str, args: &[&dyn Display]) -> jobmail_console::Result<String> {
        self.inner.write(format, args)
    }

    fn write_line(&mut self, format: &str, args: &[&dyn Display]) -> jobmail_console::Result<String> {
        self.inner.write_line(format, args)
    }

    fn print(&mut self, text: &str) -> String {
        self.inner.print(text)
    }

    fn print_line(&mut self, text: &str) -> String {
        self.inner.print_line(text)
    }

    fn buffer(&self) -> String {
        self.inner.buffer()
    }

    fn reset_buffer(&mut self) {
        self.inner.reset_buffer();
    }
}
