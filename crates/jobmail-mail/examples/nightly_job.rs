#![allow(clippy::uninlined_format_args)]
//! Example: mail a nightly job report through SendGrid
//!
//! The job writes its progress to an `EmailConsole`; at the end the whole
//! console buffer is mailed to the notification recipients.
//!
//! ## Setup
//!
//! Settings are read from `APPSETTING_*` environment variables first, then
//! from `appsettings.json` in the working directory:
//!
//! ```bash
//! export APPSETTING_SendGridApiKey="SG.xxxxxxxx"
//! export APPSETTING_ExecutionNotificationTo="ops@example.com"
//! export APPSETTING_ErrorNotificationTo='"On call" <oncall@example.com>'
//! # Optional: send everything to yourself while testing
//! export APPSETTING_SendGridSendAllEmailToDeveloper="me@example.com"
//! ```
//!
//! ## Running
//!
//! ```bash
//! RUST_LOG=jobmail_mail=debug cargo run --package jobmail-mail --example nightly_job
//! ```

use jobmail_console::{Console, ConsoleOptions, UsageScenario};
use jobmail_mail::{EmailConsole, EmailConsoleConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobmail_mail=info,jobmail_console=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting nightly job");

    let config = EmailConsoleConfig::new("Nightly Job").from("Batch Server", "batch@example.com");
    let mut console =
        EmailConsole::sendgrid(UsageScenario::ConsoleApp, Some(config), ConsoleOptions::default())?;

    let mut errors = false;
    let mut warnings = false;

    console.try_to("Export orders");
    console.try_ok();
    console.write_line("{0} orders exported", &[&312])?;

    console.try_to("Archive old invoices");
    match archive_invoices() {
        Ok(count) => {
            console.try_ok();
            console.write_line("{0} invoices archived", &[&count])?;
        }
        Err(e) => {
            errors = true;
            console.try_ko(&e.to_string());
            console.print_line(&jobmail_text::dump_error(&*e));
        }
    }

    console.try_to("Check disk space");
    console.try_ok();
    if free_disk_percent() < 15 {
        warnings = true;
        console.print_line("Disk space is running low");
    }

    let sent = console.send_buffer_by_email(errors, warnings, &["nightly"], Some("Automatic report"));
    info!(sent, "Nightly job finished");

    Ok(())
}

fn archive_invoices() -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
    let path = std::env::temp_dir().join("jobmail-invoices");
    let entries = std::fs::read_dir(&path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    Ok(entries.count())
}

const fn free_disk_percent() -> u8 {
    12
}
