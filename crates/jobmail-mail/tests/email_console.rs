//! End-to-end behavior of the email console.

#![allow(clippy::unwrap_used)]

mod common;

use common::{FakeProvider, RecordingTransport};
use jobmail_console::{Console, ConsoleOptions, UsageScenario};
use jobmail_mail::settings::{
    ERROR_NOTIFICATION_TO, EXECUTION_NOTIFICATION_TO, LEGACY_SEND_TO_DEVELOPER, MapSource,
    WARNING_NOTIFICATION_TO,
};
use jobmail_mail::{
    EmailAddress, EmailConsole, EmailConsoleConfig, Mailer, SendGridClient, Settings, WaitPolicy,
};
use std::time::{Duration, Instant};

fn console(
    usage_scenario: UsageScenario,
    config: Option<EmailConsoleConfig>,
    settings: Settings,
) -> (EmailConsole, RecordingTransport) {
    let transport = RecordingTransport::new();
    let mailer = Mailer::new(transport.clone(), settings);
    let console = EmailConsole::with_config(
        usage_scenario,
        config,
        ConsoleOptions::new().without_sink(),
        mailer,
    );
    (console, transport)
}

fn nightly() -> EmailConsoleConfig {
    EmailConsoleConfig::new("Nightly Job").execution_to("ops@example.com")
}

#[test]
fn test_no_recipients() {
    let (mut console, transport) = console(
        UsageScenario::ConsoleApp,
        Some(EmailConsoleConfig::new("Nightly Job")),
        Settings::new(),
    );

    assert!(!console.send_buffer_by_email(false, false, &[], None));

    let buffer = console.buffer();
    assert!(buffer.contains("SendBufferByEmail - Load recipients ... KO! No recipients found!\n"));
    assert!(transport.sent().is_empty());
}

#[test]
fn test_missing_configuration() {
    let (mut console, transport) = console(UsageScenario::ConsoleApp, None, Settings::new());

    assert!(!console.send_buffer_by_email(true, false, &[], None));

    assert_eq!(
        console.buffer(),
        format!(
            "{}\nSendBufferByEmail - Check config ... KO! Missing configuration! (EmailConsoleConfig)\n",
            "-".repeat(80)
        )
    );
    assert!(transport.sent().is_empty());
}

#[test]
fn test_buffer_is_sent_with_preview() {
    let (mut console, transport) = console(UsageScenario::ConsoleApp, Some(nightly()), Settings::new());

    console.try_to("Import customers");
    console.try_ok();
    console.write_line("{0} rows imported", &[&128]).unwrap();

    assert!(console.send_buffer_by_email(false, false, &[], Some("Run #42")));

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    let (message, must_wait) = &sent[0];
    let separator = "-".repeat(80);

    assert!(*must_wait);
    assert_eq!(message.subject(), "[OK] Nightly Job - Successfully completed");
    assert_eq!(message.to, [EmailAddress::new("ops@example.com")]);
    assert_eq!(message.from, EmailAddress::with_name("Nightly Job", "no-reply@localhost"));
    assert_eq!(message.categories(), ["nightly job"]);
    assert_eq!(
        message.plain_text,
        format!(
            "Import customers ... OK\n\
             128 rows imported\n\
             {separator}\n\
             SendBufferByEmail - Check config ... OK\n\
             SendBufferByEmail - Load recipients ... OK\n\
             SendBufferByEmail - Email notification preview:\n  \
             FROM: \"Nightly Job\" <no-reply@localhost>\n  \
             TO: ops@example.com\n  \
             SUBJECT: [OK] Nightly Job - Successfully completed\n  \
             CATEGORY: nightly job\n\
             SendBufferByEmail - Sending ... OK\n\
             {separator}\n\
             Run #42\n\
             \n"
        )
    );
    assert!(message.html.contains("128 rows imported<br />"));
}

#[test]
fn test_errors_and_warnings_add_recipients_and_tags() {
    let config = nightly()
        .error_to("oncall@example.com")
        .warning_to("\"QA\" <qa@example.com>");
    let (mut console, transport) = console(UsageScenario::WebJob, Some(config), Settings::new());

    assert!(console.send_buffer_by_email(true, true, &["urgent"], None));

    let (message, _) = &transport.sent()[0];
    assert_eq!(message.subject(), "[KO][WARNING][URGENT] Nightly Job - Errors found");
    assert_eq!(
        message.to,
        [
            EmailAddress::new("ops@example.com"),
            EmailAddress::new("oncall@example.com"),
            EmailAddress::with_name("QA", "qa@example.com"),
        ]
    );
}

#[test]
fn test_settings_recipients_come_first() {
    let settings = Settings::new().with_source(
        MapSource::new()
            .with(EXECUTION_NOTIFICATION_TO, "team@example.com")
            .with(ERROR_NOTIFICATION_TO, "boss@example.com")
            .with(WARNING_NOTIFICATION_TO, "qa@example.com"),
    );
    let (mut console, transport) = console(UsageScenario::ConsoleApp, Some(nightly()), settings);

    assert!(console.send_buffer_by_email(true, false, &[], None));

    let (message, _) = &transport.sent()[0];
    assert_eq!(
        message.to,
        [
            EmailAddress::new("team@example.com"),
            EmailAddress::new("ops@example.com"),
            EmailAddress::new("boss@example.com"),
        ]
    );
}

#[test]
fn test_settings_alone_are_enough() {
    let settings = Settings::new()
        .with_source(MapSource::new().with(EXECUTION_NOTIFICATION_TO, "team@example.com"));
    let (mut console, transport) = console(
        UsageScenario::ConsoleApp,
        Some(EmailConsoleConfig::new("Nightly Job")),
        settings,
    );

    assert!(console.send_buffer_by_email(false, false, &[], None));
    assert_eq!(transport.sent()[0].0.to, [EmailAddress::new("team@example.com")]);
}

#[test]
fn test_developer_redirect() {
    let settings = Settings::new()
        .with_source(MapSource::new().with(LEGACY_SEND_TO_DEVELOPER, "dev@example.com"));
    let (mut console, transport) = console(UsageScenario::ConsoleApp, Some(nightly()), settings);

    assert!(console.send_buffer_by_email(false, false, &[], None));

    let (message, _) = &transport.sent()[0];
    assert_eq!(message.to, [EmailAddress::new("dev@example.com")]);
    // The preview still shows the real recipients.
    assert!(message.plain_text.contains("  TO: ops@example.com\n"));
}

#[test]
fn test_web_scenarios_do_not_wait() {
    for scenario in [UsageScenario::WebApp, UsageScenario::WebService, UsageScenario::UiApp] {
        let (mut console, transport) = console(scenario, Some(nightly()), Settings::new());
        assert!(console.send_buffer_by_email(false, false, &[], None));
        assert!(!transport.sent()[0].1, "{scenario} should not wait");
    }
}

#[test]
fn test_transport_failure_is_written() {
    let transport = RecordingTransport::rejecting(401, "unauthorized");
    let mailer = Mailer::new(transport.clone(), Settings::new());
    let mut console = EmailConsole::with_config(
        UsageScenario::ConsoleApp,
        Some(nightly()),
        ConsoleOptions::new().without_sink(),
        mailer,
    );

    assert!(!console.send_buffer_by_email(false, false, &[], None));
    assert!(
        console
            .buffer()
            .ends_with("SEND ERRORS: Provider rejected the message with status 401: unauthorized\n")
    );
    assert_eq!(transport.sent().len(), 1);
}

#[test]
fn test_malformed_recipients_are_reported() {
    let (mut console, transport) = console(
        UsageScenario::ConsoleApp,
        Some(nightly().error_to("oncall at example.com")),
        Settings::new(),
    );

    assert!(!console.send_buffer_by_email(true, false, &[], None));
    assert!(console.buffer().contains("SendBufferByEmail - Load recipients ... KO! Invalid email address"));
    assert!(transport.sent().is_empty());
}

#[test]
fn test_html_format() {
    let (mut console, transport) = console(
        UsageScenario::ConsoleApp,
        Some(nightly().html(true)),
        Settings::new(),
    );
    console.print_line("<b>done</b>");

    assert!(console.send_buffer_by_email(false, false, &[], None));

    let (message, _) = &transport.sent()[0];
    assert!(message.html.starts_with("<b>done</b>\n"));
    assert!(message.plain_text.starts_with("done\n"));
}

#[test]
fn test_console_app_waits_for_the_provider() {
    let provider = FakeProvider::start("202 Accepted", "", Duration::from_millis(300));
    let transport = SendGridClient::new("SG.test-key")
        .unwrap()
        .with_endpoint(provider.endpoint())
        .with_wait_policy(WaitPolicy::new(100, Duration::from_millis(50)));
    let mut console = EmailConsole::with_config(
        UsageScenario::ConsoleApp,
        Some(nightly()),
        ConsoleOptions::new().without_sink(),
        Mailer::new(transport, Settings::new()),
    );

    let started = Instant::now();
    assert!(console.send_buffer_by_email(false, false, &[], None));
    assert!(started.elapsed() >= Duration::from_millis(300));

    let request = provider.request();
    assert_eq!(request.json()["categories"][0], "nightly job");
}
