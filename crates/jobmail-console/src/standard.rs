//! Console with progress markers for batch jobs.

use crate::buffer::SharedBuffer;
use crate::buffered::ConsoleOptions;
use crate::config::ConsoleConfig;
use crate::error::Result;
use crate::evented::{ConsoleEvents, EventedConsole};
use crate::scenario::UsageScenario;
use crate::Console;
use std::fmt::Display;
use std::io::Write;

/// An [`EventedConsole`] bound to a job, with `try_to`/`try_ok`/`try_ko`
/// progress markers.
///
/// ```text
/// Load recipients ... OK
/// Send report ... KO! No recipients found!
/// ```
#[derive(Debug)]
pub struct StandardConsole {
    inner: EventedConsole,
}

impl StandardConsole {
    /// Creates a console with the default configuration.
    #[must_use]
    pub fn new(usage_scenario: UsageScenario) -> Self {
        Self::with_config(usage_scenario, ConsoleConfig::default(), ConsoleOptions::default())
    }

    /// Creates a console for a configured job.
    #[must_use]
    pub fn with_config(
        usage_scenario: UsageScenario,
        config: ConsoleConfig,
        options: ConsoleOptions,
    ) -> Self {
        Self {
            inner: EventedConsole::with_config(usage_scenario, Some(config), options),
        }
    }

    /// Replaces the output sink.
    #[must_use]
    pub fn with_sink(self, sink: impl Write + Send + 'static) -> Self {
        Self {
            inner: self.inner.with_sink(sink),
        }
    }

    /// Returns the configured job title (empty if none).
    #[must_use]
    pub fn job_title(&self) -> &str {
        self.inner.config().map_or("", |c| c.job_title.as_str())
    }

    /// Returns the usage scenario fixed at construction.
    #[must_use]
    pub const fn usage_scenario(&self) -> UsageScenario {
        self.inner.usage_scenario()
    }

    /// Returns the event channels.
    #[must_use]
    pub const fn events(&self) -> &ConsoleEvents {
        self.inner.events()
    }

    /// Returns the event channels for subscribing.
    pub const fn events_mut(&mut self) -> &mut ConsoleEvents {
        self.inner.events_mut()
    }

    /// Returns a handle to the underlying buffer.
    #[must_use]
    pub fn buffer_handle(&self) -> SharedBuffer {
        self.inner.buffer_handle()
    }

    /// Disposes the underlying console.
    pub fn dispose(&mut self) {
        self.inner.dispose();
    }

    /// Announces a step without ending the line.
    pub fn try_to(&mut self, action: &str) -> String {
        self.inner.print(&format!("{action} ... "))
    }

    /// Closes the current step as successful.
    pub fn try_ok(&mut self) -> String {
        self.inner.print_line("OK")
    }

    /// Closes the current step as failed.
    pub fn try_ko(&mut self, reason: &str) -> String {
        self.inner.print_line(&format!("KO! {reason}"))
    }
}

impl Console for StandardConsole {
    fn write(&mut self, format: &str, args: &[&dyn Display]) -> Result<String> {
        self.inner.write(format, args)
    }

    fn write_line(&mut self, format: &str, args: &[&dyn Display]) -> Result<String> {
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
