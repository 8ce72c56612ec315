//! Console writer that raises lifecycle and write events.

use crate::buffer::SharedBuffer;
use crate::buffered::{BufferedConsole, ConsoleOptions};
use crate::config::ConsoleConfig;
use crate::error::Result;
use crate::event::Event;
use crate::scenario::UsageScenario;
use crate::Console;
use std::fmt::Display;
use std::io::Write;

/// Arguments of the `init` and `disposing` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleArgs {
    /// Scenario of the console raising the event.
    pub usage_scenario: UsageScenario,
}

/// Arguments of the `writing` event, raised before anything is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritingArgs {
    /// Raw template (or literal text for `print*`).
    pub format: String,
    /// Rendered positional arguments.
    pub args: Vec<String>,
    /// True for the `*_line` methods.
    pub is_line: bool,
}

impl WritingArgs {
    fn new(format: &str, args: &[&dyn Display], is_line: bool) -> Self {
        Self {
            format: format.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
            is_line,
        }
    }
}

/// Arguments of the `written` event, raised after the text was emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArgs {
    /// Final text, without line terminator.
    pub message: String,
    /// True for the `*_line` methods.
    pub is_line: bool,
}

/// The four event channels of an [`EventedConsole`].
#[derive(Debug)]
pub struct ConsoleEvents {
    /// Raised once at the end of construction.
    pub init: Event<LifecycleArgs>,
    /// Raised once when the console is disposed or dropped.
    pub disposing: Event<LifecycleArgs>,
    /// Raised before every write.
    pub writing: Event<WritingArgs>,
    /// Raised after every successful write.
    pub written: Event<WrittenArgs>,
}

impl Default for ConsoleEvents {
    fn default() -> Self {
        Self {
            init: Event::new("init"),
            disposing: Event::new("disposing"),
            writing: Event::new("writing"),
            written: Event::new("written"),
        }
    }
}

/// A [`BufferedConsole`] that notifies subscribers about its lifecycle and writes.
///
/// Subscriber failures never reach the caller. Dropping the console
/// disposes it; `disposing` fires at most once.
#[derive(Debug)]
pub struct EventedConsole {
    inner: BufferedConsole,
    config: Option<ConsoleConfig>,
    events: ConsoleEvents,
    disposed: bool,
}

impl EventedConsole {
    /// Creates a console writing to stdout and a fresh buffer.
    #[must_use]
    pub fn new(usage_scenario: UsageScenario) -> Self {
        Self::with_config(usage_scenario, None, ConsoleOptions::default())
    }

    /// Creates a console with an optional configuration.
    ///
    /// The configuration's init handler, if any, is subscribed before the
    /// `init` event fires.
    #[must_use]
    pub fn with_config(
        usage_scenario: UsageScenario,
        config: Option<ConsoleConfig>,
        options: ConsoleOptions,
    ) -> Self {
        Self::from_parts(BufferedConsole::with_options(usage_scenario, options), config)
    }

    /// Wraps an existing buffered console.
    #[must_use]
    pub fn from_parts(inner: BufferedConsole, config: Option<ConsoleConfig>) -> Self {
        let mut events = ConsoleEvents::default();
        if let Some(handler) = config.as_ref().and_then(|c| c.on_init.clone()) {
            events.init.subscribe_shared(handler);
        }

        let console = Self {
            inner,
            config,
            events,
            disposed: false,
        };
        console.events.init.raise(&console.lifecycle_args());
        console
    }

    /// Replaces the output sink.
    #[must_use]
    pub fn with_sink(mut self, sink: impl Write + Send + 'static) -> Self {
        self.inner.set_sink(sink);
        self
    }

    /// Returns the configuration supplied at construction.
    #[must_use]
    pub const fn config(&self) -> Option<&ConsoleConfig> {
        self.config.as_ref()
    }

    /// Returns the event channels.
    #[must_use]
    pub const fn events(&self) -> &ConsoleEvents {
        &self.events
    }

    /// Returns the event channels for subscribing.
    pub const fn events_mut(&mut self) -> &mut ConsoleEvents {
        &mut self.events
    }

    /// Returns the usage scenario fixed at construction.
    #[must_use]
    pub const fn usage_scenario(&self) -> UsageScenario {
        self.inner.usage_scenario()
    }

    /// Returns a handle to the underlying buffer.
    #[must_use]
    pub fn buffer_handle(&self) -> SharedBuffer {
        self.inner.buffer_handle()
    }

    /// Returns true once [`EventedConsole::dispose`] has run.
    #[must_use]
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Raises `disposing` and flushes the sink. Later calls do nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        self.events.disposing.raise(&self.lifecycle_args());
        self.inner.flush();
    }

    const fn lifecycle_args(&self) -> LifecycleArgs {
        LifecycleArgs {
            usage_scenario: self.inner.usage_scenario(),
        }
    }
}

impl Console for EventedConsole {
    fn write(&mut self, format: &str, args: &[&dyn Display]) -> Result<String> {
        self.events.writing.raise(&WritingArgs::new(format, args, false));
        let value = self.inner.write(format, args)?;
        self.events.written.raise(&WrittenArgs {
            message: value.clone(),
            is_line: false,
        });
        Ok(value)
    }

    fn write_line(&mut self, format: &str, args: &[&dyn Display]) -> Result<String> {
        self.events.writing.raise(&WritingArgs::new(format, args, true));
        let value = self.inner.write_line(format, args)?;
        self.events.written.raise(&WrittenArgs {
            message: value.clone(),
            is_line: true,
        });
        Ok(value)
    }

    fn print(&mut self, text: &str) -> String {
        self.events.writing.raise(&WritingArgs::new(text, &[], false));
        let value = self.inner.print(text);
        self.events.written.raise(&WrittenArgs {
            message: value.clone(),
            is_line: false,
        });
        value
    }

    fn print_line(&mut self, text: &str) -> String {
        self.events.writing.raise(&WritingArgs::new(text, &[], true));
        let value = self.inner.print_line(text);
        self.events.written.raise(&WrittenArgs {
            message: value.clone(),
            is_line: true,
        });
        value
    }

    fn buffer(&self) -> String {
        self.inner.buffer()
    }

    fn reset_buffer(&mut self) {
        self.inner.reset_buffer();
    }
}

impl Drop for EventedConsole {
    fn drop(&mut self) {
        self.dispose();
    }
}
