//! Console writer that mirrors output into a buffer.

use crate::buffer::SharedBuffer;
use crate::error::Result;
use crate::scenario::UsageScenario;
use crate::{Console, NEW_LINE};
use jobmail_text::format_positional;
use std::fmt::{self, Display};
use std::io::{self, Write};

/// Construction options for a console.
#[derive(Debug, Clone, Default)]
pub struct ConsoleOptions {
    /// Skip writing to the output sink (buffer only).
    pub disable_sink: bool,
    /// Skip buffering (sink only).
    pub disable_buffer: bool,
    /// Buffer to append to instead of a fresh one.
    pub buffer: Option<SharedBuffer>,
    /// Prefix every line with a local timestamp.
    pub timestamps: bool,
}

impl ConsoleOptions {
    /// Creates the default options: sink and buffer both enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables writing to the output sink.
    #[must_use]
    pub const fn without_sink(mut self) -> Self {
        self.disable_sink = true;
        self
    }

    /// Disables buffering.
    #[must_use]
    pub const fn without_buffer(mut self) -> Self {
        self.disable_buffer = true;
        self
    }

    /// Uses an existing buffer.
    #[must_use]
    pub fn with_buffer(mut self, buffer: SharedBuffer) -> Self {
        self.buffer = Some(buffer);
        self
    }

    /// Enables line timestamps.
    #[must_use]
    pub const fn with_timestamps(mut self) -> Self {
        self.timestamps = true;
        self
    }
}

/// Writes to an output sink (stdout by default) and to a buffer.
pub struct BufferedConsole {
    usage_scenario: UsageScenario,
    sink: Box<dyn Write + Send>,
    buffer: SharedBuffer,
    sink_disabled: bool,
    buffer_disabled: bool,
    timestamps: bool,
}

impl BufferedConsole {
    /// Creates a console writing to stdout and to a fresh buffer.
    #[must_use]
    pub fn new(usage_scenario: UsageScenario) -> Self {
        Self::with_options(usage_scenario, ConsoleOptions::default())
    }

    /// Creates a console with explicit options.
    #[must_use]
    pub fn with_options(usage_scenario: UsageScenario, options: ConsoleOptions) -> Self {
        Self {
            usage_scenario,
            sink: Box::new(io::stdout()),
            buffer: options.buffer.unwrap_or_default(),
            sink_disabled: options.disable_sink,
            buffer_disabled: options.disable_buffer,
            timestamps: options.timestamps,
        }
    }

    /// Replaces the output sink.
    #[must_use]
    pub fn with_sink(mut self, sink: impl Write + Send + 'static) -> Self {
        self.set_sink(sink);
        self
    }

    /// Replaces the output sink in place.
    pub fn set_sink(&mut self, sink: impl Write + Send + 'static) {
        self.sink = Box::new(sink);
    }

    /// Returns the usage scenario fixed at construction.
    #[must_use]
    pub const fn usage_scenario(&self) -> UsageScenario {
        self.usage_scenario
    }

    /// Returns true if buffering is disabled.
    #[must_use]
    pub const fn is_buffer_disabled(&self) -> bool {
        self.buffer_disabled
    }

    /// Returns true if sink output is disabled.
    #[must_use]
    pub const fn is_sink_disabled(&self) -> bool {
        self.sink_disabled
    }

    /// Returns a handle to the underlying buffer.
    #[must_use]
    pub fn buffer_handle(&self) -> SharedBuffer {
        self.buffer.clone()
    }

    /// Flushes the output sink.
    pub fn flush(&mut self) {
        if let Err(e) = self.sink.flush() {
            tracing::warn!(?e, "Failed to flush console sink");
        }
    }

    /// Renders the final text for one write.
    fn apply_format(&self, is_line: bool, format: &str, args: &[&dyn Display]) -> Result<String> {
        let value = format_positional(format, args)?;
        Ok(self.decorate(is_line, value))
    }

    fn decorate(&self, is_line: bool, value: String) -> String {
        if self.timestamps && is_line {
            let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
            format!("[{now}] {value}")
        } else {
            value
        }
    }

    /// Sends the rendered text to the sink and the buffer.
    fn emit(&mut self, value: &str, is_line: bool) {
        let terminator = if is_line { NEW_LINE } else { "" };

        if !self.sink_disabled {
            let written = self
                .sink
                .write_all(value.as_bytes())
                .and_then(|()| self.sink.write_all(terminator.as_bytes()))
                .and_then(|()| self.sink.flush());
            if let Err(e) = written {
                tracing::warn!(?e, "Failed to write to console sink");
            }
        }

        if !self.buffer_disabled {
            self.buffer.append(value);
            self.buffer.append(terminator);
        }
    }
}

impl Console for BufferedConsole {
    fn write(&mut self, format: &str, args: &[&dyn Display]) -> Result<String> {
        let value = self.apply_format(false, format, args)?;
        self.emit(&value, false);
        Ok(value)
    }

    fn write_line(&mut self, format: &str, args: &[&dyn Display]) -> Result<String> {
        let value = self.apply_format(true, format, args)?;
        self.emit(&value, true);
        Ok(value)
    }

    fn print(&mut self, text: &str) -> String {
        let value = self.decorate(false, text.to_string());
        self.emit(&value, false);
        value
    }

    fn print_line(&mut self, text: &str) -> String {
        let value = self.decorate(true, text.to_string());
        self.emit(&value, true);
        value
    }

    fn buffer(&self) -> String {
        if self.buffer_disabled {
            return String::new();
        }
        self.buffer.contents()
    }

    fn reset_buffer(&mut self) {
        if !self.buffer_disabled {
            self.buffer.clear();
        }
    }
}

impl fmt::Debug for BufferedConsole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedConsole")
            .field("usage_scenario", &self.usage_scenario)
            .field("buffer_len", &self.buffer.len())
            .field("sink_disabled", &self.sink_disabled)
            .field("buffer_disabled", &self.buffer_disabled)
            .field("timestamps", &self.timestamps)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::{Arc, Mutex};

    /// Sink that records everything written to it.
    #[derive(Clone, Default)]
    struct CaptureSink(Arc<Mutex<Vec<u8>>>);

    impl CaptureSink {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for CaptureSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn quiet() -> BufferedConsole {
        BufferedConsole::with_options(UsageScenario::ConsoleApp, ConsoleOptions::new().without_sink())
    }

    #[test]
    fn test_write_returns_formatted_text() {
        let mut console = quiet();
        let value = console.write("{0}-{1}", &[&"a", &1]).unwrap();
        assert_eq!(value, "a-1");
        assert_eq!(console.buffer(), "a-1");
    }

    #[test]
    fn test_write_line_appends_new_line_to_outputs_only() {
        let sink = CaptureSink::default();
        let mut console =
            BufferedConsole::new(UsageScenario::WebApp).with_sink(sink.clone());

        let value = console.write_line("done in {0}s", &[&3]).unwrap();

        assert_eq!(value, "done in 3s");
        assert_eq!(console.buffer(), "done in 3s\n");
        assert_eq!(sink.text(), "done in 3s\n");
    }

    #[test]
    fn test_format_error_leaves_outputs_untouched() {
        let sink = CaptureSink::default();
        let mut console = BufferedConsole::new(UsageScenario::WebApp).with_sink(sink.clone());

        assert!(console.write_line("{1}", &[&"only one"]).is_err());
        assert_eq!(console.buffer(), "");
        assert_eq!(sink.text(), "");
    }

    #[test]
    fn test_print_does_not_interpret_braces() {
        let mut console = quiet();
        console.print_line("{not a template}");
        assert_eq!(console.buffer(), "{not a template}\n");
    }

    #[test]
    fn test_disabled_sink_still_buffers() {
        let sink = CaptureSink::default();
        let mut console = BufferedConsole::with_options(
            UsageScenario::ConsoleApp,
            ConsoleOptions::new().without_sink(),
        )
        .with_sink(sink.clone());

        console.print("x");
        assert_eq!(sink.text(), "");
        assert_eq!(console.buffer(), "x");
        assert!(console.is_sink_disabled());
    }

    #[test]
    fn test_disabled_buffer() {
        let sink = CaptureSink::default();
        let mut console = BufferedConsole::with_options(
            UsageScenario::ConsoleApp,
            ConsoleOptions::new().without_buffer(),
        )
        .with_sink(sink.clone());

        console.print_line("visible");
        console.reset_buffer();

        assert_eq!(console.buffer(), "");
        assert_eq!(sink.text(), "visible\n");
        assert!(console.is_buffer_disabled());
    }

    #[test]
    fn test_reset_buffer() {
        let mut console = quiet();
        console.print_line("first run");
        console.reset_buffer();
        assert_eq!(console.buffer(), "");

        console.print("second");
        assert_eq!(console.buffer(), "second");
    }

    #[test]
    fn test_custom_buffer_is_shared() {
        let shared = SharedBuffer::from("preamble\n");
        let mut first = BufferedConsole::with_options(
            UsageScenario::ConsoleApp,
            ConsoleOptions::new().without_sink().with_buffer(shared.clone()),
        );
        let mut second = BufferedConsole::with_options(
            UsageScenario::ConsoleApp,
            ConsoleOptions::new().without_sink().with_buffer(shared.clone()),
        );

        first.print_line("one");
        second.print_line("two");

        assert_eq!(shared.contents(), "preamble\none\ntwo\n");
        assert_eq!(first.buffer(), second.buffer());
    }

    #[test]
    fn test_timestamps_prefix_lines_only() {
        let mut console = BufferedConsole::with_options(
            UsageScenario::ConsoleApp,
            ConsoleOptions::new().without_sink().with_timestamps(),
        );

        let line = console.print_line("stamped");
        let inline = console.print("plain");

        assert!(line.starts_with('['));
        assert!(line.ends_with("] stamped"));
        assert_eq!(inline, "plain");
    }

    proptest! {
        #[test]
        fn prop_write_line_equals_write_plus_new_line(text in "[^{}]*") {
            let mut lines = quiet();
            let mut plain = quiet();

            lines.write_line(&text, &[]).unwrap();
            plain.write(&text, &[]).unwrap();

            prop_assert_eq!(lines.buffer(), format!("{}{NEW_LINE}", plain.buffer()));
        }

        #[test]
        fn prop_buffer_is_concatenation_of_writes(parts in proptest::collection::vec("[^{}]*", 0..16)) {
            let mut console = quiet();
            let mut expected = String::new();

            for (i, part) in parts.iter().enumerate() {
                if i % 2 == 0 {
                    expected.push_str(&console.write(part, &[]).unwrap());
                } else {
                    expected.push_str(&console.write_line(part, &[]).unwrap());
                    expected.push_str(NEW_LINE);
                }
            }

            prop_assert_eq!(console.buffer(), expected);
        }

        #[test]
        fn prop_reset_always_empties(parts in proptest::collection::vec(".*", 0..8)) {
            let mut console = quiet();
            for part in &parts {
                console.print_line(part);
            }
            console.reset_buffer();
            prop_assert_eq!(console.buffer(), "");
        }

        #[test]
        fn prop_disabled_buffer_is_always_empty(parts in proptest::collection::vec(".*", 0..8)) {
            let mut console = BufferedConsole::with_options(
                UsageScenario::WebApp,
                ConsoleOptions::new().without_sink().without_buffer(),
            );
            for part in &parts {
                console.print(part);
            }
            prop_assert_eq!(console.buffer(), "");
        }
    }
}
