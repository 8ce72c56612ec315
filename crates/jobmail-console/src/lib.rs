//! # jobmail-console
//!
//! A console writer for batch jobs and services that keeps a copy of
//! everything it prints, so the run can later be mailed or logged as a whole.
//!
//! The writers are layered by composition:
//!
//! ```text
//! ┌──────────────────┐    ┌──────────────────┐    ┌──────────────────┐
//! │ BufferedConsole  │ ←─ │  EventedConsole  │ ←─ │ StandardConsole  │
//! │ sink + buffer    │    │ Init / Disposing │    │ try_to / ok / ko │
//! │                  │    │ Writing/Written  │    │ job title        │
//! └──────────────────┘    └──────────────────┘    └──────────────────┘
//! ```
//!
//! Every layer implements [`Console`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use jobmail_console::{Console, StandardConsole, UsageScenario};
//!
//! let mut console = StandardConsole::new(UsageScenario::ConsoleApp);
//! console.events_mut().written.subscribe(|args| {
//!     tracing::debug!(message = %args.message, "written");
//!     Ok(())
//! });
//!
//! console.try_to("Import customers");
//! console.write_line("{0} rows imported", &[&128])?;
//! console.try_ok();
//!
//! let report = console.buffer();
//! ```
//!
//! ## Threading
//!
//! A console instance is meant to be driven from one call path. It is
//! `Send`, so it can move between threads, but concurrent use of the same
//! instance is the caller's responsibility.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod buffer;
mod buffered;
mod config;
mod error;
pub mod event;
mod evented;
mod scenario;
mod standard;

pub use buffer::SharedBuffer;
pub use buffered::{BufferedConsole, ConsoleOptions};
pub use config::ConsoleConfig;
pub use error::{Error, Result};
pub use event::{Event, EventHandler, HandlerResult, SubscriptionId};
pub use evented::{ConsoleEvents, EventedConsole, LifecycleArgs, WritingArgs, WrittenArgs};
pub use scenario::UsageScenario;
pub use standard::StandardConsole;

use std::fmt::Display;

/// Line terminator appended by the `*_line` methods.
pub const NEW_LINE: &str = "\n";

/// Write capabilities shared by every console layer.
pub trait Console {
    /// Formats `format` with positional `args` and writes it.
    ///
    /// Returns the formatted text so callers can reuse it.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is malformed or references a
    /// missing argument.
    fn write(&mut self, format: &str, args: &[&dyn Display]) -> Result<String>;

    /// Like [`Console::write`] but terminates the output with [`NEW_LINE`].
    ///
    /// The returned text does not include the line terminator.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is malformed or references a
    /// missing argument.
    fn write_line(&mut self, format: &str, args: &[&dyn Display]) -> Result<String>;

    /// Writes `text` verbatim, without template substitution.
    fn print(&mut self, text: &str) -> String;

    /// Writes `text` verbatim followed by [`NEW_LINE`].
    fn print_line(&mut self, text: &str) -> String;

    /// Returns everything buffered so far (empty when buffering is disabled).
    fn buffer(&self) -> String;

    /// Clears the buffer.
    fn reset_buffer(&mut self);
}
