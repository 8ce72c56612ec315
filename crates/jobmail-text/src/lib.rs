//! # jobmail-text
//!
//! String helpers shared by the jobmail crates.
//!
//! ## Features
//!
//! - **Positional formatting**: `{0}`-style composite formatting with
//!   alignment and `{{`/`}}` escapes
//! - **HTML conversion**: plain text to HTML, tag stripping, entity decoding
//! - **Error dumps**: multi-section rendering of an error and its sources
//!
//! ## Quick Start
//!
//! ```ignore
//! use jobmail_text::{format_positional, text_to_html};
//!
//! let line = format_positional("{0} rows imported in {1}s", &[&42, &1.5])?;
//! assert_eq!(line, "42 rows imported in 1.5s");
//!
//! assert_eq!(text_to_html("a\nb"), "a<br />b");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod dump;
mod error;
mod format;
mod html;

pub use dump::dump_error;
pub use error::{Error, Result};
pub use format::{MAX_ALIGNMENT, format_positional};
pub use html::{decode_html_entities, strip_html_tags, text_to_html};
