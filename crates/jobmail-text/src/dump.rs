//! Error dumps for notification bodies.

use std::error::Error as StdError;
use std::fmt::Write;

/// Section labels for the error and its first two sources.
const LEVELS: [&str; 3] = ["ERROR", "INNER ERROR", "INNER-INNER ERROR"];

/// Renders an error and up to two levels of its `source()` chain.
///
/// Each level gets a `MESSAGE` section (the `Display` output) and a
/// `DETAIL` section (the `Debug` output), framed by `------` headings so the
/// dump stays readable inside a plain-text email.
#[must_use]
pub fn dump_error(error: &(dyn StdError + 'static)) -> String {
    let mut out = String::new();
    let mut current = Some(error);

    for label in LEVELS {
        let Some(err) = current else {
            break;
        };

        out.push('\n');
        let _ = writeln!(out, "------ {label} MESSAGE ------");
        let _ = writeln!(out, "{err}");
        let _ = writeln!(out, "------ {label} DETAIL ------");
        let _ = writeln!(out, "{err:?}");
        out.push('\n');

        current = err.source();
    }

    out
}
