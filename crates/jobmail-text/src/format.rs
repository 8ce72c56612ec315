//! Positional composite formatting.
//!
//! Templates reference arguments by index, the way log templates usually do:
//!
//! ```text
//! "{0} of {1} done"       -> "3 of 10 done"
//! "[{0,5}]"               -> "[   ab]"
//! "[{0,-5}]"              -> "[ab   ]"
//! "{{literal}}"           -> "{literal}"
//! ```

use crate::error::{Error, Result};
use std::fmt::{Display, Write};

/// Alignments must be narrower than this, in either direction.
pub const MAX_ALIGNMENT: usize = 1_000_000;

/// Substitutes `{index}` and `{index,alignment}` items with the matching argument.
///
/// A positive alignment right-aligns the argument in a field of that width,
/// a negative one left-aligns it. `{{` and `}}` produce literal braces.
///
/// # Errors
///
/// Returns an error for unterminated items, lone closing braces, indexes
/// without a matching argument, alignments of [`MAX_ALIGNMENT`] or more, and
/// `:format` specifiers.
pub fn format_positional(format: &str, args: &[&dyn Display]) -> Result<String> {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        match c {
            '{' => {
                if chars.next_if(|&(_, next)| next == '{').is_some() {
                    out.push('{');
                    continue;
                }

                let mut item = String::new();
                let mut closed = false;
                for (_, inner) in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    item.push(inner);
                }

                if !closed {
                    return Err(Error::UnterminatedItem(position));
                }
                render_item(&mut out, position, &item, args)?;
            }
            '}' => {
                if chars.next_if(|&(_, next)| next == '}').is_none() {
                    return Err(Error::UnescapedBrace(position));
                }
                out.push('}');
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

fn render_item(out: &mut String, position: usize, item: &str, args: &[&dyn Display]) -> Result<()> {
    if item.contains(':') {
        return Err(Error::UnsupportedSpecifier(item.to_string()));
    }

    let invalid = || Error::InvalidItem {
        position,
        item: item.to_string(),
    };

    let (index, alignment) = match item.split_once(',') {
        Some((index, alignment)) => (index, Some(alignment)),
        None => (item, None),
    };

    let index: usize = index.trim().parse().map_err(|_| invalid())?;
    let arg = args.get(index).ok_or(Error::IndexOutOfRange {
        index,
        count: args.len(),
    })?;

    match alignment {
        None => {
            let _ = write!(out, "{arg}");
        }
        Some(alignment) => {
            let width: i64 = alignment.trim().parse().map_err(|_| invalid())?;
            let pad = usize::try_from(width.unsigned_abs())
                .ok()
                .filter(|&pad| pad < MAX_ALIGNMENT)
                .ok_or(Error::AlignmentOutOfRange {
                    position,
                    alignment: width,
                })?;

            let rendered = arg.to_string();
            let fill = " ".repeat(pad.saturating_sub(rendered.chars().count()));
            if width < 0 {
                out.push_str(&rendered);
                out.push_str(&fill);
            } else {
                out.push_str(&fill);
                out.push_str(&rendered);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_no_items() {
        assert_eq!(format_positional("plain text", &[]).unwrap(), "plain text");
        assert_eq!(format_positional("", &[]).unwrap(), "");
    }

    #[test]
    fn test_positional_items() {
        let result = format_positional("{1} before {0}, {1} again", &[&"a", &2]).unwrap();
        assert_eq!(result, "2 before a, 2 again");
    }

    #[test]
    fn test_unused_arguments_are_ignored() {
        assert_eq!(format_positional("{0}", &[&1, &2, &3]).unwrap(), "1");
    }

    #[test]
    fn test_escaped_braces() {
        assert_eq!(format_positional("{{{0}}}", &[&"x"]).unwrap(), "{x}");
        assert_eq!(format_positional("{{}}", &[]).unwrap(), "{}");
    }

    #[test]
    fn test_alignment() {
        assert_eq!(format_positional("[{0,5}]", &[&"ab"]).unwrap(), "[   ab]");
        assert_eq!(format_positional("[{0,-5}]", &[&"ab"]).unwrap(), "[ab   ]");
        assert_eq!(format_positional("[{0,1}]", &[&"abc"]).unwrap(), "[abc]");
    }

    #[test]
    fn test_alignment_edges() {
        assert_eq!(format_positional("[{0,0}]", &[&"ab"]).unwrap(), "[ab]");
        assert_eq!(format_positional("[{0,-0}]", &[&"ab"]).unwrap(), "[ab]");
        assert_eq!(format_positional("[{0,-2}]", &[&"abcd"]).unwrap(), "[abcd]");
        assert_eq!(format_positional("[{0, 3 }]", &[&"è"]).unwrap(), "[  è]");

        let wide = format_positional("{0,70000}", &[&"x"]).unwrap();
        assert_eq!(wide.len(), 70000);
        assert!(wide.ends_with(" x"));

        let wide = format_positional("{0,-999999}", &[&"x"]).unwrap();
        assert_eq!(wide.len(), 999_999);
        assert!(wide.starts_with("x "));
    }

    #[test]
    fn test_alignment_out_of_range() {
        assert_eq!(
            format_positional("a {0,1000000}", &[&"x"]).unwrap_err(),
            Error::AlignmentOutOfRange {
                position: 2,
                alignment: 1_000_000
            }
        );
        assert!(matches!(
            format_positional("{0,-9223372036854775808}", &[&"x"]),
            Err(Error::AlignmentOutOfRange { .. })
        ));
        assert!(matches!(
            format_positional("{0,99999999999999999999}", &[&"x"]),
            Err(Error::InvalidItem { .. })
        ));
    }

    #[test]
    fn test_index_out_of_range() {
        let err = format_positional("{0} {1}", &[&"only"]).unwrap_err();
        assert_eq!(err, Error::IndexOutOfRange { index: 1, count: 1 });
    }

    #[test]
    fn test_unterminated_item() {
        assert_eq!(
            format_positional("abc {0", &[&1]).unwrap_err(),
            Error::UnterminatedItem(4)
        );
    }

    #[test]
    fn test_lone_closing_brace() {
        assert_eq!(
            format_positional("a } b", &[]).unwrap_err(),
            Error::UnescapedBrace(2)
        );
    }

    #[test]
    fn test_invalid_item() {
        assert!(matches!(
            format_positional("{name}", &[&1]),
            Err(Error::InvalidItem { position: 0, .. })
        ));
        assert!(matches!(
            format_positional("{0,wide}", &[&1]),
            Err(Error::InvalidItem { .. })
        ));
    }

    #[test]
    fn test_specifier_rejected() {
        assert!(matches!(
            format_positional("{0:N2}", &[&1.5]),
            Err(Error::UnsupportedSpecifier(_))
        ));
    }

    #[test]
    fn test_multibyte_text_is_preserved() {
        assert_eq!(
            format_positional("città {0} → ok", &[&"è"]).unwrap(),
            "città è → ok"
        );
    }

    proptest! {
        #[test]
        fn prop_brace_free_text_is_unchanged(text in "[^{}]*") {
            prop_assert_eq!(format_positional(&text, &[]).unwrap(), text);
        }

        #[test]
        fn prop_single_item_renders_argument(arg in "[^{}]*") {
            prop_assert_eq!(format_positional("{0}", &[&arg]).unwrap(), arg);
        }
    }
}
