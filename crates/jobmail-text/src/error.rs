//! Error types for text operations.

/// Result type alias for text operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Formatting error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A `{` opened a format item that was never closed.
    #[error("Unterminated format item at position {0}")]
    UnterminatedItem(usize),

    /// A lone `}` outside of a format item.
    #[error("Unescaped '}}' at position {0}")]
    UnescapedBrace(usize),

    /// The item is not an index, optionally followed by an alignment.
    #[error("Invalid format item '{item}' at position {position}")]
    InvalidItem {
        /// Byte offset of the opening brace.
        position: usize,
        /// Raw content between the braces.
        item: String,
    },

    /// The item references an argument that was not supplied.
    #[error("Format index {index} is out of range ({count} argument(s) supplied)")]
    IndexOutOfRange {
        /// Referenced index.
        index: usize,
        /// Number of supplied arguments.
        count: usize,
    },

    /// The alignment is [`MAX_ALIGNMENT`](crate::MAX_ALIGNMENT) or wider.
    #[error("Alignment {alignment} is out of range at position {position}")]
    AlignmentOutOfRange {
        /// Byte offset of the opening brace.
        position: usize,
        /// Requested alignment.
        alignment: i64,
    },

    /// A `:specifier` suffix was used inside an item.
    #[error("Format specifiers are not supported: '{0}'")]
    UnsupportedSpecifier(String),
}
