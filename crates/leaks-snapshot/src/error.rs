//! Error types for the leaks-snapshot crate.

use std::backtrace::Backtrace;
use std::fmt;

/// Error type for snapshot opening and parsing.
///
/// Any error from this crate means the snapshot itself is unusable; there is
/// no partial-parse mode. Uses the canonical struct pattern with backtrace
/// capture and `is_xxx()` helper methods.
#[derive(Debug)]
pub struct SnapshotError {
    kind: SnapshotErrorKind,
    backtrace: Backtrace,
}

/// Internal error variants. Not exposed publicly; use `is_xxx()` methods.
#[derive(Debug)]
enum SnapshotErrorKind {
    /// I/O error reading the snapshot file.
    Io(std::io::Error),
    /// The file does not start with a recognizable hprof header.
    BadHeader(String),
    /// The header declares an identifier size we cannot decode.
    UnsupportedIdSize(u32),
    /// A record or subrecord extends past the end of the file.
    Truncated { offset: usize },
    /// A heap-dump subrecord tag we cannot size, so parsing cannot continue.
    UnknownSubrecord { tag: u8, offset: usize },
    /// A field or array value could not be decoded.
    BadValue { offset: usize, what: &'static str },
}

impl SnapshotError {
    fn new(kind: SnapshotErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
        }
    }

    /// Creates an error for an unrecognizable file header.
    pub(crate) fn bad_header(detail: impl Into<String>) -> Self {
        Self::new(SnapshotErrorKind::BadHeader(detail.into()))
    }

    /// Creates an error for an identifier size other than 4 or 8 bytes.
    pub(crate) fn unsupported_id_size(size: u32) -> Self {
        Self::new(SnapshotErrorKind::UnsupportedIdSize(size))
    }

    /// Creates an error for data running out mid-record.
    pub(crate) fn truncated(offset: usize) -> Self {
        Self::new(SnapshotErrorKind::Truncated { offset })
    }

    /// Creates an error for an unsizeable heap-dump subrecord tag.
    pub(crate) fn unknown_subrecord(tag: u8, offset: usize) -> Self {
        Self::new(SnapshotErrorKind::UnknownSubrecord { tag, offset })
    }

    /// Creates an error for an undecodable field or array value.
    pub(crate) fn bad_value(offset: usize, what: &'static str) -> Self {
        Self::new(SnapshotErrorKind::BadValue { offset, what })
    }

    /// Returns true if this error is due to I/O failure.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, SnapshotErrorKind::Io(_))
    }

    /// Returns true if this error is due to an unrecognizable header.
    pub fn is_bad_header(&self) -> bool {
        matches!(self.kind, SnapshotErrorKind::BadHeader(_))
    }

    /// Returns true if this error is due to truncated record data.
    pub fn is_truncated(&self) -> bool {
        matches!(self.kind, SnapshotErrorKind::Truncated { .. })
    }

    /// Returns true if this error is due to an unknown subrecord tag.
    pub fn is_unknown_subrecord(&self) -> bool {
        matches!(self.kind, SnapshotErrorKind::UnknownSubrecord { .. })
    }

    /// Returns the backtrace captured when this error was created.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SnapshotErrorKind::Io(err) => write!(f, "I/O error: {err}"),
            SnapshotErrorKind::BadHeader(detail) => {
                write!(f, "not an hprof snapshot: {detail}")
            }
            SnapshotErrorKind::UnsupportedIdSize(size) => {
                write!(f, "unsupported identifier size: {size} bytes")
            }
            SnapshotErrorKind::Truncated { offset } => {
                write!(f, "snapshot truncated at byte offset {offset}")
            }
            SnapshotErrorKind::UnknownSubrecord { tag, offset } => {
                write!(
                    f,
                    "unknown heap dump subrecord tag 0x{tag:02x} at byte offset {offset}"
                )
            }
            SnapshotErrorKind::BadValue { offset, what } => {
                write!(f, "undecodable {what} at byte offset {offset}")
            }
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            SnapshotErrorKind::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SnapshotError {
    fn from(err: std::io::Error) -> Self {
        Self::new(SnapshotErrorKind::Io(err))
    }
}
