//! Error types for the leaks-index crate.

use std::backtrace::Backtrace;
use std::fmt;

/// Error type for index cache operations.
///
/// Cache errors are never fatal to a run: callers log them and fall back to
/// rebuilding the index from the snapshot. The type still distinguishes
/// transport failures from envelope mismatches for diagnostics.
#[derive(Debug)]
pub struct IndexError {
    kind: IndexErrorKind,
    backtrace: Backtrace,
}

/// Internal error variants. Not exposed publicly; use `is_xxx()` methods.
#[derive(Debug)]
enum IndexErrorKind {
    /// I/O error reading or writing the cache or snapshot file.
    Io(std::io::Error),
    /// The cache envelope does not match the snapshot or this build.
    CacheMismatch { what: &'static str },
}

impl IndexError {
    /// Creates an error for an envelope field that failed verification.
    pub(crate) fn cache_mismatch(what: &'static str) -> Self {
        Self {
            kind: IndexErrorKind::CacheMismatch { what },
            backtrace: Backtrace::capture(),
        }
    }

    /// Returns true if this error is due to I/O failure.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, IndexErrorKind::Io(_))
    }

    /// Returns true if this error is due to an envelope mismatch.
    pub fn is_cache_mismatch(&self) -> bool {
        matches!(self.kind, IndexErrorKind::CacheMismatch { .. })
    }

    /// Returns the backtrace captured when this error was created.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IndexErrorKind::Io(err) => write!(f, "I/O error: {err}"),
            IndexErrorKind::CacheMismatch { what } => {
                write!(f, "cache {what} mismatch")
            }
        }
    }
}

impl std::error::Error for IndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            IndexErrorKind::Io(err) => Some(err),
            IndexErrorKind::CacheMismatch { .. } => None,
        }
    }
}

impl From<std::io::Error> for IndexError {
    fn from(err: std::io::Error) -> Self {
        Self {
            kind: IndexErrorKind::Io(err),
            backtrace: Backtrace::capture(),
        }
    }
}
