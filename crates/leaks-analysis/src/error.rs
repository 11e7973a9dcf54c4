//! Error types for the leaks-analysis crate.

use std::backtrace::Backtrace;
use std::fmt;

/// Error type for analysis runs.
///
/// The analysis itself prefers degrading (dropped paths, `?` edges) over
/// failing; the only hard error left is being unable to write the report.
#[derive(Debug)]
pub struct AnalysisError {
    kind: AnalysisErrorKind,
    backtrace: Backtrace,
}

/// Internal error variants. Not exposed publicly; use `is_xxx()` methods.
#[derive(Debug)]
enum AnalysisErrorKind {
    /// I/O error writing the report.
    Io(std::io::Error),
}

impl AnalysisError {
    /// Returns true if this error is due to I/O failure.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, AnalysisErrorKind::Io(_))
    }

    /// Returns the backtrace captured when this error was created.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            AnalysisErrorKind::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            AnalysisErrorKind::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        Self {
            kind: AnalysisErrorKind::Io(err),
            backtrace: Backtrace::capture(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn io_errors_are_classified_and_chained() {
        let io_err =
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let err = AnalysisError::from(io_err);
        assert!(err.is_io());
        assert!(err.to_string().contains("I/O error"));
        assert!(err.source().is_some());
        let _ = err.backtrace();
    }
}
