//! Boot console diagnostics
//!
//! Boot stages report failures as single human-readable lines. Where the
//! line goes is up to the board: [`LogSink`] routes it through the `log`
//! facade, which is the normal choice once a logger is installed.

use core::fmt;

/// Receives one diagnostic line per call
pub trait DiagnosticSink {
    fn emit(&mut self, args: fmt::Arguments<'_>);
}

/// Forwards diagnostics to `log::error!`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&mut self, args: fmt::Arguments<'_>) {
        log::error!("{}", args);
    }
}
