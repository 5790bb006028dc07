//! Host diagnostics and output
//!
//! Warnings and notices the host would print are recorded on the runtime
//! and mirrored as `tracing` events.

use std::fmt;

use crate::runtime::Runtime;

/// Severity of a host diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Non-fatal error
    Error,
    /// Warning
    Warning,
    /// Notice
    Notice,
    /// Deprecation notice
    Deprecated,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Error => "Error",
            Level::Warning => "Warning",
            Level::Notice => "Notice",
            Level::Deprecated => "Deprecated",
        };
        f.write_str(s)
    }
}

/// A diagnostic emitted during a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity
    pub level: Level,
    /// Message text
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.message)
    }
}

impl Runtime {
    /// Emit a host diagnostic.
    pub fn log(&mut self, level: Level, message: impl Into<String>) {
        let message = message.into();
        match level {
            Level::Error => tracing::error!(target: "hostbind", "{}", message),
            Level::Warning => tracing::warn!(target: "hostbind", "{}", message),
            Level::Notice | Level::Deprecated => {
                tracing::info!(target: "hostbind", level = %level, "{}", message)
            }
        }
        self.diagnostics.push(Diagnostic { level, message });
    }

    /// Diagnostics recorded so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Drain recorded diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Write bytes to the host output stream.
    pub fn echo(&mut self, bytes: impl AsRef<[u8]>) {
        self.output.extend_from_slice(bytes.as_ref());
    }

    /// Drain the host output stream.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }
}
