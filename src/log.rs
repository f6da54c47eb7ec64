use crate::traits::OperationLog;

/// Severity of an operation event.
///
/// Each level has a fixed route: `Info`, `Warning` and `Error` are persisted
/// to the log file and shown to the operator; `Verbose` is shown to the
/// operator only, unless debug mode is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Verbose,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Whether events at this level belong in the persisted log.
    pub fn is_persisted(self) -> bool {
        !matches!(self, Self::Verbose)
    }
}

/// Target used for every operation event, so subscribers can route them.
pub const OPS_TARGET: &str = "treemirror::ops";

/// Forwards operation events to `tracing`.
///
/// `Verbose` becomes `DEBUG`, the rest map one-to-one. Routing to the file
/// and the terminal is configured on the subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl OperationLog for TracingLog {
    fn emit(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Verbose => tracing::debug!(target: OPS_TARGET, "{message}"),
            LogLevel::Info    => tracing::info!(target: OPS_TARGET, "{message}"),
            LogLevel::Warning => tracing::warn!(target: OPS_TARGET, "{message}"),
            LogLevel::Error   => tracing::error!(target: OPS_TARGET, "{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_verbose_stays_off_the_log_file() {
        assert!(!LogLevel::Verbose.is_persisted());
        assert!(LogLevel::Info.is_persisted());
        assert!(LogLevel::Warning.is_persisted());
        assert!(LogLevel::Error.is_persisted());
    }

    #[test]
    fn tracing_log_emits_without_subscriber() {
        TracingLog.emit(LogLevel::Info, "no subscriber installed");
        TracingLog.emit(LogLevel::Verbose, "still fine");
    }
}
