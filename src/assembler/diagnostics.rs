//! Shared diagnostics sink threaded through every assembler stage.
//!
//! Each stage reports into a `Context` instead of printing directly.
//! The context counts errors and warnings, holds the fatal flag and
//! decides which messages are surfaced through the `log` facade.
use std::fmt;
use log::{Level, LevelFilter};
use super::error::{Abort, Error};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Debug,
}

impl Severity {
    fn level(self) -> Level {
        match self {
            Severity::Error   => Level::Error,
            Severity::Warning => Level::Warn,
            Severity::Info    => Level::Info,
            Severity::Debug   => Level::Debug,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub line: Option<usize>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "Line {}: {}", line, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Final outcome of a run.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Status {
    pub errors: usize,
    pub warnings: usize,
}

impl Status {
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} error(s) {} warning(s)", self.errors, self.warnings)
    }
}

pub struct Context {
    verbosity: LevelFilter,
    errors: usize,
    warnings: usize,
    fatal: bool,
    diagnostics: Vec<Diagnostic>,
}

impl Context {
    pub fn new(verbosity: LevelFilter) -> Self {
        Context {
            verbosity,
            errors: 0,
            warnings: 0,
            fatal: false,
            diagnostics: Vec::new(),
        }
    }

    /// Reports a recoverable error. Once the fatal flag is set the
    /// report also ends the run, so callers propagate it with `?`.
    pub fn error(&mut self, line: usize, cause: Error) -> Result<(), Abort> {
        if self.fatal {
            return Err(self.abort(line, cause));
        }
        self.errors += 1;
        self.record(Severity::Error, Some(line), cause.to_string());
        Ok(())
    }

    /// Sets the fatal flag and reports `cause`, which ends the run.
    pub fn fatal(&mut self, line: usize, cause: Error) -> Abort {
        self.set_fatal();
        self.abort(line, cause)
    }

    fn abort(&mut self, line: usize, cause: Error) -> Abort {
        self.errors += 1;
        self.record(Severity::Error, Some(line), format!("(FATAL) {}", cause));
        Abort { line, cause }
    }

    pub fn warning<S: Into<String>>(&mut self, line: Option<usize>, message: S) {
        self.warnings += 1;
        self.record(Severity::Warning, line, message.into());
    }

    pub fn info<S: Into<String>>(&mut self, message: S) {
        self.record(Severity::Info, None, message.into());
    }

    pub fn debug<S: Into<String>>(&mut self, message: S) {
        self.record(Severity::Debug, None, message.into());
    }

    fn record(&mut self, severity: Severity, line: Option<usize>, message: String) {
        let diagnostic = Diagnostic { severity, line, message };
        let level = severity.level();
        if level <= self.verbosity {
            log!(level, "{}", diagnostic);
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn set_fatal(&mut self) {
        self.fatal = true;
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    pub fn errors(&self) -> usize {
        self.errors
    }

    pub fn warnings(&self) -> usize {
        self.warnings
    }

    #[cfg(test)]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn status(&self) -> Status {
        Status { errors: self.errors(), warnings: self.warnings() }
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new(LevelFilter::Warn)
    }
}
