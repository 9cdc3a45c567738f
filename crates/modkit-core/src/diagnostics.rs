use crate::module_id::ModuleId;
use std::fmt;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Info,
}

impl DiagnosticLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticLevel::Error => "error",
            DiagnosticLevel::Warning => "warning",
            DiagnosticLevel::Info => "info",
        }
    }
}

/// A diagnostic message, optionally attributed to a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub module: Option<ModuleId>,
    pub message: String,
}

impl Diagnostic {
    pub fn error(module: Option<&ModuleId>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            module: module.cloned(),
            message: message.into(),
        }
    }

    pub fn warning(module: Option<&ModuleId>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            module: module.cloned(),
            message: message.into(),
        }
    }

    pub fn info(module: Option<&ModuleId>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Info,
            module: module.cloned(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.module {
            Some(module) => write!(f, "{} [{}]: {}", self.level.as_str(), module, self.message),
            None => write!(f, "{}: {}", self.level.as_str(), self.message),
        }
    }
}

/// Sink for per-module build problems; injected through the [`Container`](crate::di::Container)
pub trait DiagnosticHandler: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);

    fn error(&self, module: Option<&ModuleId>, message: &str) {
        self.report(Diagnostic::error(module, message));
    }

    fn warning(&self, module: Option<&ModuleId>, message: &str) {
        self.report(Diagnostic::warning(module, message));
    }

    fn info(&self, module: Option<&ModuleId>, message: &str) {
        self.report(Diagnostic::info(module, message));
    }

    fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn error_count(&self) -> usize;
    fn warning_count(&self) -> usize;
    fn get_diagnostics(&self) -> Vec<Diagnostic>;
}

fn count_level(diagnostics: &Mutex<Vec<Diagnostic>>, level: DiagnosticLevel) -> usize {
    diagnostics
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .filter(|d| d.level == level)
        .count()
}

/// Prints each diagnostic to stderr as it is reported
pub struct ConsoleDiagnosticHandler {
    diagnostics: Mutex<Vec<Diagnostic>>,
    pretty: bool,
}

impl ConsoleDiagnosticHandler {
    pub fn new(pretty: bool) -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            pretty,
        }
    }
}

impl DiagnosticHandler for ConsoleDiagnosticHandler {
    fn report(&self, diagnostic: Diagnostic) {
        if self.pretty {
            let color = match diagnostic.level {
                DiagnosticLevel::Error => "\x1b[31m",
                DiagnosticLevel::Warning => "\x1b[33m",
                DiagnosticLevel::Info => "\x1b[34m",
            };
            eprintln!("{}{}\x1b[0m", color, diagnostic);
        } else {
            eprintln!("{}", diagnostic);
        }

        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic);
    }

    fn error_count(&self) -> usize {
        count_level(&self.diagnostics, DiagnosticLevel::Error)
    }

    fn warning_count(&self) -> usize {
        count_level(&self.diagnostics, DiagnosticLevel::Warning)
    }

    fn get_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Keeps diagnostics in memory only
#[derive(Default)]
pub struct CollectingDiagnosticHandler {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingDiagnosticHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiagnosticHandler for CollectingDiagnosticHandler {
    fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic);
    }

    fn error_count(&self) -> usize {
        count_level(&self.diagnostics, DiagnosticLevel::Error)
    }

    fn warning_count(&self) -> usize {
        count_level(&self.diagnostics, DiagnosticLevel::Warning)
    }

    fn get_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
