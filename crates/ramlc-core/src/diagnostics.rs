//! # Diagnostics Sink
//!
//! Pure pipeline code never writes to a global logger or to storage. Soft
//! failures (a skipped include, an unknown trait, a dangling `$ref`) are
//! reported through the [`Diagnostics`] trait, injected by the caller.
//!
//! - [`TracingDiagnostics`] forwards to `tracing` and is the default sink.
//! - [`NoopDiagnostics`] discards everything.
//! - [`CollectingDiagnostics`] records events so tests can assert on them.

use std::fmt;
use std::sync::Mutex;

/// Pipeline stage that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Tab/indentation repair and duplicate-key handling.
    Normalize,
    /// `!include` expansion.
    Include,
    /// `uses:` library resolution and substitution.
    Library,
    /// Type-to-type expansion.
    Types,
    /// Trait application.
    Traits,
    /// RAML → OpenAPI structural mapping.
    Mapping,
    /// `$ref` resolution.
    Refs,
    /// Schema and parameter validation.
    Validation,
}

impl Stage {
    /// Short lowercase name used as a log field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Normalize => "normalize",
            Stage::Include => "include",
            Stage::Library => "library",
            Stage::Types => "types",
            Stage::Traits => "traits",
            Stage::Mapping => "mapping",
            Stage::Refs => "refs",
            Stage::Validation => "validation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational trace of a pipeline decision.
    Info,
    /// A soft failure: the pipeline substituted a default and continued.
    Warning,
}

/// One reported event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Stage that emitted the event.
    pub stage: Stage,
    /// Severity of the event.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
}

/// Capability through which the core reports soft failures.
pub trait Diagnostics {
    /// Record one diagnostic.
    fn emit(&self, diagnostic: Diagnostic);

    /// Record a warning.
    fn warn(&self, stage: Stage, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.emit(Diagnostic {
            stage,
            severity: Severity::Warning,
            message: message.into(),
        });
    }

    /// Record an informational event.
    fn info(&self, stage: Stage, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.emit(Diagnostic {
            stage,
            severity: Severity::Info,
            message: message.into(),
        });
    }
}

/// Helpers for `&dyn Diagnostics`, where the sized default methods are unavailable.
impl dyn Diagnostics + '_ {
    /// Record a warning through a trait object.
    pub fn warning(&self, stage: Stage, message: impl Into<String>) {
        self.emit(Diagnostic {
            stage,
            severity: Severity::Warning,
            message: message.into(),
        });
    }

    /// Record an informational event through a trait object.
    pub fn note(&self, stage: Stage, message: impl Into<String>) {
        self.emit(Diagnostic {
            stage,
            severity: Severity::Info,
            message: message.into(),
        });
    }
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn emit(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => {
                tracing::warn!(stage = %diagnostic.stage, "{}", diagnostic.message)
            }
            Severity::Info => {
                tracing::debug!(stage = %diagnostic.stage, "{}", diagnostic.message)
            }
        }
    }
}

/// Discards every diagnostic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {
    fn emit(&self, _diagnostic: Diagnostic) {}
}

/// Records every diagnostic in memory.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    events: Mutex<Vec<Diagnostic>>,
}

impl CollectingDiagnostics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded diagnostics, in emission order.
    pub fn events(&self) -> Vec<Diagnostic> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Warnings emitted by `stage`.
    pub fn warnings(&self, stage: Stage) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|d| d.stage == stage && d.severity == Severity::Warning)
            .map(|d| d.message)
            .collect()
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn emit(&self, diagnostic: Diagnostic) {
        match self.events.lock() {
            Ok(mut events) => events.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}
