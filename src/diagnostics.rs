//! Diagnostics collection for best-effort bridge operations.
//!
//! The bridge degrades instead of failing: a foreign call that misbehaves, a collection
//! that cannot be enumerated, an obfuscated name that collides with another. Each of
//! those is reported here so a host can surface it, but none of them stops the
//! operation that ran into it.
//!
//! # Key Components
//!
//! - [`Diagnostics`] - Thread-safe container for diagnostic entries
//! - [`Diagnostic`] - Individual diagnostic entry with severity and context
//! - [`DiagnosticSeverity`] - Severity level (Info, Warning, Error)
//! - [`DiagnosticCategory`] - Component that produced the diagnostic
//! - [`DiagnosticSink`] - Optional handle given to every component; absent means silent
//!
//! # Usage Examples
//!
//! ```rust
//! use dotbridge::diagnostics::{DiagnosticCategory, DiagnosticSink, Diagnostics};
//! use std::sync::Arc;
//!
//! let diagnostics = Arc::new(Diagnostics::new());
//! let sink = DiagnosticSink::new(diagnostics.clone());
//!
//! sink.warn_once(
//!     DiagnosticCategory::Enumeration,
//!     "probe:Il2CppSystem.Collections.Queue",
//!     "GetEnumerator probe failed",
//! );
//! sink.warn_once(
//!     DiagnosticCategory::Enumeration,
//!     "probe:Il2CppSystem.Collections.Queue",
//!     "GetEnumerator probe failed",
//! );
//!
//! assert_eq!(diagnostics.warning_count(), 1);
//!
//! // A sink without a container swallows everything
//! DiagnosticSink::silent().warning(DiagnosticCategory::Cast, "nobody listens");
//! ```
//!
//! # Thread Safety
//!
//! [`Diagnostics`] uses `boxcar::Vec` internally for lock-free appends and a `DashSet`
//! for the once-only keys, so background threads may report as well.

use std::{
    fmt::{self, Write},
    sync::Arc,
};

use dashmap::DashSet;

/// Severity level of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    /// Informational message, not indicating a problem.
    Info,

    /// A host-environment assumption was violated and a fallback was used.
    Warning,

    /// A failure the bridge could not compensate for.
    Error,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Info => write!(f, "INFO"),
            DiagnosticSeverity::Warning => write!(f, "WARN"),
            DiagnosticSeverity::Error => write!(f, "ERROR"),
        }
    }
}

/// Component that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    /// Type catalog population and implementation scans.
    Catalog,

    /// Obfuscated-name indexing.
    Deobfuscation,

    /// Actual-type resolution.
    Identity,

    /// Cross-representation casting.
    Cast,

    /// Foreign collection enumeration.
    Enumeration,

    /// Version-tolerant member access.
    Member,

    /// Owner-thread callback dispatch.
    Dispatch,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Catalog => write!(f, "Catalog"),
            DiagnosticCategory::Deobfuscation => write!(f, "Deobfuscation"),
            DiagnosticCategory::Identity => write!(f, "Identity"),
            DiagnosticCategory::Cast => write!(f, "Cast"),
            DiagnosticCategory::Enumeration => write!(f, "Enumeration"),
            DiagnosticCategory::Member => write!(f, "Member"),
            DiagnosticCategory::Dispatch => write!(f, "Dispatch"),
        }
    }
}

/// A single diagnostic entry with context information.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level of this diagnostic.
    pub severity: DiagnosticSeverity,

    /// Category indicating the source of this diagnostic.
    pub category: DiagnosticCategory,

    /// Human-readable description of the issue.
    pub message: String,

    /// Optional full name of the type involved.
    pub type_name: Option<String>,
}

impl Diagnostic {
    /// Creates a new diagnostic entry.
    ///
    /// # Arguments
    ///
    /// * `severity` - Severity level of the diagnostic
    /// * `category` - Category of the diagnostic source
    /// * `message` - Human-readable description
    pub fn new(
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            type_name: None,
        }
    }

    /// Adds the name of the type involved.
    #[must_use]
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)?;

        if let Some(type_name) = &self.type_name {
            write!(f, " (type: {type_name})")?;
        }

        Ok(())
    }
}

/// Thread-safe container for collecting diagnostic entries.
///
/// Uses `boxcar::Vec` internally for lock-free concurrent append operations.
#[derive(Debug)]
pub struct Diagnostics {
    entries: boxcar::Vec<Diagnostic>,
    reported_keys: DashSet<String>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    /// Creates a new empty diagnostics container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: boxcar::Vec::new(),
            reported_keys: DashSet::new(),
        }
    }

    /// Adds an informational diagnostic.
    pub fn info(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(DiagnosticSeverity::Info, category, message));
    }

    /// Adds a warning diagnostic.
    pub fn warning(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Warning,
            category,
            message,
        ));
    }

    /// Adds an error diagnostic.
    pub fn error(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Error,
            category,
            message,
        ));
    }

    /// Adds a diagnostic entry directly.
    pub fn push(&self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Adds `diagnostic` unless another one with the same `key` was already recorded.
    ///
    /// Returns `true` if the entry was recorded.
    pub fn push_once(&self, key: impl Into<String>, diagnostic: Diagnostic) -> bool {
        if self.reported_keys.insert(key.into()) {
            self.push(diagnostic);
            true
        } else {
            false
        }
    }

    /// Returns true if any diagnostics have been collected.
    pub fn has_any(&self) -> bool {
        self.entries.count() > 0
    }

    /// Returns true if any warning-level diagnostics have been collected.
    pub fn has_warnings(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.severity == DiagnosticSeverity::Warning)
    }

    /// Returns the total number of diagnostics.
    pub fn count(&self) -> usize {
        self.entries.count()
    }

    /// Returns the number of error-level diagnostics.
    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == DiagnosticSeverity::Error)
            .count()
    }

    /// Returns the number of warning-level diagnostics.
    pub fn warning_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == DiagnosticSeverity::Warning)
            .count()
    }

    /// Returns an iterator over all diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().map(|(_, d)| d)
    }

    /// Returns all warnings as a vector.
    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == DiagnosticSeverity::Warning)
            .map(|(_, d)| d)
            .collect()
    }

    /// Returns diagnostics filtered by category.
    pub fn by_category(&self, category: DiagnosticCategory) -> Vec<&Diagnostic> {
        self.entries
            .iter()
            .filter(|(_, d)| d.category == category)
            .map(|(_, d)| d)
            .collect()
    }

    /// Formats a summary of all diagnostics for display.
    pub fn summary(&self) -> String {
        let mut output = String::new();

        let _ = writeln!(
            output,
            "Diagnostics: {} error(s), {} warning(s), {} total",
            self.error_count(),
            self.warning_count(),
            self.count()
        );

        for diag in self.iter() {
            let _ = writeln!(output, "  {diag}");
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

/// Optional handle on a [`Diagnostics`] container.
///
/// Every bridge component holds one of these. A silent sink drops everything, which is
/// how a host without a logging backend is served.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticSink {
    target: Option<Arc<Diagnostics>>,
}

impl DiagnosticSink {
    /// Creates a sink that records into `diagnostics`.
    #[must_use]
    pub fn new(diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            target: Some(diagnostics),
        }
    }

    /// Creates a sink that discards every entry.
    #[must_use]
    pub fn silent() -> Self {
        Self { target: None }
    }

    /// The backing container, if any.
    #[must_use]
    pub fn diagnostics(&self) -> Option<&Arc<Diagnostics>> {
        self.target.as_ref()
    }

    /// Records an informational entry.
    pub fn info(&self, category: DiagnosticCategory, message: impl Into<String>) {
        if let Some(target) = &self.target {
            target.info(category, message);
        }
    }

    /// Records a warning.
    pub fn warning(&self, category: DiagnosticCategory, message: impl Into<String>) {
        if let Some(target) = &self.target {
            target.warning(category, message);
        }
    }

    /// Records a warning about a specific type.
    pub fn type_warning(
        &self,
        category: DiagnosticCategory,
        type_name: &str,
        message: impl Into<String>,
    ) {
        if let Some(target) = &self.target {
            target.push(
                Diagnostic::new(DiagnosticSeverity::Warning, category, message)
                    .with_type(type_name),
            );
        }
    }

    /// Records a warning at most once per `key` for the lifetime of the container.
    pub fn warn_once(
        &self,
        category: DiagnosticCategory,
        key: impl Into<String>,
        message: impl Into<String>,
    ) {
        if let Some(target) = &self.target {
            target.push_once(
                key,
                Diagnostic::new(DiagnosticSeverity::Warning, category, message),
            );
        }
    }
}
