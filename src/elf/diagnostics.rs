//! Diagnostics collection for image validation and loading.
//!
//! This module provides types for collecting and reporting diagnostic messages while
//! an image is validated, measured, loaded and its symbol table embedded. The
//! collector is a sink only: no control-flow decision anywhere in the crate depends
//! on what was recorded, and recording never fails.
//!
//! Informational entries are gated by a verbosity flag chosen when the collector is
//! created; error entries are always recorded. The container uses `boxcar::Vec` for
//! lock-free append, so a shared [`Diagnostics`] handle can be written through `&self`
//! and handed out as an `Arc` without further synchronization.
//!
//! # Usage
//!
//! ```rust,no_run
//! use elfscope::elf::Diagnostics;
//! use elfscope::ElfObject;
//! use std::sync::Arc;
//!
//! let diagnostics = Arc::new(Diagnostics::verbose());
//! let image = std::fs::read("vmlinux")?;
//! let binary = ElfObject::from_mem_with_diagnostics(image, diagnostics.clone())?;
//!
//! for entry in diagnostics.iter() {
//!     println!("{}", entry);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;

/// Severity level of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum DiagnosticSeverity {
    /// Informational message, not indicating a problem.
    ///
    /// Recorded only when the collector is verbose.
    #[strum(serialize = "INFO")]
    Info,

    /// Warning about a degraded-but-valid condition.
    ///
    /// Used for states the parser deliberately tolerates, such as a symbol
    /// table whose string table link is invalid (symbol lookup becomes
    /// unavailable, parsing continues). Recorded only when the collector is
    /// verbose.
    #[strum(serialize = "WARN")]
    Warning,

    /// Error indicating an invalid image or a failed load.
    ///
    /// Always recorded, regardless of verbosity. Every `Err` the crate
    /// returns is mirrored here for human visibility.
    #[strum(serialize = "ERROR")]
    Error,
}

/// The component a diagnostic entry originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum DiagnosticCategory {
    /// File header identification and table geometry validation
    #[strum(serialize = "header")]
    Header,

    /// Program header scanning and footprint calculation
    #[strum(serialize = "program-headers")]
    ProgramHeaders,

    /// Section header scanning and table location
    #[strum(serialize = "sections")]
    Sections,

    /// Segment copying and zero-filling
    #[strum(serialize = "loader")]
    Loader,

    /// Symbol resolution and the embedded symbol table
    #[strum(serialize = "symbols")]
    Symbols,
}

/// Individual diagnostic entry with severity and originating component.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// How serious this entry is
    pub severity: DiagnosticSeverity,
    /// Which component recorded it
    pub category: DiagnosticCategory,
    /// Human-readable description
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)
    }
}

/// Thread-safe container for diagnostic entries.
///
/// Shared into the parse context as an `Arc` at construction (or swapped later via
/// [`crate::elf::ElfBinary::set_diagnostics`]); the validator, footprint calculator,
/// loader and embedder append to it, the caller inspects it afterwards.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: boxcar::Vec<Diagnostic>,
    verbose: bool,
}

impl Diagnostics {
    /// Create a quiet collector: only [`DiagnosticSeverity::Error`] entries are
    /// recorded.
    #[must_use]
    pub fn new() -> Diagnostics {
        Diagnostics {
            entries: boxcar::Vec::new(),
            verbose: false,
        }
    }

    /// Create a verbose collector: informational and warning entries are recorded
    /// as well.
    #[must_use]
    pub fn verbose() -> Diagnostics {
        Diagnostics {
            entries: boxcar::Vec::new(),
            verbose: true,
        }
    }

    /// Returns `true` if informational entries are being recorded.
    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Record an informational entry (dropped unless verbose).
    pub fn info(&self, category: DiagnosticCategory, message: impl Into<String>) {
        if self.verbose {
            self.push(DiagnosticSeverity::Info, category, message.into());
        }
    }

    /// Record a warning about a degraded-but-valid condition (dropped unless
    /// verbose).
    pub fn warning(&self, category: DiagnosticCategory, message: impl Into<String>) {
        if self.verbose {
            self.push(DiagnosticSeverity::Warning, category, message.into());
        }
    }

    /// Record an error entry (always kept).
    pub fn error(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(DiagnosticSeverity::Error, category, message.into());
    }

    fn push(&self, severity: DiagnosticSeverity, category: DiagnosticCategory, message: String) {
        self.entries.push(Diagnostic {
            severity,
            category,
            message,
        });
    }

    /// Returns `true` if any error entry was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.iter()
            .any(|entry| entry.severity == DiagnosticSeverity::Error)
    }

    /// Number of error entries recorded.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.iter()
            .filter(|entry| entry.severity == DiagnosticSeverity::Error)
            .count()
    }

    /// Total number of entries recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.count()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over all recorded entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().map(|(_, entry)| entry)
    }
}
