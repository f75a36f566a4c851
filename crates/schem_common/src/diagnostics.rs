//! Non-fatal diagnostic accumulation.
//!
//! Several situations the pipeline encounters are recoverable by design
//! (missing top module falls back to the first module; unknown cell type
//! falls back to the first generic template). They are recorded here
//! instead of aborting the pipeline.

use std::sync::Mutex;

/// Severity of a recorded diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational notice, no action required.
    Info,
    /// A fallback was taken; output may not match author intent.
    Warning,
}

/// A single recorded diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity of this diagnostic.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
}

impl Diagnostic {
    /// Creates an informational diagnostic.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    /// Creates a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// A thread-safe accumulator for diagnostics emitted during rendering.
///
/// Unlike a compiler's diagnostic sink, nothing recorded here is ever fatal —
/// every condition this pipeline can detect has a defined fallback. The sink
/// exists so the caller can surface fallbacks to a user without the pipeline
/// itself returning an error for them.
#[derive(Default)]
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticSink {
    /// Creates a new empty diagnostic sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits a diagnostic into the sink.
    pub fn emit(&self, diag: Diagnostic) {
        self.diagnostics.lock().unwrap().push(diag);
    }

    /// Returns a snapshot of all accumulated diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().unwrap().clone()
    }

    /// Returns the number of warning-severity diagnostics emitted so far.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sink() {
        let sink = DiagnosticSink::new();
        assert!(sink.diagnostics().is_empty());
        assert_eq!(sink.warning_count(), 0);
    }

    #[test]
    fn emit_and_read_back() {
        let sink = DiagnosticSink::new();
        sink.emit(Diagnostic::warning("unknown cell type 'foo'"));
        sink.emit(Diagnostic::info("no top module marked, using first"));
        assert_eq!(sink.diagnostics().len(), 2);
        assert_eq!(sink.warning_count(), 1);
    }

    #[test]
    fn thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let sink = Arc::new(DiagnosticSink::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let sink = Arc::clone(&sink);
            handles.push(thread::spawn(move || {
                for _ in 0..50 {
                    sink.emit(Diagnostic::warning("x"));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(sink.warning_count(), 400);
    }
}
