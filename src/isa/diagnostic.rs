use std::path::PathBuf;

/// Phase of the pipeline that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticPhase {
    Lexer,
    Parser,
    Schema,
    Consistency,
}

/// A precise source position (1-indexed line/column) inside an instruction-set document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
}

impl SourcePosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A half-open [start, end) span referencing a specific document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    pub path: PathBuf,
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl SourceSpan {
    pub fn new(path: PathBuf, start: SourcePosition, end: SourcePosition) -> Self {
        Self { path, start, end }
    }

    pub fn point(path: PathBuf, position: SourcePosition) -> Self {
        Self {
            path,
            start: position,
            end: position,
        }
    }

    pub fn location(&self) -> String {
        format!(
            "{}:{}:{}",
            self.path.display(),
            self.start.line,
            self.start.column
        )
    }
}

/// One fatal finding, tagged with the phase that raised it and a stable dotted code.
#[derive(Debug, Clone)]
pub struct IsaDiagnostic {
    pub phase: DiagnosticPhase,
    pub code: &'static str,
    pub message: String,
    pub span: Option<SourceSpan>,
}

impl IsaDiagnostic {
    pub fn error(
        phase: DiagnosticPhase,
        code: &'static str,
        message: impl Into<String>,
        span: Option<SourceSpan>,
    ) -> Self {
        Self {
            phase,
            code,
            message: message.into(),
            span,
        }
    }

    /// `code: message @ path:line:col`, or `@ <unknown>` without a span.
    pub fn format_human(&self) -> String {
        let location = self
            .span
            .as_ref()
            .map(SourceSpan::location)
            .unwrap_or_else(|| "<unknown>".to_string());
        format!("{}: {} @ {location}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_location() {
        let span = SourceSpan::point(PathBuf::from("isa.xml"), SourcePosition::new(4, 7));
        let diag = IsaDiagnostic::error(
            DiagnosticPhase::Schema,
            "schema.mod.missing-opt",
            "modifier 'neg' needs an 'opt' attribute",
            Some(span),
        );
        assert_eq!(
            diag.format_human(),
            "schema.mod.missing-opt: modifier 'neg' needs an 'opt' attribute @ isa.xml:4:7"
        );
    }

    #[test]
    fn formats_unknown_location() {
        let diag = IsaDiagnostic::error(
            DiagnosticPhase::Consistency,
            "consistency.test",
            "message",
            None,
        );
        assert!(diag.format_human().ends_with("@ <unknown>"));
    }
}
