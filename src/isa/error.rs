use std::fmt;

use crate::isa::ast::Element;
use crate::isa::diagnostic::{DiagnosticPhase, IsaDiagnostic, SourceSpan};

/// Represents any failure that can occur while reading, parsing, or compiling an
/// instruction-set description. Every variant is fatal for the whole run.
#[derive(Debug)]
pub enum IsaError {
    Io(std::io::Error),
    /// A required attribute or child is missing or malformed.
    Schema {
        tag: String,
        message: String,
        span: Option<SourceSpan>,
    },
    /// The description contradicts itself across variants or instructions.
    Consistency(String),
    Diagnostics {
        phase: DiagnosticPhase,
        diagnostics: Vec<IsaDiagnostic>,
    },
}

impl IsaError {
    pub fn schema(node: &Element, message: impl Into<String>) -> Self {
        IsaError::Schema {
            tag: node.tag.clone(),
            message: message.into(),
            span: node.span.clone(),
        }
    }

    pub fn consistency(message: impl Into<String>) -> Self {
        IsaError::Consistency(message.into())
    }

    /// The phase the failure belongs to, if it came from the pipeline rather than I/O.
    pub fn phase(&self) -> Option<DiagnosticPhase> {
        match self {
            IsaError::Io(_) => None,
            IsaError::Schema { .. } => Some(DiagnosticPhase::Schema),
            IsaError::Consistency(_) => Some(DiagnosticPhase::Consistency),
            IsaError::Diagnostics { phase, .. } => Some(*phase),
        }
    }
}

impl From<std::io::Error> for IsaError {
    fn from(err: std::io::Error) -> Self {
        IsaError::Io(err)
    }
}

impl fmt::Display for IsaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsaError::Io(err) => write!(f, "I/O error: {err}"),
            IsaError::Schema { tag, message, span } => {
                write!(f, "schema error in <{tag}>: {message}")?;
                if let Some(span) = span {
                    write!(f, " @ {}", span.location())?;
                }
                Ok(())
            }
            IsaError::Consistency(msg) => write!(f, "consistency error: {msg}"),
            IsaError::Diagnostics { phase, diagnostics } => {
                writeln!(f, "{phase:?} produced {} issue(s):", diagnostics.len())?;
                for diag in diagnostics {
                    writeln!(f, "  - {}", diag.format_human())?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for IsaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IsaError::Io(err) => Some(err),
            _ => None,
        }
    }
}
