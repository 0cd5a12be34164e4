use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of errors collected before the lexer/parser give up.
pub const MAX_ERRORS: usize = 20;

/// Error category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Malformed characters, strings or indentation (E100–E149).
    Lex,
    /// Malformed statements or expressions (E150–E199).
    Syntax,
}

/// Numeric error code (E100–E199).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Lex errors (E100–E149) ──
    pub const UNEXPECTED_CHARACTER: Self = Self(100);
    pub const UNTERMINATED_STRING: Self = Self(101);
    pub const INVALID_NUMBER: Self = Self(102);
    pub const INCONSISTENT_DEDENT: Self = Self(103);

    // ── Syntax errors (E150–E199) ──
    pub const UNEXPECTED_TOKEN: Self = Self(150);
    pub const INVALID_ASSIGNMENT_TARGET: Self = Self(151);
    pub const EXPECTED_INDENTED_BLOCK: Self = Self(152);
    pub const UNEXPECTED_INDENT: Self = Self(153);
    pub const OUTSIDE_LOOP: Self = Self(154);
    pub const OUTSIDE_FUNCTION: Self = Self(155);
    pub const NESTING_TOO_DEEP: Self = Self(156);

    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=149 => ErrorCategory::Lex,
            _ => ErrorCategory::Syntax,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex => write!(f, "lex"),
            Self::Syntax => write!(f, "syntax"),
        }
    }
}

/// A structured lex or syntax error.
///
/// Hosts render these next to the editor line; `Display` gives the
/// one-line form used in run outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptError {
    pub file: String,
    pub code: ErrorCode,
    pub category: ErrorCategory,
    pub message: String,
    #[serde(flatten)]
    pub span: Span,
    /// The offending source line, verbatim.
    pub source_line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ScriptError {
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
            suggestion: None,
        }
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.span, self.code, self.category, self.message
        )?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (hint: {suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ScriptError {}

/// Errors collected by one lexing or parsing pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptErrors {
    pub errors: Vec<ScriptError>,
    pub total_errors: usize,
}

impl ScriptErrors {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Returns `true` once [`MAX_ERRORS`] have been reported.
    pub fn is_full(&self) -> bool {
        self.total_errors >= MAX_ERRORS
    }

    /// Add an error, respecting the MAX_ERRORS limit.
    pub fn push_error(&mut self, error: ScriptError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// The earliest reported error, which aborts a run.
    pub fn first(&self) -> Option<&ScriptError> {
        self.errors.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(code: ErrorCode, line: u32) -> ScriptError {
        ScriptError::new(
            "main.py",
            code,
            "unexpected character '$'",
            Span::point(line, 1),
            "$x = 1",
        )
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(
            ErrorCode::UNEXPECTED_CHARACTER.category(),
            ErrorCategory::Lex
        );
        assert_eq!(
            ErrorCode::INCONSISTENT_DEDENT.category(),
            ErrorCategory::Lex
        );
        assert_eq!(
            ErrorCode::INVALID_ASSIGNMENT_TARGET.category(),
            ErrorCategory::Syntax
        );
        assert_eq!(ErrorCode::OUTSIDE_LOOP.category(), ErrorCategory::Syntax);
    }

    #[test]
    fn test_error_display() {
        let err = sample(ErrorCode::UNEXPECTED_CHARACTER, 3);
        assert_eq!(err.to_string(), "3:1: E100 [lex] unexpected character '$'");
        let err = err.with_suggestion("remove it");
        assert!(err.to_string().ends_with("(hint: remove it)"));
    }

    #[test]
    fn test_error_json_uses_line_and_column() {
        let err = sample(ErrorCode::UNEXPECTED_TOKEN, 2);
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"line\":2"));
        assert!(json.contains("\"column\":1"));
        assert!(json.contains("\"end_column\":1"));
        assert!(!json.contains("suggestion"));

        let back: ScriptError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_errors_cap_at_max() {
        let mut errs = ScriptErrors::empty();
        for i in 0..25 {
            errs.push_error(sample(ErrorCode::UNEXPECTED_TOKEN, i + 1));
        }
        assert_eq!(errs.errors.len(), MAX_ERRORS);
        assert_eq!(errs.total_errors, 25);
        assert!(errs.is_full());
        assert_eq!(errs.first().map(|e| e.span.start_line), Some(1));
    }
}
