//! Shared types for the crane interpreter.
//!
//! This crate defines the AST node types, source spans and the structured
//! lex/syntax error types used by the lexer, parser and hosts.

mod error;
mod span;
pub mod ast;

pub use error::{ErrorCategory, ErrorCode, ScriptError, ScriptErrors, MAX_ERRORS};
pub use span::{SourceFile, Span};
