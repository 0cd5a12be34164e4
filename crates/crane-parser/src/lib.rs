//! Crane parser: converts a token stream into an AST.

mod parse_expr;
mod parse_stmt;
mod parser;

pub use parser::{ParseResult, Parser, MAX_EXPR_DEPTH};

use crane_lexer::Lexer;
use crane_types::SourceFile;

/// Lex and parse a source file in one step.
///
/// Lex errors stop the pipeline before parsing, so every reported error
/// comes from the earliest stage that failed.
pub fn parse_source(source_file: &SourceFile) -> ParseResult {
    let lexed = Lexer::new(source_file).lex();
    if lexed.errors.has_errors() {
        return ParseResult {
            program: None,
            errors: lexed.errors,
        };
    }
    Parser::new(lexed.tokens, source_file).parse()
}
