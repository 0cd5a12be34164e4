//! Crane lexer: converts script source text into a token stream.

pub mod lexer;
pub mod token;

pub use lexer::{LexResult, Lexer, TAB_WIDTH};
pub use token::{Token, TokenKind, ALL_KEYWORDS};
