//! Document reading helpers (lexer, parser, file loader).

pub mod lexer;
pub mod loader;
pub mod parser;

pub use lexer::{Lexer, Token, TokenKind};
pub use loader::IsaLoader;
pub use parser::{Parser, parse_str};
