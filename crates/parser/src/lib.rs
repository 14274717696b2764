//! Go source syntax for the `//go:fix inline` rewriter.
//!
//! - The lexer uses Logos and implements Go semicolon insertion; comments are
//!   kept on the side so doc comments and directives survive.
//! - The parser is hand-written recursive descent over the token vector and
//!   produces an arena tree whose nodes all carry byte spans.
//! - [`inspect::Inspector`] adds parent links for rewrites that need to look
//!   outwards from a node.

pub mod ast;
pub mod error;
pub mod inspect;
pub mod lexer;
pub mod lines;
pub mod parser;
mod parser_support;
pub mod walk;

pub use error::{Diag, ParseFailure};
pub use inspect::{Cursor, FuncRef, Inspector, NodeRef};
pub use lexer::Lexer;
pub use lines::LineIndex;
pub use parser::{ParsedFile, parse_file};
