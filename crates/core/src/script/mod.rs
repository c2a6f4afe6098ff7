//! The template script micro-format: one `Keyword<field,...>` command per
//! line. Lexer, command table, and the ordered script parser.

pub mod command;
pub mod lexer;
pub mod parser;
