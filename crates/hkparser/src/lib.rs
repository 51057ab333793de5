#![warn(clippy::pedantic)]

//! Config DSL for the hotkey daemon: lexer, parser and semantic
//! interpreter producing the compiled dispatch table.

use std::fmt::{self, Display};

use hkkeys::{CompiledTable, ConfigProperties, KeycodeRegistry};

pub mod ast;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::Program;
pub use interpreter::{CompileError, Interpreter};
pub use lexer::Lexer;
pub use parser::{ParseError, Parser};
pub use token::{Token, TokenKind};

/// Any error that aborts a config load.
///
/// Both variants are fatal for the load; on reload the previously
/// compiled table stays in effect.
#[derive(Debug, PartialEq, Eq, Clone, derive_more::From)]
pub enum ConfigError {
    Parse(ParseError),
    Compile(CompileError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(err) => write!(f, "{err}"),
            ConfigError::Compile(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(err) => Some(err),
            ConfigError::Compile(err) => Some(err),
        }
    }
}

/// Compile config text into the dispatch table and properties.
///
/// # Errors
///
/// Return a [`ConfigError`] when the text fails to parse or compile.
pub fn compile(
    source: &str,
    registry: &KeycodeRegistry,
) -> Result<(CompiledTable, ConfigProperties), ConfigError> {
    let program = Parser::new(source).parse_program()?;
    let compiled = Interpreter::new(registry).interpret(&program)?;
    Ok(compiled)
}

/// Parse config text without interpreting it, for diagnostics such as
/// the AST dump mode.
///
/// # Errors
///
/// Return the first [`ParseError`] in the text.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    Parser::new(source).parse_program()
}
