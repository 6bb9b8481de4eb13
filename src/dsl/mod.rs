//! Netlist language for describing linear filter circuits.
//!
//! A small SPICE-inspired, line-oriented format. The filter topologies used
//! for dataset generation are built as ASTs directly, and the same ASTs render
//! back to text so a designed filter can be written out and re-simulated with
//! the `sweep` command.
//!
//! # Grammar Overview
//!
//! ```text
//! netlist     = { line }
//! line        = comment | directive | component | empty
//! comment     = ('#' | ';') { any_char }
//! directive   = '.' ("input" | "output" | "node") node
//! component   = name node node [value] { source_kw value } { param '=' value }
//!
//! name        = ('R' | 'C' | 'L' | 'V' | 'I') { letter | digit | '_' }
//! node        = identifier | number | "GND"
//! source_kw   = "DC" | "AC"
//! value       = number [unit_suffix]
//! unit_suffix = 'p' | 'n' | 'u' | 'µ' | 'm' | 'k' | 'K' | 'M' | 'G'
//! ```
//!
//! # Example
//!
//! ```text
//! # RC low-pass filter
//! .input in
//! .output out
//!
//! VIN  in   0    AC 1
//! R1   in   out  10k
//! C1   out  0    100n
//! ```

mod ast;
mod lexer;
mod parser;

pub use ast::*;
pub use lexer::{parse_value, Lexer, Token, TokenKind};
pub use parser::Parser;

use crate::error::Result;

/// Parse netlist text into an AST.
pub fn parse(input: &str) -> Result<CircuitAst> {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer)?;
    parser.parse()
}

/// Parse a netlist file.
pub fn parse_file(path: &std::path::Path) -> Result<CircuitAst> {
    let content = std::fs::read_to_string(path).map_err(|e| crate::error::DesignError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse(&content)
}
