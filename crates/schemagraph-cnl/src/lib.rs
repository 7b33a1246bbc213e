//! Controlled-natural-language frontend
//!
//! Business rules arrive as short English sentences over a restricted
//! grammar (`Each Building shall have height greater than 0`). This crate
//! owns everything up to (and including) the concrete syntax tree:
//!
//! - the token/CST sum types over the token set {verb, noun, quantifier,
//!   comparator, modality},
//! - the rule-text parser (nom lexer + recursive descent over tokens),
//! - the concrete-syntax validator that checks every noun/verb token against
//!   the schema-derived vocabulary, and
//! - the categorized diagnostics shared by the whole pipeline.
//!
//! The CST is the interface: the FOL builder and everything behind it depend
//! only on [`cst`], never on the parser, so the grammar can be swapped for an
//! externally produced tree.

pub mod cst;
pub mod diagnostics;
pub mod parse;
pub mod validate;

pub use cst::SentenceCst;
pub use diagnostics::{Diagnostic, DiagnosticCategory};
pub use parse::{parse_sentence, ParseError};
pub use validate::validate_sentence;
