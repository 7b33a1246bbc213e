//! Backend of the rule compiler: query IR, XPath printing and Schematron
//! document emission.
//!
//! Design goals:
//!
//! - Deterministic output: fixed class/constraint ordering, stable
//!   namespace declaration order, fresh per-rule counters.
//! - Rule-scoped failure: a rule either fully compiles or contributes
//!   nothing; errors inside the backend are sentinel nodes, not panics.
//! - One dialect, done properly: only the XPath the translator emits is
//!   supported, with precedence-correct and non-redundant bracketing.

pub mod compile;
pub mod document;
pub mod lower;
pub mod nodes;
pub mod xpath;

pub use compile::{check_schema, compile_schema, CheckOutcome, CompileOutcome};
pub use document::{Assertion, NamespaceRegistry, RuleBlock, SchematronDocument, SchematronError};
pub use lower::Lowering;
pub use nodes::QueryNode;
pub use xpath::{BindingContext, TranslationContext, XpathConfig, XpathFragment, XpathTranslator};
