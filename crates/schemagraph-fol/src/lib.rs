//! First-order-logic plane of the rule compiler.
//!
//! The FOL expression tree sits between the concrete syntax tree and the
//! query IR: quantifications over scoped variables, a small predicate
//! algebra, and schema-call navigation chains that are *fully resolved*
//! against the model; every class and property reference has been checked,
//! so the backend never re-validates the schema.
//!
//! Variables form an environment chain mirroring nested quantifiers; the
//! distinguished `self` variable (no outer scope) stands for the rule's
//! subject context node.

pub mod ast;
pub mod builder;

pub use ast::{
    ComparisonOp, Expression, JunctionOp, Literal, Predicate, PropertyStep, Quantification,
    Quantifier, SchemaCall, SchemaStep, Variable,
};
pub use builder::{FolBuilder, FolError, MAX_NESTING_DEPTH};
