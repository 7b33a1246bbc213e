//! Schemagraph model plane
//!
//! This crate defines the read-only schema graph the rule compiler works
//! against (classes, properties, supertypes, associations, namespaces), the
//! constraint records attached to classes, and the vocabulary derivation that
//! turns the graph into the noun/verb token sets of the controlled natural
//! language.
//!
//! The graph is loaded from JSON (serde) and *finalized* once per compilation
//! session: finalization validates cross-references, applies the optional
//! time-slice profile extension, and precomputes the supertype/subtype
//! closures every later lookup uses.

pub mod graph;
pub mod vocabulary;

pub use graph::{
    AssociationDef, ClassDef, Containment, ConstraintRecord, ModelError, Namespace, PropertyDef,
    SchemaGraph, SchemaProfile, TIME_SLICE_PROPERTY,
};
pub use vocabulary::{Vocabulary, BUILTIN_VERBS};
