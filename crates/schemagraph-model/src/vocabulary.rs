//! Vocabulary derivation: schema graph → noun/verb token sets.
//!
//! The controlled natural language validates every noun and verb token
//! against these sets before any semantic resolution happens. Derivation is
//! pure and deterministic: `BTreeSet`s keep the result independent of the
//! graph's declaration order, so repeated builds over the same schema are
//! byte-identical.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::graph::SchemaGraph;

/// Verbs that are part of the language itself rather than the schema.
pub const BUILTIN_VERBS: &[&str] = &["has", "have"];

/// Immutable per-compilation-session vocabulary.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Vocabulary {
    pub nouns: BTreeSet<String>,
    pub verbs: BTreeSet<String>,
}

impl Vocabulary {
    /// Derive the vocabulary from a finalized schema graph.
    ///
    /// Nouns: every class name plus every owned property name. Profile
    /// extensions (time-slice classes and the `timeSlice` property) are
    /// already materialized on the graph at this point, so their names
    /// arrive through the same two rules. Verbs: every association name
    /// plus the built-ins. Never fails.
    pub fn from_graph(graph: &SchemaGraph) -> Self {
        let mut nouns = BTreeSet::new();
        for class in &graph.classes {
            nouns.insert(class.name.clone());
            for property in &class.properties {
                nouns.insert(property.name.clone());
            }
        }

        let mut verbs: BTreeSet<String> =
            BUILTIN_VERBS.iter().map(|v| (*v).to_string()).collect();
        for assoc in &graph.associations {
            verbs.insert(assoc.name.clone());
        }

        Self { nouns, verbs }
    }

    pub fn is_noun(&self, token: &str) -> bool {
        self.nouns.contains(token)
    }

    pub fn is_verb(&self, token: &str) -> bool {
        self.verbs.contains(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SchemaGraph;

    fn graph(profile: bool) -> SchemaGraph {
        let mut graph: SchemaGraph = serde_json::from_value(serde_json::json!({
            "name": "v",
            "namespaces": [{ "prefix": "v", "uri": "http://example.org/v" }],
            "profile": { "feature_time_slices": profile },
            "classes": [
                {
                    "name": "Unit",
                    "prefix": "v",
                    "is_feature_type": true,
                    "properties": [{ "name": "designator", "type_name": "CharacterString" }]
                }
            ],
            "associations": []
        }))
        .expect("graph json");
        graph.finalize().expect("finalize");
        graph
    }

    #[test]
    fn nouns_cover_classes_and_properties() {
        let vocab = Vocabulary::from_graph(&graph(false));
        assert!(vocab.is_noun("Unit"));
        assert!(vocab.is_noun("designator"));
        assert!(!vocab.is_noun("UnitTimeSlice"));
        assert!(vocab.is_verb("has"));
        assert!(vocab.is_verb("have"));
    }

    #[test]
    fn profile_extension_contributes_synthetic_nouns() {
        let vocab = Vocabulary::from_graph(&graph(true));
        for noun in [
            "UnitTimeSlice",
            "timeSlice",
            "interpretation",
            "sequenceNumber",
            "correctionNumber",
            "timeSliceMetadata",
            "featureLifetime",
            "validTime",
            "featureMetadata",
        ] {
            assert!(vocab.is_noun(noun), "missing synthetic noun {noun}");
        }
    }
}
