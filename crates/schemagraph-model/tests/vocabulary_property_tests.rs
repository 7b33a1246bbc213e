use proptest::prelude::*;

use schemagraph_model::{
    AssociationDef, ClassDef, Namespace, PropertyDef, SchemaGraph, Vocabulary,
};

const MAX_CLASSES: usize = 8;
const MAX_PROPS: usize = 5;

fn ident_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{1,6}"
}

fn graph_strategy() -> impl Strategy<Value = SchemaGraph> {
    prop::collection::btree_set(ident_strategy(), 1..=MAX_CLASSES).prop_flat_map(|names| {
        let names: Vec<String> = names.into_iter().collect();
        let count = names.len();
        prop::collection::vec(
            prop::collection::vec("[a-z]{1,6}", 0..=MAX_PROPS),
            count..=count,
        )
        .prop_map(move |props_per_class| {
            let classes: Vec<ClassDef> = names
                .iter()
                .zip(props_per_class)
                .map(|(name, props)| ClassDef {
                    name: name.clone(),
                    prefix: "t".to_string(),
                    is_abstract: false,
                    is_feature_type: false,
                    supertypes: vec![],
                    properties: props
                        .into_iter()
                        .map(|p| PropertyDef {
                            name: p,
                            type_name: "CharacterString".to_string(),
                            nilable: false,
                            containment: Default::default(),
                        })
                        .collect(),
                    constraints: vec![],
                })
                .collect();
            let associations: Vec<AssociationDef> = classes
                .iter()
                .filter(|c| !c.properties.is_empty())
                .map(|c| AssociationDef {
                    name: format!("uses_{}", c.name.to_lowercase()),
                    source: c.name.clone(),
                    property: c.properties[0].name.clone(),
                })
                .collect();
            let mut graph = SchemaGraph::default();
            graph.name = "prop".to_string();
            graph.namespaces = vec![Namespace {
                prefix: "t".to_string(),
                uri: "http://example.org/t".to_string(),
            }];
            graph.classes = classes;
            graph.associations = associations;
            graph.finalize().expect("finalize generated graph");
            graph
        })
    })
}

proptest! {
    /// Derivation is a pure function of the graph: rebuilding yields an
    /// identical vocabulary.
    #[test]
    fn vocabulary_is_deterministic(graph in graph_strategy()) {
        let a = Vocabulary::from_graph(&graph);
        let b = Vocabulary::from_graph(&graph);
        prop_assert_eq!(a, b);
    }

    /// Declaration order of classes never leaks into the derived sets.
    #[test]
    fn vocabulary_ignores_declaration_order(graph in graph_strategy()) {
        let baseline = Vocabulary::from_graph(&graph);

        let mut reversed = graph.clone();
        reversed.classes.reverse();
        reversed.associations.reverse();
        reversed.finalize().expect("finalize reversed graph");

        prop_assert_eq!(baseline, Vocabulary::from_graph(&reversed));
    }

    /// Every noun comes from a class or property name; every verb from an
    /// association name or a built-in.
    #[test]
    fn vocabulary_is_sound(graph in graph_strategy()) {
        let vocab = Vocabulary::from_graph(&graph);
        for noun in &vocab.nouns {
            let from_class = graph.classes.iter().any(|c| &c.name == noun);
            let from_prop = graph
                .classes
                .iter()
                .flat_map(|c| &c.properties)
                .any(|p| &p.name == noun);
            prop_assert!(from_class || from_prop, "stray noun {}", noun);
        }
        for verb in &vocab.verbs {
            let builtin = verb == "has" || verb == "have";
            let from_assoc = graph.associations.iter().any(|a| &a.name == verb);
            prop_assert!(builtin || from_assoc, "stray verb {}", verb);
        }
    }
}
