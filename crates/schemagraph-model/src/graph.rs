//! Schema graph: classes, properties, supertypes, associations, namespaces.
//!
//! The graph is deliberately a *plain data* model (serde structs), mirroring
//! how application schemas describe themselves. Semantic helpers (supertype
//! closure, property lookup through ancestors, association navigability) live
//! on [`SchemaGraph`] and are backed by closures computed once in
//! [`SchemaGraph::finalize`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the implicit indirection property inserted by the time-slice
/// profile (see [`SchemaProfile::feature_time_slices`]).
pub const TIME_SLICE_PROPERTY: &str = "timeSlice";

/// Properties of the synthesized `<Type>TimeSlice` classes, with their
/// (simple) value types.
const TIME_SLICE_FIELDS: &[(&str, &str)] = &[
    ("interpretation", "CharacterString"),
    ("sequenceNumber", "Integer"),
    ("correctionNumber", "Integer"),
    ("timeSliceMetadata", "CharacterString"),
    ("featureLifetime", "TimePeriod"),
    ("validTime", "TimePeriod"),
    ("featureMetadata", "CharacterString"),
];

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("duplicate class `{name}`")]
    DuplicateClass { name: String },
    #[error("class `{class}` references unknown supertype `{supertype}`")]
    UnknownSupertype { class: String, supertype: String },
    #[error("class `{class}` references unknown namespace prefix `{prefix}`")]
    UnknownNamespacePrefix { class: String, prefix: String },
    #[error("association `{association}` references unknown source class `{source_class}`")]
    UnknownAssociationSource {
        association: String,
        source_class: String,
    },
    #[error("association `{association}` references unknown property `{property}` on `{source_class}`")]
    UnknownAssociationProperty {
        association: String,
        source_class: String,
        property: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Namespace {
    pub prefix: String,
    pub uri: String,
}

/// Schema-profile switches that change how the graph is interpreted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaProfile {
    /// When set, every feature type `T` gains a synthesized `TTimeSlice`
    /// class reachable through an implicit `timeSlice` property. This backs
    /// the indirection pattern used by time-sliced schema profiles: rule
    /// authors write verbs against the feature type while the data actually
    /// hangs off its time slices.
    #[serde(default)]
    pub feature_time_slices: bool,
}

/// How an object-valued property's target is reachable in the serialized
/// output.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Containment {
    #[default]
    Inline,
    ByReference,
    InlineOrByReference,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PropertyDef {
    pub name: String,
    /// Value type name. A name that is not a class of the graph is a simple
    /// (leaf) type.
    pub type_name: String,
    /// Nilable / union-wrapped values are serialized with a sibling
    /// nil-reason indicator; the backend absorbs their access into the
    /// owning step.
    #[serde(default)]
    pub nilable: bool,
    #[serde(default)]
    pub containment: Containment,
}

/// One business rule attached to a class.
///
/// Created by the rule loader, consumed exactly once by the pipeline, never
/// mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConstraintRecord {
    pub name: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassDef {
    pub name: String,
    /// Namespace prefix of the class's qualified element name.
    pub prefix: String,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_feature_type: bool,
    #[serde(default)]
    pub supertypes: Vec<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    #[serde(default)]
    pub constraints: Vec<ConstraintRecord>,
}

/// A named association whose navigable end is `property`, owned by `source`.
///
/// The association name doubles as the rule-language verb: `Airline operates
/// flight` resolves `operates` to the navigable-end property.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssociationDef {
    pub name: String,
    pub source: String,
    pub property: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaGraph {
    pub name: String,
    #[serde(default)]
    pub namespaces: Vec<Namespace>,
    #[serde(default)]
    pub profile: SchemaProfile,
    #[serde(default)]
    pub classes: Vec<ClassDef>,
    #[serde(default)]
    pub associations: Vec<AssociationDef>,

    /// Reflexive-transitive supertype closure, keyed by class name.
    /// Populated by [`SchemaGraph::finalize`].
    #[serde(skip)]
    supertypes_of: BTreeMap<String, BTreeSet<String>>,
    /// Reflexive-transitive subtype closure, keyed by class name.
    #[serde(skip)]
    subtypes_of: BTreeMap<String, BTreeSet<String>>,
}

impl SchemaGraph {
    /// Validate cross-references, apply profile extensions and precompute
    /// the type closures. Must be called once before any lookup.
    pub fn finalize(&mut self) -> Result<(), ModelError> {
        if self.profile.feature_time_slices {
            self.materialize_time_slices();
        }

        let mut seen = BTreeSet::new();
        for class in &self.classes {
            if !seen.insert(class.name.clone()) {
                return Err(ModelError::DuplicateClass {
                    name: class.name.clone(),
                });
            }
            if self.namespace_uri(&class.prefix).is_none() {
                return Err(ModelError::UnknownNamespacePrefix {
                    class: class.name.clone(),
                    prefix: class.prefix.clone(),
                });
            }
            for sup in &class.supertypes {
                if !seen_or_declared(&self.classes, sup) {
                    return Err(ModelError::UnknownSupertype {
                        class: class.name.clone(),
                        supertype: sup.clone(),
                    });
                }
            }
        }

        for assoc in &self.associations {
            let Some(source) = self.class(&assoc.source) else {
                return Err(ModelError::UnknownAssociationSource {
                    association: assoc.name.clone(),
                    source_class: assoc.source.clone(),
                });
            };
            if !source.properties.iter().any(|p| p.name == assoc.property) {
                return Err(ModelError::UnknownAssociationProperty {
                    association: assoc.name.clone(),
                    source_class: assoc.source.clone(),
                    property: assoc.property.clone(),
                });
            }
        }

        self.compute_closures();
        Ok(())
    }

    /// Synthesize `<Type>TimeSlice` classes and the `timeSlice` indirection
    /// property for every feature type.
    fn materialize_time_slices(&mut self) {
        let mut additions = Vec::new();
        for class in &mut self.classes {
            if !class.is_feature_type {
                continue;
            }
            let slice_name = format!("{}TimeSlice", class.name);
            if class.properties.iter().all(|p| p.name != TIME_SLICE_PROPERTY) {
                class.properties.push(PropertyDef {
                    name: TIME_SLICE_PROPERTY.to_string(),
                    type_name: slice_name.clone(),
                    nilable: false,
                    containment: Containment::Inline,
                });
            }
            additions.push(ClassDef {
                name: slice_name,
                prefix: class.prefix.clone(),
                is_abstract: false,
                is_feature_type: false,
                supertypes: vec![],
                properties: TIME_SLICE_FIELDS
                    .iter()
                    .map(|(name, ty)| PropertyDef {
                        name: (*name).to_string(),
                        type_name: (*ty).to_string(),
                        nilable: false,
                        containment: Containment::Inline,
                    })
                    .collect(),
                constraints: vec![],
            });
        }
        // Idempotent: skip slices that already exist (e.g. finalize re-run).
        for add in additions {
            if self.class(&add.name).is_none() {
                self.classes.push(add);
            }
        }
    }

    fn compute_closures(&mut self) {
        let mut supers: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for class in &self.classes {
            let mut closure = BTreeSet::new();
            let mut stack = vec![class.name.clone()];
            while let Some(current) = stack.pop() {
                if !closure.insert(current.clone()) {
                    continue;
                }
                if let Some(def) = self.class(&current) {
                    stack.extend(def.supertypes.iter().cloned());
                }
            }
            supers.insert(class.name.clone(), closure);
        }

        let mut subs: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (class, closure) in &supers {
            for sup in closure {
                subs.entry(sup.clone()).or_default().insert(class.clone());
            }
        }
        self.supertypes_of = supers;
        self.subtypes_of = subs;
    }

    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// A type name that is not a class of the graph is a simple (leaf) type.
    pub fn is_simple_type(&self, type_name: &str) -> bool {
        self.class(type_name).is_none()
    }

    pub fn is_subtype_of(&self, sub: &str, sup: &str) -> bool {
        self.supertypes_of
            .get(sub)
            .map(|s| s.contains(sup))
            .unwrap_or(sub == sup)
    }

    /// Reflexive-transitive subtype closure of `name`, lexically sorted.
    pub fn subtypes_or_self(&self, name: &str) -> Vec<&ClassDef> {
        self.subtypes_of
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(|n| self.class(n))
            .collect()
    }

    /// Concrete (non-abstract) classes in the hierarchies of `names`,
    /// deduplicated and lexically sorted. This is the candidate set a type
    /// test compiles against.
    pub fn concrete_candidates(&self, names: &[String]) -> Vec<&ClassDef> {
        let mut out: BTreeMap<&str, &ClassDef> = BTreeMap::new();
        for name in names {
            for class in self.subtypes_or_self(name) {
                if !class.is_abstract {
                    out.insert(class.name.as_str(), class);
                }
            }
        }
        out.into_values().collect()
    }

    /// Look up `property` on `class`, searching the supertype closure.
    /// Returns the owning class together with the definition.
    pub fn property(&self, class: &str, property: &str) -> Option<(&ClassDef, &PropertyDef)> {
        if let Some(owner) = self.class(class) {
            if let Some(def) = owner.properties.iter().find(|p| p.name == property) {
                return Some((owner, def));
            }
        }
        let closure = self.supertypes_of.get(class)?;
        for owner_name in closure {
            if let Some(owner) = self.class(owner_name) {
                if let Some(def) = owner.properties.iter().find(|p| p.name == property) {
                    return Some((owner, def));
                }
            }
        }
        None
    }

    /// Resolve a verb to an association navigable from `class` (the source
    /// must be `class` or one of its supertypes). Returns the navigable-end
    /// property with its owning class.
    pub fn association_property(
        &self,
        class: &str,
        verb: &str,
    ) -> Option<(&ClassDef, &PropertyDef)> {
        let assoc = self
            .associations
            .iter()
            .find(|a| a.name == verb && self.is_subtype_of(class, &a.source))?;
        self.property(&assoc.source, &assoc.property)
    }

    pub fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        self.namespaces
            .iter()
            .find(|n| n.prefix == prefix)
            .map(|n| n.uri.as_str())
    }

    /// Qualified element name of a class (`prefix:Name`).
    pub fn qname(&self, class: &ClassDef) -> String {
        format!("{}:{}", class.prefix, class.name)
    }
}

fn seen_or_declared(classes: &[ClassDef], name: &str) -> bool {
    classes.iter().any(|c| c.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn airport_graph() -> SchemaGraph {
        let mut graph: SchemaGraph = serde_json::from_value(serde_json::json!({
            "name": "airports",
            "namespaces": [{ "prefix": "apt", "uri": "http://example.org/apt" }],
            "classes": [
                {
                    "name": "Feature",
                    "prefix": "apt",
                    "is_abstract": true,
                    "properties": [{ "name": "description", "type_name": "CharacterString" }]
                },
                {
                    "name": "Airport",
                    "prefix": "apt",
                    "supertypes": ["Feature"],
                    "properties": [
                        { "name": "name", "type_name": "CharacterString" },
                        { "name": "runway", "type_name": "Runway" }
                    ]
                },
                {
                    "name": "Runway",
                    "prefix": "apt",
                    "properties": [{ "name": "length", "type_name": "Real" }]
                }
            ],
            "associations": [
                { "name": "operates", "source": "Airport", "property": "runway" }
            ]
        }))
        .expect("graph json");
        graph.finalize().expect("finalize");
        graph
    }

    #[test]
    fn property_lookup_searches_ancestors() {
        let graph = airport_graph();
        let (owner, def) = graph.property("Airport", "description").expect("inherited");
        assert_eq!(owner.name, "Feature");
        assert_eq!(def.type_name, "CharacterString");
    }

    #[test]
    fn association_resolves_navigable_end() {
        let graph = airport_graph();
        let (owner, def) = graph.association_property("Airport", "operates").expect("assoc");
        assert_eq!(owner.name, "Airport");
        assert_eq!(def.name, "runway");
        assert!(graph.association_property("Runway", "operates").is_none());
    }

    #[test]
    fn concrete_candidates_skip_abstract_classes() {
        let graph = airport_graph();
        let candidates = graph.concrete_candidates(&["Feature".to_string()]);
        let names: Vec<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Airport"]);
    }

    #[test]
    fn finalize_rejects_dangling_supertype() {
        let mut graph: SchemaGraph = serde_json::from_value(serde_json::json!({
            "name": "broken",
            "namespaces": [{ "prefix": "x", "uri": "http://example.org/x" }],
            "classes": [{ "name": "A", "prefix": "x", "supertypes": ["Ghost"] }]
        }))
        .expect("graph json");
        let err = graph.finalize().unwrap_err();
        assert!(err.to_string().contains("unknown supertype `Ghost`"));
    }

    #[test]
    fn finalize_rejects_dangling_association() {
        let mut graph: SchemaGraph = serde_json::from_value(serde_json::json!({
            "name": "broken",
            "namespaces": [{ "prefix": "x", "uri": "http://example.org/x" }],
            "classes": [{ "name": "A", "prefix": "x" }],
            "associations": [{ "name": "owns", "source": "Ghost", "property": "b" }]
        }))
        .expect("graph json");
        let err = graph.finalize().unwrap_err();
        assert!(err.to_string().contains("unknown source class `Ghost`"));
        // An association error must stay a leaf, not chain a cause.
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn time_slice_profile_materializes_indirection() {
        let mut graph: SchemaGraph = serde_json::from_value(serde_json::json!({
            "name": "aero",
            "namespaces": [{ "prefix": "a", "uri": "http://example.org/a" }],
            "profile": { "feature_time_slices": true },
            "classes": [{ "name": "Navaid", "prefix": "a", "is_feature_type": true }]
        }))
        .expect("graph json");
        graph.finalize().expect("finalize");

        let (_, slice) = graph.property("Navaid", TIME_SLICE_PROPERTY).expect("timeSlice");
        assert_eq!(slice.type_name, "NavaidTimeSlice");
        let (_, interp) = graph
            .property("NavaidTimeSlice", "interpretation")
            .expect("interpretation");
        assert!(graph.is_simple_type(&interp.type_name));
    }
}
