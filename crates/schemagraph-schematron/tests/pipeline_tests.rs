use schemagraph_cnl::DiagnosticCategory;
use schemagraph_model::SchemaGraph;
use schemagraph_schematron::{check_schema, compile_schema, XpathConfig};

fn graph_with_rules(rules: serde_json::Value) -> SchemaGraph {
    let mut graph: SchemaGraph = serde_json::from_value(serde_json::json!({
        "name": "facilities",
        "namespaces": [{ "prefix": "ns", "uri": "http://example.org/ns" }],
        "classes": [
            {
                "name": "Building",
                "prefix": "ns",
                "properties": [
                    { "name": "height", "type_name": "Real" },
                    { "name": "storeys", "type_name": "Integer" }
                ],
                "constraints": rules
            },
            {
                "name": "City",
                "prefix": "ns",
                "properties": [{ "name": "name", "type_name": "CharacterString" }],
                "constraints": [
                    { "name": "city_name", "text": "Each City shall have a name" }
                ]
            }
        ],
        "associations": [
            { "name": "owns", "source": "City", "property": "name" }
        ]
    }))
    .expect("graph json");
    graph.finalize().expect("finalize");
    graph
}

#[test]
fn rules_for_one_class_share_a_rule_container_sorted_by_name() {
    let graph = graph_with_rules(serde_json::json!([
        { "name": "b_storeys", "text": "Each Building shall have storeys greater than 0" },
        { "name": "a_height", "text": "Each Building shall have height greater than 0" }
    ]));
    let outcome = compile_schema(&graph, &XpathConfig::default());
    assert_eq!(outcome.compiled, 3);
    assert_eq!(outcome.skipped, 0);

    let document = outcome.document.expect("document");
    let building = document
        .rules()
        .iter()
        .find(|r| r.context == "ns:Building")
        .expect("building rule");
    let ids: Vec<_> = building.asserts.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, ["a_height", "b_storeys"]);
}

#[test]
fn simple_comparison_rule_compiles_to_a_relative_test() {
    let graph = graph_with_rules(serde_json::json!([
        { "name": "height_positive", "text": "Each Building shall have height greater than 0" }
    ]));
    let outcome = compile_schema(&graph, &XpathConfig::default());
    let document = outcome.document.expect("document");
    let building = document
        .rules()
        .iter()
        .find(|r| r.context == "ns:Building")
        .expect("building rule");
    assert_eq!(building.asserts[0].test, "ns:height > 0");
}

#[test]
fn unresolvable_verb_skips_only_the_offending_rule() {
    // `owns` is a vocabulary verb (an association exists), but it is not
    // navigable from Building.
    let graph = graph_with_rules(serde_json::json!([
        { "name": "bad_verb", "text": "Each Building shall owns a name" },
        { "name": "height_positive", "text": "Each Building shall have height greater than 0" }
    ]));
    let outcome = compile_schema(&graph, &XpathConfig::default());
    assert_eq!(outcome.compiled, 2);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(
        outcome.diagnostics[0].category,
        DiagnosticCategory::VerbUnknownInContext
    );
    assert_eq!(outcome.diagnostics[0].rule.as_deref(), Some("bad_verb"));
    assert_eq!(outcome.diagnostics[0].class.as_deref(), Some("Building"));

    let document = outcome.document.expect("document");
    let building = document
        .rules()
        .iter()
        .find(|r| r.context == "ns:Building")
        .expect("building rule");
    assert_eq!(building.asserts.len(), 1);
    assert_eq!(building.asserts[0].id, "height_positive");
}

#[test]
fn vocabulary_error_isolates_the_rule() {
    let graph = graph_with_rules(serde_json::json!([
        { "name": "bad_noun", "text": "Each Building shall have a basement" },
        { "name": "height_positive", "text": "Each Building shall have height greater than 0" }
    ]));
    let outcome = compile_schema(&graph, &XpathConfig::default());
    assert_eq!(outcome.compiled, 2);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.diagnostics[0].category, DiagnosticCategory::NotANoun);

    let document = outcome.document.expect("document");
    let total: usize = document.rules().iter().map(|r| r.asserts.len()).sum();
    assert_eq!(total, 2);
}

#[test]
fn no_document_when_nothing_compiles() {
    let mut graph: SchemaGraph = serde_json::from_value(serde_json::json!({
        "name": "broken",
        "namespaces": [{ "prefix": "ns", "uri": "http://example.org/ns" }],
        "classes": [
            {
                "name": "Building",
                "prefix": "ns",
                "constraints": [
                    { "name": "bad", "text": "Each Building should have a roof" }
                ]
            }
        ]
    }))
    .expect("graph json");
    graph.finalize().expect("finalize");

    let outcome = compile_schema(&graph, &XpathConfig::default());
    assert!(outcome.document.is_none());
    assert_eq!(outcome.compiled, 0);
    assert_eq!(outcome.skipped, 1);
    assert!(outcome
        .diagnostics
        .iter()
        .any(|d| d.category == DiagnosticCategory::IllDefinedModality
            || d.category == DiagnosticCategory::NotANoun));
}

#[test]
fn frontend_check_passes_rules_the_backend_rejects() {
    let mut graph: SchemaGraph = serde_json::from_value(serde_json::json!({
        "name": "split",
        "namespaces": [{ "prefix": "ns", "uri": "http://example.org/ns" }],
        "classes": [
            {
                "name": "City",
                "prefix": "ns",
                "properties": [{ "name": "building", "type_name": "Building" }],
                "constraints": [
                    { "name": "odd_compare", "text": "Each City shall have building equal to 'X'" }
                ]
            },
            { "name": "Building", "prefix": "ns" }
        ]
    }))
    .expect("graph json");
    graph.finalize().expect("finalize");

    // Comparing an object value to a string is out of the query dialect's
    // reach, but the rule text itself is well formed.
    let checked = check_schema(&graph);
    assert_eq!(checked.checked, 1);
    assert_eq!(checked.skipped, 0);
    assert!(checked.diagnostics.is_empty());

    let compiled = compile_schema(&graph, &XpathConfig::default());
    assert_eq!(compiled.compiled, 0);
    assert_eq!(compiled.skipped, 1);
    assert_eq!(
        compiled.diagnostics[0].category,
        DiagnosticCategory::ImplementationRestriction
    );
}

#[test]
fn assertion_text_prefers_rule_comments() {
    let graph = graph_with_rules(serde_json::json!([
        {
            "name": "height_positive",
            "text": "Each Building shall have height greater than 0",
            "comments": "Buildings must rise above ground level."
        }
    ]));
    let outcome = compile_schema(&graph, &XpathConfig::default());
    let document = outcome.document.expect("document");
    let building = document
        .rules()
        .iter()
        .find(|r| r.context == "ns:Building")
        .expect("building rule");
    assert_eq!(
        building.asserts[0].text,
        "Buildings must rise above ground level."
    );
}

#[test]
fn serialized_document_declares_namespaces_and_groups_rules() {
    let graph = graph_with_rules(serde_json::json!([
        { "name": "height_positive", "text": "Each Building shall have height greater than 0" }
    ]));
    let outcome = compile_schema(&graph, &XpathConfig::default());
    let xml = outcome.document.expect("document").to_xml().expect("xml");
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains("<sch:schema xmlns:sch=\"http://purl.oclc.org/dsdl/schematron\" queryBinding=\"xslt2\">"));
    assert!(xml.contains("<sch:title>facilities</sch:title>"));
    assert!(xml.contains("<sch:ns prefix=\"ns\" uri=\"http://example.org/ns\"/>"));
    assert!(xml.contains("<sch:rule context=\"ns:Building\">"));
    assert!(xml.contains("<sch:assert id=\"height_positive\""));
}
