//! ISO-Schematron document assembly and XML emission.
//!
//! Assertions are grouped by the qualified element name of their owning
//! class: the first assertion for a class creates the `<rule>` container,
//! later ones append to it. The namespace table grows on demand as
//! qualified names are emitted; each new prefix contributes one `<ns>`
//! declaration, in first-use order.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;

use schemagraph_model::{Namespace, SchemaGraph};

const SCHEMATRON_NS: &str = "http://purl.oclc.org/dsdl/schematron";

// Instance-document namespaces the generated tests may reference without
// the schema graph declaring them.
const BUILTIN_NAMESPACES: &[(&str, &str)] = &[
    ("xsi", "http://www.w3.org/2001/XMLSchema-instance"),
    ("gml", "http://www.opengis.net/gml/3.2"),
    ("xlink", "http://www.w3.org/1999/xlink"),
];

#[derive(Debug, Error)]
pub enum SchematronError {
    #[error("failed to serialize schematron document: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("serialized document is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Prefix-to-URI table, populated as emission proceeds.
#[derive(Debug, Default)]
pub struct NamespaceRegistry {
    entries: Vec<Namespace>,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `prefix` on first use. URIs come from the schema graph
    /// first, then from the builtin instance-document table.
    pub fn note(&mut self, prefix: &str, graph: &SchemaGraph) {
        if self.entries.iter().any(|n| n.prefix == prefix) {
            return;
        }
        let uri = graph.namespace_uri(prefix).map(str::to_string).or_else(|| {
            BUILTIN_NAMESPACES
                .iter()
                .find(|(p, _)| *p == prefix)
                .map(|(_, uri)| (*uri).to_string())
        });
        match uri {
            Some(uri) => self.entries.push(Namespace {
                prefix: prefix.to_string(),
                uri,
            }),
            None => tracing::warn!(prefix, "no namespace URI known for prefix"),
        }
    }

    pub fn entries(&self) -> &[Namespace] {
        &self.entries
    }
}

#[derive(Debug, Clone)]
pub struct Assertion {
    pub id: String,
    pub test: String,
    pub text: String,
}

#[derive(Debug)]
pub struct RuleBlock {
    pub context: String,
    pub asserts: Vec<Assertion>,
}

#[derive(Debug)]
pub struct SchematronDocument {
    title: String,
    query_binding: String,
    namespaces: NamespaceRegistry,
    rules: Vec<RuleBlock>,
}

impl SchematronDocument {
    pub fn new(title: impl Into<String>, query_binding: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            query_binding: query_binding.into(),
            namespaces: NamespaceRegistry::new(),
            rules: Vec::new(),
        }
    }

    /// Appends one compiled assertion under the rule container for
    /// `context`, creating the container on first use, and registers every
    /// namespace prefix the assertion's test referenced.
    pub fn add_assert(
        &mut self,
        graph: &SchemaGraph,
        context: &str,
        assertion: Assertion,
        used_prefixes: &[String],
    ) {
        if let Some((prefix, _)) = context.split_once(':') {
            self.namespaces.note(prefix, graph);
        }
        for prefix in used_prefixes {
            self.namespaces.note(prefix, graph);
        }
        match self.rules.iter_mut().find(|r| r.context == context) {
            Some(rule) => rule.asserts.push(assertion),
            None => self.rules.push(RuleBlock {
                context: context.to_string(),
                asserts: vec![assertion],
            }),
        }
    }

    /// True when no rule compiled; an empty document is never written.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[RuleBlock] {
        &self.rules
    }

    pub fn to_xml(&self) -> Result<String, SchematronError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut schema = BytesStart::new("sch:schema");
        schema.push_attribute(("xmlns:sch", SCHEMATRON_NS));
        schema.push_attribute(("queryBinding", self.query_binding.as_str()));
        writer.write_event(Event::Start(schema))?;

        writer.write_event(Event::Start(BytesStart::new("sch:title")))?;
        writer.write_event(Event::Text(BytesText::new(&self.title)))?;
        writer.write_event(Event::End(BytesEnd::new("sch:title")))?;

        for ns in self.namespaces.entries() {
            let mut el = BytesStart::new("sch:ns");
            el.push_attribute(("prefix", ns.prefix.as_str()));
            el.push_attribute(("uri", ns.uri.as_str()));
            writer.write_event(Event::Empty(el))?;
        }

        writer.write_event(Event::Start(BytesStart::new("sch:pattern")))?;
        for rule in &self.rules {
            let mut el = BytesStart::new("sch:rule");
            el.push_attribute(("context", rule.context.as_str()));
            writer.write_event(Event::Start(el))?;
            for assert in &rule.asserts {
                let mut el = BytesStart::new("sch:assert");
                el.push_attribute(("id", assert.id.as_str()));
                el.push_attribute(("test", assert.test.as_str()));
                writer.write_event(Event::Start(el))?;
                writer.write_event(Event::Text(BytesText::new(&assert.text)))?;
                writer.write_event(Event::End(BytesEnd::new("sch:assert")))?;
            }
            writer.write_event(Event::End(BytesEnd::new("sch:rule")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("sch:pattern")))?;

        writer.write_event(Event::End(BytesEnd::new("sch:schema")))?;
        Ok(String::from_utf8(writer.into_inner())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_graph() -> SchemaGraph {
        let mut graph = SchemaGraph::default();
        graph.name = "t".to_string();
        graph.namespaces = vec![Namespace {
            prefix: "t".to_string(),
            uri: "http://example.org/t".to_string(),
        }];
        graph.finalize().expect("finalize");
        graph
    }

    fn assertion(id: &str) -> Assertion {
        Assertion {
            id: id.to_string(),
            test: "true()".to_string(),
            text: format!("rule {id}"),
        }
    }

    #[test]
    fn asserts_for_one_context_share_a_rule_container() {
        let graph = empty_graph();
        let mut doc = SchematronDocument::new("t", "xslt2");
        doc.add_assert(&graph, "t:Airport", assertion("r1"), &[]);
        doc.add_assert(&graph, "t:Airport", assertion("r2"), &[]);
        doc.add_assert(&graph, "t:Runway", assertion("r3"), &[]);

        assert_eq!(doc.rules().len(), 2);
        assert_eq!(doc.rules()[0].context, "t:Airport");
        assert_eq!(doc.rules()[0].asserts.len(), 2);
        assert_eq!(doc.rules()[1].asserts.len(), 1);
    }

    #[test]
    fn namespace_declarations_appear_once_in_first_use_order() {
        let graph = empty_graph();
        let mut doc = SchematronDocument::new("t", "xslt2");
        doc.add_assert(
            &graph,
            "t:Airport",
            assertion("r1"),
            &["xsi".to_string(), "t".to_string(), "xsi".to_string()],
        );
        let prefixes: Vec<_> = doc
            .namespaces
            .entries()
            .iter()
            .map(|n| n.prefix.as_str())
            .collect();
        assert_eq!(prefixes, ["t", "xsi"]);
    }

    #[test]
    fn xml_escapes_attribute_values() {
        let graph = empty_graph();
        let mut doc = SchematronDocument::new("t", "xslt2");
        doc.add_assert(
            &graph,
            "t:Airport",
            Assertion {
                id: "r1".to_string(),
                test: "count(t:runway) <= 4".to_string(),
                text: "at most four runways".to_string(),
            },
            &[],
        );
        let xml = doc.to_xml().expect("serialize");
        assert!(xml.contains("queryBinding=\"xslt2\""));
        assert!(xml.contains("count(t:runway) &lt;= 4"));
        assert!(xml.contains("<sch:rule context=\"t:Airport\">"));
    }
}
