//! The per-schema compilation pipeline.
//!
//! Classes are visited in lexical order and each class's constraints are
//! sorted by name before compilation, so repeated runs over the same schema
//! produce byte-identical documents. Every failure is scoped to one rule:
//! the rule contributes nothing and the pipeline moves on.

use schemagraph_cnl::{parse_sentence, validate_sentence, Diagnostic, DiagnosticCategory};
use schemagraph_fol::{FolBuilder, Quantification};
use schemagraph_model::{ClassDef, ConstraintRecord, SchemaGraph, Vocabulary};

use crate::document::{Assertion, SchematronDocument};
use crate::lower::Lowering;
use crate::xpath::{TranslationContext, XpathConfig, XpathTranslator};

/// Result of compiling one schema: the document (absent when no rule
/// compiled) plus every diagnostic gathered along the way.
#[derive(Debug)]
pub struct CompileOutcome {
    pub document: Option<SchematronDocument>,
    pub diagnostics: Vec<Diagnostic>,
    pub compiled: usize,
    pub skipped: usize,
}

pub fn compile_schema(graph: &SchemaGraph, config: &XpathConfig) -> CompileOutcome {
    let vocabulary = Vocabulary::from_graph(graph);
    let mut document = SchematronDocument::new(graph.name.clone(), config.query_binding.clone());
    let mut diagnostics = Vec::new();
    let mut compiled = 0usize;
    let mut skipped = 0usize;

    let mut classes: Vec<&ClassDef> = graph
        .classes
        .iter()
        .filter(|c| !c.constraints.is_empty())
        .collect();
    classes.sort_by(|a, b| a.name.cmp(&b.name));

    for class in classes {
        let context = graph.qname(class);
        let mut constraints: Vec<&ConstraintRecord> = class.constraints.iter().collect();
        constraints.sort_by(|a, b| a.name.cmp(&b.name));

        for constraint in constraints {
            match compile_rule(graph, &vocabulary, config, class, constraint) {
                Ok((test, prefixes)) => {
                    tracing::debug!(rule = %constraint.name, class = %class.name, %test, "rule compiled");
                    let text = constraint
                        .comments
                        .clone()
                        .unwrap_or_else(|| constraint.text.clone());
                    document.add_assert(
                        graph,
                        &context,
                        Assertion {
                            id: constraint.name.clone(),
                            test,
                            text,
                        },
                        &prefixes,
                    );
                    compiled += 1;
                }
                Err(found) => {
                    skipped += 1;
                    for diagnostic in found {
                        tracing::warn!(rule = %constraint.name, class = %class.name, %diagnostic, "rule skipped");
                        diagnostics.push(diagnostic.for_rule(&constraint.name, &class.name));
                    }
                }
            }
        }
    }

    CompileOutcome {
        document: if document.is_empty() {
            None
        } else {
            Some(document)
        },
        diagnostics,
        compiled,
        skipped,
    }
}

/// Outcome of the frontend-only pass over a schema: parsing, vocabulary
/// validation and FOL construction, without lowering or XPath emission.
#[derive(Debug)]
pub struct CheckOutcome {
    pub diagnostics: Vec<Diagnostic>,
    pub checked: usize,
    pub skipped: usize,
}

/// Runs the frontend over every rule of the schema. A rule that the
/// backend would reject (an unsupported query shape) still passes here.
pub fn check_schema(graph: &SchemaGraph) -> CheckOutcome {
    let vocabulary = Vocabulary::from_graph(graph);
    let mut diagnostics = Vec::new();
    let mut checked = 0usize;
    let mut skipped = 0usize;

    let mut classes: Vec<&ClassDef> = graph
        .classes
        .iter()
        .filter(|c| !c.constraints.is_empty())
        .collect();
    classes.sort_by(|a, b| a.name.cmp(&b.name));

    for class in classes {
        let mut constraints: Vec<&ConstraintRecord> = class.constraints.iter().collect();
        constraints.sort_by(|a, b| a.name.cmp(&b.name));

        for constraint in constraints {
            match build_rule_fol(graph, &vocabulary, class, constraint) {
                Ok(_) => checked += 1,
                Err(found) => {
                    skipped += 1;
                    for diagnostic in found {
                        diagnostics.push(diagnostic.for_rule(&constraint.name, &class.name));
                    }
                }
            }
        }
    }

    CheckOutcome {
        diagnostics,
        checked,
        skipped,
    }
}

/// The shared frontend: rule text to FOL tree. Any failure aborts this
/// rule only.
fn build_rule_fol(
    graph: &SchemaGraph,
    vocabulary: &Vocabulary,
    class: &ClassDef,
    constraint: &ConstraintRecord,
) -> Result<Quantification, Vec<Diagnostic>> {
    let sentence = parse_sentence(&constraint.text).map_err(|e| {
        vec![Diagnostic::new(DiagnosticCategory::Syntax, e.message.clone())
            .with_span((e.offset, e.offset))]
    })?;

    let findings = validate_sentence(&sentence, vocabulary);
    if !findings.is_empty() {
        return Err(findings);
    }

    FolBuilder::new(graph)
        .build_sentence(&sentence, &class.name)
        .map_err(|e| vec![Diagnostic::from(e)])
}

/// Compiles one rule to its XPath test and the namespace prefixes the test
/// uses.
fn compile_rule(
    graph: &SchemaGraph,
    vocabulary: &Vocabulary,
    config: &XpathConfig,
    class: &ClassDef,
    constraint: &ConstraintRecord,
) -> Result<(String, Vec<String>), Vec<Diagnostic>> {
    let fol = build_rule_fol(graph, vocabulary, class, constraint)?;

    let ir = Lowering::new(graph).lower_rule(&fol);
    let mut errors = Vec::new();
    ir.collect_errors(&mut errors);
    if !errors.is_empty() {
        return Err(errors
            .into_iter()
            .map(|e| {
                Diagnostic::new(
                    DiagnosticCategory::ImplementationRestriction,
                    e.message.clone(),
                )
            })
            .collect());
    }

    let mut ctx = TranslationContext::new();
    let fragment = XpathTranslator::new(config).translate_rule(&ir, &mut ctx);
    Ok((fragment.text, ctx.used_prefixes().to_vec()))
}
