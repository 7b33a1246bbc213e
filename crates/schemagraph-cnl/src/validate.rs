//! Concrete-syntax validation against the schema vocabulary.
//!
//! One pass over the CST that aggregates *every* finding instead of stopping
//! at the first: unknown nouns (each dot-separated segment must be a member
//! of the noun set), unknown verbs, and the ill-defined `should` modality.
//! A non-empty result means the rule is skipped by the pipeline, but all
//! findings are still reported for diagnostic value.

use schemagraph_model::Vocabulary;

use crate::cst::{ClauseCst, ClauseGroupCst, NounPhraseCst, PredicateCst, SentenceCst, Token, ValueCst};
use crate::diagnostics::{Diagnostic, DiagnosticCategory};

pub fn validate_sentence(sentence: &SentenceCst, vocabulary: &Vocabulary) -> Vec<Diagnostic> {
    let mut findings = Vec::new();

    check_noun(&sentence.subject, vocabulary, &mut findings);
    for (_, group) in &sentence.selector {
        check_group(group, vocabulary, &mut findings);
    }

    if sentence.modality.modality.is_ill_defined() {
        findings.push(
            Diagnostic::new(
                DiagnosticCategory::IllDefinedModality,
                "modality `should` has no testable semantics; use `shall` or `must`",
            )
            .with_span(sentence.modality.span),
        );
    }

    check_group(&sentence.statement, vocabulary, &mut findings);
    findings
}

fn check_group(group: &ClauseGroupCst, vocabulary: &Vocabulary, findings: &mut Vec<Diagnostic>) {
    for clause in group.clauses() {
        match clause {
            ClauseCst::Verb(verb) => {
                if !vocabulary.is_verb(&verb.verb.text) {
                    findings.push(
                        Diagnostic::new(
                            DiagnosticCategory::NotAVerb,
                            format!("`{}` is not a verb of this schema", verb.verb.text),
                        )
                        .with_span(verb.verb.span),
                    );
                }
                check_noun_phrase(&verb.object, vocabulary, findings);
            }
            ClauseCst::Be { predicate, .. } => {
                check_predicate(predicate, vocabulary, findings);
            }
        }
    }
}

fn check_noun_phrase(
    phrase: &NounPhraseCst,
    vocabulary: &Vocabulary,
    findings: &mut Vec<Diagnostic>,
) {
    check_noun(&phrase.noun, vocabulary, findings);
    if let Some(predicate) = &phrase.predicate {
        check_predicate(predicate, vocabulary, findings);
    }
    for (_, relative) in &phrase.relatives {
        check_group(relative, vocabulary, findings);
    }
}

fn check_predicate(
    predicate: &PredicateCst,
    vocabulary: &Vocabulary,
    findings: &mut Vec<Diagnostic>,
) {
    match predicate {
        PredicateCst::Comparison {
            value: ValueCst::Noun { noun },
            ..
        } => check_noun(noun, vocabulary, findings),
        PredicateCst::TypeTest { types } => {
            for ty in types {
                check_noun(ty, vocabulary, findings);
            }
        }
        _ => {}
    }
}

fn check_noun(token: &Token, vocabulary: &Vocabulary, findings: &mut Vec<Diagnostic>) {
    for segment in token.segments() {
        if !vocabulary.is_noun(segment) {
            findings.push(
                Diagnostic::new(
                    DiagnosticCategory::NotANoun,
                    format!("`{segment}` is not a noun of this schema"),
                )
                .with_span(token.span),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_sentence;
    use schemagraph_model::{SchemaGraph, Vocabulary};

    fn vocabulary() -> Vocabulary {
        let mut graph: SchemaGraph = serde_json::from_value(serde_json::json!({
            "name": "v",
            "namespaces": [{ "prefix": "v", "uri": "http://example.org/v" }],
            "classes": [
                {
                    "name": "Airport",
                    "prefix": "v",
                    "properties": [
                        { "name": "name", "type_name": "CharacterString" },
                        { "name": "runway", "type_name": "Runway" }
                    ]
                },
                { "name": "Runway", "prefix": "v",
                  "properties": [{ "name": "length", "type_name": "Real" }] }
            ],
            "associations": [
                { "name": "operates", "source": "Airport", "property": "runway" }
            ]
        }))
        .expect("graph json");
        graph.finalize().expect("finalize");
        Vocabulary::from_graph(&graph)
    }

    #[test]
    fn accepts_well_formed_sentence() {
        let s = parse_sentence("Each Airport shall have a runway that has length greater than 0")
            .expect("parse");
        assert!(validate_sentence(&s, &vocabulary()).is_empty());
    }

    #[test]
    fn aggregates_all_findings_in_one_pass() {
        let s = parse_sentence("Each Hangar should possess a tower").expect("parse");
        let findings = validate_sentence(&s, &vocabulary());
        let codes: Vec<&str> = findings.iter().map(|d| d.category.code()).collect();
        assert_eq!(
            codes,
            vec!["NOT_A_NOUN", "ILL_DEFINED_MODALITY", "NOT_A_VERB", "NOT_A_NOUN"]
        );
    }

    #[test]
    fn checks_every_dotted_segment() {
        let s = parse_sentence("Each Airport shall have runway.width equal to 45").expect("parse");
        let findings = validate_sentence(&s, &vocabulary());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category.code(), "NOT_A_NOUN");
        assert!(findings[0].message.contains("`width`"));
    }

    #[test]
    fn builtin_verbs_match_exactly() {
        let s = parse_sentence("Each Airport shall Have a name").expect("parse");
        let findings = validate_sentence(&s, &vocabulary());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category.code(), "NOT_A_VERB");
        assert!(findings[0].message.contains("`Have`"));
    }

    #[test]
    fn association_verbs_are_accepted() {
        let s = parse_sentence("Each Airport shall operates a runway").expect("parse");
        assert!(validate_sentence(&s, &vocabulary()).is_empty());
    }
}
