//! Categorized findings for IDE-style reporting.
//!
//! Every failure that is scoped to a single rule becomes a [`Diagnostic`]:
//! category + message + optional offending-text span + the rule name and
//! owning class once the pipeline attaches them. Diagnostics are values, not
//! errors; the pipeline collects them and moves on to the next rule.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCategory {
    /// Malformed token stream (rule text did not parse).
    Syntax,
    NotANoun,
    NotAVerb,
    IllDefinedModality,
    UnknownClass,
    UnknownProperty,
    UnknownPropertyType,
    /// A dotted-noun segment matched neither a subtype nor a property.
    UnknownSchemaCall,
    VerbUnknownInContext,
    VerbInvalidForPredicate,
    AmbiguousContext,
    MixOfAndAndOr,
    /// The backend cannot express this construct in the target query
    /// language.
    ImplementationRestriction,
}

impl DiagnosticCategory {
    pub fn code(self) -> &'static str {
        match self {
            Self::Syntax => "SYNTAX",
            Self::NotANoun => "NOT_A_NOUN",
            Self::NotAVerb => "NOT_A_VERB",
            Self::IllDefinedModality => "ILL_DEFINED_MODALITY",
            Self::UnknownClass => "UNKNOWN_CLASS",
            Self::UnknownProperty => "UNKNOWN_PROPERTY",
            Self::UnknownPropertyType => "UNKNOWN_PROPERTY_TYPE",
            Self::UnknownSchemaCall => "UNKNOWN_SCHEMA_CALL",
            Self::VerbUnknownInContext => "VERB_UNKNOWN_IN_CONTEXT",
            Self::VerbInvalidForPredicate => "VERB_INVALID_FOR_PREDICATE",
            Self::AmbiguousContext => "AMBIGUOUS_CONTEXT",
            Self::MixOfAndAndOr => "MIX_OF_AND_AND_OR",
            Self::ImplementationRestriction => "IMPLEMENTATION_RESTRICTION",
        }
    }
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub message: String,
    /// Character span into the rule text, when the finding points at a
    /// concrete token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<(usize, usize)>,
    /// Rule name, attached by the pipeline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    /// Owning class, attached by the pipeline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

impl Diagnostic {
    pub fn new(category: DiagnosticCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            span: None,
            rule: None,
            class: None,
        }
    }

    pub fn with_span(mut self, span: (usize, usize)) -> Self {
        self.span = Some(span);
        self
    }

    pub fn for_rule(mut self, rule: &str, class: &str) -> Self {
        self.rule = Some(rule.to_string());
        self.class = Some(class.to_string());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.message)?;
        if let (Some(rule), Some(class)) = (&self.rule, &self.class) {
            write!(f, " (rule `{rule}` on `{class}`)")?;
        }
        if let Some((start, end)) = self.span {
            write!(f, " at {start}..{end}")?;
        }
        Ok(())
    }
}
