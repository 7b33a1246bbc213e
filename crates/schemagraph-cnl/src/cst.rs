//! Concrete syntax tree of the rule language.
//!
//! Closed sum types over the token set {verb, noun, quantifier, comparator,
//! modality}. The tree is purely syntactic: nouns are still raw (possibly
//! dotted) tokens, verbs are raw tokens, no schema resolution has happened.
//! Connectives are preserved positionally so the FOL builder can reject
//! mixed `and`/`or` at one level.

use serde::Serialize;

/// A raw noun/verb token with its character span in the rule text.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub span: (usize, usize),
}

impl Token {
    /// Dot-separated segments of a (possibly dotted) noun.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.text.split('.')
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Shall,
    ShallNot,
    Must,
    MustNot,
    Should,
    ShouldNot,
}

impl Modality {
    /// Prohibition forms add a negation around the main predicate.
    pub fn is_prohibition(self) -> bool {
        matches!(self, Self::ShallNot | Self::MustNot | Self::ShouldNot)
    }

    /// Only obligation forms are permitted; `should` has no testable
    /// semantics.
    pub fn is_ill_defined(self) -> bool {
        matches!(self, Self::Should | Self::ShouldNot)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ModalityCst {
    pub modality: Modality,
    pub span: (usize, usize),
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuantifierCst {
    Universal,
    /// `a` / `an` / `some`, and the default for a bare noun.
    Existential,
    Exactly(u32),
    AtLeast(u32),
    AtMost(u32),
    Range(u32, u32),
}

impl QuantifierCst {
    /// True for the numeric forms (everything but universal and plain
    /// existential).
    pub fn is_counted(self) -> bool {
        matches!(self, Self::Exactly(_) | Self::AtLeast(_) | Self::AtMost(_) | Self::Range(..))
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectiveCst {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOpCst {
    Eq,
    Ge,
    Gt,
    Le,
    Lt,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueCst {
    Number { value: f64 },
    Str { value: String },
    StrList { values: Vec<String> },
    /// Comparison against another navigation path.
    Noun { noun: Token },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredicateCst {
    Comparison { op: ComparisonOpCst, value: ValueCst },
    /// `of type A or B`, an is-kind-of test.
    TypeTest { types: Vec<Token> },
    Null,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VerbExprCst {
    pub verb: Token,
    pub negated: bool,
    pub object: NounPhraseCst,
}

/// One conjunct of a clause group: a verb expression, or a copular
/// predicate (`be of type X`, `be null`, `be greater than 0`) applying to
/// the enclosing context variable.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClauseCst {
    Verb(VerbExprCst),
    Be { negated: bool, predicate: PredicateCst },
}

/// A flat `and`/`or` group. The connective preceding each tail clause is
/// kept verbatim; uniformity is a semantic check, not a grammar rule.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClauseGroupCst {
    pub first: ClauseCst,
    pub rest: Vec<(ConnectiveCst, ClauseCst)>,
}

impl ClauseGroupCst {
    pub fn clauses(&self) -> impl Iterator<Item = &ClauseCst> {
        std::iter::once(&self.first).chain(self.rest.iter().map(|(_, c)| c))
    }

    pub fn connectives(&self) -> impl Iterator<Item = ConnectiveCst> + '_ {
        self.rest.iter().map(|(c, _)| *c)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NounPhraseCst {
    pub quantifier: QuantifierCst,
    pub noun: Token,
    pub predicate: Option<PredicateCst>,
    /// Relative clauses (`that …`), each with the connective that joined it
    /// to the previous one (`None` for the first).
    pub relatives: Vec<(Option<ConnectiveCst>, ClauseGroupCst)>,
}

/// One parsed rule sentence.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SentenceCst {
    /// Subject noun; its class is the rule context.
    pub subject: Token,
    /// Relative clauses on the subject, before the modality. These become
    /// the antecedent of the material implication. Same connective shape as
    /// [`NounPhraseCst::relatives`]; empty means no selector.
    pub selector: Vec<(Option<ConnectiveCst>, ClauseGroupCst)>,
    pub modality: ModalityCst,
    pub statement: ClauseGroupCst,
}
