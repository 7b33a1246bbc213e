//! Rule-text parser.
//!
//! Grammar (keywords case-insensitive, nouns/verbs verbatim):
//!
//! ```text
//! sentence    := ("Each"|"Every"|"All") noun [selector] modality clause-group
//! selector    := rel-clause { ("and"|"or") rel-clause }
//! modality    := ("shall"|"must"|"should") ["not"]
//! clause-group:= clause { ("and"|"or") clause }
//! clause      := ("be"|"is"|"are") ["not"] predicate
//!              | ["not"] verb noun-phrase
//! noun-phrase := [quantifier] dotted-noun [predicate]
//!                [rel-clause { ("and"|"or") rel-clause }]
//! rel-clause  := ("that"|"which") clause
//! quantifier  := "a"|"an"|"some" | "exactly" N | "at least" N
//!                ["and at most" M] | "at most" N
//! predicate   := comparator value | "of type" noun { "or" noun } | "null"
//! comparator  := "equal [to]" | "greater [than] [or equal [to]]"
//!              | "less [than] [or equal [to]]" | "higher [than]"
//!              | "lower [than]"
//! value       := number | 'string' | ( 'a', 'b', … ) | dotted-noun
//! ```
//!
//! Lexing (words, numbers, quoted strings, punctuation) is nom; the grammar
//! itself is a small recursive descent over the token list, which keeps
//! character spans trivially available for diagnostics.

use nom::{
    bytes::complete::{take_while, take_while1},
    character::complete::{char as pchar, multispace0},
    combinator::recognize,
    number::complete::recognize_float,
    sequence::delimited,
    IResult,
};
use thiserror::Error;

use crate::cst::{
    ClauseCst, ClauseGroupCst, ComparisonOpCst, ConnectiveCst, Modality, ModalityCst,
    NounPhraseCst, PredicateCst, QuantifierCst, SentenceCst, Token, ValueCst, VerbExprCst,
};

#[derive(Debug, Error)]
#[error("syntax error at offset {offset}: {message}")]
pub struct ParseError {
    pub offset: usize,
    pub message: String,
}

// ============================================================================
// Lexer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum RawKind {
    Word,
    Number(f64),
    Str(String),
    LParen,
    RParen,
    Comma,
}

#[derive(Debug, Clone, PartialEq)]
struct RawToken {
    kind: RawKind,
    text: String,
    start: usize,
    end: usize,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '.' || c == '_' || c == '-'
}

fn lex_word(input: &str) -> IResult<&str, &str> {
    recognize(take_while1(is_word_char))(input)
}

fn lex_quoted(input: &str) -> IResult<&str, &str> {
    delimited(pchar('\''), take_while(|c| c != '\''), pchar('\''))(input)
}

fn lex(text: &str) -> Result<Vec<RawToken>, ParseError> {
    let mut tokens = Vec::new();
    let mut rest = text;
    loop {
        let (r, _) = multispace0::<_, nom::error::Error<&str>>(rest)
            .map_err(|_| unreachable_ws(text, rest))?;
        rest = r;
        if rest.is_empty() {
            break;
        }
        let start = text.len() - rest.len();
        let first = rest.chars().next().unwrap_or('\0');

        if first == '\'' {
            let (r, value) = lex_quoted(rest).map_err(|_| ParseError {
                offset: start,
                message: "unterminated string literal".to_string(),
            })?;
            let end = text.len() - r.len();
            tokens.push(RawToken {
                kind: RawKind::Str(value.to_string()),
                text: value.to_string(),
                start,
                end,
            });
            rest = r;
        } else if first == '(' || first == ')' || first == ',' {
            let kind = match first {
                '(' => RawKind::LParen,
                ')' => RawKind::RParen,
                _ => RawKind::Comma,
            };
            tokens.push(RawToken {
                kind,
                text: first.to_string(),
                start,
                end: start + 1,
            });
            rest = &rest[1..];
        } else if first.is_ascii_digit() {
            let (r, lexeme) = recognize_float::<_, nom::error::Error<&str>>(rest).map_err(|_| {
                ParseError {
                    offset: start,
                    message: "malformed number".to_string(),
                }
            })?;
            let value: f64 = lexeme.parse().map_err(|_| ParseError {
                offset: start,
                message: format!("malformed number `{lexeme}`"),
            })?;
            let end = text.len() - r.len();
            tokens.push(RawToken {
                kind: RawKind::Number(value),
                text: lexeme.to_string(),
                start,
                end,
            });
            rest = r;
        } else if is_word_char(first) {
            let (r, lexeme) = lex_word(rest).map_err(|_| ParseError {
                offset: start,
                message: "unrecognized input".to_string(),
            })?;
            tokens.push(RawToken {
                kind: RawKind::Word,
                text: lexeme.to_string(),
                start,
                end: start + lexeme.len(),
            });
            rest = r;
        } else {
            return Err(ParseError {
                offset: start,
                message: format!("unrecognized character `{first}`"),
            });
        }
    }
    Ok(tokens)
}

fn unreachable_ws(text: &str, rest: &str) -> ParseError {
    ParseError {
        offset: text.len() - rest.len(),
        message: "whitespace scan failed".to_string(),
    }
}

// ============================================================================
// Recursive descent over the token list
// ============================================================================

/// Upper bound on relative-clause nesting. Real rules are shallow; the
/// bound keeps a pathological input from exhausting the stack before the
/// rule can be skipped.
pub const MAX_SYNTAX_DEPTH: usize = 64;

struct Parser {
    tokens: Vec<RawToken>,
    pos: usize,
    text_len: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&RawToken> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&RawToken> {
        self.tokens.get(self.pos + offset)
    }

    fn word_at(&self, offset: usize, kw: &str) -> bool {
        matches!(
            self.peek_at(offset),
            Some(tok) if tok.kind == RawKind::Word && tok.text.eq_ignore_ascii_case(kw)
        )
    }

    fn peek_kw(&self, kw: &str) -> bool {
        self.word_at(0, kw)
    }

    fn peek_any_kw(&self, kws: &[&str]) -> bool {
        kws.iter().any(|kw| self.peek_kw(kw))
    }

    fn eat_kw(&mut self, kw: &str) -> bool {
        if self.peek_kw(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_any_kw(&mut self, kws: &[&str]) -> bool {
        kws.iter().any(|kw| self.eat_kw(kw))
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            offset: self.peek().map(|t| t.start).unwrap_or(self.text_len),
            message: message.into(),
        }
    }

    fn expect_word(&mut self, what: &str) -> Result<Token, ParseError> {
        match self.peek() {
            Some(tok) if tok.kind == RawKind::Word => {
                let token = Token {
                    text: tok.text.clone(),
                    span: (tok.start, tok.end),
                };
                self.pos += 1;
                Ok(token)
            }
            Some(tok) => Err(ParseError {
                offset: tok.start,
                message: format!("expected {what}, found `{}`", tok.text),
            }),
            None => Err(self.error_here(format!("expected {what}, found end of rule"))),
        }
    }

    fn expect_integer(&mut self, what: &str) -> Result<u32, ParseError> {
        match self.peek() {
            Some(tok) => {
                if let RawKind::Number(value) = tok.kind {
                    if value.fract() == 0.0 && value >= 0.0 {
                        self.pos += 1;
                        return Ok(value as u32);
                    }
                }
                Err(ParseError {
                    offset: tok.start,
                    message: format!("expected {what}, found `{}`", tok.text),
                })
            }
            None => Err(self.error_here(format!("expected {what}, found end of rule"))),
        }
    }

    // ------------------------------------------------------------------
    // sentence
    // ------------------------------------------------------------------

    fn parse_sentence(&mut self) -> Result<SentenceCst, ParseError> {
        if !self.eat_any_kw(&["each", "every", "all"]) {
            return Err(self.error_here("expected `Each`, `Every` or `All`"));
        }
        let subject = self.expect_word("subject noun")?;
        let selector = self.parse_relative_chain()?;
        let modality = self.parse_modality()?;
        let statement = self.parse_clause_group()?;

        if let Some(tok) = self.peek() {
            return Err(ParseError {
                offset: tok.start,
                message: format!("unexpected trailing input `{}`", tok.text),
            });
        }

        Ok(SentenceCst {
            subject,
            selector,
            modality,
            statement,
        })
    }

    fn parse_modality(&mut self) -> Result<ModalityCst, ParseError> {
        let Some(head) = self.peek().cloned() else {
            return Err(self.error_here("expected modality, found end of rule"));
        };
        let base = if self.eat_kw("shall") {
            Modality::Shall
        } else if self.eat_kw("must") {
            Modality::Must
        } else if self.eat_kw("should") {
            Modality::Should
        } else {
            return Err(ParseError {
                offset: head.start,
                message: format!("expected `shall`, `must` or `should`, found `{}`", head.text),
            });
        };

        let mut end = head.end;
        let modality = if self.peek_kw("not") {
            end = self.peek().map(|t| t.end).unwrap_or(end);
            self.pos += 1;
            match base {
                Modality::Shall => Modality::ShallNot,
                Modality::Must => Modality::MustNot,
                _ => Modality::ShouldNot,
            }
        } else {
            base
        };

        Ok(ModalityCst {
            modality,
            span: (head.start, end),
        })
    }

    // ------------------------------------------------------------------
    // clauses
    // ------------------------------------------------------------------

    fn parse_clause_group(&mut self) -> Result<ClauseGroupCst, ParseError> {
        let first = self.parse_clause()?;
        let mut rest = Vec::new();
        loop {
            let connective = if self.peek_kw("and") {
                ConnectiveCst::And
            } else if self.peek_kw("or") {
                ConnectiveCst::Or
            } else {
                break;
            };
            // `and that …` continues the enclosing noun phrase, not this
            // group.
            if self.word_at(1, "that") || self.word_at(1, "which") {
                break;
            }
            self.pos += 1;
            rest.push((connective, self.parse_clause()?));
        }
        Ok(ClauseGroupCst { first, rest })
    }

    fn parse_clause(&mut self) -> Result<ClauseCst, ParseError> {
        if self.depth >= MAX_SYNTAX_DEPTH {
            return Err(self.error_here("rule text nests too deeply"));
        }
        self.depth += 1;
        let clause = self.parse_clause_inner();
        self.depth -= 1;
        clause
    }

    fn parse_clause_inner(&mut self) -> Result<ClauseCst, ParseError> {
        if self.eat_any_kw(&["be", "is", "are"]) {
            let negated = self.eat_kw("not");
            let predicate = self.parse_predicate()?;
            return Ok(ClauseCst::Be { negated, predicate });
        }

        let negated = self.eat_kw("not");
        if negated && self.eat_any_kw(&["be", "is", "are"]) {
            let predicate = self.parse_predicate()?;
            return Ok(ClauseCst::Be {
                negated: true,
                predicate,
            });
        }

        let verb = self.expect_word("verb")?;
        let object = self.parse_noun_phrase()?;
        Ok(ClauseCst::Verb(VerbExprCst {
            verb,
            negated,
            object,
        }))
    }

    fn parse_noun_phrase(&mut self) -> Result<NounPhraseCst, ParseError> {
        let quantifier = self.parse_quantifier()?;
        let noun = self.expect_word("object noun")?;

        let predicate = if self
            .peek_any_kw(&["equal", "greater", "less", "higher", "lower", "of", "null"])
        {
            Some(self.parse_predicate()?)
        } else {
            None
        };

        let relatives = self.parse_relative_chain()?;

        Ok(NounPhraseCst {
            quantifier,
            noun,
            predicate,
            relatives,
        })
    }

    /// `that …` relative clauses, optionally chained with `and that …` /
    /// `or that …`. Returns an empty chain when there is no relative clause.
    ///
    /// A relative holds exactly one clause; continuing it requires repeating
    /// `that`. A bare `and <clause>` after a relative therefore returns to
    /// the enclosing statement instead of being captured by the innermost
    /// relative still open.
    fn parse_relative_chain(
        &mut self,
    ) -> Result<Vec<(Option<ConnectiveCst>, ClauseGroupCst)>, ParseError> {
        let mut chain = Vec::new();
        if !self.eat_any_kw(&["that", "which"]) {
            return Ok(chain);
        }
        chain.push((None, self.parse_relative_clause()?));
        loop {
            let connective = if self.peek_kw("and") {
                ConnectiveCst::And
            } else if self.peek_kw("or") {
                ConnectiveCst::Or
            } else {
                break;
            };
            if !(self.word_at(1, "that") || self.word_at(1, "which")) {
                break;
            }
            self.pos += 2;
            chain.push((Some(connective), self.parse_relative_clause()?));
        }
        Ok(chain)
    }

    fn parse_relative_clause(&mut self) -> Result<ClauseGroupCst, ParseError> {
        let first = self.parse_clause()?;
        Ok(ClauseGroupCst {
            first,
            rest: Vec::new(),
        })
    }

    fn parse_quantifier(&mut self) -> Result<QuantifierCst, ParseError> {
        if self.eat_any_kw(&["a", "an", "some"]) {
            return Ok(QuantifierCst::Existential);
        }
        if self.eat_kw("exactly") {
            let n = self.expect_integer("occurrence count")?;
            return Ok(QuantifierCst::Exactly(n));
        }
        if self.peek_kw("at") && self.word_at(1, "least") {
            self.pos += 2;
            let lower = self.expect_integer("lower bound")?;
            if self.peek_kw("and") && self.word_at(1, "at") && self.word_at(2, "most") {
                self.pos += 3;
                let upper = self.expect_integer("upper bound")?;
                return Ok(QuantifierCst::Range(lower, upper));
            }
            return Ok(QuantifierCst::AtLeast(lower));
        }
        if self.peek_kw("at") && self.word_at(1, "most") {
            self.pos += 2;
            let upper = self.expect_integer("upper bound")?;
            return Ok(QuantifierCst::AtMost(upper));
        }
        Ok(QuantifierCst::Existential)
    }

    // ------------------------------------------------------------------
    // predicates and values
    // ------------------------------------------------------------------

    fn parse_predicate(&mut self) -> Result<PredicateCst, ParseError> {
        if self.eat_kw("of") {
            if !self.eat_kw("type") {
                return Err(self.error_here("expected `type` after `of`"));
            }
            let mut types = vec![self.expect_word("type name")?];
            while self.peek_kw("or")
                && matches!(self.peek_at(1), Some(t) if t.kind == RawKind::Word)
                && !self.word_at(1, "be")
                && !self.word_at(1, "is")
                && !self.word_at(1, "are")
                && !self.word_at(1, "not")
            {
                self.pos += 1;
                types.push(self.expect_word("type name")?);
            }
            return Ok(PredicateCst::TypeTest { types });
        }

        if self.eat_kw("null") {
            return Ok(PredicateCst::Null);
        }

        let op = self.parse_comparator()?;
        let value = self.parse_value()?;
        Ok(PredicateCst::Comparison { op, value })
    }

    fn parse_comparator(&mut self) -> Result<ComparisonOpCst, ParseError> {
        if self.eat_kw("equal") {
            self.eat_kw("to");
            return Ok(ComparisonOpCst::Eq);
        }
        if self.eat_kw("greater") {
            self.eat_kw("than");
            if self.eat_or_equal() {
                return Ok(ComparisonOpCst::Ge);
            }
            return Ok(ComparisonOpCst::Gt);
        }
        if self.eat_kw("less") {
            self.eat_kw("than");
            if self.eat_or_equal() {
                return Ok(ComparisonOpCst::Le);
            }
            return Ok(ComparisonOpCst::Lt);
        }
        if self.eat_kw("higher") {
            self.eat_kw("than");
            return Ok(ComparisonOpCst::Gt);
        }
        if self.eat_kw("lower") {
            self.eat_kw("than");
            return Ok(ComparisonOpCst::Lt);
        }
        Err(self.error_here("expected a comparator"))
    }

    /// `or equal [to]`, the tail of `greater than or equal to`.
    fn eat_or_equal(&mut self) -> bool {
        if self.peek_kw("or") && self.word_at(1, "equal") {
            self.pos += 2;
            self.eat_kw("to");
            true
        } else {
            false
        }
    }

    fn parse_value(&mut self) -> Result<ValueCst, ParseError> {
        match self.peek().cloned() {
            Some(tok) => match tok.kind {
                RawKind::Number(value) => {
                    self.pos += 1;
                    Ok(ValueCst::Number { value })
                }
                RawKind::Str(value) => {
                    self.pos += 1;
                    Ok(ValueCst::Str { value })
                }
                RawKind::LParen => {
                    self.pos += 1;
                    let mut values = Vec::new();
                    loop {
                        match self.peek().cloned() {
                            Some(item) => match item.kind {
                                RawKind::Str(value) => {
                                    self.pos += 1;
                                    values.push(value);
                                    if !matches!(
                                        self.peek(),
                                        Some(t) if t.kind == RawKind::Comma
                                    ) {
                                        break;
                                    }
                                    self.pos += 1;
                                }
                                _ => {
                                    return Err(ParseError {
                                        offset: item.start,
                                        message: "expected string literal in list".to_string(),
                                    })
                                }
                            },
                            None => {
                                return Err(self.error_here("unterminated value list"));
                            }
                        }
                    }
                    if !matches!(self.peek(), Some(t) if t.kind == RawKind::RParen) {
                        return Err(self.error_here("expected `)` closing value list"));
                    }
                    self.pos += 1;
                    Ok(ValueCst::StrList { values })
                }
                RawKind::Word => {
                    let noun = self.expect_word("value")?;
                    Ok(ValueCst::Noun { noun })
                }
                _ => Err(ParseError {
                    offset: tok.start,
                    message: format!("expected a value, found `{}`", tok.text),
                }),
            },
            None => Err(self.error_here("expected a value, found end of rule")),
        }
    }
}

/// Parse one rule sentence. A single trailing full stop is tolerated.
pub fn parse_sentence(text: &str) -> Result<SentenceCst, ParseError> {
    let trimmed = text.trim_end();
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
    let tokens = lex(trimmed)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        text_len: trimmed.len(),
        depth: 0,
    };
    parser.parse_sentence()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::*;

    #[test]
    fn parses_simple_obligation() {
        let s = parse_sentence("Each Building shall have height greater than 0.").expect("parse");
        assert_eq!(s.subject.text, "Building");
        assert!(s.selector.is_empty());
        assert_eq!(s.modality.modality, Modality::Shall);

        let ClauseCst::Verb(verb) = &s.statement.first else {
            panic!("expected verb clause");
        };
        assert_eq!(verb.verb.text, "have");
        assert_eq!(verb.object.noun.text, "height");
        assert_eq!(verb.object.quantifier, QuantifierCst::Existential);
        assert_eq!(
            verb.object.predicate,
            Some(PredicateCst::Comparison {
                op: ComparisonOpCst::Gt,
                value: ValueCst::Number { value: 0.0 },
            })
        );
    }

    #[test]
    fn parses_selector_before_modality() {
        let s = parse_sentence("Each Airport that has a runway shall have a name").expect("parse");
        assert_eq!(s.selector.len(), 1);
        let ClauseCst::Verb(verb) = &s.selector[0].1.first else {
            panic!("expected verb clause in selector");
        };
        assert_eq!(verb.verb.text, "has");
        assert_eq!(verb.object.noun.text, "runway");

        // Conjoined subject relatives stay on the subject.
        let s = parse_sentence(
            "Each Airport that has a runway and that has a name shall have a code",
        )
        .expect("parse");
        assert_eq!(s.selector.len(), 2);
        assert_eq!(s.selector[1].0, Some(ConnectiveCst::And));
    }

    #[test]
    fn parses_bounded_quantifiers() {
        let cases = [
            ("Each Airport shall have exactly 1 name", QuantifierCst::Exactly(1)),
            ("Each Airport shall have at least 2 runway", QuantifierCst::AtLeast(2)),
            ("Each Airport shall have at most 4 runway", QuantifierCst::AtMost(4)),
            (
                "Each Airport shall have at least 1 and at most 4 runway",
                QuantifierCst::Range(1, 4),
            ),
        ];
        for (text, expected) in cases {
            let s = parse_sentence(text).expect(text);
            let ClauseCst::Verb(verb) = &s.statement.first else {
                panic!("expected verb clause");
            };
            assert_eq!(verb.object.quantifier, expected, "{text}");
        }
    }

    #[test]
    fn parses_mixed_connectives_verbatim() {
        // Mixing is a semantic error, not a grammar error; the connectives
        // must survive into the CST.
        let s = parse_sentence("Each Airport shall have a name and have a runway or have a code")
            .expect("parse");
        let conns: Vec<ConnectiveCst> = s.statement.connectives().collect();
        assert_eq!(conns, vec![ConnectiveCst::And, ConnectiveCst::Or]);
    }

    #[test]
    fn parses_type_test_and_null_test() {
        let s = parse_sentence("Each Runway shall be of type PavedRunway or GrassRunway")
            .expect("parse");
        let ClauseCst::Be { negated, predicate } = &s.statement.first else {
            panic!("expected copular clause");
        };
        assert!(!negated);
        let PredicateCst::TypeTest { types } = predicate else {
            panic!("expected type test");
        };
        let names: Vec<&str> = types.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(names, vec!["PavedRunway", "GrassRunway"]);

        let s = parse_sentence("Each Runway shall not be null").expect("parse");
        assert_eq!(s.modality.modality, Modality::ShallNot);
        assert!(matches!(
            &s.statement.first,
            ClauseCst::Be { predicate: PredicateCst::Null, .. }
        ));
    }

    #[test]
    fn parses_relative_clause_chain() {
        let s = parse_sentence(
            "Each Airport shall have a runway that has length greater than 800 and that has a surface",
        )
        .expect("parse");
        let ClauseCst::Verb(verb) = &s.statement.first else {
            panic!("expected verb clause");
        };
        assert_eq!(verb.object.relatives.len(), 2);
        assert_eq!(verb.object.relatives[0].0, None);
        assert_eq!(verb.object.relatives[1].0, Some(ConnectiveCst::And));
    }

    #[test]
    fn bare_conjunction_after_relative_returns_to_statement_level() {
        // Without a repeated `that`, the second verb expression belongs to
        // the subject, not to the runway of the relative clause.
        let s = parse_sentence(
            "Each Airport shall have exactly 1 runway that has length greater than 800 \
             and have at least 2 runway",
        )
        .expect("parse");
        assert_eq!(s.statement.rest.len(), 1);
        let ClauseCst::Verb(first) = &s.statement.first else {
            panic!("expected verb clause");
        };
        assert_eq!(first.object.relatives.len(), 1);
        assert!(first.object.relatives[0].1.rest.is_empty());
        let (conn, second) = &s.statement.rest[0];
        assert_eq!(*conn, ConnectiveCst::And);
        let ClauseCst::Verb(second) = second else {
            panic!("expected verb clause");
        };
        assert_eq!(second.verb.text, "have");
        assert_eq!(second.object.quantifier, QuantifierCst::AtLeast(2));
    }

    #[test]
    fn deep_nesting_is_rejected_not_overflowed() {
        let mut text = String::from("Each Airport shall have a runway");
        for _ in 0..2 * MAX_SYNTAX_DEPTH {
            text.push_str(" that has a runway");
        }
        let err = parse_sentence(&text).unwrap_err();
        assert!(err.message.contains("nests too deeply"));
    }

    #[test]
    fn parses_string_list_value() {
        let s = parse_sentence("Each Runway shall have surface equal to ('ASPH', 'CONC')")
            .expect("parse");
        let ClauseCst::Verb(verb) = &s.statement.first else {
            panic!("expected verb clause");
        };
        assert_eq!(
            verb.object.predicate,
            Some(PredicateCst::Comparison {
                op: ComparisonOpCst::Eq,
                value: ValueCst::StrList {
                    values: vec!["ASPH".to_string(), "CONC".to_string()]
                },
            })
        );
    }

    #[test]
    fn reports_offset_on_syntax_error() {
        let err = parse_sentence("Building shall have height").unwrap_err();
        assert_eq!(err.offset, 0);
        assert!(err.message.contains("expected `Each`"));

        let err = parse_sentence("Each Building shall").unwrap_err();
        assert!(err.message.contains("end of rule"));
    }

    #[test]
    fn keeps_dotted_nouns_as_one_token() {
        let s = parse_sentence("Each Airport shall have city.name equal to 'Rome'").expect("parse");
        let ClauseCst::Verb(verb) = &s.statement.first else {
            panic!("expected verb clause");
        };
        assert_eq!(verb.object.noun.text, "city.name");
        let segments: Vec<&str> = verb.object.noun.segments().collect();
        assert_eq!(segments, vec!["city", "name"]);
    }
}
