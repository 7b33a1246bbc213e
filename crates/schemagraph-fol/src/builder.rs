//! CST → FOL transformation.
//!
//! A recursive transform over the validated concrete syntax tree. Scope is
//! threaded as an `Rc<Variable>` environment chain and an explicit
//! verb-context depth, so per-rule state is reset structurally: every rule
//! starts from a fresh `self` variable, never from a cleared mutable field.
//!
//! Resolution rules:
//! - dotted nouns resolve segment by segment: segment 0 as a property of the
//!   scope variable's terminal class (ancestors included), later segments as
//!   a subtype-narrowing class step or a property of the established class
//!   context;
//! - verbs other than `has`/`have` resolve to an association navigable from
//!   the current class context, with one retry through the time-slice
//!   indirection property when that profile is active;
//! - obligation sentences with a selector are rewritten into material
//!   implication (`¬selector ∨ main`), prohibitions add a negation.

use std::rc::Rc;

use thiserror::Error;

use schemagraph_cnl::cst::{
    ClauseCst, ClauseGroupCst, ComparisonOpCst, ConnectiveCst, PredicateCst, QuantifierCst,
    SentenceCst, Token, ValueCst, VerbExprCst,
};
use schemagraph_cnl::diagnostics::{Diagnostic, DiagnosticCategory};
use schemagraph_model::{ClassDef, PropertyDef, SchemaGraph, BUILTIN_VERBS, TIME_SLICE_PROPERTY};

use crate::ast::{
    ComparisonOp, Expression, JunctionOp, Literal, Predicate, PropertyStep, Quantification,
    Quantifier, SchemaCall, SchemaStep, Variable,
};

/// Upper bound on clause nesting. The grammar keeps real rules shallow;
/// this guards the recursive builder against pathological inputs.
pub const MAX_NESTING_DEPTH: usize = 64;

#[derive(Debug, Error)]
#[error("{}: {message}", category.code())]
pub struct FolError {
    pub category: DiagnosticCategory,
    pub message: String,
    pub span: Option<(usize, usize)>,
}

impl FolError {
    fn new(category: DiagnosticCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            span: None,
        }
    }

    fn spanned(category: DiagnosticCategory, message: impl Into<String>, token: &Token) -> Self {
        Self {
            category,
            message: message.into(),
            span: Some(token.span),
        }
    }
}

impl From<FolError> for Diagnostic {
    fn from(err: FolError) -> Self {
        let mut diagnostic = Diagnostic::new(err.category, err.message);
        diagnostic.span = err.span;
        diagnostic
    }
}

pub struct FolBuilder<'g> {
    graph: &'g SchemaGraph,
}

impl<'g> FolBuilder<'g> {
    pub fn new(graph: &'g SchemaGraph) -> Self {
        Self { graph }
    }

    /// Build the FOL tree for one rule. `subject_class` is the owning class
    /// of the constraint record (the rule context).
    pub fn build_sentence(
        &self,
        sentence: &SentenceCst,
        subject_class: &str,
    ) -> Result<Quantification, FolError> {
        if self.graph.class(subject_class).is_none() {
            return Err(FolError::new(
                DiagnosticCategory::UnknownClass,
                format!("rule context `{subject_class}` is not a class of this schema"),
            ));
        }
        if self.graph.class(&sentence.subject.text).is_none() {
            return Err(FolError::spanned(
                DiagnosticCategory::UnknownClass,
                format!("subject `{}` is not a class of this schema", sentence.subject.text),
                &sentence.subject,
            ));
        }

        let self_var = Variable::self_var(subject_class);

        let main = self.build_group(&sentence.statement, &self_var, 0, 1)?;
        let main = if sentence.modality.modality.is_prohibition() {
            Predicate::Not(Box::new(main))
        } else {
            main
        };

        let condition = if sentence.selector.is_empty() {
            main
        } else {
            // Material implication: ¬selector ∨ main.
            let selector = self.combine_relatives(&sentence.selector, &self_var, 0, 1)?;
            Predicate::Junction {
                op: JunctionOp::Or,
                operands: vec![Predicate::Not(Box::new(selector)), main],
            }
        };

        Ok(Quantification {
            var: self_var,
            quantifier: Quantifier::Universal,
            condition: Box::new(condition),
        })
    }

    // ------------------------------------------------------------------
    // clause groups
    // ------------------------------------------------------------------

    fn build_group(
        &self,
        group: &ClauseGroupCst,
        scope: &Rc<Variable>,
        verb_depth: usize,
        nest_depth: usize,
    ) -> Result<Predicate, FolError> {
        let op = uniform_connective(group.connectives())?;
        let mut operands = Vec::with_capacity(1 + group.rest.len());
        for clause in group.clauses() {
            operands.push(self.build_clause(clause, scope, verb_depth, nest_depth)?);
        }
        Ok(junction_of(op, operands))
    }

    fn build_clause(
        &self,
        clause: &ClauseCst,
        scope: &Rc<Variable>,
        verb_depth: usize,
        nest_depth: usize,
    ) -> Result<Predicate, FolError> {
        match clause {
            ClauseCst::Verb(verb_expr) => {
                self.build_verb_expr(verb_expr, scope, verb_depth, nest_depth)
            }
            ClauseCst::Be { negated, predicate } => {
                let built =
                    self.build_predicate(predicate, Expression::Var(scope.clone()), scope)?;
                Ok(if *negated {
                    Predicate::Not(Box::new(built))
                } else {
                    built
                })
            }
        }
    }

    fn build_verb_expr(
        &self,
        verb_expr: &VerbExprCst,
        scope: &Rc<Variable>,
        verb_depth: usize,
        nest_depth: usize,
    ) -> Result<Predicate, FolError> {
        if nest_depth > MAX_NESTING_DEPTH {
            return Err(FolError::new(
                DiagnosticCategory::ImplementationRestriction,
                format!("clause nesting exceeds the supported depth of {MAX_NESTING_DEPTH}"),
            ));
        }
        if verb_expr.negated && verb_expr.object.quantifier.is_counted() {
            return Err(FolError::spanned(
                DiagnosticCategory::VerbInvalidForPredicate,
                format!(
                    "negated `{}` with a counted quantifier is ambiguous; negate the whole rule instead",
                    verb_expr.verb.text
                ),
                &verb_expr.verb,
            ));
        }

        let chain = self.resolve_verb_chain(&verb_expr.verb, &verb_expr.object.noun, scope)?;
        let var = Rc::new(Variable {
            name: verb_expr.object.noun.text.clone(),
            value: Some(chain),
            outer: Some(scope.clone()),
        });

        let mut parts = Vec::new();
        if let Some(predicate) = &verb_expr.object.predicate {
            parts.push(self.build_predicate(predicate, Expression::Var(var.clone()), &var)?);
        }
        if !verb_expr.object.relatives.is_empty() {
            parts.push(self.combine_relatives(
                &verb_expr.object.relatives,
                &var,
                verb_depth + 1,
                nest_depth + 1,
            )?);
        }

        let condition = junction_of(JunctionOp::And, parts);
        let quantification = Quantification {
            var,
            quantifier: quantifier_from_cst(verb_expr.object.quantifier),
            condition: Box::new(condition),
        };

        let predicate = Predicate::Quantified(quantification);
        Ok(if verb_expr.negated {
            Predicate::Not(Box::new(predicate))
        } else {
            predicate
        })
    }

    /// Combine a chain of relative clauses with their connectives. When the
    /// chain hangs off a verb expression (`verb_depth ≥ 1`), a
    /// second-or-later relative that itself contains a verb expression has
    /// no unambiguous context and is rejected.
    fn combine_relatives(
        &self,
        relatives: &[(Option<ConnectiveCst>, ClauseGroupCst)],
        scope: &Rc<Variable>,
        verb_depth: usize,
        nest_depth: usize,
    ) -> Result<Predicate, FolError> {
        let op = uniform_connective(relatives.iter().filter_map(|(conn, _)| *conn))?;

        let mut operands = Vec::with_capacity(relatives.len());
        for (index, (_, group)) in relatives.iter().enumerate() {
            if index >= 1
                && verb_depth >= 1
                && group
                    .clauses()
                    .any(|clause| matches!(clause, ClauseCst::Verb(_)))
            {
                return Err(FolError::new(
                    DiagnosticCategory::AmbiguousContext,
                    "conjoined relative clause with a verb expression has an ambiguous context",
                ));
            }
            operands.push(self.build_group(group, scope, verb_depth, nest_depth)?);
        }
        Ok(junction_of(op, operands))
    }

    // ------------------------------------------------------------------
    // predicates
    // ------------------------------------------------------------------

    fn build_predicate(
        &self,
        predicate: &PredicateCst,
        operand: Expression,
        scope: &Rc<Variable>,
    ) -> Result<Predicate, FolError> {
        match predicate {
            PredicateCst::Comparison { op, value } => {
                let right = self.build_value(value, scope)?;
                Ok(Predicate::Comparison {
                    op: comparison_from_cst(*op),
                    left: operand,
                    right,
                })
            }
            PredicateCst::TypeTest { types } => {
                let Expression::Var(_) = &operand else {
                    return Err(FolError::new(
                        DiagnosticCategory::ImplementationRestriction,
                        "type-test operand must be a variable",
                    ));
                };
                let mut classes = Vec::with_capacity(types.len());
                for ty in types {
                    if self.graph.class(&ty.text).is_none() {
                        return Err(FolError::spanned(
                            DiagnosticCategory::UnknownClass,
                            format!("`{}` is not a class of this schema", ty.text),
                            ty,
                        ));
                    }
                    classes.push(ty.text.clone());
                }
                // Sorted for deterministic output.
                classes.sort();
                classes.dedup();
                Ok(Predicate::KindOf { operand, classes })
            }
            PredicateCst::Null => Ok(Predicate::IsNull(operand)),
        }
    }

    fn build_value(&self, value: &ValueCst, scope: &Rc<Variable>) -> Result<Expression, FolError> {
        Ok(match value {
            ValueCst::Number { value } => Expression::Literal(Literal::Real(*value)),
            ValueCst::Str { value } => Expression::Literal(Literal::Str(value.clone())),
            ValueCst::StrList { values } => Expression::Literal(Literal::StrList(values.clone())),
            ValueCst::Noun { noun } => {
                // A navigation path on the right-hand side resolves against
                // the enclosing scope, not the compared variable itself.
                let base = scope.outer.as_ref().unwrap_or(scope);
                let chain = self.resolve_noun_chain(noun, base)?;
                Expression::Var(Rc::new(Variable {
                    name: noun.text.clone(),
                    value: Some(chain),
                    outer: Some(base.clone()),
                }))
            }
        })
    }

    // ------------------------------------------------------------------
    // schema-call resolution
    // ------------------------------------------------------------------

    fn resolve_verb_chain(
        &self,
        verb: &Token,
        noun: &Token,
        scope: &Rc<Variable>,
    ) -> Result<SchemaCall, FolError> {
        // Exact match, like the vocabulary check: `Have` is not a verb.
        if BUILTIN_VERBS.contains(&verb.text.as_str()) {
            return self.resolve_noun_chain(noun, scope);
        }

        let context = self.scope_class(scope, verb)?;
        if let Some((owner, def)) = self.graph.association_property(&context.name, &verb.text) {
            let mut steps = vec![SchemaStep::Property(self.property_step(
                owner,
                def,
                Some(scope.clone()),
            ))];
            self.resolve_continuation(noun, &mut steps, target_restatement(noun, def))?;
            return Ok(SchemaCall { steps });
        }

        // Time-slice profiles hide associations behind the indirection
        // property; retry once with the implicit step inserted.
        if self.graph.profile.feature_time_slices {
            if let Some((slice_owner, slice_def)) =
                self.graph.property(&context.name, TIME_SLICE_PROPERTY)
            {
                if let Some((owner, def)) = self
                    .graph
                    .association_property(&slice_def.type_name, &verb.text)
                {
                    let mut steps = vec![
                        SchemaStep::Property(self.property_step(
                            slice_owner,
                            slice_def,
                            Some(scope.clone()),
                        )),
                        SchemaStep::Property(self.property_step(owner, def, None)),
                    ];
                    self.resolve_continuation(noun, &mut steps, target_restatement(noun, def))?;
                    return Ok(SchemaCall { steps });
                }
            }
        }

        Err(FolError::spanned(
            DiagnosticCategory::VerbUnknownInContext,
            format!(
                "verb `{}` does not name an association navigable from `{}`",
                verb.text, context.name
            ),
            verb,
        ))
    }

    /// `has`/`have` navigation: segment 0 is a property of the scope's
    /// terminal class; later segments continue from the established context.
    fn resolve_noun_chain(&self, noun: &Token, scope: &Rc<Variable>) -> Result<SchemaCall, FolError> {
        let context = self.scope_class(scope, noun)?;
        let first = noun.segments().next().unwrap_or_default();

        let Some((owner, def)) = self.graph.property(&context.name, first) else {
            return Err(FolError::spanned(
                DiagnosticCategory::UnknownProperty,
                format!("`{first}` is not a property of `{}` or its supertypes", context.name),
                noun,
            ));
        };
        let mut steps = vec![SchemaStep::Property(self.property_step(
            owner,
            def,
            Some(scope.clone()),
        ))];
        self.resolve_continuation(noun, &mut steps, 1)?;
        Ok(SchemaCall { steps })
    }

    /// Resolve the remaining dotted segments of `noun` (starting at
    /// `skip`) against the class context established by `steps`.
    fn resolve_continuation(
        &self,
        noun: &Token,
        steps: &mut Vec<SchemaStep>,
        skip: usize,
    ) -> Result<(), FolError> {
        for segment in noun.segments().skip(skip) {
            let context = match steps.last() {
                Some(SchemaStep::Class { name }) => name.clone(),
                Some(SchemaStep::Property(p)) => {
                    if p.simple {
                        return Err(FolError::spanned(
                            DiagnosticCategory::UnknownPropertyType,
                            format!(
                                "`{}` has the simple type `{}`; `{segment}` cannot navigate further",
                                p.name, p.value_type
                            ),
                            noun,
                        ));
                    }
                    p.value_type.clone()
                }
                None => unreachable!("continuation always follows at least one step"),
            };

            // The verb's target type restated as the first segment is a
            // harmless narrowing.
            if self.graph.class(segment).is_some() && self.graph.is_subtype_of(segment, &context) {
                steps.push(SchemaStep::Class {
                    name: segment.to_string(),
                });
            } else if let Some((owner, def)) = self.graph.property(&context, segment) {
                steps.push(SchemaStep::Property(self.property_step(owner, def, None)));
            } else {
                return Err(FolError::spanned(
                    DiagnosticCategory::UnknownSchemaCall,
                    format!(
                        "`{segment}` is neither a subtype of `{context}` nor a property reachable from it"
                    ),
                    noun,
                ));
            }
        }
        Ok(())
    }

    fn property_step(
        &self,
        owner: &ClassDef,
        def: &PropertyDef,
        var_context: Option<Rc<Variable>>,
    ) -> PropertyStep {
        PropertyStep {
            name: def.name.clone(),
            owner: owner.name.clone(),
            prefix: owner.prefix.clone(),
            value_type: def.type_name.clone(),
            simple: self.graph.is_simple_type(&def.type_name),
            nilable: def.nilable,
            containment: def.containment,
            var_context,
        }
    }

    /// The class context a scope variable establishes. Fails when the
    /// variable terminates in a simple type (no further navigation).
    fn scope_class(&self, scope: &Rc<Variable>, at: &Token) -> Result<&'g ClassDef, FolError> {
        let Some(terminal) = scope.terminal_type() else {
            return Err(FolError::spanned(
                DiagnosticCategory::UnknownPropertyType,
                format!("variable `{}` has no navigable value", scope.name),
                at,
            ));
        };
        self.graph.class(terminal).ok_or_else(|| {
            FolError::spanned(
                DiagnosticCategory::UnknownPropertyType,
                format!(
                    "variable `{}` terminates in the simple type `{terminal}`",
                    scope.name
                ),
                at,
            )
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// The object noun after an association verb usually restates the target
/// (`operates a runway` against the `runway` end). Such a first segment is
/// already covered by the verb's property step and is skipped.
fn target_restatement(noun: &Token, def: &PropertyDef) -> usize {
    let first = noun.segments().next().unwrap_or_default();
    usize::from(
        first.eq_ignore_ascii_case(&def.name) || first.eq_ignore_ascii_case(&def.type_name),
    )
}

/// A clause group must use exclusively `and` or exclusively `or`.
fn uniform_connective(
    connectives: impl IntoIterator<Item = ConnectiveCst>,
) -> Result<JunctionOp, FolError> {
    let mut op = None;
    for connective in connectives {
        let current = match connective {
            ConnectiveCst::And => JunctionOp::And,
            ConnectiveCst::Or => JunctionOp::Or,
        };
        match op {
            None => op = Some(current),
            Some(previous) if previous != current => {
                return Err(FolError::new(
                    DiagnosticCategory::MixOfAndAndOr,
                    "`and` and `or` cannot be mixed at one conjunction level",
                ));
            }
            Some(_) => {}
        }
    }
    Ok(op.unwrap_or(JunctionOp::And))
}

fn junction_of(op: JunctionOp, mut operands: Vec<Predicate>) -> Predicate {
    match operands.len() {
        0 => Predicate::True,
        1 => operands.pop().expect("length checked"),
        _ => Predicate::Junction { op, operands },
    }
}

fn quantifier_from_cst(quantifier: QuantifierCst) -> Quantifier {
    match quantifier {
        QuantifierCst::Universal => Quantifier::Universal,
        QuantifierCst::Existential => Quantifier::existential(),
        QuantifierCst::Exactly(n) => Quantifier::exactly(n),
        QuantifierCst::AtLeast(n) => Quantifier::at_least(n),
        QuantifierCst::AtMost(n) => Quantifier::at_most(n),
        QuantifierCst::Range(lo, hi) => Quantifier::range(lo, hi),
    }
}

fn comparison_from_cst(op: ComparisonOpCst) -> ComparisonOp {
    match op {
        ComparisonOpCst::Eq => ComparisonOp::Eq,
        ComparisonOpCst::Ge => ComparisonOp::Ge,
        ComparisonOpCst::Gt => ComparisonOp::Gt,
        ComparisonOpCst::Le => ComparisonOp::Le,
        ComparisonOpCst::Lt => ComparisonOp::Lt,
    }
}
