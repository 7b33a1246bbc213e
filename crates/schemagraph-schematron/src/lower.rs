//! FOL-to-IR lowering.
//!
//! The frontend hands over fully resolved trees, so lowering never touches
//! rule text or the vocabulary again. What it does decide:
//!
//!   - the rule-level universal quantification disappears (its bound `self`
//!     variable becomes the Schematron rule context),
//!   - same-polarity junctions are flattened into one n-ary logic node,
//!   - class steps merge into the preceding property access as a subtype
//!     narrowing,
//!   - type tests expand to their concrete candidate classes,
//!   - comparisons are classified as value or identity comparisons, and
//!   - anything the target dialect cannot express becomes an error sentinel
//!     for the pipeline to scan, never a panic.

use schemagraph_fol::{
    ComparisonOp, Expression, JunctionOp, Literal, Predicate, Quantification, Quantifier,
    SchemaStep, Variable,
};
use schemagraph_model::SchemaGraph;

use crate::nodes::{
    AccessComponent, AccessMode, Bounds, ChainBase, CompareOp, LiteralNode, LogicOp, QueryNode,
    TranslationError,
};

pub struct Lowering<'g> {
    graph: &'g SchemaGraph,
}

impl<'g> Lowering<'g> {
    pub fn new(graph: &'g SchemaGraph) -> Self {
        Self { graph }
    }

    /// Lowers one rule's FOL tree. The returned IR may contain
    /// [`QueryNode::Error`] sentinels; callers scan for them before
    /// translating to XPath.
    pub fn lower_rule(&self, fol: &Quantification) -> QueryNode {
        let mut env: Vec<String> = Vec::new();
        self.lower_predicate(&fol.condition, &mut env)
    }

    fn lower_predicate(&self, predicate: &Predicate, env: &mut Vec<String>) -> QueryNode {
        match predicate {
            Predicate::True => QueryNode::True,
            Predicate::Junction { op, operands } => {
                let op = match op {
                    JunctionOp::And => LogicOp::And,
                    JunctionOp::Or => LogicOp::Or,
                };
                let mut flat = Vec::with_capacity(operands.len());
                for operand in operands {
                    match self.lower_predicate(operand, env) {
                        QueryNode::Logic {
                            op: child_op,
                            operands: children,
                        } if child_op == op => flat.extend(children),
                        other => flat.push(other),
                    }
                }
                match flat.len() {
                    0 => QueryNode::True,
                    1 => flat.remove(0),
                    _ => QueryNode::Logic { op, operands: flat },
                }
            }
            Predicate::Not(inner) => {
                QueryNode::Not(Box::new(self.lower_predicate(inner, env)))
            }
            Predicate::Comparison { op, left, right } => self.lower_comparison(*op, left, right, env),
            Predicate::IsNull(expr) => self.lower_null_test(expr, env),
            Predicate::KindOf { operand, classes } => {
                let candidates = self
                    .graph
                    .concrete_candidates(classes)
                    .into_iter()
                    .map(|c| self.graph.qname(c))
                    .collect();
                QueryNode::TypeTest {
                    operand: Box::new(self.lower_expression(operand, env)),
                    candidates,
                }
            }
            Predicate::Quantified(q) => self.lower_quantified(q, env),
        }
    }

    fn lower_quantified(&self, q: &Quantification, env: &mut Vec<String>) -> QueryNode {
        let bounds = match q.quantifier {
            Quantifier::Bounded { lower, upper } => Bounds { lower, upper },
            Quantifier::Universal => {
                return QueryNode::Error(TranslationError::new(
                    "universal quantification below the rule level is not supported",
                ))
            }
        };
        let source = self.lower_chain(&q.var);
        env.push(q.var.name.clone());
        let condition = self.lower_predicate(&q.condition, env);
        env.pop();
        QueryNode::Quantified {
            var: q.var.name.clone(),
            bounds,
            source: Box::new(source),
            condition: Box::new(condition),
        }
    }

    fn lower_comparison(
        &self,
        op: ComparisonOp,
        left: &Expression,
        right: &Expression,
        env: &mut Vec<String>,
    ) -> QueryNode {
        let op = compare_op(op);
        let left_object = self.is_object_valued(left);
        let right_object = self.is_object_valued(right);
        let (left, right) = (
            self.lower_expression(left, env),
            self.lower_expression(right, env),
        );
        match (left_object, right_object) {
            (false, false) => QueryNode::Comparison {
                op,
                identity: false,
                left: Box::new(left),
                right: Box::new(right),
            },
            (true, true) if op == CompareOp::Eq => QueryNode::Comparison {
                op,
                identity: true,
                left: Box::new(left),
                right: Box::new(right),
            },
            (true, true) => QueryNode::Error(TranslationError::new(
                "object-valued operands only support identity equality",
            )),
            _ => QueryNode::Error(TranslationError::new(
                "cannot compare an object-valued operand with a simple value",
            )),
        }
    }

    fn lower_null_test(&self, expr: &Expression, env: &mut Vec<String>) -> QueryNode {
        let nilable = match expr {
            Expression::Var(v) => v
                .value
                .as_ref()
                .and_then(|call| call.terminal_property())
                .map(|p| p.nilable)
                .unwrap_or(false),
            Expression::Literal(_) => {
                return QueryNode::Error(TranslationError::new("null test requires a navigation"))
            }
        };
        QueryNode::IsNull {
            operand: Box::new(self.lower_expression(expr, env)),
            nilable,
        }
    }

    fn lower_expression(&self, expr: &Expression, env: &mut Vec<String>) -> QueryNode {
        match expr {
            Expression::Var(v) => {
                if v.is_self() {
                    QueryNode::Chain {
                        base: ChainBase::CurrentNode,
                        components: Vec::new(),
                    }
                } else if env.iter().any(|name| *name == v.name) {
                    // Direct reference to a quantifier-bound variable; its
                    // chain was already lowered as the quantifier's source.
                    QueryNode::Chain {
                        base: ChainBase::Variable(v.name.clone()),
                        components: Vec::new(),
                    }
                } else {
                    self.lower_chain(v)
                }
            }
            Expression::Literal(lit) => match lit {
                Literal::Str(s) => QueryNode::Literal(LiteralNode::Str(s.clone())),
                Literal::StrList(items) => QueryNode::Literal(LiteralNode::StrList(items.clone())),
                Literal::Real(n) => QueryNode::Literal(LiteralNode::Number(*n)),
                Literal::Class(_) => QueryNode::Error(TranslationError::new(
                    "class literal outside a type test",
                )),
            },
        }
    }

    /// Lowers a variable's navigation chain into an attribute chain. Class
    /// steps narrow the preceding property access instead of contributing a
    /// segment of their own.
    fn lower_chain(&self, var: &Variable) -> QueryNode {
        let Some(call) = &var.value else {
            return QueryNode::Chain {
                base: ChainBase::CurrentNode,
                components: Vec::new(),
            };
        };
        let mut base = ChainBase::CurrentNode;
        let mut components: Vec<AccessComponent> = Vec::new();
        for step in &call.steps {
            match step {
                SchemaStep::Class { name } => {
                    if let Some(last) = components.last_mut() {
                        let Some(class) = self.graph.class(name) else {
                            return QueryNode::Error(TranslationError::new(format!(
                                "unresolved class step `{name}`"
                            )));
                        };
                        last.narrowed_to = Some(self.graph.qname(class));
                    }
                    // A leading class step names the chain's starting type
                    // and emits nothing.
                }
                SchemaStep::Property(p) => {
                    if components.is_empty() {
                        if let Some(ctx) = &p.var_context {
                            if !ctx.is_self() {
                                base = ChainBase::Variable(ctx.name.clone());
                            }
                        }
                    }
                    let value_qname = if p.simple {
                        None
                    } else {
                        self.graph.class(&p.value_type).map(|c| self.graph.qname(c))
                    };
                    let mode = if p.nilable && !p.simple {
                        AccessMode::Absorbed
                    } else {
                        AccessMode::Normal
                    };
                    components.push(AccessComponent {
                        mode,
                        qname: format!("{}:{}", p.prefix, p.name),
                        value_qname,
                        narrowed_to: None,
                        containment: p.containment,
                        simple: p.simple,
                        nilable: p.nilable,
                    });
                }
            }
        }
        QueryNode::Chain { base, components }
    }

    fn is_object_valued(&self, expr: &Expression) -> bool {
        match expr {
            Expression::Var(v) => {
                if v.is_self() {
                    return true;
                }
                match v.value.as_ref().and_then(|call| call.terminal_type()) {
                    Some(terminal) => !self.graph.is_simple_type(terminal),
                    None => false,
                }
            }
            Expression::Literal(_) => false,
        }
    }
}

fn compare_op(op: ComparisonOp) -> CompareOp {
    match op {
        ComparisonOp::Eq => CompareOp::Eq,
        ComparisonOp::Ge => CompareOp::Ge,
        ComparisonOp::Gt => CompareOp::Gt,
        ComparisonOp::Le => CompareOp::Le,
        ComparisonOp::Lt => CompareOp::Lt,
    }
}
