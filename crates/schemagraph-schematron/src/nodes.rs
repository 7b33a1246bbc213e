//! Query IR: the backend's tree between FOL and XPath text.
//!
//! Lowering from FOL resolves everything the XPath printer should not have
//! to think about: junctions of the same polarity are flattened, class steps
//! are merged into the property access they narrow, nilable accesses are
//! marked absorbed, and constructs the target dialect cannot express become
//! [`QueryNode::Error`] sentinels instead of panics. The printer in
//! [`crate::xpath`] is then a straightforward structural walk.

use schemagraph_model::Containment;

// ============================================================================
// Node kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ge,
    Gt,
    Le,
    Lt,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ge => ">=",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Lt => "<",
        }
    }
}

/// How one property access is rendered inside an attribute chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Plain element step.
    Normal,
    /// Nilable access: the nil guard is folded into this step's predicate
    /// rather than emitted as a separate path segment.
    Absorbed,
}

/// One property access inside an attribute chain.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessComponent {
    pub mode: AccessMode,
    /// Qualified property element name, e.g. `apt:runway`.
    pub qname: String,
    /// Qualified element name of the property's value type; `None` for
    /// simple-typed (leaf) properties, which end the chain.
    pub value_qname: Option<String>,
    /// Replaces `value_qname` in the inline step when a class step narrowed
    /// the access to a subtype.
    pub narrowed_to: Option<String>,
    pub containment: Containment,
    pub simple: bool,
    pub nilable: bool,
}

/// Where an attribute chain starts.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainBase {
    /// The rule's implicit context node.
    CurrentNode,
    /// A quantifier-bound variable, referenced by its FOL name and resolved
    /// through the per-rule translation cache.
    Variable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralNode {
    Str(String),
    StrList(Vec<String>),
    Number(f64),
}

/// Bounds of a compiled quantifier. The rule-level universal never reaches
/// the IR; it becomes the Schematron rule context itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub lower: u32,
    pub upper: Option<u32>,
}

impl Bounds {
    /// Plain existence: satisfied by one or more matches, no upper bound.
    pub fn is_existential(self) -> bool {
        self.lower == 1 && self.upper.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationError {
    pub message: String,
}

impl TranslationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    True,
    False,
    Logic {
        op: LogicOp,
        operands: Vec<QueryNode>,
    },
    Not(Box<QueryNode>),
    Comparison {
        op: CompareOp,
        /// Compare node identity instead of string value; set when both
        /// operands are object-valued.
        identity: bool,
        left: Box<QueryNode>,
        right: Box<QueryNode>,
    },
    /// Nil test over a chain; renders against `@xsi:nil` for nilable
    /// terminals and as an absence test otherwise.
    IsNull {
        operand: Box<QueryNode>,
        nilable: bool,
    },
    /// Qualified-name disjunction over concrete candidate types, already
    /// expanded and sorted by the lowering pass. Empty candidates render as
    /// the constant `false()`.
    TypeTest {
        operand: Box<QueryNode>,
        candidates: Vec<String>,
    },
    Chain {
        base: ChainBase,
        components: Vec<AccessComponent>,
    },
    Literal(LiteralNode),
    Quantified {
        var: String,
        bounds: Bounds,
        source: Box<QueryNode>,
        condition: Box<QueryNode>,
    },
    /// Typed error sentinel; scanned for after lowering a whole rule.
    Error(TranslationError),
}

impl QueryNode {
    pub fn comparison(op: CompareOp, left: QueryNode, right: QueryNode) -> Self {
        Self::Comparison {
            op,
            identity: false,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Collects every error sentinel in the tree, depth-first.
    pub fn collect_errors<'a>(&'a self, out: &mut Vec<&'a TranslationError>) {
        match self {
            Self::Error(e) => out.push(e),
            Self::Logic { operands, .. } => {
                for operand in operands {
                    operand.collect_errors(out);
                }
            }
            Self::Not(inner) => inner.collect_errors(out),
            Self::IsNull { operand, .. } => operand.collect_errors(out),
            Self::Comparison { left, right, .. } => {
                left.collect_errors(out);
                right.collect_errors(out);
            }
            Self::TypeTest { operand, .. } => operand.collect_errors(out),
            Self::Quantified {
                source, condition, ..
            } => {
                source.collect_errors(out);
                condition.collect_errors(out);
            }
            Self::True | Self::False | Self::Chain { .. } | Self::Literal(_) => {}
        }
    }

    pub fn first_error(&self) -> Option<&TranslationError> {
        let mut errors = Vec::new();
        self.collect_errors(&mut errors);
        errors.into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_errors_walks_nested_structure() {
        let node = QueryNode::Logic {
            op: LogicOp::And,
            operands: vec![
                QueryNode::True,
                QueryNode::Not(Box::new(QueryNode::Error(TranslationError::new("inner")))),
                QueryNode::comparison(
                    CompareOp::Eq,
                    QueryNode::Error(TranslationError::new("left")),
                    QueryNode::Literal(LiteralNode::Number(1.0)),
                ),
            ],
        };
        let mut errors = Vec::new();
        node.collect_errors(&mut errors);
        let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["inner", "left"]);
    }

    #[test]
    fn existential_bounds() {
        assert!(Bounds {
            lower: 1,
            upper: None
        }
        .is_existential());
        assert!(!Bounds {
            lower: 2,
            upper: None
        }
        .is_existential());
        assert!(!Bounds {
            lower: 1,
            upper: Some(1)
        }
        .is_existential());
    }
}
