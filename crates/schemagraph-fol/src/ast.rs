//! FOL expression tree: closed sum types, exhaustively matchable.

use std::rc::Rc;

use schemagraph_model::Containment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JunctionOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ge,
    Gt,
    Le,
    Lt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    StrList(Vec<String>),
    Real(f64),
    /// A class name used as a literal (type-test operand).
    Class(String),
}

/// A quantifier over a bound variable. `Bounded { lower: 1, upper: None }`
/// is the plain existential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Universal,
    Bounded { lower: u32, upper: Option<u32> },
}

impl Quantifier {
    pub fn existential() -> Self {
        Self::Bounded {
            lower: 1,
            upper: None,
        }
    }

    pub fn exactly(n: u32) -> Self {
        Self::Bounded {
            lower: n,
            upper: Some(n),
        }
    }

    pub fn at_least(n: u32) -> Self {
        Self::Bounded {
            lower: n,
            upper: None,
        }
    }

    pub fn at_most(n: u32) -> Self {
        Self::Bounded {
            lower: 0,
            upper: Some(n),
        }
    }

    pub fn range(lower: u32, upper: u32) -> Self {
        Self::Bounded {
            lower,
            upper: Some(upper),
        }
    }

    /// The plain existential, which the backend compiles through implicit
    /// node-set semantics instead of a counting comprehension.
    pub fn is_existential(self) -> bool {
        matches!(self, Self::Bounded { lower: 1, upper: None })
    }
}

/// A lexically scoped variable. `outer` links to the nearest enclosing
/// scope; the chain ends at the `self` variable of the rule's subject.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    /// Navigation chain supplying this variable's value. The `self`
    /// variable carries a single class step naming the subject class.
    pub value: Option<SchemaCall>,
    pub outer: Option<Rc<Variable>>,
}

impl Variable {
    pub fn self_var(subject_class: &str) -> Rc<Self> {
        Rc::new(Self {
            name: "self".to_string(),
            value: Some(SchemaCall {
                steps: vec![SchemaStep::Class {
                    name: subject_class.to_string(),
                }],
            }),
            outer: None,
        })
    }

    pub fn is_self(&self) -> bool {
        self.outer.is_none()
    }

    /// Class context established at the end of this variable's chain (the
    /// value type of the last property step, or the narrowed class).
    pub fn terminal_type(&self) -> Option<&str> {
        self.value.as_ref().and_then(SchemaCall::terminal_type)
    }
}

/// An ordered sequence of navigation steps describing how a variable's
/// value is reached from its base context.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaCall {
    pub steps: Vec<SchemaStep>,
}

impl SchemaCall {
    pub fn terminal_type(&self) -> Option<&str> {
        self.steps.last().map(|step| match step {
            SchemaStep::Class { name } => name.as_str(),
            SchemaStep::Property(p) => p.value_type.as_str(),
        })
    }

    /// The last property step of the chain, if any.
    pub fn terminal_property(&self) -> Option<&PropertyStep> {
        self.steps.iter().rev().find_map(|step| match step {
            SchemaStep::Property(p) => Some(p),
            SchemaStep::Class { .. } => None,
        })
    }
}

/// One navigation step: a class step narrows the type (kind-of
/// disambiguation), a property step navigates a resolved property.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaStep {
    Class { name: String },
    Property(PropertyStep),
}

/// A property step, fully resolved against the schema graph.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyStep {
    pub name: String,
    /// Class the lookup resolved against (may be an ancestor of the scope's
    /// terminal class).
    pub owner: String,
    /// Namespace prefix used when the step is emitted as a qualified name.
    pub prefix: String,
    pub value_type: String,
    /// Simple (leaf) value type: the chain terminates here.
    pub simple: bool,
    pub nilable: bool,
    pub containment: Containment,
    /// Variable whose value supplies the base node for this chain; set on
    /// the first step of a chain rooted in an enclosing scope.
    pub var_context: Option<Rc<Variable>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Var(Rc<Variable>),
    Literal(Literal),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quantification {
    pub var: Rc<Variable>,
    pub quantifier: Quantifier,
    pub condition: Box<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Flat n-ary conjunction/disjunction; a single polarity per node.
    Junction {
        op: JunctionOp,
        operands: Vec<Predicate>,
    },
    Not(Box<Predicate>),
    Comparison {
        op: ComparisonOp,
        left: Expression,
        right: Expression,
    },
    IsNull(Expression),
    /// Is-kind-of test against one or more class literals (lexically
    /// sorted by the builder).
    KindOf {
        operand: Expression,
        classes: Vec<String>,
    },
    Quantified(Quantification),
    /// Constant truth: the condition of a bare existence check
    /// (`shall have a height`).
    True,
}
