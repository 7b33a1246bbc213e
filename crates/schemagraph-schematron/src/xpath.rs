//! Query-IR-to-XPath printing.
//!
//! Every IR node kind has one translation arm returning an
//! [`XpathFragment`]: the token text plus the bookkeeping needed to embed it
//! into a larger expression, namely an operator-precedence class (decides
//! bracketing), a value-kind tag, and a binding context recording whether
//! the text is still relative to the rule's implicit context node.
//!
//! Bounded quantifiers other than the plain existential compile to a
//! counting comprehension over a fresh `$cN` variable; the counter and the
//! variable-translation cache live in a [`TranslationContext`] created
//! fresh for every rule, so nothing leaks between rules.

use std::collections::BTreeMap;

use crate::nodes::{
    AccessComponent, AccessMode, Bounds, ChainBase, CompareOp, LiteralNode, LogicOp, QueryNode,
};
use schemagraph_model::Containment;

// Operator-precedence classes, low binds loosest. A fragment embedded where
// at least `min` is required gets parenthesized when its class is lower.
const PRIO_OR: u8 = 2;
const PRIO_AND: u8 = 3;
const PRIO_COMPARE: u8 = 4;
const PRIO_UNION: u8 = 8;
const PRIO_PATH: u8 = 9;
const PRIO_ATOM: u8 = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    Number,
    Str,
    NodeSet,
}

/// Whether a fragment can still be read relative to the rule's implicit
/// context node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingContext {
    /// Context-free (literals, constants).
    #[default]
    None,
    /// Relative to the rule's context node.
    CurrentNode,
    /// Anchored elsewhere (bound variable, global lookup).
    Other,
}

impl BindingContext {
    /// Conservative merge: alignment survives only if no side lost it.
    pub fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::None, b) => b,
            (a, Self::None) => a,
            (Self::CurrentNode, Self::CurrentNode) => Self::CurrentNode,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct XpathFragment {
    pub text: String,
    pub priority: u8,
    pub kind: ValueKind,
    pub binding: BindingContext,
}

impl XpathFragment {
    fn new(text: impl Into<String>, priority: u8, kind: ValueKind, binding: BindingContext) -> Self {
        Self {
            text: text.into(),
            priority,
            kind,
            binding,
        }
    }

    fn boolean(text: impl Into<String>, priority: u8, binding: BindingContext) -> Self {
        Self::new(text, priority, ValueKind::Boolean, binding)
    }

    /// The fragment's text, parenthesized when its precedence class is too
    /// low for the embedding position.
    fn embed(&self, min_priority: u8) -> String {
        if self.priority < min_priority {
            format!("({})", self.text)
        } else {
            self.text.clone()
        }
    }
}

/// Target-dialect knobs: the document's query binding plus how object
/// references are encoded in instance documents.
#[derive(Debug, Clone)]
pub struct XpathConfig {
    pub query_binding: String,
    /// Attribute carrying an element's identifier.
    pub id_attribute: String,
    /// Attribute carrying an object reference on a property element.
    pub reference_attribute: String,
    /// Decoration wrapped around identifiers inside reference values.
    pub id_prefix: String,
    pub id_suffix: String,
}

impl Default for XpathConfig {
    fn default() -> Self {
        Self {
            query_binding: "xslt2".to_string(),
            id_attribute: "@gml:id".to_string(),
            reference_attribute: "@xlink:href".to_string(),
            id_prefix: "#".to_string(),
            id_suffix: String::new(),
        }
    }
}

/// Per-rule mutable state: the counting-variable counter, the cache mapping
/// FOL variable names to their translated XPath text, and the namespace
/// prefixes the rule's text ended up using (in first-use order).
#[derive(Debug, Default)]
pub struct TranslationContext {
    counter: u32,
    vars: BTreeMap<String, String>,
    prefixes: Vec<String>,
}

impl TranslationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn used_prefixes(&self) -> &[String] {
        &self.prefixes
    }

    fn fresh_count_var(&mut self) -> String {
        self.counter += 1;
        format!("$c{}", self.counter)
    }

    fn note_qname(&mut self, qname: &str) {
        let name = qname.strip_prefix('@').unwrap_or(qname);
        if let Some((prefix, _)) = name.split_once(':') {
            if !self.prefixes.iter().any(|p| p == prefix) {
                self.prefixes.push(prefix.to_string());
            }
        }
    }
}

pub struct XpathTranslator<'a> {
    config: &'a XpathConfig,
}

impl<'a> XpathTranslator<'a> {
    pub fn new(config: &'a XpathConfig) -> Self {
        Self { config }
    }

    /// Translates one rule's IR tree. `ctx` must be fresh for the rule.
    pub fn translate_rule(&self, node: &QueryNode, ctx: &mut TranslationContext) -> XpathFragment {
        self.translate(node, ctx)
    }

    fn translate(&self, node: &QueryNode, ctx: &mut TranslationContext) -> XpathFragment {
        match node {
            QueryNode::True => {
                XpathFragment::boolean("true()", PRIO_ATOM, BindingContext::None)
            }
            QueryNode::False => {
                XpathFragment::boolean("false()", PRIO_ATOM, BindingContext::None)
            }
            QueryNode::Logic { op, operands } => self.translate_logic(*op, operands, ctx),
            QueryNode::Not(inner) => {
                let inner = self.translate(inner, ctx);
                XpathFragment::boolean(format!("not({})", inner.text), PRIO_ATOM, inner.binding)
            }
            QueryNode::Comparison {
                op,
                identity,
                left,
                right,
            } => self.translate_comparison(*op, *identity, left, right, ctx),
            QueryNode::IsNull { operand, nilable } => self.translate_null_test(operand, *nilable, ctx),
            QueryNode::TypeTest {
                operand,
                candidates,
            } => self.translate_type_test(operand, candidates, ctx),
            QueryNode::Chain { base, components } => {
                self.translate_chain(base, components, false, ctx)
            }
            QueryNode::Literal(lit) => translate_literal(lit),
            QueryNode::Quantified {
                var,
                bounds,
                source,
                condition,
            } => self.translate_quantified(var, *bounds, source, condition, ctx),
            // Error sentinels are scanned for before translation; if one
            // slips through, the assertion must not accidentally hold.
            QueryNode::Error(_) => {
                XpathFragment::boolean("false()", PRIO_ATOM, BindingContext::None)
            }
        }
    }

    fn translate_logic(
        &self,
        op: LogicOp,
        operands: &[QueryNode],
        ctx: &mut TranslationContext,
    ) -> XpathFragment {
        let (word, priority) = match op {
            LogicOp::And => (" and ", PRIO_AND),
            LogicOp::Or => (" or ", PRIO_OR),
        };
        let mut binding = BindingContext::None;
        let mut parts = Vec::with_capacity(operands.len());
        for operand in operands {
            let fragment = self.translate(operand, ctx);
            binding = binding.merge(fragment.binding);
            parts.push(fragment.embed(priority + 1));
        }
        XpathFragment::boolean(parts.join(word), priority, binding)
    }

    fn translate_comparison(
        &self,
        op: CompareOp,
        identity: bool,
        left: &QueryNode,
        right: &QueryNode,
        ctx: &mut TranslationContext,
    ) -> XpathFragment {
        let left = self.translate(left, ctx);
        let right = self.translate(right, ctx);
        let binding = left.binding.merge(right.binding);
        let text = if identity {
            format!("generate-id({}) = generate-id({})", left.text, right.text)
        } else {
            format!(
                "{} {} {}",
                left.embed(PRIO_COMPARE + 1),
                op.symbol(),
                right.embed(PRIO_COMPARE + 1)
            )
        };
        XpathFragment::boolean(text, PRIO_COMPARE, binding)
    }

    fn translate_null_test(
        &self,
        operand: &QueryNode,
        nilable: bool,
        ctx: &mut TranslationContext,
    ) -> XpathFragment {
        // The nil guard must stay off the accessed path here, or the test
        // would contradict itself.
        let operand = match operand {
            QueryNode::Chain { base, components } => {
                self.translate_chain(base, components, true, ctx)
            }
            other => self.translate(other, ctx),
        };
        if nilable {
            ctx.note_qname("@xsi:nil");
            XpathFragment::boolean(
                format!("{}/@xsi:nil = 'true'", operand.embed(PRIO_PATH)),
                PRIO_COMPARE,
                operand.binding,
            )
        } else {
            XpathFragment::boolean(format!("not({})", operand.text), PRIO_ATOM, operand.binding)
        }
    }

    fn translate_type_test(
        &self,
        operand: &QueryNode,
        candidates: &[String],
        ctx: &mut TranslationContext,
    ) -> XpathFragment {
        if candidates.is_empty() {
            return XpathFragment::boolean("false()", PRIO_ATOM, BindingContext::None);
        }
        let operand = self.translate(operand, ctx);
        let subject = if operand.text == "." {
            "name()".to_string()
        } else {
            format!("name({})", operand.text)
        };
        let mut parts = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            ctx.note_qname(candidate);
            parts.push(format!("{subject} = '{candidate}'"));
        }
        let priority = if parts.len() == 1 { PRIO_COMPARE } else { PRIO_OR };
        XpathFragment::boolean(parts.join(" or "), priority, operand.binding)
    }

    fn translate_quantified(
        &self,
        var: &str,
        bounds: Bounds,
        source: &QueryNode,
        condition: &QueryNode,
        ctx: &mut TranslationContext,
    ) -> XpathFragment {
        let source = self.translate(source, ctx);
        // Cached variable values must splice into paths and function calls
        // without re-reading precedence, so complex sources are wrapped now.
        let source_text = source.embed(PRIO_UNION);

        if bounds.is_existential() && rides_on_node_set_semantics(condition) {
            // One-or-more with no upper bound rides on implicit node-set
            // semantics: the source itself is the existence test, and the
            // condition (if any) evaluates over the node set directly.
            let shadowed = ctx.vars.insert(var.to_string(), source_text.clone());
            let fragment = if matches!(condition, QueryNode::True) {
                XpathFragment::new(source_text, source.priority, ValueKind::NodeSet, source.binding)
            } else {
                let condition = self.translate(condition, ctx);
                let binding = source.binding.merge(condition.binding);
                XpathFragment::boolean(condition.text, condition.priority, binding)
            };
            restore_var(ctx, var, shadowed);
            return fragment;
        }

        let count_var = ctx.fresh_count_var();
        let shadowed = ctx.vars.insert(var.to_string(), count_var.clone());
        let (count_expr, binding) = if matches!(condition, QueryNode::True) {
            (format!("count({source_text})"), source.binding)
        } else {
            let condition = self.translate(condition, ctx);
            (
                format!(
                    "count(for {count_var} in {source_text} return if ({}) then {count_var} else ())",
                    condition.text
                ),
                source.binding.merge(condition.binding),
            )
        };
        restore_var(ctx, var, shadowed);

        let (text, priority) = match (bounds.lower, bounds.upper) {
            (lower, Some(upper)) if lower == upper => {
                (format!("{count_expr} = {lower}"), PRIO_COMPARE)
            }
            (lower, None) => (format!("{count_expr} >= {lower}"), PRIO_COMPARE),
            (0, Some(upper)) => (format!("{count_expr} <= {upper}"), PRIO_COMPARE),
            (lower, Some(upper)) => (
                format!("{count_expr} >= {lower} and {count_expr} <= {upper}"),
                PRIO_AND,
            ),
        };
        XpathFragment::boolean(text, priority, binding)
    }

    /// Renders an attribute chain as a location path, applying the
    /// containment policy of every object-valued access.
    fn translate_chain(
        &self,
        base: &ChainBase,
        components: &[AccessComponent],
        for_null_test: bool,
        ctx: &mut TranslationContext,
    ) -> XpathFragment {
        let (mut text, mut binding) = match base {
            ChainBase::CurrentNode => (String::new(), BindingContext::CurrentNode),
            ChainBase::Variable(name) => (
                ctx.vars.get(name).cloned().unwrap_or_else(|| ".".to_string()),
                BindingContext::Other,
            ),
        };
        let last = components.len().saturating_sub(1);
        for (index, component) in components.iter().enumerate() {
            ctx.note_qname(&component.qname);
            let mut segment = component.qname.clone();
            if component.mode == AccessMode::Absorbed && !(for_null_test && index == last) {
                ctx.note_qname("@xsi:nil");
                segment.push_str("[not(@xsi:nil = 'true')]");
            }

            // The null test addresses the property element itself; the
            // value element below it would never carry the nil attribute.
            let descend = !component.simple && !(for_null_test && index == last);
            let target = component.narrowed_to.as_ref().or(component.value_qname.as_ref());

            if component.simple || component.containment == Containment::Inline || target.is_none()
            {
                push_step(&mut text, &segment);
                if descend {
                    if let Some(target) = target {
                        ctx.note_qname(target);
                        push_step(&mut text, target);
                    }
                }
                continue;
            }

            let target = target.expect("object access has a target type");
            ctx.note_qname(target);
            let mut reference_path = text.clone();
            push_step(&mut reference_path, &segment);
            // Inside the predicate the context node is the looked-up
            // element, so a rule-relative reference path must re-anchor.
            if binding == BindingContext::CurrentNode {
                reference_path = format!("current()/{reference_path}");
            }
            let by_reference = format!(
                "//*[{} = {}/{}]",
                self.decorated_id(ctx),
                reference_path,
                self.config.reference_attribute
            );
            ctx.note_qname(&self.config.reference_attribute);

            match component.containment {
                Containment::ByReference => {
                    text = by_reference;
                }
                Containment::InlineOrByReference => {
                    let mut inline = text;
                    push_step(&mut inline, &segment);
                    push_step(&mut inline, target);
                    text = format!("({inline} | {by_reference})");
                }
                Containment::Inline => unreachable!("inline handled above"),
            }
            binding = BindingContext::Other;
        }

        if text.is_empty() {
            text.push('.');
        }
        XpathFragment::new(text, PRIO_PATH, ValueKind::NodeSet, binding)
    }

    /// The identifier attribute decorated the way reference values encode
    /// it, e.g. `concat('#', @gml:id)`.
    fn decorated_id(&self, ctx: &mut TranslationContext) -> String {
        ctx.note_qname(&self.config.id_attribute);
        let id = &self.config.id_attribute;
        match (
            self.config.id_prefix.is_empty(),
            self.config.id_suffix.is_empty(),
        ) {
            (true, true) => id.clone(),
            (false, true) => format!("concat('{}', {})", self.config.id_prefix, id),
            (true, false) => format!("concat({}, '{}')", id, self.config.id_suffix),
            (false, false) => format!(
                "concat('{}', {}, '{}')",
                self.config.id_prefix, id, self.config.id_suffix
            ),
        }
    }
}

fn push_step(path: &mut String, step: &str) {
    if !path.is_empty() {
        path.push('/');
    }
    path.push_str(step);
}

/// Whether an at-least-1 quantifier can ride on implicit node-set
/// semantics instead of the counting comprehension. Only a trivially true
/// condition, a nil-attribute read, or a single value comparison against a
/// constant keeps its meaning when evaluated over the whole node set: a
/// compound or negated condition loses the shared binding between its
/// parts, and node functions such as `name()` or `generate-id()` reject a
/// set of more than one node.
fn rides_on_node_set_semantics(condition: &QueryNode) -> bool {
    match condition {
        QueryNode::True => true,
        QueryNode::IsNull { nilable, .. } => *nilable,
        QueryNode::Comparison {
            identity: false,
            left,
            right,
            ..
        } => {
            matches!(**left, QueryNode::Literal(_)) != matches!(**right, QueryNode::Literal(_))
        }
        // Nested at-least-1 quantifiers collapse into one location path.
        QueryNode::Quantified {
            bounds, condition, ..
        } => bounds.is_existential() && rides_on_node_set_semantics(condition),
        _ => false,
    }
}

fn restore_var(ctx: &mut TranslationContext, var: &str, shadowed: Option<String>) {
    match shadowed {
        Some(previous) => {
            ctx.vars.insert(var.to_string(), previous);
        }
        None => {
            ctx.vars.remove(var);
        }
    }
}

fn translate_literal(lit: &LiteralNode) -> XpathFragment {
    match lit {
        LiteralNode::Str(s) => XpathFragment::new(
            format!("'{s}'"),
            PRIO_ATOM,
            ValueKind::Str,
            BindingContext::None,
        ),
        LiteralNode::StrList(items) => {
            let quoted: Vec<String> = items.iter().map(|s| format!("'{s}'")).collect();
            XpathFragment::new(
                format!("({})", quoted.join(", ")),
                PRIO_ATOM,
                ValueKind::Str,
                BindingContext::None,
            )
        }
        LiteralNode::Number(n) => XpathFragment::new(
            format_number(*n),
            PRIO_ATOM,
            ValueKind::Number,
            BindingContext::None,
        ),
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_merge_is_conservative() {
        use BindingContext::*;
        assert_eq!(None.merge(CurrentNode), CurrentNode);
        assert_eq!(CurrentNode.merge(CurrentNode), CurrentNode);
        assert_eq!(CurrentNode.merge(Other), Other);
        assert_eq!(Other.merge(None), Other);
    }

    #[test]
    fn numbers_print_without_spurious_fractions() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(2.5), "2.5");
    }

    #[test]
    fn count_variables_are_rule_scoped() {
        let mut ctx = TranslationContext::new();
        assert_eq!(ctx.fresh_count_var(), "$c1");
        assert_eq!(ctx.fresh_count_var(), "$c2");
        let fresh = TranslationContext::new();
        assert_eq!(fresh.counter, 0);
    }

    #[test]
    fn prefixes_are_recorded_in_first_use_order() {
        let mut ctx = TranslationContext::new();
        ctx.note_qname("apt:runway");
        ctx.note_qname("@xsi:nil");
        ctx.note_qname("apt:length");
        assert_eq!(ctx.used_prefixes(), ["apt", "xsi"]);
    }
}
