//! Tree-walking interpreter over compiled [`Expr`] trees.
//!
//! Every node evaluates as a pure function of `(node, dynamic context,
//! focus)`; the one exception is the write-once function resolution on
//! [`crate::cst::FunctionCall`].

mod comparison;
mod node_ops;
pub(crate) mod numeric;
mod quantified;
mod set_ops;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::cst::{Expr, ExprKind, FunctionCall};
use crate::error::{Error, ErrorCode};
use crate::functions::CallCtx;
use crate::item::{AtomicValue, Item, Sequence};
use crate::runtime::DynamicContext;

use self::node_ops::NodeTest;
use self::numeric::ArithOp;

/// Effective boolean value of a sequence.
///
/// Empty is false, a leading node is true, a single boolean, string or
/// number is its own truth value; anything else is `FORG0006`.
pub fn effective_boolean_value(seq: &Sequence) -> Result<bool, Error> {
    match seq.as_slice() {
        [] => Ok(false),
        [Item::Node(_), ..] => Ok(true),
        [Item::Atomic(a)] => match a {
            AtomicValue::Boolean(b) => Ok(*b),
            AtomicValue::String(s) => Ok(!s.is_empty()),
            other => numeric::is_zero(other).map(|z| !z).ok_or_else(|| {
                Error::dynamic(ErrorCode::FORG0006, "effective boolean value not defined")
            }),
        },
        _ => Err(Error::dynamic(
            ErrorCode::FORG0006,
            "effective boolean value of a sequence of two or more atomic values",
        )),
    }
}

/// Replace every node by its typed value (`FOTY0012` if it has none).
pub fn atomize(seq: &Sequence) -> Result<Vec<AtomicValue>, Error> {
    seq.iter()
        .map(|item| match item {
            Item::Atomic(a) => Ok(a.clone()),
            Item::Node(n) => n.value().ok_or_else(|| {
                Error::dynamic(
                    ErrorCode::FOTY0012,
                    format!("{:?} node has no typed value", n.kind()),
                )
            }),
        })
        .collect()
}

fn boolean(b: bool) -> Sequence {
    vec![Item::Atomic(AtomicValue::Boolean(b))]
}

/// At most one atomic from `seq`; more is `XPTY0004`.
fn optional_atomic(seq: &Sequence, what: &str) -> Result<Option<AtomicValue>, Error> {
    let mut atoms = atomize(seq)?;
    match atoms.len() {
        0 => Ok(None),
        1 => Ok(atoms.pop()),
        n => Err(Error::dynamic(
            ErrorCode::XPTY0004,
            format!("{what} expects at most one item, got {n}"),
        )),
    }
}

fn optional_integer(seq: &Sequence, what: &str) -> Result<Option<BigInt>, Error> {
    match optional_atomic(seq, what)? {
        None => Ok(None),
        Some(AtomicValue::Integer(i)) => Ok(Some(i)),
        Some(other) => Err(Error::dynamic(
            ErrorCode::XPTY0004,
            format!("{what} expects an integer, got {}", other.type_name()),
        )),
    }
}

fn arithmetic(
    op: ArithOp,
    l: &Expr,
    r: &Expr,
    ctx: &DynamicContext,
    focus: &Sequence,
) -> Result<Sequence, Error> {
    let a = optional_atomic(&l.evaluate(ctx, focus)?, "arithmetic")?;
    let b = optional_atomic(&r.evaluate(ctx, focus)?, "arithmetic")?;
    match (a, b) {
        (Some(a), Some(b)) => Ok(vec![Item::Atomic(numeric::arithmetic(op, &a, &b)?)]),
        _ => Ok(vec![]),
    }
}

/// Upper bound on the number of integers a single `to` expression produces.
pub const MAX_RANGE_ITEMS: usize = 1 << 24;

fn range(l: &Expr, r: &Expr, ctx: &DynamicContext, focus: &Sequence) -> Result<Sequence, Error> {
    let (Some(start), Some(end)) = (
        optional_integer(&l.evaluate(ctx, focus)?, "range")?,
        optional_integer(&r.evaluate(ctx, focus)?, "range")?,
    ) else {
        return Ok(vec![]);
    };
    if start > end {
        return Ok(vec![]);
    }
    let too_large = || Error::dynamic(ErrorCode::FOAR0002, "range is too large to materialize");
    let span = (&end - &start).to_usize().ok_or_else(too_large)?;
    if span >= MAX_RANGE_ITEMS {
        return Err(too_large());
    }
    let mut out = Vec::new();
    let mut cur = start;
    while cur <= end {
        out.push(Item::Atomic(AtomicValue::Integer(cur.clone())));
        cur += 1u32;
    }
    Ok(out)
}

/// Evaluate `step` once per item of `left`, each as a singleton focus, and
/// normalize the combined result.
fn per_item(
    left: Sequence,
    step: &Expr,
    ctx: &DynamicContext,
) -> Result<Sequence, Error> {
    let size = left.len();
    let mut out = Vec::new();
    for (i, item) in left.into_iter().enumerate() {
        if let Item::Atomic(a) = &item {
            return Err(Error::dynamic(
                ErrorCode::XPTY0019,
                format!("path step applied to a {} value", a.type_name()),
            ));
        }
        out.extend(step.evaluate(&ctx.with_focus_position(i + 1, size), &vec![item])?);
    }
    set_ops::path_result(out)
}

fn descendant_context(focus: Sequence) -> Result<Sequence, Error> {
    let nodes = set_ops::nodes_of(focus, "//")?;
    Ok(set_ops::to_sequence(node_ops::descendant_or_self_all(&nodes)))
}

fn navigate(
    axis: crate::cst::Axis,
    test: NodeTest<'_>,
    focus: &Sequence,
) -> Result<Sequence, Error> {
    let mut out = Vec::new();
    for n in node_ops::focus_nodes(focus)? {
        out.extend(node_ops::axis_nodes(n, axis).into_iter().filter(|c| test.matches(c)));
    }
    Ok(set_ops::to_sequence(set_ops::doc_order_distinct(out)))
}

fn select(
    focus: &Sequence,
    test: NodeTest<'_>,
    pick: impl Fn(&crate::model::NodeRef) -> Vec<crate::model::NodeRef>,
) -> Result<Sequence, Error> {
    let mut out = Vec::new();
    for n in node_ops::focus_nodes(focus)? {
        out.extend(pick(n).into_iter().filter(|c| test.matches(c)));
    }
    Ok(set_ops::to_sequence(set_ops::doc_order_distinct(out)))
}

/// Keep candidates whose predicate value is their position (numeric) or
/// whose effective boolean value is true.
fn filter(
    candidates: Sequence,
    predicates: &[Expr],
    ctx: &DynamicContext,
) -> Result<Sequence, Error> {
    let mut current = candidates;
    for pred in predicates {
        let size = current.len();
        let mut kept = Vec::with_capacity(size);
        for (i, item) in current.into_iter().enumerate() {
            let position = i + 1;
            let inner = ctx.with_focus_position(position, size);
            let value = pred.evaluate(&inner, &vec![item.clone()])?;
            let keep = match value.as_slice() {
                [Item::Atomic(a)] if a.is_numeric() => numeric::equals_position(a, position),
                _ => effective_boolean_value(&value)?,
            };
            if keep {
                kept.push(item);
            }
        }
        current = kept;
    }
    Ok(current)
}

/// Predicates on a reverse-axis step see the candidates of one focus node at
/// a time, nearest first, so `ancestor::*[1]` is the parent.
fn filter_reverse_step(
    axis: crate::cst::Axis,
    test: NodeTest<'_>,
    predicates: &[Expr],
    ctx: &DynamicContext,
    focus: &Sequence,
) -> Result<Sequence, Error> {
    let mut out = Vec::new();
    for n in node_ops::focus_nodes(focus)? {
        let candidates: Vec<_> =
            node_ops::axis_nodes(n, axis).into_iter().filter(|c| test.matches(c)).collect();
        let kept = filter(set_ops::to_sequence(candidates), predicates, ctx)?;
        out.extend(set_ops::nodes_of(kept, "predicate")?);
    }
    Ok(set_ops::to_sequence(set_ops::doc_order_distinct(out)))
}

fn call_function(
    call: &FunctionCall,
    ctx: &DynamicContext,
    focus: &Sequence,
) -> Result<Sequence, Error> {
    let function = call.resolve_function(ctx.function_registry())?;
    let args: Vec<Sequence> =
        call.arguments().iter().map(|a| a.evaluate(ctx, focus)).collect::<Result<_, _>>()?;
    function.invoke(&CallCtx { dyn_ctx: ctx, focus }, &args)
}

impl Expr {
    /// Evaluate against `ctx` with `focus` as the context sequence.
    pub fn evaluate(&self, ctx: &DynamicContext, focus: &Sequence) -> Result<Sequence, Error> {
        use ExprKind::*;
        match self.kind() {
            StringLiteral(s) => Ok(vec![Item::Atomic(AtomicValue::String(s.clone()))]),
            IntegerLiteral(i) => Ok(vec![Item::Atomic(AtomicValue::Integer(i.clone()))]),
            DecimalLiteral(d) => Ok(vec![Item::Atomic(AtomicValue::Decimal(*d))]),
            EmptySequence => Ok(vec![]),
            ContextItem => {
                if focus.is_empty() {
                    return Err(Error::context_empty());
                }
                Ok(focus.clone())
            }

            Metapath(items) => {
                let mut out = Vec::new();
                for e in items {
                    out.extend(e.evaluate(ctx, focus)?);
                }
                Ok(out)
            }
            Union(items) => {
                let operands = items.iter().map(|e| e.evaluate(ctx, focus)).collect::<Result<_, _>>()?;
                set_ops::union(operands)
            }
            Intersect(l, r) => set_ops::intersect(l.evaluate(ctx, focus)?, r.evaluate(ctx, focus)?),
            Except(l, r) => set_ops::except(l.evaluate(ctx, focus)?, r.evaluate(ctx, focus)?),
            Range(l, r) => range(l, r, ctx, focus),
            StringConcat(items) => {
                let mut s = String::new();
                for e in items {
                    if let Some(a) = optional_atomic(&e.evaluate(ctx, focus)?, "'||'")? {
                        s.push_str(&a.as_string());
                    }
                }
                Ok(vec![Item::Atomic(AtomicValue::String(s))])
            }

            And(items) => {
                for e in items {
                    if !effective_boolean_value(&e.evaluate(ctx, focus)?)? {
                        return Ok(boolean(false));
                    }
                }
                Ok(boolean(true))
            }
            Or(items) => {
                for e in items {
                    if effective_boolean_value(&e.evaluate(ctx, focus)?)? {
                        return Ok(boolean(true));
                    }
                }
                Ok(boolean(false))
            }
            Negate(e) => match optional_atomic(&e.evaluate(ctx, focus)?, "unary minus")? {
                Some(a) => Ok(vec![Item::Atomic(numeric::negate(&a)?)]),
                None => Ok(vec![]),
            },

            Addition(l, r) => arithmetic(ArithOp::Add, l, r, ctx, focus),
            Subtraction(l, r) => arithmetic(ArithOp::Sub, l, r, ctx, focus),
            Multiplication(l, r) => arithmetic(ArithOp::Mul, l, r, ctx, focus),
            Division(l, r) => arithmetic(ArithOp::Div, l, r, ctx, focus),
            IntegerDivision(l, r) => arithmetic(ArithOp::IDiv, l, r, ctx, focus),
            Modulo(l, r) => arithmetic(ArithOp::Mod, l, r, ctx, focus),

            ValueComparison { left, op, right } => {
                let l = left.evaluate(ctx, focus)?;
                let r = right.evaluate(ctx, focus)?;
                Ok(comparison::value_compare(&l, *op, &r)?.map(boolean).unwrap_or_default())
            }
            GeneralComparison { left, op, right } => {
                let l = left.evaluate(ctx, focus)?;
                let r = right.evaluate(ctx, focus)?;
                Ok(boolean(comparison::general_compare(&l, *op, &r)?))
            }

            RootSlashOnlyPath => Ok(set_ops::to_sequence(node_ops::focus_roots(focus)?)),
            RootSlashPath(e) => {
                let roots = set_ops::to_sequence(node_ops::focus_roots(focus)?);
                per_item(roots, e, ctx)
            }
            RootDoubleSlashPath(e) => {
                let roots = set_ops::to_sequence(node_ops::focus_roots(focus)?);
                per_item(descendant_context(roots)?, e, ctx)
            }
            RelativeSlashPath(l, r) => per_item(l.evaluate(ctx, focus)?, r, ctx),
            RelativeDoubleSlashPath(l, r) => {
                let left = set_ops::path_result(l.evaluate(ctx, focus)?)?;
                if let Some(Item::Atomic(a)) = left.first() {
                    return Err(Error::dynamic(
                        ErrorCode::XPTY0019,
                        format!("path step applied to a {} value", a.type_name()),
                    ));
                }
                per_item(descendant_context(left)?, r, ctx)
            }
            Step { axis, test } => navigate(*axis, NodeTest::from_expr(test)?, focus),
            ExprKind::Axis(axis) => navigate(*axis, NodeTest::Any, focus),
            Predicate { base, predicates } => match base.kind() {
                Step { axis, test } if axis.is_reverse() => {
                    filter_reverse_step(*axis, NodeTest::from_expr(test)?, predicates, ctx, focus)
                }
                ExprKind::Axis(axis) if axis.is_reverse() => {
                    filter_reverse_step(*axis, NodeTest::Any, predicates, ctx, focus)
                }
                _ => filter(base.evaluate(ctx, focus)?, predicates, ctx),
            },
            ModelInstance(test) => select(focus, NodeTest::from_expr(test)?, |n| n.model_children()),
            Flag(test) => select(focus, NodeTest::from_expr(test)?, |n| n.flags()),
            ExprKind::Wildcard(_) | Name(_) => {
                navigate(crate::cst::Axis::SelfAxis, NodeTest::from_expr(self)?, focus)
            }

            Let { name, bound, body } => {
                let value = bound.evaluate(ctx, focus)?;
                body.evaluate(&ctx.bind_variable(name.clone(), value), focus)
            }
            For { name, source, body } => {
                let mut out = Vec::new();
                for item in source.evaluate(ctx, focus)? {
                    out.extend(body.evaluate(&ctx.bind_variable(name.clone(), vec![item]), focus)?);
                }
                Ok(out)
            }
            Quantified { quantifier, bindings, satisfies } => Ok(boolean(
                quantified::evaluate_quantified(*quantifier, bindings, satisfies, ctx, focus)?,
            )),
            If { test, then, otherwise } => {
                if effective_boolean_value(&test.evaluate(ctx, focus)?)? {
                    then.evaluate(ctx, focus)
                } else {
                    otherwise.evaluate(ctx, focus)
                }
            }

            ExprKind::FunctionCall(call) => call_function(call, ctx, focus),
            VariableReference(name) => ctx.variable(name).cloned().ok_or_else(|| {
                Error::dynamic(ErrorCode::XPST0008, format!("variable ${name} is not bound"))
            }),
            SimpleMap(items) => {
                let Some((first, rest)) = items.split_first() else {
                    return Ok(vec![]);
                };
                let mut current = first.evaluate(ctx, focus)?;
                for step in rest {
                    let size = current.len();
                    let mut next = Vec::new();
                    for (i, item) in current.into_iter().enumerate() {
                        next.extend(step.evaluate(&ctx.with_focus_position(i + 1, size), &vec![item])?);
                    }
                    current = next;
                }
                Ok(current)
            }
        }
    }
}
