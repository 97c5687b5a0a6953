//! Compact syntax tree: the compiled, immutable expression-node tree.
//!
//! Trees are built once by [`CstBuilder`] and can then be evaluated any number
//! of times, from any number of threads. The only interior state is the
//! write-once static type cache on [`Expr`] and the write-once function
//! reference on [`FunctionCall`].

mod builder;
mod printer;
mod visitor;

pub use builder::CstBuilder;
pub use printer::CstPrinter;
pub use visitor::{Visitor, walk_expr};

use core::fmt;
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use itertools::Itertools;
use num_bigint::BigInt;
use rust_decimal::Decimal;
use smallvec::SmallVec;

use crate::error::Error;
use crate::functions::{Function, FunctionRegistry};
use crate::item::ExpandedName;
use crate::types::{ItemType, analyze_static_result_type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    SelfAxis,
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
}

impl Axis {
    pub fn is_reverse(self) -> bool {
        matches!(self, Axis::Parent | Axis::Ancestor | Axis::AncestorOrSelf)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Axis::SelfAxis => "self",
            Axis::Child => "child",
            Axis::Descendant => "descendant",
            Axis::DescendantOrSelf => "descendant-or-self",
            Axis::Parent => "parent",
            Axis::Ancestor => "ancestor",
            Axis::AncestorOrSelf => "ancestor-or-self",
        }
    }
}

/// Comparison operator shared by value and general comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Operator {
    pub fn test(self, ord: core::cmp::Ordering) -> bool {
        use core::cmp::Ordering::*;
        match self {
            Operator::Eq => ord == Equal,
            Operator::Ne => ord != Equal,
            Operator::Lt => ord == Less,
            Operator::Le => ord != Greater,
            Operator::Gt => ord == Greater,
            Operator::Ge => ord != Less,
        }
    }

    fn value_symbol(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Lt => "lt",
            Operator::Le => "le",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
        }
    }

    fn general_symbol(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantifier {
    Some,
    Every,
}

/// Name test with at least one wildcard part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Wildcard {
    /// `*`
    Any,
    /// `prefix:*` or `Q{uri}*`; `None` matches names without a namespace.
    Namespace(Option<String>),
    /// `*:local`
    LocalName(String),
}

impl Wildcard {
    pub fn matches(&self, name: &ExpandedName) -> bool {
        match self {
            Wildcard::Any => true,
            Wildcard::Namespace(ns) => name.ns_uri == *ns,
            Wildcard::LocalName(local) => name.local == *local,
        }
    }
}

impl fmt::Display for Wildcard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wildcard::Any => f.write_str("*"),
            Wildcard::Namespace(Some(ns)) => write!(f, "Q{{{ns}}}*"),
            Wildcard::Namespace(None) => f.write_str("Q{}*"),
            Wildcard::LocalName(local) => write!(f, "*:{local}"),
        }
    }
}

/// A static function call. The target function is resolved at most once
/// and the outcome, success or failure, is kept for every later evaluation.
#[derive(Debug, Clone)]
pub struct FunctionCall {
    name: ExpandedName,
    arguments: Vec<Expr>,
    function: OnceLock<Result<Arc<Function>, Error>>,
}

impl FunctionCall {
    pub fn new(name: ExpandedName, arguments: Vec<Expr>) -> Self {
        Self { name, arguments, function: OnceLock::new() }
    }

    pub fn name(&self) -> &ExpandedName {
        &self.name
    }

    pub fn arguments(&self) -> &[Expr] {
        &self.arguments
    }

    /// Resolve against `registry` unless already resolved. Concurrent callers
    /// block on the first resolution and all observe the same reference.
    pub fn resolve_function(&self, registry: &FunctionRegistry) -> Result<Arc<Function>, Error> {
        self.function.get_or_init(|| registry.resolve(&self.name, self.arguments.len())).clone()
    }

    pub fn resolved_function(&self) -> Option<&Result<Arc<Function>, Error>> {
        self.function.get()
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    StringLiteral(String),
    IntegerLiteral(BigInt),
    DecimalLiteral(Decimal),
    EmptySequence,

    /// Top-level comma sequence.
    Metapath(Vec<Expr>),
    Union(Vec<Expr>),
    Intersect(Box<Expr>, Box<Expr>),
    Except(Box<Expr>, Box<Expr>),
    Range(Box<Expr>, Box<Expr>),
    StringConcat(Vec<Expr>),

    And(Vec<Expr>),
    Or(Vec<Expr>),
    Negate(Box<Expr>),

    Addition(Box<Expr>, Box<Expr>),
    Subtraction(Box<Expr>, Box<Expr>),
    Multiplication(Box<Expr>, Box<Expr>),
    Division(Box<Expr>, Box<Expr>),
    IntegerDivision(Box<Expr>, Box<Expr>),
    Modulo(Box<Expr>, Box<Expr>),

    ValueComparison { left: Box<Expr>, op: Operator, right: Box<Expr> },
    GeneralComparison { left: Box<Expr>, op: Operator, right: Box<Expr> },

    /// `/`
    RootSlashOnlyPath,
    /// `/expr`
    RootSlashPath(Box<Expr>),
    /// `//expr`
    RootDoubleSlashPath(Box<Expr>),
    RelativeSlashPath(Box<Expr>, Box<Expr>),
    RelativeDoubleSlashPath(Box<Expr>, Box<Expr>),
    /// Explicit axis with a node test (`Name` or `Wildcard`).
    Step { axis: Axis, test: Box<Expr> },
    /// All nodes on an axis, no node test (`..`).
    Axis(Axis),
    Predicate { base: Box<Expr>, predicates: Vec<Expr> },
    /// Abbreviated child step over assemblies and fields.
    ModelInstance(Box<Expr>),
    /// Abbreviated `@` step over flags.
    Flag(Box<Expr>),
    Wildcard(Wildcard),
    Name(ExpandedName),
    ContextItem,

    Let { name: ExpandedName, bound: Box<Expr>, body: Box<Expr> },
    For { name: ExpandedName, source: Box<Expr>, body: Box<Expr> },
    /// Bindings keep declaration order.
    Quantified {
        quantifier: Quantifier,
        bindings: IndexMap<ExpandedName, Expr>,
        satisfies: Box<Expr>,
    },
    If { test: Box<Expr>, then: Box<Expr>, otherwise: Box<Expr> },

    FunctionCall(FunctionCall),
    VariableReference(ExpandedName),
    SimpleMap(Vec<Expr>),
}

/// One node of the compiled expression tree.
#[derive(Debug, Clone)]
pub struct Expr {
    kind: ExprKind,
    static_type: OnceLock<ItemType>,
}

impl From<ExprKind> for Expr {
    fn from(kind: ExprKind) -> Self {
        Expr::new(kind)
    }
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self { kind, static_type: OnceLock::new() }
    }

    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    /// Child expressions in their fixed construction order.
    pub fn children(&self) -> SmallVec<[&Expr; 4]> {
        use ExprKind::*;
        let mut out = SmallVec::new();
        match &self.kind {
            StringLiteral(_) | IntegerLiteral(_) | DecimalLiteral(_) | EmptySequence
            | RootSlashOnlyPath | ExprKind::Axis(_) | ExprKind::Wildcard(_) | Name(_) | ContextItem
            | VariableReference(_) => {}
            Metapath(v) | Union(v) | StringConcat(v) | And(v) | Or(v) | SimpleMap(v) => {
                out.extend(v.iter())
            }
            Intersect(l, r)
            | Except(l, r)
            | Range(l, r)
            | Addition(l, r)
            | Subtraction(l, r)
            | Multiplication(l, r)
            | Division(l, r)
            | IntegerDivision(l, r)
            | Modulo(l, r)
            | RelativeSlashPath(l, r)
            | RelativeDoubleSlashPath(l, r)
            | ValueComparison { left: l, right: r, .. }
            | GeneralComparison { left: l, right: r, .. } => {
                out.push(l.as_ref());
                out.push(r.as_ref());
            }
            Negate(e) | RootSlashPath(e) | RootDoubleSlashPath(e) | ModelInstance(e) | Flag(e) => {
                out.push(e.as_ref())
            }
            Step { test, .. } => out.push(test.as_ref()),
            Predicate { base, predicates } => {
                out.push(base.as_ref());
                out.extend(predicates.iter());
            }
            Let { bound: a, body: b, .. } | For { source: a, body: b, .. } => {
                out.push(a.as_ref());
                out.push(b.as_ref());
            }
            Quantified { bindings, satisfies, .. } => {
                out.extend(bindings.values());
                out.push(satisfies.as_ref());
            }
            If { test, then, otherwise } => {
                out.push(test.as_ref());
                out.push(then.as_ref());
                out.push(otherwise.as_ref());
            }
            ExprKind::FunctionCall(call) => out.extend(call.arguments.iter()),
        }
        out
    }

    /// Narrowest statically known item type; computed once, then cached.
    pub fn static_result_type(&self) -> ItemType {
        *self.static_type.get_or_init(|| self.compute_static_type())
    }

    fn compute_static_type(&self) -> ItemType {
        use ExprKind::*;
        let of = |e: &Expr| e.static_result_type();
        let all = |base: ItemType| analyze_static_result_type(base, self.children().into_iter().map(of));
        match &self.kind {
            StringLiteral(_) | StringConcat(_) => ItemType::String,
            IntegerLiteral(_) | Range(..) | IntegerDivision(..) => ItemType::Integer,
            DecimalLiteral(_) | Division(..) => ItemType::Decimal,
            EmptySequence | ContextItem | VariableReference(_) => ItemType::Item,
            Metapath(_) => all(ItemType::Item),
            Union(_) | Intersect(..) | Except(..) => all(ItemType::Node),
            And(_) | Or(_) | ValueComparison { .. } | GeneralComparison { .. } | Quantified { .. } => {
                ItemType::Boolean
            }
            Negate(_) | Addition(..) | Subtraction(..) | Multiplication(..) | Modulo(..) => {
                all(ItemType::Numeric)
            }
            RootSlashOnlyPath | Step { .. } | ExprKind::Axis(_) | ExprKind::Wildcard(_) | Name(_) => ItemType::Node,
            ModelInstance(_) => ItemType::Model,
            Flag(_) => ItemType::Flag,
            RootSlashPath(e) | RootDoubleSlashPath(e) => of(e),
            RelativeSlashPath(_, r) | RelativeDoubleSlashPath(_, r) => of(r),
            Predicate { base, .. } => of(base),
            Let { body, .. } | For { body, .. } => of(body),
            If { then, otherwise, .. } => {
                analyze_static_result_type(ItemType::Item, [of(then), of(otherwise)])
            }
            SimpleMap(v) => v.last().map_or(ItemType::Item, of),
            ExprKind::FunctionCall(call) => match call.resolved_function() {
                Some(Ok(f)) => f.result_type(),
                _ => ItemType::Item,
            },
        }
    }

    /// Node label used by the tree printer, e.g. `Step[child]`.
    pub fn label(&self) -> String {
        use ExprKind::*;
        match &self.kind {
            StringLiteral(s) => format!("StringLiteral[{s:?}]"),
            IntegerLiteral(i) => format!("IntegerLiteral[{i}]"),
            DecimalLiteral(d) => format!("DecimalLiteral[{d}]"),
            EmptySequence => "EmptySequence".into(),
            Metapath(_) => "Metapath".into(),
            Union(_) => "Union".into(),
            Intersect(..) => "Intersect".into(),
            Except(..) => "Except".into(),
            Range(..) => "Range".into(),
            StringConcat(_) => "StringConcat".into(),
            And(_) => "And".into(),
            Or(_) => "Or".into(),
            Negate(_) => "Negate".into(),
            Addition(..) => "Addition".into(),
            Subtraction(..) => "Subtraction".into(),
            Multiplication(..) => "Multiplication".into(),
            Division(..) => "Division".into(),
            IntegerDivision(..) => "IntegerDivision".into(),
            Modulo(..) => "Modulo".into(),
            ValueComparison { op, .. } => format!("ValueComparison[{}]", op.value_symbol()),
            GeneralComparison { op, .. } => format!("GeneralComparison[{}]", op.general_symbol()),
            RootSlashOnlyPath => "RootSlashOnlyPath".into(),
            RootSlashPath(_) => "RootSlashPath".into(),
            RootDoubleSlashPath(_) => "RootDoubleSlashPath".into(),
            RelativeSlashPath(..) => "RelativeSlashPath".into(),
            RelativeDoubleSlashPath(..) => "RelativeDoubleSlashPath".into(),
            Step { axis, .. } => format!("Step[{}]", axis.as_str()),
            ExprKind::Axis(axis) => format!("Axis[{}]", axis.as_str()),
            Predicate { .. } => "Predicate".into(),
            ModelInstance(_) => "ModelInstance".into(),
            Flag(_) => "Flag".into(),
            ExprKind::Wildcard(w) => format!("Wildcard[{w}]"),
            Name(n) => format!("Name[{n}]"),
            ContextItem => "ContextItem".into(),
            Let { name, .. } => format!("Let[${name}]"),
            For { name, .. } => format!("For[${name}]"),
            Quantified { quantifier, bindings, .. } => {
                let q = match quantifier {
                    Quantifier::Some => "some",
                    Quantifier::Every => "every",
                };
                format!("Quantified[{q} {}]", bindings.keys().map(|n| format!("${n}")).join(", "))
            }
            If { .. } => "If".into(),
            ExprKind::FunctionCall(call) => format!("FunctionCall[{}#{}]", call.name, call.arguments.len()),
            VariableReference(n) => format!("VariableReference[${n}]"),
            SimpleMap(_) => "SimpleMap".into(),
        }
    }

    pub fn accept<'ast, V: Visitor<'ast> + ?Sized>(&'ast self, visitor: &mut V) {
        visitor.visit_expr(self);
    }

    /// Indented dump of the tree, one node per line.
    pub fn to_tree_string(&self) -> String {
        let mut printer = CstPrinter::default();
        self.accept(&mut printer);
        printer.finish()
    }

    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(|c| c.node_count()).sum::<usize>()
    }
}
