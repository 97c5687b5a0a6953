//! Compiled expressions: parse, build, resolve functions, evaluate.
//!
//! ```
//! use metapath::{DynamicContext, MetapathExpression, StaticContext};
//!
//! let expr = MetapathExpression::compile("for $x in 1 to 3 return $x * 2", &StaticContext::default())?;
//! let out = expr.evaluate(&DynamicContext::default(), &vec![])?;
//! assert_eq!(out.len(), 3);
//! # Ok::<(), metapath::Error>(())
//! ```

use core::fmt;

use crate::cst::{CstBuilder, Expr, FunctionCall, Visitor};
use crate::error::{Error, ErrorCode};
use crate::evaluator::{atomize, effective_boolean_value};
use crate::functions::FunctionRegistry;
use crate::item::{AtomicValue, Item, Sequence};
use crate::model::NodeRef;
use crate::runtime::{DynamicContext, StaticContext};
use crate::types::ItemType;

/// Shape a caller wants an evaluation result converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    Sequence,
    Item,
    Boolean,
    String,
    Number,
    Node,
}

#[derive(Debug, Clone)]
pub enum TypedResult {
    Sequence(Sequence),
    /// First item, if any.
    Item(Option<Item>),
    /// Effective boolean value.
    Boolean(bool),
    /// String value of the first item; empty string for an empty result.
    String(String),
    /// First item atomized to a number.
    Number(Option<AtomicValue>),
    /// First item as a node.
    Node(Option<NodeRef>),
}

struct FunctionResolver<'r> {
    registry: &'r FunctionRegistry,
    error: Option<Error>,
}

impl<'ast> Visitor<'ast> for FunctionResolver<'_> {
    fn visit_function_call(&mut self, call: &'ast FunctionCall) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = call.resolve_function(self.registry) {
            self.error = Some(e);
            return;
        }
        for arg in call.arguments() {
            self.visit_expr(arg);
        }
    }
}

/// An immutable compiled expression. Share it freely between threads.
#[derive(Debug, Clone)]
pub struct MetapathExpression {
    source: String,
    root: Expr,
}

impl MetapathExpression {
    /// Parse and build `source`, then resolve every function call against
    /// the static context's registry.
    pub fn compile(source: &str, static_ctx: &StaticContext) -> Result<Self, Error> {
        let root = CstBuilder::new(static_ctx).build_str(source)?;
        let mut resolver = FunctionResolver { registry: static_ctx.function_registry(), error: None };
        root.accept(&mut resolver);
        if let Some(e) = resolver.error {
            return Err(e);
        }
        tracing::debug!(source, nodes = root.node_count(), "compiled metapath");
        Ok(Self { source: source.to_string(), root })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }

    pub fn static_result_type(&self) -> ItemType {
        self.root.static_result_type()
    }

    pub fn evaluate(&self, ctx: &DynamicContext, focus: &Sequence) -> Result<Sequence, Error> {
        self.root.evaluate(ctx, focus).inspect_err(|e| {
            tracing::trace!(source = %self.source, code = %e.code, error = %e.message, "evaluation failed");
        })
    }

    pub fn evaluate_as(
        &self,
        ctx: &DynamicContext,
        focus: &Sequence,
        result_type: ResultType,
    ) -> Result<TypedResult, Error> {
        let seq = self.evaluate(ctx, focus)?;
        Ok(match result_type {
            ResultType::Sequence => TypedResult::Sequence(seq),
            ResultType::Item => TypedResult::Item(seq.into_iter().next()),
            ResultType::Boolean => TypedResult::Boolean(effective_boolean_value(&seq)?),
            ResultType::String => {
                TypedResult::String(seq.first().map(Item::string_value).unwrap_or_default())
            }
            ResultType::Number => {
                let first: Sequence = seq.into_iter().take(1).collect();
                match atomize(&first)?.pop() {
                    None => TypedResult::Number(None),
                    Some(a) if a.is_numeric() => TypedResult::Number(Some(a)),
                    Some(a) => {
                        return Err(Error::dynamic(
                            ErrorCode::XPTY0004,
                            format!("expected a number, got {}", a.type_name()),
                        ));
                    }
                }
            }
            ResultType::Node => match seq.into_iter().next() {
                None => TypedResult::Node(None),
                Some(Item::Node(n)) => TypedResult::Node(Some(n)),
                Some(Item::Atomic(a)) => {
                    return Err(Error::dynamic(
                        ErrorCode::XPTY0004,
                        format!("expected a node, got {}", a.type_name()),
                    ));
                }
            },
        })
    }
}

impl fmt::Display for MetapathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Compile against the default static context.
pub fn compile(source: &str) -> Result<MetapathExpression, Error> {
    MetapathExpression::compile(source, &StaticContext::default())
}

/// Compile with the default static context and evaluate with an empty focus.
pub fn evaluate_expr(source: &str, ctx: &DynamicContext) -> Result<Sequence, Error> {
    compile(source)?.evaluate(ctx, &Vec::new())
}
