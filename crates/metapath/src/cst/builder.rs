//! Parse tree → CST.
//!
//! One handler per grammar production. Productions that carry a single
//! operand are skipped without creating a node; n-ary productions with
//! equivalent operators fold into one flat node; productions mixing distinct
//! binary operators fold left-associatively.

use std::str::FromStr;

use indexmap::IndexMap;
use num_bigint::BigInt;
use pest::iterators::{Pair, Pairs};
use rust_decimal::Decimal;

use crate::consts::XMLNS_URI;
use crate::error::{Error, ErrorCode};
use crate::item::ExpandedName;
use crate::parser::{MetapathParser, Rule, first_token_rule};
use crate::runtime::StaticContext;

use super::{Axis, Expr, ExprKind, FunctionCall, Operator, Quantifier, Wildcard};

fn next_pair<'i, I>(it: &mut I, what: &str) -> Result<Pair<'i, Rule>, Error>
where
    I: Iterator<Item = Pair<'i, Rule>>,
{
    it.next().ok_or_else(|| Error::defect(format!("missing {what}")))
}

fn boxed(e: Expr) -> Box<Expr> {
    Box::new(e)
}

/// Productions that produce no node of their own when they hold exactly one
/// child pair.
fn is_pass_through(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::expr
            | Rule::expr_single
            | Rule::or_expr
            | Rule::and_expr
            | Rule::comparison_expr
            | Rule::string_concat_expr
            | Rule::range_expr
            | Rule::additive_expr
            | Rule::multiplicative_expr
            | Rule::union_expr
            | Rule::intersect_except_expr
            | Rule::arrow_expr
            | Rule::unary_expr
            | Rule::value_expr
            | Rule::simple_map_expr
            | Rule::relative_path_expr
            | Rule::step_expr
            | Rule::postfix_expr
            | Rule::primary_expr
            | Rule::literal
            | Rule::numeric_literal
            | Rule::parenthesized_expr
    )
}

fn skip_trivial(mut pair: Pair<'_, Rule>) -> Pair<'_, Rule> {
    loop {
        let rule = pair.as_rule();
        let mut inner = pair.clone().into_inner();
        match (inner.next(), inner.next()) {
            (Some(only), None)
                if is_pass_through(rule)
                    || (rule == Rule::path_expr && only.as_rule() == Rule::relative_path_expr) =>
            {
                pair = only;
            }
            _ => return pair,
        }
    }
}

fn unescape_string(pair: Pair<'_, Rule>) -> String {
    match pair.into_inner().next() {
        Some(content) => match content.as_rule() {
            Rule::dbl_string_inner => content.as_str().replace("\"\"", "\""),
            Rule::sgl_string_inner => content.as_str().replace("''", "'"),
            _ => content.as_str().to_string(),
        },
        None => String::new(),
    }
}

fn bad_literal(text: &str, kind: &str) -> Error {
    Error::static_err(ErrorCode::FOCA0002, format!("invalid {kind} literal '{text}'"))
}

/// `.5` → `0.5`, `1.` → `1`, `1.e3` → `1e3`.
fn normalize_number(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 1);
    if text.starts_with('.') {
        out.push('0');
    }
    out.push_str(text.strip_suffix('.').unwrap_or(text));
    out.to_ascii_lowercase().replace(".e", "e")
}

fn parse_decimal(text: &str) -> Result<Decimal, Error> {
    Decimal::from_str_exact(&normalize_number(text)).map_err(|_| bad_literal(text, "decimal"))
}

/// Doubles are carried as decimals; exponents are applied exactly.
fn parse_double(text: &str) -> Result<Decimal, Error> {
    Decimal::from_scientific(&normalize_number(text)).map_err(|_| bad_literal(text, "double"))
}

/// Translates parse trees into [`Expr`] trees, resolving names against a
/// [`StaticContext`] as it goes.
pub struct CstBuilder<'a> {
    ctx: &'a StaticContext,
    depth: usize,
}

impl<'a> CstBuilder<'a> {
    pub fn new(ctx: &'a StaticContext) -> Self {
        Self { ctx, depth: 0 }
    }

    /// Parse and build `source` in one step.
    pub fn build_str(&mut self, source: &str) -> Result<Expr, Error> {
        let root = MetapathParser::parse_metapath(source)?;
        self.build_metapath(root)
    }

    /// Build from the root `metapath` pair.
    pub fn build_metapath(&mut self, root: Pair<'_, Rule>) -> Result<Expr, Error> {
        if root.as_rule() != Rule::metapath {
            return Err(Error::defect(format!("expected metapath root, got {:?}", root.as_rule())));
        }
        let mut inner = root.into_inner();
        let expr = next_pair(&mut inner, "expression")?;
        self.build(expr)
    }

    /// Build any expression-level pair.
    pub fn build(&mut self, pair: Pair<'_, Rule>) -> Result<Expr, Error> {
        if self.depth >= self.ctx.max_nesting_depth {
            return Err(Error::static_err(
                ErrorCode::MPST0001,
                format!("expression nesting exceeds {} levels", self.ctx.max_nesting_depth),
            ));
        }
        self.depth += 1;
        let res = self.dispatch(skip_trivial(pair));
        self.depth -= 1;
        res
    }

    fn dispatch(&mut self, pair: Pair<'_, Rule>) -> Result<Expr, Error> {
        match pair.as_rule() {
            Rule::expr => self.nary(pair, ExprKind::Metapath),
            Rule::or_expr => self.nary(pair, ExprKind::Or),
            Rule::and_expr => self.nary(pair, ExprKind::And),
            Rule::string_concat_expr => self.nary(pair, ExprKind::StringConcat),
            Rule::union_expr => self.nary(pair, ExprKind::Union),
            Rule::simple_map_expr => self.nary(pair, ExprKind::SimpleMap),
            Rule::comparison_expr => self.build_comparison(pair),
            Rule::range_expr => {
                let mut inner = pair.into_inner();
                let l = self.build(next_pair(&mut inner, "range start")?)?;
                let _to = next_pair(&mut inner, "'to'")?;
                let r = self.build(next_pair(&mut inner, "range end")?)?;
                Ok(ExprKind::Range(boxed(l), boxed(r)).into())
            }
            Rule::additive_expr | Rule::multiplicative_expr | Rule::intersect_except_expr => {
                self.fold_chain(pair, |op, l, r| {
                    let (l, r) = (boxed(l), boxed(r));
                    Ok(match op {
                        Rule::OP_PLUS => ExprKind::Addition(l, r),
                        Rule::OP_MINUS => ExprKind::Subtraction(l, r),
                        Rule::OP_STAR => ExprKind::Multiplication(l, r),
                        Rule::K_DIV => ExprKind::Division(l, r),
                        Rule::K_IDIV => ExprKind::IntegerDivision(l, r),
                        Rule::K_MOD => ExprKind::Modulo(l, r),
                        Rule::K_INTERSECT => ExprKind::Intersect(l, r),
                        Rule::K_EXCEPT => ExprKind::Except(l, r),
                        other => return Err(Error::defect(format!("unexpected operator {other:?}"))),
                    })
                })
            }
            Rule::relative_path_expr => self.fold_chain(pair, |op, l, r| {
                let (l, r) = (boxed(l), boxed(r));
                Ok(match op {
                    Rule::OP_SLASH => ExprKind::RelativeSlashPath(l, r),
                    Rule::OP_DSLASH => ExprKind::RelativeDoubleSlashPath(l, r),
                    other => return Err(Error::defect(format!("unexpected path operator {other:?}"))),
                })
            }),
            Rule::arrow_expr => self.build_arrow(pair),
            Rule::unary_expr => self.build_unary(pair),
            Rule::path_expr => self.build_path(pair),
            Rule::postfix_expr => {
                let mut inner = pair.into_inner();
                let base = self.build(next_pair(&mut inner, "primary expression")?)?;
                self.with_predicates(base, inner)
            }
            Rule::axis_step => self.build_axis_step(pair),
            Rule::parenthesized_expr => Ok(ExprKind::EmptySequence.into()),
            Rule::integer_literal => {
                let text = pair.as_str();
                let value = BigInt::from_str(text).map_err(|_| bad_literal(text, "integer"))?;
                Ok(ExprKind::IntegerLiteral(value).into())
            }
            Rule::decimal_literal => Ok(ExprKind::DecimalLiteral(parse_decimal(pair.as_str())?).into()),
            Rule::double_literal => Ok(ExprKind::DecimalLiteral(parse_double(pair.as_str())?).into()),
            Rule::string_literal => Ok(ExprKind::StringLiteral(unescape_string(pair)).into()),
            Rule::var_ref => {
                let name = self.var_name(next_pair(&mut pair.into_inner(), "variable name")?)?;
                Ok(ExprKind::VariableReference(name).into())
            }
            Rule::context_item_expr => Ok(ExprKind::ContextItem.into()),
            Rule::function_call => {
                let mut inner = pair.into_inner();
                let name = self.ctx.resolve_function_name(next_pair(&mut inner, "function name")?.as_str())?;
                let args = self.arguments(next_pair(&mut inner, "argument list")?)?;
                Ok(ExprKind::FunctionCall(FunctionCall::new(name, args)).into())
            }
            Rule::for_expr => self.build_for(pair),
            Rule::let_expr => self.build_let(pair),
            Rule::quantified_expr => self.build_quantified(pair),
            Rule::if_expr => {
                let mut inner = pair.into_inner();
                let _if = next_pair(&mut inner, "'if'")?;
                let test = self.build(next_pair(&mut inner, "if test")?)?;
                let _then = next_pair(&mut inner, "'then'")?;
                let then = self.build(next_pair(&mut inner, "then branch")?)?;
                let _else = next_pair(&mut inner, "'else'")?;
                let otherwise = self.build(next_pair(&mut inner, "else branch")?)?;
                Ok(ExprKind::If { test: boxed(test), then: boxed(then), otherwise: boxed(otherwise) }.into())
            }
            other => Err(Error::defect(format!("no CST handler for {other:?}"))),
        }
    }

    /// `operand (op operand)*` with all operators equivalent: one flat node.
    fn nary(&mut self, pair: Pair<'_, Rule>, make: fn(Vec<Expr>) -> ExprKind) -> Result<Expr, Error> {
        let mut inner = pair.into_inner();
        let first = next_pair(&mut inner, "first operand")?;
        let operand_rule = first.as_rule();
        let mut operands = vec![self.build(first)?];
        for p in inner {
            if p.as_rule() == operand_rule {
                operands.push(self.build(p)?);
            }
        }
        if operands.len() == 1 {
            return Ok(operands.remove(0));
        }
        Ok(make(operands).into())
    }

    /// `operand (op operand)*` folded left: `a - b - c` is `(a - b) - c`.
    fn fold_chain<F>(&mut self, pair: Pair<'_, Rule>, combine: F) -> Result<Expr, Error>
    where
        F: Fn(Rule, Expr, Expr) -> Result<ExprKind, Error>,
    {
        let mut inner = pair.into_inner();
        let mut acc = self.build(next_pair(&mut inner, "left operand")?)?;
        while let Some(op) = inner.next() {
            let token = first_token_rule(&op);
            let rhs = self.build(next_pair(&mut inner, "right operand")?)?;
            acc = combine(token, acc, rhs)?.into();
        }
        Ok(acc)
    }

    fn build_comparison(&mut self, pair: Pair<'_, Rule>) -> Result<Expr, Error> {
        let mut inner = pair.into_inner();
        let left = self.build(next_pair(&mut inner, "comparison left")?)?;
        let op_pair = next_pair(&mut inner, "comparison operator")?;
        let right = self.build(next_pair(&mut inner, "comparison right")?)?;
        let (general, op) = match first_token_rule(&op_pair) {
            Rule::K_EQ => (false, Operator::Eq),
            Rule::K_NE => (false, Operator::Ne),
            Rule::K_LT => (false, Operator::Lt),
            Rule::K_LE => (false, Operator::Le),
            Rule::K_GT => (false, Operator::Gt),
            Rule::K_GE => (false, Operator::Ge),
            Rule::OP_EQ => (true, Operator::Eq),
            Rule::OP_NE => (true, Operator::Ne),
            Rule::OP_LT => (true, Operator::Lt),
            Rule::OP_LTE => (true, Operator::Le),
            Rule::OP_GT => (true, Operator::Gt),
            Rule::OP_GTE => (true, Operator::Ge),
            other => return Err(Error::defect(format!("unexpected comparison {other:?}"))),
        };
        let (left, right) = (boxed(left), boxed(right));
        Ok(if general {
            ExprKind::GeneralComparison { left, op, right }
        } else {
            ExprKind::ValueComparison { left, op, right }
        }
        .into())
    }

    /// `x => f(a, b)` is `f(x, a, b)`; chains apply left to right.
    fn build_arrow(&mut self, pair: Pair<'_, Rule>) -> Result<Expr, Error> {
        let mut inner = pair.into_inner();
        let mut acc = self.build(next_pair(&mut inner, "arrow operand")?)?;
        while let Some(_arrow) = inner.next() {
            let spec = next_pair(&mut inner, "arrow function")?;
            let eqname = next_pair(&mut spec.into_inner(), "arrow function name")?;
            let name = self.ctx.resolve_function_name(eqname.as_str())?;
            let mut args = vec![acc];
            args.extend(self.arguments(next_pair(&mut inner, "arrow arguments")?)?);
            acc = ExprKind::FunctionCall(FunctionCall::new(name, args)).into();
        }
        Ok(acc)
    }

    fn build_unary(&mut self, pair: Pair<'_, Rule>) -> Result<Expr, Error> {
        let mut minus = 0usize;
        let mut operand = None;
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::OP_MINUS => minus += 1,
                Rule::OP_PLUS => {}
                _ => operand = Some(p),
            }
        }
        let operand = operand.ok_or_else(|| Error::defect("unary expression without operand"))?;
        let e = self.build(operand)?;
        Ok(if minus % 2 == 1 { ExprKind::Negate(boxed(e)).into() } else { e })
    }

    fn build_path(&mut self, pair: Pair<'_, Rule>) -> Result<Expr, Error> {
        let mut inner = pair.into_inner();
        let first = next_pair(&mut inner, "path")?;
        match first.as_rule() {
            Rule::OP_DSLASH => {
                let rel = self.build(next_pair(&mut inner, "path after '//'")?)?;
                Ok(ExprKind::RootDoubleSlashPath(boxed(rel)).into())
            }
            Rule::OP_SLASH => match inner.next() {
                Some(rel) => Ok(ExprKind::RootSlashPath(boxed(self.build(rel)?)).into()),
                None => Ok(ExprKind::RootSlashOnlyPath.into()),
            },
            _ => self.build(first),
        }
    }

    fn with_predicates(&mut self, base: Expr, predicates: Pairs<'_, Rule>) -> Result<Expr, Error> {
        let mut list = Vec::new();
        for p in predicates {
            if p.as_rule() != Rule::predicate {
                return Err(Error::defect(format!("expected predicate, got {:?}", p.as_rule())));
            }
            // predicate = LBRACK expr RBRACK
            let expr = p.into_inner().nth(1).ok_or_else(|| Error::defect("empty predicate"))?;
            list.push(self.build(expr)?);
        }
        if list.is_empty() {
            return Ok(base);
        }
        Ok(ExprKind::Predicate { base: boxed(base), predicates: list }.into())
    }

    fn build_axis_step(&mut self, pair: Pair<'_, Rule>) -> Result<Expr, Error> {
        let mut inner = pair.into_inner();
        let step = next_pair(&mut inner, "step")?;
        let base = match step.as_rule() {
            Rule::forward_step | Rule::reverse_step => self.build_step(step)?,
            other => return Err(Error::defect(format!("unexpected step {other:?}"))),
        };
        let predicates = next_pair(&mut inner, "predicate list")?;
        self.with_predicates(base, predicates.into_inner())
    }

    fn build_step(&mut self, step: Pair<'_, Rule>) -> Result<Expr, Error> {
        let mut inner = step.into_inner();
        let first = next_pair(&mut inner, "step body")?;
        match first.as_rule() {
            Rule::forward_axis | Rule::reverse_axis => {
                let axis = match first_token_rule(&first) {
                    Rule::K_SELF => Axis::SelfAxis,
                    Rule::K_CHILD => Axis::Child,
                    Rule::K_DESCENDANT => Axis::Descendant,
                    Rule::K_DESCENDANT_OR_SELF => Axis::DescendantOrSelf,
                    Rule::K_PARENT => Axis::Parent,
                    Rule::K_ANCESTOR => Axis::Ancestor,
                    Rule::K_ANCESTOR_OR_SELF => Axis::AncestorOrSelf,
                    other => return Err(Error::defect(format!("unexpected axis {other:?}"))),
                };
                let test = self.node_test(next_pair(&mut inner, "node test")?, false)?;
                Ok(ExprKind::Step { axis, test: boxed(test) }.into())
            }
            Rule::abbrev_forward_step => {
                let mut parts = first.into_inner();
                let head = next_pair(&mut parts, "node test")?;
                if head.as_rule() == Rule::OP_AT {
                    let test = self.node_test(next_pair(&mut parts, "flag test")?, true)?;
                    Ok(ExprKind::Flag(boxed(test)).into())
                } else {
                    Ok(ExprKind::ModelInstance(boxed(self.node_test(head, false)?)).into())
                }
            }
            Rule::abbrev_reverse_step => Ok(ExprKind::Axis(Axis::Parent).into()),
            other => Err(Error::defect(format!("unexpected step body {other:?}"))),
        }
    }

    /// `Name` or `Wildcard`. Flag names never take the default model namespace.
    fn node_test(&mut self, pair: Pair<'_, Rule>, flag: bool) -> Result<Expr, Error> {
        let test = next_pair(&mut pair.into_inner(), "node test")?;
        match test.as_rule() {
            Rule::eqname => {
                let name = if flag {
                    self.ctx.resolve_flag_name(test.as_str())?
                } else {
                    self.ctx.resolve_model_name(test.as_str())?
                };
                Ok(ExprKind::Name(name).into())
            }
            Rule::wildcard => {
                let form = next_pair(&mut test.into_inner(), "wildcard")?;
                Ok(ExprKind::Wildcard(self.wildcard(form)?).into())
            }
            other => Err(Error::defect(format!("unexpected node test {other:?}"))),
        }
    }

    fn wildcard(&self, form: Pair<'_, Rule>) -> Result<Wildcard, Error> {
        match form.as_rule() {
            Rule::wildcard_any => Ok(Wildcard::Any),
            Rule::wildcard_local => {
                let local = next_pair(&mut form.into_inner(), "local name")?;
                Ok(Wildcard::LocalName(local.as_str().to_string()))
            }
            Rule::wildcard_prefix => {
                let prefix = next_pair(&mut form.into_inner(), "prefix")?.as_str();
                match self.ctx.lookup_prefix(prefix) {
                    Some(uri) => Ok(Wildcard::Namespace(Some(uri.to_string()))),
                    None => Err(Error::static_err(
                        ErrorCode::XPST0081,
                        format!("prefix '{prefix}' is not expandable"),
                    )),
                }
            }
            Rule::wildcard_braced => {
                let braced = next_pair(&mut form.into_inner(), "braced URI")?.as_str();
                let uri = braced.trim_start_matches("Q{").trim_end_matches('}').trim();
                if uri == XMLNS_URI {
                    return Err(Error::static_err(
                        ErrorCode::XQST0070,
                        format!("namespace '{XMLNS_URI}' cannot be used in an expanded QName"),
                    ));
                }
                Ok(Wildcard::Namespace(if uri.is_empty() { None } else { Some(uri.to_string()) }))
            }
            other => Err(Error::defect(format!("unexpected wildcard {other:?}"))),
        }
    }

    fn var_name(&self, var_name: Pair<'_, Rule>) -> Result<ExpandedName, Error> {
        let eqname = next_pair(&mut var_name.into_inner(), "variable eqname")?;
        self.ctx.resolve_variable_name(eqname.as_str())
    }

    fn arguments(&mut self, list: Pair<'_, Rule>) -> Result<Vec<Expr>, Error> {
        list.into_inner().map(|a| self.build(a)).collect()
    }

    /// Bindings of one `$name in expr` / `$name := expr`, in source order.
    fn bindings(&mut self, clause: Pair<'_, Rule>) -> Result<Vec<(ExpandedName, Expr)>, Error> {
        let mut out = Vec::new();
        for binding in clause.into_inner() {
            if !matches!(binding.as_rule(), Rule::simple_binding | Rule::let_binding) {
                continue;
            }
            let mut parts = binding.into_inner().filter(|p| p.as_rule() != Rule::K_IN);
            let name = self.var_name(next_pair(&mut parts, "binding variable")?)?;
            let value = self.build(next_pair(&mut parts, "binding expression")?)?;
            out.push((name, value));
        }
        Ok(out)
    }

    /// Bindings of every clause plus the `return` body.
    fn clauses(
        &mut self,
        pair: Pair<'_, Rule>,
        clause_rule: Rule,
    ) -> Result<(Vec<(ExpandedName, Expr)>, Expr), Error> {
        let mut bindings = Vec::new();
        let mut body = None;
        for p in pair.into_inner() {
            match p.as_rule() {
                r if r == clause_rule => bindings.extend(self.bindings(p)?),
                Rule::K_RETURN => {}
                _ => body = Some(self.build(p)?),
            }
        }
        let body = body.ok_or_else(|| Error::defect("binding expression without return"))?;
        Ok((bindings, body))
    }

    /// Wrap innermost (last declared) binding first, so each binding scopes
    /// over every later one.
    fn build_for(&mut self, pair: Pair<'_, Rule>) -> Result<Expr, Error> {
        let (bindings, body) = self.clauses(pair, Rule::simple_for_clause)?;
        Ok(bindings.into_iter().rev().fold(body, |body, (name, source)| {
            ExprKind::For { name, source: boxed(source), body: boxed(body) }.into()
        }))
    }

    fn build_let(&mut self, pair: Pair<'_, Rule>) -> Result<Expr, Error> {
        let (bindings, body) = self.clauses(pair, Rule::simple_let_clause)?;
        Ok(bindings.into_iter().rev().fold(body, |body, (name, bound)| {
            ExprKind::Let { name, bound: boxed(bound), body: boxed(body) }.into()
        }))
    }

    fn build_quantified(&mut self, pair: Pair<'_, Rule>) -> Result<Expr, Error> {
        let mut quantifier = None;
        let mut bindings: IndexMap<ExpandedName, Expr> = IndexMap::new();
        let mut satisfies = None;
        let mut after_satisfies = false;
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::K_SOME => quantifier = Some(Quantifier::Some),
                Rule::K_EVERY => quantifier = Some(Quantifier::Every),
                Rule::simple_binding => {
                    let mut parts = p.into_inner().filter(|p| p.as_rule() != Rule::K_IN);
                    let name = self.var_name(next_pair(&mut parts, "quantified variable")?)?;
                    let source = self.build(next_pair(&mut parts, "quantified source")?)?;
                    bindings.insert(name, source);
                }
                Rule::K_SATISFIES => after_satisfies = true,
                _ if after_satisfies => satisfies = Some(self.build(p)?),
                other => return Err(Error::defect(format!("unexpected {other:?} in quantified"))),
            }
        }
        let quantifier = quantifier.ok_or_else(|| Error::defect("quantifier missing"))?;
        let satisfies = satisfies.ok_or_else(|| Error::defect("satisfies clause missing"))?;
        Ok(ExprKind::Quantified { quantifier, bindings, satisfies: boxed(satisfies) }.into())
    }
}
