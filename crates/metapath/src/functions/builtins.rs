//! Core `fn:` functions available in every registry built by
//! [`FunctionRegistry::with_builtins`].

use num_bigint::BigInt;

use crate::consts::FNS;
use crate::error::{Error, ErrorCode};
use crate::evaluator::{atomize, effective_boolean_value, numeric};
use crate::item::{AtomicValue, Item, Sequence};
use crate::types::ItemType;

use super::{CallCtx, FunctionRegistry};

fn single(v: AtomicValue) -> Sequence {
    vec![Item::Atomic(v)]
}

fn integer(n: usize) -> Sequence {
    single(AtomicValue::Integer(BigInt::from(n)))
}

/// The argument if given, otherwise the focus (`XPDY0002` when empty).
fn arg_or_focus<'a>(ctx: &'a CallCtx<'_>, args: &'a [Sequence]) -> Result<&'a Sequence, Error> {
    match args.first() {
        Some(a) => Ok(a),
        None if ctx.focus.is_empty() => Err(Error::context_empty()),
        None => Ok(ctx.focus),
    }
}

fn at_most_one<'a>(seq: &'a Sequence, function: &str) -> Result<Option<&'a Item>, Error> {
    match seq.as_slice() {
        [] => Ok(None),
        [item] => Ok(Some(item)),
        _ => Err(Error::dynamic(
            ErrorCode::XPTY0004,
            format!("fn:{function} expects at most one item, got {}", seq.len()),
        )),
    }
}

fn string_arg(seq: &Sequence, function: &str) -> Result<String, Error> {
    Ok(at_most_one(seq, function)?.map(Item::string_value).unwrap_or_default())
}

fn numeric_arg(seq: &Sequence, function: &str) -> Result<Option<AtomicValue>, Error> {
    let mut atoms = atomize(seq)?;
    if atoms.len() > 1 {
        return Err(Error::dynamic(
            ErrorCode::XPTY0004,
            format!("fn:{function} expects at most one item, got {}", atoms.len()),
        ));
    }
    match atoms.pop() {
        Some(a) if a.is_numeric() => Ok(Some(a)),
        Some(a) => Err(Error::dynamic(
            ErrorCode::XPTY0004,
            format!("fn:{function} expects a numeric value, got {}", a.type_name()),
        )),
        None => Ok(None),
    }
}

pub(super) fn register_builtins(reg: &mut FunctionRegistry) {
    // ===== Booleans =====
    reg.register_ns(FNS, "true", 0, ItemType::Boolean, |_ctx, _args| {
        Ok(single(AtomicValue::Boolean(true)))
    });
    reg.register_ns(FNS, "false", 0, ItemType::Boolean, |_ctx, _args| {
        Ok(single(AtomicValue::Boolean(false)))
    });
    reg.register_ns(FNS, "not", 1, ItemType::Boolean, |_ctx, args| {
        Ok(single(AtomicValue::Boolean(!effective_boolean_value(&args[0])?)))
    });
    reg.register_ns(FNS, "boolean", 1, ItemType::Boolean, |_ctx, args| {
        Ok(single(AtomicValue::Boolean(effective_boolean_value(&args[0])?)))
    });

    // ===== Sequences =====
    reg.register_ns(FNS, "count", 1, ItemType::Integer, |_ctx, args| Ok(integer(args[0].len())));
    reg.register_ns(FNS, "empty", 1, ItemType::Boolean, |_ctx, args| {
        Ok(single(AtomicValue::Boolean(args[0].is_empty())))
    });
    reg.register_ns(FNS, "exists", 1, ItemType::Boolean, |_ctx, args| {
        Ok(single(AtomicValue::Boolean(!args[0].is_empty())))
    });
    reg.register_ns_range(FNS, "data", 0, Some(1), ItemType::AnyAtomic, |ctx, args| {
        let seq = arg_or_focus(ctx, args)?;
        Ok(atomize(seq)?.into_iter().map(Item::Atomic).collect())
    });

    // ===== Strings =====
    reg.register_ns_range(FNS, "string", 0, Some(1), ItemType::String, |ctx, args| {
        let seq = arg_or_focus(ctx, args)?;
        Ok(single(AtomicValue::String(string_arg(seq, "string")?)))
    });
    reg.register_ns_range(FNS, "string-length", 0, Some(1), ItemType::Integer, |ctx, args| {
        let seq = arg_or_focus(ctx, args)?;
        Ok(integer(string_arg(seq, "string-length")?.chars().count()))
    });
    reg.register_ns_variadic(FNS, "concat", 2, ItemType::String, |_ctx, args| {
        let mut out = String::new();
        for a in args {
            let atoms = atomize(a)?;
            if atoms.len() > 1 {
                return Err(Error::dynamic(
                    ErrorCode::XPTY0004,
                    format!("fn:concat argument has {} items", atoms.len()),
                ));
            }
            if let Some(v) = atoms.first() {
                out.push_str(&v.as_string());
            }
        }
        Ok(single(AtomicValue::String(out)))
    });
    reg.register_ns(FNS, "upper-case", 1, ItemType::String, |_ctx, args| {
        Ok(single(AtomicValue::String(string_arg(&args[0], "upper-case")?.to_uppercase())))
    });
    reg.register_ns(FNS, "lower-case", 1, ItemType::String, |_ctx, args| {
        Ok(single(AtomicValue::String(string_arg(&args[0], "lower-case")?.to_lowercase())))
    });

    // ===== Numerics =====
    reg.register_ns(FNS, "sum", 1, ItemType::Numeric, |_ctx, args| {
        let mut total = AtomicValue::Integer(BigInt::from(0));
        for a in atomize(&args[0])? {
            total = numeric::arithmetic(numeric::ArithOp::Add, &total, &a)?;
        }
        Ok(single(total))
    });
    reg.register_ns(FNS, "abs", 1, ItemType::Numeric, |_ctx, args| {
        match numeric_arg(&args[0], "abs")? {
            Some(v) => Ok(single(numeric::abs(&v)?)),
            None => Ok(vec![]),
        }
    });

    // ===== Focus =====
    reg.register_ns(FNS, "position", 0, ItemType::Integer, |ctx, _args| {
        match ctx.dyn_ctx.focus_position() {
            Some((position, _)) => Ok(integer(position)),
            None if ctx.focus.is_empty() => Err(Error::context_empty()),
            None => Ok(integer(1)),
        }
    });
    reg.register_ns(FNS, "last", 0, ItemType::Integer, |ctx, _args| {
        match ctx.dyn_ctx.focus_position() {
            Some((_, size)) => Ok(integer(size)),
            None if ctx.focus.is_empty() => Err(Error::context_empty()),
            None => Ok(integer(ctx.focus.len())),
        }
    });
}
