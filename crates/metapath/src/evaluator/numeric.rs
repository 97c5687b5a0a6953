//! Numeric promotion and arithmetic over `integer` (`BigInt`) and
//! `decimal` (`rust_decimal::Decimal`).

use core::cmp::Ordering;

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use rust_decimal::Decimal;

use crate::error::{Error, ErrorCode};
use crate::item::AtomicValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    IDiv,
    Mod,
}

impl ArithOp {
    fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "div",
            ArithOp::IDiv => "idiv",
            ArithOp::Mod => "mod",
        }
    }
}

/// Promotion kind of a numeric operand pair.
enum NumPair {
    Int(BigInt, BigInt),
    Dec(Decimal, Decimal),
}

fn overflow() -> Error {
    Error::dynamic(ErrorCode::FOAR0002, "numeric overflow")
}

fn div_by_zero() -> Error {
    Error::dynamic(ErrorCode::FOAR0001, "division by zero")
}

pub(crate) fn int_to_decimal(i: &BigInt) -> Result<Decimal, Error> {
    i.to_i128().and_then(|v| Decimal::try_from_i128_with_scale(v, 0).ok()).ok_or_else(overflow)
}

fn decimal_to_int(d: Decimal) -> Result<BigInt, Error> {
    d.trunc().to_i128().map(BigInt::from).ok_or_else(overflow)
}

fn as_decimal(v: &AtomicValue) -> Result<Decimal, Error> {
    match v {
        AtomicValue::Integer(i) => int_to_decimal(i),
        AtomicValue::Decimal(d) => Ok(*d),
        other => Err(not_numeric(other)),
    }
}

fn not_numeric(v: &AtomicValue) -> Error {
    Error::dynamic(ErrorCode::XPTY0004, format!("expected a numeric value, found {}", v.type_name()))
}

fn promote(a: &AtomicValue, b: &AtomicValue) -> Result<NumPair, Error> {
    match (a, b) {
        (AtomicValue::Integer(x), AtomicValue::Integer(y)) => Ok(NumPair::Int(x.clone(), y.clone())),
        _ => Ok(NumPair::Dec(as_decimal(a)?, as_decimal(b)?)),
    }
}

/// Numeric ordering after promotion.
pub(crate) fn compare(a: &AtomicValue, b: &AtomicValue) -> Result<Ordering, Error> {
    Ok(match promote(a, b)? {
        NumPair::Int(x, y) => x.cmp(&y),
        NumPair::Dec(x, y) => x.cmp(&y),
    })
}

pub(crate) fn arithmetic(op: ArithOp, a: &AtomicValue, b: &AtomicValue) -> Result<AtomicValue, Error> {
    if !a.is_numeric() || !b.is_numeric() {
        return Err(Error::dynamic(
            ErrorCode::XPTY0004,
            format!("operator '{}' is not defined for {} and {}", op.symbol(), a.type_name(), b.type_name()),
        ));
    }
    match op {
        ArithOp::Div => {
            let (x, y) = (as_decimal(a)?, as_decimal(b)?);
            if y.is_zero() {
                return Err(div_by_zero());
            }
            x.checked_div(y).map(AtomicValue::Decimal).ok_or_else(overflow)
        }
        ArithOp::IDiv => match promote(a, b)? {
            NumPair::Int(x, y) => {
                if y.is_zero() {
                    return Err(div_by_zero());
                }
                Ok(AtomicValue::Integer(x / y))
            }
            NumPair::Dec(x, y) => {
                if y.is_zero() {
                    return Err(div_by_zero());
                }
                let q = x.checked_div(y).ok_or_else(overflow)?;
                Ok(AtomicValue::Integer(decimal_to_int(q)?))
            }
        },
        ArithOp::Mod => match promote(a, b)? {
            NumPair::Int(x, y) => {
                if y.is_zero() {
                    return Err(div_by_zero());
                }
                Ok(AtomicValue::Integer(x % y))
            }
            NumPair::Dec(x, y) => {
                if y.is_zero() {
                    return Err(div_by_zero());
                }
                x.checked_rem(y).map(AtomicValue::Decimal).ok_or_else(overflow)
            }
        },
        ArithOp::Add | ArithOp::Sub | ArithOp::Mul => match promote(a, b)? {
            NumPair::Int(x, y) => Ok(AtomicValue::Integer(match op {
                ArithOp::Add => x + y,
                ArithOp::Sub => x - y,
                _ => x * y,
            })),
            NumPair::Dec(x, y) => {
                let r = match op {
                    ArithOp::Add => x.checked_add(y),
                    ArithOp::Sub => x.checked_sub(y),
                    _ => x.checked_mul(y),
                };
                r.map(AtomicValue::Decimal).ok_or_else(overflow)
            }
        },
    }
}

pub(crate) fn negate(v: &AtomicValue) -> Result<AtomicValue, Error> {
    match v {
        AtomicValue::Integer(i) => Ok(AtomicValue::Integer(-i)),
        AtomicValue::Decimal(d) => Ok(AtomicValue::Decimal(-*d)),
        other => Err(not_numeric(other)),
    }
}

pub(crate) fn abs(v: &AtomicValue) -> Result<AtomicValue, Error> {
    match v {
        AtomicValue::Integer(i) => Ok(AtomicValue::Integer(i.abs())),
        AtomicValue::Decimal(d) => Ok(AtomicValue::Decimal(d.abs())),
        other => Err(not_numeric(other)),
    }
}

pub(crate) fn is_zero(v: &AtomicValue) -> Option<bool> {
    match v {
        AtomicValue::Integer(i) => Some(i.is_zero()),
        AtomicValue::Decimal(d) => Some(d.is_zero()),
        _ => None,
    }
}

/// Whether `v` is an integer-valued number equal to `position`.
pub(crate) fn equals_position(v: &AtomicValue, position: usize) -> bool {
    match v {
        AtomicValue::Integer(i) => *i == BigInt::from(position),
        AtomicValue::Decimal(d) => Decimal::from_i128_with_scale(position as i128, 0) == *d,
        _ => false,
    }
}
