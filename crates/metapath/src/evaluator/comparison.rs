use core::cmp::Ordering;

use crate::cst::Operator;
use crate::error::{Error, ErrorCode};
use crate::item::{AtomicValue, Sequence};

use super::{atomize, numeric};

/// Order two atomics. Comparable pairs: numeric/numeric, string/string
/// (codepoints), boolean/boolean.
pub(crate) fn compare_atomic(a: &AtomicValue, b: &AtomicValue) -> Result<Ordering, Error> {
    match (a, b) {
        (AtomicValue::String(x), AtomicValue::String(y)) => Ok(x.cmp(y)),
        (AtomicValue::Boolean(x), AtomicValue::Boolean(y)) => Ok(x.cmp(y)),
        _ if a.is_numeric() && b.is_numeric() => numeric::compare(a, b),
        _ => Err(Error::dynamic(
            ErrorCode::XPTY0004,
            format!("cannot compare {} with {}", a.type_name(), b.type_name()),
        )),
    }
}

/// `eq`, `ne`, ... : `None` when either side is empty.
pub(crate) fn value_compare(
    left: &Sequence,
    op: Operator,
    right: &Sequence,
) -> Result<Option<bool>, Error> {
    let l = atomize(left)?;
    let r = atomize(right)?;
    match (l.as_slice(), r.as_slice()) {
        ([], _) | (_, []) => Ok(None),
        ([a], [b]) => Ok(Some(op.test(compare_atomic(a, b)?))),
        _ => Err(Error::dynamic(
            ErrorCode::XPTY0004,
            "value comparison requires singleton operands",
        )),
    }
}

/// `=`, `!=`, ... : true if any pair satisfies `op`.
pub(crate) fn general_compare(left: &Sequence, op: Operator, right: &Sequence) -> Result<bool, Error> {
    let l = atomize(left)?;
    let r = atomize(right)?;
    for a in &l {
        for b in &r {
            if op.test(compare_atomic(a, b)?) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}
