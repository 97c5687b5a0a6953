use std::str::FromStr;

use metapath::{AtomicValue as A, DynamicContext, ErrorCode, Item as I, evaluate_expr};
use num_bigint::BigInt;
use rstest::rstest;
use rust_decimal::Decimal;

fn eval(src: &str) -> Vec<A> {
    evaluate_expr(src, &DynamicContext::default())
        .unwrap_or_else(|e| panic!("'{src}': {e}"))
        .into_iter()
        .map(|i| match i {
            I::Atomic(a) => a,
            I::Node(n) => panic!("unexpected node {n:?}"),
        })
        .collect()
}

fn int(v: i64) -> A {
    A::Integer(BigInt::from(v))
}

fn dec(s: &str) -> A {
    A::Decimal(Decimal::from_str(s).unwrap())
}

fn err_code(src: &str) -> ErrorCode {
    evaluate_expr(src, &DynamicContext::default()).unwrap_err().code
}

#[rstest]
#[case("1 + 2", int(3))]
#[case("10 - 12", int(-2))]
#[case("6 * 7", int(42))]
#[case("7 idiv 2", int(3))]
#[case("-7 idiv 2", int(-3))]
#[case("7 mod 3", int(1))]
#[case("-7 mod 3", int(-1))]
#[case("1 + 2 * 3", int(7))]
#[case("(1 + 2) * 3", int(9))]
#[case("10 - 4 - 3", int(3))]
fn integer_arithmetic_stays_integer(#[case] src: &str, #[case] expected: A) {
    assert_eq!(eval(src), [expected]);
}

#[rstest]
#[case("7 div 2", dec("3.5"))]
#[case("6 div 3", dec("2"))]
#[case("1.5 + 1", dec("2.5"))]
#[case("0.1 + 0.2", dec("0.3"))]
#[case("2.5 * 2", dec("5.0"))]
#[case("7.5 mod 2", dec("1.5"))]
#[case("7.5 idiv 2", int(3))]
fn decimal_arithmetic(#[case] src: &str, #[case] expected: A) {
    assert_eq!(eval(src), [expected]);
}

#[rstest]
fn div_of_integers_is_decimal() {
    assert!(matches!(eval("4 div 2").as_slice(), [A::Decimal(_)]));
}

#[rstest]
#[case("-(3)", int(-3))]
#[case("--3", int(3))]
#[case("-1.5", dec("-1.5"))]
#[case("-(-(2))", int(2))]
fn negation(#[case] src: &str, #[case] expected: A) {
    assert_eq!(eval(src), [expected]);
}

#[rstest]
#[case("() + 1")]
#[case("1 * ()")]
#[case("-()")]
fn empty_operand_gives_empty(#[case] src: &str) {
    assert!(eval(src).is_empty());
}

#[rstest]
#[case("1 div 0", ErrorCode::FOAR0001)]
#[case("1 idiv 0", ErrorCode::FOAR0001)]
#[case("1 mod 0", ErrorCode::FOAR0001)]
#[case("1.5 div 0.0", ErrorCode::FOAR0001)]
#[case("'a' + 1", ErrorCode::XPTY0004)]
#[case("(1, 2) + 1", ErrorCode::XPTY0004)]
#[case("-'a'", ErrorCode::XPTY0004)]
#[case("99999999999999999999999999999999 + 0.5", ErrorCode::FOAR0002)]
fn arithmetic_errors(#[case] src: &str, #[case] code: ErrorCode) {
    assert_eq!(err_code(src), code);
}

#[rstest]
fn ranges() {
    assert_eq!(eval("1 to 4"), [int(1), int(2), int(3), int(4)]);
    assert_eq!(eval("3 to 3"), [int(3)]);
    assert!(eval("3 to 1").is_empty());
    assert!(eval("() to 3").is_empty());
    assert_eq!(eval("-1 to 1"), [int(-1), int(0), int(1)]);
    assert_eq!(err_code("1.5 to 3"), ErrorCode::XPTY0004);
}

#[rstest]
#[case("exists(1 to 100000000000000)")]
#[case("count(0 to 99999999999999999999999)")]
#[case("(1 to 20000000)[1]")]
fn oversized_ranges_fail_instead_of_allocating(#[case] src: &str) {
    assert_eq!(err_code(src), ErrorCode::FOAR0002);
}


#[rstest]
fn string_concatenation() {
    assert_eq!(eval("'a' || 1 || () || 2.50 || true()"), [A::from("a12.50true")]);
}

#[rstest]
fn string_concatenation_rejects_sequences() {
    assert_eq!(err_code("(1, 2) || 'x'"), ErrorCode::XPTY0004);
}
