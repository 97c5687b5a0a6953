use std::str::FromStr;

use metapath::cst::CstBuilder;
use metapath::runtime::StaticContext;
use metapath::{AtomicValue as A, DynamicContext, ErrorCode, ExprKind, Item as I, evaluate_expr};
use num_bigint::BigInt;
use rstest::rstest;
use rust_decimal::Decimal;

fn eval_one(src: &str) -> A {
    let out = evaluate_expr(src, &DynamicContext::default()).unwrap();
    match out.as_slice() {
        [I::Atomic(a)] => a.clone(),
        other => panic!("'{src}' should yield one atomic, got {other:?}"),
    }
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[rstest]
fn integers_are_arbitrary_precision() {
    let big = "123456789012345678901234567890123456789";
    assert_eq!(eval_one(big), A::Integer(BigInt::from_str(big).unwrap()));
    let sum = eval_one(&format!("{big} + 1"));
    assert_eq!(sum, A::Integer(BigInt::from_str("123456789012345678901234567890123456790").unwrap()));
}

#[rstest]
fn decimals_keep_their_scale() {
    let v = eval_one("1.10");
    assert_eq!(v, A::Decimal(dec("1.10")));
    assert_eq!(v.as_string(), "1.10");
}

#[rstest]
#[case(".5", "0.5")]
#[case("2.", "2")]
#[case("0.125", "0.125")]
fn decimal_literal_forms(#[case] src: &str, #[case] expected: &str) {
    assert_eq!(eval_one(src), A::Decimal(dec(expected)));
}

#[rstest]
#[case("1e3", "1000")]
#[case("1.5E2", "150")]
#[case("25e-2", "0.25")]
fn double_literals_become_decimals(#[case] src: &str, #[case] expected: &str) {
    assert_eq!(eval_one(src), A::Decimal(dec(expected)));
}

#[rstest]
#[case(r#""abc""#, "abc")]
#[case(r#""say ""hi""""#, r#"say "hi""#)]
#[case("'it''s'", "it's")]
#[case("''", "")]
#[case(r#"'mixed "quotes"'"#, r#"mixed "quotes""#)]
fn string_literals_unescape_doubled_quotes(#[case] src: &str, #[case] expected: &str) {
    assert_eq!(eval_one(src), A::String(expected.to_string()));
}

#[rstest]
fn literal_nodes_carry_values() {
    let e = CstBuilder::new(&StaticContext::default()).build_str("'x'").unwrap();
    assert!(matches!(e.kind(), ExprKind::StringLiteral(s) if s == "x"));
    let e = CstBuilder::new(&StaticContext::default()).build_str("42").unwrap();
    assert!(matches!(e.kind(), ExprKind::IntegerLiteral(i) if *i == BigInt::from(42)));
}

#[rstest]
fn decimal_literal_out_of_range() {
    let err = CstBuilder::new(&StaticContext::default())
        .build_str("1234567890123456789012345678901234.5")
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::FOCA0002);
    assert!(err.is_static());
}
