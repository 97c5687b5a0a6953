use std::sync::{Arc, Mutex};

use metapath::consts::FNS;
use metapath::{
    AtomicValue as A, DynamicContextBuilder, ErrorCode, FunctionRegistry, Item as I,
    MetapathExpression, StaticContextBuilder, evaluate_expr,
};
use rstest::rstest;

fn boolean(src: &str) -> bool {
    let out = evaluate_expr(src, &DynamicContextBuilder::default().build())
        .unwrap_or_else(|e| panic!("'{src}': {e}"));
    match out.as_slice() {
        [I::Atomic(A::Boolean(b))] => *b,
        other => panic!("'{src}' should be boolean, got {other:?}"),
    }
}

/// Evaluate `src` with `t:probe(...)` recording its arguments and returning true.
fn probed(src: &str) -> (bool, Vec<String>) {
    let log: Arc<Mutex<Vec<String>>> = Arc::default();
    let mut reg = FunctionRegistry::with_builtins();
    let sink = log.clone();
    reg.register_ns_variadic("urn:test", "probe", 1, metapath::ItemType::Boolean, move |_ctx, args| {
        let entry = args.iter().flat_map(|a| a.iter().map(I::string_value)).collect::<Vec<_>>().join(",");
        sink.lock().unwrap().push(entry);
        Ok(vec![I::Atomic(A::Boolean(true))])
    });
    let reg = Arc::new(reg);
    let sctx = StaticContextBuilder::new()
        .with_namespace("t", "urn:test")
        .with_function_registry(reg.clone())
        .build();
    let dctx = DynamicContextBuilder::new().with_function_registry(reg).build();
    let expr = MetapathExpression::compile(src, &sctx).unwrap();
    let out = expr.evaluate(&dctx, &vec![]).unwrap();
    let result = matches!(out.as_slice(), [I::Atomic(A::Boolean(true))]);
    let entries = log.lock().unwrap().clone();
    (result, entries)
}

#[rstest]
#[case("some $x in (1, 2, 3) satisfies $x = 2", true)]
#[case("some $x in (1, 2, 3) satisfies $x = 4", false)]
#[case("every $x in (1, 2, 3) satisfies $x > 0", true)]
#[case("every $x in (1, 2, 3) satisfies $x > 1", false)]
#[case("some $x in () satisfies true()", false)]
#[case("every $x in () satisfies false()", true)]
#[case("some $x in (1, 2), $y in (2, 3) satisfies $x = $y", true)]
#[case("every $x in (1, 2), $y in (3, 4) satisfies $x < $y", true)]
#[case("every $x in (1, 2), $y in (2, 3) satisfies $x < $y", false)]
#[case("some $x in (1, 2), $y in () satisfies true()", false)]
fn quantifier_outcomes(#[case] src: &str, #[case] expected: bool) {
    assert_eq!(boolean(src), expected);
}

#[rstest]
fn first_declared_variable_varies_fastest() {
    let (result, entries) = probed("every $x in (1, 2), $y in ('a', 'b') satisfies t:probe($x, $y)");
    assert!(result);
    assert_eq!(entries, ["1,a", "2,a", "1,b", "2,b"]);
}

#[rstest]
fn some_stops_at_first_witness() {
    let (result, entries) = probed("some $x in (1, 2, 3, 4) satisfies (t:probe($x) and $x = 2)");
    assert!(result);
    assert_eq!(entries, ["1", "2"]);
}

#[rstest]
fn every_stops_at_first_counterexample() {
    let (result, entries) = probed("every $x in (1, 2, 3, 4) satisfies (t:probe($x) and $x < 2)");
    assert!(!result);
    assert_eq!(entries, ["1", "2"]);
}

#[rstest]
fn short_circuit_skips_failing_tuples() {
    // $x = 3 would divide by zero
    assert!(boolean("some $x in (1, 2, 3) satisfies ($x = 2 or 1 div ($x - 3) = 0)"));
    assert!(!boolean("every $x in (1, 2, 3) satisfies ($x < 2 and 1 div ($x - 3) = -0.5)"));
}

#[rstest]
fn error_in_satisfies_propagates() {
    let err = evaluate_expr(
        "some $x in (3, 2) satisfies 1 div ($x - 3) = 0",
        &DynamicContextBuilder::default().build(),
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::FOAR0001);
}

#[rstest]
fn duplicate_variable_keeps_one_binding() {
    // the later source replaces the earlier one
    assert!(boolean("every $x in (1, 2), $x in (5) satisfies $x = 5"));
}

#[rstest]
fn quantified_variables_are_scoped() {
    let err = evaluate_expr(
        "(some $x in 1 satisfies true()), $x",
        &DynamicContextBuilder::default().build(),
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::XPST0008);
}

#[rstest]
fn fn_namespace_is_preset() {
    assert!(boolean("fn:true()"));
    assert!(boolean(&format!("Q{{{FNS}}}true()")));
}
