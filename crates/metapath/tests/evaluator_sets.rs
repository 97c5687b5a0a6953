use metapath::simple_node::{SimpleNode, assembly, doc, field, flag};
use metapath::{
    DynamicContext, ErrorCode, Item as I, MetapathExpression, NodeKind, Sequence, StaticContext,
};
use rstest::{fixture, rstest};

#[fixture]
fn document() -> SimpleNode {
    doc()
        .child(
            assembly("root")
                .child(assembly("a").flag(flag("n", "1")).child(field("v", "x")))
                .child(assembly("a").flag(flag("n", "2")).child(field("v", "y")))
                .child(assembly("b").flag(flag("n", "3"))),
        )
        .build()
}

fn eval(src: &str, document: &SimpleNode) -> Result<Sequence, metapath::Error> {
    MetapathExpression::compile(src, &StaticContext::default())?
        .evaluate(&DynamicContext::default(), &vec![document.to_item()])
}

fn flags(src: &str, document: &SimpleNode) -> Vec<String> {
    eval(&format!("({src})/@n"), document)
        .unwrap_or_else(|e| panic!("'{src}': {e}"))
        .iter()
        .map(I::string_value)
        .collect()
}

#[rstest]
fn union_sorts_and_deduplicates(document: SimpleNode) {
    assert_eq!(flags("//b | //a | //a[1]", &document), ["1", "2", "3"]);
    assert_eq!(flags("//b union //a[2]", &document), ["2", "3"]);
}

#[rstest]
fn intersect_and_except(document: SimpleNode) {
    assert_eq!(flags("/root/* intersect //a", &document), ["1", "2"]);
    assert_eq!(flags("/root/* except //a[@n = '1']", &document), ["2", "3"]);
    assert!(eval("//a intersect //b", &document).unwrap().is_empty());
}

#[rstest]
fn union_of_flags_and_models_uses_document_order(document: SimpleNode) {
    let out = eval("//v | //a/@n | //a", &document).unwrap();
    let kinds: Vec<NodeKind> = out.iter().filter_map(I::as_node).map(|n| n.kind()).collect();
    assert_eq!(
        kinds,
        [
            NodeKind::Assembly,
            NodeKind::Flag,
            NodeKind::Field,
            NodeKind::Assembly,
            NodeKind::Flag,
            NodeKind::Field,
        ]
    );
}

#[rstest]
#[case("(1, 2) | //a")]
#[case("//a intersect 'x'")]
#[case("1 except //a")]
fn set_operators_reject_atomics(document: SimpleNode, #[case] src: &str) {
    let err = eval(src, &document).unwrap_err();
    assert_eq!(err.code, ErrorCode::XPTY0004);
}

#[rstest]
fn union_across_documents_keeps_each_tree_together(document: SimpleNode) {
    let other = doc().child(assembly("root").child(assembly("a").flag(flag("n", "9")))).build();
    let expr = MetapathExpression::compile("($y | $x)//a/@n", &StaticContext::default()).unwrap();
    let ctx = metapath::DynamicContextBuilder::new()
        .with_variable("x".into(), vec![document.to_item()])
        .with_variable("y".into(), vec![other.to_item()])
        .build();
    let values: Vec<String> =
        expr.evaluate(&ctx, &vec![]).unwrap().iter().map(I::string_value).collect();
    assert_eq!(values.len(), 3);
    let pos9 = values.iter().position(|v| v == "9").unwrap();
    let ours: Vec<&String> = values.iter().filter(|v| *v != "9").collect();
    assert_eq!(ours, ["1", "2"]);
    assert!(pos9 == 0 || pos9 == 2, "other document interleaved: {values:?}");

    let again: Vec<String> =
        expr.evaluate(&ctx, &vec![]).unwrap().iter().map(I::string_value).collect();
    assert_eq!(values, again);
}

#[rstest]
fn wide_steps_stay_in_document_order() {
    let wide = doc()
        .child(assembly("r").children((0..5000i64).map(|i| field("f", i))))
        .build();
    let out = eval("/r/f", &wide).unwrap();
    assert_eq!(out.len(), 5000);
    assert_eq!(out[0].string_value(), "0");
    assert_eq!(out[4999].string_value(), "4999");
    assert_eq!(eval("count(/r/f | /r/f[1])", &wide).unwrap()[0].string_value(), "5000");
}
