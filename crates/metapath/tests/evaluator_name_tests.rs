use metapath::simple_node::{SimpleNode, flag};
use metapath::{
    DynamicContext, ExpandedName, Item as I, MetapathExpression, StaticContext, StaticContextBuilder,
};
use rstest::{fixture, rstest};

const OSCAL: &str = "urn:oscal";

#[fixture]
fn tree() -> SimpleNode {
    SimpleNode::document()
        .child(
            SimpleNode::assembly(ExpandedName::ns(OSCAL, "catalog"))
                .flag(flag("id", "c1"))
                .child(SimpleNode::field(ExpandedName::ns(OSCAL, "title"), "Namespaced"))
                .child(SimpleNode::field("title", "Plain"))
                .child(SimpleNode::field(ExpandedName::ns("urn:ext", "title"), "Extension")),
        )
        .build()
}

fn strings(src: &str, ctx: &StaticContext, tree: &SimpleNode) -> Vec<String> {
    let expr = MetapathExpression::compile(src, ctx).unwrap_or_else(|e| panic!("'{src}': {e}"));
    expr.evaluate(&DynamicContext::default(), &vec![tree.to_item()])
        .unwrap_or_else(|e| panic!("'{src}': {e}"))
        .iter()
        .map(I::string_value)
        .collect()
}

#[rstest]
fn unprefixed_name_without_default_matches_no_namespace(tree: SimpleNode) {
    let ctx = StaticContext::default();
    assert!(strings("/catalog", &ctx, &tree).is_empty());
    assert_eq!(strings("/*/title", &ctx, &tree), ["Plain"]);
}

#[rstest]
fn default_model_namespace_applies_to_model_names(tree: SimpleNode) {
    let ctx = StaticContextBuilder::new().with_default_model_namespace(OSCAL).build();
    assert_eq!(strings("/catalog/title", &ctx, &tree), ["Namespaced"]);
    // flags never pick up the default
    assert_eq!(strings("/catalog/@id", &ctx, &tree), ["c1"]);
}

#[rstest]
fn prefixed_and_braced_names(tree: SimpleNode) {
    let ctx = StaticContextBuilder::new().with_namespace("o", OSCAL).build();
    assert_eq!(strings("/o:catalog/o:title", &ctx, &tree), ["Namespaced"]);
    assert_eq!(strings("/Q{urn:oscal}catalog/Q{urn:ext}title", &ctx, &tree), ["Extension"]);
    assert_eq!(strings("/o:catalog/Q{}title", &ctx, &tree), ["Plain"]);
}

#[rstest]
#[case("/*/*", &["Namespaced", "Plain", "Extension"])]
#[case("/*/o:*", &["Namespaced"])]
#[case("/*/*:title", &["Namespaced", "Plain", "Extension"])]
#[case("/*/Q{urn:ext}*", &["Extension"])]
#[case("/*/Q{}*", &["Plain"])]
#[case("/*/child::o:*", &["Namespaced"])]
fn wildcards(tree: SimpleNode, #[case] src: &str, #[case] expected: &[&str]) {
    let ctx = StaticContextBuilder::new().with_namespace("o", OSCAL).build();
    assert_eq!(strings(src, &ctx, &tree), expected);
}
