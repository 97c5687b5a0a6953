use core::cmp::Ordering;

use metapath::model::{NodeItem, NodeKind, root_of};
use metapath::simple_node::{SimpleNode, assembly, doc, field, flag};
use metapath::AtomicValue;
use rstest::rstest;

fn cmp(a: &dyn NodeItem, b: &dyn NodeItem) -> &'static str {
    match a.compare_document_order(b) {
        Ordering::Less => "<",
        Ordering::Greater => ">",
        Ordering::Equal => "=",
    }
}

#[rstest]
fn flags_precede_model_children() {
    let a = assembly("a")
        .flag(flag("x", "1"))
        .flag(flag("y", "2"))
        .child(field("f", "v"))
        .child(assembly("g"))
        .build();
    let flags = a.flags();
    let kids = a.model_children();
    assert_eq!(cmp(flags[0].as_ref(), flags[1].as_ref()), "<");
    assert_eq!(cmp(flags[1].as_ref(), kids[0].as_ref()), "<");
    assert_eq!(cmp(kids[0].as_ref(), kids[1].as_ref()), "<");
    assert_eq!(cmp(kids[1].as_ref(), flags[0].as_ref()), ">");
}

#[rstest]
fn ancestors_precede_descendants() {
    let tree = assembly("r").child(assembly("a").child(field("b", "x"))).build();
    let a = tree.model_children()[0].clone();
    let b = a.model_children()[0].clone();
    assert_eq!(cmp(&tree, a.as_ref()), "<");
    assert_eq!(cmp(a.as_ref(), b.as_ref()), "<");
    assert_eq!(cmp(b.as_ref(), &tree), ">");
    assert_eq!(cmp(b.as_ref(), b.as_ref()), "=");
}

#[rstest]
fn separate_trees_order_by_root() {
    let one = assembly("a").child(field("b", "x")).build();
    let two = assembly("a").child(field("b", "y")).build();
    let first = cmp(&one, &two);
    assert_ne!(first, "=");
    assert_eq!(cmp(&two, &one), if first == "<" { ">" } else { "<" });
    // every node of a tree sorts on the same side as its root
    let inner = one.model_children()[0].clone();
    assert_eq!(cmp(inner.as_ref(), &two), first);
    assert_eq!(inner.doc_order_key().root(), one.id());
}

#[rstest]
fn order_keys_follow_sibling_positions() {
    let d = doc()
        .child(assembly("a").flag(flag("x", "1")).child(field("f", "v")).child(assembly("g")))
        .build();
    let a = d.model_children()[0].clone();
    assert!(d.doc_order_key().path().is_empty());
    assert_eq!(a.doc_order_key().path(), &[0usize]);
    assert_eq!(a.flags()[0].doc_order_key().path(), &[0usize, 0]);
    assert_eq!(a.model_children()[1].doc_order_key().path(), &[0usize, 2]);
    assert_eq!(a.model_children()[0].sibling_index(), Some(1));
}

#[rstest]
fn parents_and_roots() {
    let d = doc().child(assembly("a").child(field("b", "x").flag(flag("c", "y")))).build();
    let a = d.model_children()[0].clone();
    let b = a.model_children()[0].clone();
    let c = b.flags()[0].clone();
    assert_eq!(c.parent().map(|p| p.id()), Some(b.id()));
    assert_eq!(root_of(&c).id(), d.id());
    assert_eq!(root_of(&c).kind(), NodeKind::Document);
    assert!(d.parent().is_none());
}

#[rstest]
fn typed_and_string_values() {
    let d = doc()
        .child(assembly("a").child(field("b", "x")).child(field("n", 5i64)))
        .build();
    let a = d.model_children()[0].clone();
    assert_eq!(a.value(), None);
    assert_eq!(a.model_children()[1].value(), Some(AtomicValue::from(5i64)));
    assert_eq!(a.string_value(), "x5");
    assert_eq!(d.string_value(), "x5");
}

#[rstest]
fn clones_share_identity() {
    let a = SimpleNode::assembly("a").build();
    let b = a.clone();
    assert_eq!(a.id(), b.id());
    assert_eq!(a, b);
    assert_ne!(a.id(), SimpleNode::assembly("a").build().id());
}
