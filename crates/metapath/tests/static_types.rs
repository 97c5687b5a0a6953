use metapath::types::analyze_static_result_type;
use metapath::{ItemType as T, compile};
use rstest::rstest;

#[rstest]
#[case(T::Integer, T::Decimal, true)]
#[case(T::Integer, T::Numeric, true)]
#[case(T::Decimal, T::Integer, false)]
#[case(T::Assembly, T::Model, true)]
#[case(T::Flag, T::Model, false)]
#[case(T::Document, T::Node, true)]
#[case(T::String, T::Item, true)]
#[case(T::Node, T::AnyAtomic, false)]
fn subtype_lattice(#[case] sub: T, #[case] sup: T, #[case] expected: bool) {
    assert_eq!(sub.is_subtype_of(sup), expected);
}

#[rstest]
#[case(T::Item, &[], T::Item)]
#[case(T::Item, &[T::Integer, T::Integer], T::Integer)]
#[case(T::Item, &[T::Integer, T::Decimal], T::Decimal)]
#[case(T::Item, &[T::Assembly, T::Field], T::Model)]
#[case(T::Item, &[T::Assembly, T::Flag], T::Node)]
#[case(T::Item, &[T::String, T::Flag], T::Item)]
#[case(T::Numeric, &[T::Integer, T::Decimal], T::Decimal)]
#[case(T::Numeric, &[T::Integer, T::String], T::Numeric)]
#[case(T::Node, &[T::Item], T::Node)]
fn common_supertype_bounded_by_base(#[case] base: T, #[case] children: &[T], #[case] expected: T) {
    assert_eq!(analyze_static_result_type(base, children.iter().copied()), expected);
}

#[rstest]
#[case("'a'", T::String)]
#[case("1", T::Integer)]
#[case("1.5", T::Decimal)]
#[case("1 + 2", T::Integer)]
#[case("1 + 2.5", T::Decimal)]
#[case("1 div 2", T::Decimal)]
#[case("7 idiv 2", T::Integer)]
#[case("'a' || 'b'", T::String)]
#[case("1 = 1", T::Boolean)]
#[case("1 eq 1 and 2 eq 2", T::Boolean)]
#[case("some $x in 1 satisfies $x", T::Boolean)]
#[case("1 to 3", T::Integer)]
#[case("(1, 2)", T::Integer)]
#[case("(1, 'a')", T::AnyAtomic)]
#[case("a", T::Model)]
#[case("@id", T::Flag)]
#[case("a/@id", T::Flag)]
#[case("a | b", T::Model)]
#[case("a | @id", T::Node)]
#[case("child::a", T::Node)]
#[case("..", T::Node)]
#[case("if (1) then 2 else 3.5", T::Decimal)]
#[case("let $x := 1 return 'x'", T::String)]
#[case("$x", T::Item)]
#[case("count(a)", T::Integer)]
#[case("(1, 2) ! 'x'", T::String)]
#[case("a[1]", T::Model)]
fn expression_static_types(#[case] src: &str, #[case] expected: T) {
    assert_eq!(compile(src).unwrap().static_result_type(), expected);
}

#[rstest]
fn display_names() {
    assert_eq!(T::Item.to_string(), "item()");
    assert_eq!(T::Assembly.to_string(), "assembly()");
    assert_eq!(T::Integer.as_str(), "integer");
}
