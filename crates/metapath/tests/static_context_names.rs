use metapath::consts::{FNS, XML_URI};
use metapath::runtime::{StaticContext, StaticContextBuilder};
use metapath::{ErrorCode, ExpandedName, compile};
use rstest::rstest;

#[rstest]
fn presets_are_bound() {
    let ctx = StaticContext::default();
    assert_eq!(ctx.lookup_prefix("xml"), Some(XML_URI));
    assert_eq!(ctx.lookup_prefix("fn"), Some(FNS));
    assert!(ctx.lookup_prefix("mp").is_some());
    assert_eq!(ctx.lookup_prefix("nope"), None);
}

#[rstest]
fn xml_prefix_cannot_be_rebound() {
    let ctx = StaticContextBuilder::new().with_namespace("xml", "urn:other").build();
    assert_eq!(ctx.lookup_prefix("xml"), Some(XML_URI));
}

#[rstest]
fn prefixed_names_expand() {
    let ctx = StaticContextBuilder::new().with_namespace("o", "urn:oscal").build();
    assert_eq!(ctx.resolve_model_name("o:catalog").unwrap(), ExpandedName::ns("urn:oscal", "catalog"));
}

#[rstest]
fn braced_names_are_taken_as_written() {
    let ctx = StaticContext::default();
    assert_eq!(ctx.resolve_model_name("Q{urn:x}a").unwrap(), ExpandedName::ns("urn:x", "a"));
    assert_eq!(ctx.resolve_model_name("Q{}a").unwrap(), ExpandedName::local("a"));
}

#[rstest]
fn unbound_prefix_is_static_error() {
    let err = StaticContext::default().resolve_model_name("zz:a").unwrap_err();
    assert_eq!(err.code, ErrorCode::XPST0081);
    assert!(err.is_static());
    let err = compile("zz:a").unwrap_err();
    assert_eq!(err.code, ErrorCode::XPST0081);
    let err = compile("zz:*").unwrap_err();
    assert_eq!(err.code, ErrorCode::XPST0081);
}

#[rstest]
fn xmlns_namespace_is_rejected() {
    let err = compile("Q{http://www.w3.org/2000/xmlns/}a").unwrap_err();
    assert_eq!(err.code, ErrorCode::XQST0070);
    let err = compile("Q{http://www.w3.org/2000/xmlns/}*").unwrap_err();
    assert_eq!(err.code, ErrorCode::XQST0070);
}

#[rstest]
fn unprefixed_names_take_the_matching_default() {
    let ctx = StaticContextBuilder::new().with_default_model_namespace("urn:m").build();
    assert_eq!(ctx.resolve_model_name("a").unwrap(), ExpandedName::ns("urn:m", "a"));
    assert_eq!(ctx.resolve_flag_name("id").unwrap(), ExpandedName::local("id"));
    assert_eq!(ctx.resolve_variable_name("x").unwrap(), ExpandedName::local("x"));
    assert_eq!(ctx.resolve_function_name("count").unwrap(), ExpandedName::ns(FNS, "count"));
}

#[rstest]
fn empty_prefix_sets_default_model_namespace() {
    let ctx = StaticContextBuilder::new().with_namespace("", "urn:m").build();
    assert_eq!(ctx.default_model_namespace.as_deref(), Some("urn:m"));
}

#[rstest]
fn required_namespace_without_default() {
    let ctx = StaticContext::default();
    assert_eq!(ctx.resolve_qname("a", None, false).unwrap(), ExpandedName::local("a"));
    let err = ctx.resolve_qname("a", None, true).unwrap_err();
    assert_eq!(err.code, ErrorCode::XPST0081);
}

#[rstest]
fn function_names_honour_custom_default() {
    let ctx = StaticContextBuilder::new().with_default_function_namespace("urn:f").build();
    assert_eq!(ctx.resolve_function_name("f").unwrap(), ExpandedName::ns("urn:f", "f"));
    assert_eq!(ctx.resolve_function_name("fn:count").unwrap(), ExpandedName::ns(FNS, "count"));
}

#[rstest]
fn expanded_name_display() {
    assert_eq!(ExpandedName::ns("urn:x", "a").to_string(), "Q{urn:x}a");
    assert_eq!(ExpandedName::local("a").to_string(), "a");
}
