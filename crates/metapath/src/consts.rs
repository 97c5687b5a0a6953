//! Well-known namespace URIs.

/// W3C XPath functions namespace (`fn` prefix).
pub const FNS: &str = "http://www.w3.org/2005/xpath-functions";

/// Metapath extension functions namespace (`mp` prefix).
pub const METAPATH_FUNCTIONS_NS: &str = "http://csrc.nist.gov/ns/metaschema/metapath-functions";

/// The implicit `xml` prefix binding.
pub const XML_URI: &str = "http://www.w3.org/XML/1998/namespace";

/// Namespace reserved for namespace declarations; never valid in an expanded name.
pub const XMLNS_URI: &str = "http://www.w3.org/2000/xmlns/";
