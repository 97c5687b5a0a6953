use std::collections::HashMap;
use std::sync::Arc;

use crate::consts::{FNS, METAPATH_FUNCTIONS_NS, XML_URI, XMLNS_URI};
use crate::error::{Error, ErrorCode};
use crate::functions::FunctionRegistry;
use crate::item::ExpandedName;

pub const DEFAULT_MAX_NESTING_DEPTH: usize = 512;

#[derive(Debug, Clone, Default)]
pub struct NamespaceBindings {
    pub by_prefix: HashMap<String, String>,
}

/// Compile-time environment: prefix bindings, default namespaces, nesting
/// limit and the registry used to resolve function calls.
#[derive(Debug, Clone)]
pub struct StaticContext {
    pub default_function_namespace: Option<String>,
    /// Applied to unprefixed assembly/field name tests. Flags never use it.
    pub default_model_namespace: Option<String>,
    pub namespaces: NamespaceBindings,
    pub max_nesting_depth: usize,
    functions: Arc<FunctionRegistry>,
}

impl Default for StaticContext {
    fn default() -> Self {
        let mut ns = NamespaceBindings::default();
        ns.by_prefix.insert("xml".to_string(), XML_URI.to_string());
        ns.by_prefix.insert("fn".to_string(), FNS.to_string());
        ns.by_prefix.insert("mp".to_string(), METAPATH_FUNCTIONS_NS.to_string());
        Self {
            default_function_namespace: Some(FNS.to_string()),
            default_model_namespace: None,
            namespaces: ns,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            functions: FunctionRegistry::global(),
        }
    }
}

/// Lexical shape of an EQName before namespace lookup.
enum LexicalName<'a> {
    Braced { uri: &'a str, local: &'a str },
    Prefixed { prefix: Option<&'a str>, local: &'a str },
}

fn split_eqname(s: &str) -> LexicalName<'_> {
    if let Some(rest) = s.strip_prefix("Q{")
        && let Some(end) = rest.find('}')
    {
        return LexicalName::Braced { uri: &rest[..end], local: &rest[end + 1..] };
    }
    match s.split_once(':') {
        Some((prefix, local)) => LexicalName::Prefixed { prefix: Some(prefix), local },
        None => LexicalName::Prefixed { prefix: None, local: s },
    }
}

impl StaticContext {
    pub fn function_registry(&self) -> &Arc<FunctionRegistry> {
        &self.functions
    }

    pub fn lookup_prefix(&self, prefix: &str) -> Option<&str> {
        self.namespaces.by_prefix.get(prefix).map(String::as_str)
    }

    /// Resolve an EQName (`Q{uri}local`, `prefix:local` or `local`).
    ///
    /// - Braced names are taken as written; the xmlns namespace is rejected
    ///   with `XQST0070`.
    /// - A prefix must be bound, otherwise `XPST0081`.
    /// - An unprefixed name takes `default_ns`. Without one it has no
    ///   namespace, unless `require_namespace` is set (`XPST0081`).
    pub fn resolve_qname(
        &self,
        lexical: &str,
        default_ns: Option<&str>,
        require_namespace: bool,
    ) -> Result<ExpandedName, Error> {
        match split_eqname(lexical) {
            LexicalName::Braced { uri, local } => {
                let uri = uri.trim();
                if uri == XMLNS_URI {
                    return Err(Error::static_err(
                        ErrorCode::XQST0070,
                        format!("namespace '{XMLNS_URI}' cannot be used in an expanded QName"),
                    ));
                }
                let ns = if uri.is_empty() { None } else { Some(uri.to_string()) };
                Ok(ExpandedName::new(ns, local))
            }
            LexicalName::Prefixed { prefix: Some(prefix), local } => {
                match self.lookup_prefix(prefix) {
                    Some(uri) => Ok(ExpandedName::ns(uri, local)),
                    None => Err(Error::static_err(
                        ErrorCode::XPST0081,
                        format!("prefix '{prefix}' is not expandable"),
                    )),
                }
            }
            LexicalName::Prefixed { prefix: None, local } => match default_ns {
                Some(uri) => Ok(ExpandedName::ns(uri, local)),
                None if require_namespace => Err(Error::static_err(
                    ErrorCode::XPST0081,
                    format!("name '{local}' requires a namespace but no default is bound"),
                )),
                None => Ok(ExpandedName::local(local)),
            },
        }
    }

    pub fn resolve_function_name(&self, lexical: &str) -> Result<ExpandedName, Error> {
        self.resolve_qname(lexical, self.default_function_namespace.as_deref(), true)
    }

    pub fn resolve_model_name(&self, lexical: &str) -> Result<ExpandedName, Error> {
        self.resolve_qname(lexical, self.default_model_namespace.as_deref(), false)
    }

    pub fn resolve_flag_name(&self, lexical: &str) -> Result<ExpandedName, Error> {
        self.resolve_qname(lexical, None, false)
    }

    pub fn resolve_variable_name(&self, lexical: &str) -> Result<ExpandedName, Error> {
        self.resolve_qname(lexical, None, false)
    }
}

/// Builder for [`StaticContext`]; keeps the fixed `xml` binding intact.
pub struct StaticContextBuilder {
    ctx: StaticContext,
}

impl Default for StaticContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticContextBuilder {
    pub fn new() -> Self {
        Self { ctx: StaticContext::default() }
    }

    /// Bind `prefix` to `uri`. Rebinding `xml` is ignored; the empty prefix
    /// sets the default model namespace.
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        let p = prefix.into();
        if p == "xml" {
            return self;
        }
        if p.is_empty() {
            self.ctx.default_model_namespace = Some(uri.into());
            return self;
        }
        self.ctx.namespaces.by_prefix.insert(p, uri.into());
        self
    }

    pub fn with_default_function_namespace(mut self, uri: impl Into<String>) -> Self {
        self.ctx.default_function_namespace = Some(uri.into());
        self
    }

    pub fn with_default_model_namespace(mut self, uri: impl Into<String>) -> Self {
        self.ctx.default_model_namespace = Some(uri.into());
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.ctx.max_nesting_depth = depth;
        self
    }

    pub fn with_function_registry(mut self, registry: Arc<FunctionRegistry>) -> Self {
        self.ctx.functions = registry;
        self
    }

    pub fn build(self) -> StaticContext {
        self.ctx
    }
}
