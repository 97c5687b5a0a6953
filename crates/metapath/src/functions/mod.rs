//! Function registry keyed by (expanded name, arity).
//!
//! Registration conventions:
//! - One registration per function using arity ranges via `register_ns_range`;
//!   dispatch inside the closure on `args.len()` for optional parameters.
//! - `register_ns_variadic` for open-ended families such as `fn:concat`.
//!
//! The process-wide registry returned by [`FunctionRegistry::global`] is built
//! once on first use and is immutable afterwards. Callers wanting extra
//! functions start from [`FunctionRegistry::with_builtins`] and pass their own
//! registry through the static or dynamic context.

mod builtins;

use core::fmt;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use itertools::Itertools;

use crate::error::{Error, ErrorCode};
use crate::item::{ExpandedName, Sequence};
use crate::runtime::DynamicContext;
use crate::types::ItemType;

pub type Arity = usize;

/// What a function implementation sees besides its arguments.
pub struct CallCtx<'a> {
    pub dyn_ctx: &'a DynamicContext,
    pub focus: &'a Sequence,
}

pub type FunctionImpl = Arc<dyn Fn(&CallCtx<'_>, &[Sequence]) -> Result<Sequence, Error> + Send + Sync>;

pub struct Function {
    name: ExpandedName,
    min_arity: Arity,
    max_arity: Option<Arity>,
    result_type: ItemType,
    imp: FunctionImpl,
}

impl Function {
    pub fn new(
        name: ExpandedName,
        min_arity: Arity,
        max_arity: Option<Arity>,
        result_type: ItemType,
        imp: FunctionImpl,
    ) -> Self {
        Self { name, min_arity, max_arity, result_type, imp }
    }

    pub fn name(&self) -> &ExpandedName {
        &self.name
    }

    pub fn result_type(&self) -> ItemType {
        self.result_type
    }

    pub fn accepts_arity(&self, arity: Arity) -> bool {
        arity >= self.min_arity && self.max_arity.is_none_or(|m| arity <= m)
    }

    pub fn invoke(&self, ctx: &CallCtx<'_>, args: &[Sequence]) -> Result<Sequence, Error> {
        (self.imp)(ctx, args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("min_arity", &self.min_arity)
            .field("max_arity", &self.max_arity)
            .field("result_type", &self.result_type)
            .finish_non_exhaustive()
    }
}

/// Error type returned by [`FunctionRegistry::lookup`].
#[derive(Debug, Clone)]
pub enum ResolveError {
    /// No function with this name exists.
    Unknown(ExpandedName),
    /// Function exists, but not for the requested arity.
    WrongArity { name: ExpandedName, available: Vec<Arity> },
}

impl From<ResolveError> for Error {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Unknown(name) => {
                Error::static_err(ErrorCode::XPST0017, format!("unknown function {name}"))
            }
            ResolveError::WrongArity { name, available } => {
                Error::static_err(
                    ErrorCode::XPST0017,
                    format!(
                        "function {name} has no overload with the given arity (available: {})",
                        available.iter().join(", ")
                    ),
                )
            }
        }
    }
}

static GLOBAL: LazyLock<Arc<FunctionRegistry>> = LazyLock::new(|| {
    let reg = FunctionRegistry::with_builtins();
    tracing::debug!(functions = reg.len(), "initialized global function registry");
    Arc::new(reg)
});

#[derive(Default)]
pub struct FunctionRegistry {
    // Per name, candidates ordered most specific first: higher min arity,
    // then smaller max arity (variadic last).
    fns: HashMap<ExpandedName, Vec<Arc<Function>>>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry").field("functions", &self.len()).finish()
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh registry pre-populated with the core `fn:` functions.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        builtins::register_builtins(&mut reg);
        reg
    }

    /// Shared process-wide registry holding the built-ins.
    pub fn global() -> Arc<FunctionRegistry> {
        GLOBAL.clone()
    }

    /// Number of registered overloads.
    pub fn len(&self) -> usize {
        self.fns.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fns.is_empty()
    }

    pub fn register(&mut self, function: Function) {
        let cands = self.fns.entry(function.name.clone()).or_default();
        cands.push(Arc::new(function));
        cands.sort_by(|a, b| {
            b.min_arity.cmp(&a.min_arity).then_with(|| match (a.max_arity, b.max_arity) {
                (Some(am), Some(bm)) => am.cmp(&bm),
                (Some(_), None) => core::cmp::Ordering::Less,
                (None, Some(_)) => core::cmp::Ordering::Greater,
                (None, None) => core::cmp::Ordering::Equal,
            })
        });
    }

    pub fn register_ns<F>(&mut self, ns_uri: &str, local: &str, arity: Arity, result: ItemType, f: F)
    where
        F: 'static + Send + Sync + Fn(&CallCtx<'_>, &[Sequence]) -> Result<Sequence, Error>,
    {
        self.register_ns_range(ns_uri, local, arity, Some(arity), result, f);
    }

    /// Register with an arity range; `max_arity == None` means variadic.
    pub fn register_ns_range<F>(
        &mut self,
        ns_uri: &str,
        local: &str,
        min_arity: Arity,
        max_arity: Option<Arity>,
        result: ItemType,
        f: F,
    ) where
        F: 'static + Send + Sync + Fn(&CallCtx<'_>, &[Sequence]) -> Result<Sequence, Error>,
    {
        let name = ExpandedName::ns(ns_uri, local);
        self.register(Function::new(name, min_arity, max_arity, result, Arc::new(f)));
    }

    pub fn register_ns_variadic<F>(
        &mut self,
        ns_uri: &str,
        local: &str,
        min_arity: Arity,
        result: ItemType,
        f: F,
    ) where
        F: 'static + Send + Sync + Fn(&CallCtx<'_>, &[Sequence]) -> Result<Sequence, Error>,
    {
        self.register_ns_range(ns_uri, local, min_arity, None, result, f);
    }

    /// Typed lookup distinguishing unknown names from arity mismatches.
    pub fn lookup(&self, name: &ExpandedName, arity: Arity) -> Result<Arc<Function>, ResolveError> {
        let Some(cands) = self.fns.get(name) else {
            return Err(ResolveError::Unknown(name.clone()));
        };
        if let Some(f) = cands.iter().find(|f| f.accepts_arity(arity)) {
            return Ok(f.clone());
        }
        let mut available: Vec<Arity> = Vec::new();
        for f in cands {
            match f.max_arity {
                Some(max) => available.extend(f.min_arity..=max),
                None => available.push(f.min_arity),
            }
        }
        available.sort_unstable();
        available.dedup();
        Err(ResolveError::WrongArity { name: name.clone(), available })
    }

    /// Like [`lookup`](Self::lookup) but reports failures as `XPST0017`.
    pub fn resolve(&self, name: &ExpandedName, arity: Arity) -> Result<Arc<Function>, Error> {
        let res = self.lookup(name, arity).map_err(Error::from);
        tracing::trace!(function = %name, arity, resolved = res.is_ok(), "resolve function");
        res
    }
}
