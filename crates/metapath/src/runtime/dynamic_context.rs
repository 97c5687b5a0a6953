use std::sync::Arc;

use smallvec::SmallVec;

use crate::functions::FunctionRegistry;
use crate::item::{ExpandedName, Sequence};

/// One immutable frame of variable bindings. Let/for frames hold a single
/// binding; quantified frames hold one per declared variable.
#[derive(Debug)]
struct Scope {
    parent: Option<Arc<Scope>>,
    variables: SmallVec<[(ExpandedName, Sequence); 2]>,
}

/// Evaluation-time environment: variable scope chain, function registry and
/// the optional focus position/size seen by `position()`/`last()`.
///
/// Cloning is cheap; child contexts share their ancestors' frames.
#[derive(Debug, Clone)]
pub struct DynamicContext {
    scope: Option<Arc<Scope>>,
    functions: Arc<FunctionRegistry>,
    focus_position: Option<(usize, usize)>,
}

impl Default for DynamicContext {
    fn default() -> Self {
        Self { scope: None, functions: FunctionRegistry::global(), focus_position: None }
    }
}

impl DynamicContext {
    /// New child context whose single frame holds `bindings`. The receiver
    /// is left untouched.
    pub fn sub_context<I>(&self, bindings: I) -> DynamicContext
    where
        I: IntoIterator<Item = (ExpandedName, Sequence)>,
    {
        let variables: SmallVec<[(ExpandedName, Sequence); 2]> = bindings.into_iter().collect();
        DynamicContext {
            scope: Some(Arc::new(Scope { parent: self.scope.clone(), variables })),
            functions: self.functions.clone(),
            focus_position: self.focus_position,
        }
    }

    pub fn bind_variable(&self, name: ExpandedName, value: Sequence) -> DynamicContext {
        self.sub_context([(name, value)])
    }

    /// Innermost binding of `name`, walking from this frame toward the root.
    pub fn variable(&self, name: &ExpandedName) -> Option<&Sequence> {
        let mut cur = self.scope.as_deref();
        while let Some(scope) = cur {
            if let Some((_, v)) = scope.variables.iter().rev().find(|(n, _)| n == name) {
                return Some(v);
            }
            cur = scope.parent.as_deref();
        }
        None
    }

    pub fn function_registry(&self) -> &Arc<FunctionRegistry> {
        &self.functions
    }

    /// 1-based position and size of the current focus item.
    pub fn focus_position(&self) -> Option<(usize, usize)> {
        self.focus_position
    }

    pub fn with_focus_position(&self, position: usize, size: usize) -> DynamicContext {
        DynamicContext { focus_position: Some((position, size)), ..self.clone() }
    }
}

pub struct DynamicContextBuilder {
    variables: Vec<(ExpandedName, Sequence)>,
    functions: Option<Arc<FunctionRegistry>>,
}

impl Default for DynamicContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicContextBuilder {
    pub fn new() -> Self {
        Self { variables: Vec::new(), functions: None }
    }

    pub fn with_variable(mut self, name: ExpandedName, value: impl Into<Sequence>) -> Self {
        self.variables.push((name, value.into()));
        self
    }

    pub fn with_function_registry(mut self, registry: Arc<FunctionRegistry>) -> Self {
        self.functions = Some(registry);
        self
    }

    pub fn build(self) -> DynamicContext {
        let base = DynamicContext {
            scope: None,
            functions: self.functions.unwrap_or_else(FunctionRegistry::global),
            focus_position: None,
        };
        if self.variables.is_empty() { base } else { base.sub_context(self.variables) }
    }
}
