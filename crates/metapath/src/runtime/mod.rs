//! Compile-time and evaluation-time environments.

mod dynamic_context;
mod static_context;

pub use dynamic_context::{DynamicContext, DynamicContextBuilder};
pub use static_context::{
    DEFAULT_MAX_NESTING_DEPTH, NamespaceBindings, StaticContext, StaticContextBuilder,
};
