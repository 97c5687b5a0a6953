//! Metapath: an XPath 3.1 style query language over Metaschema document
//! trees. Expressions compile into an immutable compact syntax tree that is
//! evaluated against caller-supplied nodes.

pub mod consts;
pub mod cst;
pub mod error;
pub mod evaluator;
pub mod expression;
pub mod functions;
pub mod item;
pub mod model;
pub mod parser;
pub mod runtime;
pub mod simple_node;
pub mod types;

pub use cst::{CstBuilder, Expr, ExprKind};
pub use error::{Error, ErrorCode, ErrorKind};
pub use expression::{MetapathExpression, ResultType, TypedResult, compile, evaluate_expr};
pub use functions::{Function, FunctionRegistry};
pub use item::{AtomicValue, ExpandedName, Item, Sequence};
pub use model::{NodeItem, NodeKind, NodeRef};
pub use parser::MetapathParser;
pub use runtime::{DynamicContext, DynamicContextBuilder, StaticContext, StaticContextBuilder};
pub use simple_node::{SimpleNode, SimpleNodeBuilder};
pub use types::ItemType;
