use super::{Expr, ExprKind, FunctionCall};

/// Read-only traversal over a compiled tree.
///
/// Every method defaults to walking the node's children, so implementors
/// override only the hooks they care about.
pub trait Visitor<'ast> {
    fn visit_expr(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_function_call(&mut self, call: &'ast FunctionCall) {
        for arg in call.arguments() {
            self.visit_expr(arg);
        }
    }
}

pub fn walk_expr<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, expr: &'ast Expr) {
    if let ExprKind::FunctionCall(call) = expr.kind() {
        visitor.visit_function_call(call);
        return;
    }
    for child in expr.children() {
        visitor.visit_expr(child);
    }
}
