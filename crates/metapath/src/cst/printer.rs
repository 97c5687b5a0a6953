use core::fmt::Write;

use super::{Expr, Visitor, walk_expr};

/// Renders a tree as indented labels, two spaces per level.
#[derive(Debug, Default)]
pub struct CstPrinter {
    depth: usize,
    out: String,
}

impl CstPrinter {
    pub fn finish(self) -> String {
        self.out
    }
}

impl<'ast> Visitor<'ast> for CstPrinter {
    fn visit_expr(&mut self, expr: &'ast Expr) {
        let _ = writeln!(self.out, "{:indent$}{}", "", expr.label(), indent = self.depth * 2);
        self.depth += 1;
        walk_expr(self, expr);
        self.depth -= 1;
    }
}
