//! Print the compact syntax tree of each expression given on the command line.
//!
//! ```text
//! cargo run -p metapath --example print_cst -- "//control[@id = 'ac-1']/title"
//! ```

use metapath::{StaticContext, MetapathExpression};

fn main() {
    let ctx = StaticContext::default();
    let mut failed = false;
    for source in std::env::args().skip(1) {
        match MetapathExpression::compile(&source, &ctx) {
            Ok(expr) => {
                println!("{source}  ::  {}", expr.static_result_type());
                print!("{}", expr.root().to_tree_string());
            }
            Err(e) => {
                eprintln!("{source}: {e}");
                failed = true;
            }
        }
    }
    if failed {
        std::process::exit(1);
    }
}
