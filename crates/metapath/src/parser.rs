//! Grammar front end. Produces the raw parse tree consumed by
//! [`crate::cst::CstBuilder`].

use pest::Parser;
use pest::iterators::Pair;

use crate::error::{Error, ErrorCode};

#[derive(pest_derive::Parser)]
#[grammar = "parser/metapath.pest"]
pub struct MetapathParser;

impl MetapathParser {
    /// Parse `input` into the root `metapath` pair.
    pub fn parse_metapath(input: &str) -> Result<Pair<'_, Rule>, Error> {
        let mut pairs = Self::parse(Rule::metapath, input).map_err(|e| {
            let (line, col) = match e.line_col {
                pest::error::LineColLocation::Pos(p) => p,
                pest::error::LineColLocation::Span(p, _) => p,
            };
            Error::static_err(
                ErrorCode::XPST0003,
                format!("syntax error at {line}:{col}: {}", e.variant.message()),
            )
        })?;
        pairs.next().ok_or_else(|| Error::defect("parser produced no metapath root"))
    }
}

/// Walk down a pair to the first terminal token rule (e.g. `OP_PLUS`, `K_AND`).
pub(crate) fn first_token_rule(pair: &Pair<'_, Rule>) -> Rule {
    let mut current = pair.clone();
    loop {
        match current.clone().into_inner().next() {
            Some(next) => current = next,
            None => return current.as_rule(),
        }
    }
}
