//! `some`/`every` over the Cartesian product of the binding sequences.

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::cst::{Expr, Quantifier};
use crate::error::Error;
use crate::item::{ExpandedName, Item, Sequence};
use crate::runtime::DynamicContext;

use super::effective_boolean_value;

/// Lazy odometer over the product of `sources`. Index 0, the first declared
/// variable, advances fastest.
pub(crate) struct Tuples<'a> {
    sources: &'a [Sequence],
    indices: SmallVec<[usize; 4]>,
    done: bool,
}

impl<'a> Tuples<'a> {
    pub(crate) fn new(sources: &'a [Sequence]) -> Self {
        let done = sources.is_empty() || sources.iter().any(Vec::is_empty);
        Self { sources, indices: SmallVec::from_elem(0, sources.len()), done }
    }
}

impl<'a> Iterator for Tuples<'a> {
    type Item = SmallVec<[&'a Item; 4]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let tuple = self.indices.iter().zip(self.sources).map(|(&i, s)| &s[i]).collect();
        let mut pos = 0;
        loop {
            self.indices[pos] += 1;
            if self.indices[pos] < self.sources[pos].len() {
                break;
            }
            self.indices[pos] = 0;
            pos += 1;
            if pos == self.sources.len() {
                self.done = true;
                break;
            }
        }
        Some(tuple)
    }
}

pub(crate) fn evaluate_quantified(
    quantifier: Quantifier,
    bindings: &IndexMap<ExpandedName, Expr>,
    satisfies: &Expr,
    ctx: &DynamicContext,
    focus: &Sequence,
) -> Result<bool, Error> {
    let sources: Vec<Sequence> =
        bindings.values().map(|e| e.evaluate(ctx, focus)).collect::<Result<_, _>>()?;
    for tuple in Tuples::new(&sources) {
        let frame = bindings.keys().cloned().zip(tuple.into_iter().map(|i| vec![i.clone()]));
        let inner = ctx.sub_context(frame);
        let holds = effective_boolean_value(&satisfies.evaluate(&inner, focus)?)?;
        match quantifier {
            Quantifier::Some if holds => return Ok(true),
            Quantifier::Every if !holds => return Ok(false),
            _ => {}
        }
    }
    Ok(quantifier == Quantifier::Every)
}
