//!
//! # Dependency-Ordering Trait and Helpers
//!

// Std-lib
use std::collections::HashSet;
use std::hash::Hash;

///
/// # Dependency-Ordering Trait
///
/// Cell hierarchies are graphs: cells reference other cells, which must be
/// defined (or written) first. Implementers of [DepOrder] are typically thin
/// views onto such a graph, e.g. a borrowed cell arena.
///
/// The single required graph-method `process` visits one `Item`, calling
/// `orderer.push` on each of its direct dependencies. [DepOrderer] recurses
/// depth-first, and reports a cycle through `fail` when it re-enters an
/// item whose processing has not yet completed.
///
/// ```text
/// struct CellOrder<'a>(&'a Arena);
/// impl DepOrder for CellOrder<'_> {
///     type Item = CellKey;
///     type Error = MyError;
///     fn process(&self, item: &CellKey, orderer: &mut DepOrderer<Self>) -> Result<(), MyError> {
///         for dep in self.0[*item].children() {
///             orderer.push(dep)?;
///         }
///         Ok(())
///     }
///     fn fail(&self, item: &CellKey) -> MyError {
///         MyError::Cycle(*item)
///     }
/// }
/// let ordered = CellOrder(&arena).order(&tops)?;
/// ```
///
pub trait DepOrder: Sized {
    /// Item Type. Typically keys into the dependency graph.
    type Item: Clone + Eq + Hash;
    /// Error Type
    type Error;

    /// Dependency-order all entries in slice `items`, and everything they depend on.
    /// Dependencies always precede their dependents in the result.
    fn order(&self, items: &[Self::Item]) -> Result<Vec<Self::Item>, Self::Error> {
        DepOrderer::new(self, items.len()).order(items)
    }

    /// Process a single `item`, pushing each of its direct dependencies
    fn process(&self, item: &Self::Item, orderer: &mut DepOrderer<Self>) -> Result<(), Self::Error>;
    /// Failure-handler, invoked with the item at which a cycle was detected
    fn fail(&self, item: &Self::Item) -> Self::Error;
}

/// # Dependency Order Helper
/// Public solely for use in the call-signature of [DepOrder::process].
pub struct DepOrderer<'p, P: DepOrder> {
    /// Graph view
    p: &'p P,
    /// Ordered, completed items
    stack: Vec<P::Item>,
    /// Completed items, for quick membership tests
    seen: HashSet<P::Item>,
    /// Items with open recursive frames, for cycle detection
    pending: HashSet<P::Item>,
}
impl<'p, P: DepOrder> DepOrderer<'p, P> {
    fn new(p: &'p P, capacity: usize) -> Self {
        Self {
            p,
            stack: Vec::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            pending: HashSet::new(),
        }
    }
    fn order(mut self, items: &[P::Item]) -> Result<Vec<P::Item>, P::Error> {
        for item in items.iter() {
            self.push(item)?;
        }
        Ok(self.stack)
    }
    /// Push `item`'s dependencies, and then itself, onto the stack
    pub fn push(&mut self, item: &P::Item) -> Result<(), P::Error> {
        if self.seen.contains(item) {
            return Ok(());
        }
        if !self.pending.insert(item.clone()) {
            // Already open further up the stack
            return Err(self.p.fail(item));
        }
        let p = self.p;
        p.process(item, self)?;
        self.pending.remove(item);
        self.seen.insert(item.clone());
        self.stack.push(item.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Adjacency list of named nodes
    struct Graph(HashMap<&'static str, Vec<&'static str>>);
    impl DepOrder for Graph {
        type Item = &'static str;
        type Error = String;
        fn process(&self, item: &&'static str, orderer: &mut DepOrderer<Self>) -> Result<(), String> {
            for dep in self.0.get(item).into_iter().flatten() {
                orderer.push(dep)?;
            }
            Ok(())
        }
        fn fail(&self, item: &&'static str) -> String {
            format!("cycle at {}", item)
        }
    }

    #[test]
    fn children_first() -> Result<(), String> {
        let g = Graph(HashMap::from([
            ("top", vec!["mid", "leaf"]),
            ("mid", vec!["leaf"]),
            ("leaf", vec![]),
        ]));
        let order = g.order(&["top"])?;
        assert_eq!(order, vec!["leaf", "mid", "top"]);
        // Repeated and already-seen entries are not duplicated
        let order = g.order(&["leaf", "top", "mid"])?;
        assert_eq!(order, vec!["leaf", "mid", "top"]);
        Ok(())
    }

    #[test]
    fn cycles_fail() {
        let g = Graph(HashMap::from([("a", vec!["b"]), ("b", vec!["a"])]));
        assert_eq!(g.order(&["a"]), Err("cycle at a".to_string()));
        let g = Graph(HashMap::from([("a", vec!["a"])]));
        assert_eq!(g.order(&["a"]), Err("cycle at a".to_string()));
    }
}
