use super::{AStar, Search, SearchContext};
use crate::common::Step;

/// Uniform-cost search: the A* pop/skip/relax loop keyed by `(g, node)`.
pub struct Dijkstra<'a>(AStar<'a>);

impl<'a> Dijkstra<'a> {
    pub fn new(ctx: SearchContext<'a>) -> Self {
        Dijkstra(AStar::with_heuristic(ctx, false))
    }
}

impl Search for Dijkstra<'_> {
    fn advance(&mut self) -> Option<Step<'_>> {
        self.0.advance()
    }
}
