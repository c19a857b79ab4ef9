mod astar;
mod backtracking;
mod bfs;
mod bidirectional;
mod dijkstra;
mod lrta;
mod online_dfs;
mod registry;

pub use astar::AStar;
pub use backtracking::{Backtracking, DEPTH_EXCEEDED};
pub use bfs::Bfs;
pub use bidirectional::Bidirectional;
pub use dijkstra::Dijkstra;
pub use lrta::Lrta;
pub use online_dfs::{Action, OnlineDfs};
pub use registry::{Factory, Registry};

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::common::{visit_score, Coins, Node, Path, Step};
use crate::map::Map;

/// Default recursion budget of the backtracking strategy.
pub const DEFAULT_DEPTH_LIMIT: usize = 10_000;

/// An animated search: an explicit state machine advanced one step at a time.
///
/// Every implementation yields `Progress` after each node it finalizes and
/// exactly one terminal step (`Finished` or `Aborted`) before returning
/// `None` forever after.
pub trait Search {
    fn advance(&mut self) -> Option<Step<'_>>;
}

/// Read-only inputs shared by every strategy for one search call.
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a> {
    pub map: &'a Map,
    pub start: Node,
    pub goal: Node,
    pub coins: &'a Coins,
    pub depth_limit: usize,
}

impl<'a> SearchContext<'a> {
    pub fn new(map: &'a Map, start: Node, goal: Node, coins: &'a Coins) -> Self {
        SearchContext {
            map,
            start,
            goal,
            coins,
            depth_limit: DEFAULT_DEPTH_LIMIT,
        }
    }

    pub fn with_depth_limit(mut self, depth_limit: usize) -> Self {
        self.depth_limit = depth_limit;
        self
    }

    pub fn with_start(mut self, start: Node) -> Self {
        self.start = start;
        self
    }

    pub(crate) fn score(&self, node: Node) -> i32 {
        visit_score(node, self.goal, self.coins)
    }
}

type Predecessors = HashMap<Node, Node>;

fn construct_path(trace: &Predecessors, mut current: Node) -> Path {
    let mut path = vec![current];
    while let Some(&previous) = trace.get(&current) {
        path.push(previous);
        current = previous;
    }
    path.reverse();
    path
}

/// Total order over `f64` heap keys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Cost(pub(crate) f64);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Frontier entry keyed by `(f, g, position)`, smallest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpenNode {
    pub(crate) f_cost: Cost,
    pub(crate) g_cost: usize,
    pub(crate) position: Node,
}

impl OpenNode {
    pub(crate) fn new(f_cost: f64, g_cost: usize, position: Node) -> Self {
        OpenNode {
            f_cost: Cost(f_cost),
            g_cost,
            position,
        }
    }
}

// Reversed so that `BinaryHeap` pops the lowest key first.
impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.g_cost.cmp(&self.g_cost))
            .then_with(|| other.position.cmp(&self.position))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
