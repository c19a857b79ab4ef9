use super::{construct_path, OpenNode, Predecessors, Search, SearchContext};
use crate::common::{Node, Step, VisitLog};

use std::collections::{BinaryHeap, HashMap};
use tracing::{debug, trace};

/// Best-first search over `f = g + h` with the Euclidean distance as `h`.
///
/// With `informed` off the heuristic is zero and the search is Dijkstra's.
pub struct AStar<'a> {
    ctx: SearchContext<'a>,
    informed: bool,
    open_list: BinaryHeap<OpenNode>,
    g_cost_map: HashMap<Node, usize>,
    trace: Predecessors,
    visited: VisitLog,
    done: bool,
}

impl<'a> AStar<'a> {
    pub fn new(ctx: SearchContext<'a>) -> Self {
        Self::with_heuristic(ctx, true)
    }

    pub(super) fn with_heuristic(ctx: SearchContext<'a>, informed: bool) -> Self {
        let mut search = AStar {
            ctx,
            informed,
            open_list: BinaryHeap::new(),
            g_cost_map: HashMap::new(),
            trace: Predecessors::new(),
            visited: VisitLog::default(),
            done: false,
        };
        let start_h_cost = search.heuristic(ctx.start);
        search
            .open_list
            .push(OpenNode::new(start_h_cost, 0, ctx.start));
        search.g_cost_map.insert(ctx.start, 0);
        search
    }

    fn heuristic(&self, node: Node) -> f64 {
        if self.informed {
            node.distance(&self.ctx.goal)
        } else {
            0.0
        }
    }
}

impl Search for AStar<'_> {
    fn advance(&mut self) -> Option<Step<'_>> {
        if self.done {
            return None;
        }

        while let Some(current) = self.open_list.pop() {
            // Stale duplicate of a node that is already finalized.
            if self.visited.contains(&current.position) {
                continue;
            }
            trace!("expand node: {current:?}");
            self.visited
                .record(current.position, self.ctx.score(current.position));

            if current.position == self.ctx.goal {
                self.done = true;
                debug!(
                    "goal reached with g cost {}, {} nodes visited",
                    current.g_cost,
                    self.visited.len()
                );
                return Some(Step::Finished {
                    path: construct_path(&self.trace, current.position),
                    visited: self.visited.records(),
                });
            }

            for (neighbor, cost) in self.ctx.map.neighbors(current.position, false) {
                if self.visited.contains(&neighbor) {
                    continue;
                }
                let tentative_g_cost = current.g_cost + cost;
                if tentative_g_cost < *self.g_cost_map.get(&neighbor).unwrap_or(&usize::MAX) {
                    self.g_cost_map.insert(neighbor, tentative_g_cost);
                    self.trace.insert(neighbor, current.position);
                    let f_cost = tentative_g_cost as f64 + self.heuristic(neighbor);
                    self.open_list
                        .push(OpenNode::new(f_cost, tentative_g_cost, neighbor));
                }
            }

            return Some(Step::Progress {
                visited: self.visited.records(),
            });
        }

        self.done = true;
        debug!("cannot find solution");
        Some(Step::Finished {
            path: Vec::new(),
            visited: self.visited.records(),
        })
    }
}
