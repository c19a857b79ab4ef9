use super::{construct_path, OpenNode, Predecessors, Search, SearchContext};
use crate::common::{Node, Step, VisitLog};

use std::collections::{BinaryHeap, HashMap};
use tracing::{debug, trace};

/// Learning real-time A*: a best-first search whose per-node heuristic starts
/// at the Euclidean distance and is refined at every expansion to
/// `min(cost + h(successor))`.
pub struct Lrta<'a> {
    ctx: SearchContext<'a>,
    open_list: BinaryHeap<OpenNode>,
    g_cost_map: HashMap<Node, usize>,
    heuristic: HashMap<Node, f64>,
    trace: Predecessors,
    visited: VisitLog,
    done: bool,
}

impl<'a> Lrta<'a> {
    pub fn new(ctx: SearchContext<'a>) -> Self {
        let mut search = Lrta {
            ctx,
            open_list: BinaryHeap::new(),
            g_cost_map: HashMap::from([(ctx.start, 0)]),
            heuristic: HashMap::new(),
            trace: Predecessors::new(),
            visited: VisitLog::default(),
            done: false,
        };
        let start_h_cost = search.estimate(ctx.start);
        search
            .open_list
            .push(OpenNode::new(start_h_cost, 0, ctx.start));
        search
    }

    /// The current learned estimate for `node`, if it has been seen.
    pub fn learned_heuristic(&self, node: Node) -> Option<f64> {
        self.heuristic.get(&node).copied()
    }

    fn estimate(&mut self, node: Node) -> f64 {
        let goal = self.ctx.goal;
        *self
            .heuristic
            .entry(node)
            .or_insert_with(|| node.distance(&goal))
    }
}

impl Search for Lrta<'_> {
    fn advance(&mut self) -> Option<Step<'_>> {
        if self.done {
            return None;
        }

        while let Some(current) = self.open_list.pop() {
            let best_g_cost = *self
                .g_cost_map
                .get(&current.position)
                .unwrap_or(&usize::MAX);
            if current.g_cost > best_g_cost {
                continue;
            }
            trace!("expand node: {current:?}");
            self.visited
                .record(current.position, self.ctx.score(current.position));

            if current.position == self.ctx.goal {
                self.done = true;
                debug!("goal reached with g cost {}", current.g_cost);
                return Some(Step::Finished {
                    path: construct_path(&self.trace, current.position),
                    visited: self.visited.records(),
                });
            }

            let mut learned = f64::INFINITY;
            for (neighbor, cost) in self.ctx.map.neighbors(current.position, false) {
                let h_cost = self.estimate(neighbor);
                learned = learned.min(cost as f64 + h_cost);

                let tentative_g_cost = current.g_cost + cost;
                if tentative_g_cost < *self.g_cost_map.get(&neighbor).unwrap_or(&usize::MAX) {
                    self.g_cost_map.insert(neighbor, tentative_g_cost);
                    self.trace.insert(neighbor, current.position);
                    self.open_list.push(OpenNode::new(
                        tentative_g_cost as f64 + h_cost,
                        tentative_g_cost,
                        neighbor,
                    ));
                }
            }
            // min over successors of f(successor) - g(current)
            self.heuristic.insert(current.position, learned);

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
