use super::{Search, SearchContext};
use crate::common::{Node, Step, VisitLog};

use std::collections::HashSet;
use tracing::{debug, trace, warn};

/// Error marker reported when the descent outgrows its depth budget.
pub const DEPTH_EXCEEDED: &str = "Path too deep - recursion limit reached";

/// Right, down, then left, up.
const ORDER: [(isize, isize); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

#[derive(Debug, Clone)]
struct Frame {
    node: Node,
    next_direction: usize,
}

/// Depth-first backtracking with the recursion reified as an explicit stack.
/// Returns the first path it stumbles on, which need not be the shortest.
pub struct Backtracking<'a> {
    ctx: SearchContext<'a>,
    stack: Vec<Frame>,
    seen: HashSet<Node>,
    visited: VisitLog,
    started: bool,
    done: bool,
}

impl<'a> Backtracking<'a> {
    pub fn new(ctx: SearchContext<'a>) -> Self {
        Backtracking {
            ctx,
            stack: Vec::new(),
            seen: HashSet::from([ctx.start]),
            visited: VisitLog::default(),
            started: false,
            done: false,
        }
    }

    fn enter(&mut self, node: Node) {
        trace!("descend into {node:?} at depth {}", self.stack.len());
        self.stack.push(Frame {
            node,
            next_direction: 0,
        });
        self.visited.record(node, self.ctx.score(node));
    }

    /// Next unexplored valid neighbour of the deepest frame.
    fn next_child(&mut self) -> Option<Node> {
        let map = self.ctx.map;
        let frame = self.stack.last_mut()?;
        while frame.next_direction < ORDER.len() {
            let (d_row, d_col) = ORDER[frame.next_direction];
            frame.next_direction += 1;
            let Some(next) = frame.node.offset(d_row, d_col) else {
                continue;
            };
            if map.is_valid(next) && !self.seen.contains(&next) {
                return Some(next);
            }
        }
        None
    }
}

impl Search for Backtracking<'_> {
    fn advance(&mut self) -> Option<Step<'_>> {
        if self.done {
            return None;
        }

        if !self.started {
            self.started = true;
            self.enter(self.ctx.start);
            return Some(Step::Progress {
                visited: self.visited.records(),
            });
        }

        loop {
            let Some(top) = self.stack.last() else {
                self.done = true;
                debug!("all branches exhausted");
                return Some(Step::Finished {
                    path: Vec::new(),
                    visited: self.visited.records(),
                });
            };

            if top.node == self.ctx.goal {
                self.done = true;
                debug!("goal reached at depth {}", self.stack.len());
                return Some(Step::Finished {
                    path: self.stack.iter().map(|frame| frame.node).collect(),
                    visited: self.visited.records(),
                });
            }

            match self.next_child() {
                Some(next) => {
                    if self.stack.len() >= self.ctx.depth_limit {
                        self.done = true;
                        warn!("depth limit {} reached", self.ctx.depth_limit);
                        return Some(Step::Aborted {
                            reason: DEPTH_EXCEEDED,
                            visited: self.visited.records(),
                        });
                    }
                    self.seen.insert(next);
                    self.enter(next);
                    return Some(Step::Progress {
                        visited: self.visited.records(),
                    });
                }
                // Dead end: unwind one level.
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}
