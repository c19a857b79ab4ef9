use super::{construct_path, Predecessors, Search, SearchContext};
use crate::common::{Node, Step, VisitLog};

use std::collections::VecDeque;
use tracing::{debug, trace};

/// Breadth-first search. A node counts as visited the moment it is enqueued.
pub struct Bfs<'a> {
    ctx: SearchContext<'a>,
    queue: VecDeque<Node>,
    trace: Predecessors,
    visited: VisitLog,
    done: bool,
}

impl<'a> Bfs<'a> {
    pub fn new(ctx: SearchContext<'a>) -> Self {
        let mut visited = VisitLog::default();
        visited.record(ctx.start, ctx.score(ctx.start));
        Bfs {
            ctx,
            queue: VecDeque::from([ctx.start]),
            trace: Predecessors::new(),
            visited,
            done: false,
        }
    }
}

impl Search for Bfs<'_> {
    fn advance(&mut self) -> Option<Step<'_>> {
        if self.done {
            return None;
        }

        let Some(current) = self.queue.pop_front() else {
            self.done = true;
            debug!("queue exhausted after {} visits", self.visited.len());
            return Some(Step::Finished {
                path: Vec::new(),
                visited: self.visited.records(),
            });
        };
        trace!("dequeue {current:?}");

        if current == self.ctx.goal {
            self.done = true;
            return Some(Step::Finished {
                path: construct_path(&self.trace, current),
                visited: self.visited.records(),
            });
        }

        for &neighbor in self.ctx.map.neighbors_uncosted(current) {
            if self.visited.record(neighbor, self.ctx.score(neighbor)) {
                self.trace.insert(neighbor, current);
                self.queue.push_back(neighbor);
            }
        }

        Some(Step::Progress {
            visited: self.visited.records(),
        })
    }
}
