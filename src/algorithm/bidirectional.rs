use super::{Predecessors, Search, SearchContext};
use crate::common::{Node, Path, Step, VisitLog};

use std::collections::{HashMap, VecDeque};
use tracing::{debug, trace};

#[derive(Debug)]
struct Frontier {
    queue: VecDeque<Node>,
    parent: Predecessors,
    depth: HashMap<Node, usize>,
    level_left: usize, // Nodes of the current level still to expand
}

impl Frontier {
    fn new(root: Node) -> Self {
        Frontier {
            queue: VecDeque::from([root]),
            parent: Predecessors::new(),
            depth: HashMap::from([(root, 0)]),
            level_left: 1,
        }
    }

    fn contains(&self, node: &Node) -> bool {
        self.depth.contains_key(node)
    }

    /// `node`, its parent, ..., up to this frontier's root.
    fn chain(&self, mut node: Node) -> Path {
        let mut chain = vec![node];
        while let Some(&previous) = self.parent.get(&node) {
            chain.push(previous);
            node = previous;
        }
        chain
    }
}

#[derive(Debug, Clone, Copy)]
struct Meeting {
    hops: usize,
    forward: Node,
    backward: Node,
}

/// Breadth-first search from both ends at once, alternating one full level
/// per side. When the frontiers touch, the rest of the level is still
/// expanded so the shortest crossing edge wins.
pub struct Bidirectional<'a> {
    ctx: SearchContext<'a>,
    forward: Frontier,
    backward: Frontier,
    forward_turn: bool,
    meeting: Option<Meeting>,
    visited: VisitLog,
    done: bool,
}

impl<'a> Bidirectional<'a> {
    pub fn new(ctx: SearchContext<'a>) -> Self {
        let mut visited = VisitLog::default();
        visited.record(ctx.start, ctx.score(ctx.start));
        visited.record(ctx.goal, ctx.score(ctx.goal));
        Bidirectional {
            ctx,
            forward: Frontier::new(ctx.start),
            backward: Frontier::new(ctx.goal),
            forward_turn: true,
            meeting: None,
            visited,
            done: false,
        }
    }

    fn stitch(&self, meeting: Meeting) -> Path {
        let mut path = self.forward.chain(meeting.forward);
        path.reverse();
        path.extend(self.backward.chain(meeting.backward));
        path
    }

    fn finish(&mut self, path: Path) -> Option<Step<'_>> {
        self.done = true;
        Some(Step::Finished {
            path,
            visited: self.visited.records(),
        })
    }
}

impl Search for Bidirectional<'_> {
    fn advance(&mut self) -> Option<Step<'_>> {
        if self.done {
            return None;
        }
        if self.ctx.start == self.ctx.goal {
            return self.finish(vec![self.ctx.start]);
        }

        let forward_turn = self.forward_turn;
        let (side, other) = if forward_turn {
            (&mut self.forward, &self.backward)
        } else {
            (&mut self.backward, &self.forward)
        };

        let Some(current) = side.queue.pop_front() else {
            debug!(
                "{} frontier exhausted",
                if forward_turn { "forward" } else { "backward" }
            );
            return self.finish(Vec::new());
        };
        trace!("expand {current:?} (forward: {forward_turn})");
        let current_depth = side.depth[&current];

        for &neighbor in self.ctx.map.neighbors_uncosted(current) {
            if let Some(&other_depth) = other.depth.get(&neighbor) {
                let hops = current_depth + 1 + other_depth;
                if self.meeting.map_or(true, |best| hops < best.hops) {
                    self.meeting = Some(if forward_turn {
                        Meeting { hops, forward: current, backward: neighbor }
                    } else {
                        Meeting { hops, forward: neighbor, backward: current }
                    });
                }
            }
            if !side.contains(&neighbor) {
                side.depth.insert(neighbor, current_depth + 1);
                side.parent.insert(neighbor, current);
                side.queue.push_back(neighbor);
                self.visited.record(neighbor, self.ctx.score(neighbor));
            }
        }

        side.level_left -= 1;
        if side.level_left == 0 {
            side.level_left = side.queue.len();
            if let Some(meeting) = self.meeting {
                debug!("frontiers met after {} hops", meeting.hops);
                let path = self.stitch(meeting);
                return self.finish(path);
            }
            self.forward_turn = !forward_turn;
        }

        Some(Step::Progress {
            visited: self.visited.records(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::testing::{assert_unique_visits, init_tracing, run};
    use crate::common::{Coins, Visit};
    use crate::map::Map;

    #[test]
    fn test_bidirectional_open_grid_scenario() {
        init_tracing();
        let map = Map::open(5, 5);
        let coins = Coins::new();
        let ctx = SearchContext::new(&map, Node::new(0, 0), Node::new(4, 4), &coins);
        let (path, visited, _) = run(&mut Bidirectional::new(ctx));
        assert_eq!(path.len(), 9);
        assert!(map.verify_path(&path, ctx.start, ctx.goal));
        assert_unique_visits(&visited);
    }

    #[test]
    fn test_records_use_own_coordinates() {
        let map = Map::open(3, 5);
        let coins = Coins::new();
        let ctx = SearchContext::new(&map, Node::new(1, 0), Node::new(1, 4), &coins);
        let mut search = Bidirectional::new(ctx);
        match search.advance() {
            Some(Step::Progress { visited }) => assert_eq!(
                visited,
                &[
                    Visit::new(Node::new(1, 0), -1),
                    Visit::new(Node::new(1, 4), 100),
                    Visit::new(Node::new(0, 0), -1),
                    Visit::new(Node::new(2, 0), -1),
                    Visit::new(Node::new(1, 1), -1),
                ]
            ),
            other => panic!("expected progress, got {other:?}"),
        }
    }

    #[test]
    fn test_shortest_when_levels_overlap_unevenly() {
        // Two corridors of different lengths between start and goal.
        let map = Map::from_ascii(&[".......", ".#####.", "...#...", "##.#.##", "......."]);
        let coins = Coins::new();
        let start = Node::new(2, 0);
        let goal = Node::new(2, 6);
        let hops = map.distances_from(goal)[start.row][start.col];
        let ctx = SearchContext::new(&map, start, goal, &coins);
        let (path, _, _) = run(&mut Bidirectional::new(ctx));
        assert_eq!(path.len(), hops + 1);
        assert!(map.verify_path(&path, start, goal));
    }

    #[test]
    fn test_adjacent_endpoints() {
        let map = Map::open(1, 2);
        let coins = Coins::new();
        let ctx = SearchContext::new(&map, Node::new(0, 0), Node::new(0, 1), &coins);
        let (path, _, rounds) = run(&mut Bidirectional::new(ctx));
        assert_eq!(path, vec![Node::new(0, 0), Node::new(0, 1)]);
        assert_eq!(rounds, 1);
    }
}
