use super::{Search, SearchContext};
use crate::common::{Node, Path, Step, VisitLog};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Chance that a transition also lands on one extra random neighbour.
const SLIP_PROBABILITY: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];
    /// Order in which an agent tries untried actions.
    pub const PRIORITY: [Action; 4] = [Action::Right, Action::Down, Action::Left, Action::Up];

    pub fn delta(self) -> (isize, isize) {
        match self {
            Action::Up => (-1, 0),
            Action::Down => (1, 0),
            Action::Left => (0, -1),
            Action::Right => (0, 1),
        }
    }
}

#[derive(Debug, Clone)]
struct Frame {
    node: Node,
    path: Path,
    tried: Vec<Action>,
}

/// Online depth-first exploration: the agent walks the grid one move at a
/// time and backtracks along an explicit stack when it runs out of actions.
pub struct OnlineDfs<'a> {
    ctx: SearchContext<'a>,
    current: Node,
    path: Path,
    stack: Vec<Frame>,
    tried: HashMap<Node, Vec<Action>>,
    visited: VisitLog,
    rng: StdRng,
    done: bool,
}

impl<'a> OnlineDfs<'a> {
    pub fn new(ctx: SearchContext<'a>) -> Self {
        Self::with_rng(ctx, StdRng::from_entropy())
    }

    pub fn with_rng(ctx: SearchContext<'a>, rng: StdRng) -> Self {
        let mut visited = VisitLog::default();
        visited.record(ctx.start, ctx.score(ctx.start));
        OnlineDfs {
            ctx,
            current: ctx.start,
            path: vec![ctx.start],
            stack: Vec::new(),
            tried: HashMap::new(),
            visited,
            rng,
            done: false,
        }
    }

    /// Actions whose primary destination is valid from `node`.
    pub fn actions(&self, node: Node) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|action| self.destination(node, *action).is_some())
            .collect()
    }

    /// Outcomes of taking `action` at `node`: the primary destination, and
    /// with probability 0.3 one extra random neighbour of it. Empty when the
    /// move is blocked. The explorer only ever follows the first entry.
    pub fn successors(&mut self, node: Node, action: Action) -> Vec<Node> {
        let Some(primary) = self.destination(node, action) else {
            return Vec::new();
        };
        let mut outcomes = vec![primary];
        let neighbors = self.ctx.map.neighbors_uncosted(primary);
        if !neighbors.is_empty() && self.rng.gen::<f64>() < SLIP_PROBABILITY {
            if let Some(&slip) = neighbors.choose(&mut self.rng) {
                outcomes.push(slip);
            }
        }
        outcomes
    }

    fn destination(&self, node: Node, action: Action) -> Option<Node> {
        let (d_row, d_col) = action.delta();
        node.offset(d_row, d_col)
            .filter(|&next| self.ctx.map.is_valid(next))
    }

    fn next_untried(&self) -> Option<Action> {
        let tried = self.tried.get(&self.current);
        let legal = self.actions(self.current);
        Action::PRIORITY
            .into_iter()
            .find(|action| legal.contains(action) && tried.map_or(true, |t| !t.contains(action)))
    }
}

impl Search for OnlineDfs<'_> {
    fn advance(&mut self) -> Option<Step<'_>> {
        if self.done {
            return None;
        }

        if self.current == self.ctx.goal {
            self.done = true;
            debug!("goal reached, path length {}", self.path.len());
            return Some(Step::Finished {
                path: self.path.clone(),
                visited: self.visited.records(),
            });
        }

        loop {
            match self.next_untried() {
                Some(action) => {
                    let tried = self.tried.entry(self.current).or_default();
                    tried.push(action);
                    let snapshot = tried.clone();

                    let Some(&next) = self.successors(self.current, action).first() else {
                        continue;
                    };
                    // Already explored: the action counts as tried, the agent stays.
                    if self.visited.contains(&next) {
                        continue;
                    }
                    trace!("move {action:?} from {:?} to {next:?}", self.current);
                    self.stack.push(Frame {
                        node: self.current,
                        path: self.path.clone(),
                        tried: snapshot,
                    });
                    self.current = next;
                    self.path.push(next);
                    self.visited.record(next, self.ctx.score(next));
                    break;
                }
                None => {
                    let Some(frame) = self.stack.pop() else {
                        self.done = true;
                        debug!("stack exhausted after {} visits", self.visited.len());
                        return Some(Step::Finished {
                            path: Vec::new(),
                            visited: self.visited.records(),
                        });
                    };
                    trace!("backtrack from {:?} to {:?}", self.current, frame.node);
                    let tried = self.tried.entry(frame.node).or_default();
                    for action in frame.tried {
                        if !tried.contains(&action) {
                            tried.push(action);
                        }
                    }
                    self.current = frame.node;
                    self.path = frame.path;
                    break;
                }
            }
        }

        Some(Step::Progress {
            visited: self.visited.records(),
        })
    }
}
