use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Node, Path};

pub const ORDINARY_SCORE: i32 = -1;
pub const COIN_SCORE: i32 = 3;
pub const GOAL_SCORE: i32 = 100;

pub type Coins = HashSet<Node>;

/// Presentation score of a visited cell: goal beats coin beats ordinary.
pub fn visit_score(node: Node, goal: Node, coins: &Coins) -> i32 {
    if node == goal {
        GOAL_SCORE
    } else if coins.contains(&node) {
        COIN_SCORE
    } else {
        ORDINARY_SCORE
    }
}

/// One entry of a strategy's trace, serialized as `[row, col, score]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(usize, usize, i32)", into = "(usize, usize, i32)")]
pub struct Visit {
    pub row: usize,
    pub col: usize,
    pub score: i32,
}

impl Visit {
    pub fn new(node: Node, score: i32) -> Self {
        Visit {
            row: node.row,
            col: node.col,
            score,
        }
    }

    pub fn node(&self) -> Node {
        Node::new(self.row, self.col)
    }
}

impl From<(usize, usize, i32)> for Visit {
    fn from((row, col, score): (usize, usize, i32)) -> Self {
        Visit { row, col, score }
    }
}

impl From<Visit> for (usize, usize, i32) {
    fn from(visit: Visit) -> Self {
        (visit.row, visit.col, visit.score)
    }
}

/// Outcome of one resumption of a search.
///
/// `visited` is always the full trace accumulated so far, not a delta.
#[derive(Debug, Clone, PartialEq)]
pub enum Step<'a> {
    Progress { visited: &'a [Visit] },
    /// Terminal. An empty `path` means the goal is unreachable.
    Finished { path: Path, visited: &'a [Visit] },
    /// Terminal. The search gave up on an internal budget.
    Aborted {
        reason: &'static str,
        visited: &'a [Visit],
    },
}

impl<'a> Step<'a> {
    pub fn visited(&self) -> &'a [Visit] {
        match self {
            Step::Progress { visited }
            | Step::Finished { visited, .. }
            | Step::Aborted { visited, .. } => *visited,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Step::Progress { .. })
    }
}

/// Append-once visit trace shared by every strategy.
#[derive(Debug, Default, Clone)]
pub(crate) struct VisitLog {
    records: Vec<Visit>,
    seen: HashSet<Node>,
}

impl VisitLog {
    /// Returns `false` (and records nothing) if `node` was already logged.
    pub(crate) fn record(&mut self, node: Node, score: i32) -> bool {
        if !self.seen.insert(node) {
            return false;
        }
        self.records.push(Visit::new(node, score));
        true
    }

    pub(crate) fn contains(&self, node: &Node) -> bool {
        self.seen.contains(node)
    }

    pub(crate) fn records(&self) -> &[Visit] {
        &self.records
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}
