use serde::{Deserialize, Serialize};

/// A lattice point `(row, col)` on the occupancy grid.
///
/// Ordering is lexicographic on `(row, col)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[usize; 2]", into = "[usize; 2]")]
pub struct Node {
    pub row: usize,
    pub col: usize,
}

pub type Path = Vec<Node>;

impl Node {
    pub const fn new(row: usize, col: usize) -> Self {
        Node { row, col }
    }

    /// Euclidean distance. Never larger than the 4-neighbour hop count, so it
    /// is admissible for the cost-based strategies.
    pub fn distance(&self, other: &Node) -> f64 {
        let d_row = self.row.abs_diff(other.row) as f64;
        let d_col = self.col.abs_diff(other.col) as f64;
        d_row.hypot(d_col)
    }

    pub fn manhattan(&self, other: &Node) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    pub fn is_adjacent(&self, other: &Node) -> bool {
        self.manhattan(other) == 1
    }

    /// Shift by a signed delta; `None` when the result would leave the
    /// non-negative quadrant.
    pub(crate) fn offset(&self, d_row: isize, d_col: isize) -> Option<Node> {
        Some(Node {
            row: self.row.checked_add_signed(d_row)?,
            col: self.col.checked_add_signed(d_col)?,
        })
    }
}

impl From<[usize; 2]> for Node {
    fn from([row, col]: [usize; 2]) -> Self {
        Node { row, col }
    }
}

impl From<Node> for [usize; 2] {
    fn from(node: Node) -> Self {
        [node.row, node.col]
    }
}

impl From<(usize, usize)> for Node {
    fn from((row, col): (usize, usize)) -> Self {
        Node { row, col }
    }
}
