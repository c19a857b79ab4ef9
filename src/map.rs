use anyhow::{anyhow, bail, Context, Result};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};

use crate::common::Node;

/// Up, down, left, right.
pub const DIRECTIONS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Cost of every valid orthogonal move.
pub const STEP_COST: usize = 1;

#[derive(Debug, Clone)]
pub struct Tile {
    passable: bool,
    pub neighbors: Vec<Node>, // Valid orthogonal neighbours, in `DIRECTIONS` order
}

impl Tile {
    pub fn is_passable(&self) -> bool {
        self.passable
    }
}

/// Read-only occupancy grid. `0` is passable, anything else is a wall.
#[derive(Debug, Clone)]
pub struct Map {
    pub height: usize,
    pub width: usize,
    pub grid: Vec<Vec<Tile>>,
}

impl Map {
    pub fn from_matrix(matrix: &[Vec<i32>]) -> Result<Self> {
        let width = matrix.first().map_or(0, Vec::len);
        if matrix.is_empty() || width == 0 {
            bail!("invalid input: grid must have at least one row and one column");
        }
        if let Some(row) = matrix.iter().position(|row| row.len() != width) {
            bail!(
                "invalid input: row {row} has {} cells, expected {width}",
                matrix[row].len()
            );
        }

        Ok(Self::from_passability(
            matrix
                .iter()
                .map(|row| row.iter().map(|&cell| cell == 0).collect())
                .collect(),
        ))
    }

    /// Load a MovingAI `.map` file (`type`, `height`, `width`, `map` header).
    pub fn from_file(path: &str) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("cannot open map {path}"))?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();
        let mut header = |name: &str| -> Result<String> {
            lines
                .next()
                .ok_or_else(|| anyhow!("map {path} ends before the {name} line"))?
                .with_context(|| format!("cannot read {name} line of {path}"))
        };

        let _type = header("type")?;
        let height = parse_dimension(&header("height")?)?;
        let width = parse_dimension(&header("width")?)?;
        let _map = header("map")?;

        let mut passable = Vec::with_capacity(height);
        for line in lines.take(height) {
            let line = line?;
            let row: Vec<bool> = line.chars().map(|ch| ch == '.' || ch == 'G').collect();
            if row.len() != width {
                bail!("map {path}: row {} has {} cells, expected {width}", passable.len(), row.len());
            }
            passable.push(row);
        }
        if passable.len() != height {
            bail!("map {path}: expected {height} rows, found {}", passable.len());
        }

        Ok(Self::from_passability(passable))
    }

    /// Auxiliary map of the same size where only `cells` are passable.
    pub fn restricted_to(&self, cells: impl IntoIterator<Item = Node>) -> Map {
        let mut passable = vec![vec![false; self.width]; self.height];
        for cell in cells {
            if self.contains(cell) {
                passable[cell.row][cell.col] = true;
            }
        }
        Self::from_passability(passable)
    }

    fn from_passability(passable: Vec<Vec<bool>>) -> Self {
        let height = passable.len();
        let width = passable.first().map_or(0, Vec::len);
        let grid = passable
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|passable| Tile {
                        passable,
                        neighbors: Vec::new(),
                    })
                    .collect()
            })
            .collect();

        let mut map = Map {
            height,
            width,
            grid,
        };
        map.initialize_neighbors();
        map
    }

    fn initialize_neighbors(&mut self) {
        for row in 0..self.height {
            for col in 0..self.width {
                if self.grid[row][col].passable {
                    self.grid[row][col].neighbors = self.get_neighbors(Node::new(row, col));
                }
            }
        }
    }

    fn get_neighbors(&self, node: Node) -> Vec<Node> {
        DIRECTIONS
            .iter()
            .filter_map(|&(d_row, d_col)| node.offset(d_row, d_col))
            .filter(|&neighbor| self.is_valid(neighbor))
            .collect()
    }

    pub fn contains(&self, node: Node) -> bool {
        node.row < self.height && node.col < self.width
    }

    pub fn is_passable(&self, row: usize, col: usize) -> bool {
        self.grid[row][col].is_passable()
    }

    /// In bounds and passable.
    pub fn is_valid(&self, node: Node) -> bool {
        self.contains(node) && self.is_passable(node.row, node.col)
    }

    /// Valid neighbours paired with their move cost.
    ///
    /// Diagonal moves are not modelled: `include_diagonal` is accepted for
    /// interface compatibility and yields the same orthogonal set either way.
    pub fn neighbors(&self, node: Node, _include_diagonal: bool) -> Vec<(Node, usize)> {
        self.neighbors_uncosted(node)
            .iter()
            .map(|&neighbor| (neighbor, STEP_COST))
            .collect()
    }

    pub fn neighbors_uncosted(&self, node: Node) -> &[Node] {
        if !self.contains(node) {
            return &[];
        }
        &self.grid[node.row][node.col].neighbors
    }

    /// Exact hop count from every cell to `goal`; `usize::MAX` where
    /// unreachable.
    pub fn distances_from(&self, goal: Node) -> Vec<Vec<usize>> {
        let mut distances = vec![vec![usize::MAX; self.width]; self.height];
        if !self.is_valid(goal) {
            return distances;
        }
        let mut queue = VecDeque::new();

        distances[goal.row][goal.col] = 0;
        queue.push_back(goal);

        while let Some(current) = queue.pop_front() {
            let next_cost = distances[current.row][current.col] + STEP_COST;
            for &neighbor in self.neighbors_uncosted(current) {
                if next_cost < distances[neighbor.row][neighbor.col] {
                    distances[neighbor.row][neighbor.col] = next_cost;
                    queue.push_back(neighbor);
                }
            }
        }

        distances
    }

    /// A path is sound when it runs from `start` to `goal` through passable,
    /// orthogonally adjacent cells.
    pub fn verify_path(&self, path: &[Node], start: Node, goal: Node) -> bool {
        let (Some(first), Some(last)) = (path.first(), path.last()) else {
            return false;
        };
        *first == start
            && *last == goal
            && path.iter().all(|&node| self.is_valid(node))
            && path.windows(2).all(|pair| pair[0].is_adjacent(&pair[1]))
    }
}

fn parse_dimension(line: &str) -> Result<usize> {
    line.split_whitespace()
        .last()
        .ok_or_else(|| anyhow!("empty dimension line"))?
        .parse::<usize>()
        .with_context(|| format!("bad dimension line {line:?}"))
}

#[cfg(test)]
impl Map {
    /// `#` is a wall, anything else is open.
    pub(crate) fn from_ascii(rows: &[&str]) -> Map {
        let matrix: Vec<Vec<i32>> = rows
            .iter()
            .map(|row| row.chars().map(|ch| i32::from(ch == '#')).collect())
            .collect();
        Map::from_matrix(&matrix).unwrap()
    }

    pub(crate) fn open(height: usize, width: usize) -> Map {
        Map::from_matrix(&vec![vec![0; width]; height]).unwrap()
    }
}
