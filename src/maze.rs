//! Maze carving by stack-driven recursive backtracking.
//!
//! Grids use `0` for open cells and `1` for walls. Both generators round the
//! requested dimensions up to odd values so that carving on odd coordinates
//! leaves a closed wall border.

use anyhow::{bail, Result};
use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, instrument};

use crate::common::Node;

pub const OPEN: i32 = 0;
pub const WALL: i32 = 1;

pub const DEFAULT_ROWS: usize = 31;
pub const DEFAULT_COLS: usize = 101;

const CARVE_STEPS: [(isize, isize); 4] = [(0, 2), (2, 0), (0, -2), (-2, 0)];
const INITIAL_BRANCH_CHANCE: f64 = 0.8;
const BRANCH_DECAY: f64 = 0.95;

/// A generated grid along with its (rounded) dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MazeResponse {
    pub rows: usize,
    pub cols: usize,
    pub grid: Vec<Vec<i32>>,
}

impl MazeResponse {
    pub fn generate<R: Rng + ?Sized>(rows: usize, cols: usize, symmetric: bool, rng: &mut R) -> Result<Self> {
        let grid = if symmetric {
            generate_symmetric_maze(rows, cols, rng)?
        } else {
            generate_random_maze(rows, cols, rng)?
        };
        Ok(MazeResponse {
            rows: grid.len(),
            cols: grid[0].len(),
            grid,
        })
    }
}

fn odd_dimensions(rows: usize, cols: usize) -> Result<(usize, usize)> {
    let (rows, cols) = (rows | 1, cols | 1);
    if rows < 3 || cols < 3 {
        bail!("invalid input: maze must be at least 3x3, got {rows}x{cols}");
    }
    Ok((rows, cols))
}

fn step(cell: Node, (d_row, d_col): (isize, isize)) -> Option<(Node, Node)> {
    let next = cell.offset(d_row, d_col)?;
    let wall = cell.offset(d_row / 2, d_col / 2)?;
    Some((next, wall))
}

/// The centre cell a symmetric maze is carved towards.
pub fn symmetric_goal(rows: usize, cols: usize) -> Node {
    Node::new((rows | 1) / 2, (cols | 1) / 2)
}

struct Frame {
    cell: Node,
    directions: Vec<(isize, isize)>,
    next: usize,
}

fn enter<R: Rng + ?Sized>(cell: Node, maze: &mut [Vec<i32>], rng: &mut R) -> Frame {
    maze[cell.row][cell.col] = OPEN;
    let mut directions = CARVE_STEPS.to_vec();
    directions.shuffle(rng);
    Frame {
        cell,
        directions,
        next: 0,
    }
}

/// A perfect maze carved from a random odd cell. `(1, 1)` and
/// `(rows - 2, cols - 2)` are always open.
#[instrument(skip(rng), level = "debug")]
pub fn generate_random_maze<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Result<Vec<Vec<i32>>> {
    let (rows, cols) = odd_dimensions(rows, cols)?;
    let mut maze = vec![vec![WALL; cols]; rows];
    let inside = |cell: Node| 0 < cell.row && cell.row < rows - 1 && 0 < cell.col && cell.col < cols - 1;

    let origin = Node::new(rng.gen_range(0..rows / 2) * 2 + 1, rng.gen_range(0..cols / 2) * 2 + 1);
    debug!("carving from {origin:?}");

    let mut stack = vec![enter(origin, &mut maze, rng)];

    while let Some(frame) = stack.last_mut() {
        let Some(&direction) = frame.directions.get(frame.next) else {
            stack.pop();
            continue;
        };
        frame.next += 1;
        let Some((next, wall)) = step(frame.cell, direction) else {
            continue;
        };
        if inside(next) && maze[next.row][next.col] == WALL {
            maze[wall.row][wall.col] = OPEN;
            let frame = enter(next, &mut maze, rng);
            stack.push(frame);
        }
    }

    maze[1][1] = OPEN;
    maze[rows - 2][cols - 2] = OPEN;
    Ok(maze)
}

struct BiasedFrame {
    cell: Node,
    directions: Vec<(isize, isize)>,
    next: usize,
    branch_chance: f64,
}

fn biased_directions<R: Rng + ?Sized>(cell: Node, target: Node, rng: &mut R) -> Vec<(isize, isize)> {
    let mut directions = Vec::with_capacity(8);
    if target.row > cell.row {
        directions.extend([(2, 0); 2]);
    } else if target.row < cell.row {
        directions.extend([(-2, 0); 2]);
    }
    if target.col > cell.col {
        directions.extend([(0, 2); 2]);
    } else if target.col < cell.col {
        directions.extend([(0, -2); 2]);
    }
    directions.extend(CARVE_STEPS);
    directions.shuffle(rng);
    directions
}

/// A maze whose columns mirror around the centre, carved from several left
/// edge starts towards the centre goal.
///
/// Guarantees open cells at `(1, 1)` and `(1, cols - 2)`, an open 3x3 around
/// [`symmetric_goal`] and a route from `(1, 1)` to the goal.
#[instrument(skip(rng), level = "debug")]
pub fn generate_symmetric_maze<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Result<Vec<Vec<i32>>> {
    let (rows, cols) = odd_dimensions(rows, cols)?;
    let mut maze = vec![vec![WALL; cols]; rows];
    let goal = symmetric_goal(rows, cols);
    let half = cols / 2;
    let inside = |cell: Node| 0 < cell.row && cell.row < rows - 1 && 0 < cell.col && cell.col < half;

    let open = |maze: &mut Vec<Vec<i32>>, cell: Node| {
        maze[cell.row][cell.col] = OPEN;
        maze[cell.row][cols - 1 - cell.col] = OPEN;
    };

    let start_count = (rows / 4).min(rows / 2);
    let start_rows = (1..rows - 1).step_by(2).choose_multiple(rng, start_count);
    debug!("carving from rows {start_rows:?} towards {goal:?}");

    for row in start_rows {
        let origin = Node::new(row, 1);
        open(&mut maze, origin);
        let mut stack = vec![BiasedFrame {
            cell: origin,
            directions: biased_directions(origin, goal, rng),
            next: 0,
            branch_chance: INITIAL_BRANCH_CHANCE,
        }];

        while let Some(frame) = stack.last_mut() {
            let Some(&direction) = frame.directions.get(frame.next) else {
                stack.pop();
                continue;
            };
            frame.next += 1;
            let Some((next, wall)) = step(frame.cell, direction) else {
                continue;
            };
            if !inside(next) || maze[next.row][next.col] != WALL || !rng.gen_bool(frame.branch_chance) {
                continue;
            }
            let branch_chance = frame.branch_chance * BRANCH_DECAY;
            open(&mut maze, wall);
            open(&mut maze, next);
            stack.push(BiasedFrame {
                cell: next,
                directions: biased_directions(next, goal, rng),
                next: 0,
                branch_chance,
            });
        }
    }

    open(&mut maze, Node::new(1, 1));
    for row in goal.row - 1..=goal.row + 1 {
        for col in goal.col - 1..=goal.col + 1 {
            if 0 < row && row < rows - 1 && 0 < col && col < cols - 1 {
                maze[row][col] = OPEN;
            }
        }
    }

    if !flood_fill(&maze, Node::new(1, 1)).contains(&goal) {
        debug!("goal unreachable, forcing a corridor");
        let mut cell = Node::new(1, 1);
        while cell.row < goal.row {
            open(&mut maze, cell);
            cell.row += 1;
        }
        while cell.col < goal.col {
            open(&mut maze, cell);
            cell.col += 1;
        }
    }

    Ok(maze)
}

/// Open cells reachable from `origin` through orthogonal moves.
fn flood_fill(maze: &[Vec<i32>], origin: Node) -> Vec<Node> {
    let mut seen = vec![vec![false; maze[0].len()]; maze.len()];
    let mut reached = Vec::new();
    let mut queue = VecDeque::from([origin]);
    seen[origin.row][origin.col] = true;

    while let Some(cell) = queue.pop_front() {
        reached.push(cell);
        for (d_row, d_col) in [(0, 1), (1, 0), (0, -1), (-1, 0)] {
            let Some(next) = cell.offset(d_row, d_col) else {
                continue;
            };
            if next.row < maze.len()
                && next.col < maze[0].len()
                && maze[next.row][next.col] == OPEN
                && !seen[next.row][next.col]
            {
                seen[next.row][next.col] = true;
                queue.push_back(next);
            }
        }
    }
    reached
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{testing::init_tracing, Registry};
    use crate::common::Problem;
    use crate::map::Map;
    use crate::report::drain;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assert_closed_border(maze: &[Vec<i32>]) {
        let (rows, cols) = (maze.len(), maze[0].len());
        for col in 0..cols {
            assert_eq!(maze[0][col], WALL);
            assert_eq!(maze[rows - 1][col], WALL);
        }
        for row in maze {
            assert_eq!(row[0], WALL);
            assert_eq!(row[cols - 1], WALL);
        }
    }

    #[test]
    fn test_dimensions_round_up_to_odd() {
        let mut rng = StdRng::seed_from_u64(1);
        for (rows, cols, expected) in [(10, 10, (11, 11)), (11, 20, (11, 21)), (2, 3, (3, 3)), (31, 101, (31, 101))] {
            let random = generate_random_maze(rows, cols, &mut rng).unwrap();
            let symmetric = generate_symmetric_maze(rows, cols, &mut rng).unwrap();
            for maze in [random, symmetric] {
                assert_eq!((maze.len(), maze[0].len()), expected);
                assert!(maze.iter().all(|row| row.len() == expected.1));
            }
        }
    }

    #[test]
    fn test_rejects_degenerate_dimensions() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate_random_maze(1, 9, &mut rng).is_err());
        assert!(generate_symmetric_maze(9, 0, &mut rng).is_err());
    }

    #[test]
    fn test_random_maze_shape() {
        init_tracing();
        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let maze = generate_random_maze(15, 24, &mut rng).unwrap();
            assert_closed_border(&maze);
            assert_eq!(maze[1][1], OPEN);
            assert_eq!(maze[13][23], OPEN);
            // Every odd cell is carved and reachable.
            let reached = flood_fill(&maze, Node::new(1, 1));
            for row in (1..15).step_by(2) {
                for col in (1..25).step_by(2) {
                    assert!(reached.contains(&Node::new(row, col)), "seed {seed}: ({row}, {col})");
                }
            }
        }
    }

    #[test]
    fn test_symmetric_maze_mirrors_and_connects() {
        init_tracing();
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let maze = generate_symmetric_maze(20, 30, &mut rng).unwrap();
            let cols = maze[0].len();
            assert_closed_border(&maze);
            for row in &maze {
                for col in 0..cols {
                    assert_eq!(row[col], row[cols - 1 - col], "seed {seed}");
                }
            }
            let goal = symmetric_goal(20, 30);
            assert_eq!(goal, Node::new(10, 15));
            assert_eq!(maze[1][1], OPEN);
            assert_eq!(maze[1][cols - 2], OPEN);
            for row in 9..=11 {
                assert!(maze[row][14..=16].iter().all(|cell| *cell == OPEN));
            }
            assert!(flood_fill(&maze, Node::new(1, 1)).contains(&goal), "seed {seed}");
        }
    }

    #[test]
    fn test_small_symmetric_maze_uses_corridor() {
        // Three rows leave no carving starts, so only the repair links the goal.
        let mut rng = StdRng::seed_from_u64(3);
        let maze = generate_symmetric_maze(3, 9, &mut rng).unwrap();
        assert_eq!(maze[1], vec![1, 0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_generated_mazes_are_solvable() {
        let registry = Registry::with_defaults();
        let mut rng = StdRng::seed_from_u64(42);

        let random = MazeResponse::generate(21, 31, false, &mut rng).unwrap();
        let goal = Node::new(random.rows - 2, random.cols - 2);
        let problem = Problem::new(Map::from_matrix(&random.grid).unwrap(), Node::new(1, 1), goal, vec![]).unwrap();
        let mut search = registry.create("bidirectional", problem.context()).unwrap();
        let report = drain(search.as_mut(), &problem.coins, None);
        assert!(problem.map.verify_path(&report.path, problem.start, goal));

        let symmetric = MazeResponse::generate(21, 31, true, &mut rng).unwrap();
        let goal = symmetric_goal(symmetric.rows, symmetric.cols);
        let problem = Problem::new(Map::from_matrix(&symmetric.grid).unwrap(), Node::new(1, 1), goal, vec![]).unwrap();
        let mut search = registry.create("astar", problem.context()).unwrap();
        let report = drain(search.as_mut(), &problem.coins, None);
        assert_eq!(report.length, problem.map.distances_from(goal)[1][1] + 1);
    }
}
