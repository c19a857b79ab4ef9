use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap, HashSet};
use std::time::Instant;
use tracing::{debug, instrument, trace};

use crate::algorithm::SearchContext;
use crate::common::{Node, Path, Visit, COIN_SCORE, GOAL_SCORE, ORDINARY_SCORE};
use crate::map::Map;
use crate::stat::Stats;

/// Value gained per collected coin relative to an ordinary step.
const COIN_GAIN: i64 = (COIN_SCORE - ORDINARY_SCORE) as i64;

/// The highest-value route from start to goal and the value it accumulates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub path: Path,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PlanNode {
    f: i64,
    g: i64,
    position: Node,
    collected: BTreeSet<Node>,
    path: Path,
}

// Highest `f` first, then lowest `g`, then the smallest remaining key.
impl Ord for PlanNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f
            .cmp(&other.f)
            .then_with(|| other.g.cmp(&self.g))
            .then_with(|| other.position.cmp(&self.position))
            .then_with(|| other.collected.cmp(&self.collected))
            .then_with(|| other.path.cmp(&self.path))
    }
}

impl PartialOrd for PlanNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn edge_value(ctx: &SearchContext<'_>, next: Node, collected: &BTreeSet<Node>) -> (i64, bool) {
    if next == ctx.goal {
        (GOAL_SCORE as i64, false)
    } else if ctx.coins.contains(&next) && !collected.contains(&next) {
        (COIN_SCORE as i64, true)
    } else {
        (ORDINARY_SCORE as i64, false)
    }
}

/// Upper bound on the value still obtainable from `node`.
///
/// A route of `d + e` steps (with `d` the Manhattan distance to the goal)
/// can only pick up coins whose detour `man(node, c) + man(c, goal) - d`
/// is at most `e`, so the bound maximizes over the candidate `e` values.
fn value_bound(ctx: &SearchContext<'_>, node: Node, collected: &BTreeSet<Node>) -> i64 {
    if node == ctx.goal {
        return 0;
    }
    let distance = node.manhattan(&ctx.goal) as i64;
    let mut detours: Vec<i64> = ctx
        .coins
        .iter()
        .filter(|coin| **coin != ctx.goal && !collected.contains(*coin))
        .map(|coin| (node.manhattan(coin) + coin.manhattan(&ctx.goal)) as i64 - distance)
        .collect();
    detours.sort_unstable();

    let step = -ORDINARY_SCORE as i64;
    let base = GOAL_SCORE as i64 + step - step * distance;
    let mut best = base;
    for (index, detour) in detours.iter().enumerate() {
        best = best.max(base - step * detour + COIN_GAIN * (index as i64 + 1));
    }
    best
}

/// Best-first search over `(position, collected coins)` maximizing the
/// accumulated route value. When `explored` is given and non-empty, only the
/// cells it names are considered passable.
#[instrument(skip_all, name = "coin_planner", level = "debug")]
pub fn plan(ctx: SearchContext<'_>, explored: Option<&[Visit]>) -> Plan {
    let start_time = Instant::now();
    let mut stats = Stats::default();

    let restricted: Map;
    let ctx = match explored {
        Some(visits) if !visits.is_empty() => {
            restricted = ctx.map.restricted_to(visits.iter().map(Visit::node));
            debug!("restricting search to {} explored cells", visits.len());
            SearchContext { map: &restricted, ..ctx }
        }
        _ => ctx,
    };

    if !ctx.map.is_valid(ctx.start) || !ctx.map.is_valid(ctx.goal) {
        debug!("start or goal is not passable");
        return Plan::default();
    }
    if ctx.start == ctx.goal {
        return Plan {
            path: vec![ctx.start],
            value: 0,
        };
    }

    let mut open_list = BinaryHeap::new();
    let mut closed_list: HashSet<(Node, BTreeSet<Node>)> = HashSet::new();

    let collected = BTreeSet::new();
    open_list.push(PlanNode {
        f: value_bound(&ctx, ctx.start, &collected),
        g: 0,
        position: ctx.start,
        collected,
        path: vec![ctx.start],
    });

    let mut result = Plan::default();
    while let Some(current) = open_list.pop() {
        if !closed_list.insert((current.position, current.collected.clone())) {
            continue;
        }
        stats.expanded += 1;
        trace!("expand node: {:?} g {} f {}", current.position, current.g, current.f);

        if current.position == ctx.goal {
            result = Plan {
                path: current.path,
                value: current.g,
            };
            break;
        }

        for &neighbor in ctx.map.neighbors_uncosted(current.position) {
            let (value, is_coin) = edge_value(&ctx, neighbor, &current.collected);
            let mut collected = current.collected.clone();
            if is_coin {
                collected.insert(neighbor);
            }
            if closed_list.contains(&(neighbor, collected.clone())) {
                continue;
            }
            let g = current.g + value;
            let mut path = current.path.clone();
            path.push(neighbor);
            open_list.push(PlanNode {
                f: g + value_bound(&ctx, neighbor, &collected),
                g,
                position: neighbor,
                collected,
                path,
            });
        }
    }

    stats.path_length = result.path.len();
    stats.time_us = start_time.elapsed().as_micros() as usize;
    stats.print("coin_planner");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::testing::init_tracing;
    use crate::common::Coins;

    /// Exhaustive optimum: best ordered subset of coins, legs measured by BFS
    /// on the grid without the goal so that only the final leg may enter it.
    fn brute_force_value(map: &Map, start: Node, goal: Node, coins: &[Node]) -> Option<i64> {
        let cells = (0..map.height)
            .flat_map(|row| (0..map.width).map(move |col| Node::new(row, col)))
            .filter(|node| map.is_valid(*node) && *node != goal);
        let detour_map = map.restricted_to(cells);
        let to_goal = map.distances_from(goal);

        fn leg(map: &Map, from: Node, to: Node) -> Option<i64> {
            let distance = map.distances_from(from)[to.row][to.col];
            (distance != usize::MAX).then_some(distance as i64)
        }

        fn extend(
            map: &Map,
            to_goal: &[Vec<usize>],
            coins: &[Node],
            used: &mut Vec<bool>,
            at: Node,
            steps: i64,
            count: i64,
            best: &mut Option<i64>,
        ) {
            let home = to_goal[at.row][at.col];
            if home != usize::MAX {
                let value = GOAL_SCORE as i64 + 1 + COIN_GAIN * count - steps - home as i64;
                *best = Some(best.map_or(value, |b| b.max(value)));
            }
            for index in 0..coins.len() {
                if used[index] {
                    continue;
                }
                if let Some(distance) = leg(map, at, coins[index]) {
                    used[index] = true;
                    extend(map, to_goal, coins, used, coins[index], steps + distance, count + 1, best);
                    used[index] = false;
                }
            }
        }

        let mut best = None;
        let mut used = vec![false; coins.len()];
        extend(&detour_map, &to_goal, coins, &mut used, start, 0, 0, &mut best);
        best
    }

    fn route_value(path: &[Node], goal: Node, coins: &Coins) -> i64 {
        let mut collected = HashSet::new();
        path.iter()
            .skip(1)
            .map(|node| {
                if *node == goal {
                    GOAL_SCORE as i64
                } else if coins.contains(node) && collected.insert(*node) {
                    COIN_SCORE as i64
                } else {
                    ORDINARY_SCORE as i64
                }
            })
            .sum()
    }

    #[test]
    fn test_plan_without_coins_is_shortest() {
        init_tracing();
        let map = Map::open(4, 6);
        let coins = Coins::new();
        let ctx = SearchContext::new(&map, Node::new(0, 0), Node::new(3, 5), &coins);
        let plan = plan(ctx, None);
        assert_eq!(plan.path.len(), 9);
        assert_eq!(plan.value, 100 - 7);
        assert!(map.verify_path(&plan.path, ctx.start, ctx.goal));
    }

    #[test]
    fn test_plan_takes_worthwhile_detour() {
        init_tracing();
        let map = Map::open(3, 5);
        let coins = Coins::from([Node::new(2, 2)]);
        let ctx = SearchContext::new(&map, Node::new(0, 0), Node::new(0, 4), &coins);
        let plan = plan(ctx, None);
        // Four extra steps cost four, the coin is worth four.
        assert_eq!(plan.value, 97);
        let direct = 100 - 3;
        assert!(plan.value >= direct);
        assert_eq!(route_value(&plan.path, ctx.goal, &coins), plan.value);
    }

    #[test]
    fn test_plan_matches_exhaustive_optimum() {
        init_tracing();
        let map = Map::from_ascii(&[
            ".....", //
            ".###.", //
            "..#..", //
            ".#...", //
            ".....",
        ]);
        let start = Node::new(0, 0);
        let goal = Node::new(2, 3);
        let layouts = [
            vec![Node::new(2, 0)],
            vec![Node::new(4, 0), Node::new(0, 4)],
            vec![Node::new(4, 4), Node::new(2, 1), Node::new(0, 2)],
            vec![Node::new(4, 2), Node::new(3, 4), Node::new(1, 0), Node::new(2, 4)],
        ];
        for layout in layouts {
            let coins: Coins = layout.iter().copied().collect();
            let ctx = SearchContext::new(&map, start, goal, &coins);
            let plan = plan(ctx, None);
            let expected = brute_force_value(&map, start, goal, &layout).unwrap();
            assert_eq!(plan.value, expected, "coins {layout:?}");
            assert_eq!(route_value(&plan.path, goal, &coins), plan.value);
            assert!(map.verify_path(&plan.path, start, goal));
        }
    }

    #[test]
    fn test_plan_never_counts_a_coin_twice() {
        let map = Map::from_ascii(&["...", "#.#", "..."]);
        let coins = Coins::from([Node::new(0, 0)]);
        let ctx = SearchContext::new(&map, Node::new(0, 1), Node::new(2, 1), &coins);
        let plan = plan(ctx, None);
        assert_eq!(
            plan.path,
            vec![Node::new(0, 1), Node::new(0, 0), Node::new(0, 1), Node::new(1, 1), Node::new(2, 1)]
        );
        assert_eq!(plan.value, 3 - 1 - 1 + 100);
    }

    #[test]
    fn test_plan_unreachable_goal() {
        let map = Map::from_ascii(&[".#.", ".#.", ".#."]);
        let coins = Coins::from([Node::new(2, 0)]);
        let ctx = SearchContext::new(&map, Node::new(0, 0), Node::new(0, 2), &coins);
        assert_eq!(plan(ctx, None), Plan::default());
    }

    #[test]
    fn test_plan_restricted_to_explored_cells() {
        let map = Map::open(3, 3);
        let coins = Coins::from([Node::new(2, 0)]);
        let ctx = SearchContext::new(&map, Node::new(0, 0), Node::new(0, 2), &coins);
        let explored: Vec<Visit> = [(0, 0), (0, 1), (0, 2)]
            .into_iter()
            .map(|cell| Visit::new(cell.into(), -1))
            .collect();

        let plan_restricted = plan(ctx, Some(explored.as_slice()));
        assert_eq!(plan_restricted.path, vec![Node::new(0, 0), Node::new(0, 1), Node::new(0, 2)]);
        assert_eq!(plan_restricted.value, 99);

        let nothing: &[Visit] = &[];
        let unrestricted = plan(ctx, Some(nothing));
        assert!(unrestricted.value >= plan_restricted.value);

        let missing_goal = &explored[..2];
        assert!(plan(ctx, Some(missing_goal)).path.is_empty());
    }

    #[test]
    fn test_value_bound_is_admissible_at_start() {
        let map = Map::open(5, 5);
        let coins = Coins::from([Node::new(4, 0), Node::new(2, 2)]);
        let ctx = SearchContext::new(&map, Node::new(0, 0), Node::new(0, 4), &coins);
        let bound = value_bound(&ctx, ctx.start, &BTreeSet::new());
        assert!(bound >= plan(ctx, None).value);
    }
}
