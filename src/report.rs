use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, instrument, warn};

use crate::algorithm::Search;
use crate::common::{Coins, Path, Step, Visit};
use crate::stat::Stats;

/// What one strategy run reports back to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub path: Path,
    pub visited: Vec<Visit>,
    pub cost: i64,
    pub length: usize,
    pub coins_collected: usize,
    pub score: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Weight of one collected coin in the final score.
pub const COIN_WEIGHT: i64 = 1000;

#[derive(Debug)]
struct Candidate {
    path: Path,
    visited: Vec<Visit>,
    coins: usize,
    length: usize,
}

impl SearchReport {
    fn failed(error: impl Into<String>) -> Self {
        SearchReport {
            error: Some(error.into()),
            ..SearchReport::default()
        }
    }

    fn from_candidate(candidate: Candidate) -> Self {
        let coins = candidate.coins as i64;
        let length = candidate.length as i64;
        SearchReport {
            path: candidate.path,
            visited: candidate.visited,
            cost: length - coins * COIN_WEIGHT,
            length: candidate.length,
            coins_collected: candidate.coins,
            score: coins * COIN_WEIGHT - length,
            error: None,
        }
    }
}

/// Drain a search to completion and reduce its terminal steps to one report.
///
/// Every non-empty terminal path is a candidate; the one with the most coins
/// wins, ties going to the shorter path. `max_rounds` caps the number of
/// resumptions; hitting it counts as exhaustion.
#[instrument(skip_all, name = "drain", level = "debug")]
pub fn drain(search: &mut dyn Search, coins: &Coins, max_rounds: Option<usize>) -> SearchReport {
    let (report, stats) = drain_with_stats(search, coins, max_rounds);
    stats.print("drain");
    report
}

fn drain_with_stats(
    search: &mut dyn Search,
    coins: &Coins,
    max_rounds: Option<usize>,
) -> (SearchReport, Stats) {
    let start_time = Instant::now();
    let mut stats = Stats::default();
    let mut candidates = Vec::new();

    let failure = loop {
        if max_rounds.is_some_and(|limit| stats.resumptions >= limit) {
            warn!("stopped after {} resumptions", stats.resumptions);
            if candidates.is_empty() {
                break Some(format!("Search stopped after {} steps", stats.resumptions));
            }
            break None;
        }
        let Some(step) = search.advance() else {
            break None;
        };
        stats.resumptions += 1;
        stats.visited = step.visited().len();

        match step {
            Step::Progress { .. } => stats.expanded += 1,
            Step::Finished { path, visited } => {
                if !path.is_empty() {
                    candidates.push(Candidate {
                        coins: path.iter().filter(|node| coins.contains(node)).count(),
                        length: path.len(),
                        path,
                        visited: visited.to_vec(),
                    });
                }
            }
            Step::Aborted { reason, .. } => {
                warn!("search aborted: {reason}");
                break Some(reason.to_string());
            }
        }
    };

    let report = match failure {
        Some(error) => SearchReport::failed(error),
        None => {
            // Stable: among equal keys the earliest candidate stays first.
            candidates.sort_by(|a, b| b.coins.cmp(&a.coins).then(a.length.cmp(&b.length)));
            debug!("{} candidate path(s)", candidates.len());
            candidates
                .into_iter()
                .next()
                .map(SearchReport::from_candidate)
                .unwrap_or_default()
        }
    };

    stats.path_length = report.length;
    stats.time_us = start_time.elapsed().as_micros() as usize;
    (report, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{Registry, SearchContext, DEPTH_EXCEEDED};
    use crate::common::{Node, SearchRequest};
    use crate::map::Map;

    /// Replays a fixed list of terminal paths, for exercising selection.
    struct Scripted {
        paths: Vec<Path>,
        visited: Vec<Visit>,
    }

    impl Search for Scripted {
        fn advance(&mut self) -> Option<Step<'_>> {
            if self.paths.is_empty() {
                return None;
            }
            Some(Step::Finished {
                path: self.paths.remove(0),
                visited: &self.visited,
            })
        }
    }

    fn line(cols: std::ops::RangeInclusive<usize>) -> Path {
        cols.map(|col| Node::new(0, col)).collect()
    }

    #[test]
    fn test_open_grid_scores() {
        let map = Map::open(5, 5);
        let coins = Coins::new();
        let registry = Registry::with_defaults();
        let ctx = SearchContext::new(&map, Node::new(0, 0), Node::new(4, 4), &coins);
        for name in ["bfs", "astar", "dijkstra"] {
            let mut search = registry.create(name, ctx).unwrap();
            let report = drain(search.as_mut(), &coins, None);
            assert_eq!(report.length, 9, "{name}");
            assert_eq!(report.score, -9, "{name}");
            assert_eq!(report.cost, 9, "{name}");
            assert_eq!(report.coins_collected, 0, "{name}");
            assert!(report.error.is_none());
        }
    }

    #[test]
    fn test_coin_on_path_scores() {
        let map = Map::open(5, 5);
        let coins = Coins::from([Node::new(2, 2)]);
        let registry = Registry::with_defaults();
        let ctx = SearchContext::new(&map, Node::new(0, 0), Node::new(4, 4), &coins);
        for name in registry.names() {
            let mut search = registry.create(name, ctx).unwrap();
            let report = drain(search.as_mut(), &coins, None);
            if report.path.contains(&Node::new(2, 2)) {
                assert_eq!(report.coins_collected, 1, "{name}");
                assert_eq!(report.score, 1000 - report.length as i64, "{name}");
                assert_eq!(report.cost, -report.score, "{name}");
            }
            if report.length == 9 && report.coins_collected == 1 {
                assert_eq!(report.score, 991);
            }
        }
    }

    #[test]
    fn test_start_equals_goal_report() {
        let map = Map::open(3, 3);
        let coins = Coins::new();
        let registry = Registry::with_defaults();
        let node = Node::new(1, 1);
        let ctx = SearchContext::new(&map, node, node, &coins);
        for name in registry.names() {
            let mut search = registry.create(name, ctx).unwrap();
            let report = drain(search.as_mut(), &coins, None);
            assert_eq!(report.path, vec![node], "{name}");
            assert_eq!(report.length, 1);
            assert_eq!(report.score, -1);
            assert!(report.visited.contains(&Visit::new(node, 100)));
        }
    }

    #[test]
    fn test_unreachable_report_is_zeroed() {
        let map = Map::from_ascii(&[".#.", ".#.", ".#."]);
        let coins = Coins::new();
        let ctx = SearchContext::new(&map, Node::new(0, 0), Node::new(0, 2), &coins);
        let mut search = Registry::with_defaults().create("astar", ctx).unwrap();
        let report = drain(search.as_mut(), &coins, None);
        assert_eq!(report, SearchReport::default());
    }

    #[test]
    fn test_selection_prefers_coins_then_length() {
        let coins = Coins::from([Node::new(0, 5)]);
        let mut search = Scripted {
            paths: vec![line(0..=3), line(0..=6), line(0..=2), line(0..=5)],
            visited: Vec::new(),
        };
        let report = drain(&mut search, &coins, None);
        assert_eq!(report.path, line(0..=5));
        assert_eq!(report.coins_collected, 1);
        assert_eq!(report.score, 994);

        let mut search = Scripted {
            paths: vec![line(0..=3), line(0..=2)],
            visited: Vec::new(),
        };
        assert_eq!(drain(&mut search, &Coins::new(), None).path, line(0..=2));
    }

    #[test]
    fn test_depth_exhaustion_is_absorbed() {
        let map = Map::open(1, 40);
        let coins = Coins::new();
        let ctx = SearchContext::new(&map, Node::new(0, 0), Node::new(0, 39), &coins)
            .with_depth_limit(16);
        let mut search = Registry::with_defaults().create("binary", ctx).unwrap();
        let report = drain(search.as_mut(), &coins, None);
        assert!(report.path.is_empty());
        assert_eq!(report.score, 0);
        assert_eq!(report.error.as_deref(), Some(DEPTH_EXCEEDED));
    }

    #[test]
    fn test_drain_counts_expansions() {
        let map = Map::open(1, 4);
        let coins = Coins::new();
        let ctx = SearchContext::new(&map, Node::new(0, 0), Node::new(0, 3), &coins);
        let mut search = Registry::with_defaults().create("astar", ctx).unwrap();
        let (report, stats) = drain_with_stats(search.as_mut(), &coins, None);
        assert_eq!(report.length, 4);
        // Three progress steps, then the goal pop finishes.
        assert_eq!(stats.expanded, 3);
        assert_eq!(stats.resumptions, 4);
        assert_eq!(stats.visited, 4);
        assert_eq!(stats.path_length, 4);
    }

    #[test]
    fn test_round_cap_stops_the_drain() {
        let map = Map::open(6, 6);
        let coins = Coins::new();
        let ctx = SearchContext::new(&map, Node::new(0, 0), Node::new(5, 5), &coins);
        let mut search = Registry::with_defaults().create("dijkstra", ctx).unwrap();
        let report = drain(search.as_mut(), &coins, Some(3));
        assert!(report.path.is_empty());
        assert!(report.error.is_some());
    }

    #[test]
    fn test_request_to_report_json() {
        let request = SearchRequest::from_json_str(
            r#"{"grid": [[0, 0, 0], [1, 1, 0], [0, 0, 0]], "start": [0, 0], "goal": [2, 0], "coins": [[1, 2]]}"#,
        )
        .unwrap();
        let problem = request.into_problem().unwrap();
        let mut search = Registry::with_defaults()
            .create("bfs", problem.context())
            .unwrap();
        let report = drain(search.as_mut(), &problem.coins, None);
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();

        assert_eq!(json["length"], 7);
        assert_eq!(json["coins_collected"], 1);
        assert_eq!(json["score"], 993);
        assert_eq!(json["cost"], -993);
        assert_eq!(json["path"][0], serde_json::json!([0, 0]));
        assert_eq!(json["visited"][0], serde_json::json!([0, 0, -1]));
        assert!(json.get("error").is_none());
    }
}
