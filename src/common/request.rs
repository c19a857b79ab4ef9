use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;

use super::{Coins, Node};
use crate::algorithm::SearchContext;
use crate::map::Map;

/// A single-strategy request: occupancy matrix, endpoints and coins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub grid: Vec<Vec<i32>>,
    pub start: Node,
    pub goal: Node,
    #[serde(default)]
    pub coins: Vec<Node>,
}

impl SearchRequest {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("malformed search request")
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("cannot open request {path}"))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("malformed search request in {path}"))
    }

    pub fn into_problem(self) -> Result<Problem> {
        let map = Map::from_matrix(&self.grid)?;
        Problem::new(map, self.start, self.goal, self.coins)
    }
}

/// Two agents, one goal: the input of a competitive race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceRequest {
    pub grid: Vec<Vec<i32>>,
    pub starts: Vec<Node>,
    pub goal: Node,
    #[serde(default)]
    pub coins: Vec<Node>,
    #[serde(default)]
    pub algo1: String,
    #[serde(default)]
    pub algo2: String,
}

impl RaceRequest {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("cannot open request {path}"))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("malformed race request in {path}"))
    }

    /// The two starts, rejecting requests that do not name at least two.
    pub fn start_pair(&self) -> Result<(Node, Node)> {
        match self.starts.as_slice() {
            [first, second, ..] => Ok((*first, *second)),
            _ => Err(anyhow!(
                "Missing or invalid input data: a race needs two starts, got {}",
                self.starts.len()
            )),
        }
    }
}

/// Validated search input owned by the caller for the duration of a search.
#[derive(Debug, Clone)]
pub struct Problem {
    pub map: Map,
    pub start: Node,
    pub goal: Node,
    pub coins: Coins,
}

impl Problem {
    pub fn new(map: Map, start: Node, goal: Node, coins: Vec<Node>) -> Result<Self> {
        for (label, node) in [("start", start), ("goal", goal)] {
            if !map.contains(node) {
                bail!(
                    "invalid input: {label} {node:?} outside {}x{} grid",
                    map.height,
                    map.width
                );
            }
            if !map.is_valid(node) {
                bail!("invalid input: {label} {node:?} is a wall");
            }
        }
        if let Some(coin) = coins.iter().find(|coin| !map.contains(**coin)) {
            bail!("invalid input: coin {coin:?} outside grid");
        }
        Ok(Problem {
            map,
            start,
            goal,
            coins: coins.into_iter().collect(),
        })
    }

    pub fn context(&self) -> SearchContext<'_> {
        SearchContext::new(&self.map, self.start, self.goal, &self.coins)
    }
}
