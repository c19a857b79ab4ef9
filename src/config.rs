use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::algorithm::{Registry, DEFAULT_DEPTH_LIMIT};
use crate::common::Node;
use crate::maze::{DEFAULT_COLS, DEFAULT_ROWS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Run one strategy and report its best path and trace.
    #[default]
    Search,
    /// Run the coin-collecting planner.
    Plan,
    /// Race two strategies from two starts.
    Race,
    /// Generate a maze grid.
    Maze,
}

fn parse_node(value: &str) -> Result<Node, String> {
    let (row, col) = value
        .split_once(',')
        .ok_or_else(|| format!("expected ROW,COL, got {value:?}"))?;
    let row = row.trim().parse().map_err(|err| format!("bad row {row:?}: {err}"))?;
    let col = col.trim().parse().map_err(|err| format!("bad column {col:?}: {err}"))?;
    Ok(Node::new(row, col))
}

#[derive(Parser, Debug)]
#[command(
    name = "maze-search",
    about = "Grid search strategies, a coin-collecting planner and maze generators.",
    version = "0.1"
)]
pub struct Cli {
    #[arg(long, help = "Path to a YAML configuration file")]
    pub config: Option<String>,

    #[arg(long, value_enum, help = "What to run")]
    pub mode: Option<Mode>,

    #[arg(long, help = "Path to a JSON search or race request")]
    pub request_path: Option<String>,

    #[arg(long, help = "Path to a MovingAI map file, used instead of a request")]
    pub map_path: Option<String>,

    #[arg(long, value_parser = parse_node, help = "Start cell as ROW,COL")]
    pub start: Option<Node>,

    #[arg(long, value_parser = parse_node, help = "Goal cell as ROW,COL")]
    pub goal: Option<Node>,

    #[arg(long = "coin", value_parser = parse_node, help = "Coin cell as ROW,COL, repeatable")]
    pub coins: Vec<Node>,

    #[arg(long, help = "Path to the JSON output file, stdout when absent")]
    pub output_path: Option<String>,

    #[arg(long, help = "Strategy to run (astar, dijkstra, bfs, lrta, onlinedfs, binary, bidirectional)")]
    pub strategy: Option<String>,

    #[arg(long, help = "Second agent's strategy when the race request names none")]
    pub rival_strategy: Option<String>,

    #[arg(long, help = "Plan only inside the cells visited by --strategy")]
    pub restrict_to_visited: bool,

    #[arg(long, help = "Maze rows, rounded up to odd")]
    pub rows: Option<usize>,

    #[arg(long, help = "Maze columns, rounded up to odd")]
    pub cols: Option<usize>,

    #[arg(long, help = "Generate a left/right symmetric maze")]
    pub symmetric: bool,

    #[arg(long, help = "Seed for the random number generator")]
    pub seed: Option<u64>,

    #[arg(long, help = "Depth budget of the backtracking strategy")]
    pub depth_limit: Option<usize>,

    #[arg(long, help = "Cap on resumptions per drain or race")]
    pub max_rounds: Option<usize>,

    #[arg(long, help = "Log filter, e.g. info or maze_search=debug")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mode: Mode,
    pub request_path: Option<String>,
    pub map_path: Option<String>,
    pub start: Option<Node>,
    pub goal: Option<Node>,
    pub coins: Vec<Node>,
    pub output_path: Option<String>,
    pub strategy: String,
    pub rival_strategy: String,
    pub restrict_to_visited: bool,
    pub rows: usize,
    pub cols: usize,
    pub symmetric: bool,
    pub seed: u64,
    pub depth_limit: usize,
    pub max_rounds: Option<usize>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mode: Mode::Search,
            request_path: None,
            map_path: None,
            start: None,
            goal: None,
            coins: Vec::new(),
            output_path: None,
            strategy: "astar".to_string(),
            rival_strategy: "bfs".to_string(),
            restrict_to_visited: false,
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            symmetric: false,
            seed: 0,
            depth_limit: DEFAULT_DEPTH_LIMIT,
            max_rounds: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("malformed configuration")
    }

    pub fn load_from_file(path: &str) -> anyhow::Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file: {path}"))?;
        Self::from_yaml_str(&yaml).with_context(|| format!("error with config file: {path}"))
    }

    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(mode) = cli.mode {
            self.mode = mode;
        }
        if let Some(request_path) = &cli.request_path {
            self.request_path = Some(request_path.clone());
        }
        if let Some(map_path) = &cli.map_path {
            self.map_path = Some(map_path.clone());
        }
        if cli.start.is_some() {
            self.start = cli.start;
        }
        if cli.goal.is_some() {
            self.goal = cli.goal;
        }
        if !cli.coins.is_empty() {
            self.coins = cli.coins.clone();
        }
        if let Some(output_path) = &cli.output_path {
            self.output_path = Some(output_path.clone());
        }
        if let Some(strategy) = &cli.strategy {
            self.strategy = strategy.clone();
        }
        if let Some(rival_strategy) = &cli.rival_strategy {
            self.rival_strategy = rival_strategy.clone();
        }
        self.restrict_to_visited |= cli.restrict_to_visited;
        if let Some(rows) = cli.rows {
            self.rows = rows;
        }
        if let Some(cols) = cli.cols {
            self.cols = cols;
        }
        self.symmetric |= cli.symmetric;
        if let Some(seed) = cli.seed {
            self.seed = seed;
        }
        if let Some(depth_limit) = cli.depth_limit {
            self.depth_limit = depth_limit;
        }
        if cli.max_rounds.is_some() {
            self.max_rounds = cli.max_rounds;
        }
        if let Some(log_level) = &cli.log_level {
            self.log_level = log_level.clone();
        }
        Ok(self)
    }

    pub fn validate(&self, registry: &Registry) -> anyhow::Result<()> {
        if !registry.contains(&self.strategy) {
            bail!("Invalid algorithm selection: {:?}", self.strategy);
        }
        if self.mode == Mode::Race && !registry.contains(&self.rival_strategy) {
            bail!("Invalid algorithm selection: {:?}", self.rival_strategy);
        }
        if self.depth_limit == 0 {
            bail!("depth limit must be positive");
        }
        if self.max_rounds == Some(0) {
            bail!("max rounds must be positive when given");
        }
        EnvFilter::try_new(&self.log_level)
            .with_context(|| format!("invalid log level {:?}", self.log_level))?;

        match self.mode {
            Mode::Search | Mode::Plan => match (&self.request_path, &self.map_path) {
                (Some(_), Some(_)) => bail!("give either a request path or a map path, not both"),
                (None, None) => bail!("{:?} mode needs a request path or a map path", self.mode),
                (None, Some(_)) if self.start.is_none() || self.goal.is_none() => {
                    bail!("a map file needs --start and --goal")
                }
                _ => {}
            },
            Mode::Race if self.request_path.is_none() => bail!("race mode needs a request path"),
            Mode::Race | Mode::Maze => {}
        }
        if self.restrict_to_visited && self.mode != Mode::Plan {
            bail!("--restrict-to-visited only applies to plan mode");
        }
        Ok(())
    }
}
