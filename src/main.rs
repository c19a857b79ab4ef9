use maze_search::algorithm::Registry;
use maze_search::common::{Problem, RaceRequest, SearchRequest};
use maze_search::config::{Cli, Config, Mode};
use maze_search::map::Map;
use maze_search::maze::MazeResponse;
use maze_search::planner::plan;
use maze_search::race::race;
use maze_search::report::drain;

use anyhow::{anyhow, Context};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn load_problem(config: &Config) -> anyhow::Result<Problem> {
    if let Some(request_path) = &config.request_path {
        return SearchRequest::load_from_file(request_path)?.into_problem();
    }
    let map_path = config
        .map_path
        .as_ref()
        .ok_or_else(|| anyhow!("no grid source configured"))?;
    let map = Map::from_file(map_path)?;
    let start = config.start.ok_or_else(|| anyhow!("missing --start"))?;
    let goal = config.goal.ok_or_else(|| anyhow!("missing --goal"))?;
    Problem::new(map, start, goal, config.coins.clone())
}

fn log_optimal_hops(problem: &Problem) {
    let distances = problem.map.distances_from(problem.goal);
    match distances[problem.start.row][problem.start.col] {
        usize::MAX => info!("goal {:?} is unreachable from {:?}", problem.goal, problem.start),
        hops => info!("shortest route takes {hops} hops"),
    }
}

fn write_output<T: Serialize>(output_path: Option<&str>, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output_path {
        Some(path) => std::fs::write(path, json).with_context(|| format!("cannot write output {path}")),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = if let Some(config_file) = cli.config.as_ref() {
        Config::load_from_file(config_file)?
    } else {
        Config::default()
    }
    .override_from_command_line(&cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();
    if cli.config.is_none() {
        info!("No config file specified, using default config");
    }

    let registry = Registry::with_defaults();
    config.validate(&registry)?;
    let output_path = config.output_path.as_deref();

    match config.mode {
        Mode::Search => {
            let problem = load_problem(&config)?;
            log_optimal_hops(&problem);
            let ctx = problem.context().with_depth_limit(config.depth_limit);
            let mut search = registry.create(&config.strategy, ctx)?;
            let report = drain(search.as_mut(), &problem.coins, config.max_rounds);
            if !report.path.is_empty() && !problem.map.verify_path(&report.path, problem.start, problem.goal) {
                error!("{} returned an invalid path", config.strategy);
            }
            write_output(output_path, &report)
        }
        Mode::Plan => {
            let problem = load_problem(&config)?;
            log_optimal_hops(&problem);
            let ctx = problem.context().with_depth_limit(config.depth_limit);
            let result = if config.restrict_to_visited {
                let mut search = registry.create(&config.strategy, ctx)?;
                let report = drain(search.as_mut(), &problem.coins, config.max_rounds);
                plan(ctx, Some(report.visited.as_slice()))
            } else {
                plan(ctx, None)
            };
            if !result.path.is_empty() && !problem.map.verify_path(&result.path, problem.start, problem.goal) {
                error!("planner returned an invalid path");
            }
            info!("plan value {} over {} cells", result.value, result.path.len());
            write_output(output_path, &result)
        }
        Mode::Race => {
            let request_path = config
                .request_path
                .as_ref()
                .ok_or_else(|| anyhow!("race mode needs a request path"))?;
            let mut request = RaceRequest::load_from_file(request_path)?;
            if request.algo1.is_empty() {
                request.algo1 = config.strategy.clone();
            }
            if request.algo2.is_empty() {
                request.algo2 = config.rival_strategy.clone();
            }
            let outcome = race(&registry, &request, config.depth_limit, config.max_rounds)?;
            write_output(output_path, &outcome)
        }
        Mode::Maze => {
            let mut rng = StdRng::seed_from_u64(config.seed);
            let maze = MazeResponse::generate(config.rows, config.cols, config.symmetric, &mut rng)?;
            info!("generated {}x{} maze", maze.rows, maze.cols);
            write_output(output_path, &maze)
        }
    }
}
