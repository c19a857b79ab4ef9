use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::algorithm::{Registry, Search};
use crate::common::{Path, Problem, RaceRequest, Step, Visit};
use crate::map::Map;

/// One agent as seen at the end of a round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub path: Path,
    pub visited: Vec<Visit>,
    pub steps: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub agent1: AgentSnapshot,
    pub agent2: AgentSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Agent1,
    Agent2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceOutcome {
    pub states: Vec<RoundSnapshot>,
    pub winner: Winner,
    pub agent1_steps: usize,
    pub agent2_steps: usize,
}

struct Agent<'a> {
    search: Box<dyn Search + 'a>,
    snapshot: AgentSnapshot,
    done: bool,
}

impl<'a> Agent<'a> {
    fn new(search: Box<dyn Search + 'a>) -> Self {
        Agent {
            search,
            snapshot: AgentSnapshot::default(),
            done: false,
        }
    }

    /// Resume once unless already finished. A finished agent keeps its last
    /// trace and path on display.
    fn advance(&mut self) {
        if self.done {
            return;
        }
        let Some(step) = self.search.advance() else {
            self.done = true;
            return;
        };
        self.snapshot.steps += 1;
        self.snapshot.visited = step.visited().to_vec();
        match step {
            Step::Progress { .. } => {}
            Step::Finished { path, .. } => {
                self.snapshot.path = path;
                self.done = true;
            }
            Step::Aborted { reason, .. } => {
                warn!("agent aborted: {reason}");
                self.done = true;
            }
        }
    }
}

/// Advance two strategies in lock-step from their own starts towards the
/// shared goal, one resumption each per round.
///
/// Both strategy names are resolved before either search runs. The first
/// snapshot shows both agents before their first move.
#[instrument(skip_all, name = "race", fields(algo1 = %request.algo1, algo2 = %request.algo2), level = "debug")]
pub fn race(
    registry: &Registry,
    request: &RaceRequest,
    depth_limit: usize,
    max_rounds: Option<usize>,
) -> Result<RaceOutcome> {
    let (start1, start2) = request.start_pair()?;
    let map = Map::from_matrix(&request.grid)?;
    let problem = Problem::new(map, start1, request.goal, request.coins.clone())?;
    if !problem.map.contains(start2) {
        bail!("invalid input: start {start2:?} outside grid");
    }
    if !problem.map.is_valid(start2) {
        bail!("invalid input: start {start2:?} is a wall");
    }

    let ctx = problem.context().with_depth_limit(depth_limit);
    let mut agent1 = Agent::new(registry.create(&request.algo1, ctx)?);
    let mut agent2 = Agent::new(registry.create(&request.algo2, ctx.with_start(start2))?);

    let mut states = vec![RoundSnapshot::default()];
    while !(agent1.done && agent2.done) {
        if max_rounds.is_some_and(|limit| states.len() > limit) {
            warn!("race stopped after {limit:?} rounds", limit = max_rounds);
            break;
        }
        agent1.advance();
        agent2.advance();
        states.push(RoundSnapshot {
            agent1: agent1.snapshot.clone(),
            agent2: agent2.snapshot.clone(),
        });
    }

    let (agent1_steps, agent2_steps) = (agent1.snapshot.steps, agent2.snapshot.steps);
    let winner = if agent1_steps <= agent2_steps {
        Winner::Agent1
    } else {
        Winner::Agent2
    };
    debug!("{} snapshots recorded", states.len());
    info!("race won by {winner:?}: {agent1_steps} against {agent2_steps} steps");

    Ok(RaceOutcome {
        states,
        winner,
        agent1_steps,
        agent2_steps,
    })
}
