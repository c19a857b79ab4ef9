mod node;
mod request;
mod step;

pub use node::{Node, Path};
pub use request::{Problem, RaceRequest, SearchRequest};
pub use step::{visit_score, Coins, Step, Visit, COIN_SCORE, GOAL_SCORE, ORDINARY_SCORE};
pub(crate) use step::VisitLog;
