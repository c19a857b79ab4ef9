use anyhow::{anyhow, Result};
use std::collections::BTreeMap;

use super::{AStar, Backtracking, Bfs, Bidirectional, Dijkstra, Lrta, OnlineDfs, Search, SearchContext};

/// Builds a fresh search instance for one call.
pub type Factory = for<'a> fn(SearchContext<'a>) -> Box<dyn Search + 'a>;

/// Strategy identifier to constructor. Built once at start-up and handed to
/// whoever needs to instantiate strategies by name.
#[derive(Clone)]
pub struct Registry {
    factories: BTreeMap<&'static str, Factory>,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            factories: BTreeMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("astar", astar);
        registry.register("bfs", bfs);
        registry.register("lrta", lrta);
        registry.register("onlinedfs", online_dfs);
        registry.register("dijkstra", dijkstra);
        registry.register("binary", backtracking);
        registry.register("bidirectional", bidirectional);
        registry
    }

    pub fn register(&mut self, name: &'static str, factory: Factory) {
        self.factories.insert(name, factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    pub fn create<'a>(&self, name: &str, ctx: SearchContext<'a>) -> Result<Box<dyn Search + 'a>> {
        let factory = self.factories.get(name).ok_or_else(|| {
            anyhow!(
                "Invalid algorithm selection: {name:?} (expected one of {})",
                self.names().collect::<Vec<_>>().join(", ")
            )
        })?;
        Ok(factory(ctx))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn astar<'a>(ctx: SearchContext<'a>) -> Box<dyn Search + 'a> {
    Box::new(AStar::new(ctx))
}

fn dijkstra<'a>(ctx: SearchContext<'a>) -> Box<dyn Search + 'a> {
    Box::new(Dijkstra::new(ctx))
}

fn bfs<'a>(ctx: SearchContext<'a>) -> Box<dyn Search + 'a> {
    Box::new(Bfs::new(ctx))
}

fn lrta<'a>(ctx: SearchContext<'a>) -> Box<dyn Search + 'a> {
    Box::new(Lrta::new(ctx))
}

fn online_dfs<'a>(ctx: SearchContext<'a>) -> Box<dyn Search + 'a> {
    Box::new(OnlineDfs::new(ctx))
}

fn backtracking<'a>(ctx: SearchContext<'a>) -> Box<dyn Search + 'a> {
    Box::new(Backtracking::new(ctx))
}

fn bidirectional<'a>(ctx: SearchContext<'a>) -> Box<dyn Search + 'a> {
    Box::new(Bidirectional::new(ctx))
}
