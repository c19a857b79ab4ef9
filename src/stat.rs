use tracing::info;

#[derive(Debug, Clone, Default)]
pub(crate) struct Stats {
    pub(crate) resumptions: usize,
    pub(crate) expanded: usize,
    pub(crate) visited: usize,
    pub(crate) path_length: usize,
    pub(crate) time_us: usize,
}

impl Stats {
    pub(crate) fn print(&self, label: &str) {
        info!(
            "{label}: Path length {:?} Time(microseconds) {:?} Resumptions: {:?} Expanded: {:?} Visited records: {:?}",
            self.path_length, self.time_us, self.resumptions, self.expanded, self.visited
        );
    }
}
