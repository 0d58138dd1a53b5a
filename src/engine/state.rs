/// How a run ended. A user stop is an outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Stopped,
}

/// Counters collected during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RunStats {
    pub groups: usize,
    pub pixels_planned: usize,
    /// Pixels the pointer visited; equals clicks unless dry-running.
    pub pixels_drawn: usize,
    pub nav_clicks: usize,
    pub pauses: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub stats: RunStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Draw,
    /// Moves and navigates exactly like a real run but never clicks a cell.
    DryRun,
}
