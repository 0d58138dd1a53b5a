use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::engine::state::{RunOutcome, RunStats};
use crate::errors::PainterResult;

/// One line of the run journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub session_id: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
    pub image: String,
    pub dry_run: bool,
    /// RGB of the background colour left to the user, if any.
    pub skipped_background: Option<[u8; 3]>,
    pub outcome: Option<RunOutcome>,
    pub stats: RunStats,
    pub error: Option<String>,
}

/// Append-only JSONL log of past runs.
pub struct RunJournal {
    pub session_id: String,
    started_at: chrono::DateTime<chrono::Utc>,
    file_path: PathBuf,
}

impl RunJournal {
    /// Opens the journal under `dir`, or the user data directory.
    pub fn new(dir: Option<&Path>) -> Self {
        let dir = dir.map(Path::to_path_buf).unwrap_or_else(data_dir_or_cwd);
        let _ = std::fs::create_dir_all(&dir);
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            started_at: chrono::Utc::now(),
            file_path: dir.join("journal.jsonl"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn started_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.started_at
    }

    pub fn append(&self, entry: &JournalEntry) -> PainterResult<()> {
        let line = serde_json::to_string(entry)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;
        writeln!(file, "{}", line)?;
        tracing::debug!(path = %self.file_path.display(), "journal entry written");
        Ok(())
    }

    pub fn read_all(&self) -> PainterResult<Vec<JournalEntry>> {
        let content = match std::fs::read_to_string(&self.file_path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(Into::into))
            .collect()
    }
}

/// `<data_local_dir>/pixelbrush/runs`, falling back to the working directory.
fn data_dir_or_cwd() -> PathBuf {
    if let Some(base) = dirs::data_local_dir() {
        return base.join("pixelbrush").join("runs");
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(journal: &RunJournal, outcome: RunOutcome) -> JournalEntry {
        JournalEntry {
            session_id: journal.session_id.clone(),
            started_at: journal.started_at(),
            finished_at: chrono::Utc::now(),
            image: "cat.png".into(),
            dry_run: false,
            skipped_background: Some([255, 255, 255]),
            outcome: Some(outcome),
            stats: RunStats {
                groups: 3,
                pixels_planned: 40,
                pixels_drawn: 40,
                nav_clicks: 5,
                pauses: 0,
            },
            error: None,
        }
    }

    #[test]
    fn entries_append_as_lines() {
        let dir = tempfile::tempdir().unwrap();
        let journal = RunJournal::new(Some(dir.path()));
        assert!(journal.read_all().unwrap().is_empty());

        journal.append(&entry(&journal, RunOutcome::Completed)).unwrap();
        journal.append(&entry(&journal, RunOutcome::Stopped)).unwrap();

        let all = journal.read_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].outcome, Some(RunOutcome::Stopped));
        assert_eq!(all[0].session_id, journal.session_id);
        assert_eq!(all[0].stats.pixels_drawn, 40);
    }
}
