//! Resumable work stacks and the `stop` sentinel file. Generalizes a
//! "skip N already-processed units" resume trick from read offsets to
//! arbitrary chunk descriptors: one manifest file whose records workers claim
//! and mark atomically via a write-to-temp-then-rename, instead of a sprawl
//! of `*_todo`/`*_wip`/`*_done` files.
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SearchResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkState {
    Todo,
    Wip,
    Done,
}

/// One unit of work: a `(query_block, target_block)` pair under a named phase
/// (e.g. `"search"` or `"cluster-round-2"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub phase: String,
    pub query_block: u32,
    pub target_block: u32,
    pub state: ChunkState,
}

/// The on-disk manifest: every chunk this run of the pipeline knows about,
/// persisted as a single file so a later invocation can resume by reading it
/// back instead of scanning directory listings for `*_todo` files.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Manifest {
    records: Vec<ChunkRecord>,
}

impl Manifest {
    pub fn new(records: Vec<ChunkRecord>) -> Self {
        Manifest { records }
    }

    pub fn load(path: &Path) -> SearchResult<Self> {
        let bytes = fs::read(path)?;
        let manifest = serde_json::from_slice(&bytes).map_err(|e| anyhow::anyhow!(e))?;
        Ok(manifest)
    }

    /// Writes the manifest to `path` atomically: the new contents land in a
    /// sibling `.tmp` file first, then an `fs::rename` swaps it into place so
    /// a reader never observes a half-written manifest.
    pub fn save(&self, path: &Path) -> SearchResult<()> {
        let tmp_path = path.with_extension("tmp");
        let bytes = serde_json::to_vec_pretty(self).map_err(|e| anyhow::anyhow!(e))?;
        fs::write(&tmp_path, bytes)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Claims the first `Todo` record for `phase`, flipping it to `Wip` and
    /// persisting the change, and returns its index. `None` once every
    /// record for that phase is `Wip` or `Done`.
    pub fn claim_next(&mut self, path: &Path, phase: &str) -> SearchResult<Option<usize>> {
        let idx = self
            .records
            .iter()
            .position(|r| r.phase == phase && r.state == ChunkState::Todo);
        if let Some(idx) = idx {
            self.records[idx].state = ChunkState::Wip;
            self.save(path)?;
        }
        Ok(idx)
    }

    pub fn mark_done(&mut self, path: &Path, idx: usize) -> SearchResult<()> {
        self.records[idx].state = ChunkState::Done;
        self.save(path)
    }

    pub fn record(&self, idx: usize) -> &ChunkRecord {
        &self.records[idx]
    }

    pub fn pending_count(&self, phase: &str) -> usize {
        self.records
            .iter()
            .filter(|r| r.phase == phase && r.state != ChunkState::Done)
            .count()
    }

    pub fn is_phase_complete(&self, phase: &str) -> bool {
        self.pending_count(phase) == 0
    }
}

/// Path of the `stop` sentinel file the driver polls between blocks: its
/// presence causes the driver to finish the current block and exit cleanly.
pub fn stop_sentinel_path(working_dir: &Path) -> PathBuf {
    working_dir.join("stop")
}

pub fn stop_requested(working_dir: &Path) -> bool {
    stop_sentinel_path(working_dir).exists()
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::tempdir;

    fn record(phase: &str, q: u32, t: u32, state: ChunkState) -> ChunkRecord {
        ChunkRecord {
            phase: phase.to_string(),
            query_block: q,
            target_block: t,
            state,
        }
    }

    #[test]
    fn claim_next_flips_todo_to_wip_and_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let mut manifest = Manifest::new(vec![
            record("search", 0, 0, ChunkState::Todo),
            record("search", 0, 1, ChunkState::Todo),
        ]);
        manifest.save(&path).unwrap();

        let idx = manifest.claim_next(&path, "search").unwrap().unwrap();
        assert_eq!(manifest.record(idx).state, ChunkState::Wip);

        let reloaded = Manifest::load(&path).unwrap();
        assert_eq!(reloaded.record(idx).state, ChunkState::Wip);
    }

    #[test]
    fn claim_next_skips_other_phases_and_done_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let mut manifest = Manifest::new(vec![
            record("search", 0, 0, ChunkState::Done),
            record("cluster", 1, 1, ChunkState::Todo),
        ]);
        manifest.save(&path).unwrap();
        assert!(manifest.claim_next(&path, "search").unwrap().is_none());
        assert_eq!(manifest.claim_next(&path, "cluster").unwrap(), Some(1));
    }

    #[test]
    fn phase_completion_tracks_done_records() {
        let mut manifest = Manifest::new(vec![
            record("search", 0, 0, ChunkState::Done),
            record("search", 0, 1, ChunkState::Wip),
        ]);
        assert!(!manifest.is_phase_complete("search"));
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        manifest.mark_done(&path, 1).unwrap();
        assert!(manifest.is_phase_complete("search"));
    }

    #[test]
    fn stop_sentinel_is_detected_once_created() {
        let dir = tempdir().unwrap();
        assert!(!stop_requested(dir.path()));
        fs::write(stop_sentinel_path(dir.path()), b"").unwrap();
        assert!(stop_requested(dir.path()));
    }
}
