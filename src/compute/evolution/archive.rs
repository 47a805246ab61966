//! Archive of novel feasible candidates, and its JSON export.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{Candidate, SearchError};

/// Append-only record of novel feasible candidates.
///
/// Entries are never removed or reordered, so the archive only grows over a run.
#[derive(Debug)]
pub struct NovelArchive<S> {
    entries: Vec<Candidate<S>>,
}

impl<S> Default for NovelArchive<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

/// On-disk form of one archived candidate.
#[derive(Debug, Serialize)]
pub struct ArchivedExport<'a, S> {
    /// Position in the archive.
    pub index: usize,
    /// Candidate id.
    pub id: u64,
    /// Generation the candidate was created in.
    pub generation: usize,
    /// Novelty when it was archived.
    pub novelty: f64,
    /// Parent IDs.
    pub parents: &'a [u64],
    /// The archived solution.
    pub solution: &'a S,
}

impl<S> NovelArchive<S> {
    /// Create an empty archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a candidate.
    pub fn push(&mut self, candidate: Candidate<S>) {
        self.entries.push(candidate);
    }

    /// Number of archived candidates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get an entry by position.
    pub fn get(&self, index: usize) -> Option<&Candidate<S>> {
        self.entries.get(index)
    }

    /// All entries in archival order.
    pub fn iter(&self) -> std::slice::Iter<'_, Candidate<S>> {
        self.entries.iter()
    }

    /// The most recently archived `n` entries.
    pub fn latest(&self, n: usize) -> &[Candidate<S>] {
        &self.entries[self.entries.len().saturating_sub(n)..]
    }
}

impl<S> Extend<Candidate<S>> for NovelArchive<S> {
    fn extend<I: IntoIterator<Item = Candidate<S>>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl<'a, S> IntoIterator for &'a NovelArchive<S> {
    type Item = &'a Candidate<S>;
    type IntoIter = std::slice::Iter<'a, Candidate<S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<S: Serialize> NovelArchive<S> {
    /// Write every entry to `dir` as pretty-printed JSON.
    ///
    /// Returns the written paths in archival order.
    pub fn save_to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>, SearchError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let mut paths = Vec::with_capacity(self.entries.len());
        for (index, candidate) in self.entries.iter().enumerate() {
            let export = ArchivedExport {
                index,
                id: candidate.id,
                generation: candidate.generation,
                novelty: candidate.novelty,
                parents: &candidate.parents,
                solution: &candidate.solution,
            };

            let path = dir.join(format!("archived_{:04}_id{}.json", index, candidate.id));
            let json = serde_json::to_string_pretty(&export)?;
            fs::write(&path, json)?;
            paths.push(path);
        }

        log::info!("Exported {} archived candidates to {}", paths.len(), dir.display());
        Ok(paths)
    }
}

/// Read back the JSON files written by [`NovelArchive::save_to_dir`], in file name order.
pub fn load_exports<P: AsRef<Path>>(dir: P) -> Result<Vec<serde_json::Value>, SearchError> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension().is_some_and(|e| e == "json")
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("archived_"))
        })
        .collect();
    paths.sort();

    let mut exports = Vec::with_capacity(paths.len());
    for path in &paths {
        let text = fs::read_to_string(path)?;
        exports.push(serde_json::from_str(&text)?);
    }
    Ok(exports)
}
