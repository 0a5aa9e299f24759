//! Append-only log of the best individual of each generation.
//!
//! Every generation appends one JSON line holding the generation index, the best
//! individual's name and score, and its full parameter vector. The log is best
//! effort: open and write failures are logged and the run goes on. After the first
//! failure the log stops writing.

use std::{
    fs::{File, OpenOptions},
    io::{self, BufRead as _, BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use neuroevo_nn::Network;
use serde::{Deserialize, Serialize};

use crate::observer::{GenerationObserver, GenerationReport};

/// One line of the checkpoint log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub generation: usize,
    pub name: String,
    pub score: f64,
    pub weights: Vec<f64>,
}

#[derive(Debug)]
pub struct CheckpointLog {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl CheckpointLog {
    /// Opens `path` for appending, creating it if needed.
    ///
    /// Failing to open the file is not an error; the log then stays inactive.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let writer = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => Some(BufWriter::new(file)),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "cannot open checkpoint log");
                None
            }
        };
        Self { path, writer }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether records are still being written.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.writer.is_some()
    }

    pub fn append(&mut self, record: &CheckpointRecord) {
        let Some(writer) = &mut self.writer else {
            return;
        };
        let result = serde_json::to_writer(&mut *writer, record)
            .map_err(io::Error::from)
            .and_then(|()| writeln!(writer))
            .and_then(|()| writer.flush());
        if let Err(error) = result {
            tracing::warn!(
                path = %self.path.display(),
                %error,
                "checkpoint write failed, disabling checkpoint log"
            );
            self.writer = None;
        }
    }

    /// Reads every record of a checkpoint log.
    pub fn read(path: impl AsRef<Path>) -> io::Result<Vec<CheckpointRecord>> {
        let reader = BufReader::new(File::open(path)?);
        reader
            .lines()
            .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
            .map(|line| Ok(serde_json::from_str(&line?)?))
            .collect()
    }
}

impl<N> GenerationObserver<N> for CheckpointLog
where
    N: Network,
{
    fn observe(&mut self, report: &GenerationReport<'_, N>) {
        if !self.is_active() {
            return;
        }
        let best = report.best();
        self.append(&CheckpointRecord {
            generation: report.generation,
            name: best.name().to_owned(),
            score: best.generation_score(),
            weights: best.weights().to_vec(),
        });
    }
}
