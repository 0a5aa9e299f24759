use std::{
    fs::File,
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use neuroevo_training::evaluator::Dataset;

use crate::schema::{dataset::DatasetFile, trained_model::TrainedModel};

/// Destination of a JSON document: a file when a path is given, stdout otherwise.
#[derive(Debug)]
pub enum Output {
    Stdout(StdoutLock<'static>),
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    /// Writes `value` as pretty JSON to `path`, or to stdout when `path` is `None`.
    pub fn save_json<T>(value: &T, path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = match path {
            Some(path) => {
                let file = File::create(&path).with_context(|| {
                    format!("Failed to create output file: {}", path.display())
                })?;
                Output::File {
                    writer: BufWriter::new(file),
                    path,
                }
            }
            None => Output::Stdout(io::stdout().lock()),
        };
        output
            .write_json(value)
            .with_context(|| format!("Failed to write JSON to {}", output.destination()))
    }

    fn destination(&self) -> String {
        match self {
            Output::Stdout(_) => "stdout".to_owned(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    fn write_json<T>(&mut self, value: &T) -> io::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, value)?;
        writeln!(self)?;
        self.flush()
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout(writer) => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout(writer) => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Read a labeled dataset from a JSON file
///
/// # Errors
///
/// Returns error if file cannot be opened or parsed
pub fn read_dataset_file<P>(path: P) -> anyhow::Result<DatasetFile>
where
    P: AsRef<Path>,
{
    read_json_file("dataset", path)
}

/// Read a trained model from a JSON file
///
/// # Errors
///
/// Returns error if file cannot be opened or parsed
pub fn read_model_file<P>(path: P) -> anyhow::Result<TrainedModel>
where
    P: AsRef<Path>,
{
    read_json_file("model", path)
}

/// Load the dataset at `path`, or the XOR truth table when no path is given
///
/// # Errors
///
/// Returns error if the file cannot be read or the dataset is malformed
pub fn load_dataset(path: Option<&Path>) -> anyhow::Result<Dataset> {
    let Some(path) = path else {
        return Ok(Dataset::xor());
    };
    read_dataset_file(path)?
        .into_dataset()
        .with_context(|| format!("Invalid dataset: {}", path.display()))
}
