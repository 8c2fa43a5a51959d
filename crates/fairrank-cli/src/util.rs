use std::{
    fs::File,
    io::{self, BufReader, BufWriter, StdoutLock, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use fairrank_analysis::model::EvaluationBatch;
use serde::{Serialize, de::DeserializeOwned};

/// Destination of a JSON document: a file, or stdout when no path is given.
#[derive(Debug)]
pub enum Output {
    Stdout(StdoutLock<'static>),
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn create(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Output::Stdout(io::stdout().lock()));
        };
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path: path.to_owned(),
        })
    }

    pub fn describe(&self) -> String {
        match self {
            Output::Stdout(_) => "stdout".to_owned(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    /// Writes `value` as pretty-printed JSON followed by a newline.
    pub fn save_json<T>(value: &T, path: Option<&Path>) -> anyhow::Result<()>
    where
        T: Serialize,
    {
        let mut output = Output::create(path)?;
        serde_json::to_writer_pretty(&mut output, value)
            .with_context(|| format!("Failed to write JSON to {}", output.describe()))?;
        output
            .write_all(b"\n")
            .and_then(|()| output.flush())
            .with_context(|| format!("Failed to finish writing {}", output.describe()))?;
        tracing::info!(output = %output.describe(), "wrote JSON");
        Ok(())
    }
}

impl Write for Output {
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

pub fn read_json_file<T>(what: &str, path: &Path) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let file = File::open(path)
        .with_context(|| format!("Failed to open {what} file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {what} file: {}", path.display()))
}

pub fn read_batch_file(path: &Path) -> anyhow::Result<EvaluationBatch> {
    read_json_file("evaluation batch", path)
}

/// Writes `rows` as a CSV table whose header comes from the row's field names.
pub fn write_csv<T>(path: &Path, rows: &[T]) -> anyhow::Result<()>
where
    T: Serialize,
{
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write CSV row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush CSV file: {}", path.display()))?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "wrote CSV table");
    Ok(())
}
