//! Run I/O collaborators.

use lockstep_protocol::{IoError, RunIo};
use parking_lot::Mutex;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Name of the result file written into the output directory.
const RESULT_FILE: &str = "result.txt";

/// Directory-based run I/O.
///
/// Reads every regular file in the input directory as whitespace-separated
/// numeric samples (files are visited in path order, so the sample vector
/// is deterministic) and writes the global result into a single file in
/// the output directory.
#[derive(Debug, Clone)]
pub struct DirIo {
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl DirIo {
    /// Create run I/O over the given directories.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
        }
    }
}

impl RunIo for DirIo {
    fn read_input(&self) -> Result<Vec<f64>, IoError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.input_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort();

        let mut samples = Vec::new();
        for path in &paths {
            let text = fs::read_to_string(path)?;
            for token in text.split_whitespace() {
                let sample: f64 = token.parse().map_err(|_| {
                    IoError::MalformedInput(format!(
                        "{}: not a number: {token:?}",
                        path.display()
                    ))
                })?;
                samples.push(sample);
            }
        }
        debug!(
            files = paths.len(),
            samples = samples.len(),
            "Input directory read"
        );
        Ok(samples)
    }

    fn write_results(&self, result: f64) -> Result<(), IoError> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(RESULT_FILE);
        fs::write(&path, format!("{result}\n"))?;
        info!(path = %path.display(), result, "Result written");
        Ok(())
    }
}

/// In-memory run I/O for tests and the in-process harness.
///
/// Serves a fixed sample vector and records the written result instead of
/// touching the filesystem.
#[derive(Debug, Default)]
pub struct MemoryIo {
    samples: Vec<f64>,
    written: Mutex<Option<f64>>,
}

impl MemoryIo {
    /// Create run I/O serving the given samples.
    pub fn new(samples: Vec<f64>) -> Self {
        Self {
            samples,
            written: Mutex::new(None),
        }
    }

    /// The result recorded by `write_results`, if any.
    pub fn written(&self) -> Option<f64> {
        *self.written.lock()
    }
}

impl RunIo for MemoryIo {
    fn read_input(&self) -> Result<Vec<f64>, IoError> {
        Ok(self.samples.clone())
    }

    fn write_results(&self, result: f64) -> Result<(), IoError> {
        *self.written.lock() = Some(result);
        Ok(())
    }
}
