use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use clap::Args;
use eyre::Context;
use tessitura_executor::{available_threads, ResultStore, TaskError, WorkerPool};
use tessitura_pitch::extract_pitches;

use super::Command;
use crate::utils::write_csv;

/// Subcommand for batch pitch extraction over a directory.
#[derive(Debug, Args)]
pub struct Extract {
    /// The directory containing the audio files to analyze.
    input: PathBuf,

    /// The CSV file to write the aggregated results to.
    ///
    /// The file is overwritten on every run.
    #[clap(short, long, default_value = "pitches.csv")]
    output: PathBuf,

    /// The number of worker threads to analyze files with.
    ///
    /// Defaults to the `TESSITURA_WORKER_THREADS` environment
    /// variable, or the available parallelism of the system.
    #[clap(short, long)]
    jobs: Option<usize>,

    /// The file extension to select input files by.
    #[clap(short, long, default_value = "wav")]
    extension: String,

    /// Also descend into subdirectories of the input directory.
    #[clap(short, long)]
    recursive: bool,
}

impl Command for Extract {
    fn handle(self) -> eyre::Result<()> {
        let start = Instant::now();

        // Input enumeration failures are fatal and happen before
        // any pool is created.
        let inputs = discover_inputs(&self.input, &self.extension, self.recursive)?;
        log::info!(
            "found {} .{} file(s) in '{}'",
            inputs.len(),
            self.extension,
            self.input.display()
        );

        let workers = match self.jobs {
            Some(n) => n,
            None => available_threads()?,
        };

        let mut pool = WorkerPool::new(workers).context("failed to start worker pool")?;
        log::debug!("analyzing on {} worker thread(s)", pool.worker_count());

        let store = Arc::new(ResultStore::new());

        // One task per file; each successful task appends its rows
        // to the shared store before fulfilling its future.
        let mut pending = Vec::with_capacity(inputs.len());
        for path in inputs {
            let store = store.clone();
            let task_path = path.clone();

            let future = pool.submit(move || {
                let records = extract_pitches(&task_path).map_err(TaskError::failed)?;
                let count = records.len();
                store.extend(records);

                Ok(count)
            })?;

            pending.push((path, future));
        }

        // A failing file is recorded and reported; it never aborts
        // the processing of the remaining files.
        let mut failures = Vec::new();
        for (path, future) in pending {
            match future.wait() {
                Ok(count) => {
                    log::debug!("'{}' produced {} record(s)", path.display(), count);
                }
                Err(err) => {
                    log::warn!("failed to analyze '{}': {err}", path.display());
                    failures.push(path);
                }
            }
        }

        pool.shutdown();

        let store = Arc::into_inner(store)
            .ok_or_else(|| eyre::eyre!("result store still shared after pool shutdown"))?;
        let records = store.snapshot();

        write_csv(&self.output, &records)
            .with_context(|| format!("failed to write '{}'", self.output.display()))?;

        if !failures.is_empty() {
            log::warn!("{} file(s) failed to analyze:", failures.len());
            for path in &failures {
                log::warn!("  {}", path.display());
            }
        }

        log::info!(
            "wrote {} record(s) to '{}' ({} file(s) failed) in {:.2?}",
            records.len(),
            self.output.display(),
            failures.len(),
            start.elapsed()
        );

        Ok(())
    }
}

/// Enumerates the input files under `dir` carrying the given
/// extension, sorted by path for deterministic submission order.
fn discover_inputs(dir: &Path, extension: &str, recursive: bool) -> eyre::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        eyre::bail!("input directory '{}' not found", dir.display());
    }

    let max_depth = if recursive { usize::MAX } else { 1 };

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).max_depth(max_depth) {
        let entry = entry.context("failed to query input directory")?;
        if !entry.file_type().is_file() {
            continue;
        }

        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));

        if matches {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File};

    use super::*;

    #[test]
    fn discovery_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("b.wav")).unwrap();
        File::create(dir.path().join("a.WAV")).unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();

        let files = discover_inputs(dir.path(), "wav", false).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();

        assert_eq!(names, vec!["a.WAV", "b.wav"]);
    }

    #[test]
    fn discovery_is_flat_unless_recursive() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("top.wav")).unwrap();

        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        File::create(nested.join("deep.wav")).unwrap();

        let flat = discover_inputs(dir.path(), "wav", false).unwrap();
        assert_eq!(flat.len(), 1);

        let deep = discover_inputs(dir.path(), "wav", true).unwrap();
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        assert!(discover_inputs(&missing, "wav", false).is_err());
    }

    #[test]
    fn empty_directory_yields_no_inputs() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_inputs(dir.path(), "wav", true).unwrap().is_empty());
    }
}
