//! Scalar telemetry for training progress.
//!
//! The agent receives its sink at construction instead of looking up a
//! process-wide writer. [`ScalarWriter`] keeps one CSV stream per process run
//! under a timestamped directory, in the spirit of a TensorBoard event log:
//!
//! ```text
//! <log_root>/run-20240101120000/scalars.csv
//! step,tag,value,wall_time
//! 3,flags_loss,0.0421,1
//! ```

use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use log::debug;

use crate::error::{BanditError, PathContext, Result};

const SCALARS_FILE: &str = "scalars.csv";

/// Destination for `(tag, value, step)` data points.
pub trait TelemetrySink {
    fn add_scalar(&mut self, tag: &str, value: f32, step: u64) -> Result<()>;

    fn flush(&mut self) -> Result<()>;
}

/// Discards every data point.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn add_scalar(&mut self, _tag: &str, _value: f32, _step: u64) -> Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Appends scalars to `scalars.csv` in a per-run directory.
pub struct ScalarWriter {
    log_dir: PathBuf,
    started: Instant,
    writer: BufWriter<File>,
}

impl ScalarWriter {
    /// Open a new run directory `run-<UTC timestamp>` under `log_root`.
    ///
    /// Runs started within the same second get a numeric suffix
    /// (`run-20240101120000-1`, ...), so an earlier stream is never reused.
    pub fn create<P: AsRef<Path>>(log_root: P) -> Result<Self> {
        let log_root = log_root.as_ref();
        let stamp = format!("run-{}", Utc::now().format("%Y%m%d%H%M%S"));
        let mut attempt = 0u32;
        loop {
            let run_name = match attempt {
                0 => stamp.clone(),
                n => format!("{}-{}", stamp, n),
            };
            match Self::create_run(log_root, &run_name) {
                Err(BanditError::IoError { source, .. }) if source.kind() == ErrorKind::AlreadyExists => {
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Open the stream of an explicitly named run.
    ///
    /// Fails with [`BanditError::IoError`] (kind `AlreadyExists`) if the run
    /// already has a stream; existing data is never truncated.
    pub fn create_run<P: AsRef<Path>>(log_root: P, run_name: &str) -> Result<Self> {
        let log_dir = log_root.as_ref().join(run_name);
        create_dir_all(&log_dir).at_path(&log_dir)?;

        let scalars_path = log_dir.join(SCALARS_FILE);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&scalars_path)
            .at_path(&scalars_path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "step,tag,value,wall_time").at_path(&scalars_path)?;
        debug!("telemetry stream opened at {}", log_dir.display());

        Ok(ScalarWriter {
            log_dir,
            started: Instant::now(),
            writer,
        })
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn scalars_path(&self) -> PathBuf {
        self.log_dir.join(SCALARS_FILE)
    }
}

impl TelemetrySink for ScalarWriter {
    fn add_scalar(&mut self, tag: &str, value: f32, step: u64) -> Result<()> {
        let wall_time = self.started.elapsed().as_secs();
        writeln!(self.writer, "{},{},{},{}", step, tag, value, wall_time)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for ScalarWriter {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}
