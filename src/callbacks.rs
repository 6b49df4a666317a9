//! Implementation of different callback functions.
//!
//! Every solver hands the checkpoints of all its calls to `integrate` to a callback after each
//! successful call. Callbacks are the only place where this crate produces output.
use crate::core::estimators::Estimators;
use crate::core::{combine_estimators, Checkpoint};
use num_traits::{Float, FromPrimitive};
use serde::Serialize;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Trait for implementing callbacks for MC algorithms
pub trait Callback<T, S> {
    /// This method is called after each successfully finished call to `integrate` and may print
    /// information about it.
    fn print(&self, chkpts: &[Checkpoint<T, S>]);
}

/// A callback function that does nothing
pub struct SinkCallback {}

impl<T, S> Callback<T, S> for SinkCallback {
    fn print(&self, _: &[Checkpoint<T, S>]) {}
}

/// A callback function that prints the result of each individual call
pub struct SimpleCallback {}

impl<T, S> Callback<T, S> for SimpleCallback
where
    T: Display + Float + FromPrimitive,
{
    fn print(&self, chkpts: &[Checkpoint<T, S>]) {
        // Make sure that there is at least one checkpoint
        // otherwise do nothing.
        if let Some(chkpt) = chkpts.last() {
            let estimate = chkpt.estimate();
            println!("integration {} finished.", chkpts.len() - 1);
            println!("this integration: N={} E={}", estimate.calls(), estimate);
        }
    }
}

/// Simple cumulative callback that shows the result of the individual call together with the
/// cumulative result combining it with the previous calls. The cumulative result is computed
/// the way the solver that produced the checkpoints computes its own estimates.
pub struct SimpleCumulativeCallback {}

impl<T, S> Callback<T, S> for SimpleCumulativeCallback
where
    T: Display + Float + FromPrimitive,
{
    fn print(&self, chkpts: &[Checkpoint<T, S>]) {
        let iteration = chkpts.len();

        if iteration == 0 {
            return;
        }

        let last = chkpts[iteration - 1].estimate();

        // Compute the cumulative result.
        let estimators = combine_estimators(chkpts);
        let cumulative = chkpts[iteration - 1].kind().estimate(&estimators);

        println!(
            "[integration {}: N={} E={}] [Cumulative: N={}, E={}]",
            iteration - 1,
            last.calls(),
            last,
            estimators.calls(),
            cumulative
        );
    }
}

/// A callback that writes all checkpoints as JSON into a file, replacing its previous content
/// after every call.
pub struct FileWriterCallback {
    path: PathBuf,
}

impl FileWriterCallback {
    /// Create a callback writing to `path`.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn write<T, S>(&self, chkpts: &[Checkpoint<T, S>]) -> crate::error::Result<()>
    where
        T: Serialize,
        S: Serialize,
    {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer(&mut writer, chkpts)?;
        writer.flush()?;
        Ok(())
    }
}

impl<T, S> Callback<T, S> for FileWriterCallback
where
    T: Serialize,
    S: Serialize,
{
    fn print(&self, chkpts: &[Checkpoint<T, S>]) {
        if let Err(err) = self.write(chkpts) {
            eprintln!(
                "unable to write checkpoints to '{}': {}",
                self.path.display(),
                err
            );
        }
    }
}
