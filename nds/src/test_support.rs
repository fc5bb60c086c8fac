//! Test-only submitters that script stream outcomes without spawning engines.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};

use crate::core::types::{JobExit, RunConfig};
use crate::io::submitter::Submitter;

/// Upper bound on how long a gated stream waits for its siblings.
const GATE_TIMEOUT: Duration = Duration::from_secs(10);

/// Submitter returning scripted exit codes keyed by stream path.
///
/// Streams without an entry exit with `default_code`. Launches are recorded
/// through [`Submitter::on_launch`], so `launched()` is the coordinator's
/// spawn order. When `write_logs` is set, the run and time logs are created
/// the way an engine run would.
#[derive(Debug, Default)]
pub struct ScriptedSubmitter {
    default_code: i32,
    exits: BTreeMap<PathBuf, i32>,
    errors: BTreeSet<PathBuf>,
    delays: BTreeMap<PathBuf, Duration>,
    gates: BTreeMap<PathBuf, usize>,
    write_logs: bool,
    launched: Mutex<Vec<PathBuf>>,
    entered: Mutex<Vec<PathBuf>>,
    finished: Mutex<Vec<PathBuf>>,
    finished_changed: Condvar,
}

impl ScriptedSubmitter {
    /// Every stream exits 0.
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn with_exit(mut self, stream: impl Into<PathBuf>, code: i32) -> Self {
        self.exits.insert(stream.into(), code);
        self
    }

    /// Make `submit` return `Err` for `stream`, as if it failed to spawn.
    pub fn with_error(mut self, stream: impl Into<PathBuf>) -> Self {
        self.errors.insert(stream.into());
        self
    }

    pub fn with_delay(mut self, stream: impl Into<PathBuf>, delay: Duration) -> Self {
        self.delays.insert(stream.into(), delay);
        self
    }

    /// Hold `stream` until `count` other streams have finished.
    ///
    /// `submit` errors if that does not happen within a few seconds, which is
    /// what a coordinator that runs streams one after another would cause.
    pub fn finishing_after(mut self, stream: impl Into<PathBuf>, count: usize) -> Self {
        self.gates.insert(stream.into(), count);
        self
    }

    pub fn writing_logs(mut self) -> Self {
        self.write_logs = true;
        self
    }

    /// Streams in the order the coordinator launched them.
    pub fn launched(&self) -> Vec<PathBuf> {
        self.launched.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Streams in the order `submit` was entered.
    pub fn entered(&self) -> Vec<PathBuf> {
        self.entered.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Streams in the order `submit` returned.
    pub fn finished(&self) -> Vec<PathBuf> {
        self.finished.lock().map(|l| l.clone()).unwrap_or_default()
    }

    fn wait_for_finished(&self, stream: &Path, count: usize) -> Result<()> {
        let finished = self
            .finished
            .lock()
            .map_err(|_| anyhow!("finished lock poisoned"))?;
        let (finished, timeout) = self
            .finished_changed
            .wait_timeout_while(finished, GATE_TIMEOUT, |done| done.len() < count)
            .map_err(|_| anyhow!("finished lock poisoned"))?;
        if timeout.timed_out() {
            return Err(anyhow!(
                "{} waited for {count} streams but only {} finished",
                stream.display(),
                finished.len()
            ));
        }
        Ok(())
    }

    fn record_finished(&self, stream: PathBuf) -> Result<()> {
        self.finished
            .lock()
            .map_err(|_| anyhow!("finished lock poisoned"))?
            .push(stream);
        self.finished_changed.notify_all();
        Ok(())
    }
}

impl Submitter for ScriptedSubmitter {
    fn on_launch(&self, config: &RunConfig) {
        if let Ok(mut launched) = self.launched.lock() {
            launched.push(config.query_stream.clone());
        }
    }

    fn submit(&self, config: &RunConfig) -> Result<JobExit> {
        let stream = config.query_stream.clone();
        self.entered
            .lock()
            .map_err(|_| anyhow!("entered lock poisoned"))?
            .push(stream.clone());

        if let Some(delay) = self.delays.get(&stream) {
            std::thread::sleep(*delay);
        }
        let gated = match self.gates.get(&stream) {
            Some(count) => self.wait_for_finished(&stream, *count),
            None => Ok(()),
        };

        let result = if let Err(e) = gated {
            Err(e)
        } else if self.errors.contains(&stream) {
            Err(anyhow!("scripted submit error for {}", stream.display()))
        } else {
            if self.write_logs {
                fs::write(&config.run_log, format!("run {}\n", stream.display()))?;
                fs::write(&config.time_log, "query,time\n")?;
            }
            let code = self.exits.get(&stream).copied().unwrap_or(self.default_code);
            Ok(JobExit::from_code(code))
        };

        self.record_finished(stream)?;
        result
    }
}
