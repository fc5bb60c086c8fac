//! Aggregation of per-stream results into a run outcome.

use std::path::PathBuf;

use crate::core::types::{JobExit, JobState};

/// Final observation of one stream job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamResult {
    pub stream: PathBuf,
    pub run_log: PathBuf,
    pub time_log: PathBuf,
    /// Exit status, or the reason the job could not produce one.
    pub exit: Result<JobExit, String>,
}

impl StreamResult {
    pub fn state(&self) -> JobState {
        match &self.exit {
            Ok(exit) if exit.success() => JobState::Succeeded,
            _ => JobState::Failed,
        }
    }
}

/// Aggregate result of a coordinated run, in launch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub results: Vec<StreamResult>,
}

impl RunOutcome {
    /// True only if every job exited zero.
    pub fn is_success(&self) -> bool {
        self.results
            .iter()
            .all(|r| r.state() == JobState::Succeeded)
    }

    /// Identities of every failed stream, in launch order.
    pub fn failed_streams(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| r.state() == JobState::Failed)
            .map(|r| r.stream.display().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(stream: &str, exit: Result<JobExit, String>) -> StreamResult {
        StreamResult {
            stream: PathBuf::from(stream),
            run_log: PathBuf::from(format!("R_{stream}")),
            time_log: PathBuf::from(format!("T_{stream}")),
            exit,
        }
    }

    #[test]
    fn all_zero_is_success() {
        let outcome = RunOutcome {
            results: vec![
                result("s1.sql", Ok(JobExit::from_code(0))),
                result("s2.sql", Ok(JobExit::from_code(0))),
            ],
        };
        assert!(outcome.is_success());
        assert!(outcome.failed_streams().is_empty());
    }

    #[test]
    fn any_failure_fails_the_run() {
        for failing in 0..3 {
            let results = (0..3)
                .map(|i| {
                    let code = if i == failing { 1 } else { 0 };
                    result(&format!("s{i}.sql"), Ok(JobExit::from_code(code)))
                })
                .collect();
            let outcome = RunOutcome { results };
            assert!(!outcome.is_success());
            assert_eq!(outcome.failed_streams(), vec![format!("s{failing}.sql")]);
        }
    }

    #[test]
    fn signal_and_spawn_errors_count_as_failures() {
        let outcome = RunOutcome {
            results: vec![
                result("a.sql", Ok(JobExit { code: None })),
                result("b.sql", Err("spawn failed".to_string())),
                result("c.sql", Ok(JobExit::from_code(0))),
            ],
        };
        assert_eq!(outcome.failed_streams(), vec!["a.sql", "b.sql"]);
        assert_eq!(outcome.results[2].state(), JobState::Succeeded);
    }
}
