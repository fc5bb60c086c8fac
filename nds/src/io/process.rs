//! Helpers for running child processes and duplicating their output.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, info, instrument, warn};

use crate::core::flags::display_command;
use crate::core::types::JobExit;
use crate::error::NdsError;

type SharedLog = Arc<Mutex<BufWriter<File>>>;

/// Human-readable rendering of `cmd` for logs and error messages.
pub fn describe(cmd: &Command) -> String {
    let args: Vec<_> = cmd.get_args().map(|a| a.to_os_string()).collect();
    display_command(Path::new(cmd.get_program()), &args)
}

/// Run a command, teeing merged stdout/stderr to the console and `log_path`.
///
/// The log file is opened in append mode. Lines from the two pipes are written
/// as they arrive, so their relative order follows the child's writes only
/// approximately.
#[instrument(skip_all, fields(log = %log_path.display()))]
pub fn run_command_tee(mut cmd: Command, log_path: &Path) -> Result<JobExit> {
    let log = open_append(log_path)?;
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let command = describe(&cmd);
    info!(%command, "spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, %command, "failed to spawn command");
            return Err(e).with_context(|| format!("spawn `{command}`"));
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let log: SharedLog = Arc::new(Mutex::new(BufWriter::new(log)));
    let stdout_log = Arc::clone(&log);
    let stdout_handle = thread::spawn(move || tee_lines(stdout, stdout_log));
    let stderr_handle = thread::spawn(move || tee_lines(stderr, log));

    let status = child.wait().context("wait for command")?;
    join_tee(stdout_handle).context("join stdout")?;
    join_tee(stderr_handle).context("join stderr")?;

    let exit = JobExit::from(status);
    debug!(exit_code = ?exit.code, "command finished");
    Ok(exit)
}

/// Run a command with inherited stdio and return its exit status.
pub fn run_command(mut cmd: Command) -> Result<JobExit> {
    let command = describe(&cmd);
    info!(%command, "running command");
    let status = cmd
        .status()
        .with_context(|| format!("spawn `{command}`"))?;
    Ok(JobExit::from(status))
}

/// Run a command with inherited stdio; a non-zero exit becomes `ExternalToolFailure`.
pub fn run_checked(cmd: Command) -> Result<()> {
    let command = describe(&cmd);
    let status = run_command(cmd)?;
    ensure_success(command, status)
}

pub fn ensure_success(command: String, status: JobExit) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    warn!(%command, exit_code = ?status.code, "command failed");
    Err(NdsError::ExternalToolFailure { command, status }.into())
}

fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log dir {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log {}", path.display()))
}

/// Copy each line from `reader` to stdout and the shared log.
fn tee_lines<R: Read>(reader: R, log: SharedLog) -> Result<()> {
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line).context("read line")?;
        if n == 0 {
            break;
        }

        {
            let mut console = std::io::stdout().lock();
            if let Err(e) = console.write_all(&line).and_then(|()| console.flush()) {
                warn!(err = %e, "failed to echo child output");
            }
        }

        let mut writer = log
            .lock()
            .map_err(|_| anyhow!("run log lock poisoned"))?;
        writer.write_all(&line).context("write run log")?;
        writer.flush().context("flush run log")?;
    }
    Ok(())
}

fn join_tee(handle: thread::JoinHandle<Result<()>>) -> Result<()> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

/// Locate `program` on `PATH`.
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn tee_captures_stdout_and_stderr() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log = temp.path().join("logs/run.log");
        let exit = run_command_tee(sh("echo to-out; echo to-err >&2"), &log).expect("run");
        assert!(exit.success());
        let contents = fs::read_to_string(&log).expect("read log");
        assert!(contents.contains("to-out\n"));
        assert!(contents.contains("to-err\n"));
    }

    #[test]
    fn tee_returns_non_zero_without_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log = temp.path().join("run.log");
        let exit = run_command_tee(sh("echo partial; exit 3"), &log).expect("run");
        assert_eq!(exit.code, Some(3));
        assert_eq!(fs::read_to_string(&log).expect("read"), "partial\n");
    }

    #[test]
    fn tee_appends_to_existing_log() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log = temp.path().join("run.log");
        fs::write(&log, "previous\n").expect("seed");
        run_command_tee(sh("echo next"), &log).expect("run");
        assert_eq!(fs::read_to_string(&log).expect("read"), "previous\nnext\n");
    }

    #[test]
    fn tee_reports_spawn_failure() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cmd = Command::new(temp.path().join("missing-binary"));
        let err = run_command_tee(cmd, &temp.path().join("run.log")).unwrap_err();
        assert!(format!("{err:#}").contains("spawn"));
    }

    #[test]
    fn run_checked_surfaces_exit_status() {
        let err = run_checked(sh("exit 4")).unwrap_err();
        match err.downcast_ref::<NdsError>() {
            Some(NdsError::ExternalToolFailure { status, .. }) => {
                assert_eq!(status.code, Some(4));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn find_on_path_locates_sh() {
        assert!(find_on_path("sh").is_some());
        assert!(find_on_path("definitely-not-a-real-binary-nds").is_none());
    }
}
