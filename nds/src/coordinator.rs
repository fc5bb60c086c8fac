//! Power and throughput run coordination.
//!
//! A power run submits one stream and blocks on it. A throughput run launches
//! one OS thread per stream, each blocking on its own engine process, then
//! joins all of them. Siblings are never cancelled: every stream runs to
//! completion and the aggregate outcome reports every failure.

use std::thread;

use anyhow::{Result, anyhow};
use tracing::{debug, error, info, instrument, warn};

use crate::core::outcome::{RunOutcome, StreamResult};
use crate::core::stream::{StreamSet, suffixed_log_path};
use crate::core::types::{JobExit, JobState, RunConfig};
use crate::io::submitter::Submitter;

/// Run a single stream synchronously and return its exit status.
#[instrument(skip_all, fields(stream = %config.query_stream.display()))]
pub fn run_power<S: Submitter>(submitter: &S, config: &RunConfig) -> Result<JobExit> {
    info!("power run started");
    submitter.on_launch(config);
    let exit = submitter.submit(config)?;
    info!(exit_code = ?exit.code, "power run finished");
    Ok(exit)
}

/// Per-stream configs for a throughput run, in stream order.
///
/// Each config shares `base`'s template, prefixes and format, with its own
/// stream and `<base log>_<suffix>` log paths.
pub fn plan_throughput(streams: &StreamSet, base: &RunConfig) -> Result<Vec<RunConfig>> {
    let planned = streams.plan()?;
    Ok(planned
        .into_iter()
        .map(|(stream, suffix)| {
            base.for_stream(
                stream,
                suffixed_log_path(&base.run_log, &suffix),
                suffixed_log_path(&base.time_log, &suffix),
            )
        })
        .collect())
}

/// Run every stream concurrently and wait for all of them.
///
/// Fails before launching anything when the stream set is invalid. Otherwise
/// returns `Ok` with the aggregate outcome, even when streams failed.
#[instrument(skip_all, fields(streams = streams.as_slice().len()))]
pub fn run_throughput<S: Submitter + Sync>(
    submitter: &S,
    streams: &StreamSet,
    base: &RunConfig,
) -> Result<RunOutcome> {
    let jobs = plan_throughput(streams, base)?;
    for job in &jobs {
        debug!(stream = %job.query_stream.display(), state = ?JobState::Pending, "stream planned");
    }

    let results = thread::scope(|scope| {
        let handles: Vec<_> = jobs
            .iter()
            .map(|job| {
                debug!(stream = %job.query_stream.display(), state = ?JobState::Running, "launching stream");
                submitter.on_launch(job);
                let handle = thread::Builder::new()
                    .name(thread_name(job))
                    .spawn_scoped(scope, move || submitter.submit(job));
                (job, handle)
            })
            .collect();
        info!(launched = handles.len(), "all streams launched");

        handles
            .into_iter()
            .map(|(job, handle)| {
                let exit = match handle {
                    Ok(handle) => flatten(handle.join()),
                    Err(e) => Err(anyhow!(e).context("spawn stream thread")),
                };
                observe(job, exit)
            })
            .collect::<Vec<_>>()
    });

    let outcome = RunOutcome { results };
    if outcome.is_success() {
        info!("throughput run succeeded");
    } else {
        error!(failed = ?outcome.failed_streams(), "throughput run failed");
    }
    Ok(outcome)
}

fn flatten(joined: thread::Result<Result<JobExit>>) -> Result<JobExit> {
    joined.unwrap_or_else(|_| Err(anyhow!("stream thread panicked")))
}

fn observe(job: &RunConfig, exit: Result<JobExit>) -> StreamResult {
    let result = StreamResult {
        stream: job.query_stream.clone(),
        run_log: job.run_log.clone(),
        time_log: job.time_log.clone(),
        exit: exit.map_err(|e| format!("{e:#}")),
    };
    match (&result.exit, result.state()) {
        (Ok(exit), JobState::Succeeded) => {
            debug!(stream = %job.query_stream.display(), exit_code = ?exit.code, "stream succeeded");
        }
        (Ok(exit), _) => {
            warn!(stream = %job.query_stream.display(), exit_code = ?exit.code, "stream failed");
        }
        (Err(reason), _) => {
            warn!(stream = %job.query_stream.display(), %reason, "stream could not run");
        }
    }
    result
}

fn thread_name(job: &RunConfig) -> String {
    let name = job
        .query_stream
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("stream-{name}")
}
