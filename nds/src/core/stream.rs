//! Query stream sets and per-stream log naming.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::NdsError;

/// Ordered stream identifiers requested for a throughput run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSet {
    streams: Vec<PathBuf>,
}

impl StreamSet {
    /// Parse a comma-delimited list. Entries are trimmed and blanks dropped.
    pub fn parse(raw: &str) -> Self {
        let streams = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect();
        Self { streams }
    }

    /// Streams in input order.
    pub fn as_slice(&self) -> &[PathBuf] {
        &self.streams
    }

    /// Pair every stream with its log suffix, enforcing throughput preconditions.
    ///
    /// Fails when fewer than two streams are given or two streams would write
    /// to the same log files.
    pub fn plan(&self) -> Result<Vec<(PathBuf, String)>, NdsError> {
        if self.streams.len() < 2 {
            return Err(NdsError::Configuration(format!(
                "throughput run requires multiple query streams but {} provided; \
                 use a power run for one stream",
                self.streams.len()
            )));
        }

        let mut seen: BTreeMap<String, &Path> = BTreeMap::new();
        let mut planned = Vec::with_capacity(self.streams.len());
        for stream in &self.streams {
            let suffix = log_suffix(stream)?;
            if let Some(previous) = seen.insert(suffix.clone(), stream) {
                return Err(NdsError::Configuration(format!(
                    "streams {} and {} share the log suffix {suffix:?}",
                    previous.display(),
                    stream.display()
                )));
            }
            planned.push((stream.clone(), suffix));
        }
        Ok(planned)
    }
}

/// Basename of `stream` with its final extension stripped.
///
/// `./nds_query_streams/query_1.sql` becomes `query_1`.
pub fn log_suffix(stream: &Path) -> Result<String, NdsError> {
    stream
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| {
            NdsError::Configuration(format!(
                "query stream {} has no file name",
                stream.display()
            ))
        })
}

/// `base` with `_<suffix>` appended to its final component.
pub fn suffixed_log_path(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push("_");
    name.push(suffix);
    PathBuf::from(name)
}
