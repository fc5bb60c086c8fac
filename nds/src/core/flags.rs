//! Flags appended to the submission template for engine scripts.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::core::types::RunConfig;

/// Flags for one query-stream run, in the order the engine script expects.
pub fn run_flags(config: &RunConfig) -> Vec<OsString> {
    let mut flags = FlagList::default();
    flags.push("--input-prefix", &config.input_prefix);
    flags.push("--time-log", config.time_log.as_os_str());
    flags.push_non_empty("--output-prefix", config.output_prefix.as_deref());
    flags.push_non_empty("--output-format", config.output_format.as_deref());
    flags.push("--query-stream", config.query_stream.as_os_str());
    flags.into_inner()
}

/// Options for CSV to columnar conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    pub input_prefix: String,
    /// Appended to every input file name; omitted when empty.
    pub input_suffix: String,
    pub output_prefix: String,
    pub report_file: PathBuf,
    pub log_level: String,
    /// Store decimals as doubles.
    pub non_decimal: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            input_prefix: String::new(),
            input_suffix: String::new(),
            output_prefix: String::new(),
            report_file: PathBuf::from("report.txt"),
            log_level: "OFF".to_string(),
            non_decimal: false,
        }
    }
}

pub fn convert_flags(options: &ConvertOptions) -> Vec<OsString> {
    let mut flags = FlagList::default();
    flags.push("--input-prefix", &options.input_prefix);
    flags.push_non_empty("--input-suffix", Some(&options.input_suffix));
    flags.push("--output-prefix", &options.output_prefix);
    flags.push("--report-file", options.report_file.as_os_str());
    flags.push("--log-level", &options.log_level);
    if options.non_decimal {
        flags.switch("--non-decimal");
    }
    flags.into_inner()
}

#[derive(Default)]
struct FlagList(Vec<OsString>);

impl FlagList {
    fn push(&mut self, flag: &str, value: impl AsRef<std::ffi::OsStr>) {
        self.0.push(flag.into());
        self.0.push(value.as_ref().to_os_string());
    }

    fn push_non_empty(&mut self, flag: &str, value: Option<&str>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.push(flag, value);
        }
    }

    fn switch(&mut self, flag: &str) {
        self.0.push(flag.into());
    }

    fn into_inner(self) -> Vec<OsString> {
        self.0
    }
}

/// Render an argument list for humans. Not a shell-safe quoting.
pub fn display_command(program: &Path, args: &[OsString]) -> String {
    let mut out = program.display().to_string();
    for arg in args {
        out.push(' ');
        out.push_str(&arg.to_string_lossy());
    }
    out
}
