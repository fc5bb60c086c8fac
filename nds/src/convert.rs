//! CSV to columnar conversion submitted through the engine template.

use anyhow::Result;
use tracing::{info, instrument};

use crate::core::flags::ConvertOptions;
use crate::core::types::SubmitTemplate;
use crate::io::config::NdsConfig;
use crate::io::process::ensure_success;
use crate::io::submitter::submit_convert;

/// Convert the raw `|`-delimited data under `input_prefix` to columnar files.
///
/// Output is shown on the console; a non-zero engine exit is an `ExternalToolFailure`.
#[instrument(skip_all, fields(input = %options.input_prefix, output = %options.output_prefix))]
pub fn convert(config: &NdsConfig, template: &SubmitTemplate, options: &ConvertOptions) -> Result<()> {
    let (command, exit) = submit_convert(template, &config.convert_script, options)?;
    ensure_success(command, exit)?;
    info!(report = %options.report_file.display(), "conversion finished");
    Ok(())
}
