//! Loading engine submission templates from disk.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::types::SubmitTemplate;

/// Read and validate a TOML submission template.
///
/// A relative `workdir` is resolved against the template's directory so a
/// template behaves the same regardless of where `nds` is invoked from.
pub fn load_template(path: &Path) -> Result<SubmitTemplate> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read template {}", path.display()))?;
    let mut template: SubmitTemplate =
        toml::from_str(&contents).with_context(|| format!("parse template {}", path.display()))?;
    template.validate()?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    template.workdir = template
        .workdir
        .take()
        .map(|dir| if dir.is_relative() { base.join(dir) } else { dir });
    Ok(template)
}
