//! Data, query and query-stream generation through the TPC-DS toolchain.
//!
//! Every external call receives an explicit working directory; the driver's
//! own current directory is never changed.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing::{info, instrument, warn};

use crate::core::layout::human_size;
use crate::core::types::JobExit;
use crate::error::NdsError;
use crate::io::config::NdsConfig;
use crate::io::layout::{directory_sizes, reorganize_partitions};
use crate::io::process::{describe, ensure_success, run_checked};
use crate::io::toolchain::{StagedIndex, check_build, require_on_path};

/// Where generated data is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageType {
    /// Parallel `dsdgen` children on this machine.
    Local,
    /// A MapReduce job submitted with `hadoop jar`.
    Hdfs,
}

#[derive(Debug, Clone)]
pub struct DataGenRequest {
    pub storage: StorageType,
    pub data_dir: PathBuf,
    /// Volume of data to generate in GB.
    pub scale: u32,
    /// Number of partitions, one generator child or map task each.
    pub parallel: u32,
}

#[derive(Debug, Clone)]
pub struct QueryGenRequest {
    /// Directory the index file is staged into and `dsqgen` runs from.
    pub workdir: PathBuf,
    pub template_dir: PathBuf,
    pub scale: u32,
    pub output_dir: PathBuf,
}

/// Generate raw data either locally or on HDFS.
#[instrument(skip_all, fields(storage = ?request.storage, scale = request.scale, parallel = request.parallel))]
pub fn generate_data(config: &NdsConfig, request: &DataGenRequest) -> Result<()> {
    if request.parallel == 0 {
        return Err(NdsError::Configuration("parallel must be at least 1".to_string()).into());
    }
    check_build(config)?;
    match request.storage {
        StorageType::Local => generate_local(config, request),
        StorageType::Hdfs => generate_hdfs(config, request),
    }
}

fn generate_hdfs(config: &NdsConfig, request: &DataGenRequest) -> Result<()> {
    let hadoop = require_on_path("hadoop")?;
    let jar = absolute(&config.gen_jar)?;
    let mut cmd = Command::new(hadoop);
    cmd.arg("jar")
        .arg(&jar)
        .arg("-d")
        .arg(&request.data_dir)
        .arg("-p")
        .arg(request.parallel.to_string())
        .arg("-s")
        .arg(request.scale.to_string())
        .current_dir(jar_project_dir(&jar));
    run_checked(cmd)
}

fn generate_local(config: &NdsConfig, request: &DataGenRequest) -> Result<()> {
    fs::create_dir_all(&request.data_dir)
        .with_context(|| format!("create data dir {}", request.data_dir.display()))?;
    let data_dir = absolute(&request.data_dir)?;
    let tools_dir = absolute(&config.tools_dir)?;
    let dsdgen = tools_dir.join("dsdgen");

    let mut children: Vec<(String, Child)> = Vec::with_capacity(request.parallel as usize);
    let mut spawn_error = None;
    for child in 1..=request.parallel {
        let mut cmd = Command::new(&dsdgen);
        cmd.args(dsdgen_args(request.scale, &data_dir, request.parallel, child))
            .current_dir(&tools_dir);
        let command = describe(&cmd);
        info!(%command, "spawning dsdgen");
        match cmd.spawn() {
            Ok(spawned) => children.push((command, spawned)),
            Err(e) => {
                spawn_error = Some(anyhow::Error::new(e).context(format!("spawn `{command}`")));
                break;
            }
        }
    }

    let mut failure = None;
    for (command, mut child) in children {
        let status = child
            .wait()
            .with_context(|| format!("wait for `{command}`"))?;
        let exit = JobExit::from(status);
        if !exit.success() {
            warn!(%command, exit_code = ?exit.code, "dsdgen failed");
            failure.get_or_insert((command, exit));
        }
    }
    if let Some(err) = spawn_error {
        return Err(err);
    }
    if let Some((command, exit)) = failure {
        return ensure_success(command, exit);
    }

    let moved = reorganize_partitions(&data_dir, &config.tables, request.parallel)?;
    info!(moved, data_dir = %data_dir.display(), "partitions organized by table");
    for (path, size) in directory_sizes(&data_dir)? {
        println!("{}\t{}", human_size(size), path);
    }
    Ok(())
}

fn dsdgen_args(scale: u32, data_dir: &Path, parallel: u32, child: u32) -> Vec<OsString> {
    vec![
        "-scale".into(),
        scale.to_string().into(),
        "-dir".into(),
        data_dir.into(),
        "-parallel".into(),
        parallel.to_string().into(),
        "-child".into(),
        child.to_string().into(),
        "-force".into(),
        "Y".into(),
        "-verbose".into(),
        "Y".into(),
    ]
}

/// Generate the queries of a single template.
#[instrument(skip_all, fields(template = %template))]
pub fn generate_query(config: &NdsConfig, request: &QueryGenRequest, template: &str) -> Result<()> {
    let mut args: Vec<OsString> = vec!["-template".into(), template.into()];
    args.extend(common_dsqgen_args(config, request));
    run_dsqgen(config, request, args)
}

/// Generate `streams` query streams from `templates.lst`.
#[instrument(skip_all, fields(streams = streams))]
pub fn generate_streams(config: &NdsConfig, request: &QueryGenRequest, streams: u32) -> Result<()> {
    if streams == 0 {
        return Err(NdsError::Configuration("streams must be at least 1".to_string()).into());
    }
    let mut args = common_dsqgen_args(config, request);
    args.push("-input".into());
    args.push(request.template_dir.join("templates.lst").into());
    args.push("-streams".into());
    args.push(streams.to_string().into());
    run_dsqgen(config, request, args)
}

fn common_dsqgen_args(config: &NdsConfig, request: &QueryGenRequest) -> Vec<OsString> {
    vec![
        "-scale".into(),
        request.scale.to_string().into(),
        "-directory".into(),
        request.template_dir.clone().into(),
        "-output_dir".into(),
        request.output_dir.clone().into(),
        "-dialect".into(),
        config.dialect.clone().into(),
    ]
}

fn run_dsqgen(config: &NdsConfig, request: &QueryGenRequest, args: Vec<OsString>) -> Result<()> {
    check_build(config)?;
    for required in [config.dsqgen(), config.index_path()] {
        if !required.exists() {
            return Err(NdsError::PrerequisiteMissing(format!(
                "{} not found; build tpcds-gen first",
                required.display()
            ))
            .into());
        }
    }
    let dsqgen = absolute(&config.dsqgen())?;
    let output_dir = request.workdir.join(&request.output_dir);
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("create query output dir {}", output_dir.display()))?;

    // dsqgen reads the index from its working directory.
    let _index = StagedIndex::stage(&config.index_path(), &request.workdir)?;
    let mut cmd = Command::new(dsqgen);
    cmd.args(args).current_dir(&request.workdir);
    run_checked(cmd)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).with_context(|| format!("resolve {}", path.display()))
}

/// `tpcds-gen` for `tpcds-gen/target/tpcds-gen.jar`.
fn jar_project_dir(jar: &Path) -> PathBuf {
    jar.parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
