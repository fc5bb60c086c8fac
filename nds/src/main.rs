//! NDS benchmark driver.
//!
//! Generates data and query streams with the TPC-DS toolchain, converts raw
//! data to columnar files, and runs query streams against the engine either
//! one at a time (`run power`) or concurrently (`run throughput`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use nds::convert::convert;
use nds::coordinator::{run_power, run_throughput};
use nds::core::flags::ConvertOptions;
use nds::core::stream::StreamSet;
use nds::core::types::RunConfig;
use nds::error::NdsError;
use nds::exit_codes;
use nds::generate::{
    DataGenRequest, QueryGenRequest, StorageType, generate_data, generate_query, generate_streams,
};
use nds::io::config::{DEFAULT_CONFIG_FILE, NdsConfig, load_config};
use nds::io::process::ensure_success;
use nds::io::submitter::EngineSubmitter;
use nds::io::template::load_template;
use nds::logging;
use tracing::info;

#[derive(Parser)]
#[command(name = "nds", version, about = "NDS benchmark data, query and run driver")]
struct Cli {
    /// Driver configuration file (toolchain and script locations).
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate raw data, queries or query streams.
    #[command(subcommand)]
    Generate(Generate),
    /// Convert raw CSV data to a columnar format through the engine.
    Convert(ConvertArgs),
    /// Execute query streams against the engine.
    #[command(subcommand)]
    Run(Run),
}

#[derive(Subcommand)]
enum Generate {
    /// Generate raw data with `dsdgen`.
    Data {
        /// File system to save the generated data to.
        #[arg(long = "type", value_enum)]
        storage: StorageType,
        #[arg(long)]
        data_dir: PathBuf,
        /// Volume of data to generate in GB.
        #[arg(long)]
        scale: u32,
        /// Generate data in this many parallel partitions.
        #[arg(long)]
        parallel: u32,
    },
    /// Generate the queries of one template with `dsqgen`.
    Query {
        #[arg(long)]
        template_dir: PathBuf,
        #[arg(long)]
        template: String,
        #[arg(long)]
        scale: u32,
        #[arg(long)]
        query_output_dir: PathBuf,
    },
    /// Generate query streams with `dsqgen`.
    Streams {
        #[arg(long)]
        template_dir: PathBuf,
        #[arg(long)]
        scale: u32,
        /// Number of streams to generate.
        #[arg(long)]
        streams: u32,
        #[arg(long)]
        query_output_dir: PathBuf,
    },
}

#[derive(Args)]
struct ConvertArgs {
    /// TOML submission template for the engine.
    #[arg(long)]
    spark_submit_template: PathBuf,
    /// Text to prepend to every input file path.
    #[arg(long, default_value = "")]
    input_prefix: String,
    /// Text to append to every input file name (e.g. ".dat").
    #[arg(long, default_value = "")]
    input_suffix: String,
    /// Text to prepend to every output file.
    #[arg(long, default_value = "")]
    output_prefix: String,
    /// Location in which to store a performance report.
    #[arg(long, default_value = "report.txt")]
    report_file: PathBuf,
    /// Engine log level: OFF, ERROR, WARN, INFO, DEBUG, ALL.
    #[arg(long, default_value = "OFF")]
    log_level: String,
    /// Store decimals as doubles.
    #[arg(long)]
    non_decimal: bool,
}

#[derive(Subcommand)]
enum Run {
    /// Run one query stream.
    Power(RunArgs),
    /// Run several comma-separated query streams concurrently.
    Throughput(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// TOML submission template for the engine.
    #[arg(long)]
    spark_submit_template: PathBuf,
    #[arg(long, default_value = "")]
    input_prefix: String,
    #[arg(long)]
    output_prefix: Option<String>,
    /// Format of query output, e.g. csv, parquet, orc.
    #[arg(long)]
    output_format: Option<String>,
    /// Query stream file, or a comma-separated list for a throughput run.
    #[arg(long)]
    query_stream: String,
    /// File to save run logs; throughput runs append `_<stream>`.
    #[arg(long)]
    run_log: PathBuf,
    /// CSV file to save query execution times; throughput runs append `_<stream>`.
    #[arg(long)]
    time_log: PathBuf,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::for_error(&err));
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    match cli.command {
        Command::Generate(generate) => cmd_generate(&config, generate),
        Command::Convert(args) => cmd_convert(&config, args),
        Command::Run(Run::Power(args)) => cmd_power(&config, args),
        Command::Run(Run::Throughput(args)) => cmd_throughput(&config, args),
    }
}

fn cmd_generate(config: &NdsConfig, generate: Generate) -> Result<()> {
    match generate {
        Generate::Data {
            storage,
            data_dir,
            scale,
            parallel,
        } => generate_data(
            config,
            &DataGenRequest {
                storage,
                data_dir,
                scale,
                parallel,
            },
        ),
        Generate::Query {
            template_dir,
            template,
            scale,
            query_output_dir,
        } => generate_query(
            config,
            &query_request(template_dir, scale, query_output_dir)?,
            &template,
        ),
        Generate::Streams {
            template_dir,
            scale,
            streams,
            query_output_dir,
        } => generate_streams(
            config,
            &query_request(template_dir, scale, query_output_dir)?,
            streams,
        ),
    }
}

fn query_request(template_dir: PathBuf, scale: u32, output_dir: PathBuf) -> Result<QueryGenRequest> {
    Ok(QueryGenRequest {
        workdir: std::env::current_dir().context("resolve current directory")?,
        template_dir,
        scale,
        output_dir,
    })
}

fn cmd_convert(config: &NdsConfig, args: ConvertArgs) -> Result<()> {
    let template = load_template(&args.spark_submit_template)?;
    let options = ConvertOptions {
        input_prefix: args.input_prefix,
        input_suffix: args.input_suffix,
        output_prefix: args.output_prefix,
        report_file: args.report_file,
        log_level: args.log_level,
        non_decimal: args.non_decimal,
    };
    convert(config, &template, &options)
}

fn run_config(args: RunArgs) -> Result<(RunConfig, String)> {
    let template = load_template(&args.spark_submit_template)?;
    let config = RunConfig {
        template,
        input_prefix: args.input_prefix,
        output_prefix: args.output_prefix,
        output_format: args.output_format,
        query_stream: PathBuf::from(&args.query_stream),
        run_log: args.run_log,
        time_log: args.time_log,
    };
    Ok((config, args.query_stream))
}

fn cmd_power(config: &NdsConfig, args: RunArgs) -> Result<()> {
    let (run, _) = run_config(args)?;
    let submitter = EngineSubmitter::new(&config.power_script);
    let exit = run_power(&submitter, &run)?;
    ensure_success(format!("power run of {}", run.query_stream.display()), exit)
}

fn cmd_throughput(config: &NdsConfig, args: RunArgs) -> Result<()> {
    let (base, raw_streams) = run_config(args)?;
    let streams = StreamSet::parse(&raw_streams);
    let submitter = EngineSubmitter::new(&config.power_script);
    let outcome = run_throughput(&submitter, &streams, &base)?;
    for result in &outcome.results {
        info!(
            stream = %result.stream.display(),
            state = ?result.state(),
            run_log = %result.run_log.display(),
            time_log = %result.time_log.display(),
            "stream finished"
        );
    }
    if !outcome.is_success() {
        return Err(NdsError::StreamsFailed(outcome.failed_streams()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_throughput_run() {
        let cli = Cli::parse_from([
            "nds",
            "run",
            "throughput",
            "--spark-submit-template",
            "spark.toml",
            "--query-stream",
            "a.sql,b.sql",
            "--run-log",
            "R",
            "--time-log",
            "T",
        ]);
        match cli.command {
            Command::Run(Run::Throughput(args)) => {
                assert_eq!(args.query_stream, "a.sql,b.sql");
                assert_eq!(args.input_prefix, "");
                assert!(args.output_format.is_none());
            }
            _ => panic!("expected throughput run"),
        }
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn parse_generate_data() {
        let cli = Cli::parse_from([
            "nds", "generate", "data", "--type", "hdfs", "--data-dir", "/d", "--scale", "100",
            "--parallel", "8",
        ]);
        assert!(matches!(
            cli.command,
            Command::Generate(Generate::Data {
                storage: StorageType::Hdfs,
                parallel: 8,
                ..
            })
        ));
    }

    #[test]
    fn parse_convert_defaults() {
        let cli = Cli::parse_from(["nds", "convert", "--spark-submit-template", "t.toml"]);
        match cli.command {
            Command::Convert(args) => {
                assert_eq!(args.report_file, PathBuf::from("report.txt"));
                assert_eq!(args.log_level, "OFF");
                assert!(!args.non_decimal);
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn run_requires_time_log() {
        let parsed = Cli::try_parse_from([
            "nds",
            "run",
            "power",
            "--spark-submit-template",
            "t.toml",
            "--query-stream",
            "a.sql",
            "--run-log",
            "R",
        ]);
        assert!(parsed.is_err());
    }
}
