//! Throughput coordination scenarios driven by scripted submitters.
//!
//! Jobs finish after randomized delays so completion order differs from
//! launch order; the aggregate outcome must not depend on it.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use nds::coordinator::run_throughput;
use nds::core::stream::StreamSet;
use nds::core::types::{JobState, RunConfig, SubmitTemplate};
use nds::error::NdsError;
use nds::test_support::ScriptedSubmitter;
use rand::Rng;

fn base(log_dir: &std::path::Path) -> RunConfig {
    RunConfig {
        template: SubmitTemplate::new("spark-submit"),
        input_prefix: "hdfs:///parquet/".to_string(),
        output_prefix: None,
        output_format: Some("parquet".to_string()),
        query_stream: PathBuf::new(),
        run_log: log_dir.join("R"),
        time_log: log_dir.join("T"),
    }
}

fn stream_names(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("streams/query_{i}.sql")).collect()
}

#[test]
fn randomized_delays_keep_aggregate_correct() {
    let mut rng = rand::thread_rng();
    for _ in 0..5 {
        let names = stream_names(rng.gen_range(2..=6));
        let failing = rng.gen_range(0..=names.len());
        let mut submitter = ScriptedSubmitter::succeeding();
        for (i, name) in names.iter().enumerate() {
            submitter = submitter.with_delay(name, Duration::from_millis(rng.gen_range(0..40)));
            if i == failing {
                submitter = submitter.with_exit(name, 2);
            }
        }

        let streams = StreamSet::parse(&names.join(","));
        let outcome = run_throughput(&submitter, &streams, &base(std::path::Path::new("logs")))
            .expect("run");

        let observed: Vec<String> = outcome
            .results
            .iter()
            .map(|r| r.stream.display().to_string())
            .collect();
        assert_eq!(observed, names, "results follow launch order");
        assert_eq!(outcome.is_success(), failing == names.len());
        if failing < names.len() {
            assert_eq!(outcome.failed_streams(), vec![names[failing].clone()]);
        }

        let expected: Vec<PathBuf> = names.iter().map(PathBuf::from).collect();
        assert_eq!(submitter.launched(), expected, "launches follow input order");
        let entered: BTreeSet<PathBuf> = submitter.entered().into_iter().collect();
        assert_eq!(entered, expected.into_iter().collect::<BTreeSet<_>>());
    }
}

#[test]
fn derived_logs_are_pairwise_distinct() {
    let names = stream_names(4);
    let submitter = ScriptedSubmitter::succeeding();
    let outcome = run_throughput(
        &submitter,
        &StreamSet::parse(&names.join(",")),
        &base(std::path::Path::new("logs")),
    )
    .expect("run");

    let run_logs: BTreeSet<&PathBuf> = outcome.results.iter().map(|r| &r.run_log).collect();
    let time_logs: BTreeSet<&PathBuf> = outcome.results.iter().map(|r| &r.time_log).collect();
    assert_eq!(run_logs.len(), 4);
    assert_eq!(time_logs.len(), 4);
    assert!(run_logs.contains(&PathBuf::from("logs/R_query_3")));
}

#[test]
fn all_streams_succeed_and_produce_logs() {
    let temp = tempfile::tempdir().expect("tempdir");
    let submitter = ScriptedSubmitter::succeeding().writing_logs();
    let outcome = run_throughput(
        &submitter,
        &StreamSet::parse("s1.sql,s2.sql,s3.sql"),
        &base(temp.path()),
    )
    .expect("run");

    assert!(outcome.is_success());
    for stream in ["s1", "s2", "s3"] {
        assert!(temp.path().join(format!("R_{stream}")).is_file());
        assert!(temp.path().join(format!("T_{stream}")).is_file());
    }
}

#[test]
fn one_failing_stream_does_not_stop_siblings() {
    let temp = tempfile::tempdir().expect("tempdir");
    let submitter = ScriptedSubmitter::succeeding()
        .writing_logs()
        .with_exit("s2.sql", 1)
        .with_delay("s3.sql", Duration::from_millis(100));
    let outcome = run_throughput(
        &submitter,
        &StreamSet::parse("s1.sql,s2.sql,s3.sql"),
        &base(temp.path()),
    )
    .expect("run");

    assert!(!outcome.is_success());
    assert_eq!(outcome.failed_streams(), vec!["s2.sql"]);
    assert_eq!(outcome.results[0].state(), JobState::Succeeded);
    assert_eq!(outcome.results[2].state(), JobState::Succeeded);
    assert_eq!(submitter.finished().len(), 3);
    for stream in ["s1", "s3"] {
        assert!(temp.path().join(format!("R_{stream}")).is_file());
        assert!(temp.path().join(format!("T_{stream}")).is_file());
    }
}

#[test]
fn first_stream_finishing_last_does_not_block_others() {
    // s1 cannot finish until s2 and s3 have, so a coordinator that waited on
    // s1 before starting the rest would time the gate out.
    let submitter = ScriptedSubmitter::succeeding()
        .finishing_after("s1.sql", 2)
        .with_exit("s3.sql", 4);
    let outcome = run_throughput(
        &submitter,
        &StreamSet::parse("s1.sql,s2.sql,s3.sql"),
        &base(std::path::Path::new(".")),
    )
    .expect("run");

    assert_eq!(
        submitter.finished().last().map(PathBuf::as_path),
        Some(std::path::Path::new("s1.sql"))
    );
    assert_eq!(outcome.results[0].stream, PathBuf::from("s1.sql"));
    assert_eq!(outcome.results[0].state(), JobState::Succeeded);
    assert_eq!(outcome.failed_streams(), vec!["s3.sql"]);
}

#[test]
fn launch_order_matches_input_order() {
    let names = ["c.sql", "a.sql", "d.sql", "b.sql"];
    let submitter = ScriptedSubmitter::succeeding().finishing_after("c.sql", 3);
    run_throughput(
        &submitter,
        &StreamSet::parse(&names.join(",")),
        &base(std::path::Path::new(".")),
    )
    .expect("run");

    let expected: Vec<PathBuf> = names.iter().map(PathBuf::from).collect();
    assert_eq!(submitter.launched(), expected);
}

#[test]
fn single_stream_is_rejected_before_launch() {
    let submitter = ScriptedSubmitter::succeeding();
    let err = run_throughput(
        &submitter,
        &StreamSet::parse("only_one.sql"),
        &base(std::path::Path::new(".")),
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<NdsError>(),
        Some(NdsError::Configuration(_))
    ));
    assert!(submitter.launched().is_empty());
    assert!(submitter.entered().is_empty());
}
