//! A library of routines for running benchmark suites and publishing their results.
//!
//! Each suite runs a fixed set of benchmarks, then uploads the result files they produce to an S3
//! bucket under names that embed the run parameters and an identifier for the machine that ran
//! them.

// Must be imported first because the other submodules use the macros defined therein.
#[macro_use]
mod macros;

pub mod cli;
pub mod config;
pub mod identity;
pub mod output;
pub mod process;
pub mod publish;
pub mod store;
pub mod suite;
pub mod workloads;

pub mod exp_v123;
pub mod exp_v3abc;

use crate::cli::CommonArgs;
use crate::config::{Credentials, RunParameters};
use crate::store::AwsCli;
use crate::suite::Suite;

/// Given an array of timings, generate a human-readable string.
pub fn timings_str(timings: &[(&str, std::time::Duration)]) -> String {
    let mut s = String::new();
    for (label, d) in timings.iter() {
        s.push_str(&format!("{}: {:?}\n", label, d));
    }
    s
}

/// Run `suite` with parameters and credentials from the environment and options from `sub_m`,
/// publishing through the `aws` client.
pub fn run_suite_from_env(
    suite: &Suite,
    sub_m: &clap::ArgMatches<'_>,
) -> Result<(), failure::Error> {
    let args = cli::parse_cli_options(sub_m);
    run_suite_with_env(suite, &args, |key| std::env::var(key).ok())
}

/// Like `run_suite_from_env`, reading environment variables through `lookup`.
///
/// Everything is read before the first benchmark starts, so a missing variable never leaves a
/// half-done run behind.
pub fn run_suite_with_env<F>(
    suite: &Suite,
    args: &CommonArgs,
    lookup: F,
) -> Result<(), failure::Error>
where
    F: Fn(&str) -> Option<String>,
{
    let params = RunParameters::load(&suite.keys, suite.min_levels(), &lookup)?;
    let credentials = Credentials::load(&lookup)?;

    log::debug!("Using credentials {:?}", credentials);

    let store = AwsCli::new(&args.aws_cli, &params.region, credentials);
    let summary = crate::suite::run_suite(suite, &params, &args.opts, &store)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    println!(
        "Published {} result files for benchmark id {} (started {}, finished {}).",
        summary.published.published.len(),
        summary.benchmark_id,
        summary.started,
        summary.finished,
    );

    summary.check_benchmarks()?;

    Ok(())
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;

    use super::*;
    use crate::config::ConfigError;
    use crate::identity::MetadataCommand;
    use crate::suite::Options;
    use crate::workloads::BenchCommand;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const V3ABC_ENV: &[(&str, &str)] = &[
        ("LEVELS", "4"),
        ("N_CURRENCIES", "5"),
        ("REGION_NAME", "us-east-1"),
        ("S3_BUCKET", "results"),
        ("AWS_ACCESS_KEY_ID", "AKIA"),
        ("AWS_SECRET_ACCESS_KEY", "secret"),
        ("AWS_SESSION_TOKEN", "token"),
    ];

    /// Benchmarks that leave a marker in `dir` when they run, and an `aws` client that records
    /// its calls there.
    fn args(dir: &Path) -> CommonArgs {
        let aws = dir.join("aws.sh");
        fs::write(
            &aws,
            format!("echo \"$*\" >> '{}'\n", dir.join("aws-calls").display()),
        )
        .unwrap();

        CommonArgs {
            opts: Options {
                workdir: dir.to_owned(),
                bench_cmd: BenchCommand {
                    program: "touch".into(),
                    args: vec![dir.join("ran").display().to_string()],
                },
                metadata_cmd: MetadataCommand {
                    program: "echo".into(),
                    args: vec!["i-0abc".into()],
                    timeout: Duration::from_secs(5),
                },
                ..Options::default()
            },
            aws_cli: format!("sh {}", aws.display()),
            json: false,
        }
    }

    #[test]
    fn missing_credential_stops_before_benchmarks() {
        let dir = tempfile::tempdir().unwrap();
        let vars: Vec<_> = V3ABC_ENV
            .iter()
            .filter(|(k, _)| *k != "AWS_SESSION_TOKEN")
            .cloned()
            .collect();

        let err = run_suite_with_env(&exp_v3abc::SUITE, &args(dir.path()), env(&vars))
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::Missing {
                key: "AWS_SESSION_TOKEN".into()
            })
        );
        assert!(!dir.path().join("ran").exists());
        assert!(!dir.path().join("aws-calls").exists());
    }

    #[test]
    fn missing_parameter_stops_before_benchmarks() {
        let dir = tempfile::tempdir().unwrap();
        let vars: Vec<_> = V3ABC_ENV
            .iter()
            .filter(|(k, _)| *k != "S3_BUCKET")
            .cloned()
            .collect();

        let err = run_suite_with_env(&exp_v3abc::SUITE, &args(dir.path()), env(&vars))
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::Missing {
                key: "S3_BUCKET".into()
            })
        );
        assert!(!dir.path().join("ran").exists());
    }

    #[test]
    fn complete_environment_runs_and_publishes() {
        let dir = tempfile::tempdir().unwrap();
        for name in &["v3a_k4_u15_c5.json", "v3b_k4_u14_c3.json", "v3c_k4_u14_c1.json"] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }

        run_suite_with_env(&exp_v3abc::SUITE, &args(dir.path()), env(V3ABC_ENV)).unwrap();

        assert!(dir.path().join("ran").exists());
        let calls = fs::read_to_string(dir.path().join("aws-calls")).unwrap();
        assert_eq!(calls.lines().count(), 4);
        assert!(calls.contains("--key v3c_k4_u14_c1_0abc.json"));
    }

    #[test]
    fn timings() {
        let s = super::timings_str(&[
            ("v1", Duration::from_secs(2)),
            ("v2", Duration::from_millis(5)),
        ]);
        assert_eq!(s, "v1: 2s\nv2: 5ms\n");
    }
}
