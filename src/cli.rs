//! Some routines for adding common CLI options in a consistent, less boilerplatey way.

use std::path::PathBuf;
use std::time::Duration;

use clap::{App, Arg, ArgMatches};

use crate::identity::MetadataCommand;
use crate::store::DEFAULT_AWS_CLI;
use crate::suite::{OnBenchFailure, Options};
use crate::workloads::BenchCommand;

/// The values of the options added by `add_cli_options`.
#[derive(Debug, Clone)]
pub struct CommonArgs {
    pub opts: Options,
    /// The `aws` client to publish with.
    pub aws_cli: String,
    /// Print a JSON summary of the run when done.
    pub json: bool,
}

pub fn add_cli_options<'a, 'b>(app: App<'a, 'b>) -> App<'a, 'b> {
    app.arg(
        Arg::with_name("WORKDIR")
            .long("workdir")
            .takes_value(true)
            .default_value(".")
            .help(
                "The directory to run the benchmarks in. Result files are read from here too \
                 (e.g. the root of the benchmark crate).",
            ),
    )
    .arg(
        Arg::with_name("BENCH_CMD")
            .long("bench-cmd")
            .takes_value(true)
            .validator(validate_command)
            .help(
                "The command that runs a benchmark. The benchmark name is appended as the last \
                 argument. Defaults to `cargo bench --bench`.",
            ),
    )
    .arg(
        Arg::with_name("METADATA_CMD")
            .long("metadata-cmd")
            .takes_value(true)
            .validator(validate_command)
            .help(
                "The command that prints the instance id of this host. Defaults to \
                 `ec2metadata --instance-id`.",
            ),
    )
    .arg(
        Arg::with_name("METADATA_TIMEOUT")
            .long("metadata-timeout")
            .takes_value(true)
            .default_value("3")
            .validator(is_u64)
            .help("How many seconds to wait for the metadata command before giving up."),
    )
    .arg(
        Arg::with_name("AWS_CLI")
            .long("aws-cli")
            .takes_value(true)
            .default_value(DEFAULT_AWS_CLI)
            .validator(validate_command)
            .help(
                "The `aws` command line client to publish results with, including any leading \
                 arguments (e.g. `aws --profile bench`).",
            ),
    )
    .arg(
        Arg::with_name("SKIP_BENCH")
            .long("skip-bench")
            .help("Do not run the benchmarks; publish the result files already in the workdir."),
    )
    .arg(
        Arg::with_name("ABORT_ON_BENCH_FAILURE")
            .long("abort-on-bench-failure")
            .help(
                "Stop before publishing if any benchmark fails. By default, the remaining \
                 results are published and the run exits with an error afterwards.",
            ),
    )
    .arg(
        Arg::with_name("JSON")
            .long("json")
            .help("Print a JSON summary of the run when done."),
    )
}

/// Parse and return the values added by `add_cli_options`.
pub fn parse_cli_options(sub_m: &ArgMatches<'_>) -> CommonArgs {
    let mut opts = Options::default();

    opts.workdir = PathBuf::from(sub_m.value_of("WORKDIR").unwrap());

    if let Some(cmd) = sub_m.value_of("BENCH_CMD") {
        opts.bench_cmd = BenchCommand::parse(cmd).unwrap();
    }

    if let Some(cmd) = sub_m.value_of("METADATA_CMD") {
        let cmd = BenchCommand::parse(cmd).unwrap();
        opts.metadata_cmd = MetadataCommand {
            program: cmd.program,
            args: cmd.args,
            ..opts.metadata_cmd
        };
    }

    let timeout = sub_m
        .value_of("METADATA_TIMEOUT")
        .unwrap()
        .parse::<u64>()
        .unwrap();
    opts.metadata_cmd.timeout = Duration::from_secs(timeout);

    opts.skip_bench = sub_m.is_present("SKIP_BENCH");
    if sub_m.is_present("ABORT_ON_BENCH_FAILURE") {
        opts.on_bench_failure = OnBenchFailure::Abort;
    }

    CommonArgs {
        opts,
        aws_cli: sub_m.value_of("AWS_CLI").unwrap().into(),
        json: sub_m.is_present("JSON"),
    }
}

fn is_u64(s: String) -> Result<(), String> {
    s.as_str()
        .parse::<u64>()
        .map(|_| ())
        .map_err(|e| format!("{:?}", e))
}

fn validate_command(s: String) -> Result<(), String> {
    BenchCommand::parse(&s)
        .map(|_| ())
        .ok_or_else(|| "Empty string is not a valid command".to_owned())
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> CommonArgs {
        let app = add_cli_options(App::new("test"));
        let matches = app.get_matches_from_safe(args).unwrap();
        parse_cli_options(&matches)
    }

    #[test]
    fn defaults() {
        let args = parse(&["test"]);

        assert_eq!(args.opts.workdir, PathBuf::from("."));
        assert_eq!(args.opts.bench_cmd.program, "cargo");
        assert_eq!(args.opts.metadata_cmd.program, "ec2metadata");
        assert_eq!(args.opts.metadata_cmd.timeout, Duration::from_secs(3));
        assert_eq!(args.opts.on_bench_failure, OnBenchFailure::Publish);
        assert!(!args.opts.skip_bench);
        assert_eq!(args.aws_cli, "aws");
        assert!(!args.json);
    }

    #[test]
    fn overrides() {
        let args = parse(&[
            "test",
            "--workdir",
            "/tmp/bench",
            "--bench-cmd",
            "cargo +nightly bench --bench",
            "--metadata-cmd",
            "curl -s http://169.254.169.254/latest/meta-data/instance-id",
            "--metadata-timeout",
            "10",
            "--aws-cli",
            "/usr/local/bin/aws",
            "--skip-bench",
            "--abort-on-bench-failure",
            "--json",
        ]);

        assert_eq!(args.opts.workdir, PathBuf::from("/tmp/bench"));
        assert_eq!(
            args.opts.bench_cmd.args,
            vec!["+nightly", "bench", "--bench"]
        );
        assert_eq!(args.opts.metadata_cmd.program, "curl");
        assert_eq!(args.opts.metadata_cmd.timeout, Duration::from_secs(10));
        assert_eq!(args.opts.on_bench_failure, OnBenchFailure::Abort);
        assert!(args.opts.skip_bench);
        assert_eq!(args.aws_cli, "/usr/local/bin/aws");
        assert!(args.json);
    }

    #[test]
    fn rejects_bad_values() {
        let app = add_cli_options(App::new("test"));
        assert!(app
            .clone()
            .get_matches_from_safe(&["test", "--metadata-timeout", "soon"])
            .is_err());
        assert!(app
            .get_matches_from_safe(&["test", "--bench-cmd", "  "])
            .is_err());
    }
}
