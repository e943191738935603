//! A benchmark suite: the pipeline shared by the experiment subcommands.
//!
//! Benchmarks run first, then the bucket is checked, the benchmark id is resolved, and the result
//! files are published.

use std::path::PathBuf;

use failure::Fail;

use serde::Serialize;

use crate::config::{ParamKeys, RunParameters};
use crate::identity::{self, BenchmarkId, MetadataCommand};
use crate::output::{ResultFile, Timestamp};
use crate::publish::{publish, verify_bucket, PublishReport};
use crate::store::ObjectStore;
use crate::workloads::{run_workloads, BenchCommand, BenchOutcome, Workload};

/// A fixed, ordered set of benchmarks and the environment keys they are parametrized by.
#[derive(Debug)]
pub struct Suite {
    pub name: &'static str,
    pub keys: ParamKeys,
    pub workloads: &'static [Workload],
}

impl Suite {
    /// The smallest level count for which every workload still has a non-negative number of
    /// users.
    pub fn min_levels(&self) -> u32 {
        let max_offset = self
            .workloads
            .iter()
            .map(|w| w.user_offset)
            .max()
            .unwrap_or(0);

        (0..64).find(|l| (1u64 << l) >= max_offset).unwrap_or(64)
    }

    /// The result files the suite produces for `params`, in workload order.
    pub fn result_files(&self, params: &RunParameters) -> Vec<ResultFile> {
        self.workloads
            .iter()
            .map(|w| w.result_file(params))
            .collect()
    }
}

/// What to do when a benchmark exits with an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnBenchFailure {
    /// Publish whatever results exist, then report the failure.
    Publish,
    /// Stop before contacting the object store.
    Abort,
}

/// Settings that do not come from the environment.
#[derive(Debug, Clone)]
pub struct Options {
    /// Directory the benchmarks run in and write their results to.
    pub workdir: PathBuf,
    pub bench_cmd: BenchCommand,
    pub metadata_cmd: MetadataCommand,
    pub skip_bench: bool,
    pub on_bench_failure: OnBenchFailure,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            workdir: PathBuf::from("."),
            bench_cmd: BenchCommand::default(),
            metadata_cmd: MetadataCommand::default(),
            skip_bench: false,
            on_bench_failure: OnBenchFailure::Publish,
        }
    }
}

/// One or more benchmarks exited with an error.
#[derive(Debug, Fail)]
#[fail(display = "benchmarks failed: {}", _0)]
pub struct BenchmarkFailures(String);

impl BenchmarkFailures {
    /// `None` if every outcome succeeded.
    pub fn from_outcomes(outcomes: &[BenchOutcome]) -> Option<Self> {
        let failed: Vec<_> = outcomes
            .iter()
            .filter(|o| !o.success)
            .map(|o| match o.exit_code {
                Some(code) => format!("{} (exit code {})", o.tag, code),
                None => format!("{} (killed by signal)", o.tag),
            })
            .collect();

        if failed.is_empty() {
            None
        } else {
            Some(BenchmarkFailures(failed.join(", ")))
        }
    }
}

/// Everything a run did.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub suite: &'static str,
    pub params: RunParameters,
    pub benchmark_id: BenchmarkId,
    pub benchmarks: Vec<BenchOutcome>,
    pub published: PublishReport,
    pub started: Timestamp,
    pub finished: Timestamp,
}

impl RunSummary {
    /// Turn benchmark failures recorded in a finished run into an error.
    pub fn check_benchmarks(&self) -> Result<(), BenchmarkFailures> {
        match BenchmarkFailures::from_outcomes(&self.benchmarks) {
            Some(failures) => Err(failures),
            None => Ok(()),
        }
    }
}

/// Run `suite` with the given parameters and publish to `store`.
///
/// Benchmark failures are recorded in the summary; whether they stop the run before publishing
/// depends on `opts.on_bench_failure`. Every other failure is an `Err`.
pub fn run_suite<S: ObjectStore + ?Sized>(
    suite: &Suite,
    params: &RunParameters,
    opts: &Options,
    store: &S,
) -> Result<RunSummary, failure::Error> {
    let started = Timestamp::now();
    let files = suite.result_files(params);

    println!(
        "Running benchmarks with {} levels and {} currencies",
        params.levels, params.currencies
    );
    log::debug!("{} parameters: {}", suite.name, serde_json::to_string(params)?);

    let benchmarks = if opts.skip_bench {
        println!("Skipping benchmarks; publishing existing results.");
        vec![]
    } else {
        run_workloads(&opts.bench_cmd, suite.workloads, &opts.workdir)?
    };

    if let Some(failures) = BenchmarkFailures::from_outcomes(&benchmarks) {
        if opts.on_bench_failure == OnBenchFailure::Abort {
            return Err(failures.into());
        }
    }

    for file in files.iter() {
        for problem in file.validate(&opts.workdir) {
            println!("WARNING: {}", problem);
        }
    }

    verify_bucket(store, &params.bucket)?;

    let benchmark_id = identity::resolve(&opts.metadata_cmd);

    let published = publish(store, &params.bucket, &files, &benchmark_id, &opts.workdir)?;

    Ok(RunSummary {
        suite: suite.name,
        params: params.clone(),
        benchmark_id,
        benchmarks,
        published,
        started,
        finished: Timestamp::now(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::workloads::{Currencies, KeyParam};

    const KEYS: ParamKeys = ParamKeys {
        primary: None,
        levels: "LEVELS",
        currencies: "N_CURRENCIES",
        region: "REGION_NAME",
        bucket: "S3_BUCKET",
    };

    fn suite(workloads: &'static [Workload]) -> Suite {
        Suite {
            name: "test",
            keys: KEYS,
            workloads,
        }
    }

    const fn w(tag: &'static str, user_offset: u64) -> Workload {
        Workload {
            tag,
            key: KeyParam::Levels,
            user_offset,
            currencies: Currencies::Param,
        }
    }

    #[test]
    fn min_levels_covers_offsets() {
        const NONE: &[Workload] = &[w("a", 0)];
        const ONE: &[Workload] = &[w("a", 0), w("b", 1)];
        const SIX: &[Workload] = &[w("a", 0), w("b", 6), w("c", 6)];
        const TWO: &[Workload] = &[w("a", 1), w("b", 2)];

        assert_eq!(suite(NONE).min_levels(), 0);
        assert_eq!(suite(ONE).min_levels(), 0);
        assert_eq!(suite(SIX).min_levels(), 3);
        assert_eq!(suite(TWO).min_levels(), 1);
    }

    #[test]
    fn benchmark_failures_are_listed() {
        let outcomes = vec![
            BenchOutcome {
                tag: "v1",
                exit_code: Some(0),
                success: true,
                elapsed: Default::default(),
            },
            BenchOutcome {
                tag: "v2",
                exit_code: Some(101),
                success: false,
                elapsed: Default::default(),
            },
            BenchOutcome {
                tag: "v3",
                exit_code: None,
                success: false,
                elapsed: Default::default(),
            },
        ];

        let failures = BenchmarkFailures::from_outcomes(&outcomes).unwrap();
        assert_eq!(
            failures.to_string(),
            "benchmarks failed: v2 (exit code 101), v3 (killed by signal)"
        );
        assert!(BenchmarkFailures::from_outcomes(&outcomes[..1]).is_none());
    }
}
