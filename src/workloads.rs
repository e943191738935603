//! The benchmark workloads and how to run them.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use failure::ResultExt;

use serde::Serialize;

use crate::config::RunParameters;
use crate::output::ResultFile;
use crate::process::run_captured;

/// The default benchmark command. The workload tag is appended as the last argument.
pub const DEFAULT_BENCH_COMMAND: &[&str] = &["cargo", "bench", "--bench"];

/// Where the `k` component of a result name comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyParam {
    /// The suite's primary key (e.g. `K`).
    Primary,
    /// The level count.
    Levels,
}

/// Where the `c` component of a result name comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currencies {
    /// The currency count from the run parameters.
    Param,
    /// A count the benchmark hard-codes.
    Fixed(u32),
}

/// One benchmark of a suite.
#[derive(Debug, Clone, Copy)]
pub struct Workload {
    /// The name of the benchmark target (e.g. `v3a`). Also the prefix of its result file.
    pub tag: &'static str,
    pub key: KeyParam,
    /// The benchmark runs with `2^levels - user_offset` users.
    pub user_offset: u64,
    pub currencies: Currencies,
}

impl Workload {
    /// The result file this workload produces for the given parameters.
    ///
    /// Parameters loaded through `RunParameters::load` with the suite's minimum level count
    /// always leave at least `user_offset` users.
    pub fn result_file(&self, params: &RunParameters) -> ResultFile {
        ResultFile {
            tag: self.tag,
            key: match self.key {
                KeyParam::Primary => params.primary_key.clone(),
                KeyParam::Levels => params.levels_key.clone(),
            },
            users: params.user_count().saturating_sub(self.user_offset),
            currencies: match self.currencies {
                Currencies::Param => params.currencies.clone(),
                Currencies::Fixed(n) => n.to_string(),
            },
        }
    }
}

/// The command used to run a benchmark: `<program> <args...> <tag>`.
#[derive(Debug, Clone)]
pub struct BenchCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for BenchCommand {
    fn default() -> Self {
        BenchCommand {
            program: DEFAULT_BENCH_COMMAND[0].into(),
            args: DEFAULT_BENCH_COMMAND[1..]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl BenchCommand {
    /// Parse a whitespace-separated command line, e.g. `"cargo bench --bench"`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut words = s.split_whitespace().map(str::to_owned);
        let program = words.next()?;
        Some(BenchCommand {
            program,
            args: words.collect(),
        })
    }
}

/// What happened when a workload ran.
#[derive(Debug, Clone, Serialize)]
pub struct BenchOutcome {
    pub tag: &'static str,
    /// `None` if the benchmark was killed by a signal.
    pub exit_code: Option<i32>,
    pub success: bool,
    pub elapsed: Duration,
}

/// Run `workload` in `workdir`. A benchmark that exits with an error is reported in the outcome;
/// only failing to start it at all is an `Err`.
pub fn run_workload(
    cmd: &BenchCommand,
    workload: &Workload,
    workdir: &Path,
) -> Result<BenchOutcome, failure::Error> {
    let mut timers = vec![];

    let out = time!(
        timers,
        workload.tag,
        run_captured(
            Command::new(&cmd.program)
                .args(&cmd.args)
                .arg(workload.tag)
                .current_dir(workdir),
        )
        .with_context(|_| format!("running benchmark {}", workload.tag))?
    );

    println!("run result in {}: {}", workload.tag, out.stdout);
    if !out.stderr.trim().is_empty() {
        log::debug!("stderr of {}:\n{}", workload.tag, out.stderr);
    }

    let success = out.status.success();
    if !success {
        println!(
            "WARNING: benchmark {} failed with {}; its result file may be missing or stale.",
            workload.tag, out.status
        );
    }

    Ok(BenchOutcome {
        tag: workload.tag,
        exit_code: out.status.code(),
        success,
        elapsed: timers[0].1,
    })
}

/// Run every workload in order. Failing benchmarks do not stop the ones after them.
pub fn run_workloads(
    cmd: &BenchCommand,
    workloads: &[Workload],
    workdir: &Path,
) -> Result<Vec<BenchOutcome>, failure::Error> {
    let mut outcomes = Vec::with_capacity(workloads.len());
    for workload in workloads {
        outcomes.push(run_workload(cmd, workload, workdir)?);
    }

    let timers: Vec<_> = outcomes.iter().map(|o| (o.tag, o.elapsed)).collect();
    println!("{}", crate::timings_str(&timers));

    Ok(outcomes)
}
