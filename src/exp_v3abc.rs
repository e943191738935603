//! Run the `v3a`, `v3b`, and `v3c` benchmarks and publish their results.
//!
//! All three use `LEVELS` as their `k`. `v3b` and `v3c` hard-code their currency counts.

use clap::clap_app;

use crate::config::ParamKeys;
use crate::suite::Suite;
use crate::workloads::{Currencies, KeyParam, Workload};

pub const SUITE: Suite = Suite {
    name: "v3abc",
    keys: ParamKeys {
        primary: None,
        levels: "LEVELS",
        currencies: "N_CURRENCIES",
        region: "REGION_NAME",
        bucket: "S3_BUCKET",
    },
    workloads: &[
        Workload {
            tag: "v3a",
            key: KeyParam::Levels,
            user_offset: 1,
            currencies: Currencies::Param,
        },
        Workload {
            tag: "v3b",
            key: KeyParam::Levels,
            user_offset: 2,
            currencies: Currencies::Fixed(3),
        },
        Workload {
            tag: "v3c",
            key: KeyParam::Levels,
            user_offset: 2,
            currencies: Currencies::Fixed(1),
        },
    ],
};

pub fn cli_options() -> clap::App<'static, 'static> {
    let app = clap_app! { v3abc =>
        (about: "Run the v3a, v3b, and v3c benchmarks and publish their results. Reads LEVELS, \
                 N_CURRENCIES, REGION_NAME, S3_BUCKET, and the AWS credentials from the \
                 environment.")
        (@setting DisableVersion)
    };

    crate::cli::add_cli_options(app)
}

pub fn run(sub_m: &clap::ArgMatches<'_>) -> Result<(), failure::Error> {
    crate::run_suite_from_env(&SUITE, sub_m)
}
