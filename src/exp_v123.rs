//! Run the `v1`, `v2`, and `v3` benchmarks and publish their results.
//!
//! `K` only parametrizes `v1`. `v2` and `v3` use `N_LEVELS` as their `k`.

use clap::clap_app;

use crate::config::ParamKeys;
use crate::suite::Suite;
use crate::workloads::{Currencies, KeyParam, Workload};

pub const SUITE: Suite = Suite {
    name: "v123",
    keys: ParamKeys {
        primary: Some("K"),
        levels: "N_LEVELS",
        currencies: "N_CURRENCIES",
        region: "REGION_NAME",
        bucket: "S3_BUCKET",
    },
    workloads: &[
        Workload {
            tag: "v1",
            key: KeyParam::Primary,
            user_offset: 0,
            currencies: Currencies::Param,
        },
        Workload {
            tag: "v2",
            key: KeyParam::Levels,
            user_offset: 6,
            currencies: Currencies::Param,
        },
        Workload {
            tag: "v3",
            key: KeyParam::Levels,
            user_offset: 6,
            currencies: Currencies::Param,
        },
    ],
};

pub fn cli_options() -> clap::App<'static, 'static> {
    let app = clap_app! { v123 =>
        (about: "Run the v1, v2, and v3 benchmarks and publish their results. Reads K, N_LEVELS, \
                 N_CURRENCIES, REGION_NAME, S3_BUCKET, and the AWS credentials from the \
                 environment.")
        (@setting DisableVersion)
    };

    crate::cli::add_cli_options(app)
}

pub fn run(sub_m: &clap::ArgMatches<'_>) -> Result<(), failure::Error> {
    crate::run_suite_from_env(&SUITE, sub_m)
}
