//! This program runs a benchmark suite and publishes its results to S3. Which suite is chosen by
//! passing different command line arguments.

use bench_publisher::{exp_v123, exp_v3abc};

fn run() -> Result<(), failure::Error> {
    let matches = clap::App::new("bench-publisher")
        .about(
            "This program runs a benchmark suite and publishes its results to S3. Which suite is \
             chosen by passing different command line arguments. Run parameters and AWS \
             credentials are read from the environment.",
        )
        .subcommand(exp_v123::cli_options())
        .subcommand(exp_v3abc::cli_options())
        .setting(clap::AppSettings::SubcommandRequiredElseHelp)
        .setting(clap::AppSettings::DisableVersion)
        .get_matches();

    match matches.subcommand() {
        ("v123", Some(sub_m)) => exp_v123::run(sub_m),
        ("v3abc", Some(sub_m)) => exp_v3abc::run(sub_m),

        _ => {
            unreachable!();
        }
    }
}

fn main() {
    use console::style;

    env_logger::init();

    // If an error occurred, try to print something helpful.
    if let Err(err) = run() {
        const MESSAGE: &str = r#"== ERROR ==================================================================================
`bench-publisher` encountered an error. The output above may offer clues. Setting the
RUST_LOG=debug environment variable shows the commands that were run and their error output.
"#;

        println!("{}", style(MESSAGE).red().bold());

        // Print the error and everything that caused it.
        for (i, cause) in err.iter_chain().enumerate() {
            if i == 0 {
                println!("{}", cause);
            } else {
                println!("  caused by: {}", cause);
            }
        }

        std::process::exit(1);
    }
}
