use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use crate::cli::{self, Opts};

/// Install the terminal logger. Logs go to stderr so that command output
/// on stdout stays clean.
pub fn init_logger(opts: &Opts) -> anyhow::Result<()> {
    // Derive log level from CLI options and construct logger.
    let log_level = cli::calc_log_level(opts.verbose, opts.quiet);
    let config = ConfigBuilder::new()
        .add_filter_allow_str("exercism")
        .build();

    TermLogger::init(log_level, config, TerminalMode::Stderr, ColorChoice::Auto)?;

    log::debug!("Initialized logger from options.");
    Ok(())
}
