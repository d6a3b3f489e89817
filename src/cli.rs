use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use simplelog::LevelFilter;

/// A command line tool to fetch and submit exercises.
#[derive(Parser, Debug)]
#[command(name = "exercism", version)]
pub struct Opts {
    /// Path to the config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// The level of verbosity.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress the log. This option overrides the verbose option.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Outputs useful debug information.
    Debug,
    /// Writes config values to a JSON file.
    Configure {
        /// Path to exercises directory.
        #[arg(short, long)]
        dir: Option<PathBuf>,
        /// Exercise API host.
        #[arg(short = 'u', long)]
        host: Option<String>,
        /// API key.
        #[arg(short, long)]
        key: Option<String>,
    },
    /// Fetches a demo problem for each language track.
    #[command(visible_alias = "d")]
    Demo,
    /// Fetches your current problems, or the named ones.
    #[command(visible_alias = "f")]
    Fetch {
        /// Fetch the next unstarted problem in each language instead.
        #[arg(long)]
        next: bool,
        /// Specific exercises, e.g. `ruby bob`.
        ids: Vec<String>,
    },
    /// Restores completed and current problems. Never overwrites existing files.
    #[command(visible_alias = "r")]
    Restore,
    /// Submits a new iteration to a problem.
    #[command(visible_alias = "s")]
    Submit {
        /// The solution file to submit.
        file: PathBuf,
    },
    /// Deletes the most recently submitted iteration.
    #[command(visible_alias = "u")]
    Unsubmit,
    /// Clears the API key from the config file.
    #[command(visible_alias = "o")]
    Logout,
}

pub fn calc_log_level(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Off
    } else {
        match verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_wins_over_verbose() {
        assert_eq!(calc_log_level(3, true), LevelFilter::Off);
        assert_eq!(calc_log_level(0, false), LevelFilter::Warn);
        assert_eq!(calc_log_level(2, false), LevelFilter::Debug);
        assert_eq!(calc_log_level(9, false), LevelFilter::Trace);
    }

    #[test]
    fn parses_submit_with_global_flags() {
        let opts = Opts::try_parse_from(["exercism", "-vv", "submit", "bob.rb", "-c", "/tmp/c.json"]).unwrap();
        assert_eq!(opts.verbose, 2);
        assert_eq!(opts.config, Some(PathBuf::from("/tmp/c.json")));
        assert!(matches!(opts.command, Command::Submit { ref file } if file == &PathBuf::from("bob.rb")));
    }

    #[test]
    fn parses_fetch_ids() {
        let opts = Opts::try_parse_from(["exercism", "fetch", "ruby", "bob"]).unwrap();
        match opts.command {
            Command::Fetch { next, ids } => {
                assert!(!next);
                assert_eq!(ids, ["ruby", "bob"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_demo_and_logout_aliases() {
        let opts = Opts::try_parse_from(["exercism", "d"]).unwrap();
        assert!(matches!(opts.command, Command::Demo));
        let opts = Opts::try_parse_from(["exercism", "logout"]).unwrap();
        assert!(matches!(opts.command, Command::Logout));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Opts::command().debug_assert();
    }
}
