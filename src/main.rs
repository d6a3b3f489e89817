// Entrypoint for the CLI application.
// - Keeps `main` small: parse options, start the logger and hand over to
//   the command handlers.
// - Returns `anyhow::Result` so configuration failures end the process
//   with a non-zero exit code.

use clap::Parser;
use exercism_cli::{cli::Opts, logger, ui};

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    logger::init_logger(&opts)?;
    log::debug!("{:?}", opts);

    ui::run(opts)
}
