// UI layer: one handler per command. Handlers print results and errors
// for the user and only return `Err` for problems that should end the
// process (unreadable config, broken terminal).

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::{self, ApiClient, Endpoint};
use crate::assignment::{self, Tally};
use crate::cli::{Command, Opts};
use crate::config::{self, Config};
use crate::error::Error;
use crate::submission::PathResolver;

const MSG_PLEASE_AUTHENTICATE: &str =
    "You must be authenticated. Run `exercism configure --key=YOUR_API_KEY`.";

/// Dispatch the parsed command line.
pub fn run(opts: Opts) -> Result<()> {
    let config_path = opts.config.clone().unwrap_or_else(config::default_path);
    let config = Config::read(&config_path).context("Loading configuration")?;
    log::debug!("config: {} (dir {})", config_path.display(), config.dir.display());

    match opts.command {
        Command::Debug => handle_debug(&config, &config_path),
        Command::Configure { dir, host, key } => {
            handle_configure(config, &config_path, host, key, dir)
        }
        Command::Demo => handle_fetch(&config, &Endpoint::Demo),
        Command::Fetch { next, ids } => handle_fetch(&config, &Endpoint::for_fetch(&ids, next)),
        Command::Restore => handle_fetch(&config, &Endpoint::Restore),
        Command::Submit { file } => handle_submit(&config, &file),
        Command::Unsubmit => handle_unsubmit(&config),
        Command::Logout => handle_logout(config, &config_path),
    }
}

/// Client for commands that talk to the service, or `None` (after
/// telling the user) when no API key is configured.
fn authenticated_client(config: &Config) -> Result<Option<ApiClient>> {
    if !config.is_authenticated() {
        println!("{}", MSG_PLEASE_AUTHENTICATE);
        return Ok(None);
    }
    let client = ApiClient::new(config, &api::user_agent()).context("Creating API client")?;
    Ok(Some(client))
}

/// `indicatif` spinner shown while a request is in flight.
fn spinner(message: &'static str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

fn handle_fetch(config: &Config, endpoint: &Endpoint) -> Result<()> {
    let api = if *endpoint == Endpoint::Demo {
        ApiClient::new(config, &api::user_agent()).context("Creating API client")?
    } else {
        let Some(api) = authenticated_client(config)? else {
            return Ok(());
        };
        api
    };

    let spinner = spinner("Fetching assignments...")?;
    let fetched = api.fetch(endpoint);
    spinner.finish_and_clear();

    let assignments = match fetched {
        Ok(assignments) => assignments,
        Err(e) => {
            println!("{}", e.to_string().red());
            return Ok(());
        }
    };
    if assignments.is_empty() {
        println!("No assignments to fetch.");
        return Ok(());
    }

    let mut tally = Tally::default();
    for (assignment, result) in assignment::save_all(&config.dir, &assignments) {
        tally.record(&result);
        match result {
            Ok(result) => {
                let line = assignment.summary_line(result);
                if assignment.marker(result) == '*' {
                    println!("{}", line.yellow());
                } else {
                    println!("{}", line);
                }
            }
            Err(e) => println!(
                "{} {} - {}: {}",
                "!".red(),
                assignment.track,
                assignment.slug,
                e
            ),
        }
    }
    println!("\n{}", tally);
    Ok(())
}

fn handle_submit(config: &Config, file: &Path) -> Result<()> {
    let Some(api) = authenticated_client(config)? else {
        return Ok(());
    };

    let resolver = PathResolver::new(&config.dir);
    let (absolute, relative) = match resolver.resolve(file) {
        Ok(resolved) => resolved,
        Err(Error::IsTestFile(_)) => {
            println!("It looks like this is a test, please submit a solution.");
            return Ok(());
        }
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };

    let code = match std::fs::read(&absolute) {
        Ok(code) => code,
        Err(e) => {
            println!("Error reading {}: {}", absolute.display(), e);
            return Ok(());
        }
    };

    let spinner = spinner("Submitting...")?;
    let submitted = api.submit(&relative, &code);
    spinner.finish_and_clear();

    match submitted {
        Ok(response) => println!(
            "For feedback on your submission visit {}/submissions/{}",
            config.api_host(),
            response.id
        ),
        Err(e) => println!(
            "{} {}",
            "There was an issue with your submission:".red(),
            e
        ),
    }
    Ok(())
}

fn handle_unsubmit(config: &Config) -> Result<()> {
    let Some(api) = authenticated_client(config)? else {
        return Ok(());
    };

    let spinner = spinner("Deleting last submission...")?;
    let deleted = api.unsubmit();
    spinner.finish_and_clear();

    match deleted {
        Ok(()) => println!("The last submission was successfully deleted."),
        Err(e) => println!("{}", e.to_string().red()),
    }
    Ok(())
}

fn handle_configure(
    mut config: Config,
    config_path: &Path,
    host: Option<String>,
    key: Option<String>,
    dir: Option<PathBuf>,
) -> Result<()> {
    let nothing_given = host.is_none() && key.is_none() && dir.is_none();
    if nothing_given && std::io::stdin().is_terminal() {
        // `Input::interact_text()` prompts with the current value as default.
        let host: String = Input::new()
            .with_prompt("API host")
            .default(config.hostname.clone())
            .interact_text()?;
        let key: String = Input::new()
            .with_prompt("API key")
            .default(config.api_key.clone())
            .allow_empty(true)
            .interact_text()?;
        let dir: String = Input::new()
            .with_prompt("Exercises directory")
            .default(config.dir.display().to_string())
            .interact_text()?;
        config.update(Some(host), Some(key), Some(PathBuf::from(dir)));
    } else {
        config.update(host, key, dir);
    }

    config.write(config_path).context("Saving configuration")?;
    println!("The configuration has been written to {}", config_path.display());
    println!("API host:  {}", config.hostname);
    println!("API key:   {}", mask_key(&config.api_key));
    println!("Exercises: {}", config.dir.display());
    Ok(())
}

fn handle_logout(mut config: Config, config_path: &Path) -> Result<()> {
    config.clear_api_key();
    config.write(config_path).context("Saving configuration")?;
    println!("Your API key has been cleared from {}", config_path.display());
    Ok(())
}

fn handle_debug(config: &Config, config_path: &Path) -> Result<()> {
    println!("**** Debug Information ****");
    println!("Version: {}", api::VERSION);
    println!("OS/Architecture: {}/{}", std::env::consts::OS, std::env::consts::ARCH);
    println!("User agent: {}", api::user_agent());
    println!("Config file: {}", config_path.display());
    println!("API host: {}", config.hostname);
    println!("API key: {}", mask_key(&config.api_key));
    println!("Exercises directory: {}", config.dir.display());
    Ok(())
}

/// Show only the last four characters of an API key.
fn mask_key(key: &str) -> String {
    if key.is_empty() {
        return "<not configured>".to_string();
    }
    let chars: Vec<char> = key.chars().collect();
    let visible = chars.len().min(4);
    let hidden = chars.len() - visible;
    let tail: String = chars[hidden..].iter().collect();
    format!("{}{}", "*".repeat(hidden), tail)
}
