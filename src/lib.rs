// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) parses arguments, sets up logging and hands over to `ui`.
//
// Module responsibilities:
// - `api`: blocking HTTP client for fetching assignments, submitting a
//   solution and deleting the last submission.
// - `assignment`: the assignment model and the save engine that writes
//   files under the exercise directory without overwriting anything.
// - `submission`: turns a user-supplied path into the relative path the
//   service expects and refuses test files.
// - `config`: the JSON config file (host, API key, exercise directory).
// - `cli` / `logger`: argument parsing and log setup.
// - `ui`: command handlers that print results for the user.
pub mod api;
pub mod assignment;
pub mod cli;
pub mod config;
pub mod error;
pub mod logger;
pub mod submission;
pub mod ui;

pub use error::{Error, Result};
