use std::path::PathBuf;

use thiserror::Error;

use crate::api::SubmissionResponse;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("error {context}: [{source}]")]
    Transport {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("error parsing API response: [{0}]")]
    Parse(#[from] serde_json::Error),
    #[error("error fetching assignments. HTTP status code: {status}\n{message}")]
    Fetch { status: u16, message: String },
    #[error("status: {status}, error: {}", .response.error)]
    Submit {
        status: u16,
        response: SubmissionResponse,
    },
    #[error("status: {status}, error: {message}")]
    Unsubmit { status: u16, message: String },
    #[error("error making directory {}: [{source}]", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("error writing file {}: [{source}]", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("refusing to write {0}: path escapes the exercise directory")]
    UnsafePath(String),
    #[error("couldn't find {}: {source}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not under your exercism project path ({})", .path.display(), .root.display())]
    OutsideProject { path: PathBuf, root: PathBuf },
    #[error("{} is not a valid UTF-8 path and can't be submitted", .0.display())]
    NonUtf8Path(PathBuf),
    #[error("it looks like {0} is a test, please submit a solution")]
    IsTestFile(String),
    #[error("couldn't read config file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("couldn't write config file {}: {source}", .path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config file {} is not valid JSON: {source}", .path.display())]
    ConfigFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
