// API client module: a small blocking HTTP client that talks to the
// exercise service. Each operation is exactly one request; nothing is
// retried.

use std::borrow::Cow;

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::assignment::Assignment;
use crate::config::Config;
use crate::error::{Error, Result};

pub const CLIENT_NAME: &str = "exercism-cli";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const USER_ASSIGNMENTS: &str = "/api/v1/user/assignments";
const ASSIGNMENTS: &str = "/api/v1/assignments";

/// `User-Agent` value sent with every request, e.g.
/// `exercism-cli v0.1.0 (linux/x86_64)`.
pub fn user_agent() -> String {
    format!(
        "{} v{} ({}/{})",
        CLIENT_NAME,
        VERSION,
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Which set of assignments a fetch asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Current,
    Next,
    Restore,
    /// One demo problem per language track. Needs no API key.
    Demo,
    /// Specific exercises, each argument appended as a path segment.
    Exercises(Vec<String>),
}

impl Endpoint {
    /// Pick the endpoint for `fetch`: explicit exercises win, then
    /// `--next`, otherwise the current assignments.
    pub fn for_fetch(args: &[String], next: bool) -> Self {
        if !args.is_empty() {
            Endpoint::Exercises(args.to_vec())
        } else if next {
            Endpoint::Next
        } else {
            Endpoint::Current
        }
    }

    pub fn path(&self) -> String {
        match self {
            Endpoint::Current => format!("{}/current", USER_ASSIGNMENTS),
            Endpoint::Next => format!("{}/next", USER_ASSIGNMENTS),
            Endpoint::Restore => format!("{}/restore", USER_ASSIGNMENTS),
            Endpoint::Demo => format!("{}/demo", ASSIGNMENTS),
            Endpoint::Exercises(ids) => ids
                .iter()
                .fold(ASSIGNMENTS.to_string(), |path, id| format!("{}/{}", path, id)),
        }
    }
}

/// Body of a submission POST.
#[derive(Serialize, Debug)]
pub struct SubmissionRequest<'a> {
    pub key: &'a str,
    pub code: Cow<'a, str>,
    pub path: &'a str,
}

/// What the service answers to a submission. On failure only `error`
/// is usually filled in.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct SubmissionResponse {
    pub id: String,
    pub status: String,
    pub language: String,
    pub exercise: String,
    pub submission_path: String,
    pub error: String,
}

/// Error body of a failed request. The unsubmit endpoint capitalises
/// the key, the others don't.
#[derive(Deserialize, Debug, Default)]
struct ApiError {
    #[serde(default, alias = "Error")]
    error: String,
}

#[derive(Deserialize, Debug)]
struct AssignmentsResponse {
    #[serde(default, alias = "Assignments")]
    assignments: Vec<Assignment>,
}

/// Interpret the answer to a fetch. Anything but 200 is a fetch error
/// carrying whatever message the body held.
pub fn read_assignments(status: StatusCode, body: &[u8]) -> Result<Vec<Assignment>> {
    if status != StatusCode::OK {
        let message = match serde_json::from_slice::<ApiError>(body) {
            Ok(api_error) => api_error.error,
            Err(e) => format!("error parsing API response: [{}]", e),
        };
        return Err(Error::Fetch {
            status: status.as_u16(),
            message,
        });
    }
    let response: AssignmentsResponse = serde_json::from_slice(body)?;
    Ok(response.assignments)
}

/// Interpret the answer to a submission: 201 is the only success.
pub fn read_submission(status: StatusCode, body: &[u8]) -> Result<SubmissionResponse> {
    if status != StatusCode::CREATED {
        let response = serde_json::from_slice(body).unwrap_or_else(|_| SubmissionResponse {
            error: String::from_utf8_lossy(body).trim().to_string(),
            ..SubmissionResponse::default()
        });
        return Err(Error::Submit {
            status: status.as_u16(),
            response,
        });
    }
    Ok(serde_json::from_slice(body)?)
}

/// Interpret the answer to an unsubmit: 204 is the only success.
pub fn read_unsubmit(status: StatusCode, body: &[u8]) -> Result<()> {
    if status == StatusCode::NO_CONTENT {
        return Ok(());
    }
    let api_error: ApiError = serde_json::from_slice(body)?;
    Err(Error::Unsubmit {
        status: status.as_u16(),
        message: api_error.error,
    })
}

/// Blocking client bound to one host and API key.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    host: String,
    api_key: String,
}

impl ApiClient {
    /// Build a client for the host and key in `config`, sending
    /// `user_agent` with every request.
    pub fn new(config: &Config, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|source| Error::Transport {
                context: "building HTTP client",
                source,
            })?;
        Ok(ApiClient {
            client,
            host: config.api_host().to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    /// GET the assignments behind `endpoint`.
    pub fn fetch(&self, endpoint: &Endpoint) -> Result<Vec<Assignment>> {
        let url = self.url(&endpoint.path());
        log::debug!("GET {}", url);
        let res = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send();
        let (status, body) = read_body(res, "fetching assignments")?;
        read_assignments(status, &body)
    }

    /// POST a solution. `relative_path` is the file's path below the
    /// exercise directory.
    pub fn submit(&self, relative_path: &str, code: &[u8]) -> Result<SubmissionResponse> {
        let url = self.url(USER_ASSIGNMENTS);
        log::debug!("POST {} ({} bytes of {})", url, code.len(), relative_path);
        let submission = SubmissionRequest {
            key: &self.api_key,
            code: String::from_utf8_lossy(code),
            path: relative_path,
        };
        let res = self.client.post(&url).json(&submission).send();
        let (status, body) = read_body(res, "posting assignment")?;
        read_submission(status, &body)
    }

    /// DELETE the most recent submission.
    pub fn unsubmit(&self) -> Result<()> {
        let url = self.url(USER_ASSIGNMENTS);
        log::debug!("DELETE {}", url);
        let res = self
            .client
            .delete(&url)
            .query(&[("key", self.api_key.as_str())])
            .send();
        let (status, body) = read_body(res, "destroying submission")?;
        read_unsubmit(status, &body)
    }
}

fn read_body(
    res: reqwest::Result<Response>,
    context: &'static str,
) -> Result<(StatusCode, Vec<u8>)> {
    let to_transport = |source| Error::Transport { context, source };
    let res = res.map_err(to_transport)?;
    let status = res.status();
    let body = res.bytes().map_err(to_transport)?;
    log::debug!("{} -> {} ({} bytes)", context, status, body.len());
    Ok((status, body.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_paths() {
        assert_eq!(Endpoint::Current.path(), "/api/v1/user/assignments/current");
        assert_eq!(Endpoint::Restore.path(), "/api/v1/user/assignments/restore");
        assert_eq!(Endpoint::Demo.path(), "/api/v1/assignments/demo");
        let ids = vec!["ruby".to_string(), "bob".to_string()];
        assert_eq!(
            Endpoint::Exercises(ids.clone()).path(),
            "/api/v1/assignments/ruby/bob"
        );
        assert_eq!(Endpoint::for_fetch(&[], false), Endpoint::Current);
        assert_eq!(Endpoint::for_fetch(&[], true), Endpoint::Next);
        assert_eq!(Endpoint::for_fetch(&ids, true), Endpoint::Exercises(ids));
    }

    #[test]
    fn user_agent_names_client_and_platform() {
        let ua = user_agent();
        assert!(ua.starts_with("exercism-cli v"));
        assert!(ua.ends_with(&format!(
            "({}/{})",
            std::env::consts::OS,
            std::env::consts::ARCH
        )));
    }

    #[test]
    fn fetch_ok_parses_assignments() {
        let body = br#"{"assignments":[
            {"track":"ruby","slug":"bob","files":{"bob_test.rb":"test","README.md":"readme"},"fresh":true}
        ]}"#;
        let assignments = read_assignments(StatusCode::OK, body).unwrap();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].track, "ruby");
        assert!(assignments[0].is_fresh);
    }

    #[test]
    fn fetch_failure_carries_status_and_message() {
        let err = read_assignments(StatusCode::UNAUTHORIZED, br#"{"error":"bad key"}"#).unwrap_err();
        match err {
            Error::Fetch { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "bad key");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn fetch_failure_with_html_body_is_still_fetch_error() {
        let err = read_assignments(StatusCode::BAD_GATEWAY, b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, Error::Fetch { status: 502, .. }));
    }

    #[test]
    fn fetch_ok_with_garbage_is_parse_error() {
        let err = read_assignments(StatusCode::OK, b"not json").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn submit_created_returns_response() {
        let response = read_submission(StatusCode::CREATED, br#"{"id":"42","status":"ok"}"#).unwrap();
        assert_eq!(response.id, "42");
        assert_eq!(response.status, "ok");
        assert!(response.error.is_empty());
    }

    #[test]
    fn submit_rejected_is_submit_error() {
        let err = read_submission(StatusCode::UNPROCESSABLE_ENTITY, br#"{"error":"bad file"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("bad file"));
        match err {
            Error::Submit { status, response } => {
                assert_eq!(status, 422);
                assert_eq!(response.error, "bad file");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn submit_rejected_with_plain_text_keeps_body() {
        let err = read_submission(StatusCode::INTERNAL_SERVER_ERROR, b"boom\n").unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn submit_created_with_garbage_is_parse_error() {
        let err = read_submission(StatusCode::CREATED, b"<html>").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn unsubmit_status_mapping() {
        assert!(read_unsubmit(StatusCode::NO_CONTENT, b"").is_ok());

        let err = read_unsubmit(StatusCode::NOT_FOUND, br#"{"Error":"not found"}"#).unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(matches!(err, Error::Unsubmit { status: 404, .. }));

        let err = read_unsubmit(StatusCode::NOT_FOUND, b"nope").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn submission_request_shape() {
        let req = SubmissionRequest {
            key: "abc",
            code: Cow::Borrowed("puts 1"),
            path: "ruby/bob/bob.rb",
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"key":"abc","code":"puts 1","path":"ruby/bob/bob.rb"})
        );
    }
}
