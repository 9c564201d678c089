use std::path::PathBuf;

use serde_json::{Value, json};
use thiserror::Error;
use warp::http::StatusCode;

/// Failures raised while answering a single request. Every variant is turned
/// into an HTTP response by the handler; none of them stop the server.
#[derive(Debug, Error)]
pub enum MockError {
    #[error("no mock file matches the request path")]
    NotFound,

    #[error("method not allowed, expected one of: {}", .allowed.join(", "))]
    MethodNotAllowed { allowed: Vec<String> },

    #[error("failed to read mock file {path:?}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("mock declares invalid status code {0}")]
    InvalidStatus(u16),

    #[error("mock store scan was interrupted")]
    Scan,
}

impl MockError {
    pub fn status(&self) -> StatusCode {
        match self {
            MockError::NotFound => StatusCode::NOT_FOUND,
            MockError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            MockError::FileRead { .. } | MockError::InvalidStatus(_) | MockError::Scan => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Structured JSON body sent to the client.
    pub fn body(&self) -> Value {
        match self {
            MockError::NotFound => json!({ "error": "Not Found" }),
            MockError::MethodNotAllowed { allowed } => json!({
                "error": "Method Not Allowed",
                "allow": allowed.join(", "),
            }),
            MockError::FileRead { .. } | MockError::InvalidStatus(_) | MockError::Scan => {
                json!({ "error": "Server Error" })
            }
        }
    }
}

/// Startup failures. These are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "mock directory {0:?} not found, specify it with --dir or set \"dir\" in .apimockrc"
    )]
    MockDirMissing(PathBuf),

    #[error("mock path {0:?} is not a directory")]
    NotADirectory(PathBuf),

    #[error("failed to read config file {path:?}")]
    RcRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}")]
    RcParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid port {0:?}")]
    InvalidPort(String),
}
