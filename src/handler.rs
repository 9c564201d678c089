use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{error, info, warn};
use warp::Filter;
use warp::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW,
    CONTENT_TYPE, HeaderMap, HeaderValue,
};
use warp::http::{Method, Response, StatusCode};
use warp::hyper::Body;

use crate::descriptor::{JSON_CONTENT_TYPE, MockFile};
use crate::error::MockError;
use crate::matcher::find_mock;

pub const LIVENESS_MESSAGE: &str = "apimock server is running!";
pub const CORS_ALLOW_METHODS: &str = "GET,POST,PUT,PATCH,DELETE,HEAD,OPTIONS";

pub fn routes(
    mock_dir: PathBuf,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let mock_dir = warp::any().map(move || mock_dir.clone());

    warp::path::full()
        .and(warp::method())
        .and(mock_dir)
        .and_then(handle_request)
}

pub async fn handle_request(
    path: warp::path::FullPath,
    method: Method,
    mock_dir: PathBuf,
) -> Result<Response<Body>, warp::Rejection> {
    if path.as_str() == "/" {
        let mut response = Response::new(Body::from(LIVENESS_MESSAGE));
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        return Ok(response);
    }

    let mut response = if method == Method::OPTIONS {
        Response::new(Body::empty())
    } else {
        let request_path = path.as_str().strip_prefix('/').unwrap_or(path.as_str());
        match serve_mock(&mock_dir, request_path, &method).await {
            Ok(response) => response.map(Body::from),
            Err(err) => error_response(&err),
        }
    };
    allow_cors(response.headers_mut());

    info!(
        %method,
        path = path.as_str(),
        status = response.status().as_u16(),
        "handled request"
    );
    Ok(response)
}

/// Resolves `request_path` (no leading `/`) to a mock file under `mock_dir`
/// and renders it for `method`.
pub async fn serve_mock(
    mock_dir: &Path,
    request_path: &str,
    method: &Method,
) -> Result<Response<Bytes>, MockError> {
    let root = mock_dir.to_path_buf();
    let lookup = request_path.to_string();
    let found = tokio::task::spawn_blocking(move || find_mock(&root, &lookup))
        .await
        .map_err(|err| {
            error!(error = %err, "mock store scan failed");
            MockError::Scan
        })?
        .ok_or(MockError::NotFound)?;

    let raw = tokio::fs::read(&found.file)
        .await
        .map_err(|source| MockError::FileRead {
            path: found.file.clone(),
            source,
        })?;

    MockFile::parse(Bytes::from(raw))
        .respond(method, &found.params)
        .await
}

fn error_response(err: &MockError) -> Response<Body> {
    if err.status() == StatusCode::INTERNAL_SERVER_ERROR {
        warn!(error = ?err, "failed to serve mock");
    }

    let mut response = Response::new(Body::from(err.body().to_string()));
    *response.status_mut() = err.status();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    if let MockError::MethodNotAllowed { allowed } = err {
        if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
            headers.insert(ALLOW, value);
        }
    }
    response
}

fn allow_cors(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
}
