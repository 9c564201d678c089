//! Mock file contents and how they become responses.
//!
//! A mock file is either a descriptor (an object with any of the `method`,
//! `status`, `delay`, `headers` and `body` keys) or plain JSON that is served
//! as is.
//!
//! ```json
//! {
//!   "method": ["GET"],
//!   "status": 200,
//!   "delay": 250,
//!   "headers": { "X-User": "{path.0}" },
//!   "body": { "id": "{path.0}" }
//! }
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use bytes::Bytes;
use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use warp::http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use warp::http::{Method, Response, StatusCode};

use crate::error::MockError;
use crate::matcher::PathParams;
use crate::template::expand;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const OPAQUE_CONTENT_TYPE: &str = "application/json";

const DESCRIPTOR_KEYS: [&str; 5] = ["method", "status", "delay", "headers", "body"];

/// Parsed contents of a mock file.
#[derive(Debug)]
pub enum MockFile {
    Descriptor(MockDescriptor),
    /// Anything that is not a descriptor, kept byte for byte.
    Opaque(Bytes),
}

#[derive(Debug, Default, Deserialize)]
pub struct MockDescriptor {
    /// Allowed methods; empty allows every method.
    #[serde(default, rename = "method")]
    pub methods: Vec<String>,
    /// `0` means default.
    #[serde(default)]
    pub status: u16,
    #[serde(default, rename = "delay")]
    pub delay_millis: u64,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<Box<RawValue>>,
}

impl MockFile {
    pub fn parse(raw: Bytes) -> Self {
        match MockDescriptor::from_slice(&raw) {
            Some(descriptor) => MockFile::Descriptor(descriptor),
            None => {
                debug!("mock file is not a descriptor, serving it verbatim");
                MockFile::Opaque(raw)
            }
        }
    }

    /// Renders the mock for one request. `params` are the values captured by
    /// the route that selected this file.
    pub async fn respond(
        self,
        method: &Method,
        params: &PathParams,
    ) -> Result<Response<Bytes>, MockError> {
        match self {
            MockFile::Descriptor(descriptor) => descriptor.respond(method, params).await,
            MockFile::Opaque(raw) => {
                let mut response = Response::new(raw);
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static(OPAQUE_CONTENT_TYPE));
                Ok(response)
            }
        }
    }
}

impl MockDescriptor {
    /// Parses `raw` as a descriptor. Returns `None` when it is not a JSON
    /// object, carries none of the descriptor keys, or has a key of the
    /// wrong type.
    pub fn from_slice(raw: &[u8]) -> Option<Self> {
        let fields: Map<String, Value> = serde_json::from_slice(raw).ok()?;
        if !fields.keys().any(|key| DESCRIPTOR_KEYS.contains(&key.as_str())) {
            return None;
        }
        serde_json::from_slice(raw).ok()
    }

    pub fn allows(&self, method: &Method) -> bool {
        self.methods.is_empty() || self.methods.iter().any(|m| m == method.as_str())
    }

    pub fn delay(&self) -> Option<Duration> {
        (self.delay_millis > 0).then(|| Duration::from_millis(self.delay_millis))
    }

    async fn respond(
        self,
        method: &Method,
        params: &PathParams,
    ) -> Result<Response<Bytes>, MockError> {
        if !self.allows(method) {
            return Err(MockError::MethodNotAllowed {
                allowed: self.methods,
            });
        }

        if let Some(delay) = self.delay() {
            debug!(delay_ms = self.delay_millis, "delaying response");
            tokio::time::sleep(delay).await;
        }

        let mut status = match self.status {
            0 => StatusCode::OK,
            code => StatusCode::from_u16(code).map_err(|_| MockError::InvalidStatus(code))?,
        };

        let mut response = Response::new(Bytes::new());
        for (name, value) in &self.headers {
            let value = expand(value, params);
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().insert(name, value);
                }
                _ => warn!(header = %name, value = %value, "skipping invalid mock header"),
            }
        }

        let body = match self.body.as_ref().filter(|body| body.get() != "null") {
            Some(body) => body,
            None => {
                if status == StatusCode::OK {
                    status = StatusCode::NO_CONTENT;
                }
                *response.status_mut() = status;
                return Ok(response);
            }
        };

        response
            .headers_mut()
            .entry(CONTENT_TYPE)
            .or_insert(HeaderValue::from_static(JSON_CONTENT_TYPE));
        *response.status_mut() = status;
        *response.body_mut() = Bytes::from(expand(body.get(), params).into_owned());
        Ok(response)
    }
}
