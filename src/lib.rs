//! File based mock API server.
//!
//! Request paths map onto JSON files under a mock directory. A request for
//! `/users/42/profile` is answered by `users/42/profile.json`,
//! `users/42/profile/index.json`, or a wildcard route such as
//! `users/_/profile.json`, whichever is most specific. Mock files may be
//! plain JSON or a descriptor controlling method, status, delay, headers and
//! body; see [`descriptor`].

pub mod config;
pub mod descriptor;
pub mod error;
pub mod handler;
pub mod matcher;
pub mod server;
pub mod template;

pub use config::ServerConfig;
pub use error::{ConfigError, MockError};
pub use matcher::{PathParams, RouteMatch, RouteTemplate, find_mock};
