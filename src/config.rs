use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fs, io};
use tracing::{debug, warn};

use crate::error::ConfigError;

pub const RC_FILE_NAME: &str = ".apimockrc";
pub const DEFAULT_DIR: &str = "mock";
pub const DEFAULT_PORT: u16 = 8080;

/// Final settings the server runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub dir: PathBuf,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_DIR),
            port: DEFAULT_PORT,
        }
    }
}

/// One configuration layer. Unset fields leave lower layers untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub dir: Option<PathBuf>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct RcFile {
    #[serde(default)]
    dir: Option<String>,
    #[serde(default)]
    port: Option<PortSetting>,
}

/// Ports may be written as `"8080"` or `8080`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortSetting {
    Number(u16),
    Text(String),
}

impl ServerConfig {
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(dir) = overrides.dir {
            self.dir = dir;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
    }

    /// Layers defaults, `$HOME/.apimockrc`, `./.apimockrc` and `cli` in that
    /// order. Rc files that are missing are skipped quietly, broken ones are
    /// skipped with a warning.
    pub fn resolve(home: Option<&Path>, cwd: &Path, cli: ConfigOverrides) -> Self {
        let mut config = Self::default();

        let rc_files = home
            .map(|home| home.join(RC_FILE_NAME))
            .into_iter()
            .chain(std::iter::once(cwd.join(RC_FILE_NAME)));

        for path in rc_files {
            match load_rc_file(&path) {
                Ok(Some(overrides)) => {
                    debug!(path = %path.display(), ?overrides, "applying config file");
                    config.apply(overrides);
                }
                Ok(None) => {}
                Err(err) => warn!(error = %err, "ignoring config file"),
            }
        }

        config.apply(cli);
        config
    }

    /// Checks that the mock directory exists and is a directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match fs::metadata(&self.dir) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(ConfigError::NotADirectory(self.dir.clone())),
            Err(_) => Err(ConfigError::MockDirMissing(self.dir.clone())),
        }
    }
}

/// Home directory as reported by the environment.
pub fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

/// Reads one rc file. The format is JSON; YAML is accepted as well.
/// Returns `Ok(None)` if the file does not exist.
pub fn load_rc_file(path: &Path) -> Result<Option<ConfigOverrides>, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::RcRead {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let rc: RcFile = serde_yaml::from_str(&contents).map_err(|source| ConfigError::RcParse {
        path: path.to_path_buf(),
        source,
    })?;

    let port = match rc.port {
        None => None,
        Some(PortSetting::Number(port)) => Some(port),
        Some(PortSetting::Text(text)) if text.trim().is_empty() => None,
        Some(PortSetting::Text(text)) => Some(
            text.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(text.clone()))?,
        ),
    };

    Ok(Some(ConfigOverrides {
        dir: rc.dir.filter(|dir| !dir.is_empty()).map(PathBuf::from),
        port,
    }))
}
