// Configuration provider: a small JSON file holding the API host, the
// user's API key and the directory exercises are saved under.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_HOSTNAME: &str = "http://exercism.io";
const CONFIG_FILE_NAME: &str = ".exercism.json";
const DEFAULT_DIR_NAME: &str = "exercism";

/// Values read from the config file. Missing keys fall back to defaults
/// so that a partially written file still loads.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_hostname")]
    pub hostname: String,
    #[serde(rename = "apiKey", default)]
    pub api_key: String,
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
}

fn default_hostname() -> String {
    DEFAULT_HOSTNAME.to_string()
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_dir() -> PathBuf {
    home().join(DEFAULT_DIR_NAME)
}

/// Location of the config file when `--config` is not given.
pub fn default_path() -> PathBuf {
    home().join(CONFIG_FILE_NAME)
}

/// Replace a leading `~` with the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home().join(rest),
        Err(_) => path.to_path_buf(),
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            hostname: default_hostname(),
            api_key: String::new(),
            dir: default_dir(),
        }
    }
}

impl Config {
    /// Read the config at `path`. A missing file is not an error: the
    /// defaults are returned instead.
    pub fn read(path: &Path) -> Result<Self> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", path.display());
                return Ok(Config::default());
            }
            Err(source) => {
                return Err(Error::ConfigRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let mut config: Config =
            serde_json::from_slice(&data).map_err(|source| Error::ConfigFormat {
                path: path.to_path_buf(),
                source,
            })?;
        config.dir = expand_home(&config.dir);
        Ok(config)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let to_write_err = |source| Error::ConfigWrite {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(to_write_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(to_write_err)?;
        log::info!("wrote config to {}", path.display());
        Ok(())
    }

    /// Merge the given values over the current ones. `None` keeps what
    /// is already there.
    pub fn update(&mut self, hostname: Option<String>, api_key: Option<String>, dir: Option<PathBuf>) {
        if let Some(hostname) = hostname {
            self.hostname = hostname;
        }
        if let Some(api_key) = api_key {
            self.api_key = api_key;
        }
        if let Some(dir) = dir {
            self.dir = expand_home(&dir);
        }
    }

    pub fn clear_api_key(&mut self) {
        self.api_key.clear();
    }

    pub fn is_authenticated(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Hostname without a trailing slash, ready for path concatenation.
    pub fn api_host(&self) -> &str {
        self.hostname.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let config: Config = serde_json::from_str(r#"{"apiKey":"abc"}"#).unwrap();
        assert_eq!(config.hostname, DEFAULT_HOSTNAME);
        assert_eq!(config.api_key, "abc");
        assert!(config.is_authenticated());
    }

    #[test]
    fn missing_file_reads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::read(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::default());
        assert!(!config.is_authenticated());
    }

    #[test]
    fn malformed_file_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(Config::read(&path), Err(Error::ConfigFormat { .. })));
    }

    #[test]
    fn write_then_read_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = Config::default();
        config.update(
            Some("http://localhost:4567/".into()),
            Some("key".into()),
            Some(dir.path().join("exercises")),
        );
        config.write(&path).unwrap();

        let read = Config::read(&path).unwrap();
        assert_eq!(read, config);
        assert_eq!(read.api_host(), "http://localhost:4567");
    }

    #[test]
    fn cleared_key_is_written_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = Config::default();
        config.update(None, Some("secret".into()), None);
        config.write(&path).unwrap();

        let mut config = Config::read(&path).unwrap();
        config.clear_api_key();
        config.write(&path).unwrap();
        assert!(!Config::read(&path).unwrap().is_authenticated());
    }

    #[test]
    fn tilde_is_expanded() {
        let expanded = expand_home(Path::new("~/exercism"));
        assert_eq!(expanded, home().join("exercism"));
        assert_eq!(expand_home(Path::new("/abs/dir")), PathBuf::from("/abs/dir"));
    }
}
