//! Service locations and client settings.
//!
//! Loaded from TOML. A missing file means defaults, which point at the
//! services on localhost.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_ENV: &str = "DOCFLOW_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auth_url: String,
    pub documents_url: String,
    pub approval_url: String,
    pub templates_url: String,
    pub request_timeout_secs: u64,
    pub session_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            auth_url: "http://localhost:8081".to_owned(),
            documents_url: "http://localhost:8082".to_owned(),
            approval_url: "http://localhost:8083".to_owned(),
            templates_url: "http://localhost:8084".to_owned(),
            request_timeout_secs: 30,
            session_file: default_session_file(),
        }
    }
}

fn default_session_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docflow")
        .join("session.json")
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("auth_url", &self.auth_url),
            ("documents_url", &self.documents_url),
            ("approval_url", &self.approval_url),
            ("templates_url", &self.templates_url),
        ] {
            let url = url::Url::parse(value)
                .map_err(|err| Error::Config(format!("`{}` = `{}`: {}", name, value, err)))?;
            if url.cannot_be_a_base() {
                return Err(Error::Config(format!(
                    "`{}` = `{}` is not a base URL",
                    name, value
                )));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "`request_timeout_secs` must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    /// Environment variables win over the file.
    pub fn apply_env_overrides(&mut self) {
        let overrides = [
            ("DOCFLOW_AUTH_URL", &mut self.auth_url),
            ("DOCFLOW_DOCUMENTS_URL", &mut self.documents_url),
            ("DOCFLOW_APPROVAL_URL", &mut self.approval_url),
            ("DOCFLOW_TEMPLATES_URL", &mut self.templates_url),
        ];
        for (var, field) in overrides {
            if let Ok(value) = env::var(var) {
                log::debug!("Using {} from the environment", var);
                *field = value;
            }
        }
    }
}

pub struct ConfigLoader {
    search_paths: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        let mut search_paths = vec![PathBuf::from("./docflow.toml")];
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("docflow").join("config.toml"));
        }
        Self { search_paths }
    }

    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// Load from `config_file`, `$DOCFLOW_CONFIG` or the first file found.
    pub fn load(&self, config_file: Option<&Path>) -> Result<Config> {
        let path = match config_file {
            Some(path) => Some(path.to_path_buf()),
            None => match env::var(CONFIG_ENV) {
                Ok(path) => Some(PathBuf::from(path)),
                Err(_) => self.find_config_file(),
            },
        };

        let mut config = match path {
            Some(path) => self.load_from_file(&path)?,
            None => {
                log::debug!("No configuration file found, using defaults");
                Config::default()
            }
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(&self, path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|err| {
            Error::Config(format!("Failed to read `{}`: {}", path.display(), err))
        })?;
        let content = substitute_env_vars(&content)?;
        let config = toml::from_str::<Config>(&content)
            .map_err(|err| Error::Config(format!("`{}`: {}", path.display(), err)))?;
        log::debug!("Loaded configuration from `{}`", path.display());
        Ok(config)
    }

    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.search_paths
            .iter()
            .find(|path| path.is_file())
            .cloned()
    }
}

/// Replace `${VAR}` and `${VAR:-default}` with values from the environment.
///
/// `#` comments are copied as they are.
fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]*))?\}")
        .map_err(|err| Error::Config(err.to_string()))?;
    let mut missing = None;
    let mut result = String::with_capacity(content.len());
    for line in content.split_inclusive('\n') {
        let (code, comment) = line.split_at(comment_start(line).unwrap_or(line.len()));
        let code = re.replace_all(code, |caps: &regex::Captures| {
            let name = &caps[1];
            match (env::var(name), caps.get(3)) {
                (Ok(value), _) => value,
                (Err(_), Some(default)) => default.as_str().to_owned(),
                (Err(_), None) => {
                    missing.get_or_insert_with(|| name.to_owned());
                    String::new()
                }
            }
        });
        result.push_str(&code);
        result.push_str(comment);
    }
    match missing {
        Some(name) => Err(Error::Config(format!(
            "Environment variable `{}` is not set",
            name
        ))),
        None => Ok(result),
    }
}

/// Byte offset of a `#` that starts a comment, ignoring any inside strings.
fn comment_start(line: &str) -> Option<usize> {
    let mut quote = None;
    let mut escaped = false;
    for (index, ch) in line.char_indices() {
        match quote {
            Some('"') if escaped => escaped = false,
            Some('"') if ch == '\\' => escaped = true,
            Some(open) if ch == open => quote = None,
            Some(_) => {}
            None if ch == '#' => return Some(index),
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None => {}
        }
    }
    None
}
