// src/config.rs

use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::auth::{Caller, NonceIssuer, Role};
use crate::logging;

pub const CONFIG_FILE: &str = "tls-compat-checker.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub operator: OperatorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading config: {}", path.display()))?;
        Self::from_toml(&raw).wrap_err_with(|| format!("parsing config: {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Uses `user` if given, then `./tls-compat-checker.toml`, then the project
    /// config directory, and finally built-in defaults.
    pub fn resolve(user: Option<&Path>) -> Result<Self> {
        if let Some(path) = user {
            return Self::load(path);
        }
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Self::load(&local);
        }
        if let Some(global) = logging::get_config_dir().map(|d| d.join(CONFIG_FILE)) {
            if global.exists() {
                return Self::load(&global);
            }
        }
        Ok(Self::default())
    }

    pub fn store_file(&self) -> PathBuf {
        self.paths
            .store_file
            .clone()
            .unwrap_or_else(|| logging::get_data_dir().join("results.json"))
    }

    pub fn operator(&self) -> Caller {
        Caller {
            user: self.operator.user.clone(),
            role: self.operator.role,
        }
    }

    pub fn nonce_issuer(&self) -> NonceIssuer {
        let lifetime = Duration::from_secs(self.auth.nonce_lifetime_secs);
        match &self.auth.secret {
            Some(secret) if !secret.is_empty() => NonceIssuer::new(secret.as_bytes(), lifetime),
            _ => NonceIssuer::ephemeral(lifetime),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub content_root: PathBuf,
    pub store_file: Option<PathBuf>,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            content_root: PathBuf::from("."),
            store_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub extensions: Vec<String>,
    pub skip_dirs: Vec<String>,
    pub ignored_hosts: Vec<String>,
    pub max_file_bytes: u64,
    pub follow_links: bool,
}
impl Default for ExtractConfig {
    fn default() -> Self {
        let strings = |list: &[&str]| -> Vec<String> { list.iter().map(|s| s.to_string()).collect() };
        Self {
            extensions: strings(&[
                "php", "inc", "js", "mjs", "json", "html", "htm", "twig", "xml", "yml", "yaml", "ini",
            ]),
            skip_dirs: strings(&[".git", ".svn", "node_modules", "uploads", "cache"]),
            ignored_hosts: strings(&[
                "localhost",
                "127.0.0.1",
                "0.0.0.0",
                "::1",
                "example.com",
                "example.org",
                "example.net",
                "w3.org",
                "purl.org",
                "schema.org",
                "json-schema.org",
                "ns.adobe.com",
                "schemas.xmlsoap.org",
                "schemas.microsoft.com",
            ]),
            max_file_bytes: 2 * 1024 * 1024,
            follow_links: false,
        }
    }
}

/// Lowest protocol version a server must negotiate to pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinTlsVersion {
    #[serde(rename = "1.0")]
    Tls10,
    #[serde(rename = "1.1")]
    Tls11,
    #[serde(rename = "1.2")]
    Tls12,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub timeout_secs: u64,
    pub min_tls_version: MinTlsVersion,
    /// When false only protocol support is measured; certificate problems do not fail a URL.
    pub verify_certificates: bool,
}
impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            min_tls_version: MinTlsVersion::Tls12,
            verify_certificates: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub secret: Option<String>,
    pub nonce_lifetime_secs: u64,
}
impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: None,
            nonce_lifetime_secs: 24 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    pub user: String,
    pub role: Role,
}
impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            user: "admin".into(),
            role: Role::Administrator,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg.probe.min_tls_version, MinTlsVersion::Tls12);
        assert_eq!(cfg.operator.role, Role::Administrator);
        assert!(cfg.extract.extensions.iter().any(|e| e == "php"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = Config::from_toml(
            r#"
            [paths]
            content_root = "/srv/site/wp-content"

            [probe]
            min_tls_version = "1.1"

            [operator]
            user = "ops"
            role = "editor"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.paths.content_root, PathBuf::from("/srv/site/wp-content"));
        assert_eq!(cfg.probe.min_tls_version, MinTlsVersion::Tls11);
        assert_eq!(cfg.probe.timeout_secs, 10);
        assert_eq!(cfg.operator().role, Role::Editor);
        assert_eq!(cfg.auth.nonce_lifetime_secs, 86_400);
    }

    #[test]
    fn unknown_tls_version_is_rejected() {
        assert!(Config::from_toml("[probe]\nmin_tls_version = \"1.3\"").is_err());
    }
}
