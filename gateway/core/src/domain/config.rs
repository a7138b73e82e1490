// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Gateway Configuration
//!
//! YAML configuration for one EOS instance: which transport to use, where the
//! MGM lives, how to authenticate and which namespace behaviors to enable.
//!
//! # Discovery order
//!
//! 1. Explicit `--config` path (fails if missing or invalid)
//! 2. `EOSGATE_CONFIG_PATH`
//! 3. `./eosgate.yaml`
//! 4. `~/.eosgate/config.yaml`
//! 5. `/etc/eosgate/config.yaml`
//!
//! Falls back to defaults when nothing is found. Environment overrides are
//! applied last in every case.
//!
//! # Example
//!
//! ```yaml
//! backend: grpc
//! master_url: root://eos-mgm.example.org
//! grpc_uri: http://eos-mgm.example.org:50051
//! http:
//!   url: https://eos-mgm.example.org:8443
//! authkey: changeme
//! version_invariant: true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::acl::AclCodec;
use crate::domain::auth::Authorization;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "EOSGATE_CONFIG_PATH";

/// Transport used for namespace operations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// `eos` and `xrdcopy` subprocesses
    #[default]
    Binary,
    /// MGM gRPC service, XrdHTTP for data
    Grpc,
}

/// ACL dialect selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AclCodecSetting {
    /// Ask the MGM for its version at connect time
    #[default]
    Auto,
    Citrine,
    Legacy,
}

impl AclCodecSetting {
    /// Forced codec, if any
    pub fn forced(&self) -> Option<AclCodec> {
        match self {
            AclCodecSetting::Auto => None,
            AclCodecSetting::Citrine => Some(AclCodec::Citrine),
            AclCodecSetting::Legacy => Some(AclCodec::Legacy),
        }
    }
}

/// XrdHTTP data endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Base URL, e.g. `https://eos-mgm.example.org:8443`
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,

    /// Retries of a request that timed out
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_max_redirects")]
    pub max_redirects: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_http_timeout(),
            max_retries: default_max_retries(),
            max_redirects: default_max_redirects(),
        }
    }
}

/// Namespace behaviors layered on top of the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Expose the version folder's inode as the file's identity
    pub version_invariant: bool,
    /// Keep `.sys.v#.` folders in listings
    pub show_hidden_sys_files: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            version_invariant: true,
            show_hidden_sys_files: false,
        }
    }
}

/// EOS client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EosClientConfig {
    #[serde(default)]
    pub backend: TransportKind,

    /// MGM address handed to the CLI as `EOS_MGM_URL`
    #[serde(default = "default_master_url")]
    pub master_url: String,

    #[serde(default = "default_eos_binary")]
    pub eos_binary: String,

    #[serde(default = "default_xrdcopy_binary")]
    pub xrdcopy_binary: String,

    /// gRPC endpoint; required for the gRPC backend
    #[serde(default)]
    pub grpc_uri: Option<String>,

    #[serde(default)]
    pub http: HttpConfig,

    /// Shared secret the MGM expects on gRPC requests
    #[serde(default)]
    pub authkey: Option<String>,

    #[serde(default = "default_true")]
    pub version_invariant: bool,

    #[serde(default)]
    pub show_hidden_sys_files: bool,

    #[serde(default)]
    pub acl_codec: AclCodecSetting,

    /// Upper bound of one CLI invocation
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    /// Scratch space for `xrdcopy` transfers
    #[serde(default = "default_cache_directory")]
    pub cache_directory: PathBuf,

    #[serde(default)]
    pub use_keytab: bool,

    #[serde(default)]
    pub keytab: Option<String>,

    #[serde(default = "default_sec_protocol")]
    pub sec_protocol: String,

    /// Identity used for gateway-internal calls (version folder creation)
    #[serde(default)]
    pub root_uid: u64,

    #[serde(default)]
    pub root_gid: u64,
}

fn default_true() -> bool {
    true
}

fn default_master_url() -> String {
    "root://localhost".to_string()
}

fn default_eos_binary() -> String {
    "/usr/bin/eos".to_string()
}

fn default_xrdcopy_binary() -> String {
    "/opt/eos/xrootd/bin/xrdcopy".to_string()
}

fn default_http_timeout() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_redirects() -> u32 {
    10
}

fn default_command_timeout() -> u64 {
    60
}

fn default_cache_directory() -> PathBuf {
    std::env::temp_dir()
}

fn default_sec_protocol() -> String {
    "sss".to_string()
}

impl Default for EosClientConfig {
    fn default() -> Self {
        Self {
            backend: TransportKind::default(),
            master_url: default_master_url(),
            eos_binary: default_eos_binary(),
            xrdcopy_binary: default_xrdcopy_binary(),
            grpc_uri: None,
            http: HttpConfig::default(),
            authkey: None,
            version_invariant: true,
            show_hidden_sys_files: false,
            acl_codec: AclCodecSetting::default(),
            command_timeout_secs: default_command_timeout(),
            cache_directory: default_cache_directory(),
            use_keytab: false,
            keytab: None,
            sec_protocol: default_sec_protocol(),
            root_uid: 0,
            root_gid: 0,
        }
    }
}

impl EosClientConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Find a configuration file in the standard locations
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./eosgate.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".eosgate").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/eosgate/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load from an explicit path, else discover, else defaults
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("EOSGATE_MASTER_URL") {
            tracing::info!("Environment override: EOSGATE_MASTER_URL={}", url);
            self.master_url = url;
        }

        if let Ok(uri) = std::env::var("EOSGATE_GRPC_URI") {
            tracing::info!("Environment override: EOSGATE_GRPC_URI={}", uri);
            self.grpc_uri = Some(uri);
        }

        if let Ok(val) = std::env::var("EOSGATE_VERSION_INVARIANT") {
            match parse_bool(&val) {
                Some(enabled) => {
                    tracing::info!("Environment override: EOSGATE_VERSION_INVARIANT={}", enabled);
                    self.version_invariant = enabled;
                }
                None => tracing::warn!(
                    "Invalid value for EOSGATE_VERSION_INVARIANT: '{}'. Expected true/false. Ignoring.",
                    val
                ),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.master_url.is_empty() {
            anyhow::bail!("master_url cannot be empty");
        }

        if !["root://", "http://", "https://"]
            .iter()
            .any(|scheme| self.master_url.starts_with(scheme))
        {
            anyhow::bail!(
                "Invalid master_url: '{}'. Must start with root://, http:// or https://",
                self.master_url
            );
        }

        if self.backend == TransportKind::Grpc && self.grpc_uri.as_deref().unwrap_or("").is_empty() {
            anyhow::bail!("grpc_uri is required when backend is 'grpc'");
        }

        if self.use_keytab && self.keytab.as_deref().unwrap_or("").is_empty() {
            anyhow::bail!("keytab is required when use_keytab is enabled");
        }

        if self.command_timeout_secs == 0 {
            anyhow::bail!("command_timeout_secs must be greater than 0");
        }

        if self.http.timeout_secs == 0 {
            anyhow::bail!("http.timeout_secs must be greater than 0");
        }

        if let Some(url) = &self.http.url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("Invalid http.url: '{}'. Must be an http(s) URL", url);
            }
        }

        Ok(())
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            version_invariant: self.version_invariant,
            show_hidden_sys_files: self.show_hidden_sys_files,
        }
    }

    /// Identity for gateway-internal calls
    pub fn root_authorization(&self) -> Authorization {
        Authorization::with_role(self.root_uid, self.root_gid)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EosClientConfig::default();
        assert_eq!(config.backend, TransportKind::Binary);
        assert!(config.version_invariant);
        assert!(!config.show_hidden_sys_files);
        assert_eq!(config.sec_protocol, "sss");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_yaml_fills_defaults() {
        let config = EosClientConfig::from_yaml_str("master_url: root://eos.example.org\n").unwrap();
        assert_eq!(config.master_url, "root://eos.example.org");
        assert_eq!(config.eos_binary, "/usr/bin/eos");
        assert_eq!(config.http.max_retries, 3);
        assert_eq!(config.acl_codec, AclCodecSetting::Auto);
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "backend: grpc\nmaster_url: root://mgm\ngrpc_uri: http://mgm:50051\nacl_codec: legacy\nversion_invariant: false"
        )
        .unwrap();

        let config = EosClientConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.backend, TransportKind::Grpc);
        assert_eq!(config.acl_codec.forced(), Some(AclCodec::Legacy));
        assert!(!config.client_options().version_invariant);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = EosClientConfig::load_or_default(Some(dir.path().join("absent.yaml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_grpc_without_uri() {
        let config = EosClientConfig {
            backend: TransportKind::Grpc,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_keytab_without_path() {
        let config = EosClientConfig {
            use_keytab: true,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        let config = EosClientConfig {
            master_url: "ftp://mgm".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("ON"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
