//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the intermediate files of a run.
    pub rundata_dir: PathBuf,
    /// Captured events API request replayed by `vt collect`.
    pub request_template: PathBuf,
    /// Captured request that opens a session before login.
    pub preauth_template: PathBuf,
    /// Captured login request replayed by `vt auth`.
    pub auth_template: PathBuf,
    /// Vendor account email; prompted for when unset.
    #[serde(default)]
    pub email: Option<String>,
    /// Vendor account password; prompted for when unset.
    #[serde(default)]
    pub password: Option<String>,
    /// Vendor session cookie; read from `cookies.json` when unset.
    #[serde(default)]
    pub session_cookie: Option<String>,
    /// Default property address for timesheet rows.
    #[serde(default)]
    pub property_address: Option<String>,
    /// Default description for timesheet rows.
    #[serde(default)]
    pub description: Option<String>,
    /// Default activity group for timesheet rows.
    #[serde(default)]
    pub activity_group: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("rundata_dir", &self.rundata_dir)
            .field("request_template", &self.request_template)
            .field("preauth_template", &self.preauth_template)
            .field("auth_template", &self.auth_template)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "[REDACTED]"),
            )
            .field("property_address", &self.property_address)
            .field("description", &self.description)
            .field("activity_group", &self.activity_group)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rundata_dir: PathBuf::from("rundata"),
            request_template: PathBuf::from("config").join("collect-request.json"),
            preauth_template: PathBuf::from("config").join("auth-preauth-request.json"),
            auth_template: PathBuf::from("config").join("auth-request.json"),
            email: None,
            password: None,
            session_cookie: None,
            property_address: None,
            description: None,
            activity_group: None,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (VT_*)
        figment = figment.merge(Env::prefixed("VT_"));

        figment.extract()
    }

    /// Path of a file inside the run-data directory.
    pub fn rundata_path(&self, file_name: &str) -> PathBuf {
        self.rundata_dir.join(file_name)
    }
}

/// Returns the platform-specific config directory for vt.
///
/// On Linux: `~/.config/vt`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("vt"))
}
