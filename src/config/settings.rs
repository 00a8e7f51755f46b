use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::core::{GatewayCredentials, GatewayError};

/// Environment variable consulted when the settings carry no client id.
pub const ENV_CLIENT_ID: &str = "EINVOICE_CLIENT_ID";

/// Environment variable consulted when the settings carry no client secret.
pub const ENV_CLIENT_SECRET: &str = "EINVOICE_CLIENT_SECRET";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which gateway environment requests go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GatewayMode {
    Sandbox,
    Production,
}

/// Application (GSP) client id and secret used for token authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct AppCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

/// Gateway integration settings.
///
/// ```
/// use gstlink::config::GatewaySettings;
///
/// let settings = GatewaySettings::from_toml_str(r#"
///     enabled = true
///     sandbox_mode = true
///     client_id = "app-id"
///     client_secret = "app-secret"
///
///     [[credentials]]
///     company = "Acme India"
///     gstin = "29ABCDE1234F1Z5"
///     username = "acme"
///     password = "secret"
/// "#).unwrap();
///
/// assert!(settings.resolve("29ABCDE1234F1Z5").is_ok());
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// Master switch for the integration.
    pub enabled: bool,
    /// Send requests to the sandbox host instead of production.
    pub sandbox_mode: bool,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// HTTP timeout per request, in seconds.
    pub timeout_secs: u64,
    /// One row per GSTIN. The first matching row wins.
    pub credentials: Vec<GatewayCredentials>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            sandbox_mode: true,
            client_id: None,
            client_secret: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            credentials: Vec::new(),
        }
    }
}

impl fmt::Debug for GatewaySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewaySettings")
            .field("enabled", &self.enabled)
            .field("sandbox_mode", &self.sandbox_mode)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl GatewaySettings {
    /// Parse settings from a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, GatewayError> {
        toml::from_str(contents).map_err(|e| GatewayError::Config(e.to_string()))
    }

    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, GatewayError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    pub fn mode(&self) -> GatewayMode {
        if self.sandbox_mode {
            GatewayMode::Sandbox
        } else {
            GatewayMode::Production
        }
    }

    /// Resolve the credential row for `gstin`.
    ///
    /// # Errors
    ///
    /// `GatewayError::Disabled` when the integration is switched off,
    /// `GatewayError::MissingCredentials` when no row matches.
    pub fn resolve(&self, gstin: &str) -> Result<&GatewayCredentials, GatewayError> {
        if !self.enabled {
            return Err(GatewayError::Disabled);
        }
        self.credentials
            .iter()
            .find(|row| row.gstin == gstin)
            .ok_or_else(|| GatewayError::MissingCredentials {
                gstin: gstin.to_string(),
            })
    }

    /// Client id and secret, falling back to [`ENV_CLIENT_ID`] and
    /// [`ENV_CLIENT_SECRET`] when the settings leave them empty.
    pub fn app_credentials(&self) -> Result<AppCredentials, GatewayError> {
        self.app_credentials_with(|key| std::env::var(key).ok())
    }

    /// Like [`app_credentials`](Self::app_credentials) with an explicit
    /// fallback lookup.
    pub fn app_credentials_with(
        &self,
        fallback: impl Fn(&str) -> Option<String>,
    ) -> Result<AppCredentials, GatewayError> {
        let pick = |value: &Option<String>, key: &str| {
            value
                .clone()
                .filter(|v| !v.is_empty())
                .or_else(|| fallback(key).filter(|v| !v.is_empty()))
                .ok_or_else(|| {
                    GatewayError::Config(format!("no {key} in settings or environment"))
                })
        };
        Ok(AppCredentials {
            client_id: pick(&self.client_id, ENV_CLIENT_ID)?,
            client_secret: pick(&self.client_secret, ENV_CLIENT_SECRET)?,
        })
    }
}

/// Builder for [`GatewaySettings`].
///
/// ```
/// use gstlink::config::GatewaySettingsBuilder;
/// use gstlink::core::GatewayCredentials;
///
/// let settings = GatewaySettingsBuilder::new()
///     .enabled(true)
///     .production()
///     .client("app-id", "app-secret")
///     .credential(GatewayCredentials {
///         company: "Acme India".into(),
///         gstin: "29ABCDE1234F1Z5".into(),
///         username: "acme".into(),
///         password: "secret".into(),
///     })
///     .build();
/// assert!(!settings.sandbox_mode);
/// ```
#[derive(Debug, Default)]
pub struct GatewaySettingsBuilder {
    settings: GatewaySettings,
}

impl GatewaySettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.settings.enabled = enabled;
        self
    }

    /// Use the sandbox host (the default).
    pub fn sandbox(mut self) -> Self {
        self.settings.sandbox_mode = true;
        self
    }

    /// Use the production host.
    pub fn production(mut self) -> Self {
        self.settings.sandbox_mode = false;
        self
    }

    /// Set the GSP application client id and secret.
    pub fn client(mut self, id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.settings.client_id = Some(id.into());
        self.settings.client_secret = Some(secret.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.settings.timeout_secs = secs;
        self
    }

    /// Add a credential row.
    pub fn credential(mut self, credentials: GatewayCredentials) -> Self {
        self.settings.credentials.push(credentials);
        self
    }

    pub fn build(self) -> GatewaySettings {
        self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(gstin: &str, username: &str) -> GatewayCredentials {
        GatewayCredentials {
            company: "Acme India".into(),
            gstin: gstin.into(),
            username: username.into(),
            password: "secret".into(),
        }
    }

    #[test]
    fn resolve_picks_first_matching_row() {
        let settings = GatewaySettingsBuilder::new()
            .enabled(true)
            .credential(creds("29ABCDE1234F1Z5", "first"))
            .credential(creds("29ABCDE1234F1Z5", "second"))
            .build();
        assert_eq!(
            settings.resolve("29ABCDE1234F1Z5").unwrap().username,
            "first"
        );
    }

    #[test]
    fn resolve_fails_when_disabled() {
        let settings = GatewaySettingsBuilder::new()
            .credential(creds("29ABCDE1234F1Z5", "acme"))
            .build();
        assert!(matches!(
            settings.resolve("29ABCDE1234F1Z5"),
            Err(GatewayError::Disabled)
        ));
    }

    #[test]
    fn resolve_fails_for_unknown_gstin() {
        let settings = GatewaySettingsBuilder::new().enabled(true).build();
        let err = settings.resolve("07AAAAA0000A1Z5").unwrap_err();
        assert!(matches!(err, GatewayError::MissingCredentials { .. }));
    }

    #[test]
    fn toml_defaults() {
        let settings = GatewaySettings::from_toml_str("enabled = true").unwrap();
        assert_eq!(settings.mode(), GatewayMode::Sandbox);
        assert_eq!(settings.timeout_secs, 30);
        assert!(settings.credentials.is_empty());
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = GatewaySettings::from_toml_str("enabled = maybe").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn client_credentials_fall_back_to_environment() {
        let settings = GatewaySettingsBuilder::new().enabled(true).build();
        let app = settings
            .app_credentials_with(|key| match key {
                ENV_CLIENT_ID => Some("env-id".into()),
                ENV_CLIENT_SECRET => Some("env-secret".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(app.client_id, "env-id");
        assert_eq!(app.client_secret, "env-secret");
    }

    #[test]
    fn settings_take_precedence_over_environment() {
        let settings = GatewaySettingsBuilder::new()
            .client("settings-id", "settings-secret")
            .build();
        let app = settings
            .app_credentials_with(|_| Some("env".into()))
            .unwrap();
        assert_eq!(app.client_id, "settings-id");
    }

    #[test]
    fn missing_client_secret_is_config_error() {
        let settings = GatewaySettingsBuilder::new().build();
        assert!(settings.app_credentials_with(|_| None).is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let settings = GatewaySettingsBuilder::new()
            .client("app-id", "app-secret")
            .credential(creds("29ABCDE1234F1Z5", "acme"))
            .build();
        let dbg = format!("{settings:?}");
        assert!(!dbg.contains("app-secret"));
        assert!(!dbg.contains("\"secret\""));
    }
}
