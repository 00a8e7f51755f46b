//! Gateway settings and per-GSTIN credential resolution.
//!
//! Settings are loaded from TOML. The client id and secret of the GSP
//! application fall back to the process environment when absent.
//!
//! # Example
//!
//! ```ignore
//! use gstlink::config::GatewaySettings;
//!
//! let settings = GatewaySettings::load(Path::new("gateway.toml"))?;
//! let creds = settings.resolve("29ABCDE1234F1Z5")?;
//! ```

mod settings;

pub use settings::{
    AppCredentials, ENV_CLIENT_ID, ENV_CLIENT_SECRET, GatewayMode, GatewaySettings,
    GatewaySettingsBuilder,
};
