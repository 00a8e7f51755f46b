//! Per-tenant gateway session and bearer token cache.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use tracing::{debug, info};

use super::endpoints::Endpoints;
use crate::classify::AuthResponse;
use crate::config::GatewayMode;
use crate::core::GatewayError;

/// Tokens with less than this many seconds left are refreshed before use.
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 150;

/// Cached bearer token.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct TokenState {
    /// Full `authorization` header value, e.g. `"Bearer eyJ..."`.
    pub auth_token: Option<String>,
    pub token_expiry: Option<DateTime<Utc>>,
}

impl TokenState {
    /// True when there is no token or it expires within the refresh margin.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match (&self.auth_token, self.token_expiry) {
            (Some(_), Some(expiry)) => expiry - now < TimeDelta::seconds(TOKEN_REFRESH_MARGIN_SECS),
            _ => true,
        }
    }
}

impl fmt::Debug for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenState")
            .field("auth_token", &self.auth_token.as_ref().map(|_| "***"))
            .field("token_expiry", &self.token_expiry)
            .finish()
    }
}

/// Host, endpoints and shared token of one tenant.
///
/// Shared between connectors through `Arc`. The token is read, checked,
/// refreshed and written under one lock, so concurrent operations of a
/// tenant authenticate at most once per expiry.
pub struct GatewaySession {
    tenant: String,
    endpoints: Endpoints,
    token: Mutex<TokenState>,
}

impl GatewaySession {
    pub fn new(tenant: impl Into<String>, endpoints: Endpoints) -> Self {
        Self {
            tenant: tenant.into(),
            endpoints,
            token: Mutex::new(TokenState::default()),
        }
    }

    /// Seed the session with a previously persisted token.
    pub fn with_token(self, auth_token: impl Into<String>, expiry: DateTime<Utc>) -> Self {
        *self.token.lock() = TokenState {
            auth_token: Some(auth_token.into()),
            token_expiry: Some(expiry),
        };
        self
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Copy of the current token state, for persisting it elsewhere.
    pub fn snapshot(&self) -> TokenState {
        self.token.lock().clone()
    }

    /// Return a valid token, calling `authenticate` first if the cached one
    /// is missing or about to expire.
    ///
    /// The lock is held across `authenticate`; callers racing on an expired
    /// token wait for the first refresh and then reuse its result.
    ///
    /// # Errors
    ///
    /// Whatever `authenticate` fails with, or [`GatewayError::Transport`]
    /// when its `expires_in` does not fit a timestamp. The cached state is
    /// left untouched in both cases.
    pub fn token_with<F>(&self, authenticate: F) -> Result<String, GatewayError>
    where
        F: FnOnce() -> Result<AuthResponse, GatewayError>,
    {
        let mut state = self.token.lock();
        if state.needs_refresh(Utc::now()) {
            debug!(tenant = %self.tenant, "gateway token missing or near expiry");
            let auth = authenticate()?;
            let expiry = TimeDelta::try_seconds(auth.expires_in)
                .and_then(|ttl| Utc::now().checked_add_signed(ttl))
                .ok_or_else(|| {
                    GatewayError::Transport(format!(
                        "authentication failed: expires_in {} out of range",
                        auth.expires_in
                    ))
                })?;
            state.auth_token = Some(auth.header_value());
            state.token_expiry = Some(expiry);
            info!(tenant = %self.tenant, %expiry, "gateway token refreshed");
        }
        state
            .auth_token
            .clone()
            .ok_or_else(|| GatewayError::Transport("no gateway token available".into()))
    }
}

impl fmt::Debug for GatewaySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewaySession")
            .field("tenant", &self.tenant)
            .field("host", &self.endpoints.host())
            .field("token", &*self.token.lock())
            .finish()
    }
}

/// Explicit registry of sessions, one per tenant and mode.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<(String, GatewayMode), Arc<GatewaySession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tenant's session for `mode`, created on first use.
    pub fn session(&self, tenant: &str, mode: GatewayMode) -> Arc<GatewaySession> {
        self.sessions
            .lock()
            .entry((tenant.to_string(), mode))
            .or_insert_with(|| Arc::new(GatewaySession::new(tenant, Endpoints::for_mode(mode))))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}
