use thiserror::Error;

/// Errors that abort a gateway operation.
///
/// Business-rule rejections from the gateway are *not* errors: they come
/// back as [`Outcome`](super::Outcome) with `success == false`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// The integration is switched off in the settings.
    #[error("e-invoicing gateway is not enabled; enable it in the gateway settings and try again")]
    Disabled,

    /// No credential row exists for the seller GSTIN.
    #[error("cannot find gateway credentials for GSTIN {gstin}; check the gateway settings")]
    MissingCredentials {
        /// GSTIN that was looked up.
        gstin: String,
    },

    /// Settings could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network, timeout, HTTP status or authentication failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The operation is not a legal transition for the invoice's status.
    #[error("invalid invoice state: {0}")]
    InvalidState(String),

    /// A success payload did not match the expected result shape.
    #[error("unexpected gateway payload: {0}")]
    Schema(String),

    /// Audit log, invoice or attachment persistence failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// QR code or PNG encoding failed.
    #[error("QR code error: {0}")]
    QrCode(String),
}

impl GatewayError {
    /// True for the configuration class of errors, which are raised before
    /// any network activity.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Disabled | Self::MissingCredentials { .. } | Self::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credentials_names_gstin() {
        let err = GatewayError::MissingCredentials {
            gstin: "29ABCDE1234F1Z5".into(),
        };
        assert!(err.to_string().contains("29ABCDE1234F1Z5"));
        assert!(err.is_configuration());
    }

    #[test]
    fn transport_is_not_configuration() {
        assert!(!GatewayError::Transport("timeout".into()).is_configuration());
    }
}
