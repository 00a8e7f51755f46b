//! Raw gateway envelope and the endpoints that produce it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Gateway endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    Authenticate,
    GenerateIrn,
    CancelIrn,
    IrnDetails,
    GstinDetails,
    GenerateEwayBill,
    CancelEwayBill,
}

/// Error code the gateway uses for "IRN already generated".
pub const IRN_ALREADY_GENERATED: &str = "2150";

/// Error code the gateway uses for "IRN already cancelled".
pub const IRN_ALREADY_CANCELLED: &str = "9999";

impl Endpoint {
    /// Code that marks a rejected request as already processed.
    pub fn already_processed_code(&self) -> Option<&'static str> {
        match self {
            Self::GenerateIrn => Some(IRN_ALREADY_GENERATED),
            Self::CancelIrn => Some(IRN_ALREADY_CANCELLED),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Authenticate => "authenticate",
            Self::GenerateIrn => "generate_irn",
            Self::CancelIrn => "cancel_irn",
            Self::IrnDetails => "irn_details",
            Self::GstinDetails => "gstin_details",
            Self::GenerateEwayBill => "generate_ewaybill",
            Self::CancelEwayBill => "cancel_ewaybill",
        }
    }
}

/// The `{success, message, result}` envelope every enriched API call returns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub success: bool,
    /// Error text on rejection; may be absent on success.
    pub message: Option<String>,
    /// Endpoint-specific payload. On "already generated" it carries the
    /// duplicate descriptor list.
    pub result: Option<Value>,
}

impl GatewayResponse {
    /// Read the envelope from parsed JSON.
    ///
    /// Lenient about the gateway's loose typing: a missing or
    /// non-boolean `success` counts as `false`, and a non-string `message`
    /// is kept in its JSON text form.
    pub fn from_value(value: &Value) -> Self {
        let success = value
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let message = match value.get("message") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };
        let result = value.get("result").filter(|v| !v.is_null()).cloned();
        Self {
            success,
            message,
            result,
        }
    }

    /// The message, or `""` when absent.
    pub fn message_text(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_from_success() {
        let resp = GatewayResponse::from_value(&json!({
            "success": true,
            "result": {"Irn": "IRN123"}
        }));
        assert!(resp.success);
        assert!(resp.message.is_none());
        assert_eq!(resp.result.unwrap()["Irn"], "IRN123");
    }

    #[test]
    fn envelope_from_rejection() {
        let resp = GatewayResponse::from_value(&json!({
            "success": false,
            "message": "3095 : Supplier GSTIN is inactive",
            "result": null
        }));
        assert!(!resp.success);
        assert_eq!(resp.message_text(), "3095 : Supplier GSTIN is inactive");
        assert!(resp.result.is_none());
    }

    #[test]
    fn envelope_tolerates_odd_types() {
        let resp = GatewayResponse::from_value(&json!({"success": "yes", "message": 42}));
        assert!(!resp.success);
        assert_eq!(resp.message_text(), "42");
    }

    #[test]
    fn sentinels_per_endpoint() {
        assert_eq!(Endpoint::GenerateIrn.already_processed_code(), Some("2150"));
        assert_eq!(Endpoint::CancelIrn.already_processed_code(), Some("9999"));
        assert_eq!(Endpoint::CancelEwayBill.already_processed_code(), None);
    }
}
