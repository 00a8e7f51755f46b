use serde_json::Value;

use super::response::{Endpoint, GatewayResponse};
use super::sanitize::sanitize_error_message;

/// What a gateway response means for the invoice.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedOutcome {
    /// Request accepted; carries the endpoint's `result`.
    Success(Option<Value>),
    /// Rejected with the endpoint's "already processed" code. The payload is
    /// the `result`, which for IRN generation names the existing IRN.
    AlreadyExists(Option<Value>),
    /// Business-rule rejection, split into readable messages.
    ValidationError(Vec<String>),
}

impl ClassifiedOutcome {
    /// True for outcomes that advance the invoice state.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::ValidationError(_))
    }
}

/// Classify a response from `endpoint`.
///
/// `success == true` wins. Otherwise a message containing the endpoint's
/// already-processed code (`2150` for IRN generation, `9999` for IRN
/// cancellation) is `AlreadyExists`; anything else is a validation error.
pub fn classify(response: &GatewayResponse, endpoint: Endpoint) -> ClassifiedOutcome {
    if response.success {
        return ClassifiedOutcome::Success(response.result.clone());
    }

    let message = response.message_text();
    if let Some(code) = endpoint.already_processed_code() {
        if message.contains(code) {
            return ClassifiedOutcome::AlreadyExists(response.result.clone());
        }
    }

    ClassifiedOutcome::ValidationError(sanitize_error_message(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rejected(message: &str) -> GatewayResponse {
        GatewayResponse {
            success: false,
            message: Some(message.into()),
            result: None,
        }
    }

    #[test]
    fn success_wins_over_sentinel() {
        let resp = GatewayResponse {
            success: true,
            message: Some("2150 : Duplicate IRN".into()),
            result: Some(json!({"Irn": "IRN123"})),
        };
        assert_eq!(
            classify(&resp, Endpoint::GenerateIrn),
            ClassifiedOutcome::Success(Some(json!({"Irn": "IRN123"})))
        );
    }

    #[test]
    fn duplicate_irn_is_already_exists() {
        let outcome = classify(&rejected("2150 : Duplicate IRN"), Endpoint::GenerateIrn);
        assert!(matches!(outcome, ClassifiedOutcome::AlreadyExists(_)));
        assert!(outcome.is_accepted());
    }

    #[test]
    fn already_cancelled_is_already_exists() {
        let outcome = classify(
            &rejected("9999 : Invoice is already cancelled"),
            Endpoint::CancelIrn,
        );
        assert!(matches!(outcome, ClassifiedOutcome::AlreadyExists(_)));
    }

    #[test]
    fn sentinel_is_endpoint_specific() {
        let outcome = classify(&rejected("9999 : already cancelled"), Endpoint::GenerateIrn);
        assert_eq!(
            outcome,
            ClassifiedOutcome::ValidationError(vec!["already cancelled".into()])
        );
        let outcome = classify(&rejected("2150 : Duplicate IRN"), Endpoint::GenerateEwayBill);
        assert!(!outcome.is_accepted());
    }

    #[test]
    fn rejection_is_sanitized() {
        assert_eq!(
            classify(&rejected("2174 : msg1, 3095 : msg2"), Endpoint::GenerateIrn),
            ClassifiedOutcome::ValidationError(vec!["msg1".into(), "msg2".into()])
        );
    }

    #[test]
    fn rejection_without_message_has_no_errors() {
        let resp = GatewayResponse::default();
        assert_eq!(
            classify(&resp, Endpoint::CancelEwayBill),
            ClassifiedOutcome::ValidationError(vec![])
        );
    }
}
