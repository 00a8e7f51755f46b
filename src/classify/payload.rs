//! Typed result payloads per endpoint.
//!
//! The gateway mixes numbers and strings for identifiers (`AckNo`, `EwbNo`,
//! `StateCode`), so those fields accept either and are kept as text.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::response::Endpoint;
use crate::core::GatewayError;

fn flex_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn flex_i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    use serde::de::Error;
    match Value::deserialize(d)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| D::Error::custom(format!("{n} is not an integer"))),
        Value::String(s) => s.trim().parse().map_err(D::Error::custom),
        other => Err(D::Error::custom(format!("expected integer, got {other}"))),
    }
}

/// `result` of IRN generation and of the IRN details lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IrnDetails {
    pub irn: String,
    #[serde(default, deserialize_with = "flex_string")]
    pub ack_no: Option<String>,
    #[serde(default, deserialize_with = "flex_string")]
    pub ack_dt: Option<String>,
    #[serde(default, deserialize_with = "flex_string")]
    pub ewb_no: Option<String>,
    #[serde(default, deserialize_with = "flex_string")]
    pub ewb_dt: Option<String>,
    #[serde(default, deserialize_with = "flex_string")]
    pub ewb_valid_till: Option<String>,
    /// Signed JWT rendered into the invoice QR code.
    #[serde(rename = "SignedQRCode")]
    pub signed_qr_code: String,
    #[serde(default)]
    pub signed_invoice: Option<String>,
    /// `ACT` or `CNL`.
    #[serde(default, deserialize_with = "flex_string")]
    pub status: Option<String>,
}

/// `Status` the gateway reports for a cancelled IRN.
pub const IRN_STATUS_CANCELLED: &str = "CNL";

impl IrnDetails {
    /// The gateway reports this IRN as cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some(IRN_STATUS_CANCELLED)
    }
}

/// `result` of IRN cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct IrnCancellation {
    #[serde(default)]
    pub irn: Option<String>,
    #[serde(default, deserialize_with = "flex_string")]
    pub cancel_date: Option<String>,
}

/// `result` of e-way bill generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EwayBill {
    #[serde(default, deserialize_with = "flex_string")]
    pub ewb_no: Option<String>,
    #[serde(default, deserialize_with = "flex_string")]
    pub ewb_dt: Option<String>,
    #[serde(default, deserialize_with = "flex_string")]
    pub ewb_valid_till: Option<String>,
}

/// One entry of the "already generated" descriptor list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DuplicateIrn {
    #[serde(default, deserialize_with = "flex_string")]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    pub desc: DuplicateIrnDesc,
}

/// Identifies the IRN the gateway already holds for the invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DuplicateIrnDesc {
    pub irn: String,
    #[serde(default, deserialize_with = "flex_string")]
    pub ack_no: Option<String>,
    #[serde(default, deserialize_with = "flex_string")]
    pub ack_dt: Option<String>,
}

/// `result` of the GSTIN master lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GstinDetails {
    pub gstin: String,
    #[serde(default)]
    pub trade_name: Option<String>,
    #[serde(default)]
    pub legal_name: Option<String>,
    #[serde(default)]
    pub addr_bnm: Option<String>,
    #[serde(default)]
    pub addr_bno: Option<String>,
    #[serde(default)]
    pub addr_flno: Option<String>,
    #[serde(default)]
    pub addr_st: Option<String>,
    #[serde(default)]
    pub addr_loc: Option<String>,
    #[serde(default, deserialize_with = "flex_string")]
    pub state_code: Option<String>,
    #[serde(default, deserialize_with = "flex_string")]
    pub addr_pncd: Option<String>,
    /// Taxpayer type (REG, COM, ...).
    #[serde(default)]
    pub txp_type: Option<String>,
    /// ACT, CNL, INA, PRO.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub blk_status: Option<String>,
    #[serde(default)]
    pub dt_reg: Option<String>,
    #[serde(default)]
    pub dt_d_reg: Option<String>,
}

/// Body of the token authentication call. Not wrapped in the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token_type: String,
    pub access_token: String,
    /// Lifetime in seconds.
    #[serde(deserialize_with = "flex_i64")]
    pub expires_in: i64,
}

impl AuthResponse {
    /// Value for the `authorization` header, e.g. `"Bearer eyJ..."`.
    pub fn header_value(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// Decode an endpoint's `result` into its typed payload.
///
/// # Errors
///
/// `GatewayError::Schema` when the payload is absent or malformed.
pub fn decode_result<T: DeserializeOwned>(
    payload: Option<&Value>,
    endpoint: Endpoint,
) -> Result<T, GatewayError> {
    let value = payload.ok_or_else(|| {
        GatewayError::Schema(format!("{} response carries no result", endpoint.name()))
    })?;
    serde_json::from_value(value.clone())
        .map_err(|e| GatewayError::Schema(format!("{} result: {e}", endpoint.name())))
}

/// IRN named in an "already generated" payload.
///
/// The gateway sends a list of descriptors; the first one is authoritative.
/// A bare object is accepted as well.
pub fn duplicate_irn(payload: Option<&Value>) -> Result<String, GatewayError> {
    let first = match payload {
        Some(Value::Array(entries)) => entries.first(),
        other => other,
    };
    let entry: DuplicateIrn = decode_result(first, Endpoint::GenerateIrn)?;
    Ok(entry.desc.irn)
}
