use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an e-invoice.
///
/// Moves forward only: `Draft → IRN Generated → IRN Cancelled`, and
/// `IRN Generated → E-Way Bill Generated → E-Way Bill Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EInvoiceStatus {
    /// Not yet registered with the gateway.
    #[default]
    Draft,
    /// IRN issued and invoice submitted.
    #[serde(rename = "IRN Generated")]
    IrnGenerated,
    /// IRN cancelled at the gateway.
    #[serde(rename = "IRN Cancelled")]
    IrnCancelled,
    /// E-way bill issued against the IRN.
    #[serde(rename = "E-Way Bill Generated")]
    EwayBillGenerated,
    /// E-way bill cancelled at the gateway.
    #[serde(rename = "E-Way Bill Cancelled")]
    EwayBillCancelled,
}

impl EInvoiceStatus {
    /// Display label as stored on the invoice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::IrnGenerated => "IRN Generated",
            Self::IrnCancelled => "IRN Cancelled",
            Self::EwayBillGenerated => "E-Way Bill Generated",
            Self::EwayBillCancelled => "E-Way Bill Cancelled",
        }
    }
}

impl fmt::Display for EInvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The e-invoice fields of a sales invoice that the connector maintains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InvoiceRecord {
    /// Document name of the invoice.
    pub id: String,
    /// GSTIN of the selling company; selects the credential row.
    pub seller_gstin: String,
    /// Invoice Reference Number issued by the gateway.
    pub irn: Option<String>,
    /// Acknowledgement number.
    pub ack_no: Option<String>,
    /// Acknowledgement date as returned by the gateway.
    pub ack_date: Option<String>,
    /// E-way bill number.
    pub ewaybill: Option<String>,
    /// E-way bill validity as returned by the gateway.
    pub ewaybill_validity: Option<String>,
    /// URL of the QR code attachment.
    pub qrcode_path: Option<String>,
    /// Cancellation date reported by the gateway.
    pub irn_cancel_date: Option<String>,
    pub status: EInvoiceStatus,
    pub irn_cancelled: bool,
    pub ewaybill_cancelled: bool,
    /// Whether the invoice has been finalized (submitted). Irreversible.
    pub submitted: bool,
}

impl InvoiceRecord {
    /// A fresh draft record.
    pub fn new(id: impl Into<String>, seller_gstin: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            seller_gstin: seller_gstin.into(),
            ..Default::default()
        }
    }

    /// An IRN is present and has not been cancelled.
    pub fn has_active_irn(&self) -> bool {
        self.irn.as_deref().is_some_and(|irn| !irn.is_empty()) && !self.irn_cancelled
    }

    /// An e-way bill is present and has not been cancelled.
    pub fn has_active_ewaybill(&self) -> bool {
        self.ewaybill.as_deref().is_some_and(|ewb| !ewb.is_empty()) && !self.ewaybill_cancelled
    }
}

/// Gateway login for one GSTIN.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayCredentials {
    /// Company the GSTIN belongs to.
    #[serde(default)]
    pub company: String,
    pub gstin: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for GatewayCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayCredentials")
            .field("company", &self.company)
            .field("gstin", &self.gstin)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Result of one public operation: `(success, errors)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Outcome {
    pub success: bool,
    /// Human-readable gateway validation messages (empty on success).
    pub errors: Vec<String>,
}

impl Outcome {
    /// Successful outcome.
    pub fn ok() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
        }
    }

    /// Gateway rejected the request.
    pub fn rejected(errors: Vec<String>) -> Self {
        Self {
            success: false,
            errors,
        }
    }
}
