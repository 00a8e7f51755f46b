use super::error::GatewayError;
use super::types::{EInvoiceStatus, InvoiceRecord};

/// The four state-changing gateway operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GenerateIrn,
    CancelIrn,
    GenerateEwayBill,
    CancelEwayBill,
}

impl Operation {
    /// Status the invoice ends in when the operation succeeds.
    pub fn target_status(&self) -> EInvoiceStatus {
        match self {
            Self::GenerateIrn => EInvoiceStatus::IrnGenerated,
            Self::CancelIrn => EInvoiceStatus::IrnCancelled,
            Self::GenerateEwayBill => EInvoiceStatus::EwayBillGenerated,
            Self::CancelEwayBill => EInvoiceStatus::EwayBillCancelled,
        }
    }
}

/// Check that `op` may be attempted on `record` in its current state.
///
/// Runs before any network call. IRN generation on an invoice that already
/// holds an active IRN is allowed: the gateway answers "already generated"
/// and the record is re-synchronised (see [`check_irn_resync`]).
pub fn check_transition(record: &InvoiceRecord, op: Operation) -> Result<(), GatewayError> {
    match op {
        Operation::GenerateIrn => Ok(()),
        Operation::CancelIrn => {
            if record.irn.as_deref().is_none_or(str::is_empty) {
                return Err(GatewayError::InvalidState(format!(
                    "invoice {} has no IRN to cancel",
                    record.id
                )));
            }
            Ok(())
        }
        Operation::GenerateEwayBill => {
            if !record.has_active_irn() {
                return Err(GatewayError::InvalidState(format!(
                    "invoice {} needs an active IRN before an e-way bill can be generated",
                    record.id
                )));
            }
            if record.ewaybill_cancelled {
                return Err(GatewayError::InvalidState(format!(
                    "e-way bill of invoice {} was cancelled; generate a new IRN first",
                    record.id
                )));
            }
            if record.has_active_ewaybill() {
                return Err(GatewayError::InvalidState(format!(
                    "invoice {} already has e-way bill {}",
                    record.id,
                    record.ewaybill.as_deref().unwrap_or_default()
                )));
            }
            Ok(())
        }
        Operation::CancelEwayBill => {
            if !record.has_active_ewaybill() {
                return Err(GatewayError::InvalidState(format!(
                    "invoice {} has no active e-way bill to cancel",
                    record.id
                )));
            }
            Ok(())
        }
    }
}

/// An invoice never holds two active IRNs: applying `incoming` is only
/// allowed when the record has no active IRN or already holds the same one.
///
/// A cancelled IRN stays cancelled. Re-applying it would clear the
/// cancellation flags without the gateway having issued anything new.
pub fn check_irn_resync(record: &InvoiceRecord, incoming: &str) -> Result<(), GatewayError> {
    match record.irn.as_deref() {
        Some(current) if record.has_active_irn() && current != incoming => {
            Err(GatewayError::InvalidState(format!(
                "invoice {} already holds active IRN {current}; refusing to replace it with {incoming}",
                record.id
            )))
        }
        Some(current) if record.irn_cancelled && current == incoming => {
            Err(GatewayError::InvalidState(format!(
                "IRN {incoming} of invoice {} is cancelled and cannot be reactivated",
                record.id
            )))
        }
        _ => Ok(()),
    }
}
