//! Applying accepted gateway results to the invoice record.
//!
//! Each transition is built on a copy of the record, persisted, and only
//! then copied back. A failed write leaves the caller's record exactly as
//! it was, so an IRN is never set without its status.

use tracing::{debug, warn};

use super::store::{AttachmentStore, InvoiceStore, QrAttachment};
use crate::classify::{EwayBill, IrnCancellation, IrnDetails};
use crate::core::{EInvoiceStatus, GatewayError, InvoiceRecord, Operation, check_irn_resync};
use crate::qr::render_qrcode;

/// Writes state transitions through to the invoice and attachment stores.
pub struct Reconciler<'a> {
    invoices: &'a dyn InvoiceStore,
    attachments: &'a dyn AttachmentStore,
}

impl<'a> Reconciler<'a> {
    pub fn new(invoices: &'a dyn InvoiceStore, attachments: &'a dyn AttachmentStore) -> Self {
        Self {
            invoices,
            attachments,
        }
    }

    /// Record an issued IRN, attach its QR code and finalize the invoice.
    ///
    /// Applying the IRN the invoice already holds is a re-sync: the
    /// gateway's values are refreshed and later progress (an e-way bill)
    /// is kept. Only a different IRN after a cancellation starts a new
    /// cycle and clears both cancellation flags. An IRN the gateway reports
    /// as cancelled is never applied.
    ///
    /// The QR attachment is removed again when the invoice write fails.
    pub fn apply_irn(
        &self,
        record: &mut InvoiceRecord,
        details: &IrnDetails,
    ) -> Result<(), GatewayError> {
        if details.is_cancelled() {
            return Err(GatewayError::InvalidState(format!(
                "gateway reports IRN {} as cancelled; invoice {} left unchanged",
                details.irn, record.id
            )));
        }
        check_irn_resync(record, &details.irn)?;
        let resync = record.has_active_irn();

        let png = render_qrcode(&details.signed_qr_code)?;
        let qrcode_url = self
            .attachments
            .attach(QrAttachment::for_invoice(&record.id, png))?;

        let mut next = record.clone();
        next.irn = Some(details.irn.clone());
        next.ack_no = details.ack_no.clone();
        next.ack_date = details.ack_dt.clone();
        next.qrcode_path = Some(qrcode_url.clone());

        if resync {
            if details.ewb_no.is_some() && !next.ewaybill_cancelled {
                next.ewaybill = details.ewb_no.clone();
                next.ewaybill_validity = details.ewb_valid_till.clone();
            }
            if next.status == EInvoiceStatus::Draft {
                next.status = Operation::GenerateIrn.target_status();
            }
        } else {
            next.ewaybill = details.ewb_no.clone();
            next.ewaybill_validity = details.ewb_valid_till.clone();
            next.status = Operation::GenerateIrn.target_status();
            next.irn_cancelled = false;
            next.ewaybill_cancelled = false;
            next.irn_cancel_date = None;
        }

        // A re-sync overwrites the committed attachment, so only a new one is removed.
        let fresh_attachment = record.qrcode_path.as_deref() != Some(qrcode_url.as_str());
        let committed = self.finalize(record, next);
        if committed.is_err() && fresh_attachment {
            if let Err(err) = self.attachments.detach(&qrcode_url) {
                warn!(invoice = %record.id, url = %qrcode_url, error = %err, "orphaned QR attachment");
            }
        }
        committed
    }

    /// Mark the IRN cancelled.
    pub fn apply_irn_cancellation(
        &self,
        record: &mut InvoiceRecord,
        cancellation: Option<&IrnCancellation>,
    ) -> Result<(), GatewayError> {
        let mut next = record.clone();
        next.irn_cancelled = true;
        if let Some(date) = cancellation.and_then(|c| c.cancel_date.clone()) {
            next.irn_cancel_date = Some(date);
        }
        next.status = Operation::CancelIrn.target_status();
        self.persist(record, next)
    }

    /// Record an issued e-way bill.
    pub fn apply_eway_bill(
        &self,
        record: &mut InvoiceRecord,
        bill: &EwayBill,
    ) -> Result<(), GatewayError> {
        let number = bill.ewb_no.clone().ok_or_else(|| {
            GatewayError::Schema("generate_ewaybill result has no EwbNo".into())
        })?;
        let mut next = record.clone();
        next.ewaybill = Some(number);
        next.ewaybill_validity = bill.ewb_valid_till.clone();
        next.status = Operation::GenerateEwayBill.target_status();
        self.persist(record, next)
    }

    /// Clear the e-way bill and mark it cancelled.
    pub fn apply_eway_bill_cancellation(
        &self,
        record: &mut InvoiceRecord,
    ) -> Result<(), GatewayError> {
        let mut next = record.clone();
        next.ewaybill = None;
        next.ewaybill_cancelled = true;
        next.status = Operation::CancelEwayBill.target_status();
        self.persist(record, next)
    }

    /// Submit on first finalization, privileged save afterwards.
    fn finalize(
        &self,
        record: &mut InvoiceRecord,
        mut next: InvoiceRecord,
    ) -> Result<(), GatewayError> {
        if next.submitted {
            return self.persist(record, next);
        }
        next.submitted = true;
        self.invoices.submit(&next)?;
        debug!(invoice = %next.id, status = %next.status, "invoice submitted");
        *record = next;
        Ok(())
    }

    fn persist(
        &self,
        record: &mut InvoiceRecord,
        next: InvoiceRecord,
    ) -> Result<(), GatewayError> {
        self.invoices.save(&next)?;
        debug!(invoice = %next.id, status = %next.status, "invoice saved");
        *record = next;
        Ok(())
    }
}
