//! Seams to the ERP: the invoice aggregate, its persistence, and file
//! attachments.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;
use serde_json::Value;

use crate::core::{GatewayError, InvoiceRecord};
use crate::qr::attachment_file_name;

/// Field the QR attachment is linked to.
pub const QRCODE_FIELD: &str = "qrcode_path";

/// A sales invoice as the connector sees it.
pub trait EInvoice {
    fn record(&self) -> &InvoiceRecord;

    fn record_mut(&mut self) -> &mut InvoiceRecord;

    /// Invoice serialized to the government e-invoice schema.
    fn einvoice_json(&self) -> Result<Value, GatewayError>;

    /// Invoice serialized to the e-way bill schema.
    fn eway_bill_json(&self) -> Result<Value, GatewayError>;
}

/// Durable storage of invoice records.
pub trait InvoiceStore: Send + Sync {
    /// Finalize the invoice. Irreversible; issued once per invoice.
    fn submit(&self, record: &InvoiceRecord) -> Result<(), GatewayError>;

    /// System update of an already finalized invoice. Bypasses the ERP's
    /// update-after-submit and permission checks.
    fn save(&self, record: &InvoiceRecord) -> Result<(), GatewayError>;
}

/// A QR image to attach to an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrAttachment {
    pub file_name: String,
    pub attached_to_name: String,
    pub attached_to_field: &'static str,
    pub is_private: bool,
    pub content: Vec<u8>,
}

impl QrAttachment {
    /// Public PNG attachment for `invoice_id`'s `qrcode_path` field.
    pub fn for_invoice(invoice_id: &str, png: Vec<u8>) -> Self {
        Self {
            file_name: attachment_file_name(invoice_id),
            attached_to_name: invoice_id.to_string(),
            attached_to_field: QRCODE_FIELD,
            is_private: false,
            content: png,
        }
    }
}

/// File storage for attachments.
pub trait AttachmentStore: Send + Sync {
    /// Store the file and return its URL.
    fn attach(&self, attachment: QrAttachment) -> Result<String, GatewayError>;

    /// Remove a file stored by [`attach`](Self::attach).
    fn detach(&self, url: &str) -> Result<(), GatewayError>;
}

/// Invoice with pre-serialized gateway payloads.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedInvoice {
    pub record: InvoiceRecord,
    pub einvoice: Value,
    pub eway_bill: Option<Value>,
}

impl PreparedInvoice {
    pub fn new(record: InvoiceRecord, einvoice: Value) -> Self {
        Self {
            record,
            einvoice,
            eway_bill: None,
        }
    }

    pub fn with_eway_bill(mut self, eway_bill: Value) -> Self {
        self.eway_bill = Some(eway_bill);
        self
    }
}

impl EInvoice for PreparedInvoice {
    fn record(&self) -> &InvoiceRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut InvoiceRecord {
        &mut self.record
    }

    fn einvoice_json(&self) -> Result<Value, GatewayError> {
        Ok(self.einvoice.clone())
    }

    fn eway_bill_json(&self) -> Result<Value, GatewayError> {
        self.eway_bill.clone().ok_or_else(|| {
            GatewayError::InvalidState(format!(
                "invoice {} has no e-way bill details",
                self.record.id
            ))
        })
    }
}

/// In-process invoice store.
#[derive(Debug, Default)]
pub struct MemoryInvoiceStore {
    records: Mutex<HashMap<String, InvoiceRecord>>,
}

impl MemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<InvoiceRecord> {
        self.records.lock().get(id).cloned()
    }
}

impl InvoiceStore for MemoryInvoiceStore {
    fn submit(&self, record: &InvoiceRecord) -> Result<(), GatewayError> {
        let mut records = self.records.lock();
        if records.get(&record.id).is_some_and(|r| r.submitted) {
            return Err(GatewayError::InvalidState(format!(
                "invoice {} is already submitted",
                record.id
            )));
        }
        let mut stored = record.clone();
        stored.submitted = true;
        records.insert(record.id.clone(), stored);
        Ok(())
    }

    fn save(&self, record: &InvoiceRecord) -> Result<(), GatewayError> {
        self.records.lock().insert(record.id.clone(), record.clone());
        Ok(())
    }
}

/// In-process attachment store. URLs are `/files/<file name>`.
#[derive(Debug, Default)]
pub struct MemoryAttachmentStore {
    files: Mutex<BTreeMap<String, QrAttachment>>,
}

impl MemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<QrAttachment> {
        self.files.lock().get(url).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }
}

impl AttachmentStore for MemoryAttachmentStore {
    fn attach(&self, attachment: QrAttachment) -> Result<String, GatewayError> {
        let url = format!("/files/{}", attachment.file_name);
        self.files.lock().insert(url.clone(), attachment);
        Ok(url)
    }

    fn detach(&self, url: &str) -> Result<(), GatewayError> {
        self.files.lock().remove(url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn submit_is_once_only() {
        let store = MemoryInvoiceStore::new();
        let record = InvoiceRecord::new("SINV-0001", "29ABCDE1234F1Z5");
        store.submit(&record).unwrap();
        assert!(store.get("SINV-0001").unwrap().submitted);
        assert!(matches!(
            store.submit(&record),
            Err(GatewayError::InvalidState(_))
        ));
        // Privileged saves keep working after submission.
        store.save(&record).unwrap();
    }

    #[test]
    fn qr_attachment_is_public_and_linked() {
        let att = QrAttachment::for_invoice("SINV-0001", vec![1, 2, 3]);
        assert_eq!(att.file_name, "SINV-0001 - QRCode.png");
        assert_eq!(att.attached_to_field, "qrcode_path");
        assert!(!att.is_private);

        let store = MemoryAttachmentStore::new();
        let url = store.attach(att).unwrap();
        assert_eq!(url, "/files/SINV-0001 - QRCode.png");
        assert_eq!(store.get(&url).unwrap().content, vec![1, 2, 3]);

        store.detach(&url).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn prepared_invoice_without_eway_bill() {
        let inv = PreparedInvoice::new(
            InvoiceRecord::new("SINV-0001", "29ABCDE1234F1Z5"),
            json!({"Version": "1.1"}),
        );
        assert_eq!(inv.einvoice_json().unwrap()["Version"], "1.1");
        assert!(inv.eway_bill_json().is_err());
        let inv = inv.with_eway_bill(json!({"Irn": "IRN123"}));
        assert!(inv.eway_bill_json().is_ok());
    }
}
