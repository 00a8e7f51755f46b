//! Connector to the Adaequare GSP e-invoicing gateway.
//!
//! Build a [`GatewayContext`] once per process or tenant and run the
//! operations against it:
//!
//! ```no_run
//! use std::sync::Arc;
//! use gstlink::config::GatewaySettings;
//! use gstlink::gateway::*;
//! use gstlink::core::InvoiceRecord;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), gstlink::core::GatewayError> {
//! let settings = GatewaySettings::load(std::path::Path::new("gateway.toml"))?;
//! let ctx = GatewayContext::builder(settings)
//!     .audit(Arc::new(JsonlAuditStore::new("einvoice-audit.jsonl")))
//!     .invoices(Arc::new(MemoryInvoiceStore::new()))
//!     .attachments(Arc::new(MemoryAttachmentStore::new()))
//!     .actor("accounts@example.com")
//!     .build()?;
//!
//! let mut invoice = PreparedInvoice::new(
//!     InvoiceRecord::new("SINV-0001", "29ABCDE1234F1Z5"),
//!     json!({"Version": "1.1"}),
//! );
//! let outcome = generate_irn(&ctx, &mut invoice)?;
//! if !outcome.success {
//!     for e in &outcome.errors {
//!         eprintln!("{e}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod audit;
mod connector;
mod endpoints;
mod reconcile;
mod session;
mod store;
mod transport;

pub use audit::{AuditStore, JsonlAuditStore, MemoryAuditStore, RequestAuditEntry};
pub use connector::{
    Connector, DEFAULT_TENANT, GatewayContext, GatewayContextBuilder, Lookup, SYSTEM_ACTOR,
    cancel_eway_bill, cancel_irn, generate_eway_bill, generate_irn,
};
pub use endpoints::{AUTHENTICATE_URL, Endpoints, PRODUCTION_HOST, SANDBOX_HOST};
pub use reconcile::Reconciler;
pub use session::{GatewaySession, SessionRegistry, TOKEN_REFRESH_MARGIN_SECS, TokenState};
pub use store::{
    AttachmentStore, EInvoice, InvoiceStore, MemoryAttachmentStore, MemoryInvoiceStore,
    PreparedInvoice, QRCODE_FIELD, QrAttachment,
};
pub use transport::{GatewayRequest, HttpTransport, Method, Transport};
