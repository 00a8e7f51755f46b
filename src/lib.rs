//! # gstlink
//!
//! Connector for the Indian GST e-invoicing system through the Adaequare
//! GSP gateway: IRN generation and cancellation, e-way bills, signed QR
//! codes, and an append-only audit log of every gateway call.
//!
//! Gateway responses are classified into [`classify::ClassifiedOutcome`]s
//! and reconciled into the invoice record through a forward-only status
//! machine. "Already generated" and "already cancelled" rejections are
//! reconciled as successes, so a repeated submission converges on the
//! gateway's state.
//!
//! ## Quick Start
//!
//! ```rust
//! use gstlink::classify::*;
//! use serde_json::json;
//!
//! let resp = GatewayResponse::from_value(&json!({
//!     "success": false,
//!     "message": "2150 : Duplicate IRN",
//!     "result": [{"Desc": {"Irn": "a5c1", "AckNo": 1, "AckDt": "2024-01-01 10:00:00"}}]
//! }));
//! let outcome = classify(&resp, Endpoint::GenerateIrn);
//! assert!(matches!(outcome, ClassifiedOutcome::AlreadyExists(_)));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Invoice record, status machine, settings, response classification |
//! | `qr` | Signed QR code rendering to PNG |
//! | `gateway` (default) | HTTP connector, token session, audit log, reconciliation |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "core")]
pub mod config;

#[cfg(feature = "core")]
pub mod classify;

#[cfg(feature = "qr")]
pub mod qr;

#[cfg(feature = "gateway")]
pub mod gateway;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
