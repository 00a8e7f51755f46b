//! Pure interpretation of gateway responses.
//!
//! Classification has no side effects: it turns a response envelope into a
//! [`ClassifiedOutcome`] and leaves every state change to the reconciler.
//!
//! # Example
//!
//! ```
//! use gstlink::classify::*;
//! use serde_json::json;
//!
//! let resp = GatewayResponse::from_value(&json!({
//!     "success": false,
//!     "message": "2174 : msg1, 3095 : msg2"
//! }));
//! assert_eq!(
//!     classify(&resp, Endpoint::GenerateIrn),
//!     ClassifiedOutcome::ValidationError(vec!["msg1".into(), "msg2".into()]),
//! );
//! ```

mod outcome;
mod payload;
mod response;
mod sanitize;

pub use outcome::{ClassifiedOutcome, classify};
pub use payload::{
    AuthResponse, DuplicateIrn, DuplicateIrnDesc, EwayBill, GstinDetails, IrnCancellation,
    IRN_STATUS_CANCELLED, IrnDetails, decode_result, duplicate_irn,
};
pub use response::{Endpoint, GatewayResponse, IRN_ALREADY_CANCELLED, IRN_ALREADY_GENERATED};
pub use sanitize::sanitize_error_message;
