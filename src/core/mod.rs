//! Core e-invoice types, error taxonomy, and the status state machine.
//!
//! These types carry no I/O and are shared by the classifier, the
//! reconciler, and the connector.

mod error;
mod status;
mod types;

pub use error::*;
pub use status::*;
pub use types::*;
