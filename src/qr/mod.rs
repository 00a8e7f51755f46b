//! QR code rendering for the signed invoice payload.
//!
//! # Example
//!
//! ```
//! use gstlink::qr::render_qrcode;
//!
//! let png = render_qrcode("signed-jwt").unwrap();
//! assert!(png.starts_with(b"\x89PNG"));
//! ```

mod render;

pub use render::{QUIET_ZONE, SCALE, attachment_file_name, render_qrcode};
