//! Settings loading and the invoice status machine.

#![cfg(feature = "core")]

use gstlink::config::*;
use gstlink::core::*;

const SETTINGS: &str = r#"
enabled = true
sandbox_mode = false
client_id = "app-id"
client_secret = "app-secret"
timeout_secs = 45

[[credentials]]
company = "Acme Traders"
gstin = "29ABCDE1234F1Z5"
username = "acme_api"
password = "s3cret"

[[credentials]]
company = "Acme Traders (Maharashtra)"
gstin = "27ABCDE1234F1Z9"
username = "acme_mh"
password = "s3cret-mh"
"#;

fn with_irn(irn: &str) -> InvoiceRecord {
    InvoiceRecord {
        irn: Some(irn.into()),
        status: EInvoiceStatus::IrnGenerated,
        submitted: true,
        ..InvoiceRecord::new("SINV-0001", "29ABCDE1234F1Z5")
    }
}

// --- Settings ---

#[test]
fn settings_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gateway.toml");
    std::fs::write(&path, SETTINGS).unwrap();

    let settings = GatewaySettings::load(&path).unwrap();
    assert!(settings.enabled);
    assert_eq!(settings.mode(), GatewayMode::Production);
    assert_eq!(settings.timeout_secs, 45);
    assert_eq!(settings.credentials.len(), 2);

    let creds = settings.resolve("27ABCDE1234F1Z9").unwrap();
    assert_eq!(creds.username, "acme_mh");
    assert_eq!(creds.company, "Acme Traders (Maharashtra)");
}

#[test]
fn settings_debug_hides_secrets() {
    let settings = GatewaySettings::from_toml_str(SETTINGS).unwrap();
    let shown = format!("{settings:?}");
    assert!(!shown.contains("app-secret"));
    assert!(!shown.contains("s3cret"));
}

#[test]
fn missing_settings_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = GatewaySettings::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, GatewayError::Config(_)));
    assert!(err.is_configuration());
}

#[test]
fn app_credentials_prefer_settings_over_fallback() {
    let settings = GatewaySettings::from_toml_str(SETTINGS).unwrap();
    let app = settings
        .app_credentials_with(|_| Some("from-env".into()))
        .unwrap();
    assert_eq!(app.client_id, "app-id");
    assert_eq!(app.client_secret, "app-secret");
}

// --- Status machine ---

#[test]
fn forward_lifecycle() {
    let mut record = InvoiceRecord::new("SINV-0001", "29ABCDE1234F1Z5");
    assert!(check_transition(&record, Operation::GenerateIrn).is_ok());
    assert!(check_transition(&record, Operation::CancelIrn).is_err());
    assert!(check_transition(&record, Operation::GenerateEwayBill).is_err());

    record = with_irn("IRN123");
    assert!(check_transition(&record, Operation::CancelIrn).is_ok());
    assert!(check_transition(&record, Operation::GenerateEwayBill).is_ok());
    assert!(check_transition(&record, Operation::CancelEwayBill).is_err());

    record.ewaybill = Some("181001".into());
    record.status = EInvoiceStatus::EwayBillGenerated;
    assert!(check_transition(&record, Operation::GenerateEwayBill).is_err());
    assert!(check_transition(&record, Operation::CancelEwayBill).is_ok());

    record.ewaybill = None;
    record.ewaybill_cancelled = true;
    record.status = EInvoiceStatus::EwayBillCancelled;
    assert!(check_transition(&record, Operation::CancelEwayBill).is_err());
    assert!(check_transition(&record, Operation::GenerateEwayBill).is_err());
}

#[test]
fn cancelled_irn_blocks_eway_bill() {
    let mut record = with_irn("IRN123");
    record.irn_cancelled = true;
    record.status = EInvoiceStatus::IrnCancelled;
    assert!(!record.has_active_irn());
    assert!(matches!(
        check_transition(&record, Operation::GenerateEwayBill),
        Err(GatewayError::InvalidState(_))
    ));
}

#[test]
fn resync_only_with_same_irn() {
    let record = with_irn("IRN123");
    assert!(check_irn_resync(&record, "IRN123").is_ok());
    assert!(check_irn_resync(&record, "IRN456").is_err());

    let mut cancelled = record.clone();
    cancelled.irn_cancelled = true;
    assert!(check_irn_resync(&cancelled, "IRN456").is_ok());
}

#[test]
fn status_labels_round_trip_through_records() {
    let record = with_irn("IRN123");
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["status"], "IRN Generated");
    let back: InvoiceRecord = serde_json::from_value(json).unwrap();
    assert_eq!(back, record);
}
