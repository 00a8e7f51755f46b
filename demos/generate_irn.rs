//! Generate an IRN for an invoice JSON file.
//!
//! ```text
//! cargo run --example generate_irn -- gateway.toml invoice.json SINV-0001
//! ```
//!
//! `invoice.json` holds the invoice in the government e-invoice schema;
//! its `SellerDtls.Gstin` selects the credential row.

use std::path::Path;
use std::sync::Arc;

use gstlink::config::GatewaySettings;
use gstlink::core::*;
use gstlink::gateway::*;
use serde_json::Value;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gstlink=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [settings_path, invoice_path, invoice_id] = args.as_slice() else {
        eprintln!("usage: generate_irn <settings.toml> <invoice.json> <invoice id>");
        std::process::exit(2);
    };

    if let Err(e) = run(settings_path, invoice_path, invoice_id) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(settings_path: &str, invoice_path: &str, invoice_id: &str) -> Result<(), GatewayError> {
    let settings = GatewaySettings::load(Path::new(settings_path))?;

    let raw = std::fs::read_to_string(invoice_path)
        .map_err(|e| GatewayError::Config(format!("{invoice_path}: {e}")))?;
    let einvoice: Value =
        serde_json::from_str(&raw).map_err(|e| GatewayError::Schema(e.to_string()))?;
    let gstin = einvoice["SellerDtls"]["Gstin"]
        .as_str()
        .ok_or_else(|| GatewayError::Schema("SellerDtls.Gstin missing".into()))?
        .to_string();

    let files = Arc::new(MemoryAttachmentStore::new());
    let ctx = GatewayContext::builder(settings)
        .audit(Arc::new(JsonlAuditStore::new("einvoice-audit.jsonl")))
        .invoices(Arc::new(MemoryInvoiceStore::new()))
        .attachments(files.clone())
        .build()?;

    let mut invoice = PreparedInvoice::new(InvoiceRecord::new(invoice_id, gstin), einvoice);
    let outcome = generate_irn(&ctx, &mut invoice)?;

    if !outcome.success {
        println!("=== Rejected ===");
        for e in &outcome.errors {
            println!("  {e}");
        }
        return Ok(());
    }

    let record = &invoice.record;
    println!("=== IRN Generated ===");
    println!("  IRN:      {}", record.irn.as_deref().unwrap_or_default());
    println!("  Ack No:   {}", record.ack_no.as_deref().unwrap_or_default());
    println!("  Ack Date: {}", record.ack_date.as_deref().unwrap_or_default());
    if let Some(url) = &record.qrcode_path {
        if let Some(qr) = files.get(url) {
            std::fs::write(&qr.file_name, &qr.content)
                .map_err(|e| GatewayError::Storage(e.to_string()))?;
            println!("  QR code:  {}", qr.file_name);
        }
    }
    Ok(())
}
