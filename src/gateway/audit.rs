//! Append-only request audit log.
//!
//! Every outbound call leaves exactly one entry, written before the call's
//! result is handed back. Entries carry the credential password in clear so
//! the exact request can be reproduced; the store must be access-controlled.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::transport::{GatewayRequest, Method};
use crate::core::GatewayError;

/// One logged request/response pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestAuditEntry {
    pub url: String,
    pub method: Method,
    /// Request headers plus the credential `password`.
    pub headers: BTreeMap<String, String>,
    pub payload: Option<String>,
    /// Parsed response body, absent when the transport failed.
    pub response: Option<Value>,
    /// Transport failure text, absent when a response was received.
    pub error: Option<String>,
    /// Invoice the call was made for.
    pub invoice_ref: Option<String>,
    /// User or system principal that triggered the call.
    pub actor: String,
    pub timestamp: DateTime<Utc>,
}

impl RequestAuditEntry {
    /// Entry for `request` with the outcome still unset.
    pub fn for_request(
        request: &GatewayRequest,
        password: &str,
        invoice_ref: Option<&str>,
        actor: &str,
    ) -> Self {
        let mut headers: BTreeMap<String, String> = request.headers.iter().cloned().collect();
        headers.insert("password".into(), password.to_string());
        Self {
            url: request.url.clone(),
            method: request.method,
            headers,
            payload: request.body.clone(),
            response: None,
            error: None,
            invoice_ref: invoice_ref.map(str::to_string),
            actor: actor.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Record the call's result.
    pub fn with_result(mut self, result: &Result<Value, GatewayError>) -> Self {
        match result {
            Ok(body) => self.response = Some(body.clone()),
            Err(e) => self.error = Some(e.to_string()),
        }
        self
    }
}

/// Durable sink for audit entries.
pub trait AuditStore: Send + Sync {
    /// Persist `entry` before returning.
    fn append(&self, entry: RequestAuditEntry) -> Result<(), GatewayError>;
}

/// In-process audit log.
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    entries: Mutex<Vec<RequestAuditEntry>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<RequestAuditEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl AuditStore for MemoryAuditStore {
    fn append(&self, entry: RequestAuditEntry) -> Result<(), GatewayError> {
        self.entries.lock().push(entry);
        Ok(())
    }
}

/// Audit log as a JSON-lines file, one entry per line, fsynced per append.
#[derive(Debug)]
pub struct JsonlAuditStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlAuditStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back all entries.
    pub fn read_all(&self) -> Result<Vec<RequestAuditEntry>, GatewayError> {
        let _guard = self.lock.lock();
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(GatewayError::Storage(e.to_string())),
        };
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|e| GatewayError::Storage(e.to_string()))
            })
            .collect()
    }
}

impl AuditStore for JsonlAuditStore {
    fn append(&self, entry: RequestAuditEntry) -> Result<(), GatewayError> {
        let mut line =
            serde_json::to_string(&entry).map_err(|e| GatewayError::Storage(e.to_string()))?;
        line.push('\n');

        let _guard = self.lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| GatewayError::Storage(format!("{}: {e}", self.path.display())))?;
        file.write_all(line.as_bytes())
            .and_then(|()| file.sync_data())
            .map_err(|e| GatewayError::Storage(format!("{}: {e}", self.path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> GatewayRequest {
        GatewayRequest::post("https://gsp.test/invoice", Some("{}".into()))
            .header("content-type", "application/json")
            .header("user_name", "acme")
            .header("password", "secret")
    }

    #[test]
    fn entry_records_password_and_response() {
        let entry = RequestAuditEntry::for_request(&request(), "secret", Some("SINV-0001"), "admin")
            .with_result(&Ok(json!({"success": true})));
        assert_eq!(entry.headers["password"], "secret");
        assert_eq!(entry.headers["user_name"], "acme");
        assert_eq!(entry.payload.as_deref(), Some("{}"));
        assert_eq!(entry.response, Some(json!({"success": true})));
        assert!(entry.error.is_none());
        assert_eq!(entry.invoice_ref.as_deref(), Some("SINV-0001"));
    }

    #[test]
    fn entry_records_password_even_when_header_absent() {
        let req = GatewayRequest::post("https://gsp.test/auth", None)
            .header("gspappid", "app")
            .header("gspappsecret", "app-secret");
        let entry = RequestAuditEntry::for_request(&req, "secret", None, "system");
        assert_eq!(entry.headers["password"], "secret");
        assert_eq!(entry.headers["gspappsecret"], "app-secret");
    }

    #[test]
    fn entry_records_transport_error() {
        let entry = RequestAuditEntry::for_request(&request(), "secret", None, "system")
            .with_result(&Err(GatewayError::Transport("timed out".into())));
        assert!(entry.response.is_none());
        assert!(entry.error.unwrap().contains("timed out"));
    }

    #[test]
    fn memory_store_appends() {
        let store = MemoryAuditStore::new();
        assert!(store.is_empty());
        store
            .append(RequestAuditEntry::for_request(&request(), "secret", None, "system"))
            .unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn jsonl_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlAuditStore::new(dir.path().join("audit.jsonl"));
        assert!(store.read_all().unwrap().is_empty());

        for invoice in ["SINV-0001", "SINV-0002"] {
            let entry = RequestAuditEntry::for_request(&request(), "secret", Some(invoice), "admin")
                .with_result(&Ok(json!({"success": false, "message": "3095 : inactive"})));
            store.append(entry).unwrap();
        }

        let entries = store.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].invoice_ref.as_deref(), Some("SINV-0002"));
        assert_eq!(entries[0].method, Method::Post);
    }

    #[test]
    fn jsonl_store_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlAuditStore::new(dir.path().join("missing").join("audit.jsonl"));
        let err = store
            .append(RequestAuditEntry::for_request(&request(), "secret", None, "system"))
            .unwrap_err();
        assert!(matches!(err, GatewayError::Storage(_)));
    }
}
