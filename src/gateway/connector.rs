//! Gateway operations for one seller GSTIN.
//!
//! A [`Connector`] resolves the GSTIN's credentials when it is created, so a
//! disabled integration or a missing credential row fails before anything
//! is sent. Each operation then makes one main call, preceded by a token
//! refresh when the cached token is missing or close to expiry:
//!
//! 1. guard the invoice's current status,
//! 2. send the audited request,
//! 3. classify the response,
//! 4. reconcile accepted outcomes into the invoice record.
//!
//! Gateway rejections come back as `Ok(Outcome { success: false, .. })`.
//! Configuration, transport and storage failures are `Err`.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use reqwest::Url;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use super::audit::{AuditStore, RequestAuditEntry};
use super::endpoints::Endpoints;
use super::reconcile::Reconciler;
use super::session::GatewaySession;
use super::store::{AttachmentStore, EInvoice, InvoiceStore};
use super::transport::{GatewayRequest, HttpTransport, Transport};
use crate::classify::{
    AuthResponse, ClassifiedOutcome, Endpoint, EwayBill, GatewayResponse, GstinDetails,
    IrnCancellation, IrnDetails, classify, decode_result, duplicate_irn, sanitize_error_message,
};
use crate::config::GatewaySettings;
use crate::core::{GatewayCredentials, GatewayError, Operation, Outcome, check_transition};

/// Actor recorded in audit entries when none is configured.
pub const SYSTEM_ACTOR: &str = "system";

/// Tenant name of the session created by [`GatewayContextBuilder`] when
/// none is supplied.
pub const DEFAULT_TENANT: &str = "default";

/// Everything an operation needs besides the invoice.
///
/// Cheap to clone; all collaborators are shared.
#[derive(Clone)]
pub struct GatewayContext {
    settings: Arc<GatewaySettings>,
    session: Arc<GatewaySession>,
    transport: Arc<dyn Transport>,
    audit: Arc<dyn AuditStore>,
    invoices: Arc<dyn InvoiceStore>,
    attachments: Arc<dyn AttachmentStore>,
    actor: String,
}

impl GatewayContext {
    pub fn builder(settings: GatewaySettings) -> GatewayContextBuilder {
        GatewayContextBuilder::new(settings)
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    pub fn session(&self) -> &Arc<GatewaySession> {
        &self.session
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    fn endpoints(&self) -> &Endpoints {
        self.session.endpoints()
    }

    fn reconciler(&self) -> Reconciler<'_> {
        Reconciler::new(self.invoices.as_ref(), self.attachments.as_ref())
    }
}

impl fmt::Debug for GatewayContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayContext")
            .field("settings", &self.settings)
            .field("session", &self.session)
            .field("actor", &self.actor)
            .finish_non_exhaustive()
    }
}

/// Builder for [`GatewayContext`].
///
/// The audit, invoice and attachment stores are required. The transport
/// defaults to [`HttpTransport`] with the configured timeout and the
/// session to a fresh one for the configured mode.
pub struct GatewayContextBuilder {
    settings: GatewaySettings,
    session: Option<Arc<GatewaySession>>,
    transport: Option<Arc<dyn Transport>>,
    audit: Option<Arc<dyn AuditStore>>,
    invoices: Option<Arc<dyn InvoiceStore>>,
    attachments: Option<Arc<dyn AttachmentStore>>,
    actor: Option<String>,
}

impl GatewayContextBuilder {
    pub fn new(settings: GatewaySettings) -> Self {
        Self {
            settings,
            session: None,
            transport: None,
            audit: None,
            invoices: None,
            attachments: None,
            actor: None,
        }
    }

    /// Share a session, e.g. one from a [`SessionRegistry`](super::SessionRegistry).
    pub fn session(mut self, session: Arc<GatewaySession>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn audit(mut self, audit: Arc<dyn AuditStore>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn invoices(mut self, invoices: Arc<dyn InvoiceStore>) -> Self {
        self.invoices = Some(invoices);
        self
    }

    pub fn attachments(mut self, attachments: Arc<dyn AttachmentStore>) -> Self {
        self.attachments = Some(attachments);
        self
    }

    /// User or principal recorded in the audit log.
    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// # Errors
    ///
    /// `GatewayError::Config` when a required store is missing, and any
    /// error from building the default HTTP client.
    pub fn build(self) -> Result<GatewayContext, GatewayError> {
        let audit = self
            .audit
            .ok_or_else(|| GatewayError::Config("no audit store configured".into()))?;
        let invoices = self
            .invoices
            .ok_or_else(|| GatewayError::Config("no invoice store configured".into()))?;
        let attachments = self
            .attachments
            .ok_or_else(|| GatewayError::Config("no attachment store configured".into()))?;
        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::from_settings(&self.settings)?),
        };
        let session = self.session.unwrap_or_else(|| {
            Arc::new(GatewaySession::new(
                DEFAULT_TENANT,
                Endpoints::for_mode(self.settings.mode()),
            ))
        });

        Ok(GatewayContext {
            settings: Arc::new(self.settings),
            session,
            transport,
            audit,
            invoices,
            attachments,
            actor: self.actor.unwrap_or_else(|| SYSTEM_ACTOR.to_string()),
        })
    }
}

/// Result of a read-only gateway lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    /// The gateway rejected the lookup; sanitized messages.
    Rejected(Vec<String>),
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Rejected(_) => None,
        }
    }
}

/// Gateway client bound to one seller GSTIN.
pub struct Connector<'a> {
    ctx: &'a GatewayContext,
    credentials: &'a GatewayCredentials,
}

impl<'a> Connector<'a> {
    /// # Errors
    ///
    /// `GatewayError::Disabled` or `GatewayError::MissingCredentials`.
    pub fn new(ctx: &'a GatewayContext, gstin: &str) -> Result<Self, GatewayError> {
        let credentials = ctx.settings.resolve(gstin)?;
        Ok(Self { ctx, credentials })
    }

    pub fn gstin(&self) -> &str {
        &self.credentials.gstin
    }

    /// Register the invoice with the gateway and record the issued IRN.
    ///
    /// A "2150 already generated" rejection is reconciled by looking the
    /// existing IRN up and applying it as if it had just been issued. If
    /// that lookup is rejected its errors are returned.
    pub fn generate_irn<E: EInvoice + ?Sized>(
        &self,
        invoice: &mut E,
    ) -> Result<Outcome, GatewayError> {
        check_transition(invoice.record(), Operation::GenerateIrn)?;
        let invoice_id = invoice.record().id.clone();
        let payload = pretty_json(&invoice.einvoice_json()?)?;

        let url = self.ctx.endpoints().url(Endpoint::GenerateIrn).to_string();
        let response = self.post(url, payload, &invoice_id)?;

        let details: IrnDetails = match classify(&response, Endpoint::GenerateIrn) {
            ClassifiedOutcome::Success(result) => {
                decode_result(result.as_ref(), Endpoint::GenerateIrn)?
            }
            ClassifiedOutcome::AlreadyExists(result) => {
                let irn = duplicate_irn(result.as_ref())?;
                warn!(invoice = %invoice_id, %irn, "IRN already generated, fetching details");
                match self.lookup_irn(&irn, Some(&invoice_id))? {
                    Lookup::Found(details) => details,
                    Lookup::Rejected(errors) => {
                        warn!(invoice = %invoice_id, %irn, ?errors, "IRN details lookup rejected");
                        return Ok(Outcome::rejected(errors));
                    }
                }
            }
            ClassifiedOutcome::ValidationError(errors) => {
                warn!(invoice = %invoice_id, ?errors, "IRN generation rejected");
                return Ok(Outcome::rejected(errors));
            }
        };

        self.ctx.reconciler().apply_irn(invoice.record_mut(), &details)?;
        info!(invoice = %invoice_id, irn = %details.irn, "IRN generated");
        Ok(Outcome::ok())
    }

    /// Cancel the invoice's IRN. "9999 already cancelled" counts as success.
    pub fn cancel_irn<E: EInvoice + ?Sized>(
        &self,
        invoice: &mut E,
        reason: &str,
        remark: &str,
    ) -> Result<Outcome, GatewayError> {
        check_transition(invoice.record(), Operation::CancelIrn)?;
        let record = invoice.record();
        let invoice_id = record.id.clone();
        let irn = record.irn.clone().unwrap_or_default();

        let payload = pretty_json(&json!({
            "Irn": irn,
            "Cnlrsn": reason,
            "Cnlrem": remark,
        }))?;
        let url = self.ctx.endpoints().url(Endpoint::CancelIrn).to_string();
        let response = self.post(url, payload, &invoice_id)?;

        match classify(&response, Endpoint::CancelIrn) {
            ClassifiedOutcome::Success(result) | ClassifiedOutcome::AlreadyExists(result) => {
                // CancelDate is optional and the result may be absent on 9999.
                let cancellation = result
                    .as_ref()
                    .and_then(|v| serde_json::from_value::<IrnCancellation>(v.clone()).ok());
                self.ctx
                    .reconciler()
                    .apply_irn_cancellation(invoice.record_mut(), cancellation.as_ref())?;
                info!(invoice = %invoice_id, %irn, "IRN cancelled");
                Ok(Outcome::ok())
            }
            ClassifiedOutcome::ValidationError(errors) => {
                warn!(invoice = %invoice_id, %irn, ?errors, "IRN cancellation rejected");
                Ok(Outcome::rejected(errors))
            }
        }
    }

    /// Generate an e-way bill against the invoice's active IRN.
    pub fn generate_eway_bill<E: EInvoice + ?Sized>(
        &self,
        invoice: &mut E,
    ) -> Result<Outcome, GatewayError> {
        check_transition(invoice.record(), Operation::GenerateEwayBill)?;
        let invoice_id = invoice.record().id.clone();
        let payload = pretty_json(&invoice.eway_bill_json()?)?;

        let url = self.ctx.endpoints().url(Endpoint::GenerateEwayBill).to_string();
        let response = self.post(url, payload, &invoice_id)?;

        match classify(&response, Endpoint::GenerateEwayBill) {
            ClassifiedOutcome::Success(result) | ClassifiedOutcome::AlreadyExists(result) => {
                let bill: EwayBill = decode_result(result.as_ref(), Endpoint::GenerateEwayBill)?;
                self.ctx
                    .reconciler()
                    .apply_eway_bill(invoice.record_mut(), &bill)?;
                info!(invoice = %invoice_id, ewaybill = ?bill.ewb_no, "e-way bill generated");
                Ok(Outcome::ok())
            }
            ClassifiedOutcome::ValidationError(errors) => {
                warn!(invoice = %invoice_id, ?errors, "e-way bill generation rejected");
                Ok(Outcome::rejected(errors))
            }
        }
    }

    /// Cancel the invoice's current e-way bill.
    pub fn cancel_eway_bill<E: EInvoice + ?Sized>(
        &self,
        invoice: &mut E,
        reason: &str,
        remark: &str,
    ) -> Result<Outcome, GatewayError> {
        check_transition(invoice.record(), Operation::CancelEwayBill)?;
        let record = invoice.record();
        let invoice_id = record.id.clone();
        let ewaybill = record.ewaybill.clone().unwrap_or_default();

        let payload = pretty_json(&json!({
            "ewbNo": ewaybill,
            "cancelRsnCode": reason,
            "cancelRmrk": remark,
        }))?;
        let url = self.ctx.endpoints().url(Endpoint::CancelEwayBill).to_string();
        let response = self.post(url, payload, &invoice_id)?;

        match classify(&response, Endpoint::CancelEwayBill) {
            ClassifiedOutcome::Success(_) | ClassifiedOutcome::AlreadyExists(_) => {
                self.ctx
                    .reconciler()
                    .apply_eway_bill_cancellation(invoice.record_mut())?;
                info!(invoice = %invoice_id, %ewaybill, "e-way bill cancelled");
                Ok(Outcome::ok())
            }
            ClassifiedOutcome::ValidationError(errors) => {
                warn!(invoice = %invoice_id, %ewaybill, ?errors, "e-way bill cancellation rejected");
                Ok(Outcome::rejected(errors))
            }
        }
    }

    /// Fetch the gateway's record of `irn`.
    pub fn irn_details(&self, irn: &str) -> Result<Lookup<IrnDetails>, GatewayError> {
        self.lookup_irn(irn, None)
    }

    /// Fetch the taxpayer master data of `gstin`.
    pub fn gstin_details(&self, gstin: &str) -> Result<Lookup<GstinDetails>, GatewayError> {
        self.lookup(Endpoint::GstinDetails, ("gstin", gstin), None)
    }

    fn lookup_irn(
        &self,
        irn: &str,
        invoice_ref: Option<&str>,
    ) -> Result<Lookup<IrnDetails>, GatewayError> {
        self.lookup(Endpoint::IrnDetails, ("irn", irn), invoice_ref)
    }

    /// GET `endpoint` with a single form-encoded query parameter.
    fn lookup<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        query: (&str, &str),
        invoice_ref: Option<&str>,
    ) -> Result<Lookup<T>, GatewayError> {
        let base = self.ctx.endpoints().url(endpoint);
        let url = Url::parse_with_params(base, [query])
            .map_err(|err| GatewayError::Config(format!("invalid endpoint URL {base}: {err}")))?;
        let request = GatewayRequest::get(url.to_string()).headers(self.headers()?);
        let response = GatewayResponse::from_value(&self.send_audited(&request, invoice_ref)?);
        if response.success {
            return Ok(Lookup::Found(decode_result(
                response.result.as_ref(),
                endpoint,
            )?));
        }
        Ok(Lookup::Rejected(sanitize_error_message(
            response.message_text(),
        )))
    }

    fn post(
        &self,
        url: String,
        payload: String,
        invoice_ref: &str,
    ) -> Result<GatewayResponse, GatewayError> {
        let request = GatewayRequest::post(url, Some(payload)).headers(self.headers()?);
        let body = self.send_audited(&request, Some(invoice_ref))?;
        Ok(GatewayResponse::from_value(&body))
    }

    /// Send `request` and append its audit entry, whatever the result.
    fn send_audited(
        &self,
        request: &GatewayRequest,
        invoice_ref: Option<&str>,
    ) -> Result<Value, GatewayError> {
        debug!(method = ?request.method, url = %request.url, "gateway request");
        let result = self.ctx.transport.send(request);
        let entry = RequestAuditEntry::for_request(
            request,
            &self.credentials.password,
            invoice_ref,
            &self.ctx.actor,
        )
        .with_result(&result);
        self.ctx.audit.append(entry)?;

        if let Err(e) = &result {
            error!(url = %request.url, error = %e, "gateway call failed");
        }
        result
    }

    fn authenticate(&self) -> Result<AuthResponse, GatewayError> {
        let app = self.ctx.settings.app_credentials()?;
        let request =
            GatewayRequest::post(self.ctx.endpoints().url(Endpoint::Authenticate), None)
                .header("gspappid", app.client_id)
                .header("gspappsecret", app.client_secret);
        let body = self.send_audited(&request, None)?;

        serde_json::from_value::<AuthResponse>(body.clone()).map_err(|e| {
            let response = GatewayResponse::from_value(&body);
            let reason = match response.message_text() {
                "" => e.to_string(),
                message => message.to_string(),
            };
            GatewayError::Transport(format!("authentication failed: {reason}"))
        })
    }

    fn headers(&self) -> Result<Vec<(String, String)>, GatewayError> {
        let token = self.ctx.session.token_with(|| self.authenticate())?;
        let creds = self.credentials;
        Ok(vec![
            ("content-type".into(), "application/json".into()),
            ("user_name".into(), creds.username.clone()),
            ("password".into(), creds.password.clone()),
            ("gstin".into(), creds.gstin.clone()),
            ("authorization".into(), token),
            ("requestid".into(), request_id()),
        ])
    }
}

/// Generate the IRN for `invoice` with its seller GSTIN's credentials.
pub fn generate_irn<E: EInvoice + ?Sized>(
    ctx: &GatewayContext,
    invoice: &mut E,
) -> Result<Outcome, GatewayError> {
    let gstin = invoice.record().seller_gstin.clone();
    Connector::new(ctx, &gstin)?.generate_irn(invoice)
}

/// Cancel the IRN of `invoice`.
pub fn cancel_irn<E: EInvoice + ?Sized>(
    ctx: &GatewayContext,
    invoice: &mut E,
    reason: &str,
    remark: &str,
) -> Result<Outcome, GatewayError> {
    let gstin = invoice.record().seller_gstin.clone();
    Connector::new(ctx, &gstin)?.cancel_irn(invoice, reason, remark)
}

/// Generate an e-way bill for `invoice`.
pub fn generate_eway_bill<E: EInvoice + ?Sized>(
    ctx: &GatewayContext,
    invoice: &mut E,
) -> Result<Outcome, GatewayError> {
    let gstin = invoice.record().seller_gstin.clone();
    Connector::new(ctx, &gstin)?.generate_eway_bill(invoice)
}

/// Cancel the e-way bill of `invoice`.
pub fn cancel_eway_bill<E: EInvoice + ?Sized>(
    ctx: &GatewayContext,
    invoice: &mut E,
    reason: &str,
    remark: &str,
) -> Result<Outcome, GatewayError> {
    let gstin = invoice.record().seller_gstin.clone();
    Connector::new(ctx, &gstin)?.cancel_eway_bill(invoice, reason, remark)
}

/// 18 random bytes, base64.
fn request_id() -> String {
    let mut bytes = [0u8; 18];
    rand::thread_rng().fill_bytes(&mut bytes);
    BASE64.encode(bytes)
}

/// JSON with a 4-space indent.
fn pretty_json(value: &Value) -> Result<String, GatewayError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut ser)
        .map_err(|e| GatewayError::Schema(e.to_string()))?;
    String::from_utf8(buf).map_err(|e| GatewayError::Schema(e.to_string()))
}
