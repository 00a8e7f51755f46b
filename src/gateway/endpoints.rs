use crate::classify::Endpoint;
use crate::config::GatewayMode;

/// Token endpoint; shared by sandbox and production.
pub const AUTHENTICATE_URL: &str = "https://gsp.adaequare.com/gsp/authenticate?grant_type=token";

pub const PRODUCTION_HOST: &str = "https://gsp.adaequare.com";
pub const SANDBOX_HOST: &str = "https://gsp.adaequare.com/test";

/// Resolved URL per gateway endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    host: String,
    authenticate: String,
    generate_irn: String,
    cancel_irn: String,
    irn_details: String,
    gstin_details: String,
    generate_ewaybill: String,
    cancel_ewaybill: String,
}

impl Endpoints {
    /// Endpoints of the sandbox or production host.
    pub fn for_mode(mode: GatewayMode) -> Self {
        let host = match mode {
            GatewayMode::Sandbox => SANDBOX_HOST,
            GatewayMode::Production => PRODUCTION_HOST,
        };
        Self::with_host(host, AUTHENTICATE_URL)
    }

    /// Endpoints under an arbitrary host, e.g. a local mock server.
    pub fn with_host(host: &str, authenticate_url: &str) -> Self {
        let host = host.trim_end_matches('/');
        Self {
            host: host.to_string(),
            authenticate: authenticate_url.to_string(),
            generate_irn: format!("{host}/enriched/ei/api/invoice"),
            cancel_irn: format!("{host}/enriched/ei/api/invoice/cancel"),
            irn_details: format!("{host}/enriched/ei/api/invoice/irn"),
            gstin_details: format!("{host}/enriched/ei/api/master/gstin"),
            generate_ewaybill: format!("{host}/enriched/ei/api/ewaybill"),
            cancel_ewaybill: format!("{host}/enriched/ei/api/ewayapi"),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn url(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Authenticate => &self.authenticate,
            Endpoint::GenerateIrn => &self.generate_irn,
            Endpoint::CancelIrn => &self.cancel_irn,
            Endpoint::IrnDetails => &self.irn_details,
            Endpoint::GstinDetails => &self.gstin_details,
            Endpoint::GenerateEwayBill => &self.generate_ewaybill,
            Endpoint::CancelEwayBill => &self.cancel_ewaybill,
        }
    }
}
