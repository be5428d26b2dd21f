//! Carrier gateway seam used by the quote service.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    PostalCode, ServiceLevel, ShipmentOrder, ShipmentReceipt, ShippingOption, TrackingInfo,
};

#[derive(Debug, Error)]
pub enum CarrierError {
    #[error("carrier is not configured")]
    NotConfigured,
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("carrier responded with status {0}")]
    Status(u16),
    #[error("api error: {0}")]
    Api(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// One rate lookup: a single service level between two postal codes.
#[derive(Clone, Debug, PartialEq)]
pub struct RateQuery {
    pub origin: PostalCode,
    pub destination: PostalCode,
    pub billable_weight_kg: f64,
    pub declared_value: f64,
    pub service_level: ServiceLevel,
}

#[async_trait]
pub trait CarrierGateway: Send + Sync {
    /// Display name used on live options.
    fn name(&self) -> &str;

    /// True only when credentials and a valid origin are present.
    /// Callers check this before any remote operation.
    fn is_configured(&self) -> bool;

    fn origin_postal_code(&self) -> Option<&PostalCode>;

    /// Price and delivery time for exactly one service level.
    async fn fetch_rate(&self, query: &RateQuery) -> Result<ShippingOption, CarrierError>;

    async fn create_shipment(&self, order: &ShipmentOrder)
        -> Result<ShipmentReceipt, CarrierError>;

    async fn track(&self, code: &str) -> Result<TrackingInfo, CarrierError>;
}
