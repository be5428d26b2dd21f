use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::{round2, slug};

/// Digit count of a Brazilian CEP.
pub const POSTAL_CODE_DIGITS: usize = 8;

/// Postal code reduced to its digits.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PostalCode(String);

impl PostalCode {
    /// Strips every non-digit; the remainder must be exactly [`POSTAL_CODE_DIGITS`] long.
    pub fn parse(raw: &str) -> Option<Self> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        (digits.len() == POSTAL_CODE_DIGITS).then_some(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First two digits, used to infer the destination region.
    pub fn prefix(&self) -> u8 {
        self.0[..2].parse().unwrap_or(0)
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Package dimensions in centimeters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub height: f64,
    pub width: f64,
    pub length: f64,
}

impl Dimensions {
    pub fn new(height: f64, width: f64, length: f64) -> Self {
        Self {
            height,
            width,
            length,
        }
    }

    pub fn volume_cm3(&self) -> f64 {
        self.height * self.width * self.length
    }

    fn is_valid(&self) -> bool {
        [self.height, self.width, self.length]
            .iter()
            .all(|side| side.is_finite() && *side > 0.0)
    }
}

/// Raw quote input as it arrives from checkout, before validation.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteInput {
    #[serde(default, alias = "cep")]
    pub destination_postal_code: Option<String>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default, alias = "declaredValue")]
    pub value: Option<f64>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
}

impl QuoteInput {
    pub fn new(destination_postal_code: &str, weight_kg: f64, value: f64) -> Self {
        Self {
            destination_postal_code: Some(destination_postal_code.to_string()),
            weight_kg: Some(weight_kg),
            value: Some(value),
            dimensions: None,
        }
    }

    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RequestError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("postal code `{0}` must contain exactly {POSTAL_CODE_DIGITS} digits")]
    InvalidPostalCode(String),
    #[error("weight must be greater than zero (got {0})")]
    InvalidWeight(f64),
    #[error("declared value must not be negative (got {0})")]
    InvalidValue(f64),
    #[error("package dimensions must all be greater than zero")]
    InvalidDimensions,
}

/// A validated shipping request.
#[derive(Clone, Debug, PartialEq)]
pub struct ShippingRequest {
    pub destination: PostalCode,
    pub weight_kg: f64,
    pub dimensions: Option<Dimensions>,
    pub declared_value: f64,
}

impl TryFrom<QuoteInput> for ShippingRequest {
    type Error = RequestError;

    fn try_from(input: QuoteInput) -> Result<Self, Self::Error> {
        let raw_postal = input
            .destination_postal_code
            .ok_or(RequestError::MissingField("destinationPostalCode"))?;
        let weight_kg = input
            .weight_kg
            .ok_or(RequestError::MissingField("weightKg"))?;
        let declared_value = input.value.ok_or(RequestError::MissingField("value"))?;

        let destination = PostalCode::parse(&raw_postal)
            .ok_or_else(|| RequestError::InvalidPostalCode(raw_postal.clone()))?;

        if !weight_kg.is_finite() || weight_kg <= 0.0 {
            return Err(RequestError::InvalidWeight(weight_kg));
        }
        if !declared_value.is_finite() || declared_value < 0.0 {
            return Err(RequestError::InvalidValue(declared_value));
        }
        if let Some(dimensions) = input.dimensions {
            if !dimensions.is_valid() {
                return Err(RequestError::InvalidDimensions);
            }
        }

        Ok(Self {
            destination,
            weight_kg,
            dimensions: input.dimensions,
            declared_value,
        })
    }
}

/// Named shipping tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceLevel {
    Economy,
    Standard,
    Express,
}

impl ServiceLevel {
    pub const ALL: [ServiceLevel; 3] = [Self::Economy, Self::Standard, Self::Express];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Economy => "economy",
            Self::Standard => "standard",
            Self::Express => "express",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Economy => "Econômico",
            Self::Standard => "Padrão",
            Self::Express => "Expresso",
        }
    }
}

impl fmt::Display for ServiceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Where a quoted price came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSource {
    Live,
    Simulated,
}

/// One priced, timed shipping option offered at checkout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingOption {
    pub id: String,
    pub carrier: String,
    pub service: String,
    pub price: f64,
    pub delivery_estimate: String,
    pub source: QuoteSource,
}

impl ShippingOption {
    /// Builds an option with id `{carrier}-{service level}`. Negative or non-finite
    /// prices collapse to `0.0`.
    pub fn new(
        carrier: &str,
        level: ServiceLevel,
        service: impl Into<String>,
        price: f64,
        delivery_estimate: impl Into<String>,
        source: QuoteSource,
    ) -> Self {
        let price = if price.is_finite() { price.max(0.0) } else { 0.0 };
        Self {
            id: format!("{}-{}", slug(carrier), level.code()),
            carrier: carrier.to_string(),
            service: service.into(),
            price: round2(price),
            delivery_estimate: delivery_estimate.into(),
            source,
        }
    }

    pub fn is_simulated(&self) -> bool {
        self.source == QuoteSource::Simulated
    }
}

/// Recipient of a shipment created after payment approval.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub name: String,
    pub document: String,
    pub street: String,
    pub number: String,
    #[serde(default)]
    pub complement: Option<String>,
    pub district: String,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Payload for creating a carrier shipment for an approved order.
#[derive(Clone, Debug, PartialEq)]
pub struct ShipmentOrder {
    pub order_reference: String,
    pub recipient: Recipient,
    pub destination: PostalCode,
    pub weight_kg: f64,
    pub declared_value: f64,
    pub service_level: ServiceLevel,
    pub volumes: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentReceipt {
    pub code: String,
    pub shipment_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    /// RFC 3339 when the carrier timestamp could be parsed, verbatim otherwise.
    pub occurred_at: String,
    pub status: String,
    pub unit: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingInfo {
    pub code: String,
    pub status: String,
    pub events: Vec<TrackingEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postal_code_strips_formatting() {
        let cep = PostalCode::parse("01310-100").unwrap();
        assert_eq!(cep.as_str(), "01310100");
        assert_eq!(cep.prefix(), 1);
    }

    #[test]
    fn postal_code_rejects_wrong_digit_count() {
        assert!(PostalCode::parse("0131-100").is_none());
        assert!(PostalCode::parse("013101000").is_none());
        assert!(PostalCode::parse("abc").is_none());
    }

    #[test]
    fn request_requires_every_field() {
        let mut input = QuoteInput::new("01310-100", 3.0, 250.0);
        input.value = None;
        assert_eq!(
            ShippingRequest::try_from(input),
            Err(RequestError::MissingField("value"))
        );
    }

    #[test]
    fn request_rejects_zero_weight() {
        let input = QuoteInput::new("01310-100", 0.0, 250.0);
        assert_eq!(
            ShippingRequest::try_from(input),
            Err(RequestError::InvalidWeight(0.0))
        );
    }

    #[test]
    fn request_rejects_flat_box() {
        let input =
            QuoteInput::new("01310-100", 1.0, 0.0).with_dimensions(Dimensions::new(10.0, 0.0, 5.0));
        assert_eq!(
            ShippingRequest::try_from(input),
            Err(RequestError::InvalidDimensions)
        );
    }

    #[test]
    fn bad_postal_code_wins_over_other_fields() {
        let input = QuoteInput::new("1234", 0.0, 10.0);
        assert!(matches!(
            ShippingRequest::try_from(input),
            Err(RequestError::InvalidPostalCode(_))
        ));
    }

    #[test]
    fn option_price_is_rounded_and_non_negative() {
        let option = ShippingOption::new(
            "Frete Estimado",
            ServiceLevel::Express,
            "Expresso",
            -3.0,
            "1 a 3 dias úteis",
            QuoteSource::Simulated,
        );
        assert_eq!(option.id, "frete-estimado-express");
        assert_eq!(option.price, 0.0);

        let option = ShippingOption::new(
            "Jadlog",
            ServiceLevel::Economy,
            ".PACKAGE",
            21.456,
            "até 5 dias úteis",
            QuoteSource::Live,
        );
        assert_eq!(option.price, 21.46);
        assert!(!option.is_simulated());
    }
}
