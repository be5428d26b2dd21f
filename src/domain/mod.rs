//! Shipping domain: request validation, billable weight and the offline rate table.

pub mod entities;
pub mod simulated;
pub mod weight;

pub use entities::{
    Dimensions, PostalCode, QuoteInput, QuoteSource, Recipient, RequestError, ServiceLevel,
    ShipmentOrder, ShipmentReceipt, ShippingOption, ShippingRequest, TrackingEvent, TrackingInfo,
    POSTAL_CODE_DIGITS,
};
pub use simulated::{compute_simulated_options, Region, SIMULATED_CARRIER};
pub use weight::{billable_weight, compute_billable_weight, DEFAULT_VOLUMETRIC_DIVISOR};
