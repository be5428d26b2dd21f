//! Shipping quote aggregation.
//!
//! Each request walks the same states:
//!
//! 1. validate the raw input (`InvalidRequest` stops here)
//! 2. cache lookup, returning early on a hit
//! 3. billable weight
//! 4. one carrier call per configured service level, concurrently, each under a timeout
//! 5. live options if at least one call succeeded, otherwise the simulated table
//! 6. sort ascending by price
//! 7. cache store
//!
//! Live and simulated options are never mixed in one response.

use std::{sync::Arc, time::Duration};

use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::domain::{
    compute_billable_weight, compute_simulated_options, QuoteInput, RequestError, ServiceLevel,
    ShippingOption, ShippingRequest, DEFAULT_VOLUMETRIC_DIVISOR,
};
use crate::infra::cache::{QuoteCache, QuoteKey};
use crate::infra::carrier::{CarrierError, CarrierGateway, RateQuery};

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),
    #[error("unable to calculate shipping")]
    FallbackExhausted,
}

#[derive(Clone, Debug)]
pub struct QuoteSettings {
    /// Service levels asked of the live carrier, one call each.
    pub service_levels: Vec<ServiceLevel>,
    pub carrier_timeout: Duration,
    pub volumetric_divisor: f64,
}

impl Default for QuoteSettings {
    fn default() -> Self {
        Self {
            service_levels: vec![ServiceLevel::Economy, ServiceLevel::Express],
            carrier_timeout: Duration::from_secs(8),
            volumetric_divisor: DEFAULT_VOLUMETRIC_DIVISOR,
        }
    }
}

/// Options for one request, cheapest first.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteOutcome {
    pub options: Vec<ShippingOption>,
    pub billable_weight: f64,
    pub from_cache: bool,
}

enum CarrierOutcome {
    Unconfigured,
    Quoted(Vec<ShippingOption>),
    AllFailed,
}

#[derive(Clone)]
pub struct QuoteService {
    gateway: Arc<dyn CarrierGateway>,
    cache: QuoteCache,
    settings: Arc<QuoteSettings>,
}

impl QuoteService {
    pub fn new(
        gateway: Arc<dyn CarrierGateway>,
        cache: QuoteCache,
        settings: QuoteSettings,
    ) -> Self {
        Self {
            gateway,
            cache,
            settings: Arc::new(settings),
        }
    }

    pub fn gateway(&self) -> &Arc<dyn CarrierGateway> {
        &self.gateway
    }

    pub fn cache(&self) -> &QuoteCache {
        &self.cache
    }

    /// Empties the quote cache, returning the number of dropped entries.
    pub fn clear_cache(&self) -> usize {
        let removed = self.cache.clear();
        info!(removed, "quote cache cleared");
        removed
    }

    /// Quotes shipping for `input`.
    ///
    /// Only malformed input is reported as an error; carrier failures degrade to the
    /// simulated table.
    pub async fn quote(&self, input: QuoteInput) -> Result<QuoteOutcome, QuoteError> {
        let span = info_span!("quote", request_id = %Uuid::new_v4());
        self.run(input).instrument(span).await
    }

    async fn run(&self, input: QuoteInput) -> Result<QuoteOutcome, QuoteError> {
        let request = ShippingRequest::try_from(input).map_err(|err| {
            warn!(%err, "rejecting quote request");
            QuoteError::from(err)
        })?;

        let key = QuoteKey::new(&request);
        if let Some(hit) = self.cache.get(&key) {
            info!(
                destination = %request.destination,
                age_secs = hit.age.as_secs(),
                "serving cached quote"
            );
            return Ok(QuoteOutcome {
                options: hit.options,
                billable_weight: hit.billable_weight,
                from_cache: true,
            });
        }

        let billable_weight = compute_billable_weight(
            request.weight_kg,
            request.dimensions.as_ref(),
            self.settings.volumetric_divisor,
        );
        debug!(real = request.weight_kg, billable = billable_weight, "billable weight");

        let (mut options, cacheable) = match self.query_carrier(&request, billable_weight).await {
            CarrierOutcome::Quoted(live) => (live, true),
            CarrierOutcome::Unconfigured => (self.simulated(&request, billable_weight), true),
            // Not cached, so the next request tries the carrier again.
            CarrierOutcome::AllFailed => (self.simulated(&request, billable_weight), false),
        };

        if options.is_empty() {
            error!(destination = %request.destination, "no shipping options could be produced");
            return Err(QuoteError::FallbackExhausted);
        }

        sort_by_price(&mut options);

        if cacheable {
            self.cache.put(key, options.clone(), billable_weight);
        }

        info!(
            destination = %request.destination,
            billable_weight,
            options = options.len(),
            simulated = options.iter().any(ShippingOption::is_simulated),
            "quote computed"
        );

        Ok(QuoteOutcome {
            options,
            billable_weight,
            from_cache: false,
        })
    }

    async fn query_carrier(
        &self,
        request: &ShippingRequest,
        billable_weight: f64,
    ) -> CarrierOutcome {
        let origin = match self.gateway.origin_postal_code() {
            Some(origin) if self.gateway.is_configured() => origin.clone(),
            _ => return CarrierOutcome::Unconfigured,
        };
        if self.settings.service_levels.is_empty() {
            return CarrierOutcome::Unconfigured;
        }

        let timeout = self.settings.carrier_timeout;
        let calls = self.settings.service_levels.iter().map(|&level| {
            let query = RateQuery {
                origin: origin.clone(),
                destination: request.destination.clone(),
                billable_weight_kg: billable_weight,
                declared_value: request.declared_value,
                service_level: level,
            };
            async move {
                let call = self.gateway.fetch_rate(&query);
                let result = match tokio::time::timeout(timeout, call).await {
                    Ok(result) => result,
                    Err(_) => Err(CarrierError::Timeout(timeout)),
                };
                (level, result)
            }
        });

        let mut live = Vec::new();
        for (level, result) in join_all(calls).await {
            match result {
                Ok(option) => {
                    debug!(service_level = %level, price = option.price, "carrier rate");
                    live.push(option);
                }
                Err(err) => {
                    warn!(
                        carrier = self.gateway.name(),
                        service_level = %level,
                        error = %err,
                        "carrier rate failed; skipping"
                    );
                }
            }
        }

        if live.is_empty() {
            warn!(
                carrier = self.gateway.name(),
                "no live rates; falling back to simulated table"
            );
            CarrierOutcome::AllFailed
        } else {
            CarrierOutcome::Quoted(live)
        }
    }

    fn simulated(&self, request: &ShippingRequest, billable_weight: f64) -> Vec<ShippingOption> {
        compute_simulated_options(&request.destination, billable_weight, request.declared_value)
    }
}

/// Ascending by price; ties keep their original order.
pub fn sort_by_price(options: &mut [ShippingOption]) {
    options.sort_by(|a, b| a.price.total_cmp(&b.price));
}
