use std::sync::Arc;

use crate::config::Config;
use crate::infra::cache::QuoteCache;
use crate::infra::carrier::{CarrierError, CarrierGateway};
use crate::infra::jadlog::JadlogClient;
use crate::service::{QuoteService, QuoteSettings};

pub struct State {
    pub quotes: QuoteService,
}

impl State {
    /// Wires the Jadlog client, the quote cache and the aggregator from `config`.
    pub fn from_config(config: &Config) -> Result<Arc<Self>, CarrierError> {
        let gateway = JadlogClient::new(&config.carrier)?;
        let settings = QuoteSettings {
            service_levels: config.carrier.service_levels.clone(),
            carrier_timeout: config.carrier.timeout(),
            volumetric_divisor: config.volumetric_divisor,
        };
        Ok(Self::new(
            Arc::new(gateway),
            QuoteCache::new(config.cache_ttl()),
            settings,
        ))
    }

    pub fn new(
        gateway: Arc<dyn CarrierGateway>,
        cache: QuoteCache,
        settings: QuoteSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            quotes: QuoteService::new(gateway, cache, settings),
        })
    }
}
