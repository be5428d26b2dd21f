//! Layered configuration: optional `shipping.toml`, then `SHIPPING__*` environment overrides.

use std::{fmt, path::Path, time::Duration};

use config::{Environment, File};
use serde::{de, Deserialize, Deserializer};
use thiserror::Error;
use tracing::info;

use crate::domain::{ServiceLevel, DEFAULT_VOLUMETRIC_DIVISOR};
use crate::infra::cache::QUOTE_CACHE_TTL;

const CONFIG_FILE: &str = "shipping";
const ENV_PREFIX: &str = "SHIPPING";
const DEFAULT_CARRIER_URL: &str = "https://www.jadlog.com.br/embarcador/api/";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub cache_ttl_secs: u64,
    pub volumetric_divisor: f64,
    pub carrier: CarrierSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            cache_ttl_secs: QUOTE_CACHE_TTL.as_secs(),
            volumetric_divisor: DEFAULT_VOLUMETRIC_DIVISOR,
            carrier: CarrierSettings::default(),
        }
    }
}

impl Config {
    /// Loads `shipping.{toml,json,yaml}` from the working directory when present,
    /// then applies `SHIPPING__` environment variables (`SHIPPING__CARRIER__TOKEN`, ...).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(CONFIG_FILE)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config: Config = config::Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        config.validate()?;

        info!(
            source = %path.display(),
            port = config.port,
            cache_ttl_secs = config.cache_ttl_secs,
            service_levels = ?config.carrier.service_levels,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Rejects values that would make every quote meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.volumetric_divisor.is_finite() || self.volumetric_divisor <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "volumetric_divisor",
                reason: "must be a finite number greater than zero",
            });
        }
        if self.carrier.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "carrier.timeout_secs",
                reason: "must be at least one second",
            });
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Carrier credentials and rate-lookup options.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CarrierSettings {
    pub base_url: String,
    pub token: Option<String>,
    /// Shipper CNPJ registered with the carrier.
    pub cnpj: Option<String>,
    pub account: Option<String>,
    pub contract: Option<String>,
    pub origin_postal_code: Option<String>,
    pub timeout_secs: u64,
    #[serde(deserialize_with = "service_levels_from_list")]
    pub service_levels: Vec<ServiceLevel>,
}

impl Default for CarrierSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CARRIER_URL.to_string(),
            token: None,
            cnpj: None,
            account: None,
            contract: None,
            origin_postal_code: None,
            timeout_secs: 8,
            service_levels: vec![ServiceLevel::Economy, ServiceLevel::Express],
        }
    }
}

impl CarrierSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Accepts a sequence (`["economy", "express"]`) or a comma-separated string
/// (`economy,express`), the form environment variables arrive in.
fn service_levels_from_list<'de, D>(deserializer: D) -> Result<Vec<ServiceLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ListOrCsv;

    impl<'de> de::Visitor<'de> for ListOrCsv {
        type Value = Vec<ServiceLevel>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a list of service levels or a comma-separated string")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            value
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| {
                    parse_level(part)
                        .ok_or_else(|| E::custom(format!("unknown service level `{part}`")))
                })
                .collect()
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut levels = Vec::new();
            while let Some(level) = seq.next_element::<ServiceLevel>()? {
                levels.push(level);
            }
            Ok(levels)
        }
    }

    deserializer.deserialize_any(ListOrCsv)
}

fn parse_level(raw: &str) -> Option<ServiceLevel> {
    ServiceLevel::ALL
        .into_iter()
        .find(|level| level.code().eq_ignore_ascii_case(raw))
}
