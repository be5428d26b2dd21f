pub mod cache;
pub mod carrier;
pub mod jadlog;

pub use cache::{CachedQuote, QuoteCache, QuoteKey, QUOTE_CACHE_TTL};
pub use carrier::{CarrierError, CarrierGateway, RateQuery};
pub use jadlog::JadlogClient;
