pub mod quote;

pub use quote::{sort_by_price, QuoteError, QuoteOutcome, QuoteService, QuoteSettings};
