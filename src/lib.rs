//! Shipping quotes for the shop checkout: live Jadlog rates when credentials are
//! configured, a regional rate table otherwise, cached for half an hour.

pub mod config;
pub mod domain;
pub mod infra;
pub mod server;
pub mod service;
pub mod util;
