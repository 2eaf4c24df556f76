pub mod config;
pub mod controller;
pub mod destination;
pub mod dns;
pub mod error;
pub mod geoip;
pub mod listener;
pub mod logging;
pub mod resolver;
pub mod session;
pub mod traits;

pub use tracing;
