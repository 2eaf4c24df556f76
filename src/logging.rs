use std::str::FromStr;

use tracing::metadata::LevelFilter;
use tracing_subscriber::{
    Layer, filter::FilterFn, prelude::__tracing_subscriber_SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

#[macro_export]
macro_rules! log {
    ($level:expr, $direction:literal, $($arg:tt)+) => {
        $crate::tracing::event!($level, direction = $direction, $($arg)+)
    };
}

/// A request received from a client
#[macro_export]
macro_rules! incoming {
    (level = $level:ident, $($arg:tt)+) => {
        $crate::log!($crate::tracing::Level::$level, "incoming", $($arg)+)
    };

    ($($arg:tt)+) => {
        $crate::incoming!(level = TRACE, $($arg)+)
    };
}

/// A response written back to a client
#[macro_export]
macro_rules! outgoing {
    (level = $level:ident, $($arg:tt)+) => {
        $crate::log!($crate::tracing::Level::$level, "outgoing", $($arg)+)
    };

    ($($arg:tt)+) => {
        $crate::outgoing!(level = TRACE, $($arg)+)
    };
}

#[macro_export]
macro_rules! internal {
    (level = $level:ident, $($arg:tt)+) => {
        $crate::log!($crate::tracing::Level::$level, "internal", $($arg)+)
    };

    ($($arg:tt)+) => {
        $crate::internal!(level = TRACE, $($arg)+)
    };
}

fn level_from_env() -> LevelFilter {
    let default = if cfg!(debug_assertions) {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    };

    std::env::var("LOG_LEVEL").map_or(default, |level| {
        LevelFilter::from_str(level.as_str()).unwrap_or_else(|_| {
            eprintln!("Invalid log level specified {level}, defaulting to {default}");
            default
        })
    })
}

///
/// Install the global subscriber. Only events emitted by this crate are kept.
///
/// # Errors
/// If a global subscriber has already been installed
///
pub fn init() -> Result<(), TryInitError> {
    tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_ansi(true)
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_filter(level_from_env())
                .with_filter(FilterFn::new(|metadata| {
                    metadata.target().starts_with(CRATE_TARGET)
                })),
        )
        .try_init()
}
