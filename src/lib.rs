#![doc(test(attr(deny(warnings))))]

//! Period Core offers the financial model, lifecycle store, and request
//! routing shim that power period-based budgeting workflows.

pub mod config;
pub mod dates;
pub mod errors;
pub mod metrics;
pub mod period;
pub mod router;
pub mod store;
pub mod suggest;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Period Core tracing initialized.");
    });
}
