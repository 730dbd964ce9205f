//! PSE&G usage poller
//!
//! This application logs into the PSE&G customer portal with the account's
//! credentials, retrieves the electricity and gas usage/cost figures from
//! the server-rendered dashboard, and logs the normalized readings once per
//! polling interval.
//!
//! # Architecture
//!
//! Each poll runs one sequential fetch cycle: authenticate (direct HTTP
//! first, headless browser fallback), fetch the per-commodity usage pages,
//! extract figures from the markup, and normalize units to kWh.
//!
//! # Features
//!
//! - Direct-HTTP login with browser-automation fallback
//! - Tolerant extraction across several markup shapes
//! - Graceful shutdown on SIGTERM/SIGINT
//! - Configurable polling interval and per-cycle timeout

mod config;
mod error;
mod model;
mod pipeline;
mod pseg;

#[cfg(test)]
mod test_utils;

use crate::model::{Credentials, FetchResult};
use crate::pipeline::Pipeline;
use std::sync::Arc;
use tokio::signal::ctrl_c;
use tokio::signal::unix::{signal, SignalKind};
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Application entry point.
///
/// Initializes configuration, builds the pipeline, and manages the poll
/// loop with signal handling for graceful shutdown.
#[tokio::main]
async fn main() {
    let app_config = config::load_app_config().expect("Failed to load AppConfig");
    tracing_subscriber::fmt()
        .with_max_level(app_config.log_level())
        .init();

    let poller_config = config::load_poller_config().expect("Failed to load PollerConfig");
    let pseg_config = config::load_pseg_config().expect("Failed to load PsegConfig");

    let credentials = Credentials::new(&pseg_config.username, &pseg_config.password);
    let pipeline = Arc::new(Pipeline::new(pseg_config));

    let mut poll_tick = interval(Duration::from_secs(poller_config.poll_interval_sec));
    poll_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut sig_term = signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
    tracing::info!(
        interval_sec = poller_config.poll_interval_sec,
        "Running... Press Ctrl-C or send SIGTERM to terminate."
    );

    loop {
        tokio::select! {
            // Handle SIGTERM for graceful shutdown in containers
            _ = sig_term.recv() => {
                tracing::info!("Received SIGTERM. Exiting...");
                break;
            }
            // Handle Ctrl-C for manual termination
            _ = ctrl_c() => {
                tracing::info!("Received SIGINT. Exiting...");
                break;
            }
            _ = poll_tick.tick() => {
                run_cycle(
                    Arc::clone(&pipeline),
                    credentials.clone(),
                    poller_config.cycle_timeout_sec,
                )
                .await;
            }
        }
    }
}

/// Runs one fetch cycle under a timeout guard and logs the outcome.
///
/// A hung cycle (stuck network call, wedged browser) must never stall the
/// poll loop past its bound; exceeding the timeout only skips this cycle.
async fn run_cycle(pipeline: Arc<Pipeline>, credentials: Credentials, timeout_seconds: u64) {
    let timeout_duration = Duration::from_secs(timeout_seconds);

    match tokio::time::timeout(timeout_duration, pipeline.run(&credentials)).await {
        Ok(result) => log_result(&result),
        Err(_) => tracing::error!(timeout_seconds, "Fetch cycle timed out."),
    }
}

/// Logs each reading of a completed cycle, and the cycle error if any.
fn log_result(result: &FetchResult) {
    for reading in &result.readings {
        tracing::info!(
            commodity = %reading.commodity,
            consumption_kwh = reading.consumption_kwh,
            cost_usd = reading.cost_usd,
            native_value = reading.native_value,
            native_unit = reading.native_unit.as_deref(),
            read_date = reading.read_date.as_deref(),
            "reading collected"
        );
    }

    match &result.error {
        None => tracing::info!(
            readings = result.readings.len(),
            fetched_at = %result.fetched_at,
            "fetch cycle complete"
        ),
        Some(error) => tracing::warn!(
            readings = result.readings.len(),
            error = %error,
            "fetch cycle completed with errors"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Commodity, Reading};
    use chrono::{Local, TimeZone};

    fn test_result() -> FetchResult {
        let timestamp = Local.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        FetchResult::new(
            vec![Reading {
                commodity: Commodity::Electricity,
                consumption_kwh: 512.5,
                cost_usd: 143.70,
                native_value: None,
                native_unit: None,
                read_date: None,
                timestamp,
            }],
            timestamp,
            None,
        )
    }

    #[test]
    fn test_log_result_succeeds() {
        // Completes without panic for both shapes
        log_result(&test_result());

        let mut errored = test_result();
        errored.error = Some("gas: malformed".to_string());
        log_result(&errored);
    }

    mod run_cycle {
        use super::*;
        use crate::pseg::{Authenticator, Extractor, PortalClient};
        use crate::test_utils::config::test_pseg_config;
        use crate::test_utils::mocks::{LoginOutcome, ScriptedLoginStrategy};

        #[tokio::test]
        async fn test_completes_within_timeout() {
            // Auth fails fast, but the cycle still finishes and logs a
            // well-formed result instead of panicking.
            let pipeline = Arc::new(crate::pipeline::Pipeline::with_parts(
                Authenticator::new(vec![Box::new(ScriptedLoginStrategy::new(
                    "direct",
                    LoginOutcome::InvalidCredentials,
                ))]),
                PortalClient::new(test_pseg_config("http://127.0.0.1:1".to_string())),
                Extractor::new(),
            ));

            run_cycle(
                pipeline,
                Credentials::new("user@example.com", "hunter2"),
                10,
            )
            .await;
        }
    }
}
