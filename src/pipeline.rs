//! The per-cycle fetch pipeline: login, page fetch, extraction, and
//! normalization, orchestrated per commodity.
//!
//! One `run` call is one fetch cycle. The cycle is strictly sequential
//! (each stage needs the previous stage's output) and holds no state
//! across cycles; the scheduler that calls `run` decides the cadence.

use crate::config::PsegConfig;
use crate::error::{Error, FetchError};
use crate::model::{Commodity, Credentials, FetchResult, RawPage, Reading};
use crate::pseg::{constants, normalize, Authenticator, Extractor, PortalClient, Session};
use chrono::{DateTime, Local};

/// Assembles the readings for one fetch cycle.
pub struct Pipeline {
    authenticator: Authenticator,
    client: PortalClient,
    extractor: Extractor,
}

impl Pipeline {
    pub fn new(config: PsegConfig) -> Self {
        Self {
            authenticator: Authenticator::with_default_strategies(&config),
            client: PortalClient::new(config),
            extractor: Extractor::new(),
        }
    }

    #[cfg(test)]
    pub fn with_parts(
        authenticator: Authenticator,
        client: PortalClient,
        extractor: Extractor,
    ) -> Self {
        Self {
            authenticator,
            client,
            extractor,
        }
    }

    /// Runs one full fetch cycle.
    ///
    /// Always returns a well-formed `FetchResult`: a cycle that fails
    /// entirely carries the failure in the `error` field instead of
    /// propagating it past this boundary. The two commodities are handled
    /// independently, so one commodity's failure never blocks the other.
    pub async fn run(&self, credentials: &Credentials) -> FetchResult {
        let fetched_at = Local::now();

        let mut session = match self.authenticator.authenticate(credentials).await {
            Ok(session) => session,
            Err(err) => {
                tracing::error!(stage = "authenticate", error = %err, "fetch cycle failed");
                return FetchResult::failed(fetched_at, err.to_string());
            }
        };

        let mut readings: Vec<Reading> = Vec::new();
        let mut cycle_error: Option<String> = None;
        // At most one immediate re-authentication per cycle.
        let mut reauthenticated = false;

        for commodity in Commodity::ALL {
            match self
                .collect_commodity(credentials, &mut session, &mut reauthenticated, commodity, fetched_at)
                .await
            {
                Ok(Some(reading)) => readings.push(reading),
                Ok(None) => {
                    tracing::debug!(%commodity, "commodity not present on portal, omitting");
                }
                Err(err) => {
                    tracing::error!(%commodity, error = %err, "commodity collection failed");
                    if cycle_error.is_none() {
                        cycle_error = Some(format!("{}: {}", commodity, err));
                    }
                }
            }
        }

        if let Err(err) = self.client.logout(&session).await {
            tracing::debug!(error = %err, "logout failed");
        }

        FetchResult::new(readings, fetched_at, cycle_error)
    }

    /// Fetch, extract, and normalize one commodity. `Ok(None)` means the
    /// account has no such service.
    async fn collect_commodity(
        &self,
        credentials: &Credentials,
        session: &mut Session,
        reauthenticated: &mut bool,
        commodity: Commodity,
        timestamp: DateTime<Local>,
    ) -> Result<Option<Reading>, Error> {
        let page = self
            .fetch_usage_page(credentials, session, reauthenticated, commodity)
            .await?;

        let figures = match self.extractor.extract(&page, commodity) {
            Ok(figures) => figures,
            Err(err) if err.is_benign() => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let normalized = normalize(commodity, figures.consumption, &figures.unit)?;

        Ok(Some(Reading {
            commodity,
            consumption_kwh: normalized.consumption_kwh,
            cost_usd: figures.cost,
            native_value: normalized.native_value,
            native_unit: normalized.native_unit,
            read_date: figures.read_date,
            timestamp,
        }))
    }

    /// Fetches a commodity's usage page, re-authenticating once per cycle
    /// when the portal reports the session expired.
    async fn fetch_usage_page(
        &self,
        credentials: &Credentials,
        session: &mut Session,
        reauthenticated: &mut bool,
        commodity: Commodity,
    ) -> Result<RawPage, Error> {
        let path = constants::usage_page_path(commodity);

        match self.client.get_page(session, path).await {
            Ok(page) => Ok(page),
            Err(FetchError::SessionExpired(status)) if !*reauthenticated => {
                *reauthenticated = true;
                tracing::warn!(%commodity, status, "session expired mid-cycle, re-authenticating");
                *session = self.authenticator.authenticate(credentials).await?;
                Ok(self.client.get_page(session, path).await?)
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pseg::KWH_PER_THERM;
    use crate::test_utils::config::test_pseg_config;
    use crate::test_utils::html::{usage_page, usage_region};
    use crate::test_utils::mocks::{LoginOutcome, ScriptedLoginStrategy};

    fn creds() -> Credentials {
        Credentials::new("user@example.com", "hunter2")
    }

    fn pipeline_for(server_url: String, outcome: LoginOutcome) -> (Pipeline, crate::test_utils::mocks::CallCount) {
        let strategy = ScriptedLoginStrategy::new("direct", outcome);
        let calls = strategy.call_count();
        let pipeline = Pipeline::with_parts(
            Authenticator::new(vec![Box::new(strategy)]),
            PortalClient::new(test_pseg_config(server_url)),
            Extractor::new(),
        );
        (pipeline, calls)
    }

    async fn mock_usage_page(
        server: &mut mockito::ServerGuard,
        service: &str,
        body: String,
    ) -> mockito::Mock {
        server
            .mock(
                "GET",
                format!("/dashboard/energy?service={}", service).as_str(),
            )
            .with_status(200)
            .with_body(body)
            .create_async()
            .await
    }

    async fn mock_logout(server: &mut mockito::ServerGuard) -> mockito::Mock {
        server
            .mock("GET", "/user/logout")
            .with_status(200)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_run_collects_both_commodities() {
        let mut server = mockito::Server::new_async().await;
        let _electric = mock_usage_page(
            &mut server,
            "electric",
            usage_page(&[usage_region("electric", "512.5", "kWh", "$143.70")]),
        )
        .await;
        let _gas = mock_usage_page(
            &mut server,
            "gas",
            usage_page(&[usage_region("gas", "10.0", "therms", "$58.12")]),
        )
        .await;
        let _logout = mock_logout(&mut server).await;

        let (pipeline, login_calls) = pipeline_for(server.url(), LoginOutcome::Success);
        let result = pipeline.run(&creds()).await;

        assert!(result.error.is_none());
        assert_eq!(result.readings.len(), 2);
        assert_eq!(login_calls.get(), 1);

        let electric = result.reading(Commodity::Electricity).unwrap();
        assert_eq!(electric.consumption_kwh, 512.5);
        assert_eq!(electric.cost_usd, 143.70);
        assert!(electric.native_value.is_none());

        let gas = result.reading(Commodity::Gas).unwrap();
        assert_eq!(gas.consumption_kwh, 10.0 * KWH_PER_THERM);
        assert_eq!(gas.cost_usd, 58.12);
        assert_eq!(gas.native_value, Some(10.0));
        assert_eq!(gas.native_unit.as_deref(), Some("therm"));
    }

    #[tokio::test]
    async fn test_run_omits_absent_commodity() {
        let mut server = mockito::Server::new_async().await;
        // Electric-only account: the gas page renders without a gas region
        let _electric = mock_usage_page(
            &mut server,
            "electric",
            usage_page(&[usage_region("electric", "512.5", "kWh", "$143.70")]),
        )
        .await;
        let _gas = mock_usage_page(
            &mut server,
            "gas",
            "<html><body><p>No gas service on this account</p></body></html>".to_string(),
        )
        .await;
        let _logout = mock_logout(&mut server).await;

        let (pipeline, _) = pipeline_for(server.url(), LoginOutcome::Success);
        let result = pipeline.run(&creds()).await;

        assert!(result.error.is_none());
        assert_eq!(result.readings.len(), 1);
        assert!(result.reading(Commodity::Electricity).is_some());
        assert!(result.reading(Commodity::Gas).is_none());
    }

    #[tokio::test]
    async fn test_run_malformed_commodity_does_not_block_other() {
        let mut server = mockito::Server::new_async().await;
        let _electric = mock_usage_page(
            &mut server,
            "electric",
            usage_page(&[usage_region("electric", "N/A", "kWh", "$143.70")]),
        )
        .await;
        let _gas = mock_usage_page(
            &mut server,
            "gas",
            usage_page(&[usage_region("gas", "10.0", "therms", "$58.12")]),
        )
        .await;
        let _logout = mock_logout(&mut server).await;

        let (pipeline, _) = pipeline_for(server.url(), LoginOutcome::Success);
        let result = pipeline.run(&creds()).await;

        assert_eq!(result.readings.len(), 1);
        assert!(result.reading(Commodity::Gas).is_some());
        let error = result.error.unwrap();
        assert!(error.contains("electricity"));
    }

    #[tokio::test]
    async fn test_run_unsupported_unit_omits_reading() {
        let mut server = mockito::Server::new_async().await;
        let _electric = mock_usage_page(
            &mut server,
            "electric",
            usage_page(&[usage_region("electric", "512.5", "kWh", "$143.70")]),
        )
        .await;
        let _gas = mock_usage_page(
            &mut server,
            "gas",
            usage_page(&[usage_region("gas", "42", "ccf", "$58.12")]),
        )
        .await;
        let _logout = mock_logout(&mut server).await;

        let (pipeline, _) = pipeline_for(server.url(), LoginOutcome::Success);
        let result = pipeline.run(&creds()).await;

        // The ccf reading is omitted, never approximated
        assert_eq!(result.readings.len(), 1);
        assert!(result.reading(Commodity::Gas).is_none());
        assert!(result.error.unwrap().contains("ccf"));
    }

    #[tokio::test]
    async fn test_run_session_expiry_reauthenticates_exactly_once() {
        let mut server = mockito::Server::new_async().await;
        let _electric = server
            .mock("GET", "/dashboard/energy?service=electric")
            .with_status(401)
            .create_async()
            .await;
        let _gas = server
            .mock("GET", "/dashboard/energy?service=gas")
            .with_status(401)
            .create_async()
            .await;
        let _logout = mock_logout(&mut server).await;

        let (pipeline, login_calls) = pipeline_for(server.url(), LoginOutcome::Success);
        let result = pipeline.run(&creds()).await;

        // Initial login plus exactly one mid-cycle re-authentication
        assert_eq!(login_calls.get(), 2);
        assert!(result.readings.is_empty());
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_run_auth_failure_returns_errored_result() {
        let server = mockito::Server::new_async().await;

        let (pipeline, login_calls) =
            pipeline_for(server.url(), LoginOutcome::InvalidCredentials);
        let result = pipeline.run(&creds()).await;

        // Invalid credentials are never retried
        assert_eq!(login_calls.get(), 1);
        assert!(result.readings.is_empty());
        assert!(result
            .error
            .unwrap()
            .contains("portal rejected credentials"));
    }
}
