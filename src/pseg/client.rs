use crate::config::PsegConfig;
use crate::error::FetchError;
use crate::model::RawPage;
use crate::pseg::constants;
use crate::pseg::session::Session;
use reqwest::Client as HttpClient;
use std::time::Duration;

/// Issues authenticated requests against the portal using an established
/// session's cookies.
pub struct PortalClient {
    http_client: HttpClient,
    config: PsegConfig,
}

impl PortalClient {
    pub fn new(config: PsegConfig) -> Self {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.http_timeout_sec))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            http_client,
            config,
        }
    }

    /// Fetches one data-bearing page with the session's cookies attached.
    ///
    /// 401/403 surface as `SessionExpired` so the caller can decide whether
    /// to re-authenticate; this method never retries internally.
    pub async fn get_page(&self, session: &Session, path: &str) -> Result<RawPage, FetchError> {
        let url = format!("{}{}", self.config.base_url, path);
        let response = self
            .http_client
            .get(&url)
            .header("user-agent", "reqwest")
            .header("cookie", session.cookie_header())
            .send()
            .await
            .map_err(|e| self.classify_transport_error(e))?;

        let status = response.status().as_u16();
        match status {
            401 | 403 => Err(FetchError::SessionExpired(status)),
            _ if response.status().is_success() => {
                let body = response.text().await?;
                Ok(RawPage { url, status, body })
            }
            _ => Err(FetchError::unexpected(status, path)),
        }
    }

    /// Ends the portal session. Best effort: the session is discarded
    /// either way, so failures are only logged by the caller.
    pub async fn logout(&self, session: &Session) -> Result<(), FetchError> {
        let url = format!("{}{}", self.config.base_url, constants::LOGOUT_PATH);
        self.http_client
            .get(&url)
            .header("cookie", session.cookie_header())
            .send()
            .await
            .map_err(|e| self.classify_transport_error(e))?;
        Ok(())
    }

    fn classify_transport_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.config.http_timeout_sec)
        } else {
            FetchError::Http(err)
        }
    }
}
