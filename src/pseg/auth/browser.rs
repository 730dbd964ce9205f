use crate::config::PsegConfig;
use crate::error::AuthError;
use crate::model::Credentials;
use crate::pseg::constants;
use crate::pseg::session::Session;
use async_trait::async_trait;
use fantoccini::{Client as BrowserClient, ClientBuilder, Locator};
use std::time::Duration;
use tokio::process::{Child, Command};

use super::LoginStrategy;

/// Port used when this strategy has to spawn its own chromedriver.
const LOCAL_DRIVER_PORT: u16 = 9515;

/// How long to wait for a freshly spawned chromedriver to start listening.
const DRIVER_STARTUP_WAIT: Duration = Duration::from_millis(500);

/// Full browser login via WebDriver.
///
/// The fallback for portals whose anti-automation defenses reject the
/// direct form POST: a real headless Chrome fills the login form, and the
/// cookies are harvested from the browser context afterwards. The WebDriver
/// process lives only for the duration of one login attempt.
pub struct BrowserLoginStrategy {
    config: PsegConfig,
}

/// Holds a spawned chromedriver child so it is killed on every exit path.
struct DriverGuard {
    child: Option<Child>,
}

impl DriverGuard {
    fn external() -> Self {
        Self { child: None }
    }

    fn spawned(child: Child) -> Self {
        Self { child: Some(child) }
    }
}

impl Drop for DriverGuard {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            if let Err(err) = child.start_kill() {
                tracing::debug!(error = %err, "failed to kill chromedriver");
            }
        }
    }
}

impl BrowserLoginStrategy {
    pub fn new(config: PsegConfig) -> Self {
        Self { config }
    }

    /// Resolves a WebDriver endpoint: the configured URL when set,
    /// otherwise a locally spawned chromedriver.
    async fn acquire_driver(&self) -> Result<(String, DriverGuard), AuthError> {
        if let Some(url) = &self.config.webdriver_url {
            return Ok((url.clone(), DriverGuard::external()));
        }

        let child = Command::new("chromedriver")
            .arg(format!("--port={}", LOCAL_DRIVER_PORT))
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                AuthError::DriverUnavailable(format!("failed to spawn chromedriver: {}", e))
            })?;
        tokio::time::sleep(DRIVER_STARTUP_WAIT).await;

        Ok((
            format!("http://127.0.0.1:{}", LOCAL_DRIVER_PORT),
            DriverGuard::spawned(child),
        ))
    }

    async fn connect(&self, endpoint: &str) -> Result<BrowserClient, AuthError> {
        ClientBuilder::native()
            .capabilities(chrome_capabilities())
            .connect(endpoint)
            .await
            .map_err(|e| {
                AuthError::DriverUnavailable(format!(
                    "failed to start a WebDriver session at {}: {}",
                    endpoint, e
                ))
            })
    }

    /// Fills and submits the login form, then waits for the authenticated
    /// dashboard marker before harvesting cookies.
    async fn drive_login(
        &self,
        browser: &BrowserClient,
        credentials: &Credentials,
    ) -> Result<Session, AuthError> {
        let login_url = format!("{}{}", self.config.base_url, constants::LOGIN_PATH);
        browser
            .goto(&login_url)
            .await
            .map_err(|e| AuthError::challenge("browser", format!("navigation failed: {}", e)))?;

        browser
            .find(Locator::Id(constants::USERNAME_FIELD))
            .await
            .map_err(|e| AuthError::challenge("browser", format!("username field: {}", e)))?
            .send_keys(&credentials.username)
            .await
            .map_err(|e| AuthError::challenge("browser", format!("username input: {}", e)))?;

        browser
            .find(Locator::Id(constants::PASSWORD_FIELD))
            .await
            .map_err(|e| AuthError::challenge("browser", format!("password field: {}", e)))?
            .send_keys(&credentials.password)
            .await
            .map_err(|e| AuthError::challenge("browser", format!("password input: {}", e)))?;

        browser
            .find(Locator::Id(constants::SUBMIT_BUTTON))
            .await
            .map_err(|e| AuthError::challenge("browser", format!("submit button: {}", e)))?
            .click()
            .await
            .map_err(|e| AuthError::challenge("browser", format!("submit click: {}", e)))?;

        browser
            .wait()
            .at_most(Duration::from_secs(self.config.login_wait_sec))
            .for_element(Locator::Css(constants::POST_LOGIN_MARKER))
            .await
            .map_err(|_| {
                AuthError::challenge(
                    "browser",
                    format!(
                        "post-login marker '{}' did not appear within {}s",
                        constants::POST_LOGIN_MARKER,
                        self.config.login_wait_sec
                    ),
                )
            })?;

        let cookies = browser.get_all_cookies().await.map_err(|e| {
            AuthError::challenge("browser", format!("cookie harvest failed: {}", e))
        })?;

        let session = Session::new(
            cookies
                .into_iter()
                .map(|c| (c.name().to_string(), c.value().to_string()))
                .collect(),
        );
        if session.is_empty() {
            return Err(AuthError::challenge(
                "browser",
                "browser context produced no cookies after login",
            ));
        }

        Ok(session)
    }
}

#[async_trait]
impl LoginStrategy for BrowserLoginStrategy {
    fn name(&self) -> &'static str {
        "browser"
    }

    async fn attempt_login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let (endpoint, _guard) = self.acquire_driver().await?;
        let browser = self.connect(&endpoint).await?;

        let result = self.drive_login(&browser, credentials).await;

        // Teardown must happen whether login succeeded or failed; the
        // driver guard covers the spawned process itself.
        if let Err(err) = browser.close().await {
            tracing::debug!(error = %err, "failed to close browser session");
        }

        result
    }
}

fn chrome_capabilities() -> serde_json::map::Map<String, serde_json::Value> {
    let mut caps = serde_json::map::Map::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        serde_json::json!({ "args": constants::CHROME_ARGS }),
    );
    caps
}
