//! Portal login.
//!
//! Login is modeled as a small ordered set of strategies behind a common
//! trait. The authenticator tries each in order and stops at the first
//! success: the cheap direct form POST first, the browser-automation
//! fallback second. An explicit credential rejection aborts the chain
//! immediately since no amount of falling back fixes a wrong password.

mod browser;
mod direct;

pub use browser::BrowserLoginStrategy;
pub use direct::DirectLoginStrategy;

use crate::config::PsegConfig;
use crate::error::AuthError;
use crate::model::Credentials;
use crate::pseg::session::Session;
use async_trait::async_trait;

/// One way of turning credentials into an authenticated session.
#[async_trait]
pub trait LoginStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt_login(&self, credentials: &Credentials) -> Result<Session, AuthError>;
}

/// Tries login strategies in order until one produces a session.
pub struct Authenticator {
    strategies: Vec<Box<dyn LoginStrategy>>,
}

impl Authenticator {
    pub fn new(strategies: Vec<Box<dyn LoginStrategy>>) -> Self {
        Self { strategies }
    }

    /// Direct HTTP login first, browser fallback second.
    pub fn with_default_strategies(config: &PsegConfig) -> Self {
        Self::new(vec![
            Box::new(DirectLoginStrategy::new(config.clone())),
            Box::new(BrowserLoginStrategy::new(config.clone())),
        ])
    }

    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let mut last_error: Option<AuthError> = None;

        for strategy in &self.strategies {
            tracing::debug!(strategy = strategy.name(), "attempting login");
            match strategy.attempt_login(credentials).await {
                Ok(session) => {
                    tracing::info!(
                        strategy = strategy.name(),
                        established_at = %session.established_at,
                        "login succeeded"
                    );
                    return Ok(session);
                }
                Err(err) if err.is_recoverable() => {
                    tracing::warn!(
                        strategy = strategy.name(),
                        error = %err,
                        "login strategy failed, trying next"
                    );
                    last_error = Some(err);
                }
                Err(err) => {
                    tracing::error!(strategy = strategy.name(), error = %err, "login rejected");
                    return Err(err);
                }
            }
        }

        // All strategies exhausted: surface a combined failure.
        Err(match last_error {
            Some(err) => AuthError::challenge("all", format!("all login strategies failed; last: {}", err)),
            None => AuthError::challenge("none", "no login strategies configured"),
        })
    }
}
