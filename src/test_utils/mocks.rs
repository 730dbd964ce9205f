//! Mock login strategies for authenticator and pipeline tests.

use crate::error::AuthError;
use crate::model::Credentials;
use crate::pseg::{LoginStrategy, Session};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared call counter handed out by a scripted strategy.
#[derive(Clone)]
pub struct CallCount(Arc<AtomicUsize>);

impl CallCount {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a scripted login strategy should do on every attempt.
#[derive(Clone, Copy)]
pub enum LoginOutcome {
    Success,
    InvalidCredentials,
    Challenge,
    DriverUnavailable,
}

/// A login strategy with a fixed outcome and an observable call count.
pub struct ScriptedLoginStrategy {
    name: &'static str,
    outcome: LoginOutcome,
    calls: Arc<AtomicUsize>,
}

impl ScriptedLoginStrategy {
    pub fn new(name: &'static str, outcome: LoginOutcome) -> Self {
        Self {
            name,
            outcome,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> CallCount {
        CallCount(Arc::clone(&self.calls))
    }
}

#[async_trait]
impl LoginStrategy for ScriptedLoginStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn attempt_login(&self, _credentials: &Credentials) -> Result<Session, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.outcome {
            LoginOutcome::Success => Ok(Session::new(vec![(
                "PSEG_SESSION".to_string(),
                "mock-session".to_string(),
            )])),
            LoginOutcome::InvalidCredentials => Err(AuthError::InvalidCredentials(
                "portal rejected credentials".to_string(),
            )),
            LoginOutcome::Challenge => Err(AuthError::challenge(self.name, "scripted challenge")),
            LoginOutcome::DriverUnavailable => Err(AuthError::DriverUnavailable(
                "scripted driver failure".to_string(),
            )),
        }
    }
}
